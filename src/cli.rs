//! Command-line definitions shared by `search_author` and `search_paper`.

use crate::scholar::{ScholarConfig, DEFAULT_SCHOLAR_URL};
use crate::tor::TorConfig;
use clap::{Args, Parser};
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Flags common to both tools
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Maximum number of results to print
    #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
    pub limit: i64,

    /// Accepted for compatibility; results are not skipped
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub offset: i64,

    /// Mirror site URL
    #[arg(long, env = "SCHOLAR_MIRROR", default_value = DEFAULT_SCHOLAR_URL)]
    pub mirror: String,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,
}

impl CommonArgs {
    /// Client configuration for these flags
    pub fn scholar_config(&self, proxy: Option<String>) -> ScholarConfig {
        ScholarConfig {
            base_url: self.mirror.clone(),
            proxy,
            ..Default::default()
        }
    }
}

/// Search Google Scholar author profiles and print them as JSON
#[derive(Debug, Parser)]
#[command(name = "search_author")]
#[command(version, about, long_about = None)]
pub struct AuthorCli {
    /// Author name to search for
    #[arg(long, default_value = "")]
    pub name: String,

    /// Proxy URL (e.g., http://127.0.0.1:7890)
    #[arg(long)]
    pub proxy: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Search Google Scholar publications through tor and print them as JSON
#[derive(Debug, Parser)]
#[command(name = "search_paper")]
#[command(version, about, long_about = None)]
pub struct PaperCli {
    /// Search keywords
    #[arg(long, default_value = "")]
    pub query: String,

    /// tor executable
    #[arg(long, env = "SCHOLAR_TOR_CMD", default_value = "tor")]
    pub tor_cmd: String,

    /// SOCKS port for the tor process [default: a free local port]
    #[arg(long)]
    pub socks_port: Option<u16>,

    /// Do not start tor; connect directly or through --proxy
    #[arg(long)]
    pub no_tor: bool,

    /// Proxy URL, only used with --no-tor
    #[arg(long, requires = "no_tor")]
    pub proxy: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl PaperCli {
    /// tor launch settings, `None` when tor is disabled
    pub fn tor_config(&self) -> Option<TorConfig> {
        if self.no_tor {
            None
        } else {
            Some(TorConfig {
                command: self.tor_cmd.clone(),
                socks_port: self.socks_port,
                ..Default::default()
            })
        }
    }
}

/// Initialize logging on stderr; stdout is reserved for JSON.
///
/// `RUST_LOG` overrides the level chosen by `--debug`.
pub fn init_logging(debug: bool) {
    let log_level = if debug { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .init();
}
