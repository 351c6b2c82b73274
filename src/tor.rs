//! Local Tor process used as the anonymizing proxy for publication search.
//!
//! The process is started explicitly by the caller and torn down when the
//! returned [`TorProxy`] is dropped. Each launch gets its own data directory
//! and, unless a port is given, a free SOCKS port, so it can run next to a
//! system tor service.

use crate::error::{ScholarError, Result};
use std::ffi::OsString;
use std::net::{Ipv4Addr, TcpListener};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info};

/// Log line tor prints once circuits are usable
const BOOTSTRAP_DONE: &str = "Bootstrapped 100%";

/// How to launch tor
#[derive(Debug, Clone)]
pub struct TorConfig {
    /// Executable name or path
    pub command: String,
    /// Local SOCKS port tor listens on; `None` picks a free one
    pub socks_port: Option<u16>,
    /// Give up if tor has not bootstrapped by then
    pub bootstrap_timeout: Duration,
}

impl Default for TorConfig {
    fn default() -> Self {
        Self {
            command: "tor".to_string(),
            socks_port: None,
            bootstrap_timeout: Duration::from_secs(90),
        }
    }
}

/// A running tor child process
#[derive(Debug)]
pub struct TorProxy {
    child: Child,
    socks_port: u16,
    _data_dir: TempDir,
}

/// Ask the OS for an unused local TCP port
pub fn free_port() -> Result<u16> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .map_err(|e| ScholarError::Proxy(format!("No free local port: {}", e)))?;
    Ok(listener.local_addr()?.port())
}

/// Command-line arguments for a tor instance on `socks_port` keeping its
/// state in `data_dir`
pub fn tor_args(socks_port: u16, data_dir: &Path) -> Vec<OsString> {
    vec![
        "--SocksPort".into(),
        socks_port.to_string().into(),
        "--DataDirectory".into(),
        data_dir.as_os_str().to_owned(),
    ]
}

/// `socks5h` so hostnames resolve through tor too
fn socks_proxy_url(port: u16) -> String {
    format!("socks5h://127.0.0.1:{}", port)
}

impl TorProxy {
    /// Start tor and wait until it reports a complete bootstrap.
    pub async fn launch(config: &TorConfig) -> Result<Self> {
        let socks_port = match config.socks_port {
            Some(port) => port,
            None => free_port()?,
        };
        let data_dir = tempfile::Builder::new()
            .prefix("scholar-tor-")
            .tempdir()
            .map_err(|e| ScholarError::Proxy(format!("Cannot create tor data directory: {}", e)))?;

        info!(
            command = %config.command,
            port = socks_port,
            data_dir = ?data_dir.path(),
            "Starting tor"
        );

        let mut child = Command::new(&config.command)
            .args(tor_args(socks_port, data_dir.path()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ScholarError::Proxy(format!("Failed to start '{}': {}", config.command, e))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ScholarError::Proxy("tor stdout not captured".to_string()))?;
        let mut lines = BufReader::new(stdout).lines();

        let bootstrap = async {
            while let Some(line) = lines.next_line().await? {
                debug!(target: "tor", "{}", line);
                if line.contains(BOOTSTRAP_DONE) {
                    return Ok(());
                }
            }
            Err(ScholarError::Proxy(format!(
                "'{}' exited before bootstrapping",
                config.command
            )))
        };

        match tokio::time::timeout(config.bootstrap_timeout, bootstrap).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ScholarError::Proxy(format!(
                    "tor did not bootstrap within {}s",
                    config.bootstrap_timeout.as_secs()
                )))
            }
        }

        // Keep draining tor's log so it never blocks on a full pipe
        tokio::spawn(async move {
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(target: "tor", "{}", line);
            }
        });

        info!(port = socks_port, "tor bootstrapped");
        Ok(Self {
            child,
            socks_port,
            _data_dir: data_dir,
        })
    }

    /// Proxy URL for reqwest
    pub fn proxy_url(&self) -> String {
        socks_proxy_url(self.socks_port)
    }

    /// OS process id, if still running
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary() {
        let config = TorConfig {
            command: "/nonexistent/tor-binary".to_string(),
            ..Default::default()
        };
        let err = TorProxy::launch(&config).await.expect_err("must fail");
        assert!(matches!(err, ScholarError::Proxy(_)));
        assert!(err.to_string().contains("Failed to start"));
    }

    #[tokio::test]
    async fn test_exit_before_bootstrap() {
        // `true` ignores its arguments and exits without output
        let config = TorConfig {
            command: "true".to_string(),
            bootstrap_timeout: Duration::from_secs(10),
            ..Default::default()
        };
        let err = TorProxy::launch(&config).await.expect_err("must fail");
        assert!(err.to_string().contains("exited before bootstrapping"));
    }

    #[test]
    fn test_tor_args() {
        let args = tor_args(9151, Path::new("/tmp/scholar-tor-abc"));
        assert_eq!(
            args,
            vec![
                OsString::from("--SocksPort"),
                OsString::from("9151"),
                OsString::from("--DataDirectory"),
                OsString::from("/tmp/scholar-tor-abc"),
            ]
        );
    }

    #[test]
    fn test_free_port_is_bindable() -> Result<()> {
        let port = free_port()?;
        assert_ne!(port, 0);
        TcpListener::bind((Ipv4Addr::LOCALHOST, port))?;
        Ok(())
    }

    #[tokio::test]
    async fn test_proxy_url_uses_socks5h() -> Result<()> {
        let child = Command::new("sleep").arg("30").kill_on_drop(true).spawn()?;
        let proxy = TorProxy {
            child,
            socks_port: 9151,
            _data_dir: TempDir::new()?,
        };
        assert_eq!(proxy.proxy_url(), "socks5h://127.0.0.1:9151");
        assert!(proxy.pid().is_some());
        Ok(())
    }
}
