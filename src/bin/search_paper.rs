//! search_paper - print Google Scholar publications as JSON
//!
//! All requests go through a tor process started for this run unless
//! `--no-tor` is given.
//!
//! ```bash
//! search_paper --query "graph neural networks" --limit 20
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use scholar_json::cli::{self, PaperCli};
use scholar_json::scholar::ScholarClient;
use scholar_json::tor::TorProxy;
use scholar_json::{output, pipeline};
use tracing::debug;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = PaperCli::parse();
    cli::init_logging(args.common.debug);

    // Held until exit; dropping it stops tor
    let tor = match args.tor_config() {
        Some(config) => Some(
            TorProxy::launch(&config)
                .await
                .context("Failed to start the tor proxy")?,
        ),
        None => None,
    };

    let proxy = match &tor {
        Some(tor) => {
            debug!(pid = ?tor.pid(), "Routing requests through tor");
            Some(tor.proxy_url())
        }
        None => args.proxy.clone(),
    };

    let client = ScholarClient::new(args.common.scholar_config(proxy))
        .context("Failed to set up Scholar client")?;

    let publications =
        pipeline::search_publications(&client, &args.query, args.common.limit, args.common.offset)
            .await
            .with_context(|| format!("Publication search for '{}' failed", args.query))?;

    output::write_json(&mut std::io::stdout().lock(), &publications)
        .context("Failed to write output")?;

    drop(tor);
    Ok(())
}
