//! search_author - print Google Scholar author profiles as JSON
//!
//! ```bash
//! search_author --name "Jane Doe" --limit 5
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use scholar_json::cli::{self, AuthorCli};
use scholar_json::scholar::ScholarClient;
use scholar_json::{output, pipeline};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = AuthorCli::parse();
    cli::init_logging(args.common.debug);

    let client = ScholarClient::new(args.common.scholar_config(args.proxy.clone()))
        .context("Failed to set up Scholar client")?;

    let authors =
        pipeline::search_authors(&client, &args.name, args.common.limit, args.common.offset)
            .await
            .with_context(|| format!("Author search for '{}' failed", args.name))?;

    output::write_json(&mut std::io::stdout().lock(), &authors)
        .context("Failed to write output")?;
    Ok(())
}
