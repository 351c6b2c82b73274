//! # scholar-json
//!
//! Google Scholar author and publication search with flat JSON output.
//!
//! ## Modules
//!
//! - [`scholar`] - Scholar HTTP client and the [`scholar::ScholarSource`] seam
//! - [`parse`] - HTML parsing of result pages into records
//! - [`record`] - Untyped upstream records
//! - [`projection`] - Fixed-field projections for output
//! - [`pipeline`] - Search, limit and project
//! - [`output`] - JSON output layout
//! - [`tor`] - tor process used as an anonymizing proxy
//! - [`cookies`] - Cookie reuse
//! - [`cli`] - Flags and logging setup for the binaries
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use scholar_json::{pipeline, scholar::{ScholarClient, ScholarConfig}};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ScholarClient::new(ScholarConfig::default())?;
//!     let authors = pipeline::search_authors(&client, "Jane Doe", 10, 0).await?;
//!     println!("{}", scholar_json::output::to_json_string(&authors)?);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod cookies;
pub mod error;
pub mod output;
pub mod parse;
pub mod pipeline;
pub mod projection;
pub mod record;
pub mod scholar;
pub mod tor;

pub use error::{Result, ScholarError};
