//! Search → project → collect.
//!
//! Pulls at most `limit` records from a [`ScholarSource`] stream and projects
//! each one. The first failure aborts the whole search; nothing partial is
//! returned.

use crate::error::Result;
use crate::projection::{AuthorProjection, Projection, PublicationProjection};
use crate::scholar::{RecordStream, ScholarSource};
use futures::{StreamExt, TryStreamExt};
use tracing::{debug, info};

/// Project the first `limit` records of a stream; `limit < 1` demands none
pub async fn collect_projected<P: Projection>(
    records: RecordStream<'_>,
    limit: i64,
) -> Result<Vec<P>> {
    let take = usize::try_from(limit).unwrap_or(0);
    records
        .take(take)
        .map(|record| record.and_then(|r| P::project(&r)))
        .try_collect()
        .await
}

/// Author search as run by `search_author`.
///
/// `offset` is accepted for interface compatibility but does not skip
/// records.
pub async fn search_authors<S>(
    source: &S,
    name: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<AuthorProjection>>
where
    S: ScholarSource + ?Sized,
{
    debug!(offset, "offset is not applied");
    let authors = collect_projected(source.search_authors(name), limit).await?;
    info!(count = authors.len(), "Author search complete");
    Ok(authors)
}

/// Publication search as run by `search_paper`.
///
/// `offset` is accepted for interface compatibility but does not skip
/// records.
pub async fn search_publications<S>(
    source: &S,
    query: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<PublicationProjection>>
where
    S: ScholarSource + ?Sized,
{
    debug!(offset, "offset is not applied");
    let publications = collect_projected(source.search_publications(query), limit).await?;
    info!(count = publications.len(), "Publication search complete");
    Ok(publications)
}
