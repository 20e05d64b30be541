use super::error::ClientError;
use super::ledger::{Ledger, Post};
use futures::stream::{self, StreamExt, TryStreamExt};
use log::debug;

/// How many indexed reads may be in flight at once during a reload. The
/// ledger has no batch-read primitive, so the feed is rebuilt one index at
/// a time; overlapping the round trips hides most of that latency.
pub const FETCH_CONCURRENCY: usize = 8;

/// Rebuilds the full feed from the ledger: read the count, then fetch
/// indices `1..=count`, returned ascending by index (`buffered` keeps the
/// issue order, so no re-sort is needed).
///
/// Any single failed read aborts the whole reload and no partial feed is
/// returned; the caller's prior feed stays authoritative until a reload
/// fully succeeds. Idempotent absent remote writes.
pub async fn reload(ledger: &dyn Ledger) -> Result<Vec<Post>, ClientError> {
    let count = ledger.read_count().await?;
    debug!("(feed) reloading {} posts", count);
    let posts = stream::iter((1..=count).map(|index| ledger.read_post(index)))
        .buffered(FETCH_CONCURRENCY)
        .try_collect::<Vec<_>>()
        .await?;
    Ok(posts)
}
