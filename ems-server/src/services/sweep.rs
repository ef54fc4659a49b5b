//! Daily deactivation of members whose notice period has ended

use chrono::{DateTime, Utc};

use crate::db::NoticeStore;
use crate::error::ServiceResult;

/// Deactivate every member (and their user) whose approved notice ended
/// before `now`. Re-running is a no-op for members already swept.
pub async fn sweep_expired_notices<S>(store: &S, now: DateTime<Utc>) -> ServiceResult<usize>
where
    S: NoticeStore + ?Sized,
{
    let swept = store.sweep_expired(now).await?;
    if swept.is_empty() {
        tracing::debug!("No expired notices");
    } else {
        tracing::info!(count = swept.len(), members = ?swept, "Expired notices swept");
    }
    Ok(swept.len())
}
