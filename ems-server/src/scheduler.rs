//! Daily notice sweep
//!
//! Fires once a day at the configured local hour and deactivates members
//! whose approved notice period has ended.

use chrono::{DateTime, Duration, Local, NaiveTime, TimeZone, Utc};

use crate::db::PgStore;
use crate::services::sweep::sweep_expired_notices;

/// Next firing strictly after `now` at `hour:00` local time
fn next_run<Tz: TimeZone>(now: DateTime<Tz>, hour: u32) -> DateTime<Tz> {
    let at = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
    let tz = now.timezone();
    let mut day = now.date_naive();
    loop {
        // Skip days where the hour falls in a DST gap
        if let Some(candidate) = tz.from_local_datetime(&day.and_time(at)).earliest()
            && candidate > now
        {
            return candidate;
        }
        day += Duration::days(1);
    }
}

pub async fn run(store: PgStore, hour: u32) {
    tracing::info!(hour, "Notice sweep scheduled");
    loop {
        let now = Local::now();
        let wait = (next_run(now, hour) - now)
            .to_std()
            .unwrap_or(std::time::Duration::from_secs(60));
        tokio::time::sleep(wait).await;

        if let Err(e) = sweep_expired_notices(&store, Utc::now()).await {
            tracing::error!(error = ?e, "Notice sweep failed");
        }
    }
}
