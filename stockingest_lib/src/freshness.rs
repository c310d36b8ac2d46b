//! Decides whether a ticker's stored company metadata must be refetched.

use chrono::{DateTime, Duration, Utc};

use crate::config::DEFAULT_STALENESS_DAYS;
use crate::models::StockMeta;

/// Default staleness window for company metadata.
pub fn default_window() -> Duration {
    Duration::days(DEFAULT_STALENESS_DAYS)
}

/// True when the ticker's metadata should be fetched again, using the default window.
pub fn needs_refresh(meta: Option<&StockMeta>, now: DateTime<Utc>) -> bool {
    needs_refresh_within(meta, now, default_window())
}

/// True when there is no stored row, sector or industry is missing (or blank),
/// the refresh timestamp is missing, or it is strictly older than `now - window`.
///
/// A refresh exactly `window` ago still counts as fresh.
pub fn needs_refresh_within(meta: Option<&StockMeta>, now: DateTime<Utc>, window: Duration) -> bool {
    let Some(meta) = meta else {
        return true;
    };
    if is_blank(meta.sector.as_deref()) || is_blank(meta.industry.as_deref()) {
        return true;
    }
    match meta.last_metadata_refresh {
        None => true,
        Some(refreshed) => refreshed < now - window,
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 22, 30, 0).unwrap()
    }

    fn complete(refreshed: Option<DateTime<Utc>>) -> StockMeta {
        StockMeta {
            company_name: Some("Apple Inc.".to_string()),
            sector: Some("Technology".to_string()),
            industry: Some("Consumer Electronics".to_string()),
            market_cap: Some(3_000_000_000_000),
            last_metadata_refresh: refreshed,
        }
    }

    #[test]
    fn missing_row_is_stale() {
        assert!(needs_refresh(None, now()));
    }

    #[test]
    fn refreshed_yesterday_is_fresh() {
        let meta = complete(Some(now() - Duration::days(1)));
        assert!(!needs_refresh(Some(&meta), now()));
    }

    #[test]
    fn refreshed_eight_days_ago_is_stale() {
        let meta = complete(Some(now() - Duration::days(8)));
        assert!(needs_refresh(Some(&meta), now()));
    }

    #[test]
    fn exactly_on_the_boundary_is_fresh() {
        let meta = complete(Some(now() - Duration::days(7)));
        assert!(!needs_refresh(Some(&meta), now()));

        let meta = complete(Some(now() - Duration::days(7) - Duration::seconds(1)));
        assert!(needs_refresh(Some(&meta), now()));
    }

    #[test]
    fn missing_timestamp_is_stale() {
        assert!(needs_refresh(Some(&complete(None)), now()));
    }

    #[test]
    fn missing_or_blank_classification_is_stale() {
        let mut meta = complete(Some(now()));
        meta.sector = None;
        assert!(needs_refresh(Some(&meta), now()));

        let mut meta = complete(Some(now()));
        meta.industry = Some("   ".to_string());
        assert!(needs_refresh(Some(&meta), now()));
    }

    #[test]
    fn shell_row_is_stale() {
        assert!(needs_refresh(Some(&StockMeta::default()), now()));
    }

    #[test]
    fn custom_window() {
        let meta = complete(Some(now() - Duration::days(2)));
        assert!(needs_refresh_within(Some(&meta), now(), Duration::days(1)));
        assert!(!needs_refresh_within(Some(&meta), now(), Duration::days(3)));
    }
}
