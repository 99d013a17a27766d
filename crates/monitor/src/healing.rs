//! Heuristic "healing in progress" signal.
//!
//! A node writes an activity row containing "Healed" each time it restores a
//! chunk from a peer. Seeing such a row within the last five seconds is taken
//! as a sign that repair is ongoing. This is a coarse proxy derived from the
//! log contract, not an authoritative repair state.

use chrono::{DateTime, Duration, Utc};
use shardwatch_activity_log::ActivityEvent;

/// Marker that identifies a repair event, matched case-insensitively.
pub const HEALED_MARKER: &str = "healed";

/// How recent a repair event must be to count, in milliseconds.
pub const HEALING_WINDOW_MS: i64 = 5000;

/// Whether any event is a repair that happened in `[now - 5s, now]`.
///
/// Events stamped after `now` (clock skew) never count.
#[must_use]
pub fn detect(events: &[ActivityEvent], now: DateTime<Utc>) -> bool {
    events.iter().any(|event| is_recent_repair(event, now))
}

fn is_recent_repair(event: &ActivityEvent, now: DateTime<Utc>) -> bool {
    let elapsed = now.signed_duration_since(event.time);

    elapsed >= Duration::zero()
        && elapsed < Duration::milliseconds(HEALING_WINDOW_MS)
        && event.action.to_lowercase().contains(HEALED_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn event(action: &str, ago_ms: i64) -> ActivityEvent {
        ActivityEvent::new(
            "1",
            now() - Duration::milliseconds(ago_ms),
            "S2",
            action,
        )
    }

    #[test]
    fn test_empty_batch_is_not_healing() {
        assert!(!detect(&[], now()));
    }

    #[test]
    fn test_recent_heal_is_healing() {
        assert!(detect(&[event("Healed chunk 4", 2000)], now()));
    }

    #[test]
    fn test_stale_heal_is_not_healing() {
        assert!(!detect(&[event("Healed chunk 4", 6000)], now()));
    }

    #[test]
    fn test_window_bounds() {
        assert!(detect(&[event("Healed chunk 4", 0)], now()));
        assert!(detect(&[event("Healed chunk 4", 4999)], now()));
        assert!(!detect(&[event("Healed chunk 4", 5000)], now()));
    }

    #[test]
    fn test_future_event_is_not_healing() {
        assert!(!detect(&[event("Healed chunk 4", -1)], now()));
        assert!(!detect(&[event("Healed chunk 4", -3000)], now()));
    }

    #[test]
    fn test_marker_is_case_insensitive() {
        assert!(detect(&[event("HEALED chunk 0002_ab", 100)], now()));
        assert!(detect(&[event("chunk 7 self-healed", 100)], now()));
    }

    #[test]
    fn test_other_actions_do_not_count() {
        let events = [
            event("Uploaded file: a.txt (abc)", 100),
            event("S3 attacked", 200),
            event("Healing started", 300),
        ];

        assert!(!detect(&events, now()));
    }

    #[test]
    fn test_any_matching_event_suffices() {
        let events = [
            event("S3 attacked", 100),
            event("Healed chunk 1", 9000),
            event("Healed chunk 2", 1500),
        ];

        assert!(detect(&events, now()));
    }
}
