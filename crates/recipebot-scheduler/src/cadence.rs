//! Cadence policies — when the next regular dispatch happens.
//!
//! - `Interval`: a fixed wait after each completed dispatch
//! - `Daily`: the soonest upcoming configured clock time, rolling over to
//!   tomorrow once today's times have passed

use chrono::{DateTime, Days, NaiveTime, TimeZone};
use recipebot_core::config::{CadenceConfig, CadenceMode, MAX_INTERVAL_HOURS};
use recipebot_core::error::{RecipeBotError, Result};
use std::time::Duration;

/// Used only when a daily cadence has no times, which config validation rejects.
const EMPTY_DAILY_FALLBACK: Duration = Duration::from_secs(24 * 3600);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cadence {
    Interval(Duration),
    /// Sorted, deduplicated clock times.
    Daily(Vec<NaiveTime>),
}

impl Cadence {
    pub fn from_config(config: &CadenceConfig) -> Result<Self> {
        match config.mode {
            CadenceMode::Interval => {
                let hours = config.interval_hours;
                if !(hours.is_finite() && hours > 0.0 && hours <= MAX_INTERVAL_HOURS) {
                    return Err(RecipeBotError::Config(format!(
                        "invalid interval of {hours} hours"
                    )));
                }
                let every = Duration::try_from_secs_f64(hours * 3600.0).map_err(|e| {
                    RecipeBotError::Config(format!("invalid interval of {hours} hours: {e}"))
                })?;
                Ok(Cadence::Interval(every))
            }
            CadenceMode::Daily => Ok(Cadence::Daily(config.parsed_daily_times()?)),
        }
    }

    pub fn every_hours(hours: u64) -> Self {
        Cadence::Interval(Duration::from_secs(hours.saturating_mul(3600)))
    }

    pub fn daily(mut times: Vec<NaiveTime>) -> Self {
        times.sort();
        times.dedup();
        Cadence::Daily(times)
    }

    /// Next trigger strictly after `now`. `None` when the interval does not
    /// fit a calendar date or the daily list is empty.
    pub fn next_trigger<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        match self {
            Cadence::Interval(every) => {
                let step = chrono::Duration::from_std(*every).ok()?;
                now.clone().checked_add_signed(step)
            }
            Cadence::Daily(times) => next_daily_trigger(times, now),
        }
    }

    /// How long to wait from `now` until the next trigger.
    ///
    /// Intervals are measured from the end of the last dispatch and ignore
    /// the wall clock. Daily triggers are computed strictly after both
    /// `now` and `last_trigger`, so a wall clock running behind the
    /// monotonic one cannot fire the same slot twice; `last_trigger` is
    /// updated to the trigger being waited for.
    pub fn delay_from<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
        last_trigger: &mut Option<DateTime<Tz>>,
    ) -> Duration {
        match self {
            Cadence::Interval(every) => *every,
            Cadence::Daily(times) => {
                let from = match last_trigger.as_ref() {
                    Some(last) if last > now => last.clone(),
                    _ => now.clone(),
                };
                let Some(next) = next_daily_trigger(times, &from) else {
                    return EMPTY_DAILY_FALLBACK;
                };
                let delay = (next.clone() - now.clone()).to_std().unwrap_or_default();
                *last_trigger = Some(next);
                delay
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Cadence::Interval(every) => {
                let secs = every.as_secs();
                if secs % 3600 == 0 {
                    format!("every {}h", secs / 3600)
                } else {
                    format!("every {}m", secs / 60)
                }
            }
            Cadence::Daily(times) => {
                let list: Vec<String> = times.iter().map(|t| t.format("%H:%M").to_string()).collect();
                format!("daily at {}", list.join(", "))
            }
        }
    }
}

/// Soonest occurrence of any of `times` strictly after `now`, in `now`'s zone.
/// Times that fall into a DST gap are skipped for that day.
pub fn next_daily_trigger<Tz: TimeZone>(
    times: &[NaiveTime],
    now: &DateTime<Tz>,
) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    let today = now.date_naive();

    for offset in 0..=2 {
        let date = today.checked_add_days(Days::new(offset))?;
        let mut best: Option<DateTime<Tz>> = None;
        for time in times {
            let Some(candidate) = tz.from_local_datetime(&date.and_time(*time)).earliest() else {
                continue;
            };
            if candidate > *now && best.as_ref().is_none_or(|b| candidate < *b) {
                best = Some(candidate);
            }
        }
        if best.is_some() {
            return best;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Timelike, Utc};

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn morning_evening() -> Cadence {
        Cadence::daily(vec![hm(18, 0), hm(8, 0)])
    }

    #[test]
    fn test_daily_wraps_to_next_day() {
        let now = Utc.with_ymd_and_hms(2026, 2, 22, 19, 0, 0).unwrap();
        let next = morning_evening().next_trigger(&now).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 2, 23, 8, 0, 0).unwrap());

        let mut last = None;
        assert_eq!(
            morning_evening().delay_from(&now, &mut last),
            Duration::from_secs(13 * 3600)
        );
        assert_eq!(last, Some(next));
    }

    #[test]
    fn test_daily_picks_soonest_today() {
        let now = Utc.with_ymd_and_hms(2026, 2, 22, 7, 30, 0).unwrap();
        let next = morning_evening().next_trigger(&now).unwrap();
        assert_eq!(next.hour(), 8);
        assert_eq!(next.minute(), 0);

        let now = Utc.with_ymd_and_hms(2026, 2, 22, 12, 0, 0).unwrap();
        assert_eq!(morning_evening().next_trigger(&now).unwrap().hour(), 18);
    }

    #[test]
    fn test_daily_exact_time_moves_to_next_slot() {
        let now = Utc.with_ymd_and_hms(2026, 2, 22, 8, 0, 0).unwrap();
        assert_eq!(morning_evening().next_trigger(&now).unwrap().hour(), 18);
    }

    #[test]
    fn test_daily_lagging_wall_clock_does_not_repeat_slot() {
        let cadence = morning_evening();
        let eight = Utc.with_ymd_and_hms(2026, 2, 22, 8, 0, 0).unwrap();
        let mut last = Some(eight);

        // Woke for the 08:00 slot but the wall clock reads 10ms early
        let now = eight - chrono::Duration::milliseconds(10);
        let delay = cadence.delay_from(&now, &mut last);

        assert_eq!(delay, Duration::from_millis(10 * 3600 * 1000 + 10));
        assert_eq!(last, Some(Utc.with_ymd_and_hms(2026, 2, 22, 18, 0, 0).unwrap()));
    }

    #[test]
    fn test_daily_stale_last_trigger_is_ignored() {
        let cadence = morning_evening();
        let mut last = Some(Utc.with_ymd_and_hms(2026, 2, 20, 18, 0, 0).unwrap());
        let now = Utc.with_ymd_and_hms(2026, 2, 22, 12, 0, 0).unwrap();
        assert_eq!(cadence.delay_from(&now, &mut last), Duration::from_secs(6 * 3600));
    }

    #[test]
    fn test_daily_crosses_month_end() {
        let now = Utc.with_ymd_and_hms(2026, 2, 28, 23, 0, 0).unwrap();
        let next = morning_evening().next_trigger(&now).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_daily_respects_offset_zone() {
        let tz = chrono::FixedOffset::east_opt(3 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2026, 2, 22, 19, 0, 0).unwrap();
        let next = morning_evening().next_trigger(&now).unwrap();
        assert_eq!(next, tz.with_ymd_and_hms(2026, 2, 23, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_interval_from_now() {
        let now = Utc.with_ymd_and_hms(2026, 2, 22, 10, 0, 0).unwrap();
        let cadence = Cadence::every_hours(8);
        assert_eq!(cadence.next_trigger(&now).unwrap().hour(), 18);

        let mut last = None;
        assert_eq!(cadence.delay_from(&now, &mut last), Duration::from_secs(8 * 3600));
        assert!(last.is_none());
    }

    #[test]
    fn test_interval_beyond_calendar_has_no_trigger() {
        let now = Utc.with_ymd_and_hms(2026, 2, 22, 10, 0, 0).unwrap();
        assert!(Cadence::every_hours(u64::MAX).next_trigger(&now).is_none());
    }

    #[test]
    fn test_from_config() {
        let mut config = CadenceConfig::default();
        assert_eq!(
            Cadence::from_config(&config).unwrap(),
            Cadence::every_hours(8)
        );

        config.mode = CadenceMode::Daily;
        config.daily_times = vec!["18:00".into(), "08:00".into(), "08:00".into()];
        assert_eq!(
            Cadence::from_config(&config).unwrap(),
            Cadence::Daily(vec![hm(8, 0), hm(18, 0)])
        );

        config.mode = CadenceMode::Interval;
        config.interval_hours = -1.0;
        assert!(Cadence::from_config(&config).is_err());
    }

    #[test]
    fn test_from_config_rejects_oversized_interval() {
        let config = CadenceConfig {
            interval_hours: 1e300,
            ..CadenceConfig::default()
        };
        assert!(matches!(
            Cadence::from_config(&config),
            Err(RecipeBotError::Config(_))
        ));

        let config = CadenceConfig {
            interval_hours: MAX_INTERVAL_HOURS,
            ..CadenceConfig::default()
        };
        assert_eq!(
            Cadence::from_config(&config).unwrap(),
            Cadence::every_hours(24 * 365)
        );
    }

    #[test]
    fn test_describe() {
        assert_eq!(Cadence::every_hours(8).describe(), "every 8h");
        assert_eq!(morning_evening().describe(), "daily at 08:00, 18:00");
    }
}
