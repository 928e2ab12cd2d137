// Business-hours arithmetic: weekday time inside the working window
use crate::engine::WorkHours;
use chrono::{Datelike, NaiveDateTime, NaiveTime, Weekday};

/// Seconds between `from` and `to` that fall on a weekday within `work_hours`
///
/// Returns 0 when `to` is not after `from`.
pub fn business_seconds(from: NaiveDateTime, to: NaiveDateTime, work_hours: WorkHours) -> f64 {
    if to <= from {
        return 0.0;
    }

    let [start_hour, end_hour] = work_hours;
    let mut total_ms: i64 = 0;
    let mut day = from.date();

    while day <= to.date() {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            let open = day.and_time(hour(start_hour));
            let close = if end_hour >= 24 {
                (day + chrono::Duration::days(1)).and_time(NaiveTime::MIN)
            } else {
                day.and_time(hour(end_hour))
            };

            let lo = open.max(from);
            let hi = close.min(to);
            if hi > lo {
                total_ms += (hi - lo).num_milliseconds();
            }
        }

        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }

    total_ms as f64 / 1000.0
}

fn hour(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h.min(23), 0, 0).unwrap_or(NaiveTime::MIN)
}
