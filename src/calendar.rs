//! Work-calendar resolver (C1, spec §4.1).
//!
//! Translates per-day work-hour records into a sorted list of absolute
//! work intervals, and caches the derived [`WorkCalendarGap`] per date so
//! repeated queries inside one engine run don't re-walk the whole calendar.

use crate::domain::WorkCalendarDay;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

/// Policy constants Design Notes §9 calls out as open questions: keep them
/// as named config rather than magic numbers scattered through C1/C4.
#[derive(Debug, Clone, Copy)]
pub struct CalendarConfig {
    /// Rest-time padding added to every day's raw `work_hours` to get the
    /// usable gap duration. The source treats the padded hour as available
    /// work time; this crate does the same but names the constant.
    pub gap_padding_hours: f64,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            gap_padding_hours: 1.0,
        }
    }
}

/// Resolved, cached work calendar.
#[derive(Debug, Clone)]
pub struct Calendar {
    days: BTreeMap<NaiveDate, WorkCalendarDay>,
    gaps: BTreeMap<NaiveDate, (NaiveDateTime, NaiveDateTime, f64)>,
    config: CalendarConfig,
}

impl Calendar {
    pub fn new(days: Vec<WorkCalendarDay>, config: CalendarConfig) -> Self {
        let mut cal = Self {
            days: BTreeMap::new(),
            gaps: BTreeMap::new(),
            config,
        };
        for day in days {
            cal.upsert_day(day);
        }
        cal
    }

    /// Upserts one day's record and rebuilds (or removes) its cached gap.
    /// A holiday (`work_hours == 0`) has no gap at all — it's a missing
    /// day, not an error (spec §4.1 edge cases).
    pub fn upsert_day(&mut self, day: WorkCalendarDay) {
        let date = day.date;
        if day.work_hours <= 0.0 {
            self.gaps.remove(&date);
        } else {
            let gap_start = date.and_time(day.start_time_of_day);
            let duration_hours = day.work_hours + self.config.gap_padding_hours;
            let gap_end = gap_start + Duration::minutes((duration_hours * 60.0).round() as i64);
            self.gaps.insert(date, (gap_start, gap_end, duration_hours));
        }
        self.days.insert(date, day);
    }

    /// Work intervals overlapping `[from, to]`, clipped to that range and
    /// sorted by start. A single interval may cross midnight; callers must
    /// not assume one interval per calendar date.
    pub fn work_intervals(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Vec<(NaiveDateTime, NaiveDateTime)> {
        if from >= to {
            return Vec::new();
        }
        let mut out = Vec::new();
        for (_, &(gap_start, gap_end, _)) in self.gaps.range(..) {
            if gap_end <= from || gap_start >= to {
                continue;
            }
            let start = gap_start.max(from);
            let end = gap_end.min(to);
            if start < end {
                out.push((start, end));
            }
        }
        out.sort_by_key(|&(s, _)| s);
        out
    }

    /// Raw cached gap duration for one date, if it's a work day.
    pub fn gap_duration_hours(&self, date: NaiveDate) -> Option<f64> {
        self.gaps.get(&date).map(|&(_, _, d)| d)
    }

    pub fn day(&self, date: NaiveDate) -> Option<&WorkCalendarDay> {
        self.days.get(&date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32, hours: f64) -> WorkCalendarDay {
        WorkCalendarDay {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            work_hours: hours,
            start_time_of_day: chrono::NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            note: None,
        }
    }

    #[test]
    fn holiday_produces_no_interval() {
        let cal = Calendar::new(
            vec![day(2025, 12, 1, 16.0), day(2025, 12, 2, 0.0)],
            CalendarConfig::default(),
        );
        let from = NaiveDate::from_ymd_opt(2025, 12, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 12, 3)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let intervals = cal.work_intervals(from, to);
        assert_eq!(intervals.len(), 1);
    }

    #[test]
    fn gap_duration_includes_padding() {
        let cal = Calendar::new(vec![day(2025, 12, 1, 16.0)], CalendarConfig::default());
        assert_eq!(
            cal.gap_duration_hours(NaiveDate::from_ymd_opt(2025, 12, 1).unwrap()),
            Some(17.0)
        );
    }

    #[test]
    fn interval_can_cross_midnight() {
        let cal = Calendar::new(vec![day(2025, 12, 1, 16.0)], CalendarConfig::default());
        let (start, end) = cal.work_intervals(
            NaiveDate::from_ymd_opt(2025, 12, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            NaiveDate::from_ymd_opt(2025, 12, 3)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        )[0];
        assert_eq!(start.date(), NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert_eq!(end.date(), NaiveDate::from_ymd_opt(2025, 12, 2).unwrap());
        assert_eq!(end.time(), chrono::NaiveTime::from_hms_opt(1, 0, 0).unwrap());
    }
}
