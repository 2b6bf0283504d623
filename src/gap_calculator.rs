//! Gap calculator (C4, spec §4.4).
//!
//! Produces the sorted list of usable time windows on one machine: bounded
//! by its committed blocks, clamped to the day's work-start, split by
//! downtimes, and measured in work-duration rather than wall-clock.

use crate::calendar::Calendar;
use crate::domain::{overlap, Downtime, ScheduleBlock};
use chrono::{NaiveDateTime, NaiveTime};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeGap {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub duration_hours: f64,
}

/// The hour candidate gaps are clamped forward to, to avoid allocating work
/// during the pre-dawn shadow before the shift actually starts.
#[derive(Debug, Clone, Copy)]
pub struct GapConfig {
    pub work_start: NaiveTime,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            work_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        }
    }
}

fn work_duration_hours(calendar: &Calendar, start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    calendar
        .work_intervals(start, end)
        .iter()
        .map(|(s, e)| (*e - *s).num_minutes() as f64 / 60.0)
        .sum()
}

/// Clamps `start` forward to the configured work-start time of day, if it
/// falls before it on the same calendar date.
fn clamp_to_work_start(start: NaiveDateTime, config: &GapConfig) -> NaiveDateTime {
    if start.time() < config.work_start {
        start.date().and_time(config.work_start)
    } else {
        start
    }
}

/// Splits `[start, end]` by the machine's downtimes inside that range,
/// producing the sub-ranges that remain once every downtime is removed.
fn split_by_downtimes(
    start: NaiveDateTime,
    end: NaiveDateTime,
    machine_id: &str,
    downtimes: &[Downtime],
) -> Vec<(NaiveDateTime, NaiveDateTime)> {
    let mut cuts: Vec<(NaiveDateTime, NaiveDateTime)> = downtimes
        .iter()
        .filter(|dt| dt.machine_id == machine_id && overlap(dt.start, dt.end, start, end))
        .map(|dt| (dt.start.max(start), dt.end.min(end)))
        .collect();
    cuts.sort_by_key(|&(s, _)| s);

    let mut out = Vec::new();
    let mut cursor = start;
    for (cut_start, cut_end) in cuts {
        if cut_start > cursor {
            out.push((cursor, cut_start));
        }
        cursor = cursor.max(cut_end);
    }
    if cursor < end {
        out.push((cursor, end));
    }
    out
}

/// Sorted gaps on `machine_id` within `[from, to]`, after clamping,
/// downtime-splitting and filtering by `min_hours` of work-duration.
pub fn machine_gaps(
    calendar: &Calendar,
    machine_id: &str,
    from: NaiveDateTime,
    to: NaiveDateTime,
    committed: &[ScheduleBlock],
    downtimes: &[Downtime],
    min_hours: f64,
    config: &GapConfig,
) -> Vec<TimeGap> {
    let mut blocks: Vec<&ScheduleBlock> = committed
        .iter()
        .filter(|b| b.machine_id == machine_id && overlap(b.start, b.end, from, to))
        .collect();
    blocks.sort_by_key(|b| b.start);

    let mut candidates = Vec::new();
    let mut cursor = from;
    for block in &blocks {
        if block.start > cursor {
            candidates.push((cursor, block.start));
        }
        cursor = cursor.max(block.end);
    }
    if cursor < to {
        candidates.push((cursor, to));
    }

    let mut gaps = Vec::new();
    for (raw_start, raw_end) in candidates {
        let clamped_start = clamp_to_work_start(raw_start, config);
        if clamped_start >= raw_end {
            continue;
        }
        for (sub_start, sub_end) in split_by_downtimes(clamped_start, raw_end, machine_id, downtimes) {
            let duration_hours = work_duration_hours(calendar, sub_start, sub_end);
            if duration_hours >= min_hours {
                gaps.push(TimeGap {
                    start: sub_start,
                    end: sub_end,
                    duration_hours,
                });
            }
        }
    }
    gaps
}

/// First sub-gap start satisfying `duration_hours >= required_hours`,
/// stepping past any embedded downtime by construction (each returned gap
/// is already downtime-free).
pub fn earliest_feasible_time(
    calendar: &Calendar,
    machine_id: &str,
    required_hours: f64,
    from: NaiveDateTime,
    to: NaiveDateTime,
    committed: &[ScheduleBlock],
    downtimes: &[Downtime],
    config: &GapConfig,
) -> Option<NaiveDateTime> {
    machine_gaps(calendar, machine_id, from, to, committed, downtimes, required_hours, config)
        .into_iter()
        .map(|g| g.start)
        .next()
}
