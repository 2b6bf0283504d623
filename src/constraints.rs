//! Constraint checker (C3, spec §4.3).
//!
//! Every check here returns `true` on *violation*, matching the source
//! checker's boolean-predicate shape. C6 composes these into a structured
//! [`crate::validator::ValidationResult`]; C4/C5 call the narrower ones
//! directly while enumerating gaps and candidates.

use crate::domain::{overlap, Downtime, MoStatus, ScheduleBlock};
use chrono::{Duration, NaiveDateTime, NaiveTime};

/// Policy knobs Design Notes §9 names as open questions, kept here rather
/// than hardcoded so the decision in `DESIGN.md` has one place to live.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintConfig {
    /// Whether a block's *start* (not just a changeover) must also avoid
    /// the forbidden zone. Observed behavior only enforces this for
    /// changeovers, so this defaults to `false`.
    pub forbidden_zone_blocks_starts: bool,
    pub forbidden_zone_start: NaiveTime,
    pub forbidden_zone_end: NaiveTime,
    pub shift_end_time: NaiveTime,
}

impl Default for ConstraintConfig {
    fn default() -> Self {
        Self {
            forbidden_zone_blocks_starts: false,
            forbidden_zone_start: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            forbidden_zone_end: NaiveTime::from_hms_opt(1, 0, 0).unwrap(),
            shift_end_time: NaiveTime::from_hms_opt(1, 0, 0).unwrap(),
        }
    }
}

/// Any downtime slot on `machine_id` whose window overlaps `(start, end)`.
pub fn downtime_conflict(
    machine_id: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
    downtimes: &[Downtime],
) -> bool {
    downtimes
        .iter()
        .filter(|dt| dt.machine_id == machine_id)
        .any(|dt| overlap(dt.start, dt.end, start, end))
}

/// The changeover window `(changeover_start, changeover_start + minutes)`
/// must not overlap the daily forbidden band `[20:00, next-day 01:00]` on
/// either the current or previous calendar day.
pub fn changeover_forbidden_zone(
    changeover_start: NaiveDateTime,
    minutes: f64,
    config: &ConstraintConfig,
) -> bool {
    let changeover_end = changeover_start + Duration::minutes(minutes.round() as i64);
    let date = changeover_start.date();
    [date.pred_opt().unwrap(), date]
        .into_iter()
        .any(|band_date| {
            let band_start = band_date.and_time(config.forbidden_zone_start);
            let band_end = band_date.succ_opt().unwrap().and_time(config.forbidden_zone_end);
            overlap(band_start, band_end, changeover_start, changeover_end)
        })
}

/// When `must_align`, `end`'s wall-clock time must equal the configured
/// shift-end (default `01:00`). Returns `true` on mismatch.
pub fn shift_end_misalignment(
    end: NaiveDateTime,
    must_align: bool,
    config: &ConstraintConfig,
) -> bool {
    must_align && end.time() != config.shift_end_time
}

/// Two committed blocks sharing `mold_code` must not overlap: a physical
/// mold occupies exactly one machine at any instant.
pub fn mold_concurrency(
    mold_code: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
    committed: &[ScheduleBlock],
    exclude_id: Option<&str>,
) -> bool {
    committed.iter().any(|b| {
        b.mold_code == mold_code
            && Some(b.block_id.as_str()) != exclude_id
            && b.status != MoStatus::Failed
            && overlap(b.start, b.end, start, end)
    })
}

/// No two committed blocks on the same machine may overlap.
pub fn machine_occupancy(
    machine_id: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
    committed: &[ScheduleBlock],
    exclude_id: Option<&str>,
) -> bool {
    committed.iter().any(|b| {
        b.machine_id == machine_id
            && Some(b.block_id.as_str()) != exclude_id
            && b.status != MoStatus::Failed
            && overlap(b.start, b.end, start, end)
    })
}
