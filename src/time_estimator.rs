//! Time estimator (C2, spec §4.2).
//!
//! The only place calendar semantics enter timing: every other component
//! passes naive `f64` hour durations around and lets `end_time` walk work
//! intervals to turn a duration into an absolute instant.

use crate::calendar::Calendar;
use crate::domain::MoldCalculation;
use chrono::{Duration, NaiveDateTime};

const HORIZON_DAYS: i64 = 30;
const DEFAULT_CHANGEOVER_MIN: f64 = 30.0;

/// Molding hours for `quantity` units of `component_code` on `machine_id`.
///
/// Preferred path: scale the matching [`MoldCalculation`] row's
/// `(total_time_with_change_min - mold_change_time_min)` by
/// `quantity / needed_quantity`. Falls back to `shots * avg_molding_time_sec
/// / 3600` when no row matches (using `mold_calc` for `cavity_count` and
/// `avg_molding_time_sec` only).
pub fn forming_hours(quantity: u32, mold_calc: &MoldCalculation) -> f64 {
    if mold_calc.needed_quantity > 0 {
        let net_change_min = mold_calc.total_time_with_change_min - mold_calc.mold_change_time_min;
        net_change_min * (quantity as f64 / mold_calc.needed_quantity as f64) / 60.0
    } else {
        let shots = (quantity as f64 / mold_calc.cavity_count.max(1) as f64).ceil();
        shots * mold_calc.avg_molding_time_sec / 3600.0
    }
}

/// Changeover minutes for this `(component, machine)`. Not scaled by
/// quantity. Defaults to 30 minutes when the mold calculation is silent.
pub fn changeover_minutes(mold_calc: Option<&MoldCalculation>) -> f64 {
    mold_calc
        .map(|m| m.mold_change_time_min)
        .unwrap_or(DEFAULT_CHANGEOVER_MIN)
}

/// Outcome of walking `total_hours` worth of work time forward from `start`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndTimeResult {
    pub end: NaiveDateTime,
    pub forming_hours: f64,
    pub total_hours: f64,
    /// `false` if the 30-day horizon was exhausted before `total_hours`
    /// could be consumed; `end` is then only a provisional instant and the
    /// caller must treat the candidate as infeasible.
    pub feasible: bool,
}

/// Walks `work_intervals(start, start + 30d)` consuming `total_hours` of
/// work time; if `start` itself falls outside every interval, it is
/// advanced to the next interval's start first.
pub fn end_time(
    calendar: &Calendar,
    start: NaiveDateTime,
    forming_h: f64,
    changeover_h: f64,
    include_changeover: bool,
) -> EndTimeResult {
    let total_hours = if include_changeover {
        forming_h + changeover_h
    } else {
        forming_h
    };
    let horizon = start + Duration::days(HORIZON_DAYS);
    let intervals = calendar.work_intervals(start, horizon);

    let mut remaining_min = (total_hours * 60.0).round() as i64;
    let mut current = start;
    let mut started = false;

    for (interval_start, interval_end) in &intervals {
        let interval_start = *interval_start;
        let interval_end = *interval_end;
        if !started {
            if current < interval_start {
                current = interval_start;
            } else if current >= interval_end {
                continue;
            }
            started = true;
        } else if current < interval_start {
            current = interval_start;
        }

        if remaining_min <= 0 {
            break;
        }
        let available_min = (interval_end - current).num_minutes().max(0);
        let consumed = remaining_min.min(available_min);
        current += Duration::minutes(consumed);
        remaining_min -= consumed;
        if remaining_min <= 0 {
            break;
        }
    }

    EndTimeResult {
        end: current,
        forming_hours: forming_h,
        total_hours,
        feasible: remaining_min <= 0,
    }
}
