//! Validator (C6, spec §4.6).
//!
//! Re-runs the C3 checks against a specific committed set (allowing an
//! `exclude_id` for reschedules) and returns a structured violation list,
//! independent of whatever the candidate generator already attached.

use crate::calendar::Calendar;
use crate::candidate_generator::Candidate;
use crate::constraints::{self, ConstraintConfig};
use crate::domain::{Downtime, ScheduleBlock};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintViolation {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub mo_id: String,
    pub machine_id: String,
    pub mold_code: String,
    pub time_range: (NaiveDateTime, NaiveDateTime),
    pub severity: Severity,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub violations: Vec<ConstraintViolation>,
    pub warnings: Vec<ConstraintViolation>,
}

/// Runs every C3 check for `candidate` against `committed`, with
/// `exclude_id` exempted from the mold/machine occupancy checks (used when
/// re-validating a candidate that is itself already committed). `calendar`
/// determines whether committing this candidate would split it (C11) across
/// work-interval boundaries, which is what makes `shift_end_misalignment`
/// applicable at all.
pub fn validate(
    candidate: &Candidate,
    committed: &[ScheduleBlock],
    downtimes: &[Downtime],
    exclude_id: Option<&str>,
    calendar: &Calendar,
    config: &ConstraintConfig,
) -> ValidationResult {
    let mut violations = Vec::new();
    let mut warnings = Vec::new();
    let time_range = (candidate.start, candidate.end);

    let mut push = |kind: &str, message: String, severity: Severity| {
        let v = ConstraintViolation {
            kind: kind.to_string(),
            message,
            mo_id: candidate.mmo_id.clone(),
            machine_id: candidate.machine_id.clone(),
            mold_code: candidate.mold_code.clone(),
            time_range,
            severity,
        };
        match severity {
            Severity::Error => violations.push(v),
            Severity::Warning => warnings.push(v),
        }
    };

    if constraints::downtime_conflict(&candidate.machine_id, candidate.start, candidate.end, downtimes) {
        push(
            "downtime_conflict",
            "candidate overlaps a machine downtime window".to_string(),
            Severity::Error,
        );
    }

    let changeover_start = candidate.end - Duration::minutes(candidate.changeover_minutes.round() as i64);
    if constraints::changeover_forbidden_zone(changeover_start, candidate.changeover_minutes, config) {
        push(
            "changeover_forbidden_zone",
            "changeover overlaps the 20:00-01:00 forbidden band".to_string(),
            Severity::Error,
        );
    }

    if constraints::mold_concurrency(&candidate.mold_code, candidate.start, candidate.end, committed, exclude_id) {
        push(
            "mold_concurrency",
            "mold is already committed to another machine in this window".to_string(),
            Severity::Error,
        );
    }

    if constraints::machine_occupancy(&candidate.machine_id, candidate.start, candidate.end, committed, exclude_id) {
        push(
            "machine_occupancy",
            "machine already has a committed block in this window".to_string(),
            Severity::Error,
        );
    }

    // Committing this candidate would split it (C11) wherever it crosses a
    // work-interval boundary; every boundary but the last becomes a
    // non-final sub-block end, which must land exactly on shift-end.
    let intervals = calendar.work_intervals(candidate.start, candidate.end);
    if intervals.len() > 1 {
        for (_, interval_end) in intervals.iter().take(intervals.len() - 1) {
            if constraints::shift_end_misalignment(*interval_end, true, config) {
                push(
                    "shift_end_misalignment",
                    "split boundary does not align to the configured shift end".to_string(),
                    Severity::Warning,
                );
            }
        }
    }

    ValidationResult {
        is_valid: violations.is_empty(),
        violations,
        warnings,
    }
}
