//! Candidate generator (C5, spec §4.5).
//!
//! For one MMO, enumerates `(machine, start-time)` candidates across every
//! machine compatible with its mold, using the ASAP/JIT/MID/EFT strategies
//! over that machine's gaps (C4), annotating each with the timing and
//! constraint-violation data C6/C7 need.

use crate::calendar::Calendar;
use crate::constraints::{self, ConstraintConfig};
use crate::domain::{Downtime, ManufacturingOrder, MoldCalculation, ScheduleBlock};
use crate::gap_calculator::{self, GapConfig};
use crate::time_estimator;
use chrono::{Duration, NaiveDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Asap,
    Jit,
    Mid,
    Eft,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub mmo_id: String,
    pub machine_id: String,
    pub mold_code: String,
    pub strategy: Strategy,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub forming_hours: f64,
    pub changeover_minutes: f64,
    pub total_hours: f64,
    pub lateness_hours: f64,
    pub lateness_days: f64,
    pub is_on_time: bool,
    pub feasible: bool,
    pub constraint_violations: Vec<String>,
    pub yield_rank: Option<String>,
    pub frequency: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct CandidateConfig {
    pub min_gap_hours: f64,
    pub max_per_machine: usize,
    pub constraint_config: ConstraintConfig,
    pub gap_config: GapConfig,
}

impl Default for CandidateConfig {
    fn default() -> Self {
        Self {
            min_gap_hours: 0.1,
            max_per_machine: 5,
            constraint_config: ConstraintConfig::default(),
            gap_config: GapConfig::default(),
        }
    }
}

fn evaluate(
    mmo: &ManufacturingOrder,
    machine_id: &str,
    strategy: Strategy,
    start: NaiveDateTime,
    calendar: &Calendar,
    mold_calc: &MoldCalculation,
    committed: &[ScheduleBlock],
    downtimes: &[Downtime],
    config: &CandidateConfig,
) -> Candidate {
    let forming_hours = time_estimator::forming_hours(mmo.total_quantity, mold_calc);
    let changeover_minutes = time_estimator::changeover_minutes(Some(mold_calc));
    let result = time_estimator::end_time(
        calendar,
        start,
        forming_hours,
        changeover_minutes / 60.0,
        true,
    );

    let mut violations = Vec::new();
    if constraints::downtime_conflict(machine_id, start, result.end, downtimes) {
        violations.push("downtime_conflict".to_string());
    }
    let changeover_start = result.end - Duration::minutes(changeover_minutes.round() as i64);
    if constraints::changeover_forbidden_zone(changeover_start, changeover_minutes, &config.constraint_config)
    {
        violations.push("changeover_forbidden_zone".to_string());
    }
    if constraints::mold_concurrency(&mmo.mold_code, start, result.end, committed, None) {
        violations.push("mold_concurrency".to_string());
    }
    if constraints::machine_occupancy(machine_id, start, result.end, committed, None) {
        violations.push("machine_occupancy".to_string());
    }

    let lateness_hours = ((result.end - mmo.earliest_due_date).num_minutes() as f64 / 60.0).max(0.0);

    Candidate {
        mmo_id: mmo.id.clone(),
        machine_id: machine_id.to_string(),
        mold_code: mmo.mold_code.clone(),
        strategy,
        start,
        end: result.end,
        forming_hours: result.forming_hours,
        changeover_minutes,
        total_hours: result.total_hours,
        lateness_hours,
        lateness_days: lateness_hours / 24.0,
        is_on_time: lateness_hours <= 0.0,
        feasible: result.feasible && violations.is_empty(),
        constraint_violations: violations,
        yield_rank: mold_calc.yield_rank.clone(),
        frequency: mold_calc.frequency,
    }
}

/// Generates candidates for `mmo` across every machine named in
/// `mold_calcs` (already filtered to rows matching `mmo.mold_code`),
/// searching `[search_from, search_to]` on each machine.
pub fn generate_candidates(
    mmo: &ManufacturingOrder,
    mold_calcs: &[MoldCalculation],
    calendar: &Calendar,
    committed: &[ScheduleBlock],
    downtimes: &[Downtime],
    search_from: NaiveDateTime,
    search_to: NaiveDateTime,
    config: &CandidateConfig,
) -> Vec<Candidate> {
    let mut by_machine: Vec<&str> = mold_calcs.iter().map(|m| m.machine_id.as_str()).collect();
    by_machine.sort_unstable();
    by_machine.dedup();

    let mut all = Vec::new();
    for machine_id in by_machine {
        let mold_calc = mold_calcs
            .iter()
            .find(|m| m.machine_id == machine_id)
            .expect("machine_id drawn from mold_calcs");

        let probe_forming = time_estimator::forming_hours(mmo.total_quantity, mold_calc);
        let probe_changeover = time_estimator::changeover_minutes(Some(mold_calc)) / 60.0;
        let total_hours = probe_forming + probe_changeover;

        let gaps = gap_calculator::machine_gaps(
            calendar,
            machine_id,
            search_from,
            search_to,
            committed,
            downtimes,
            config.min_gap_hours,
            &config.gap_config,
        );

        let mut machine_candidates = Vec::new();
        for gap in &gaps {
            let mut produced_any = false;

            machine_candidates.push(evaluate(
                mmo, machine_id, Strategy::Asap, gap.start, calendar, mold_calc, committed, downtimes, config,
            ));
            produced_any = true;

            let jit_start = {
                let due = mmo.earliest_due_date;
                let naive_start = due - Duration::minutes((total_hours * 60.0).round() as i64);
                naive_start.max(gap.start)
            };
            if jit_start >= gap.start && jit_start < gap.end {
                machine_candidates.push(evaluate(
                    mmo, machine_id, Strategy::Jit, jit_start, calendar, mold_calc, committed, downtimes, config,
                ));
            }

            if gap.duration_hours >= 2.0 * total_hours {
                let offset_hours = (gap.duration_hours - total_hours) / 2.0;
                let mid_start = gap.start + Duration::minutes((offset_hours * 60.0).round() as i64);
                if mid_start < gap.end {
                    machine_candidates.push(evaluate(
                        mmo, machine_id, Strategy::Mid, mid_start, calendar, mold_calc, committed, downtimes, config,
                    ));
                }
            }

            let _ = produced_any;
        }

        if machine_candidates.is_empty() {
            if let Some(eft_start) = gap_calculator::earliest_feasible_time(
                calendar,
                machine_id,
                total_hours,
                search_from,
                search_to,
                committed,
                downtimes,
                &config.gap_config,
            ) {
                machine_candidates.push(evaluate(
                    mmo, machine_id, Strategy::Eft, eft_start, calendar, mold_calc, committed, downtimes, config,
                ));
            }
        }

        machine_candidates.sort_by(|a, b| {
            a.lateness_hours
                .partial_cmp(&b.lateness_hours)
                .unwrap()
                .then(b.feasible.cmp(&a.feasible))
        });
        machine_candidates.truncate(config.max_per_machine);
        all.extend(machine_candidates);
    }

    all.sort_by(|a, b| {
        a.lateness_hours
            .partial_cmp(&b.lateness_hours)
            .unwrap()
            .then(b.feasible.cmp(&a.feasible))
    });
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::CalendarConfig;
    use crate::domain::{MoStatus, WorkCalendarDay};
    use chrono::NaiveDate;

    fn calendar_with_days(n: i64) -> Calendar {
        let mut days = Vec::new();
        let mut d = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        for _ in 0..n {
            days.push(WorkCalendarDay {
                date: d,
                work_hours: 16.0,
                start_time_of_day: chrono::NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                note: None,
            });
            d = d.succ_opt().unwrap();
        }
        Calendar::new(days, CalendarConfig::default())
    }

    fn mmo() -> ManufacturingOrder {
        ManufacturingOrder {
            id: "MMO-1".into(),
            mold_code: "6X".into(),
            component_codes: ["1A1"].iter().map(|s| s.to_string()).collect(),
            total_quantity: 500,
            total_rounds: 125,
            cavity_count: 4,
            machine_id: "M01".into(),
            earliest_due_date: NaiveDate::from_ymd_opt(2025, 12, 20).unwrap().and_hms_opt(0, 0, 0).unwrap(),
            highest_priority: 1,
            status: MoStatus::Pending,
        }
    }

    fn mold_calc(machine: &str) -> MoldCalculation {
        MoldCalculation {
            component_code: "1A1".into(),
            mold_code: "6X".into(),
            machine_id: machine.into(),
            cavity_count: 4,
            avg_molding_time_sec: 30.0,
            mold_change_time_min: 30.0,
            needed_quantity: 1000,
            total_time_with_change_min: 530.0,
            yield_rank: Some("A".into()),
            frequency: Some(1.0),
        }
    }

    #[test]
    fn ample_capacity_produces_asap_candidate_starting_at_gap_start() {
        let cal = calendar_with_days(5);
        let from = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 12, 6).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let candidates = generate_candidates(
            &mmo(),
            &[mold_calc("M01")],
            &cal,
            &[],
            &[],
            from,
            to,
            &CandidateConfig::default(),
        );
        assert!(!candidates.is_empty());
        let asap = candidates.iter().find(|c| c.strategy == Strategy::Asap).unwrap();
        assert_eq!(asap.start, NaiveDate::from_ymd_opt(2025, 12, 1).unwrap().and_hms_opt(8, 0, 0).unwrap());
        assert!(asap.feasible);
    }

    #[test]
    fn candidates_are_capped_per_machine() {
        let cal = calendar_with_days(10);
        let from = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 12, 11).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let mut config = CandidateConfig::default();
        config.max_per_machine = 2;
        let candidates = generate_candidates(&mmo(), &[mold_calc("M01")], &cal, &[], &[], from, to, &config);
        assert!(candidates.len() <= 2);
    }
}
