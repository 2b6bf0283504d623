//! Order merger (C8, spec §4.8).
//!
//! Optional post-selection stage: groups tentative per-MMO assignments
//! sharing a component and machine, and folds those whose due dates fall
//! within a rolling window into one synthetic block when that's feasible
//! and doesn't push anyone past their original due date.

use crate::candidate_generator::Candidate;
use crate::constraints::ConstraintConfig;
use crate::domain::{Downtime, ManufacturingOrder, MoStatus, MoldCalculation, ScheduleBlock};
use crate::time_estimator;
use crate::validator;
use crate::calendar::Calendar;
use chrono::{Duration, NaiveDateTime};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct MergeConfig {
    pub merge_window_weeks: i64,
    pub constraint_config: ConstraintConfig,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            merge_window_weeks: 2,
            constraint_config: ConstraintConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AcceptedMerge {
    pub block: ScheduleBlock,
    pub merged_mmo_ids: Vec<String>,
    pub saved_changeover_hours: f64,
}

fn primary_component(mmo: &ManufacturingOrder) -> String {
    mmo.component_codes.iter().next().cloned().unwrap_or_default()
}

fn earliest_start(tentative: &[(&ManufacturingOrder, &Candidate)]) -> NaiveDateTime {
    tentative.iter().map(|(_, c)| c.start).min().expect("non-empty group")
}

/// Runs the merge pass over `tentative` (MMO, chosen-candidate) pairs from
/// a full candidate/select pass, returning the accepted merges. Members of
/// an accepted merge should be removed from the standard per-MMO queue by
/// the caller.
pub fn merge(
    tentative: &[(ManufacturingOrder, Candidate)],
    mold_calcs: &[MoldCalculation],
    calendar: &Calendar,
    committed: &[ScheduleBlock],
    downtimes: &[Downtime],
    config: &MergeConfig,
) -> Vec<AcceptedMerge> {
    let mut groups: BTreeMap<(String, String), Vec<&(ManufacturingOrder, Candidate)>> = BTreeMap::new();
    for pair in tentative {
        let key = (primary_component(&pair.0), pair.1.machine_id.clone());
        groups.entry(key).or_default().push(pair);
    }

    let window = Duration::weeks(config.merge_window_weeks);
    let mut accepted = Vec::new();

    for ((component_code, machine_id), mut members) in groups {
        members.sort_by_key(|(mmo, _)| mmo.earliest_due_date);
        let earliest_due = members[0].0.earliest_due_date;
        let in_window: Vec<&(ManufacturingOrder, Candidate)> = members
            .into_iter()
            .filter(|(mmo, _)| mmo.earliest_due_date <= earliest_due + window)
            .collect();

        if in_window.len() < 2 {
            continue;
        }

        let mold_calc = match mold_calcs
            .iter()
            .find(|m| m.component_code == component_code && m.machine_id == machine_id)
        {
            Some(m) => m,
            None => continue,
        };

        let total_quantity: u32 = in_window.iter().map(|(mmo, _)| mmo.total_quantity).sum();
        let mold_code = in_window[0].0.mold_code.clone();
        let tentative_refs: Vec<(&ManufacturingOrder, &Candidate)> =
            in_window.iter().map(|(m, c)| (m, c)).collect();
        let start = earliest_start(&tentative_refs);

        let forming_hours = time_estimator::forming_hours(total_quantity, mold_calc);
        let changeover_minutes = time_estimator::changeover_minutes(Some(mold_calc));
        let result = time_estimator::end_time(calendar, start, forming_hours, changeover_minutes / 60.0, true);

        if !result.feasible || result.end > earliest_due {
            continue;
        }

        let candidate_for_validation = Candidate {
            mmo_id: format!("merged-{mold_code}"),
            machine_id: machine_id.clone(),
            mold_code: mold_code.clone(),
            strategy: in_window[0].1.strategy,
            start,
            end: result.end,
            forming_hours: result.forming_hours,
            changeover_minutes,
            total_hours: result.total_hours,
            lateness_hours: 0.0,
            lateness_days: 0.0,
            is_on_time: true,
            feasible: true,
            constraint_violations: vec![],
            yield_rank: mold_calc.yield_rank.clone(),
            frequency: mold_calc.frequency,
        };
        let validation = validator::validate(&candidate_for_validation, committed, downtimes, None, calendar, &config.constraint_config);
        if !validation.is_valid {
            continue;
        }

        let member_count = in_window.len() as f64;
        let saved_changeover_hours = (member_count - 1.0) * (changeover_minutes / 60.0);

        let mut component_codes: BTreeSet<String> = BTreeSet::new();
        let mut mo_ids = Vec::new();
        for (mmo, _) in &in_window {
            component_codes.extend(mmo.component_codes.iter().cloned());
            mo_ids.push(mmo.id.clone());
        }

        let block = ScheduleBlock {
            block_id: Uuid::new_v4().to_string(),
            machine_id: machine_id.clone(),
            mold_code: mold_code.clone(),
            start,
            end: result.end,
            mo_ids: mo_ids.clone(),
            component_codes,
            product_display: component_code.clone(),
            status: MoStatus::Scheduled,
            is_merged: true,
            is_locked: false,
            has_changeover: true,
            split_part: 1,
            total_splits: 1,
        };

        accepted.push(AcceptedMerge {
            block,
            merged_mmo_ids: mo_ids,
            saved_changeover_hours,
        });
    }

    accepted
}
