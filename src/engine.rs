//! Engine orchestrator (C10, spec §4.10) plus the block-update operation
//! from spec §6.2.
//!
//! Drives the full pipeline: sort MMOs, optionally merge, then per-MMO
//! candidate/select/commit, followed by the splitter and KPI rollup.

use crate::calendar::Calendar;
use crate::candidate_generator::{self, Candidate, CandidateConfig};
use crate::constraints::ConstraintConfig;
use crate::domain::{DailyScheduleBlock, Downtime, ManufacturingOrder, MoStatus, MoldCalculation, ScheduleBlock};
use crate::error::SchedulingError;
use crate::merger::{self, MergeConfig};
use crate::selector;
use crate::splitter;
use chrono::{Duration, NaiveDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulingMode {
    Standard,
    FillAllMachines,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub merge_enabled: bool,
    pub merge_window_weeks: i64,
    pub time_threshold_pct: f64,
    pub scheduling_mode: SchedulingMode,
    pub search_horizon_days: i64,
    pub candidate_config: CandidateConfig,
    pub constraint_config: ConstraintConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            merge_enabled: true,
            merge_window_weeks: 2,
            time_threshold_pct: 10.0,
            scheduling_mode: SchedulingMode::Standard,
            search_horizon_days: 60,
            candidate_config: CandidateConfig::default(),
            constraint_config: ConstraintConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DelayReport {
    pub mmo_id: String,
    pub machine_id: String,
    pub due_date: NaiveDateTime,
    pub end: NaiveDateTime,
    pub lateness_hours: f64,
    pub lateness_days: f64,
}

#[derive(Debug, Clone)]
pub struct ScheduleResult {
    pub success: bool,
    pub message: String,
    pub blocks: Vec<ScheduleBlock>,
    pub daily_blocks: Vec<DailyScheduleBlock>,
    pub scheduled_mos: Vec<String>,
    pub failed_mos: Vec<String>,
    pub total_mos: usize,
    pub on_time_count: usize,
    pub late_count: usize,
    pub total_lateness_days: f64,
    pub changeover_count: usize,
    pub delay_reports: Vec<DelayReport>,
    pub warnings: Vec<SchedulingError>,
}

pub struct Engine {
    pub mold_calcs: Vec<MoldCalculation>,
    pub calendar: Calendar,
    pub downtimes: Vec<Downtime>,
    pub config: EngineConfig,
}

impl Engine {
    pub fn new(mold_calcs: Vec<MoldCalculation>, calendar: Calendar, downtimes: Vec<Downtime>, config: EngineConfig) -> Self {
        Self {
            mold_calcs,
            calendar,
            downtimes,
            config,
        }
    }

    fn mold_calcs_for(&self, mold_code: &str) -> Vec<MoldCalculation> {
        self.mold_calcs
            .iter()
            .filter(|m| m.mold_code == mold_code)
            .cloned()
            .collect()
    }

    fn block_from_candidate(&self, mmo: &ManufacturingOrder, candidate: &Candidate) -> ScheduleBlock {
        ScheduleBlock {
            block_id: Uuid::new_v4().to_string(),
            machine_id: candidate.machine_id.clone(),
            mold_code: mmo.mold_code.clone(),
            start: candidate.start,
            end: candidate.end,
            mo_ids: vec![mmo.id.clone()],
            component_codes: mmo.component_codes.clone(),
            product_display: mmo.component_codes_display(),
            status: MoStatus::Scheduled,
            is_merged: false,
            is_locked: false,
            has_changeover: true,
            split_part: 1,
            total_splits: 1,
        }
    }

    /// Runs the full pipeline starting from `committed` (existing blocks
    /// already on the calendar) and `schedule_from` (the instant searches
    /// start from — the engine performs no clock reads of its own, per
    /// the concurrency model).
    pub fn run(
        &self,
        mut mmos: Vec<ManufacturingOrder>,
        mut committed: Vec<ScheduleBlock>,
        schedule_from: NaiveDateTime,
    ) -> ScheduleResult {
        mmos.sort_by(|a, b| {
            a.earliest_due_date
                .cmp(&b.earliest_due_date)
                .then(a.highest_priority.cmp(&b.highest_priority))
                .then(a.id.cmp(&b.id))
        });

        let mut scheduled_mos = Vec::new();
        let mut failed_mos = Vec::new();
        let mut delay_reports = Vec::new();
        let mut warnings = Vec::new();
        let mut new_block_count = 0usize;

        if self.config.scheduling_mode == SchedulingMode::Standard && self.config.merge_enabled {
            let mut tentative = Vec::new();
            for mmo in &mmos {
                let mold_calcs = self.mold_calcs_for(&mmo.mold_code);
                let to = mmo.earliest_due_date + Duration::days(self.config.search_horizon_days);
                let candidates = candidate_generator::generate_candidates(
                    mmo,
                    &mold_calcs,
                    &self.calendar,
                    &committed,
                    &self.downtimes,
                    schedule_from,
                    to,
                    &self.config.candidate_config,
                );
                if let Some((candidate, _score, _reason)) = selector::select(&candidates, self.config.time_threshold_pct) {
                    tentative.push((mmo.clone(), candidate));
                }
            }

            let accepted = merger::merge(
                &tentative,
                &self.mold_calcs,
                &self.calendar,
                &committed,
                &self.downtimes,
                &MergeConfig {
                    merge_window_weeks: self.config.merge_window_weeks,
                    constraint_config: self.config.constraint_config,
                },
            );

            for merge_result in accepted {
                committed.push(merge_result.block);
                new_block_count += 1;
                scheduled_mos.extend(merge_result.merged_mmo_ids.iter().cloned());
                mmos.retain(|m| !merge_result.merged_mmo_ids.contains(&m.id));
            }
        }

        match self.config.scheduling_mode {
            SchedulingMode::Standard => {
                for mmo in &mmos {
                    let mold_calcs = self.mold_calcs_for(&mmo.mold_code);
                    let to = mmo.earliest_due_date + Duration::days(self.config.search_horizon_days);
                    let candidates = candidate_generator::generate_candidates(
                        mmo,
                        &mold_calcs,
                        &self.calendar,
                        &committed,
                        &self.downtimes,
                        schedule_from,
                        to,
                        &self.config.candidate_config,
                    );
                    if candidates.is_empty() {
                        warnings.push(SchedulingError::NoCandidates { mmo_id: mmo.id.clone() });
                        failed_mos.push(mmo.id.clone());
                        continue;
                    }
                    match selector::select(&candidates, self.config.time_threshold_pct) {
                        Some((candidate, _score, _reason)) => {
                            if candidate.lateness_hours > 0.0 {
                                delay_reports.push(DelayReport {
                                    mmo_id: mmo.id.clone(),
                                    machine_id: candidate.machine_id.clone(),
                                    due_date: mmo.earliest_due_date,
                                    end: candidate.end,
                                    lateness_hours: candidate.lateness_hours,
                                    lateness_days: candidate.lateness_days,
                                });
                            }
                            committed.push(self.block_from_candidate(mmo, &candidate));
                            new_block_count += 1;
                            scheduled_mos.push(mmo.id.clone());
                        }
                        None => {
                            warnings.push(SchedulingError::AllCandidatesInfeasible { mmo_id: mmo.id.clone() });
                            failed_mos.push(mmo.id.clone());
                        }
                    }
                }
            }
            SchedulingMode::FillAllMachines => {
                for mmo in &mmos {
                    let mold_calcs = self.mold_calcs_for(&mmo.mold_code);
                    let to = mmo.earliest_due_date + Duration::days(self.config.search_horizon_days);
                    let mut candidates = candidate_generator::generate_candidates(
                        mmo,
                        &mold_calcs,
                        &self.calendar,
                        &committed,
                        &self.downtimes,
                        schedule_from,
                        to,
                        &self.config.candidate_config,
                    );
                    candidates.sort_by_key(|c| c.start);

                    let chosen = candidates.into_iter().find(|c| {
                        c.feasible
                            && !crate::constraints::mold_concurrency(&c.mold_code, c.start, c.end, &committed, None)
                            && !crate::constraints::machine_occupancy(&c.machine_id, c.start, c.end, &committed, None)
                    });

                    match chosen {
                        Some(candidate) => {
                            if candidate.lateness_hours > 0.0 {
                                delay_reports.push(DelayReport {
                                    mmo_id: mmo.id.clone(),
                                    machine_id: candidate.machine_id.clone(),
                                    due_date: mmo.earliest_due_date,
                                    end: candidate.end,
                                    lateness_hours: candidate.lateness_hours,
                                    lateness_days: candidate.lateness_days,
                                });
                            }
                            committed.push(self.block_from_candidate(mmo, &candidate));
                            new_block_count += 1;
                            scheduled_mos.push(mmo.id.clone());
                        }
                        None => {
                            warnings.push(SchedulingError::NoCandidates { mmo_id: mmo.id.clone() });
                            failed_mos.push(mmo.id.clone());
                        }
                    }
                }
            }
        }

        let daily_blocks = splitter::split_blocks(&committed, &self.calendar);

        let on_time_count = scheduled_mos.len() - delay_reports.len();
        let late_count = delay_reports.len();
        let total_lateness_days: f64 = delay_reports.iter().map(|d| d.lateness_days).sum();
        let changeover_count = committed.iter().rev().take(new_block_count).filter(|b| !b.is_merged).count();

        ScheduleResult {
            success: failed_mos.is_empty(),
            message: if failed_mos.is_empty() {
                "schedule run completed".to_string()
            } else {
                format!("{} mmo(s) could not be scheduled", failed_mos.len())
            },
            total_mos: scheduled_mos.len() + failed_mos.len(),
            blocks: committed,
            daily_blocks,
            scheduled_mos,
            failed_mos,
            on_time_count,
            late_count,
            total_lateness_days,
            changeover_count,
            delay_reports,
            warnings,
        }
    }
}

/// UI policy for the ripple-shift drag-update (spec §6.2), not a
/// scheduling invariant: only enforced here, never inside the core
/// candidate/validate/select path.
#[derive(Debug, Clone, Copy)]
pub struct DragUpdateConfig {
    pub min_block_duration: Duration,
}

impl Default for DragUpdateConfig {
    fn default() -> Self {
        Self {
            min_block_duration: Duration::minutes(6),
        }
    }
}

/// Applies a drag-and-drop edit to one `(mmo_id, machine_id)` group of
/// sub-blocks, already sorted by `sequence`. `anchor_id` names the single
/// `isModified` entry; its new times/machine are the source of truth and
/// ripple forward, conserving total duration with a floor on the final
/// sub-block.
pub fn apply_block_update(
    group: &mut [DailyScheduleBlock],
    anchor_id: &str,
    new_start: NaiveDateTime,
    new_end: NaiveDateTime,
    new_machine_id: &str,
    config: &DragUpdateConfig,
) {
    let Some(anchor_idx) = group.iter().position(|b| b.id == anchor_id) else {
        return;
    };

    for block in group.iter_mut() {
        block.machine_id = new_machine_id.to_string();
    }

    let original_anchor_duration = group[anchor_idx].end - group[anchor_idx].start;
    let new_anchor_duration = new_end - new_start;
    let delta = new_anchor_duration - original_anchor_duration;

    group[anchor_idx].start = new_start;
    group[anchor_idx].end = new_end;

    let mut cursor = new_end;
    for block in group.iter_mut().skip(anchor_idx + 1) {
        let duration = block.end - block.start;
        block.start = cursor;
        block.end = cursor + duration;
        cursor = block.end;
    }

    let last_idx = group.len() - 1;
    if anchor_idx == 0 && last_idx != anchor_idx && delta != Duration::zero() {
        let last = &mut group[last_idx];
        let shrunk_duration = (last.end - last.start) - delta;
        let floored = shrunk_duration.max(config.min_block_duration);
        last.end = last.start + floored;
    }

    for block in group.iter_mut() {
        if block.start.time() < chrono::NaiveTime::from_hms_opt(8, 0, 0).unwrap() {
            block.date = block.start.date().pred_opt().unwrap_or(block.start.date());
        } else {
            block.date = block.start.date();
        }
    }
}
