//! Request/response shapes for the invocation contracts in spec §6.
//!
//! No HTTP routing lives here — the façade that would serialize these
//! across the wire is out of scope — but these are the stable boundary
//! such a façade would use.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::engine::{DelayReport, EngineConfig, SchedulingMode};

fn default_merge_enabled() -> bool {
    true
}

fn default_merge_window_weeks() -> u32 {
    2
}

fn default_time_threshold_pct() -> u32 {
    10
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingModeDto {
    Standard,
    FillAllMachines,
}

impl From<SchedulingModeDto> for SchedulingMode {
    fn from(value: SchedulingModeDto) -> Self {
        match value {
            SchedulingModeDto::Standard => SchedulingMode::Standard,
            SchedulingModeDto::FillAllMachines => SchedulingMode::FillAllMachines,
        }
    }
}

/// §6.1 scheduler invocation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    #[serde(default)]
    pub order_ids: Option<Vec<String>>,
    #[serde(default = "default_merge_enabled")]
    pub merge_enabled: bool,
    #[serde(default = "default_merge_window_weeks")]
    pub merge_window_weeks: u32,
    #[serde(default = "default_time_threshold_pct")]
    pub time_threshold_pct: u32,
    #[serde(default)]
    pub reschedule_all: bool,
    #[serde(default)]
    pub scheduling_mode: Option<SchedulingModeDto>,
}

impl From<&ScheduleRequest> for EngineConfig {
    /// Fields §6.1 doesn't carry (search horizon, per-candidate and
    /// per-constraint tuning) fall back to `EngineConfig::default()`.
    fn from(req: &ScheduleRequest) -> Self {
        Self {
            merge_enabled: req.merge_enabled,
            merge_window_weeks: req.merge_window_weeks as i64,
            time_threshold_pct: req.time_threshold_pct as f64,
            scheduling_mode: req
                .scheduling_mode
                .map(SchedulingMode::from)
                .unwrap_or(SchedulingMode::Standard),
            ..EngineConfig::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayReportDto {
    pub mmo_id: String,
    pub machine_id: String,
    pub due_date: NaiveDateTime,
    pub end: NaiveDateTime,
    pub lateness_hours: f64,
    pub lateness_days: f64,
}

impl From<&DelayReport> for DelayReportDto {
    fn from(r: &DelayReport) -> Self {
        Self {
            mmo_id: r.mmo_id.clone(),
            machine_id: r.machine_id.clone(),
            due_date: r.due_date,
            end: r.end,
            lateness_hours: r.lateness_hours,
            lateness_days: r.lateness_days,
        }
    }
}

/// §6.1 scheduler invocation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub success: bool,
    pub message: String,
    pub blocks: Vec<crate::domain::ScheduleBlock>,
    pub scheduled_mos: Vec<String>,
    pub failed_mos: Vec<String>,
    pub total_mos: usize,
    pub on_time_count: usize,
    pub late_count: usize,
    pub total_lateness_days: f64,
    pub changeover_count: usize,
    pub delay_reports: Vec<DelayReportDto>,
    pub execution_time_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
}

/// `execution_time_seconds` is left `0.0` here since the engine itself
/// performs no clock reads (spec §5); a caller wrapping `Engine::run` in a
/// timer should overwrite it before sending the response on.
impl From<&crate::engine::ScheduleResult> for ScheduleResponse {
    fn from(r: &crate::engine::ScheduleResult) -> Self {
        Self {
            success: r.success,
            message: r.message.clone(),
            blocks: r.blocks.clone(),
            scheduled_mos: r.scheduled_mos.clone(),
            failed_mos: r.failed_mos.clone(),
            total_mos: r.total_mos,
            on_time_count: r.on_time_count,
            late_count: r.late_count,
            total_lateness_days: r.total_lateness_days,
            changeover_count: r.changeover_count,
            delay_reports: r.delay_reports.iter().map(DelayReportDto::from).collect(),
            execution_time_seconds: 0.0,
            ai_summary: None,
        }
    }
}

/// §6.2 block-update (drag-and-drop) request entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockUpdateRequest {
    pub id: String,
    pub order_id: String,
    pub start_hour: f64,
    pub end_hour: f64,
    pub machine_id: String,
    pub scheduled_date: chrono::NaiveDate,
    pub is_modified: bool,
}

impl BlockUpdateRequest {
    /// Resolves `start_hour`/`end_hour` (offsets from midnight on
    /// `scheduled_date`, the same encoding `Downtime::from_hours` uses) to
    /// absolute instants.
    fn resolve_times(&self) -> (NaiveDateTime, NaiveDateTime) {
        let midnight = self.scheduled_date.and_hms_opt(0, 0, 0).expect("midnight is always valid");
        let start = midnight + chrono::Duration::minutes((self.start_hour * 60.0).round() as i64);
        let end = midnight + chrono::Duration::minutes((self.end_hour * 60.0).round() as i64);
        (start, end)
    }
}

/// Bridges one §6.2 batch (a single `(mmo_id, machine_id)` group's worth of
/// `BlockUpdateRequest` entries) into `engine::apply_block_update`: finds
/// the entry marked `isModified` and applies it as the drag anchor. Returns
/// `false` if no entry in the batch is marked modified.
pub fn apply_block_update_batch(
    group: &mut [crate::domain::DailyScheduleBlock],
    requests: &[BlockUpdateRequest],
    config: &crate::engine::DragUpdateConfig,
) -> bool {
    let Some(anchor) = requests.iter().find(|r| r.is_modified) else {
        return false;
    };
    let (start, end) = anchor.resolve_times();
    crate::engine::apply_block_update(group, &anchor.id, start, end, &anchor.machine_id, config);
    true
}

/// §6.3 work-calendar upsert entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkCalendarUpsert {
    pub date: chrono::NaiveDate,
    pub work_hours: f64,
    pub start_time: chrono::NaiveTime,
    #[serde(default)]
    pub note: Option<String>,
}

impl From<WorkCalendarUpsert> for crate::domain::WorkCalendarDay {
    fn from(value: WorkCalendarUpsert) -> Self {
        Self {
            date: value.date,
            work_hours: value.work_hours,
            start_time_of_day: value.start_time,
            note: value.note,
        }
    }
}

/// §6.4 completion posting request entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequestDto {
    pub completion_no: String,
    pub completion_date: NaiveDateTime,
    pub stock_in_date: NaiveDateTime,
    pub finished_item_no: String,
    pub completed_qty: u32,
    #[serde(default)]
    pub machine: Option<String>,
    #[serde(default)]
    pub mold: Option<String>,
}

impl From<CompletionRequestDto> for crate::completion::CompletionRequest {
    fn from(value: CompletionRequestDto) -> Self {
        Self {
            completion_no: value.completion_no,
            completion_date: value.completion_date,
            stock_in_date: value.stock_in_date,
            finished_item_no: value.finished_item_no,
            completed_qty: value.completed_qty,
            machine_id: value.machine,
            mold_code: value.mold,
        }
    }
}

/// §6.4 completion posting response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionBatchResponseDto {
    pub applied_completion_nos: Vec<String>,
    pub skipped_completion_nos: Vec<String>,
    pub deleted_order_ids: Vec<String>,
    pub removed_block_ids: Vec<String>,
}

impl From<crate::completion::CompletionBatchResponse> for CompletionBatchResponseDto {
    fn from(value: crate::completion::CompletionBatchResponse) -> Self {
        Self {
            applied_completion_nos: value.applied_completion_nos,
            skipped_completion_nos: value.skipped_completion_nos,
            deleted_order_ids: value.deleted_order_ids,
            removed_block_ids: value.removed_block_ids,
        }
    }
}
