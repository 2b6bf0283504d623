//! Domain model for EPS production scheduling.
//!
//! Types here are the in-memory snapshot the engine consumes and produces:
//! orders and their products, the bill of materials, the precomputed mold
//! catalogue, work calendar, downtimes, and the committed schedule itself.
//! Persistence, importers and the HTTP façade are out of scope for this
//! crate; callers own loading a snapshot and writing results back.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Role a product code plays, derived from its leading digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductKind {
    /// `"0"`-prefixed: the finished good shipped to the customer.
    Finished,
    /// `"1"`-prefixed: a semi-finished component molded in-house.
    Component,
}

/// Classifies a product code by its leading digit.
///
/// Returns `None` for codes this scheduler doesn't need to reason about
/// directly (e.g. `"6"`-prefixed physical mold codes, which are tracked
/// through [`MoldCalculation`] rather than as order line items).
pub fn classify_product_code(code: &str) -> Option<ProductKind> {
    match code.chars().next() {
        Some('0') => Some(ProductKind::Finished),
        Some('1') => Some(ProductKind::Component),
        _ => None,
    }
}

/// A customer order. Lifecycle: created on import, `undelivered_quantity`
/// shrinks via completion postings, destroyed when all finished products
/// reach zero. Importing and destruction are out of scope here; this
/// struct models the snapshot the engine reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub product_code: String,
    pub quantity: u32,
    pub undelivered_quantity: u32,
    pub due_date: NaiveDateTime,
    /// 1 = highest priority, 5 = lowest.
    pub priority: u8,
    pub customer_id: String,
    /// Import timestamp; completions apply oldest-order-first.
    pub created_at: NaiveDateTime,
}

/// One product line (finished good or component) belonging to an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub order_id: String,
    pub product_code: String,
    pub quantity: u32,
    pub undelivered_quantity: u32,
    pub kind: ProductKind,
}

/// A bill-of-materials edge: one unit of `finished_code` consumes
/// `cavity_count` cavities' worth of `child_code` per molding shot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomEntry {
    pub finished_code: String,
    pub child_code: String,
    /// `round(1 / unit_usage)` at import time; always >= 1.
    pub cavity_count: u32,
}

/// Precomputed per-(component, machine) timing, the source of truth for
/// C2's timing lookups. Produced by an external recalculation pass that is
/// out of scope here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoldCalculation {
    pub component_code: String,
    pub mold_code: String,
    pub machine_id: String,
    pub cavity_count: u32,
    pub avg_molding_time_sec: f64,
    pub mold_change_time_min: f64,
    pub needed_quantity: u32,
    pub total_time_with_change_min: f64,
    /// Optional yield classification ("A"/"B"/"C") used by the selector.
    pub yield_rank: Option<String>,
    /// How often this mold/machine pairing has run historically; higher
    /// is preferred as a tie-break signal.
    pub frequency: Option<f64>,
}

/// A mold-catalogue row: the fallback source of truth for a component's
/// mold assignment when no [`MoldCalculation`] row exists for it yet (the
/// recalculation pass that produces `MoldCalculation` rows is out of
/// scope for this crate).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoldCatalogueEntry {
    pub component_code: String,
    pub mold_code: String,
    pub machine_id: Option<String>,
    pub cavity_count: Option<u32>,
}

/// Status of a synthesized [`ManufacturingOrder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoStatus {
    Pending,
    Scheduled,
    Failed,
}

/// A mold manufacturing order (MMO): the unit of scheduling. Aggregates
/// demand for one physical mold across every contributing (order,
/// component) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManufacturingOrder {
    pub id: String,
    pub mold_code: String,
    pub component_codes: BTreeSet<String>,
    pub total_quantity: u32,
    pub total_rounds: u32,
    pub cavity_count: u32,
    pub machine_id: String,
    pub earliest_due_date: NaiveDateTime,
    /// 1 = highest priority.
    pub highest_priority: u8,
    pub status: MoStatus,
}

impl ManufacturingOrder {
    /// `component_codes` rendered as the sorted, comma-joined display form
    /// used at the persistence/DTO boundary (Design Notes §9).
    pub fn component_codes_display(&self) -> String {
        self.component_codes
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// One `(order, component)` contribution folded into an [`ManufacturingOrder`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MmoDetail {
    pub mmo_id: String,
    pub order_id: String,
    pub component_code: String,
    pub component_quantity: u32,
    pub component_rounds: u32,
    pub due_date: NaiveDateTime,
    pub priority: u8,
}

/// One calendar day's work-hour record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkCalendarDay {
    pub date: chrono::NaiveDate,
    /// `0` denotes a holiday.
    pub work_hours: f64,
    pub start_time_of_day: chrono::NaiveTime,
    pub note: Option<String>,
}

/// A derived, cached work interval for one calendar day.
///
/// `duration_hours = work_hours + 1` — the `+1` is the rest-time padding
/// policy constant from Design Notes §9, not a measurement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkCalendarGap {
    pub date: chrono::NaiveDate,
    pub gap_start: NaiveDateTime,
    pub gap_end: NaiveDateTime,
    pub duration_hours: f64,
}

/// A machine downtime window. Source data encodes `start_hour`/`end_hour`
/// as float offsets from midnight where values >= 24 mean "next day"; this
/// struct stores the already-normalized absolute instants (Design Notes
/// §9), produced once by [`Downtime::from_hours`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Downtime {
    pub machine_id: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub reason: Option<String>,
}

impl Downtime {
    /// Builds a `Downtime` from the raw `(date, start_hour, end_hour)`
    /// encoding, resolving `end_hour > 24` (and, symmetrically,
    /// `start_hour >= 24`) to the following calendar day.
    pub fn from_hours(
        machine_id: impl Into<String>,
        date: chrono::NaiveDate,
        start_hour: f64,
        end_hour: f64,
        reason: Option<String>,
    ) -> Self {
        Self {
            machine_id: machine_id.into(),
            start: hour_offset_to_datetime(date, start_hour),
            end: hour_offset_to_datetime(date, end_hour),
            reason,
        }
    }
}

fn hour_offset_to_datetime(date: chrono::NaiveDate, hour_offset: f64) -> NaiveDateTime {
    let midnight = date.and_hms_opt(0, 0, 0).expect("midnight is always valid");
    midnight + chrono::Duration::minutes((hour_offset * 60.0).round() as i64)
}

/// A committed machine assignment for one MMO (or a merged group of MMOs).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleBlock {
    pub block_id: String,
    pub machine_id: String,
    pub mold_code: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub mo_ids: Vec<String>,
    pub component_codes: BTreeSet<String>,
    pub product_display: String,
    pub status: MoStatus,
    pub is_merged: bool,
    pub is_locked: bool,
    pub has_changeover: bool,
    pub split_part: u32,
    pub total_splits: u32,
}

impl ScheduleBlock {
    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }

    /// Half-open overlap test shared by every C3 occupancy/concurrency check.
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        overlap(self.start, self.end, start, end)
    }
}

/// Standard half-open overlap predicate: `a_start < b_end && b_start < a_end`.
pub fn overlap(
    a_start: NaiveDateTime,
    a_end: NaiveDateTime,
    b_start: NaiveDateTime,
    b_end: NaiveDateTime,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// A post-split, per-day sub-block: the external-facing gantt unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyScheduleBlock {
    pub id: String,
    pub mmo_id: String,
    pub machine_id: String,
    pub component_code: String,
    pub date: chrono::NaiveDate,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub sequence: u32,
    pub total_sequences: u32,
    pub previous_id: Option<String>,
    pub next_id: Option<String>,
    /// Set unconditionally true on every sub-block produced by a split
    /// (C11): each sub-block's `end` sits on a work-interval boundary, which
    /// is always the configured shift-end. `false` when the block was never
    /// split.
    pub must_end_at_shift_end: bool,
    /// Only the first sub-block of a split inherits the parent block's
    /// changeover; later sub-blocks resume work already in progress.
    pub has_changeover: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_product_code_by_prefix() {
        assert_eq!(classify_product_code("0A1234"), Some(ProductKind::Finished));
        assert_eq!(classify_product_code("1A1234"), Some(ProductKind::Component));
        assert_eq!(classify_product_code("6A1234"), None);
    }

    #[test]
    fn downtime_past_midnight_rolls_to_next_day() {
        let date = chrono::NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        let dt = Downtime::from_hours("M01", date, 22.0, 26.0, None);
        assert_eq!(dt.start.date(), date);
        assert_eq!(dt.end.date(), date.succ_opt().unwrap());
        assert_eq!(dt.end.time(), chrono::NaiveTime::from_hms_opt(2, 0, 0).unwrap());
    }

    #[test]
    fn overlap_is_half_open() {
        let t = |h: u32| {
            chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(h, 0, 0)
                .unwrap()
        };
        assert!(!overlap(t(8), t(10), t(10), t(12)));
        assert!(overlap(t(8), t(11), t(10), t(12)));
    }

    #[test]
    fn component_codes_display_is_sorted_comma_joined() {
        let mmo = ManufacturingOrder {
            id: "MMO-1".into(),
            mold_code: "6X".into(),
            component_codes: ["1B", "1A"].iter().map(|s| s.to_string()).collect(),
            total_quantity: 10,
            total_rounds: 3,
            cavity_count: 4,
            machine_id: "M01".into(),
            earliest_due_date: chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            highest_priority: 1,
            status: MoStatus::Pending,
        };
        assert_eq!(mmo.component_codes_display(), "1A,1B");
    }
}
