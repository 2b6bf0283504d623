//! Completion posting (spec §4.12, §6.4).
//!
//! The only durable-storage concern in scope here is the in-memory effect
//! on `Order`/`Product`/`ScheduleBlock`: decrementing undelivered
//! quantity, cascading to sibling components/molds, deleting orders once
//! fully delivered, and proportionally shrinking their schedule blocks.
//! Persisting that effect is an external collaborator's job.

use crate::domain::{Order, Product, ProductKind, ScheduleBlock};
use crate::error::SchedulingError;
use chrono::NaiveDateTime;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub completion_no: String,
    pub completion_date: NaiveDateTime,
    pub stock_in_date: NaiveDateTime,
    pub finished_item_no: String,
    pub completed_qty: u32,
    pub machine_id: Option<String>,
    pub mold_code: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CompletionBatchResponse {
    pub applied_completion_nos: Vec<String>,
    pub skipped_completion_nos: Vec<String>,
    pub deleted_order_ids: Vec<String>,
    pub removed_block_ids: Vec<String>,
}

/// The mutable state one or more completion postings operate on. Plain
/// in-memory snapshot; no database handle lives here.
pub struct CompletionState<'a> {
    pub orders: &'a mut Vec<Order>,
    pub products: &'a mut Vec<Product>,
    pub blocks: &'a mut Vec<ScheduleBlock>,
    pub seen_completion_nos: &'a mut BTreeSet<String>,
}

/// Applies one completion record, mutating `state` in place.
///
/// Returns `Err(DuplicateCompletionNo)` without mutating anything if
/// `request.completion_no` was already applied; the caller is expected to
/// record that in `skipped_completion_nos` and continue with the batch.
pub fn post_completion(
    state: &mut CompletionState,
    request: &CompletionRequest,
) -> Result<(Vec<String>, Vec<String>), SchedulingError> {
    if state.seen_completion_nos.contains(&request.completion_no) {
        return Err(SchedulingError::DuplicateCompletionNo(request.completion_no.clone()));
    }
    state.seen_completion_nos.insert(request.completion_no.clone());

    let mut candidate_order_ids: Vec<String> = state
        .orders
        .iter()
        .filter(|o| o.product_code == request.finished_item_no)
        .map(|o| o.id.clone())
        .collect();
    candidate_order_ids.sort_by_key(|id| {
        state
            .orders
            .iter()
            .find(|o| &o.id == id)
            .map(|o| o.created_at)
            .unwrap()
    });

    let mut remaining = request.completed_qty;
    let mut deleted_order_ids = Vec::new();
    let mut removed_block_ids = Vec::new();

    for order_id in candidate_order_ids {
        if remaining == 0 {
            break;
        }

        let finished_idx = state
            .products
            .iter()
            .position(|p| p.order_id == order_id && p.kind == ProductKind::Finished);
        let Some(finished_idx) = finished_idx else { continue };

        let finished_available = state.products[finished_idx].undelivered_quantity;
        if finished_available == 0 {
            continue;
        }
        let original_quantity = state.products[finished_idx].quantity;
        let applied = remaining.min(finished_available);
        state.products[finished_idx].undelivered_quantity -= applied;
        remaining -= applied;

        let new_finished_undelivered = state.products[finished_idx].undelivered_quantity;
        for product in state.products.iter_mut() {
            if product.order_id == order_id && product.kind == ProductKind::Component {
                product.undelivered_quantity = product.undelivered_quantity.min(new_finished_undelivered);
            }
        }

        let order_fully_delivered = state
            .products
            .iter()
            .filter(|p| p.order_id == order_id && p.kind == ProductKind::Finished)
            .all(|p| p.undelivered_quantity == 0);

        if order_fully_delivered {
            deleted_order_ids.push(order_id.clone());
            state.orders.retain(|o| o.id != order_id);
            state.products.retain(|p| p.order_id != order_id);
        }

        if original_quantity > 0 {
            let completion_ratio = applied as f64 / original_quantity as f64;
            for block in state.blocks.iter_mut() {
                if block.mo_ids.contains(&order_id) {
                    let duration = block.end - block.start;
                    let shift = chrono::Duration::milliseconds(
                        (duration.num_milliseconds() as f64 * completion_ratio).round() as i64,
                    );
                    block.start += shift;
                }
            }
            let before_len = state.blocks.len();
            let shrunk_ids: Vec<String> = state
                .blocks
                .iter()
                .filter(|b| b.mo_ids.contains(&order_id) && b.end <= b.start)
                .map(|b| b.block_id.clone())
                .collect();
            state.blocks.retain(|b| b.start < b.end);
            if state.blocks.len() != before_len {
                removed_block_ids.extend(shrunk_ids);
            }
        }
    }

    Ok((deleted_order_ids, removed_block_ids))
}

/// Applies a batch, collecting duplicates into `skipped_completion_nos`
/// instead of aborting (spec §6.4: "duplicates are silently skipped and
/// reported").
pub fn post_completions(state: &mut CompletionState, requests: &[CompletionRequest]) -> CompletionBatchResponse {
    let mut response = CompletionBatchResponse::default();
    for request in requests {
        match post_completion(state, request) {
            Ok((deleted, removed)) => {
                response.applied_completion_nos.push(request.completion_no.clone());
                response.deleted_order_ids.extend(deleted);
                response.removed_block_ids.extend(removed);
            }
            Err(SchedulingError::DuplicateCompletionNo(no)) => {
                response.skipped_completion_nos.push(no);
            }
            Err(_) => {}
        }
    }
    response
}
