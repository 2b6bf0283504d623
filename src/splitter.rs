//! Block splitter (C11, spec §4.11).
//!
//! Splits each committed block along work-interval boundaries into
//! per-day sub-blocks, then wires `previous_id`/`next_id` and
//! `sequence`/`total_sequences` across every `(mmo_id, machine_id)` group.

use crate::calendar::Calendar;
use crate::domain::{DailyScheduleBlock, ScheduleBlock};
use std::collections::HashMap;

fn primary_mmo_id(block: &ScheduleBlock) -> String {
    block
        .mo_ids
        .first()
        .cloned()
        .unwrap_or_else(|| block.block_id.clone())
}

fn primary_component_code(block: &ScheduleBlock) -> String {
    block
        .component_codes
        .iter()
        .next()
        .cloned()
        .unwrap_or_default()
}

/// Splits one committed block into sub-blocks along work-interval
/// boundaries. `sequence`/`total_sequences`/`previous_id`/`next_id` are
/// left at placeholder values here; [`split_blocks`] wires them across
/// the full `(mmo_id, machine_id)` group afterward.
fn split_one(block: &ScheduleBlock, calendar: &Calendar) -> Vec<DailyScheduleBlock> {
    let intervals = calendar.work_intervals(block.start, block.end);
    let mmo_id = primary_mmo_id(block);
    let component_code = primary_component_code(block);

    if intervals.len() <= 1 {
        return vec![DailyScheduleBlock {
            id: uuid::Uuid::new_v4().to_string(),
            mmo_id,
            machine_id: block.machine_id.clone(),
            component_code,
            date: block.start.date(),
            start: block.start,
            end: block.end,
            sequence: 1,
            total_sequences: 1,
            previous_id: None,
            next_id: None,
            must_end_at_shift_end: false,
            has_changeover: block.has_changeover,
        }];
    }

    intervals
        .into_iter()
        .filter_map(|(iv_start, iv_end)| {
            let start = block.start.max(iv_start);
            let end = block.end.min(iv_end);
            if start < end {
                Some((start, end))
            } else {
                None
            }
        })
        .enumerate()
        .map(|(i, (start, end))| DailyScheduleBlock {
            id: uuid::Uuid::new_v4().to_string(),
            mmo_id: mmo_id.clone(),
            machine_id: block.machine_id.clone(),
            component_code: component_code.clone(),
            date: start.date(),
            start,
            end,
            sequence: 0,
            total_sequences: 0,
            previous_id: None,
            next_id: None,
            must_end_at_shift_end: true,
            has_changeover: i == 0 && block.has_changeover,
        })
        .collect()
}

/// Splits every committed block and wires sequencing across
/// `(mmo_id, machine_id)` groups.
pub fn split_blocks(blocks: &[ScheduleBlock], calendar: &Calendar) -> Vec<DailyScheduleBlock> {
    let mut all: Vec<DailyScheduleBlock> = blocks.iter().flat_map(|b| split_one(b, calendar)).collect();

    let mut groups: HashMap<(String, String), Vec<usize>> = HashMap::new();
    for (idx, sub) in all.iter().enumerate() {
        groups
            .entry((sub.mmo_id.clone(), sub.machine_id.clone()))
            .or_default()
            .push(idx);
    }

    for indices in groups.values() {
        let mut ordered = indices.clone();
        ordered.sort_by_key(|&i| all[i].start);
        let n = ordered.len() as u32;
        for (seq_idx, &idx) in ordered.iter().enumerate() {
            let sequence = seq_idx as u32 + 1;
            let previous_id = seq_idx.checked_sub(1).map(|p| all[ordered[p]].id.clone());
            let next_id = ordered.get(seq_idx + 1).map(|&n_idx| all[n_idx].id.clone());
            let sub = &mut all[idx];
            sub.sequence = sequence;
            sub.total_sequences = n;
            sub.previous_id = previous_id;
            sub.next_id = next_id;
        }
    }

    all
}
