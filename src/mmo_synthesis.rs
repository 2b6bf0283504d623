//! MMO synthesis (C9, spec §4.9).
//!
//! Aggregates demand for each physical mold across every contributing
//! `(order, component)` pair into one schedulable [`ManufacturingOrder`].
//! Data-deficiency problems (missing mold, invalid mold code, missing
//! machine/cavity data, zero quantity) are recovered as warnings rather
//! than aborting the whole pass (spec §7).

use crate::domain::{
    BomEntry, ManufacturingOrder, MmoDetail, MoStatus, MoldCalculation, MoldCatalogueEntry, Order, Product,
    ProductKind,
};
use crate::error::SchedulingError;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

struct MoldResolution {
    mold_code: String,
    machine_id: String,
    cavity_count: u32,
}

fn resolve_mold(
    component_code: &str,
    mold_calcs: &[MoldCalculation],
    catalogue: &[MoldCatalogueEntry],
) -> Result<MoldResolution, SchedulingError> {
    if let Some(row) = mold_calcs.iter().find(|m| m.component_code == component_code) {
        if !row.mold_code.starts_with('6') {
            return Err(SchedulingError::InvalidMoldCode {
                mold_code: row.mold_code.clone(),
            });
        }
        return Ok(MoldResolution {
            mold_code: row.mold_code.clone(),
            machine_id: row.machine_id.clone(),
            cavity_count: row.cavity_count,
        });
    }

    let entry = catalogue
        .iter()
        .find(|c| c.component_code == component_code)
        .ok_or_else(|| SchedulingError::NoMold {
            component_code: component_code.to_string(),
        })?;

    if !entry.mold_code.starts_with('6') {
        return Err(SchedulingError::InvalidMoldCode {
            mold_code: entry.mold_code.clone(),
        });
    }

    match (&entry.machine_id, entry.cavity_count) {
        (Some(machine_id), Some(cavity_count)) => Ok(MoldResolution {
            mold_code: entry.mold_code.clone(),
            machine_id: machine_id.clone(),
            cavity_count,
        }),
        _ => Err(SchedulingError::MissingMachineOrCavity {
            component_code: component_code.to_string(),
        }),
    }
}

struct Accumulator {
    component_codes: BTreeSet<String>,
    total_quantity: u32,
    cavity_count: u32,
    machine_id: String,
    earliest_due_date: chrono::NaiveDateTime,
    highest_priority: u8,
    details: Vec<MmoDetail>,
}

/// Synthesizes one MMO per `mold_code` from `orders`, their `products`
/// (finished + component rows), the `bom` graph and mold lookup data.
/// Returns `(mmos, warnings)`; a warning means the affected
/// `(order, component)` contributed nothing to any MMO.
pub fn synthesize(
    orders: &[Order],
    products: &[Product],
    bom: &[BomEntry],
    mold_calcs: &[MoldCalculation],
    catalogue: &[MoldCatalogueEntry],
) -> (Vec<ManufacturingOrder>, Vec<SchedulingError>) {
    let product_by_key: BTreeMap<(&str, &str), &Product> = products
        .iter()
        .map(|p| ((p.order_id.as_str(), p.product_code.as_str()), p))
        .collect();

    let mut warnings = Vec::new();
    let mut accumulators: BTreeMap<String, Accumulator> = BTreeMap::new();

    for order in orders {
        let finished_demand = product_by_key
            .get(&(order.id.as_str(), order.product_code.as_str()))
            .map(|p| p.undelivered_quantity)
            .unwrap_or(order.undelivered_quantity);

        if finished_demand == 0 {
            continue;
        }

        let children: Vec<&BomEntry> = bom
            .iter()
            .filter(|entry| entry.finished_code == order.product_code)
            .collect();

        for child in children {
            let child_quantity = match product_by_key.get(&(order.id.as_str(), child.child_code.as_str())) {
                Some(p) => p.undelivered_quantity,
                None => {
                    warnings.push(SchedulingError::ZeroQuantity {
                        component_code: child.child_code.clone(),
                    });
                    continue;
                }
            };

            if child_quantity == 0 {
                warnings.push(SchedulingError::ZeroQuantity {
                    component_code: child.child_code.clone(),
                });
                continue;
            }

            let resolution = match resolve_mold(&child.child_code, mold_calcs, catalogue) {
                Ok(r) => r,
                Err(e) => {
                    warnings.push(e);
                    continue;
                }
            };

            let entry = accumulators
                .entry(resolution.mold_code.clone())
                .or_insert_with(|| Accumulator {
                    component_codes: BTreeSet::new(),
                    total_quantity: 0,
                    cavity_count: resolution.cavity_count,
                    machine_id: resolution.machine_id.clone(),
                    earliest_due_date: order.due_date,
                    highest_priority: order.priority,
                    details: Vec::new(),
                });

            entry.component_codes.insert(child.child_code.clone());
            entry.total_quantity += child_quantity;
            entry.earliest_due_date = entry.earliest_due_date.min(order.due_date);
            entry.highest_priority = entry.highest_priority.min(order.priority);

            let component_rounds = (child_quantity as f64 / resolution.cavity_count.max(1) as f64).ceil() as u32;
            entry.details.push(MmoDetail {
                mmo_id: String::new(),
                order_id: order.id.clone(),
                component_code: child.child_code.clone(),
                component_quantity: child_quantity,
                component_rounds,
                due_date: order.due_date,
                priority: order.priority,
            });
        }
    }

    let mut mmos = Vec::new();
    for (mold_code, acc) in accumulators {
        let id = Uuid::new_v4().to_string();
        let total_rounds = (acc.total_quantity as f64 / acc.cavity_count.max(1) as f64).ceil() as u32;
        mmos.push(ManufacturingOrder {
            id,
            mold_code,
            component_codes: acc.component_codes,
            total_quantity: acc.total_quantity,
            total_rounds,
            cavity_count: acc.cavity_count,
            machine_id: acc.machine_id,
            earliest_due_date: acc.earliest_due_date,
            highest_priority: acc.highest_priority,
            status: MoStatus::Pending,
        });
    }

    (mmos, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn due(y: i32, m: u32, d: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn aggregates_demand_across_orders_sharing_a_mold() {
        let orders = vec![
            Order {
                id: "O1".into(),
                order_number: "ORD-1".into(),
                product_code: "0A1".into(),
                quantity: 100,
                undelivered_quantity: 100,
                due_date: due(2025, 12, 10),
                priority: 2,
                customer_id: "C1".into(),
                created_at: due(2025, 11, 1),
            },
            Order {
                id: "O2".into(),
                order_number: "ORD-2".into(),
                product_code: "0A1".into(),
                quantity: 50,
                undelivered_quantity: 50,
                due_date: due(2025, 12, 5),
                priority: 1,
                customer_id: "C2".into(),
                created_at: due(2025, 11, 2),
            },
        ];
        let products = vec![
            Product { order_id: "O1".into(), product_code: "0A1".into(), quantity: 100, undelivered_quantity: 100, kind: ProductKind::Finished },
            Product { order_id: "O1".into(), product_code: "1A1".into(), quantity: 100, undelivered_quantity: 100, kind: ProductKind::Component },
            Product { order_id: "O2".into(), product_code: "0A1".into(), quantity: 50, undelivered_quantity: 50, kind: ProductKind::Finished },
            Product { order_id: "O2".into(), product_code: "1A1".into(), quantity: 50, undelivered_quantity: 50, kind: ProductKind::Component },
        ];
        let bom = vec![BomEntry { finished_code: "0A1".into(), child_code: "1A1".into(), cavity_count: 4 }];
        let mold_calcs = vec![MoldCalculation {
            component_code: "1A1".into(),
            mold_code: "6X".into(),
            machine_id: "M01".into(),
            cavity_count: 4,
            avg_molding_time_sec: 30.0,
            mold_change_time_min: 30.0,
            needed_quantity: 1000,
            total_time_with_change_min: 530.0,
            yield_rank: Some("A".into()),
            frequency: Some(1.0),
        }];

        let (mmos, warnings) = synthesize(&orders, &products, &bom, &mold_calcs, &[]);
        assert!(warnings.is_empty());
        assert_eq!(mmos.len(), 1);
        let mmo = &mmos[0];
        assert_eq!(mmo.total_quantity, 150);
        assert_eq!(mmo.total_rounds, 38);
        assert_eq!(mmo.earliest_due_date, due(2025, 12, 5));
        assert_eq!(mmo.highest_priority, 1);
    }

    #[test]
    fn missing_mold_is_recorded_as_warning_not_panic() {
        let orders = vec![Order {
            id: "O1".into(),
            order_number: "ORD-1".into(),
            product_code: "0A1".into(),
            quantity: 10,
            undelivered_quantity: 10,
            due_date: due(2025, 12, 10),
            priority: 1,
            customer_id: "C1".into(),
            created_at: due(2025, 11, 1),
        }];
        let products = vec![
            Product { order_id: "O1".into(), product_code: "0A1".into(), quantity: 10, undelivered_quantity: 10, kind: ProductKind::Finished },
            Product { order_id: "O1".into(), product_code: "1A1".into(), quantity: 10, undelivered_quantity: 10, kind: ProductKind::Component },
        ];
        let bom = vec![BomEntry { finished_code: "0A1".into(), child_code: "1A1".into(), cavity_count: 4 }];

        let (mmos, warnings) = synthesize(&orders, &products, &bom, &[], &[]);
        assert!(mmos.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(matches!(warnings[0], SchedulingError::NoMold { .. }));
    }
}
