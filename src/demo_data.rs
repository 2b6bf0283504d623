//! Demo data generator for the EPS scheduling core.
//!
//! Produces a synthetic but internally consistent factory snapshot
//! (orders, BOM, mold catalogue/calculations, work calendar, downtimes)
//! so the demo binary and integration tests have something to schedule
//! without a real importer.

use chrono::{Duration, NaiveDate, NaiveTime};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::domain::{BomEntry, MoldCalculation, Order, Product, ProductKind, WorkCalendarDay};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoSize {
    Small,
    Large,
}

impl std::str::FromStr for DemoSize {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SMALL" => Ok(DemoSize::Small),
            "LARGE" => Ok(DemoSize::Large),
            _ => Err(()),
        }
    }
}

impl DemoSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemoSize::Small => "SMALL",
            DemoSize::Large => "LARGE",
        }
    }

    fn parameters(&self) -> DemoParameters {
        match self {
            DemoSize::Small => DemoParameters {
                machine_count: 4,
                finished_product_count: 6,
                order_count: 15,
                days_in_calendar: 30,
                quantity_distribution: vec![(100, 3.0), (300, 2.0), (800, 1.0)],
                cavity_distribution: vec![(2, 1.0), (4, 3.0), (8, 1.0)],
                priority_distribution: vec![(1, 1.0), (2, 3.0), (3, 4.0), (4, 2.0), (5, 1.0)],
                downtime_count: 3,
            },
            DemoSize::Large => DemoParameters {
                machine_count: 12,
                finished_product_count: 25,
                order_count: 80,
                days_in_calendar: 60,
                quantity_distribution: vec![(100, 3.0), (300, 3.0), (800, 2.0), (2000, 1.0)],
                cavity_distribution: vec![(2, 1.0), (4, 3.0), (8, 2.0), (16, 1.0)],
                priority_distribution: vec![(1, 1.0), (2, 3.0), (3, 4.0), (4, 2.0), (5, 1.0)],
                downtime_count: 15,
            },
        }
    }
}

struct DemoParameters {
    machine_count: usize,
    finished_product_count: usize,
    order_count: usize,
    days_in_calendar: i64,
    quantity_distribution: Vec<(u32, f64)>,
    cavity_distribution: Vec<(u32, f64)>,
    priority_distribution: Vec<(u8, f64)>,
    downtime_count: usize,
}

/// A full synthetic snapshot ready to hand to [`crate::mmo_synthesis::synthesize`]
/// and [`crate::engine::Engine`].
pub struct DemoDataset {
    pub orders: Vec<Order>,
    pub products: Vec<Product>,
    pub bom: Vec<BomEntry>,
    pub mold_calcs: Vec<MoldCalculation>,
    pub calendar_days: Vec<WorkCalendarDay>,
    pub downtimes: Vec<crate::domain::Downtime>,
}

pub fn list_demo_data() -> Vec<&'static str> {
    vec!["SMALL", "LARGE"]
}

/// Generates a demo dataset for the given size, deterministic across runs.
pub fn generate(size: DemoSize) -> DemoDataset {
    let params = size.parameters();
    let mut rng = StdRng::seed_from_u64(0);

    let machines: Vec<String> = (1..=params.machine_count).map(|i| format!("M{:02}", i)).collect();

    let mut bom = Vec::new();
    let mut mold_calcs = Vec::new();
    let finished_codes: Vec<String> = (0..params.finished_product_count)
        .map(|i| format!("0A{:04}", i))
        .collect();

    for (i, finished_code) in finished_codes.iter().enumerate() {
        let child_code = format!("1A{:04}", i);
        let mold_code = format!("6A{:04}", i);
        let cavity_count = pick_weighted(&mut rng, &params.cavity_distribution);
        let machine_id = machines.choose(&mut rng).expect("at least one machine").clone();

        bom.push(BomEntry {
            finished_code: finished_code.clone(),
            child_code: child_code.clone(),
            cavity_count,
        });

        let avg_molding_time_sec = rng.gen_range(15.0..60.0);
        let mold_change_time_min = *[20.0, 30.0, 45.0].choose(&mut rng).unwrap();
        let needed_quantity = 1000;
        let total_time_with_change_min =
            mold_change_time_min + (needed_quantity as f64 / cavity_count as f64) * avg_molding_time_sec / 60.0;

        mold_calcs.push(MoldCalculation {
            component_code: child_code,
            mold_code,
            machine_id,
            cavity_count,
            avg_molding_time_sec,
            mold_change_time_min,
            needed_quantity,
            total_time_with_change_min,
            yield_rank: Some(["A", "B", "C"].choose(&mut rng).unwrap().to_string()),
            frequency: Some(rng.gen_range(0.1..5.0)),
        });
    }

    let base_date = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
    let mut orders = Vec::new();
    let mut products = Vec::new();

    for i in 0..params.order_count {
        let finished_code = finished_codes.choose(&mut rng).expect("non-empty").clone();
        let quantity = pick_weighted(&mut rng, &params.quantity_distribution);
        let priority = pick_weighted(&mut rng, &params.priority_distribution);
        let due_offset_days = rng.gen_range(5..45);
        let created_offset_days = rng.gen_range(0..5);

        let order_id = format!("ORD-{:05}", i);
        orders.push(Order {
            id: order_id.clone(),
            order_number: format!("SO-{:05}", i),
            product_code: finished_code.clone(),
            quantity,
            undelivered_quantity: quantity,
            due_date: base_date
                .and_hms_opt(0, 0, 0)
                .unwrap()
                + Duration::days(due_offset_days),
            priority,
            customer_id: format!("CUST-{:03}", rng.gen_range(0..20)),
            created_at: base_date.and_hms_opt(0, 0, 0).unwrap() + Duration::days(created_offset_days),
        });

        products.push(Product {
            order_id: order_id.clone(),
            product_code: finished_code.clone(),
            quantity,
            undelivered_quantity: quantity,
            kind: ProductKind::Finished,
        });

        for entry in bom.iter().filter(|e| e.finished_code == finished_code) {
            products.push(Product {
                order_id: order_id.clone(),
                product_code: entry.child_code.clone(),
                quantity,
                undelivered_quantity: quantity,
                kind: ProductKind::Component,
            });
        }
    }

    let mut calendar_days = Vec::new();
    let mut d = base_date;
    for _ in 0..params.days_in_calendar {
        let is_sunday = d.weekday() == chrono::Weekday::Sun;
        calendar_days.push(WorkCalendarDay {
            date: d,
            work_hours: if is_sunday { 0.0 } else { 16.0 },
            start_time_of_day: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            note: if is_sunday { Some("weekly rest day".to_string()) } else { None },
        });
        d = d.succ_opt().unwrap();
    }

    let mut downtimes = Vec::new();
    for _ in 0..params.downtime_count {
        let machine_id = machines.choose(&mut rng).expect("non-empty").clone();
        let offset_days = rng.gen_range(0..params.days_in_calendar);
        let start_hour = rng.gen_range(8.0..20.0);
        let duration_hours = rng.gen_range(0.5..3.0);
        downtimes.push(crate::domain::Downtime::from_hours(
            machine_id,
            base_date + Duration::days(offset_days),
            start_hour,
            start_hour + duration_hours,
            Some("scheduled maintenance".to_string()),
        ));
    }

    DemoDataset {
        orders,
        products,
        bom,
        mold_calcs,
        calendar_days,
        downtimes,
    }
}

use chrono::Datelike;

/// Picks one value from a weighted distribution, mirroring the weighted
/// pick pattern used throughout this demo generator.
fn pick_weighted<T: Copy>(rng: &mut StdRng, distribution: &[(T, f64)]) -> T {
    let total_weight: f64 = distribution.iter().map(|(_, w)| w).sum();
    let mut choice = rng.gen::<f64>() * total_weight;

    for (value, weight) in distribution {
        if choice < *weight {
            return *value;
        }
        choice -= weight;
    }
    distribution.last().map(|(v, _)| *v).expect("non-empty distribution")
}
