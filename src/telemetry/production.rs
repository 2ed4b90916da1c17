use crate::config::ProductConfig;
use crate::core::errors::{Result, SimError};
use crate::core::material::MaterialKind;
use crate::core::types::SimTime;
use crate::simulation::ProductionRecord;
use serde::Serialize;
use std::collections::BTreeMap;

/// Output of one telemetry interval
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntervalStats {
    pub interval_index: u64,
    pub start_sec: SimTime,
    pub produced_by_kind: BTreeMap<MaterialKind, u64>,
    pub defective_by_kind: BTreeMap<MaterialKind, u64>,
    /// Newly introduced defects (inherited ones excluded)
    pub defects_created: u64,
    pub good_finished: u64,
    pub defective_finished: u64,
    pub revenue: f64,
    pub material_cost: f64,
}

impl IntervalStats {
    pub fn produced(&self, kind: MaterialKind) -> u64 {
        self.produced_by_kind.get(&kind).copied().unwrap_or(0)
    }

    /// Revenue minus material cost; conversion cost is charged separately
    pub fn material_margin(&self) -> f64 {
        self.revenue - self.material_cost
    }
}

/// Totals over a whole run, conversion cost included
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Economics {
    pub revenue: f64,
    pub material_cost: f64,
    pub conversion_cost: f64,
    pub gross_margin: f64,
}

/// Folds the production stream into fixed-width intervals.
///
/// Only units built by the recording station count; a pass-through station
/// forwarding an existing unit adds nothing. With a product attached, finished
/// units of `finished_kind` carry revenue when good and material cost always.
#[derive(Debug, Clone)]
pub struct ProductionAggregator {
    interval_sec: SimTime,
    product: Option<(ProductConfig, MaterialKind)>,
    intervals: BTreeMap<u64, IntervalStats>,
}

impl ProductionAggregator {
    pub fn new(interval_sec: SimTime) -> Result<Self> {
        if !interval_sec.is_finite() || interval_sec <= 0.0 {
            return Err(SimError::configuration(
                "production aggregator",
                format!("interval must be positive, got {}", interval_sec),
            ));
        }
        Ok(Self {
            interval_sec,
            product: None,
            intervals: BTreeMap::new(),
        })
    }

    pub fn with_product(mut self, product: ProductConfig, finished_kind: MaterialKind) -> Self {
        self.product = Some((product, finished_kind));
        self
    }

    pub fn on_production(&mut self, record: &ProductionRecord) {
        if record.unit.created_by() != record.station {
            return;
        }
        let index = (record.time.max(0.0) / self.interval_sec).floor() as u64;
        let interval_sec = self.interval_sec;
        let stats = self.intervals.entry(index).or_insert_with(|| IntervalStats {
            interval_index: index,
            start_sec: index as f64 * interval_sec,
            ..IntervalStats::default()
        });

        let kind = record.unit.kind();
        *stats.produced_by_kind.entry(kind).or_insert(0) += 1;
        if record.unit.is_defective() {
            *stats.defective_by_kind.entry(kind).or_insert(0) += 1;
        }
        if record.new_defect {
            stats.defects_created += 1;
        }

        if let Some((product, finished_kind)) = &self.product {
            if kind == *finished_kind {
                stats.material_cost += product.material_cost_of(kind);
                if record.unit.is_defective() {
                    stats.defective_finished += 1;
                } else {
                    stats.good_finished += 1;
                    stats.revenue += product.price_of(kind);
                }
            }
        }
    }

    pub fn consume<'a>(&mut self, records: impl IntoIterator<Item = &'a ProductionRecord>) {
        for record in records {
            self.on_production(record);
        }
    }

    /// Intervals in time order; intervals without production are omitted
    pub fn intervals(&self) -> Vec<&IntervalStats> {
        self.intervals.values().collect()
    }

    pub fn total_produced(&self, kind: MaterialKind) -> u64 {
        self.intervals.values().map(|stats| stats.produced(kind)).sum()
    }

    pub fn economics(&self, conversion_cost: f64) -> Economics {
        let revenue: f64 = self.intervals.values().map(|stats| stats.revenue).sum();
        let material_cost: f64 = self.intervals.values().map(|stats| stats.material_cost).sum();
        Economics {
            revenue,
            material_cost,
            conversion_cost,
            gross_margin: revenue - material_cost - conversion_cost,
        }
    }
}
