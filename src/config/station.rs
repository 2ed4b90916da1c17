use crate::core::errors::{Result, SimError};
use crate::core::material::MaterialKind;
use serde::{Deserialize, Serialize};

/// Breakdown parameters. Both values are in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReliabilityParams {
    /// Mean time between failures; `None` disables breakdowns entirely
    pub mtbf_min: Option<f64>,
    /// Mean time to repair
    pub mttr_min: f64,
}

impl Default for ReliabilityParams {
    fn default() -> Self {
        Self {
            mtbf_min: None,
            mttr_min: 60.0,
        }
    }
}

/// Micro-stop parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceParams {
    /// Probability of a jam per cycle
    pub jam_prob: f64,
    /// Seconds needed to clear a jam
    pub jam_time_sec: f64,
}

impl Default for PerformanceParams {
    fn default() -> Self {
        Self {
            jam_prob: 0.0,
            jam_time_sec: 10.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityParams {
    /// Probability that a produced unit is defective
    pub defect_rate: f64,
    /// Probability that a defective unit is caught at inspection
    pub detection_prob: f64,
}

/// Hourly operating cost of a station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostRates {
    pub labor_per_hour: f64,
    pub energy_per_hour: f64,
    pub overhead_per_hour: f64,
}

impl CostRates {
    pub fn total_per_hour(&self) -> f64 {
        self.labor_per_hour + self.energy_per_hour + self.overhead_per_hour
    }
}

impl Default for CostRates {
    fn default() -> Self {
        Self {
            labor_per_hour: 25.0,
            energy_per_hour: 5.0,
            overhead_per_hour: 10.0,
        }
    }
}

/// Resolved configuration of one station. Read-only for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    pub name: String,
    /// Throughput in units per hour
    pub uph: u32,
    /// Inputs consumed per cycle
    pub batch_in: usize,
    /// Kind of unit produced; `None` passes inputs through
    pub output_kind: Option<MaterialKind>,
    /// Capacity of the buffers this station feeds
    pub buffer_capacity: usize,
    pub reliability: ReliabilityParams,
    pub performance: PerformanceParams,
    pub quality: QualityParams,
    pub cost_rates: CostRates,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            uph: 0,
            batch_in: 1,
            output_kind: None,
            buffer_capacity: 50,
            reliability: ReliabilityParams::default(),
            performance: PerformanceParams::default(),
            quality: QualityParams::default(),
            cost_rates: CostRates::default(),
        }
    }
}

impl StationConfig {
    /// Create a fault-free station with default buffering
    pub fn new(name: impl Into<String>, uph: u32) -> Self {
        Self {
            name: name.into(),
            uph,
            ..Self::default()
        }
    }

    pub fn with_batch_in(mut self, batch_in: usize) -> Self {
        self.batch_in = batch_in;
        self
    }

    pub fn with_output_kind(mut self, kind: MaterialKind) -> Self {
        self.output_kind = Some(kind);
        self
    }

    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    pub fn with_reliability(mut self, mtbf_min: f64, mttr_min: f64) -> Self {
        self.reliability = ReliabilityParams {
            mtbf_min: Some(mtbf_min),
            mttr_min,
        };
        self
    }

    pub fn with_jams(mut self, jam_prob: f64, jam_time_sec: f64) -> Self {
        self.performance = PerformanceParams { jam_prob, jam_time_sec };
        self
    }

    pub fn with_quality(mut self, defect_rate: f64, detection_prob: f64) -> Self {
        self.quality = QualityParams {
            defect_rate,
            detection_prob,
        };
        self
    }

    pub fn with_cost_rates(mut self, cost_rates: CostRates) -> Self {
        self.cost_rates = cost_rates;
        self
    }

    /// Seconds per cycle at the configured throughput
    pub fn cycle_time_sec(&self) -> f64 {
        3600.0 / f64::from(self.uph)
    }

    /// Mean time between failures in seconds, if breakdowns are configured
    pub fn mtbf_sec(&self) -> Option<f64> {
        self.reliability.mtbf_min.map(|minutes| minutes * 60.0)
    }

    pub fn mttr_sec(&self) -> f64 {
        self.reliability.mttr_min * 60.0
    }

    /// Check that every field is usable before any simulated time advances
    pub fn validate(&self) -> Result<()> {
        let context = format!("station '{}'", self.name);
        if self.name.trim().is_empty() {
            return Err(SimError::configuration("station", "name must not be empty"));
        }
        if self.uph == 0 {
            return Err(SimError::configuration(context, "uph must be positive"));
        }
        if self.batch_in < 1 {
            return Err(SimError::configuration(context, "batch_in must be at least 1"));
        }
        if self.buffer_capacity < 1 {
            return Err(SimError::configuration(context, "buffer_capacity must be at least 1"));
        }

        let probabilities = [
            ("performance.jam_prob", self.performance.jam_prob),
            ("quality.defect_rate", self.quality.defect_rate),
            ("quality.detection_prob", self.quality.detection_prob),
        ];
        for (field, value) in probabilities {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(SimError::configuration(
                    context,
                    format!("{} must be within [0, 1], got {}", field, value),
                ));
            }
        }

        if let Some(mtbf) = self.reliability.mtbf_min {
            if !mtbf.is_finite() || mtbf <= 0.0 {
                return Err(SimError::configuration(
                    context,
                    format!("reliability.mtbf_min must be positive, got {}", mtbf),
                ));
            }
        }

        let durations = [
            ("reliability.mttr_min", self.reliability.mttr_min),
            ("performance.jam_time_sec", self.performance.jam_time_sec),
        ];
        for (field, value) in durations {
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::configuration(
                    context,
                    format!("{} must be a non-negative number, got {}", field, value),
                ));
            }
        }

        Ok(())
    }
}
