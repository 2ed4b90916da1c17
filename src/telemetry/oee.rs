use crate::equipment::StationReport;
use serde::Serialize;

/// Overall Equipment Effectiveness of one station
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OeeBreakdown {
    pub availability: f64,
    pub performance: f64,
    pub quality: f64,
    pub oee: f64,
}

impl OeeBreakdown {
    /// `None` until some simulated time has elapsed
    pub fn from_report(report: &StationReport) -> Option<Self> {
        let elapsed = report.time_in_state.total();
        if elapsed <= 0.0 {
            return None;
        }
        let run_time = elapsed - report.time_in_state.down;
        let availability = run_time / elapsed;

        let produced = report.counters.units_produced as f64;
        let performance = if run_time > 0.0 {
            report.cycle_time_sec * produced / run_time
        } else {
            0.0
        };

        let defective = (report.counters.defects_detected + report.counters.defects_escaped) as f64;
        let quality = if produced > 0.0 {
            ((produced - defective) / produced).max(0.0)
        } else {
            1.0
        };

        Some(Self {
            availability,
            performance,
            quality,
            oee: availability * performance * quality,
        })
    }
}
