use crate::config::StationConfig;
use crate::core::errors::{Result, SimError};
use std::str::FromStr;
use std::sync::Arc;

/// The closed set of phases a station cycle is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    Collect,
    Breakdown,
    MicroStop,
    Execute,
    Transform,
    Inspect,
}

impl PhaseKind {
    pub fn name(&self) -> &'static str {
        match self {
            PhaseKind::Collect => "collect",
            PhaseKind::Breakdown => "breakdown",
            PhaseKind::MicroStop => "microstop",
            PhaseKind::Execute => "execute",
            PhaseKind::Transform => "transform",
            PhaseKind::Inspect => "inspect",
        }
    }
}

impl std::fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PhaseKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "collect" => Ok(PhaseKind::Collect),
            "breakdown" => Ok(PhaseKind::Breakdown),
            "microstop" | "micro_stop" => Ok(PhaseKind::MicroStop),
            "execute" => Ok(PhaseKind::Execute),
            "transform" => Ok(PhaseKind::Transform),
            "inspect" => Ok(PhaseKind::Inspect),
            other => Err(SimError::configuration("behavior", format!("unknown phase '{}'", other))),
        }
    }
}

/// Boolean function of a station's configuration deciding whether a phase runs
#[derive(Clone)]
pub enum EnablementPredicate {
    Always,
    Never,
    ReliabilityConfigured,
    JamProbabilityPositive,
    DefectRatePositive,
    DetectionProbabilityPositive,
    Custom(Arc<dyn Fn(&StationConfig) -> bool + Send + Sync>),
}

impl EnablementPredicate {
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&StationConfig) -> bool + Send + Sync + 'static,
    {
        EnablementPredicate::Custom(Arc::new(predicate))
    }

    /// Compile a textual predicate
    pub fn parse(text: &str) -> Result<Self> {
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.as_str() {
            "always" | "true" => Ok(EnablementPredicate::Always),
            "never" | "false" => Ok(EnablementPredicate::Never),
            "config.reliability.mtbf_min is not None" => Ok(EnablementPredicate::ReliabilityConfigured),
            "config.performance.jam_prob > 0" => Ok(EnablementPredicate::JamProbabilityPositive),
            "config.quality.defect_rate > 0" => Ok(EnablementPredicate::DefectRatePositive),
            "config.quality.detection_prob > 0" => Ok(EnablementPredicate::DetectionProbabilityPositive),
            _ => Err(SimError::configuration(
                format!("enablement predicate '{}'", text),
                "unsupported predicate",
            )),
        }
    }

    pub fn evaluate(&self, config: &StationConfig) -> bool {
        match self {
            EnablementPredicate::Always => true,
            EnablementPredicate::Never => false,
            EnablementPredicate::ReliabilityConfigured => config.reliability.mtbf_min.is_some(),
            EnablementPredicate::JamProbabilityPositive => config.performance.jam_prob > 0.0,
            EnablementPredicate::DefectRatePositive => config.quality.defect_rate > 0.0,
            EnablementPredicate::DetectionProbabilityPositive => config.quality.detection_prob > 0.0,
            EnablementPredicate::Custom(predicate) => predicate(config),
        }
    }
}

impl std::fmt::Debug for EnablementPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnablementPredicate::Always => write!(f, "Always"),
            EnablementPredicate::Never => write!(f, "Never"),
            EnablementPredicate::ReliabilityConfigured => write!(f, "ReliabilityConfigured"),
            EnablementPredicate::JamProbabilityPositive => write!(f, "JamProbabilityPositive"),
            EnablementPredicate::DefectRatePositive => write!(f, "DefectRatePositive"),
            EnablementPredicate::DetectionProbabilityPositive => write!(f, "DetectionProbabilityPositive"),
            EnablementPredicate::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PhaseSpec {
    pub kind: PhaseKind,
    pub enabled_when: EnablementPredicate,
}

impl PhaseSpec {
    pub fn new(kind: PhaseKind, enabled_when: EnablementPredicate) -> Self {
        Self { kind, enabled_when }
    }
}

/// Ordered phase list shared by every station built from it
#[derive(Debug, Clone)]
pub struct BehaviorDefinition {
    name: String,
    phases: Vec<PhaseSpec>,
}

impl BehaviorDefinition {
    pub fn new(name: impl Into<String>, phases: Vec<PhaseSpec>) -> Self {
        Self {
            name: name.into(),
            phases,
        }
    }

    /// Six-phase cycle: collect, breakdown, microstop, execute, transform, inspect
    pub fn standard() -> Self {
        Self::new(
            "standard",
            vec![
                PhaseSpec::new(PhaseKind::Collect, EnablementPredicate::Always),
                PhaseSpec::new(PhaseKind::Breakdown, EnablementPredicate::ReliabilityConfigured),
                PhaseSpec::new(PhaseKind::MicroStop, EnablementPredicate::JamProbabilityPositive),
                PhaseSpec::new(PhaseKind::Execute, EnablementPredicate::Always),
                PhaseSpec::new(PhaseKind::Transform, EnablementPredicate::Always),
                PhaseSpec::new(PhaseKind::Inspect, EnablementPredicate::Always),
            ],
        )
    }

    /// Build from `(phase, predicate)` text pairs, compiling each predicate once
    pub fn from_text(name: impl Into<String>, phases: &[(&str, &str)]) -> Result<Self> {
        let phases = phases
            .iter()
            .map(|(kind, predicate)| -> Result<PhaseSpec> {
                Ok(PhaseSpec::new(kind.parse::<PhaseKind>()?, EnablementPredicate::parse(predicate)?))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(name, phases))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phases(&self) -> &[PhaseSpec] {
        &self.phases
    }

    /// Evaluate every predicate against `config` and keep the enabled phases
    pub fn resolve(&self, config: &StationConfig) -> Result<ResolvedBehavior> {
        let phases: Vec<PhaseKind> = self
            .phases
            .iter()
            .filter(|spec| spec.enabled_when.evaluate(config))
            .map(|spec| spec.kind)
            .collect();

        let required = [PhaseKind::Collect, PhaseKind::Execute, PhaseKind::Transform, PhaseKind::Inspect];
        let sequence: Vec<PhaseKind> = phases.iter().copied().filter(|kind| required.contains(kind)).collect();
        if sequence != required {
            let listed: Vec<&str> = phases.iter().map(PhaseKind::name).collect();
            return Err(SimError::configuration(
                format!("behavior '{}' for station '{}'", self.name, config.name),
                format!(
                    "enabled phases [{}] must include collect, execute, transform and inspect exactly once, in that order",
                    listed.join(", ")
                ),
            ));
        }

        Ok(ResolvedBehavior {
            station: config.name.clone(),
            phases,
        })
    }
}

/// Enabled phases of one station, fixed at build time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBehavior {
    station: String,
    phases: Vec<PhaseKind>,
}

impl ResolvedBehavior {
    pub fn station(&self) -> &str {
        &self.station
    }

    pub fn phases(&self) -> &[PhaseKind] {
        &self.phases
    }

    pub fn contains(&self, kind: PhaseKind) -> bool {
        self.phases.contains(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_behavior_skips_disabled_phases() {
        let config = StationConfig::new("Filler", 3600);
        let resolved = BehaviorDefinition::standard().resolve(&config).unwrap();
        assert_eq!(
            resolved.phases(),
            &[PhaseKind::Collect, PhaseKind::Execute, PhaseKind::Transform, PhaseKind::Inspect]
        );
        assert!(!resolved.contains(PhaseKind::Breakdown));
    }

    #[test]
    fn test_standard_behavior_enables_fault_phases() {
        let config = StationConfig::new("Filler", 3600).with_reliability(60.0, 5.0).with_jams(0.01, 10.0);
        let resolved = BehaviorDefinition::standard().resolve(&config).unwrap();
        assert_eq!(resolved.phases().len(), 6);
        assert_eq!(resolved.phases()[1], PhaseKind::Breakdown);
        assert_eq!(resolved.phases()[2], PhaseKind::MicroStop);
    }

    #[test]
    fn test_parse_predicates() {
        let config = StationConfig::new("A", 60).with_quality(0.1, 0.0);
        assert!(EnablementPredicate::parse("config.quality.defect_rate > 0").unwrap().evaluate(&config));
        assert!(!EnablementPredicate::parse("config.quality.detection_prob  >  0").unwrap().evaluate(&config));
        assert!(!EnablementPredicate::parse("config.reliability.mtbf_min is not None").unwrap().evaluate(&config));
        assert!(EnablementPredicate::parse("config.speed > 3").is_err());
    }

    #[test]
    fn test_from_text_round_trip_to_standard_order() {
        let behavior = BehaviorDefinition::from_text(
            "text",
            &[
                ("collect", "always"),
                ("breakdown", "config.reliability.mtbf_min is not None"),
                ("execute", "always"),
                ("transform", "always"),
                ("inspect", "always"),
            ],
        )
        .unwrap();
        let config = StationConfig::new("A", 60);
        let standard = BehaviorDefinition::standard().resolve(&config).unwrap();
        assert_eq!(behavior.resolve(&config).unwrap().phases(), standard.phases());
        assert!(BehaviorDefinition::from_text("bad", &[("polish", "always")]).is_err());
    }

    #[test]
    fn test_resolve_rejects_missing_or_misordered_phases() {
        let config = StationConfig::new("A", 60);
        let missing_inspect = BehaviorDefinition::new(
            "partial",
            vec![
                PhaseSpec::new(PhaseKind::Collect, EnablementPredicate::Always),
                PhaseSpec::new(PhaseKind::Execute, EnablementPredicate::Always),
                PhaseSpec::new(PhaseKind::Transform, EnablementPredicate::Always),
                PhaseSpec::new(PhaseKind::Inspect, EnablementPredicate::Never),
            ],
        );
        assert!(matches!(missing_inspect.resolve(&config), Err(SimError::Configuration { .. })));

        let misordered = BehaviorDefinition::new(
            "misordered",
            vec![
                PhaseSpec::new(PhaseKind::Transform, EnablementPredicate::Always),
                PhaseSpec::new(PhaseKind::Collect, EnablementPredicate::Always),
                PhaseSpec::new(PhaseKind::Execute, EnablementPredicate::Always),
                PhaseSpec::new(PhaseKind::Inspect, EnablementPredicate::Always),
            ],
        );
        assert!(misordered.resolve(&config).is_err());
    }

    #[test]
    fn test_custom_predicate() {
        let slow_only = EnablementPredicate::custom(|config| config.uph < 100);
        assert!(slow_only.evaluate(&StationConfig::new("A", 60)));
        assert!(!slow_only.evaluate(&StationConfig::new("B", 600)));
    }
}
