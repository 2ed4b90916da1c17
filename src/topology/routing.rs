use crate::core::errors::{Result, SimError};
use crate::core::material::{AttributeValue, MaterialKind, MaterialUnit};
use crate::core::types::BufferId;
use std::sync::Arc;

/// Typed condition attached to an outbound edge, evaluated against the unit being routed
#[derive(Clone)]
pub enum RoutePredicate {
    IsDefective,
    IsGood,
    KindIs(MaterialKind),
    /// True when the named attribute holds `Bool(true)`
    AttributeFlag(String),
    Custom(Arc<dyn Fn(&MaterialUnit) -> bool + Send + Sync>),
}

impl RoutePredicate {
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&MaterialUnit) -> bool + Send + Sync + 'static,
    {
        RoutePredicate::Custom(Arc::new(predicate))
    }

    /// Compile a textual routing condition. Accepted forms:
    /// `product.is_defective`, `not product.is_defective`, `product.kind == Case`,
    /// `product.attributes.<name>`, each also with the `unit.` prefix.
    pub fn parse(text: &str) -> Result<Self> {
        let condition = text.trim();
        let (negated, subject) = match condition.strip_prefix("not ") {
            Some(rest) => (true, rest.trim()),
            None => (false, condition),
        };
        let field = subject
            .strip_prefix("product.")
            .or_else(|| subject.strip_prefix("unit."))
            .ok_or_else(|| unsupported(text))?;

        if field == "is_defective" {
            return Ok(if negated {
                RoutePredicate::IsGood
            } else {
                RoutePredicate::IsDefective
            });
        }
        if negated {
            return Err(unsupported(text));
        }
        if let Some(kind) = field.strip_prefix("kind") {
            let kind = kind
                .trim()
                .strip_prefix("==")
                .ok_or_else(|| unsupported(text))?
                .trim()
                .trim_matches(|c| c == '\'' || c == '"');
            let kind = kind
                .parse::<MaterialKind>()
                .map_err(|message| SimError::configuration(format!("route condition '{}'", text), message))?;
            return Ok(RoutePredicate::KindIs(kind));
        }
        if let Some(name) = field.strip_prefix("attributes.") {
            if !name.is_empty() {
                return Ok(RoutePredicate::AttributeFlag(name.to_string()));
            }
        }
        Err(unsupported(text))
    }

    pub fn matches(&self, unit: &MaterialUnit) -> bool {
        match self {
            RoutePredicate::IsDefective => unit.is_defective(),
            RoutePredicate::IsGood => !unit.is_defective(),
            RoutePredicate::KindIs(kind) => unit.kind() == *kind,
            RoutePredicate::AttributeFlag(name) => {
                matches!(unit.attribute(name), Some(AttributeValue::Bool(true)))
            }
            RoutePredicate::Custom(predicate) => predicate(unit),
        }
    }
}

fn unsupported(text: &str) -> SimError {
    SimError::configuration(
        format!("route condition '{}'", text),
        "unsupported condition; expected product.is_defective, not product.is_defective, product.kind == <Kind> or product.attributes.<name>",
    )
}

impl std::fmt::Debug for RoutePredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutePredicate::IsDefective => write!(f, "IsDefective"),
            RoutePredicate::IsGood => write!(f, "IsGood"),
            RoutePredicate::KindIs(kind) => write!(f, "KindIs({})", kind),
            RoutePredicate::AttributeFlag(name) => write!(f, "AttributeFlag({})", name),
            RoutePredicate::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// One outbound edge resolved to its buffer
#[derive(Debug, Clone)]
pub struct Route {
    pub target: String,
    pub buffer: BufferId,
    /// `None` marks the default edge
    pub predicate: Option<RoutePredicate>,
}

/// Chooses the destination buffer of a station's finished units
#[derive(Debug, Clone)]
pub struct Router {
    station: String,
    routes: Vec<Route>,
}

impl Router {
    pub fn new(station: impl Into<String>, routes: Vec<Route>) -> Self {
        Self {
            station: station.into(),
            routes,
        }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Exactly one matching conditional edge wins; with no match the default
    /// edge is used; anything else is a routing ambiguity.
    pub fn select(&self, unit: &MaterialUnit) -> Result<BufferId> {
        let matched: Vec<&Route> = self
            .routes
            .iter()
            .filter(|route| route.predicate.as_ref().map_or(false, |predicate| predicate.matches(unit)))
            .collect();

        match matched.as_slice() {
            [only] => Ok(only.buffer),
            [] => self
                .routes
                .iter()
                .find(|route| route.predicate.is_none())
                .map(|route| route.buffer)
                .ok_or_else(|| self.ambiguity(unit, Vec::new())),
            several => {
                let targets = several.iter().map(|route| route.target.clone()).collect();
                Err(self.ambiguity(unit, targets))
            }
        }
    }

    fn ambiguity(&self, unit: &MaterialUnit, matched: Vec<String>) -> SimError {
        SimError::RoutingAmbiguity {
            station: self.station.clone(),
            unit: unit.id().short(),
            matched,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::material::MaterialId;

    fn unit(defective: bool) -> MaterialUnit {
        MaterialUnit::new(MaterialId::from_random_bytes([3; 16]), MaterialKind::Case, 0.0, "QC").with_defect(defective)
    }

    fn route(target: &str, index: usize, predicate: Option<RoutePredicate>) -> Route {
        Route {
            target: target.to_string(),
            buffer: BufferId::new(index),
            predicate,
        }
    }

    #[test]
    fn test_parse_supported_conditions() {
        assert!(matches!(RoutePredicate::parse("product.is_defective"), Ok(RoutePredicate::IsDefective)));
        assert!(matches!(RoutePredicate::parse("not unit.is_defective"), Ok(RoutePredicate::IsGood)));
        assert!(matches!(
            RoutePredicate::parse("product.kind == 'Pallet'"),
            Ok(RoutePredicate::KindIs(MaterialKind::Pallet))
        ));
        assert!(matches!(
            RoutePredicate::parse("unit.attributes.rework"),
            Ok(RoutePredicate::AttributeFlag(name)) if name == "rework"
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_conditions() {
        for text in ["product.weight > 3", "machine.is_down", "not product.kind == Case", "product.kind == Crate"] {
            assert!(
                matches!(RoutePredicate::parse(text), Err(SimError::Configuration { .. })),
                "'{}' should be rejected",
                text
            );
        }
    }

    #[test]
    fn test_select_single_match_and_default() {
        let router = Router::new(
            "QC",
            vec![
                route("Rework", 1, Some(RoutePredicate::IsDefective)),
                route("Packer", 2, None),
            ],
        );
        assert_eq!(router.select(&unit(true)).unwrap(), BufferId::new(1));
        assert_eq!(router.select(&unit(false)).unwrap(), BufferId::new(2));
    }

    #[test]
    fn test_select_multiple_matches_is_ambiguous() {
        let router = Router::new(
            "QC",
            vec![
                route("A", 1, Some(RoutePredicate::KindIs(MaterialKind::Case))),
                route("B", 2, Some(RoutePredicate::IsGood)),
            ],
        );
        match router.select(&unit(false)) {
            Err(SimError::RoutingAmbiguity { station, matched, .. }) => {
                assert_eq!(station, "QC");
                assert_eq!(matched, vec!["A".to_string(), "B".to_string()]);
            }
            other => panic!("expected routing ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_select_no_match_without_default_is_ambiguous() {
        let router = Router::new("QC", vec![route("A", 1, Some(RoutePredicate::IsDefective))]);
        assert!(matches!(
            router.select(&unit(false)),
            Err(SimError::RoutingAmbiguity { matched, .. }) if matched.is_empty()
        ));
    }

    #[test]
    fn test_custom_predicate() {
        let router = Router::new(
            "QC",
            vec![
                route("Early", 1, Some(RoutePredicate::custom(|unit| unit.created_at() < 10.0))),
                route("Late", 2, None),
            ],
        );
        assert_eq!(router.select(&unit(false)).unwrap(), BufferId::new(1));
    }
}
