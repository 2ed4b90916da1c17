/// Fatal problems detected while building or running a line
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// Malformed input reaching the engine
    Configuration { context: String, message: String },
    /// Stations that remain on a cycle after in-degree reduction
    CycleDetected { nodes: Vec<String> },
    /// A unit matched several outbound edges, or none and no default exists
    RoutingAmbiguity {
        station: String,
        unit: String,
        matched: Vec<String>,
    },
    /// A reference to a node the graph does not contain
    UnknownNode { name: String },
}

impl SimError {
    pub fn configuration(context: impl Into<String>, message: impl Into<String>) -> Self {
        SimError::Configuration {
            context: context.into(),
            message: message.into(),
        }
    }

    pub fn unknown_node(name: impl Into<String>) -> Self {
        SimError::UnknownNode { name: name.into() }
    }
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimError::Configuration { context, message } => {
                write!(f, "Configuration error in {}: {}", context, message)
            }
            SimError::CycleDetected { nodes } => {
                write!(f, "Cycle detected among stations: {}", nodes.join(", "))
            }
            SimError::RoutingAmbiguity { station, unit, matched } => {
                if matched.is_empty() {
                    write!(
                        f,
                        "Routing ambiguity at station '{}': unit {} matched no edge and no default edge exists",
                        station, unit
                    )
                } else {
                    write!(
                        f,
                        "Routing ambiguity at station '{}': unit {} matched edges to {}",
                        station,
                        unit,
                        matched.join(", ")
                    )
                }
            }
            SimError::UnknownNode { name } => write!(f, "Unknown node: {}", name),
        }
    }
}

impl std::error::Error for SimError {}

/// Result alias used by every fallible operation in the crate
pub type Result<T> = std::result::Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = SimError::configuration("station 'Filler'", "uph must be positive");
        assert_eq!(err.to_string(), "Configuration error in station 'Filler': uph must be positive");

        let err = SimError::CycleDetected {
            nodes: vec!["A".to_string(), "B".to_string()],
        };
        assert_eq!(err.to_string(), "Cycle detected among stations: A, B");

        let err = SimError::RoutingAmbiguity {
            station: "QC".to_string(),
            unit: "1234abcd".to_string(),
            matched: Vec::new(),
        };
        assert!(err.to_string().contains("matched no edge"));
    }
}
