/// Stations that can be built at the same dependency depth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub stations: Vec<usize>,
}

/// Stations left with non-zero in-degree once no further reduction is possible
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleRemainder {
    pub stations: Vec<usize>,
}

/// Topological sorting over station indices
pub struct BuildOrder;

impl BuildOrder {
    /// Analyzes the station graph to build a topologically sorted order organized into stages.
    /// Uses Kahn's algorithm; within a stage stations keep their declaration order.
    pub fn stages(station_count: usize, edges: &[(usize, usize)]) -> Result<Vec<Stage>, CycleRemainder> {
        let mut adj_list: Vec<Vec<usize>> = vec![Vec::new(); station_count];
        let mut in_degree: Vec<usize> = vec![0; station_count];
        let mut processed = vec![false; station_count];

        for &(source, target) in edges {
            if source >= station_count || target >= station_count {
                continue;
            }
            adj_list[source].push(target);
            in_degree[target] += 1;
        }

        let mut stages = Vec::new();
        let mut processed_count = 0;

        while processed_count < station_count {
            // Find all stations with zero in-degree (current stage)
            let current_stage: Vec<usize> = (0..station_count)
                .filter(|&index| !processed[index] && in_degree[index] == 0)
                .collect();

            if current_stage.is_empty() {
                let stations = (0..station_count).filter(|&index| !processed[index]).collect();
                return Err(CycleRemainder { stations });
            }

            for &station in &current_stage {
                processed[station] = true;
                processed_count += 1;

                // Decrease in-degree of all neighbors
                for &neighbor in &adj_list[station] {
                    in_degree[neighbor] -= 1;
                }
            }

            stages.push(Stage {
                stations: current_stage,
            });
        }

        Ok(stages)
    }

    /// Flattened stage order: every edge's source precedes its target
    pub fn order(station_count: usize, edges: &[(usize, usize)]) -> Result<Vec<usize>, CycleRemainder> {
        let stages = Self::stages(station_count, edges)?;
        Ok(stages.into_iter().flat_map(|stage| stage.stations).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stages_simple_chain() {
        // A -> B -> C
        let stages = BuildOrder::stages(3, &[(0, 1), (1, 2)]).expect("Should build order");
        assert_eq!(stages.len(), 3);
        assert_eq!(stages[0].stations, vec![0]);
        assert_eq!(stages[1].stations, vec![1]);
        assert_eq!(stages[2].stations, vec![2]);
    }

    #[test]
    fn test_stages_diamond() {
        // A -> B, A -> C, B -> D, C -> D
        let stages = BuildOrder::stages(4, &[(0, 1), (0, 2), (1, 3), (2, 3)]).expect("Should build order");
        assert_eq!(stages.len(), 3);
        assert_eq!(stages[1].stations, vec![1, 2], "B and C share a stage in declaration order");
        assert_eq!(stages[2].stations, vec![3]);
    }

    #[test]
    fn test_cycle_reports_remaining_stations() {
        // A -> B -> C -> B, D independent
        let result = BuildOrder::order(4, &[(0, 1), (1, 2), (2, 1)]);
        let remainder = result.expect_err("Cycle should be detected");
        assert_eq!(remainder.stations, vec![1, 2]);
    }

    #[test]
    fn test_order_respects_edges() {
        let edges = [(3, 0), (0, 1), (2, 1)];
        let order = BuildOrder::order(4, &edges).unwrap();
        let position = |station: usize| order.iter().position(|&s| s == station).unwrap();
        for (source, target) in edges {
            assert!(position(source) < position(target), "{} must precede {}", source, target);
        }
    }
}
