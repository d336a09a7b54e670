//! Causal DAG (§4.5): built from Granger edges with `is_causal=true`,
//! topologically sorted, and queried via BFS intervention simulation where
//! each reachable node's effect is the max cumulative strength product over
//! any path from the intervened node.

use causeway_core::types::GrangerResult;
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Default)]
pub struct CausalGraph {
    edges: HashMap<String, Vec<(String, f64)>>,
    nodes: HashSet<String>,
}

impl CausalGraph {
    pub fn from_granger_results(results: &[GrangerResult]) -> Self {
        let mut graph = CausalGraph::default();
        for r in results.iter().filter(|r| r.is_causal) {
            graph.nodes.insert(r.cause_metric.clone());
            graph.nodes.insert(r.effect_metric.clone());
            graph
                .edges
                .entry(r.cause_metric.clone())
                .or_default()
                .push((r.effect_metric.clone(), r.strength));
        }
        graph
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Kahn's algorithm. Returns `None` if the Granger edge set contains a
    /// cycle (possible with noisy pairwise tests); callers should fall back
    /// to reporting edges unordered when that happens.
    pub fn topological_sort(&self) -> Option<Vec<String>> {
        let mut in_degree: HashMap<&str, usize> = self.nodes.iter().map(|n| (n.as_str(), 0)).collect();
        for targets in self.edges.values() {
            for (target, _) in targets {
                *in_degree.get_mut(target.as_str()).unwrap() += 1;
            }
        }

        let mut queue: VecDeque<String> = in_degree
            .iter()
            .filter(|(_, deg)| **deg == 0)
            .map(|(n, _)| n.to_string())
            .collect();
        let mut sorted_queue: Vec<String> = queue.iter().cloned().collect();
        sorted_queue.sort();
        queue = sorted_queue.into();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(node) = queue.pop_front() {
            order.push(node.clone());
            if let Some(targets) = self.edges.get(&node) {
                let mut freed = Vec::new();
                for (target, _) in targets {
                    let deg = in_degree.get_mut(target.as_str()).unwrap();
                    *deg -= 1;
                    if *deg == 0 {
                        freed.push(target.clone());
                    }
                }
                freed.sort();
                for f in freed {
                    queue.push_back(f);
                }
            }
        }

        if order.len() == self.nodes.len() {
            Some(order)
        } else {
            None
        }
    }

    /// BFS intervention simulation from `root`, capped at `max_depth` hops.
    /// Each reachable node's effect is the maximum cumulative strength
    /// product over any path found, since a node may be reachable through
    /// more than one route.
    pub fn simulate_intervention(&self, root: &str, max_depth: usize) -> HashMap<String, f64> {
        let mut best: HashMap<String, f64> = HashMap::new();
        let mut queue: VecDeque<(String, f64, usize)> = VecDeque::new();
        queue.push_back((root.to_string(), 1.0, 0));

        while let Some((node, cumulative, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            if let Some(targets) = self.edges.get(&node) {
                for (target, strength) in targets {
                    let next = cumulative * strength;
                    let improved = best.get(target).map(|&existing| next > existing).unwrap_or(true);
                    if improved {
                        best.insert(target.clone(), next);
                        queue.push_back((target.clone(), next, depth + 1));
                    }
                }
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(cause: &str, effect: &str, strength: f64) -> GrangerResult {
        GrangerResult {
            cause_metric: cause.to_string(),
            effect_metric: effect.to_string(),
            max_lag: 1,
            f_statistic: 5.0,
            p_value: 0.01,
            is_causal: true,
            strength,
        }
    }

    #[test]
    fn topological_sort_orders_cause_before_effect() {
        let graph = CausalGraph::from_granger_results(&[edge("a", "b", 0.5), edge("b", "c", 0.5)]);
        let order = graph.topological_sort().expect("acyclic");
        let pos_a = order.iter().position(|n| n == "a").unwrap();
        let pos_b = order.iter().position(|n| n == "b").unwrap();
        let pos_c = order.iter().position(|n| n == "c").unwrap();
        assert!(pos_a < pos_b);
        assert!(pos_b < pos_c);
    }

    #[test]
    fn intervention_picks_strongest_path() {
        let graph = CausalGraph::from_granger_results(&[
            edge("a", "b", 0.9),
            edge("a", "c", 0.2),
            edge("c", "b", 0.9),
        ]);
        let effects = graph.simulate_intervention("a", 5);
        assert!((effects["b"] - 0.9).abs() < 1e-9);
    }

    #[test]
    fn depth_cap_limits_reach() {
        let graph = CausalGraph::from_granger_results(&[edge("a", "b", 0.9), edge("b", "c", 0.9)]);
        let effects = graph.simulate_intervention("a", 1);
        assert!(effects.contains_key("b"));
        assert!(!effects.contains_key("c"));
    }
}
