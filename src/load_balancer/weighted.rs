//! Weight-priority ordering.

use std::cmp::Reverse;
use std::sync::Arc;

use crate::chain::Endpoint;
use crate::load_balancer::LoadBalancer;

/// Highest weight first. Equal weights keep their input order.
#[derive(Debug, Default, Clone, Copy)]
pub struct WeightedPriority;

impl WeightedPriority {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for WeightedPriority {
    fn order(&self, candidates: &[Arc<Endpoint>]) -> Vec<Arc<Endpoint>> {
        let mut ordered = candidates.to_vec();
        // `sort_by_key` is stable.
        ordered.sort_by_key(|e| Reverse(e.weight()));
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::EndpointConfig;

    fn ep(name: &str, weight: u32) -> Arc<Endpoint> {
        Arc::new(Endpoint::new(
            "ethereum",
            EndpointConfig::new(name, format!("http://{name}.invalid")).with_weight(weight),
        ))
    }

    fn names(endpoints: &[Arc<Endpoint>]) -> Vec<&str> {
        endpoints.iter().map(|e| e.name()).collect()
    }

    #[test]
    fn test_descending_weight() {
        let lb = WeightedPriority::new();
        let ordered = lb.order(&[ep("b", 2), ep("a", 3), ep("c", 1)]);
        assert_eq!(names(&ordered), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_equal_weights_keep_input_order_across_calls() {
        let lb = WeightedPriority::new();
        let candidates = vec![ep("x", 2), ep("top", 5), ep("y", 2), ep("z", 2)];

        for _ in 0..10 {
            let ordered = lb.order(&candidates);
            assert_eq!(names(&ordered), vec!["top", "x", "y", "z"]);
        }
    }

    #[test]
    fn test_empty_candidates() {
        assert!(WeightedPriority::new().order(&[]).is_empty());
    }
}
