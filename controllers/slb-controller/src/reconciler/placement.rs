//! Zone selection for new SLB instances

use crate::error::ControllerError;
use crate::service::BackendCandidate;
use rand::seq::SliceRandom;
use rand::Rng;

/// Node label carrying the availability zone code
pub const LABEL_NODE_AZ: &str = "node.kubernetes.io/node.az";

/// Pick the zone for a new SLB.
///
/// One zone value is collected per labelled candidate and one entry of that list is
/// drawn uniformly, so a zone's chance is proportional to its node count. Unlabelled
/// candidates are skipped. There is no default zone.
pub fn select_zone<R: Rng + ?Sized>(
    candidates: &[BackendCandidate],
    rng: &mut R,
) -> Result<String, ControllerError> {
    if candidates.is_empty() {
        return Err(ControllerError::NoCandidates);
    }

    let zones: Vec<&str> = candidates
        .iter()
        .filter_map(|c| c.label(LABEL_NODE_AZ))
        .collect();

    zones
        .choose(rng)
        .map(|zone| zone.to_string())
        .ok_or(ControllerError::NoZone(candidates.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::candidate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_empty_candidates() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(select_zone(&[], &mut rng), Err(ControllerError::NoCandidates)));
    }

    #[test]
    fn test_unlabelled_candidates_are_skipped() {
        let mut rng = StdRng::seed_from_u64(1);
        let candidates = vec![
            candidate("a", None, Some("10.0.0.1")),
            candidate("b", Some("zoneB"), Some("10.0.0.2")),
        ];
        for _ in 0..20 {
            assert_eq!(select_zone(&candidates, &mut rng).unwrap(), "zoneB");
        }
    }

    #[test]
    fn test_no_labels_is_an_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let candidates = vec![candidate("a", None, None), candidate("b", None, None)];
        assert!(matches!(select_zone(&candidates, &mut rng), Err(ControllerError::NoZone(2))));
    }

    #[test]
    fn test_zones_weighted_by_node_count() {
        let mut rng = StdRng::seed_from_u64(42);
        let candidates = vec![
            candidate("a1", Some("A"), None),
            candidate("a2", Some("A"), None),
            candidate("b1", Some("B"), None),
        ];

        let trials = 30_000;
        let picks_a = (0..trials)
            .filter(|_| select_zone(&candidates, &mut rng).unwrap() == "A")
            .count();
        let ratio = picks_a as f64 / trials as f64;
        assert!((ratio - 2.0 / 3.0).abs() < 0.02, "zone A picked {:.3} of the time", ratio);
    }
}
