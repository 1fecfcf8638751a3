use crate::domain::models::{Phase1Config, Phase2Config, TrialCondition};

/// Service producing the choice space a timeline samples from
///
/// Output order is deterministic: probability outer, risky reward middle,
/// safe reward inner. No randomness happens here.
#[derive(Debug, Clone, Default)]
pub struct CombinationGenerator;

impl CombinationGenerator {
    /// Stateless generator; the sets are passed per call
    pub fn new() -> Self {
        Self
    }

    /// Full cross product of probabilities, risky rewards and safe rewards
    pub fn cross_product(
        &self,
        probabilities: &[u8],
        risky_rewards: &[u64],
        safe_rewards: &[u64],
    ) -> Vec<TrialCondition> {
        probabilities
            .iter()
            .flat_map(|&p| {
                risky_rewards.iter().flat_map(move |&risky| {
                    safe_rewards
                        .iter()
                        .map(move |&safe| TrialCondition::new(p, risky, safe))
                })
            })
            .collect()
    }

    /// Phase 1 conditions from configuration (27 with the defaults)
    pub fn phase1(&self, config: &Phase1Config) -> Vec<TrialCondition> {
        self.cross_product(
            &config.risk_probabilities,
            &config.risky_rewards,
            &config.safe_rewards,
        )
    }

    /// Phase 2 (risky amount, probability) pairs, amount outer
    pub fn phase2_conditions(&self, config: &Phase2Config) -> Vec<(u64, u8)> {
        config
            .active_amounts()
            .iter()
            .flat_map(|&amount| config.probabilities.iter().map(move |&p| (amount, p)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_phase1_has_27_distinct_conditions() {
        let conditions = CombinationGenerator::new().phase1(&Phase1Config::default());
        assert_eq!(conditions.len(), 27);
        let unique: HashSet<_> = conditions.iter().collect();
        assert_eq!(unique.len(), 27);
    }

    #[test]
    fn test_phase1_order() {
        let conditions = CombinationGenerator::new().phase1(&Phase1Config::default());
        assert_eq!(conditions[0], TrialCondition::new(25, 100, 50));
        assert_eq!(conditions[1], TrialCondition::new(25, 100, 100));
        assert_eq!(conditions[3], TrialCondition::new(25, 200, 50));
        assert_eq!(conditions[9], TrialCondition::new(50, 100, 50));
        assert_eq!(conditions[26], TrialCondition::new(75, 300, 150));
    }

    #[test]
    fn test_empty_axis_yields_nothing() {
        let generator = CombinationGenerator::new();
        assert!(generator.cross_product(&[25], &[], &[50]).is_empty());
    }

    #[test]
    fn test_phase2_conditions() {
        let generator = CombinationGenerator::new();
        let pairs = generator.phase2_conditions(&Phase2Config::default());
        assert_eq!(pairs.len(), 9);
        assert_eq!(pairs[0], (120, 25));
        assert_eq!(pairs[2], (120, 75));
        assert_eq!(pairs[3], (300, 25));

        assert_eq!(generator.phase2_conditions(&Phase2Config::full()).len(), 18);
    }
}
