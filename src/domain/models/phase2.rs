//! Personalized Phase 2 trial candidates.

use serde::{Deserialize, Serialize};

use super::trial::{Phase2Link, TrialCondition};

/// One candidate trial bracketing a participant's indifference point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Phase2TrialSpec {
    /// 1-based id, contiguous across the generated set
    pub trial_id: u32,
    /// Shared by the 7 candidates of one (amount, probability) condition
    pub combination_id: u32,
    pub risky_amount: u64,
    pub risky_probability: u8,
    /// `round(p/100 * risky_amount)`
    pub risky_ev: u64,
    pub indifference_point: u64,
    pub safe_amount: u64,
    pub estimated_alpha: f64,
}

impl Phase2TrialSpec {
    /// The safe/risky pair this trial presents
    pub fn condition(&self) -> TrialCondition {
        TrialCondition::new(self.risky_probability, self.risky_amount, self.safe_amount)
    }

    /// Linkage carried by the trial spec into exported records
    pub fn link(&self) -> Phase2Link {
        Phase2Link {
            trial_id: self.trial_id,
            combination_id: self.combination_id,
            indifference_point: self.indifference_point,
            estimated_alpha: self.estimated_alpha,
        }
    }
}
