//! Timeline sequencing.
//!
//! Turns a condition pool into ordered practice, Phase 1 and Phase 2
//! timelines. All randomness comes from one seeded generator owned by the
//! sequencer, so a seed reproduces a participant's whole timeline.

use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AttentionCheckItem, AttentionQuestion, Phase2TrialSpec, SamplingPolicy, SizeCondition,
    Timeline, TimelineItem, TrialCondition, TrialNumber, TrialSpec,
};

/// Seeded sequencer for one session
#[derive(Debug, Clone)]
pub struct TimelineSequencer {
    rng: StdRng,
    seed: u64,
    policy: SamplingPolicy,
}

impl TimelineSequencer {
    /// Sequencer with a fixed seed
    pub fn new(seed: u64, policy: SamplingPolicy) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
            policy,
        }
    }

    /// Sequencer seeded from the thread generator
    pub fn from_entropy(policy: SamplingPolicy) -> Self {
        Self::new(rand::random(), policy)
    }

    /// Seed that reproduces this sequencer
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn policy(&self) -> SamplingPolicy {
        self.policy
    }

    /// Fisher-Yates shuffle in place
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }

    /// Draw `count` items from `pool`.
    ///
    /// Without replacement while `count` fits the pool; beyond that the
    /// sampling policy decides.
    pub fn sample<T: Clone>(&mut self, pool: &[T], count: usize) -> DomainResult<Vec<T>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        if pool.is_empty() || (count > pool.len() && self.policy == SamplingPolicy::Strict) {
            return Err(DomainError::SamplingInsufficient {
                requested: count,
                available: pool.len(),
            });
        }

        if count > pool.len() && self.policy == SamplingPolicy::WithReplacement {
            return Ok((0..count)
                .map(|_| pool[self.rng.random_range(0..pool.len())].clone())
                .collect());
        }

        let mut drawn = Vec::with_capacity(count);
        while drawn.len() < count {
            let mut round = pool.to_vec();
            round.shuffle(&mut self.rng);
            round.truncate(count - drawn.len());
            drawn.extend(round);
        }
        Ok(drawn)
    }

    fn presentation(&mut self) -> (SizeCondition, bool) {
        let size = SizeCondition::ALL[self.rng.random_range(0..SizeCondition::ALL.len())];
        (size, self.rng.random_bool(0.5))
    }

    fn trial(&mut self, trial_number: TrialNumber, condition: TrialCondition) -> TrialSpec {
        let (size_condition, risk_on_left) = self.presentation();
        TrialSpec {
            trial_number,
            condition,
            size_condition,
            risk_on_left,
            is_practice: matches!(trial_number, TrialNumber::Practice(_)),
            phase2: None,
        }
    }

    /// Untimed practice trials, numbered `practice_1..`
    #[instrument(skip(self, pool), fields(pool = pool.len()))]
    pub fn practice_timeline(
        &mut self,
        pool: &[TrialCondition],
        count: usize,
    ) -> DomainResult<Timeline> {
        let items = self
            .sample(pool, count)?
            .into_iter()
            .enumerate()
            .map(|(i, condition)| {
                TimelineItem::Trial(self.trial(TrialNumber::Practice(i as u32 + 1), condition))
            })
            .collect();
        Ok(Timeline::new(items))
    }

    /// Phase 1 trials with `checks` attention checks interleaved
    #[instrument(skip(self, pool, bank), fields(pool = pool.len(), bank = bank.len()))]
    pub fn main_timeline(
        &mut self,
        pool: &[TrialCondition],
        count: usize,
        bank: &[AttentionQuestion],
        checks: usize,
    ) -> DomainResult<Timeline> {
        let trials: Vec<TimelineItem> = self
            .sample(pool, count)?
            .into_iter()
            .enumerate()
            .map(|(i, condition)| {
                TimelineItem::Trial(self.trial(TrialNumber::Main(i as u32 + 1), condition))
            })
            .collect();

        let questions = self.attention_questions(bank, checks)?;
        let checks: Vec<TimelineItem> = questions
            .into_iter()
            .enumerate()
            .map(|(i, question)| {
                TimelineItem::AttentionCheck(AttentionCheckItem {
                    check_number: i as u32 + 1,
                    question,
                })
            })
            .collect();

        let items = interleave(trials, checks);
        debug!(items = items.len(), "built phase 1 timeline");
        Ok(Timeline::new(items))
    }

    /// Phase 2 timeline: shuffle the candidates, keep `count`, randomize presentation
    #[instrument(skip(self, candidates), fields(candidates = candidates.len()))]
    pub fn phase2_timeline(
        &mut self,
        candidates: &[Phase2TrialSpec],
        count: usize,
    ) -> DomainResult<Timeline> {
        let items = self
            .sample(candidates, count)?
            .into_iter()
            .enumerate()
            .map(|(i, candidate)| {
                let mut spec = self.trial(TrialNumber::Main(i as u32 + 1), candidate.condition());
                spec.phase2 = Some(candidate.link());
                TimelineItem::Trial(spec)
            })
            .collect();
        Ok(Timeline::new(items))
    }

    fn attention_questions(
        &mut self,
        bank: &[AttentionQuestion],
        checks: usize,
    ) -> DomainResult<Vec<AttentionQuestion>> {
        if checks == 0 {
            return Ok(Vec::new());
        }
        if bank.is_empty() {
            return Err(DomainError::EmptyQuestionBank);
        }
        if checks > bank.len() {
            return Err(DomainError::SamplingInsufficient {
                requested: checks,
                available: bank.len(),
            });
        }
        Ok(bank
            .choose_multiple(&mut self.rng, checks)
            .cloned()
            .collect())
    }
}

/// Insert attention checks into a trial sequence.
///
/// With `interval = floor(n / (k + 1))`, check `i` goes to
/// `(i + 1) * interval + inserted`, where `inserted` counts checks already
/// placed; a position past the end appends. When `interval` is zero
/// (`k >= n`) each check follows the next unpaired trial, surplus checks
/// trail the sequence.
pub fn interleave(trials: Vec<TimelineItem>, checks: Vec<TimelineItem>) -> Vec<TimelineItem> {
    let interval = trials.len() / (checks.len() + 1);
    let mut timeline = trials;
    timeline.reserve(checks.len());

    let mut inserted = 0;
    for (i, check) in checks.into_iter().enumerate() {
        let position = if interval == 0 {
            2 * i + 1
        } else {
            (i + 1) * interval + inserted
        };
        if position < timeline.len() {
            timeline.insert(position, check);
            inserted += 1;
        } else {
            timeline.push(check);
        }
    }
    timeline
}
