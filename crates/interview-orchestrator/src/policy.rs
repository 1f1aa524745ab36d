//! Response branching after a user answer.
//!
//! After the thinking delay the interviewer either asks a follow-up on the
//! current question, moves on to the next one, or closes the interview. The
//! decision is a pure function of the question, whether another question
//! remains, and a random draw, so it can be seeded or replaced in tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::question_bank::Question;

/// Default probability threshold: a follow-up is asked when the draw exceeds it.
pub const DEFAULT_FOLLOW_UP_THRESHOLD: f64 = 0.5;

/// Outcome of a response decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Branch {
    /// Ask this follow-up; the cursor stays where it is.
    FollowUp(String),
    /// Announce the transition and move to the next question.
    Advance,
    /// Deliver the closing message; no questions remain.
    Conclude,
}

/// Decides the branch for one answer.
///
/// A follow-up is chosen when the question has follow-ups and a uniform draw
/// in `[0, 1)` is strictly greater than `threshold`; the follow-up itself is
/// then picked uniformly. Otherwise the result is `Advance` if `has_next`,
/// else `Conclude`.
pub fn choose_branch<R: Rng>(
    question: &Question,
    has_next: bool,
    threshold: f64,
    rng: &mut R,
) -> Branch {
    if question.has_follow_ups() && rng.random::<f64>() > threshold {
        let index = rng.random_range(0..question.follow_ups.len());
        return Branch::FollowUp(question.follow_ups[index].clone());
    }

    if has_next {
        Branch::Advance
    } else {
        Branch::Conclude
    }
}

/// Pluggable branch decision used by the session driver.
pub trait BranchPolicy: Send {
    /// Chooses the branch for an answer to `question`.
    fn choose(&mut self, question: &Question, has_next: bool) -> Branch;
}

impl<F> BranchPolicy for F
where
    F: FnMut(&Question, bool) -> Branch + Send,
{
    fn choose(&mut self, question: &Question, has_next: bool) -> Branch {
        self(question, has_next)
    }
}

/// Random branch policy backed by any `Rng`.
#[derive(Debug, Clone)]
pub struct RandomBranchPolicy<R = StdRng> {
    rng: R,
    threshold: f64,
}

impl<R: Rng + Send> RandomBranchPolicy<R> {
    /// Wraps an existing generator.
    pub const fn new(rng: R, threshold: f64) -> Self {
        Self { rng, threshold }
    }
}

impl RandomBranchPolicy<StdRng> {
    /// Deterministic policy for reproducible sessions.
    #[must_use]
    pub fn from_seed(seed: u64, threshold: f64) -> Self {
        Self::new(StdRng::seed_from_u64(seed), threshold)
    }

    /// Policy seeded from the operating system.
    #[must_use]
    pub fn from_entropy(threshold: f64) -> Self {
        Self::new(StdRng::from_os_rng(), threshold)
    }
}

impl<R: Rng + Send> BranchPolicy for RandomBranchPolicy<R> {
    fn choose(&mut self, question: &Question, has_next: bool) -> Branch {
        choose_branch(question, has_next, self.threshold, &mut self.rng)
    }
}
