//! Qualitative controller synthesis for consumption Markov decision
//! processes (ConsMDPs).
//!
//! A ConsMDP is an MDP whose actions consume an integer amount of a
//! resource and whose state space contains designated *reload* states
//! where the resource is replenished up to a fixed capacity. For a
//! given capacity and target set, the solvers in this crate compute,
//! for every state, the minimal initial resource level from which a
//! strategy exists for one of the qualitative objectives (survival,
//! positive reachability, almost-sure reachability, almost-sure
//! Büchi), together with a finite-memory counter strategy witnessing
//! the levels.
//!
//! The typical entry point is [`solve`], or [`EnergySolver`] when
//! several objectives are needed over the same model.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

pub mod dba;
pub mod distribution;
pub mod examples;
pub mod labeled;
pub mod mdp;
pub mod mec;
pub mod solver;
pub mod strategy;

pub use crate::dba::Dba;
pub use crate::distribution::Distribution;
pub use crate::labeled::{LabeledConsMdp, ProductConsMdp};
pub use crate::mdp::{ActionData, ConsMdp};
pub use crate::mec::Mec;
pub use crate::solver::{solve, EnergySolver, Objective, SafetyVariant};
pub use crate::strategy::{CounterSelector, CounterStrategy, SelectionRule};

/// Identifier of a state, dense in `[0, num_states)`.
pub type StateId = usize;

/// Index of an action in the owning [`ConsMdp`]. Stable once created.
pub type ActionId = usize;

/// Resource level or consumption amount.
pub type Level = u32;

/// Sentinel for "no finite level suffices". Any computed value above
/// the capacity collapses to this.
pub const INF: Level = Level::MAX;

#[derive(Debug, Error)]
pub enum Error {
    /// The model violates a structural invariant (bad distribution,
    /// unknown successor, duplicate name or label, state without
    /// actions).
    #[error("invalid model: {0}")]
    InvalidModel(String),

    /// The zero-consumption transitions contain a cycle; the energy
    /// fixpoints would not terminate on such a model.
    #[error("zero-consumption cycle detected")]
    NonTerminating,

    /// Cooperative cancellation was requested between fixpoint rounds.
    #[error("computation cancelled")]
    Cancelled,

    /// The play ran out of selection rules: the current level is below
    /// every lower bound of the current state's rule.
    #[error("resource exhausted in state {state} at level {energy}")]
    Exhaustion { state: StateId, energy: Level },

    /// No strategy exists from the requested initial state.
    #[error("no strategy exists from state {0}")]
    NoStrategy(StateId),
}

/// Cooperative cancellation for long-running fixpoint computations.
///
/// Cloning shares the flag. Solvers check the token between fixpoint
/// rounds and abort with [`Error::Cancelled`]; partial results are
/// discarded.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_is_shared() {
        let t = CancelToken::new();
        let u = t.clone();
        assert!(!u.is_cancelled());
        t.cancel();
        assert!(u.is_cancelled());
    }
}
