//! Finite discrete probability distributions over state identifiers.

use serde::{Deserialize, Serialize};

use crate::{Error, StateId};

/// Tolerance for the unit-sum check.
pub const SUM_TOLERANCE: f64 = 1e-9;

/// A probability distribution over successor states.
///
/// Stored as two parallel vectors sorted by state id, which keeps
/// support lookups cheap during MEC shrinking and makes iteration
/// order deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    states: Vec<StateId>,
    weights: Vec<f64>,
}

impl Distribution {
    /// Build a distribution from (state, weight) pairs.
    ///
    /// Fails if a state occurs twice, a weight is not positive, or the
    /// weights do not sum to one within [`SUM_TOLERANCE`].
    pub fn from_pairs<I>(pairs: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (StateId, f64)>,
    {
        let mut pairs: Vec<(StateId, f64)> = pairs.into_iter().collect();
        pairs.sort_by_key(|(s, _)| *s);

        let mut sum = 0.0;
        for window in pairs.windows(2) {
            if window[0].0 == window[1].0 {
                return Err(Error::InvalidModel(format!(
                    "state {} occurs twice in a distribution",
                    window[0].0
                )));
            }
        }
        for &(s, w) in &pairs {
            if w <= 0.0 {
                return Err(Error::InvalidModel(format!(
                    "non-positive probability {} for state {}",
                    w, s
                )));
            }
            sum += w;
        }
        if (sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(Error::InvalidModel(format!(
                "probabilities sum to {} instead of 1",
                sum
            )));
        }

        let (states, weights) = pairs.into_iter().unzip();
        Ok(Distribution { states, weights })
    }

    /// Uniform distribution over the given states.
    pub fn uniform(states: &[StateId]) -> Result<Self, Error> {
        if states.is_empty() {
            return Err(Error::InvalidModel(
                "uniform distribution over no states".to_string(),
            ));
        }
        let p = 1.0 / states.len() as f64;
        Self::from_pairs(states.iter().map(|&s| (s, p)))
    }

    /// Dirac distribution on a single state.
    pub fn dirac(state: StateId) -> Self {
        Distribution {
            states: vec![state],
            weights: vec![1.0],
        }
    }

    /// Successor states, sorted by id.
    pub fn support(&self) -> &[StateId] {
        &self.states
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Probability of `state`, 0 when outside the support.
    pub fn probability(&self, state: StateId) -> f64 {
        match self.states.binary_search(&state) {
            Ok(i) => self.weights[i],
            Err(_) => 0.0,
        }
    }

    pub fn contains(&self, state: StateId) -> bool {
        self.states.binary_search(&state).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StateId, f64)> + '_ {
        self.states.iter().copied().zip(self.weights.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
