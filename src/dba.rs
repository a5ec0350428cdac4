//! Deterministic Büchi automata over sets of atomic propositions.
//!
//! The automaton is supplied by the caller (typically produced by an
//! external LTL translator); this crate only needs to follow its
//! transitions during the product construction. Guards are exact
//! sets of atomic-proposition indices: an edge is taken when the
//! label of the read state equals its guard.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::Error;

/// A set of atomic propositions, by index into the owning model's AP
/// list.
pub type ApSet = BTreeSet<u32>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbaTransition {
    pub from: u32,
    pub guard: ApSet,
    pub to: u32,
}

/// A deterministic state-based Büchi automaton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dba {
    num_states: u32,
    pub initial: u32,
    pub delta: Vec<DbaTransition>,
    pub accepting: BTreeSet<u32>,
}

impl Dba {
    pub fn new(num_states: u32, initial: u32, accepting: impl IntoIterator<Item = u32>) -> Self {
        assert!(initial < num_states, "initial state out of range");
        Dba {
            num_states,
            initial,
            delta: Vec::new(),
            accepting: accepting.into_iter().collect(),
        }
    }

    pub fn num_states(&self) -> u32 {
        self.num_states
    }

    /// Add the edge `from --guard--> to`.
    ///
    /// Fails when an edge with the same source and guard exists
    /// (determinism would be lost) or a state is out of range.
    pub fn add_edge(&mut self, from: u32, guard: ApSet, to: u32) -> Result<(), Error> {
        if from >= self.num_states || to >= self.num_states {
            return Err(Error::InvalidModel(format!(
                "automaton edge {} -> {} out of range",
                from, to
            )));
        }
        if self
            .delta
            .iter()
            .any(|t| t.from == from && t.guard == guard)
        {
            return Err(Error::InvalidModel(format!(
                "automaton state {} already has an edge guarded by {:?}",
                from, guard
            )));
        }
        self.delta.push(DbaTransition { from, guard, to });
        Ok(())
    }

    /// The successor of `q` when reading `label`, `None` when the
    /// automaton has no matching edge.
    pub fn successor(&self, q: u32, label: &ApSet) -> Option<u32> {
        self.delta
            .iter()
            .find(|t| t.from == q && t.guard == *label)
            .map(|t| t.to)
    }

    pub fn is_accepting(&self, q: u32) -> bool {
        self.accepting.contains(&q)
    }
}
