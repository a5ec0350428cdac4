//! Counter selectors and the counter strategy that plays them.
//!
//! A *selection rule* is a partial map from energy lower bounds to
//! actions: for energy `e` it selects the action of the largest bound
//! not above `e`. A *counter selector* holds one rule per state. A
//! *counter strategy* combines a selector with the resource counter
//! and implements the play loop: pick an action for the current
//! (state, level), resolve the outcome, deduct the consumption, clip
//! to the capacity when a reload is entered.

use serde::{Deserialize, Serialize};

use crate::mdp::{ActionData, ConsMdp};
use crate::{ActionId, Error, Level, StateId};

/// Step function from energy lower bounds to action ids, kept sorted
/// for binary-search lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRule {
    entries: Vec<(Level, ActionId)>,
}

impl SelectionRule {
    /// Map energies in `[bound, next bound)` to `action`. An existing
    /// entry with the same bound is replaced.
    pub fn insert(&mut self, bound: Level, action: ActionId) {
        match self.entries.binary_search_by_key(&bound, |(b, _)| *b) {
            Ok(i) => self.entries[i].1 = action,
            Err(i) => self.entries.insert(i, (bound, action)),
        }
    }

    /// Action for the given energy, `None` when the energy is below
    /// every bound.
    pub fn select(&self, energy: Level) -> Option<ActionId> {
        let idx = self.entries.partition_point(|(b, _)| *b <= energy);
        if idx == 0 {
            None
        } else {
            Some(self.entries[idx - 1].1)
        }
    }

    /// The smallest energy for which the rule selects anything.
    pub fn lowest_bound(&self) -> Option<Level> {
        self.entries.first().map(|(b, _)| *b)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Level, ActionId)> + '_ {
        self.entries.iter().copied()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Render the rule as intervals with action labels, one per line.
    pub fn describe(&self, mdp: &ConsMdp) -> String {
        let mut lines = Vec::new();
        for (i, (bound, aid)) in self.entries.iter().enumerate() {
            let label = &mdp.action(*aid).label;
            match self.entries.get(i + 1) {
                Some((next, _)) => lines.push(format!("{} - {}: {}", bound, next - 1, label)),
                None => lines.push(format!("{}+: {}", bound, label)),
            }
        }
        lines.join(",\n")
    }
}

/// One selection rule per state of a ConsMDP.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSelector {
    rules: Vec<SelectionRule>,
}

impl CounterSelector {
    pub fn new(num_states: usize) -> Self {
        CounterSelector {
            rules: vec![SelectionRule::default(); num_states],
        }
    }

    pub fn for_mdp(mdp: &ConsMdp) -> Self {
        Self::new(mdp.num_states())
    }

    pub fn num_states(&self) -> usize {
        self.rules.len()
    }

    /// Record that `action` is to be played in `state` from energy
    /// `bound` upwards (until a higher bound takes over).
    ///
    /// Panics when `action` is not an action of `state`; that is a
    /// programmer error, not a recoverable condition.
    pub fn update(&mut self, mdp: &ConsMdp, state: StateId, bound: Level, action: ActionId) {
        assert!(
            mdp.action_ids(state).contains(&action),
            "action {} does not belong to state {}",
            action,
            state
        );
        self.rules[state].insert(bound, action);
    }

    pub fn select_action(&self, state: StateId, energy: Level) -> Option<ActionId> {
        self.rules[state].select(energy)
    }

    pub fn rule(&self, state: StateId) -> &SelectionRule {
        &self.rules[state]
    }

    pub fn rules(&self) -> &[SelectionRule] {
        &self.rules
    }

    pub(crate) fn clear_rule(&mut self, state: StateId) {
        self.rules[state].clear();
    }

    pub(crate) fn clear_all(&mut self) {
        for rule in &mut self.rules {
            rule.clear();
        }
    }

    /// Replace the rules for `states` by the rules of `other`.
    pub fn copy_rules_from<I>(&mut self, other: &CounterSelector, states: I)
    where
        I: IntoIterator<Item = StateId>,
    {
        for s in states {
            self.rules[s] = other.rules[s].clone();
        }
    }
}

/// A play in progress: a selector plus the resource counter.
///
/// Calls to [`next_action`](CounterStrategy::next_action) and
/// [`update_state`](CounterStrategy::update_state) must alternate;
/// [`step`](CounterStrategy::step) bundles both. The strategy is a
/// pure function of (state, level), so two plays from the same
/// configuration agree.
#[derive(Debug)]
pub struct CounterStrategy<'a> {
    mdp: &'a ConsMdp,
    selector: &'a CounterSelector,
    capacity: Level,
    state: StateId,
    energy: Level,
    current_action: Option<ActionId>,
}

impl<'a> CounterStrategy<'a> {
    /// Start a play in `init_state` with `init_energy`.
    ///
    /// Fails with [`Error::NoStrategy`] when the selector has no rule
    /// at all for `init_state`. When the initial state is a reload,
    /// the level is clipped up to the capacity, the same as entering
    /// it mid-play.
    pub fn new(
        mdp: &'a ConsMdp,
        selector: &'a CounterSelector,
        capacity: Level,
        init_state: StateId,
        init_energy: Level,
    ) -> Result<Self, Error> {
        if selector.rule(init_state).is_empty() {
            return Err(Error::NoStrategy(init_state));
        }
        debug_assert!(init_energy <= capacity);
        let energy = if mdp.is_reload(init_state) {
            capacity
        } else {
            init_energy
        };
        Ok(CounterStrategy {
            mdp,
            selector,
            capacity,
            state: init_state,
            energy,
            current_action: None,
        })
    }

    pub fn current_state(&self) -> StateId {
        self.state
    }

    pub fn energy(&self) -> Level {
        self.energy
    }

    /// Pick the action for the current state and level.
    ///
    /// Returns [`Error::Exhaustion`] when the level is below every
    /// bound of the current rule. Panics when called twice without an
    /// intervening `update_state`.
    pub fn next_action(&mut self) -> Result<&'a ActionData, Error> {
        assert!(
            self.current_action.is_none(),
            "next_action called again before update_state"
        );
        match self.selector.select_action(self.state, self.energy) {
            None => Err(Error::Exhaustion {
                state: self.state,
                energy: self.energy,
            }),
            Some(aid) => {
                self.current_action = Some(aid);
                Ok(self.mdp.action(aid))
            }
        }
    }

    /// Resolve the last picked action to `outcome`: deduct the
    /// consumption and clip the level to the capacity when `outcome`
    /// is a reload.
    ///
    /// Panics when no action is pending or `outcome` is not in the
    /// support of the pending action.
    pub fn update_state(&mut self, outcome: StateId) {
        let aid = self
            .current_action
            .take()
            .expect("update_state called before next_action");
        let action = self.mdp.action(aid);
        assert!(
            action.distr.contains(outcome),
            "state {} is not a successor of action {:?}",
            outcome,
            action.label
        );
        debug_assert!(self.energy >= action.cons, "selector bound was too low");
        self.energy -= action.cons;
        if self.mdp.is_reload(outcome) {
            self.energy = self.capacity;
        }
        self.state = outcome;
    }

    /// `update_state(outcome)` followed by `next_action()`.
    pub fn step(&mut self, outcome: StateId) -> Result<&'a ActionData, Error> {
        self.update_state(outcome);
        self.next_action()
    }

    /// Restart the play from a new configuration, keeping the
    /// selector.
    pub fn reset(&mut self, init_state: StateId, init_energy: Level) -> Result<(), Error> {
        if self.selector.rule(init_state).is_empty() {
            return Err(Error::NoStrategy(init_state));
        }
        self.state = init_state;
        self.energy = if self.mdp.is_reload(init_state) {
            self.capacity
        } else {
            init_energy
        };
        self.current_action = None;
        Ok(())
    }
}
