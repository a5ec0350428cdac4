//! The ConsMDP data model: states, consuming actions, reload states.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::distribution::Distribution;
use crate::{ActionId, Error, Level, StateId};

/// One action of a ConsMDP. Immutable once added to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionData {
    pub src: StateId,
    pub cons: Level,
    pub distr: Distribution,
    pub label: String,
}

impl ActionData {
    /// Successors of the action, sorted by id.
    pub fn succs(&self) -> &[StateId] {
        self.distr.support()
    }
}

/// A consumption Markov decision process under construction.
///
/// States are appended with [`new_state`](ConsMdp::new_state) and
/// actions with [`add_action`](ConsMdp::add_action); actions are
/// enumerated per state in insertion order, which the solvers rely on
/// for reproducible tie-breaking. Attaching a solver borrows the
/// model immutably for the whole solver lifetime, so a model cannot
/// change under a solver's feet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsMdp {
    names: Vec<Option<String>>,
    reloads: Vec<bool>,
    actions: Vec<ActionData>,
    outgoing: Vec<Vec<ActionId>>,
    #[serde(skip)]
    incoming: OnceLock<Vec<Vec<ActionId>>>,
}

impl ConsMdp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_states(&self) -> usize {
        self.reloads.len()
    }

    pub fn num_actions(&self) -> usize {
        self.actions.len()
    }

    /// Append a new state and return its id.
    pub fn new_state(&mut self, reload: bool) -> StateId {
        self.structure_change();
        let sid = self.num_states();
        self.names.push(None);
        self.reloads.push(reload);
        self.outgoing.push(Vec::new());
        sid
    }

    /// Append a named state. Fails when the name is already taken.
    pub fn new_state_named(&mut self, reload: bool, name: &str) -> Result<StateId, Error> {
        if let Some(existing) = self.state_with_name(name) {
            return Err(Error::InvalidModel(format!(
                "state named {:?} already exists (id {})",
                name, existing
            )));
        }
        let sid = self.new_state(reload);
        self.names[sid] = Some(name.to_string());
        Ok(sid)
    }

    /// Append `count` anonymous non-reload states.
    pub fn new_states(&mut self, count: usize) -> std::ops::Range<StateId> {
        let start = self.num_states();
        for _ in 0..count {
            self.new_state(false);
        }
        start..self.num_states()
    }

    pub fn set_reload(&mut self, state: StateId, reload: bool) {
        self.reloads[state] = reload;
    }

    pub fn is_reload(&self, state: StateId) -> bool {
        self.reloads[state]
    }

    /// All reload states, ascending.
    pub fn reload_states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.reloads
            .iter()
            .enumerate()
            .filter(|(_, &r)| r)
            .map(|(s, _)| s)
    }

    pub fn state_name(&self, state: StateId) -> Option<&str> {
        self.names[state].as_deref()
    }

    pub fn state_with_name(&self, name: &str) -> Option<StateId> {
        self.names
            .iter()
            .position(|n| n.as_deref() == Some(name))
    }

    /// Add an action from `src` with the given successor distribution,
    /// display label and consumption.
    ///
    /// Fails when `src` or a successor does not exist, or when `src`
    /// already has an action with the same label (labels double as
    /// action names in selectors, so they must be unique per state).
    pub fn add_action(
        &mut self,
        src: StateId,
        distr: Distribution,
        label: impl Into<String>,
        cons: Level,
    ) -> Result<ActionId, Error> {
        let label = label.into();
        if src >= self.num_states() {
            return Err(Error::InvalidModel(format!(
                "source state {} does not exist",
                src
            )));
        }
        for &succ in distr.support() {
            if succ >= self.num_states() {
                return Err(Error::InvalidModel(format!(
                    "successor state {} does not exist",
                    succ
                )));
            }
        }
        if self
            .actions_for_state(src)
            .any(|a| a.label == label)
        {
            return Err(Error::InvalidModel(format!(
                "state {} already has an action labelled {:?}",
                src, label
            )));
        }

        self.structure_change();
        let aid = self.actions.len();
        self.actions.push(ActionData {
            src,
            cons,
            distr,
            label,
        });
        self.outgoing[src].push(aid);
        Ok(aid)
    }

    /// The action with the given id. Panics on an unknown id.
    pub fn action(&self, aid: ActionId) -> &ActionData {
        &self.actions[aid]
    }

    pub fn actions(&self) -> &[ActionData] {
        &self.actions
    }

    /// Ids of the actions of `state`, in insertion order.
    pub fn action_ids(&self, state: StateId) -> &[ActionId] {
        &self.outgoing[state]
    }

    /// Actions of `state` in stable insertion order.
    pub fn actions_for_state(&self, state: StateId) -> impl Iterator<Item = &ActionData> + '_ {
        self.outgoing[state].iter().map(|&aid| &self.actions[aid])
    }

    /// Successors of `state` over all of its actions.
    pub fn state_succs(&self, state: StateId) -> BTreeSet<StateId> {
        let mut succs = BTreeSet::new();
        for a in self.actions_for_state(state) {
            succs.extend(a.succs().iter().copied());
        }
        succs
    }

    /// Ids of actions that have `state` in their support. The reverse
    /// index is built on first use and shared between readers.
    pub fn incoming_actions(&self, state: StateId) -> &[ActionId] {
        let index = self.incoming.get_or_init(|| {
            let mut rev = vec![Vec::new(); self.num_states()];
            for (aid, a) in self.actions.iter().enumerate() {
                for &succ in a.succs() {
                    rev[succ].push(aid);
                }
            }
            rev
        });
        &index[state]
    }

    /// Check the solve-time invariants: every state has at least one
    /// action, and the zero-consumption transitions are acyclic.
    pub fn validate(&self) -> Result<(), Error> {
        for s in 0..self.num_states() {
            if self.outgoing[s].is_empty() {
                return Err(Error::InvalidModel(format!(
                    "state {} has no outgoing action",
                    s
                )));
            }
        }
        if self.has_zero_consumption_cycle() {
            return Err(Error::NonTerminating);
        }
        Ok(())
    }

    /// True when the digraph of zero-consumption transitions has a
    /// cycle. The energy fixpoints would loop forever on such models.
    pub fn has_zero_consumption_cycle(&self) -> bool {
        let mut g: DiGraph<(), ()> = DiGraph::new();
        for _ in 0..self.num_states() {
            g.add_node(());
        }
        for a in &self.actions {
            if a.cons == 0 {
                for &succ in a.succs() {
                    g.add_edge(NodeIndex::new(a.src), NodeIndex::new(succ), ());
                }
            }
        }
        is_cyclic_directed(&g)
    }

    fn structure_change(&mut self) {
        self.incoming = OnceLock::new();
    }
}
