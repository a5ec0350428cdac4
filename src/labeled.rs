//! ConsMDPs with AP-labeled states and their product with a
//! deterministic Büchi automaton.
//!
//! The product turns an automaton objective over state labels into a
//! plain Büchi objective over product states `(s, q)`: consumption
//! and distributions come from the ConsMDP, the automaton component
//! is advanced by the label of the successor state, and the targets
//! are the product states with an accepting automaton component.

use std::collections::{HashMap, VecDeque};

use itertools::Itertools;

use crate::dba::{ApSet, Dba};
use crate::distribution::Distribution;
use crate::mdp::ConsMdp;
use crate::strategy::CounterSelector;
use crate::{ActionId, Error, Level, StateId};

/// A ConsMDP whose states carry sets of atomic propositions.
#[derive(Debug, Clone, Default)]
pub struct LabeledConsMdp {
    mdp: ConsMdp,
    ap: Vec<String>,
    labels: Vec<ApSet>,
}

impl LabeledConsMdp {
    /// A fresh labeled model over the given atomic propositions. The
    /// index of an AP in `ap` is how state labels refer to it.
    pub fn new(ap: Vec<String>) -> Self {
        LabeledConsMdp {
            mdp: ConsMdp::new(),
            ap,
            labels: Vec::new(),
        }
    }

    pub fn ap(&self) -> &[String] {
        &self.ap
    }

    pub fn mdp(&self) -> &ConsMdp {
        &self.mdp
    }

    pub fn num_states(&self) -> usize {
        self.mdp.num_states()
    }

    pub fn is_reload(&self, state: StateId) -> bool {
        self.mdp.is_reload(state)
    }

    /// Append a state carrying `label`. Fails when the label refers
    /// to an AP index outside the AP list.
    pub fn new_state(&mut self, reload: bool, label: ApSet) -> Result<StateId, Error> {
        for &p in &label {
            if p as usize >= self.ap.len() {
                return Err(Error::InvalidModel(format!(
                    "AP index {} is not in the AP list (0..{})",
                    p,
                    self.ap.len()
                )));
            }
        }
        let sid = self.mdp.new_state(reload);
        self.labels.push(label);
        Ok(sid)
    }

    pub fn label(&self, state: StateId) -> &ApSet {
        &self.labels[state]
    }

    /// States carrying exactly `label`, ascending.
    pub fn states_with_label(&self, label: &ApSet) -> Vec<StateId> {
        (0..self.num_states())
            .filter(|&s| &self.labels[s] == label)
            .collect()
    }

    pub fn add_action(
        &mut self,
        src: StateId,
        distr: Distribution,
        label: impl Into<String>,
        cons: Level,
    ) -> Result<ActionId, Error> {
        self.mdp.add_action(src, distr, label, cons)
    }
}

/// The product of a labeled ConsMDP with a DBA. `components[p]` is
/// the (model state, automaton state) pair behind product state `p`.
#[derive(Debug, Clone)]
pub struct ProductConsMdp {
    mdp: ConsMdp,
    components: Vec<(StateId, u32)>,
    orig_actions: Vec<ActionId>,
    lookup: HashMap<(StateId, u32), StateId>,
}

impl ProductConsMdp {
    pub fn mdp(&self) -> &ConsMdp {
        &self.mdp
    }

    pub fn components(&self) -> &[(StateId, u32)] {
        &self.components
    }

    /// The product state for `(s, q)`, if it is reachable.
    pub fn product_state(&self, s: StateId, q: u32) -> Option<StateId> {
        self.lookup.get(&(s, q)).copied()
    }

    /// The original-model action behind a product action.
    pub fn original_action(&self, product_action: ActionId) -> ActionId {
        self.orig_actions[product_action]
    }

    /// Query a selector computed on the product in terms of the
    /// original model: returns the original action to play in model
    /// state `s` with automaton memory `q` at `energy`.
    pub fn select_action(
        &self,
        selector: &CounterSelector,
        s: StateId,
        q: u32,
        energy: Level,
    ) -> Option<ActionId> {
        let p = self.product_state(s, q)?;
        selector
            .select_action(p, energy)
            .map(|aid| self.original_action(aid))
    }
}

/// Build the product of `lmdp` and `dba`, restricted to the part
/// reachable from `init_states` (all states when `None`). Returns
/// the product and its target states (accepting automaton
/// component).
///
/// The automaton component of an initial state `s` is
/// `δ(q₀, L(s))`; along an action, the component advances by the
/// label of the sampled successor. Fails when the automaton has no
/// transition for a label that occurs (the automaton must be
/// complete over the used labels), or when `init_states` is empty.
pub fn product_with_dba(
    lmdp: &LabeledConsMdp,
    dba: &Dba,
    init_states: Option<&[StateId]>,
) -> Result<(ProductConsMdp, Vec<StateId>), Error> {
    let all: Vec<StateId>;
    let inits: &[StateId] = match init_states {
        Some(states) => states,
        None => {
            all = (0..lmdp.num_states()).collect();
            &all
        }
    };
    if inits.is_empty() {
        return Err(Error::InvalidModel(
            "the set of initial states must not be empty".to_string(),
        ));
    }

    let mut product = ProductConsMdp {
        mdp: ConsMdp::new(),
        components: Vec::new(),
        orig_actions: Vec::new(),
        lookup: HashMap::new(),
    };
    let mut targets = Vec::new();
    let mut todo: VecDeque<StateId> = VecDeque::new();

    let step = |q: u32, s: StateId| -> Result<u32, Error> {
        dba.successor(q, lmdp.label(s)).ok_or_else(|| {
            Error::InvalidModel(format!(
                "automaton has no edge from {} for label {:?}",
                q,
                lmdp.label(s).iter().format(",")
            ))
        })
    };

    let get_or_create = |product: &mut ProductConsMdp,
                         targets: &mut Vec<StateId>,
                         todo: &mut VecDeque<StateId>,
                         s: StateId,
                         q: u32|
     -> StateId {
        if let Some(&p) = product.lookup.get(&(s, q)) {
            return p;
        }
        let p = product.mdp.new_state(lmdp.is_reload(s));
        product.components.push((s, q));
        product.lookup.insert((s, q), p);
        if dba.is_accepting(q) {
            targets.push(p);
        }
        todo.push_back(p);
        p
    };

    for &s in inits {
        let q = step(dba.initial, s)?;
        get_or_create(&mut product, &mut targets, &mut todo, s, q);
    }

    while let Some(p) = todo.pop_front() {
        let (s, q) = product.components[p];
        for &aid in lmdp.mdp().action_ids(s) {
            let a = lmdp.mdp().action(aid);
            let mut pairs = Vec::with_capacity(a.distr.len());
            for (succ, prob) in a.distr.iter() {
                let q_next = step(q, succ)?;
                let p_next =
                    get_or_create(&mut product, &mut targets, &mut todo, succ, q_next);
                pairs.push((p_next, prob));
            }
            let distr = merge_pairs(pairs)?;
            let p_aid = product.mdp.add_action(p, distr, a.label.clone(), a.cons)?;
            debug_assert_eq!(p_aid, product.orig_actions.len());
            product.orig_actions.push(aid);
        }
    }

    targets.sort_unstable();
    Ok((product, targets))
}

/// Two model successors can collapse onto one product state; their
/// probabilities add up.
fn merge_pairs(pairs: Vec<(StateId, f64)>) -> Result<Distribution, Error> {
    let mut merged: Vec<(StateId, f64)> = Vec::with_capacity(pairs.len());
    for (s, p) in pairs.into_iter().sorted_by_key(|(s, _)| *s) {
        match merged.last_mut() {
            Some((last, acc)) if *last == s => *acc += p,
            _ => merged.push((s, p)),
        }
    }
    Distribution::from_pairs(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ap(xs: &[u32]) -> ApSet {
        xs.iter().copied().collect()
    }

    #[test]
    fn labels_are_validated() {
        let mut l = LabeledConsMdp::new(vec!["a".to_string()]);
        assert!(l.new_state(false, ap(&[0])).is_ok());
        assert!(l.new_state(false, ap(&[1])).is_err());
    }

    #[test]
    fn states_with_label_filters() {
        let mut l = LabeledConsMdp::new(vec!["a".to_string(), "b".to_string()]);
        l.new_state(false, ap(&[0])).unwrap();
        l.new_state(false, ap(&[1])).unwrap();
        l.new_state(false, ap(&[0])).unwrap();
        assert_eq!(l.states_with_label(&ap(&[0])), vec![0, 2]);
        assert_eq!(l.states_with_label(&ap(&[])), Vec::<StateId>::new());
    }
}
