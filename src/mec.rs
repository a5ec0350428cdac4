//! Maximal end component decomposition.
//!
//! An end component is a sub-MDP in which a strategy can confine the
//! play forever: a set of states together with a set of actions whose
//! supports stay inside the set, such that every state of the set has
//! at least one such action and the induced graph is strongly
//! connected. The decomposition below returns all *maximal* end
//! components, ignoring consumption. The Büchi solver uses it to rule
//! out models where the target set cannot be visited infinitely often.

use std::collections::BTreeSet;

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::mdp::ConsMdp;
use crate::{ActionId, StateId};

/// One maximal end component: its states and the actions that keep
/// the play inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mec {
    pub states: BTreeSet<StateId>,
    pub actions: BTreeSet<ActionId>,
}

impl Mec {
    pub fn contains(&self, state: StateId) -> bool {
        self.states.contains(&state)
    }
}

/// Compute the maximal end components of `mdp`.
///
/// Iterative SCC shrinking: decompose the candidate sub-MDP into
/// strongly connected components, drop actions whose support escapes
/// their component and states left without actions, and repeat on
/// every component that shrank. Components that survive unchanged are
/// maximal end components. Output is sorted by smallest state id.
pub fn decompose(mdp: &ConsMdp) -> Vec<Mec> {
    let all_states: BTreeSet<StateId> = (0..mdp.num_states()).collect();
    let all_actions: BTreeSet<ActionId> = (0..mdp.num_actions()).collect();

    let mut mecs = Vec::new();
    let mut work = vec![(all_states, all_actions)];

    while let Some((states, actions)) = work.pop() {
        for comp in sub_sccs(mdp, &states, &actions) {
            // Keep only actions that stay inside the component.
            let mut kept = BTreeSet::new();
            let mut escaped = false;
            for &aid in &actions {
                let a = mdp.action(aid);
                if !comp.contains(&a.src) {
                    continue;
                }
                if a.succs().iter().all(|s| comp.contains(s)) {
                    kept.insert(aid);
                } else {
                    escaped = true;
                }
            }

            let dead: BTreeSet<StateId> = comp
                .iter()
                .copied()
                .filter(|&s| !kept.iter().any(|&aid| mdp.action(aid).src == s))
                .collect();

            let shrank = escaped || !dead.is_empty() || comp.len() < states.len();
            if shrank {
                let remaining: BTreeSet<StateId> =
                    comp.difference(&dead).copied().collect();
                let kept: BTreeSet<ActionId> = kept
                    .into_iter()
                    .filter(|&aid| remaining.contains(&mdp.action(aid).src))
                    .collect();
                if !remaining.is_empty() {
                    work.push((remaining, kept));
                }
            } else if !kept.is_empty() {
                mecs.push(Mec {
                    states: comp,
                    actions: kept,
                });
            }
        }
    }

    mecs.sort_by_key(|m| m.states.iter().next().copied());
    mecs
}

/// Strongly connected components of the sub-MDP induced by `states`
/// and `actions`, as sets of state ids.
fn sub_sccs(
    mdp: &ConsMdp,
    states: &BTreeSet<StateId>,
    actions: &BTreeSet<ActionId>,
) -> Vec<BTreeSet<StateId>> {
    let index: Vec<StateId> = states.iter().copied().collect();
    let mut g: DiGraph<(), ()> = DiGraph::new();
    for _ in 0..index.len() {
        g.add_node(());
    }
    let local = |s: StateId| index.binary_search(&s).expect("state in sub-MDP");

    for &aid in actions {
        let a = mdp.action(aid);
        if !states.contains(&a.src) {
            continue;
        }
        for &succ in a.succs() {
            if states.contains(&succ) {
                g.add_edge(
                    NodeIndex::new(local(a.src)),
                    NodeIndex::new(local(succ)),
                    (),
                );
            }
        }
    }

    kosaraju_scc(&g)
        .into_iter()
        .map(|comp| comp.into_iter().map(|n| index[n.index()]).collect())
        .collect()
}
