//! Helpers shared by the integration tests: weighted simulation of a
//! counter strategy and adversarial search for exhaustion.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::Rng;

use consmdp::{ConsMdp, CounterSelector, CounterStrategy, Error, Level, StateId};

/// Sample a successor of `action` proportionally to its weights.
pub fn sample_succ(rng: &mut StdRng, mdp: &ConsMdp, aid: usize) -> StateId {
    let a = mdp.action(aid);
    let roll: f64 = rng.gen();
    let mut acc = 0.0;
    for (s, p) in a.distr.iter() {
        acc += p;
        if roll < acc {
            return s;
        }
    }
    *a.succs().last().unwrap()
}

/// Play `steps` steps from `(start, level)` with random outcomes.
/// Returns the error when the play aborts.
pub fn simulate(
    mdp: &ConsMdp,
    selector: &CounterSelector,
    cap: Level,
    start: StateId,
    level: Level,
    steps: usize,
    rng: &mut StdRng,
) -> Result<(), Error> {
    let mut play = CounterStrategy::new(mdp, selector, cap, start, level)?;
    for _ in 0..steps {
        let (state, energy) = (play.current_state(), play.energy());
        play.next_action()?;
        let aid = selector.select_action(state, energy).unwrap();
        let outcome = sample_succ(rng, mdp, aid);
        play.update_state(outcome);
    }
    Ok(())
}

/// Search the support tree for a schedule of outcomes that drives the
/// selector into exhaustion from `(start, level)` before any state of
/// `targets` is visited. The configuration space is finite (levels
/// are bounded by the capacity), so the search is exhaustive.
pub fn exhaustion_before_target(
    mdp: &ConsMdp,
    selector: &CounterSelector,
    cap: Level,
    targets: &[StateId],
    start: StateId,
    level: Level,
) -> bool {
    let mut visited: HashSet<(StateId, Level)> = HashSet::new();
    let mut stack = vec![(start, level)];
    while let Some((s, e)) = stack.pop() {
        if targets.contains(&s) || !visited.insert((s, e)) {
            continue;
        }
        let aid = match selector.select_action(s, e) {
            None => return true,
            Some(aid) => aid,
        };
        let a = mdp.action(aid);
        if e < a.cons {
            return true;
        }
        for &succ in a.succs() {
            let next = if mdp.is_reload(succ) { cap } else { e - a.cons };
            stack.push((succ, next));
        }
    }
    false
}

/// Search the support tree for a schedule of outcomes that reaches
/// `targets` from `(start, level)` without exhausting.
pub fn target_reachable(
    mdp: &ConsMdp,
    selector: &CounterSelector,
    cap: Level,
    targets: &[StateId],
    start: StateId,
    level: Level,
) -> bool {
    let mut visited: HashSet<(StateId, Level)> = HashSet::new();
    let mut stack = vec![(start, level)];
    while let Some((s, e)) = stack.pop() {
        if targets.contains(&s) {
            return true;
        }
        if !visited.insert((s, e)) {
            continue;
        }
        let Some(aid) = selector.select_action(s, e) else {
            continue;
        };
        let a = mdp.action(aid);
        if e < a.cons {
            continue;
        }
        for &succ in a.succs() {
            let next = if mdp.is_reload(succ) { cap } else { e - a.cons };
            stack.push((succ, next));
        }
    }
    false
}

/// Search the support tree for a schedule of outcomes that drives the
/// selector into exhaustion from `(start, level)`. The configuration
/// space is finite (levels are bounded by the capacity), so the
/// search is exhaustive.
pub fn exhaustion_reachable(
    mdp: &ConsMdp,
    selector: &CounterSelector,
    cap: Level,
    start: StateId,
    level: Level,
) -> bool {
    let mut visited: HashSet<(StateId, Level)> = HashSet::new();
    let mut stack = vec![(start, level)];
    while let Some((s, e)) = stack.pop() {
        if !visited.insert((s, e)) {
            continue;
        }
        let aid = match selector.select_action(s, e) {
            None => return true,
            Some(aid) => aid,
        };
        let a = mdp.action(aid);
        if e < a.cons {
            // The rule promised more than the level affords; count it
            // as exhaustion for the adversary.
            return true;
        }
        for &succ in a.succs() {
            let next = if mdp.is_reload(succ) { cap } else { e - a.cons };
            stack.push((succ, next));
        }
    }
    false
}
