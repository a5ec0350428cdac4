//! Canned ConsMDPs shared by tests and benchmarks.
//!
//! Most of these are small models with well-understood level vectors;
//! `double_flower` is the parametric family on which positive
//! reachability needs a quadratic number of fixpoint rounds.

use crate::distribution::Distribution;
use crate::labeled::LabeledConsMdp;
use crate::mdp::ConsMdp;
use crate::StateId;

fn dirac(s: StateId) -> Distribution {
    Distribution::dirac(s)
}

fn half(a: StateId, b: StateId) -> Distribution {
    Distribution::uniform(&[a, b]).unwrap()
}

/// Two states, one reload, both actions cost 1. With capacity 2 the
/// survival levels are `[0, 1]` and all reachability objectives of
/// `{1}` need `[2, 0]`.
pub fn two_state() -> (ConsMdp, Vec<StateId>) {
    let mut m = ConsMdp::new();
    m.new_state(true);
    m.new_state(false);
    m.add_action(0, dirac(1), "a", 1).unwrap();
    m.add_action(1, dirac(0), "b", 1).unwrap();
    (m, vec![1])
}

/// A line of `len + 1` states walking towards the single reload at
/// state 0; every edge costs 1. The survival level of state `i` is
/// its distance `i` from the reload, a witness that bounding the
/// iteration count by the number of states is wrong: the values keep
/// growing for `len` rounds.
pub fn line(len: usize) -> ConsMdp {
    let mut m = ConsMdp::new();
    m.new_state(true);
    m.new_states(len);
    m.add_action(0, dirac(0), "r", 1).unwrap();
    for i in 1..=len {
        m.add_action(i, dirac(i - 1), "w", 1).unwrap();
    }
    m
}

/// Four states in a directed cycle with one reload; every edge costs
/// 1. Survivable from capacity 4 on.
pub fn cycle() -> ConsMdp {
    let mut m = ConsMdp::new();
    m.new_state(true);
    m.new_states(3);
    for i in 0..4 {
        m.add_action(i, dirac((i + 1) % 4), "c", 1).unwrap();
    }
    m
}

/// The 13-state model with five reloads used throughout the safety
/// tests. The original version closes states 0 and 9 with
/// zero-consumption self-loops; those are zero-consumption cycles,
/// which this crate rejects, so both loops cost 1 here and the
/// expected vectors account for it.
pub fn kucera() -> ConsMdp {
    let mut m = ConsMdp::new();
    m.new_states(13);
    for s in [0, 3, 4, 9, 11] {
        m.set_reload(s, true);
    }
    m.add_action(1, Distribution::from_pairs([(0, 0.5), (2, 0.25), (12, 0.25)]).unwrap(), "a", 1)
        .unwrap();
    m.add_action(2, dirac(4), "a", 2).unwrap();
    m.add_action(12, dirac(3), "a", 1).unwrap();
    m.add_action(3, half(3, 4), "a", 1).unwrap();
    m.add_action(4, dirac(1), "a", 0).unwrap();
    m.add_action(7, dirac(3), "a", 1).unwrap();
    m.add_action(7, dirac(6), "b", 1).unwrap();
    m.add_action(6, half(4, 5), "a", 5).unwrap();
    m.add_action(5, dirac(1), "a", 6).unwrap();
    m.add_action(8, dirac(9), "a", 1).unwrap();
    m.add_action(8, dirac(1), "b", 3).unwrap();
    m.add_action(10, half(1, 11), "a", 2).unwrap();
    m.add_action(0, dirac(0), "r", 1).unwrap();
    m.add_action(9, dirac(9), "r", 1).unwrap();
    m.add_action(11, dirac(11), "a", 1).unwrap();
    m
}

/// [`kucera`] extended by the probabilistic action into the target 9;
/// the reachability and Büchi tests run on this one.
pub fn kucera_reach() -> (ConsMdp, Vec<StateId>) {
    let mut m = kucera();
    m.add_action(4, half(9, 5), "t", 7).unwrap();
    (m, vec![9])
}

/// Two flowers: hubs 0 and 1 alternate petals (reload states) of
/// increasing return cost, plus two zero-consumption paths of length
/// `path` closing the cycle between the hubs. Positive reachability
/// of petal 2 drives the fixpoint through a quadratic number of
/// rounds.
pub fn double_flower(cap: u32, path: usize) -> ConsMdp {
    let mut m = ConsMdp::new();
    m.new_states(2);
    let mut c = 2;
    while c < cap {
        let s = m.new_state(true);
        let h = ((c / 2) % 2) as usize;
        m.add_action(h, dirac(s), format!("{}", s), cap - c).unwrap();
        m.add_action(s, dirac(h), "a", c - 1).unwrap();
        c += 2;
    }
    let (mut prev_o, mut prev_e) = (1, 0);
    for _ in 0..path {
        let curr_o = m.new_state(false);
        let curr_e = m.new_state(false);
        m.add_action(prev_o, dirac(curr_o), "p", 0).unwrap();
        m.add_action(prev_e, dirac(curr_e), "p", 0).unwrap();
        prev_o = curr_o;
        prev_e = curr_e;
    }
    m.add_action(prev_o, dirac(0), "p", 1).unwrap();
    m.add_action(prev_e, dirac(1), "p", 1).unwrap();
    m
}

/// Nine states, reloads 0 and 7, targets 2 and 5. Distinguishes
/// positive from almost-sure reachability: the cheap action of 3 can
/// strand the play in the 0/1 cycle, reaching the targets surely
/// needs the expensive detour.
pub fn basic() -> (ConsMdp, Vec<StateId>) {
    let mut m = ConsMdp::new();
    m.new_states(9);
    for s in [0, 7] {
        m.set_reload(s, true);
    }
    m.add_action(0, dirac(1), "", 1).unwrap();
    m.add_action(1, dirac(0), "", 1).unwrap();
    m.add_action(2, dirac(1), "", 1).unwrap();
    m.add_action(3, half(2, 1), "", 1).unwrap();
    m.add_action(3, half(4, 6), "t", 10).unwrap();
    m.add_action(4, dirac(5), "t", 1).unwrap();
    m.add_action(5, dirac(6), "r", 1).unwrap();
    m.add_action(6, half(3, 7), "t", 6).unwrap();
    m.add_action(6, dirac(7), "r", 1).unwrap();
    m.add_action(7, dirac(3), "", 20).unwrap();
    m.add_action(7, dirac(6), "t", 3).unwrap();
    m.add_action(8, half(7, 2), "", 5).unwrap();
    (m, vec![2, 5])
}

/// Four states, one reload. Action "t" of state 0 reaches a target
/// only with probability one half, the cheaper "pos" action gives up
/// almost-sure reachability for a lower level.
pub fn little_alsure() -> (ConsMdp, Vec<StateId>) {
    let mut m = ConsMdp::new();
    m.new_states(4);
    m.set_reload(3, true);
    m.add_action(0, half(1, 2), "t", 2).unwrap();
    m.add_action(1, dirac(3), "r", 1).unwrap();
    m.add_action(2, dirac(3), "r", 2).unwrap();
    m.add_action(3, dirac(3), "r", 3).unwrap();
    m.add_action(0, half(1, 3), "pos", 1).unwrap();
    (m, vec![1, 2])
}

/// [`little_alsure`] with an extra entry state in front.
pub fn little_alsure2() -> (ConsMdp, Vec<StateId>) {
    let (mut m, t) = little_alsure();
    m.new_state(false);
    m.add_action(4, half(0, 2), "", 1).unwrap();
    (m, t)
}

/// Eleven states, reloads {2, 4, 9}, targets {7, 8, 10}; exercises
/// every objective and has a non-trivial MEC structure
/// (`{1,2}`, `{3,4,5,6,8}`, `{9}`).
pub fn ultimate() -> (ConsMdp, Vec<StateId>) {
    let mut m = ConsMdp::new();
    m.new_states(11);
    for r in [2, 4, 9] {
        m.set_reload(r, true);
    }
    m.add_action(0, half(1, 2), "a", 1).unwrap();
    m.add_action(0, half(3, 4), "t", 3).unwrap();
    m.add_action(1, dirac(2), "", 1).unwrap();
    m.add_action(2, dirac(1), "", 1).unwrap();
    m.add_action(3, half(2, 7), "p", 1).unwrap();
    m.add_action(3, dirac(5), "r", 2).unwrap();
    m.add_action(3, dirac(6), "a", 3).unwrap();
    m.add_action(4, dirac(5), "", 1).unwrap();
    m.add_action(5, dirac(4), "r", 1).unwrap();
    m.add_action(5, dirac(3), "t", 1).unwrap();
    m.add_action(6, half(7, 10), "a", 3).unwrap();
    m.add_action(6, half(3, 8), "B", 6).unwrap();
    m.add_action(7, dirac(9), "", 1).unwrap();
    m.add_action(9, dirac(9), "", 1).unwrap();
    m.add_action(10, dirac(9), "", 1).unwrap();
    m.add_action(8, dirac(5), "r", 3).unwrap();
    (m, vec![7, 8, 10])
}

/// Four labeled states over the propositions `s1` and `s2`, with the
/// reload at state 3; the playground for the DBA product.
pub fn product_example() -> LabeledConsMdp {
    let ap = |xs: &[u32]| xs.iter().copied().collect();
    let mut l = LabeledConsMdp::new(vec!["s1".to_string(), "s2".to_string()]);
    l.new_state(false, ap(&[])).unwrap();
    l.new_state(false, ap(&[0])).unwrap();
    l.new_state(false, ap(&[1])).unwrap();
    l.new_state(true, ap(&[])).unwrap();
    l.add_action(0, half(1, 2), "alpha", 3).unwrap();
    l.add_action(0, half(2, 3), "beta", 1).unwrap();
    l.add_action(1, dirac(3), "r", 3).unwrap();
    l.add_action(2, dirac(3), "r", 1).unwrap();
    l.add_action(3, dirac(0), "s", 3).unwrap();
    l
}

/// A target that can be reached almost surely but never revisited:
/// almost-sure reachability is finite, the Büchi objective is not.
pub fn buchi_gap() -> (ConsMdp, Vec<StateId>) {
    let mut m = ConsMdp::new();
    m.new_state(true);
    m.new_state(false);
    m.new_state(false);
    m.new_state(true);
    m.add_action(0, dirac(1), "go", 1).unwrap();
    m.add_action(1, dirac(0), "back", 1).unwrap();
    m.add_action(1, dirac(2), "hit", 1).unwrap();
    m.add_action(2, dirac(3), "fall", 1).unwrap();
    m.add_action(3, dirac(3), "stay", 1).unwrap();
    (m, vec![2])
}
