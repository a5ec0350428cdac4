//! Cross-objective invariants that must hold on every model.

use consmdp::{examples, solve, ConsMdp, Level, Objective, StateId, INF};

fn models() -> Vec<(ConsMdp, Vec<StateId>, Level)> {
    vec![
        {
            let (m, t) = examples::two_state();
            (m, t, 2)
        },
        {
            let (m, t) = examples::basic();
            (m, t, 22)
        },
        {
            let (m, t) = examples::little_alsure();
            (m, t, 10)
        },
        {
            let (m, t) = examples::ultimate();
            (m, t, 15)
        },
        {
            let (m, t) = examples::kucera_reach();
            (m, t, 16)
        },
        {
            let (m, t) = examples::buchi_gap();
            (m, t, 5)
        },
    ]
}

/// Safety <= PosReach <= AsReach <= Buchi pointwise outside the
/// target set (targets publish 0 by the grounding convention).
#[test]
fn dominance_order_outside_targets() {
    for (i, (m, t, cap)) in models().into_iter().enumerate() {
        let (safe, _) = solve(&m, cap, &t, Objective::Safety).unwrap();
        let (pos, _) = solve(&m, cap, &t, Objective::PosReach).unwrap();
        let (alsure, _) = solve(&m, cap, &t, Objective::AsReach).unwrap();
        let (buchi, _) = solve(&m, cap, &t, Objective::Buchi).unwrap();
        for s in 0..m.num_states() {
            if t.contains(&s) {
                continue;
            }
            assert!(safe[s] <= pos[s], "model {} state {}: safe > pos", i, s);
            assert!(pos[s] <= alsure[s], "model {} state {}: pos > as", i, s);
            assert!(alsure[s] <= buchi[s], "model {} state {}: as > buchi", i, s);
        }
    }
}

/// Raising the capacity can only lower the levels.
#[test]
fn monotonicity_in_capacity() {
    let caps = [3, 4, 5, 10];
    let objectives = [
        Objective::Safety,
        Objective::PosReach,
        Objective::AsReach,
        Objective::Buchi,
    ];
    let m = examples::cycle();
    for objective in objectives {
        let mut prev: Option<Vec<Level>> = None;
        for cap in caps {
            let (levels, _) = solve(&m, cap, &[2], objective).unwrap();
            if let Some(prev) = &prev {
                for s in 0..m.num_states() {
                    assert!(
                        levels[s] <= prev[s],
                        "{:?} at state {} grew from cap {} to a larger cap",
                        objective,
                        s,
                        cap
                    );
                }
            }
            prev = Some(levels);
        }
    }
}

#[test]
fn monotonicity_in_capacity_on_kucera() {
    let (m, t) = examples::kucera_reach();
    let mut prev: Option<Vec<Level>> = None;
    for cap in [14, 15, 16, 20, 40] {
        let (levels, _) = solve(&m, cap, &t, Objective::PosReach).unwrap();
        if let Some(prev) = &prev {
            for s in 0..m.num_states() {
                assert!(levels[s] <= prev[s]);
            }
        }
        prev = Some(levels);
    }
}

/// The cycle survives from capacity 4 on and the levels freeze; with
/// capacity 3 everything is lost.
#[test]
fn cycle_capacity_sweep_values() {
    let m = examples::cycle();
    let (levels, _) = solve(&m, 3, &[2], Objective::Buchi).unwrap();
    assert_eq!(levels, vec![INF; 4]);
    for cap in [4, 5, 10] {
        let (levels, _) = solve(&m, cap, &[2], Objective::Buchi).unwrap();
        assert_eq!(levels, [4, 3, 0, 1]);
    }
}

/// Two builds of the same model produce identical vectors and
/// identical selectors.
#[test]
fn solving_is_deterministic() {
    let objectives = [
        Objective::MinInitCons,
        Objective::Safety,
        Objective::PosReach,
        Objective::AsReach,
        Objective::Buchi,
    ];
    for objective in objectives {
        let (m1, t1) = examples::ultimate();
        let (m2, t2) = examples::ultimate();
        let (l1, s1) = solve(&m1, 15, &t1, objective).unwrap();
        let (l2, s2) = solve(&m2, 15, &t2, objective).unwrap();
        assert_eq!(l1, l2);
        assert_eq!(s1, s2, "{:?} selectors differ", objective);
    }
}

/// Targets publish 0 exactly when they admit a surviving action.
#[test]
fn target_grounding() {
    for (i, (m, t, cap)) in models().into_iter().enumerate() {
        let (safe, _) = solve(&m, cap, &t, Objective::Safety).unwrap();
        for objective in [Objective::PosReach, Objective::AsReach] {
            let (levels, _) = solve(&m, cap, &t, objective).unwrap();
            for &target in &t {
                if safe[target] == INF {
                    assert_eq!(levels[target], INF, "model {} target {}", i, target);
                } else {
                    assert_eq!(levels[target], 0, "model {} target {}", i, target);
                }
            }
        }
    }
}

/// Serialise, parse back, solve both: identical results.
#[test]
fn round_trip_through_json() {
    let (m, t) = examples::ultimate();
    let json = serde_json::to_string(&m).unwrap();
    let parsed: ConsMdp = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.num_states(), m.num_states());

    for objective in [Objective::Safety, Objective::PosReach, Objective::Buchi] {
        let (l1, s1) = solve(&m, 15, &t, objective).unwrap();
        let (l2, s2) = solve(&parsed, 15, &t, objective).unwrap();
        assert_eq!(l1, l2);
        assert_eq!(s1, s2);
    }

    let (_, selector) = solve(&m, 15, &t, Objective::Buchi).unwrap();
    let json = serde_json::to_string(&selector).unwrap();
    let parsed: consmdp::CounterSelector = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, selector);
}

/// Independent solvers over one frozen model need no locks; derived
/// state is per-solver.
#[test]
fn parallel_solvers_share_a_model() {
    let (m, t) = examples::ultimate();
    let (buchi, alsure) = std::thread::scope(|scope| {
        let h1 = scope.spawn(|| solve(&m, 15, &t, Objective::Buchi).unwrap().0);
        let h2 = scope.spawn(|| solve(&m, 15, &t, Objective::AsReach).unwrap().0);
        (h1.join().unwrap(), h2.join().unwrap())
    });
    assert_eq!(buchi, [6, INF, INF, 3, 2, 1, 10, INF, 0, INF, INF]);
    assert_eq!(alsure, [6, INF, INF, 3, 2, 1, 4, 0, 0, INF, 0]);
}

/// Solving twice through one solver returns the cached vector
/// unchanged: the fixpoint is stable.
#[test]
fn repeated_queries_are_stable() {
    let (m, t) = examples::basic();
    let mut solver = consmdp::EnergySolver::new(&m, 22, t).unwrap();
    let first = solver.min_levels(Objective::AsReach).unwrap().to_vec();
    let second = solver.min_levels(Objective::AsReach).unwrap().to_vec();
    assert_eq!(first, second);

    let mut fresh = consmdp::EnergySolver::new(&m, 22, examples::basic().1).unwrap();
    assert_eq!(fresh.min_levels(Objective::AsReach).unwrap(), first);
}
