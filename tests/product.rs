//! Labeled ConsMDP and the product with a deterministic Büchi
//! automaton.

use std::collections::BTreeSet;

use consmdp::examples::product_example;
use consmdp::labeled::product_with_dba;
use consmdp::{solve, Dba, Error, Objective, INF};

fn ap(xs: &[u32]) -> BTreeSet<u32> {
    xs.iter().copied().collect()
}

/// Automaton for "infinitely often s1 and infinitely often s2":
/// state 0 waits for s1, state 1 waits for s2, state 2 is the
/// accepting hand-over back to state 0's duty.
fn gf_both() -> Dba {
    let mut d = Dba::new(3, 0, [2]);
    for q in [0, 2] {
        d.add_edge(q, ap(&[0]), 1).unwrap();
        d.add_edge(q, ap(&[1]), 0).unwrap();
        d.add_edge(q, ap(&[]), 0).unwrap();
    }
    d.add_edge(1, ap(&[1]), 2).unwrap();
    d.add_edge(1, ap(&[0]), 1).unwrap();
    d.add_edge(1, ap(&[]), 1).unwrap();
    d
}

#[test]
fn product_reaches_expected_states() {
    let l = product_example();
    let (product, targets) = product_with_dba(&l, &gf_both(), None).unwrap();
    assert_eq!(
        product.components(),
        &[(0, 0), (1, 1), (2, 0), (3, 0), (3, 1), (0, 1), (2, 2)]
    );
    assert_eq!(targets, vec![6]);
    // Reload status is inherited from the model component.
    assert!(product.mdp().is_reload(3));
    assert!(product.mdp().is_reload(4));
    assert!(!product.mdp().is_reload(6));
    assert_eq!(product.product_state(2, 2), Some(6));
    assert_eq!(product.product_state(1, 0), None);
}

#[test]
fn buchi_on_the_product() {
    let l = product_example();
    let (product, targets) = product_with_dba(&l, &gf_both(), None).unwrap();
    let (levels, _) = solve(product.mdp(), 9, &targets, Objective::Buchi).unwrap();
    assert_eq!(levels, [2, 3, 1, 5, 5, 2, 0]);

    // More capacity changes nothing here; the levels are driven by
    // the loop structure, not the cap.
    let (levels, _) = solve(product.mdp(), 20, &targets, Objective::Buchi).unwrap();
    assert_eq!(levels, [2, 3, 1, 5, 5, 2, 0]);

    let (safe, _) = solve(product.mdp(), 20, &targets, Objective::Safety).unwrap();
    assert_eq!(safe, [2, 3, 1, 0, 0, 2, 1]);
}

#[test]
fn product_selector_maps_back_to_original_actions() {
    let l = product_example();
    let (product, targets) = product_with_dba(&l, &gf_both(), None).unwrap();
    let (levels, selector) = solve(product.mdp(), 9, &targets, Objective::Buchi).unwrap();

    for (p, &(s, q)) in product.components().iter().enumerate() {
        if levels[p] == INF {
            continue;
        }
        let aid = product.select_action(&selector, s, q, 9).unwrap();
        assert!(
            l.mdp().action_ids(s).contains(&aid),
            "selected action {} does not belong to model state {}",
            aid,
            s
        );
    }

    // Unreached (state, automaton) pairs select nothing.
    assert_eq!(product.select_action(&selector, 1, 0, 9), None);
}

#[test]
fn product_from_selected_initial_states() {
    let l = product_example();
    let (product, _) = product_with_dba(&l, &gf_both(), Some(&[3])).unwrap();
    // Still the whole reachable part, but discovered from state 3.
    assert_eq!(product.components()[0], (3, 0));
    assert!(product.product_state(0, 0).is_some());
}

#[test]
fn incomplete_automaton_is_rejected() {
    let l = product_example();
    let mut d = Dba::new(2, 0, [1]);
    d.add_edge(0, ap(&[0]), 1).unwrap();
    d.add_edge(1, ap(&[0]), 1).unwrap();
    let err = product_with_dba(&l, &d, None);
    assert!(matches!(err, Err(Error::InvalidModel(_))));
}

#[test]
fn empty_initial_set_is_rejected() {
    let l = product_example();
    assert!(matches!(
        product_with_dba(&l, &gf_both(), Some(&[])),
        Err(Error::InvalidModel(_))
    ));
}
