//! Fixed-point drivers shared by all objectives.
//!
//! Every energy computation is, in the end, a per-state sweep that
//! replaces a state's value by the minimum over its action values,
//! repeated until nothing changes. The two drivers differ only in the
//! direction from which the fixpoint is approached: `largest_fixpoint`
//! starts from ∞ and only ever decreases values, `least_fixpoint`
//! starts from a known lower bound and only ever increases them.

use crate::mdp::{ActionData, ConsMdp};
use crate::{ActionId, CancelToken, Error, Level, StateId, INF};

/// Knobs for one fixpoint run. The action value reads the current
/// vector; the adjustment maps a candidate value per state (capacity
/// overflow, reload clipping); the witness hook is invoked whenever a
/// state's value improves, with the action that realised the minimum.
pub(crate) struct FixpointParams<'c, AV, ADJ, SKIP, WIT>
where
    AV: FnMut(&ActionData, &[Level]) -> Level,
    ADJ: FnMut(StateId, Level) -> Level,
    SKIP: FnMut(StateId) -> bool,
    WIT: FnMut(StateId, Level, ActionId),
{
    pub action_value: AV,
    pub value_adj: ADJ,
    pub skip_state: SKIP,
    pub on_update: WIT,
    pub cancel: Option<&'c CancelToken>,
    pub debug: bool,
}

/// Minimum action value of `state` under `action_value`, together
/// with the first action realising it (insertion order breaks ties,
/// which keeps selectors deterministic).
pub(crate) fn argmin<AV>(
    mdp: &ConsMdp,
    state: StateId,
    values: &[Level],
    action_value: &mut AV,
) -> (ActionId, Level)
where
    AV: FnMut(&ActionData, &[Level]) -> Level,
{
    let mut best: Option<(ActionId, Level)> = None;
    for &aid in mdp.action_ids(state) {
        let v = action_value(mdp.action(aid), values);
        match best {
            Some((_, b)) if v >= b => {}
            _ => best = Some((aid, v)),
        }
    }
    best.expect("state with no actions survived validation")
}

/// Iterate `values` downwards until a fixpoint is reached.
///
/// Values must be initialised before the call (typically to ∞, with
/// exceptions seeded by the objective). Converges because values only
/// decrease and live in a finite domain.
pub(crate) fn largest_fixpoint<AV, ADJ, SKIP, WIT>(
    mdp: &ConsMdp,
    values: &mut [Level],
    mut p: FixpointParams<'_, AV, ADJ, SKIP, WIT>,
) -> Result<(), Error>
where
    AV: FnMut(&ActionData, &[Level]) -> Level,
    ADJ: FnMut(StateId, Level) -> Level,
    SKIP: FnMut(StateId) -> bool,
    WIT: FnMut(StateId, Level, ActionId),
{
    let mut iterate = true;
    let mut round = 0usize;
    while iterate {
        check_cancel(p.cancel)?;
        if p.debug {
            eprintln!("it {}\t{:?}", round, values);
        }
        round += 1;
        iterate = false;

        for s in 0..mdp.num_states() {
            if (p.skip_state)(s) {
                continue;
            }
            let (aid, candidate) = argmin(mdp, s, values, &mut p.action_value);
            let candidate = (p.value_adj)(s, candidate);
            if candidate < values[s] {
                values[s] = candidate;
                (p.on_update)(s, candidate, aid);
                iterate = true;
            }
        }
    }
    Ok(())
}

/// Iterate `values` upwards until a fixpoint is reached.
///
/// Used by the least-fixpoint safety variant, which starts from the
/// minimal-initial-consumption vector. States already at ∞ are
/// skipped; they can never recover.
pub(crate) fn least_fixpoint<AV, ADJ>(
    mdp: &ConsMdp,
    values: &mut [Level],
    mut action_value: AV,
    mut value_adj: ADJ,
    cancel: Option<&CancelToken>,
    debug: bool,
) -> Result<(), Error>
where
    AV: FnMut(&ActionData, &[Level]) -> Level,
    ADJ: FnMut(StateId, Level) -> Level,
{
    let mut iterate = true;
    let mut round = 0usize;
    while iterate {
        check_cancel(cancel)?;
        if debug {
            eprintln!("it {}\t{:?}", round, values);
        }
        round += 1;
        iterate = false;

        for s in 0..mdp.num_states() {
            if values[s] == INF {
                continue;
            }
            let (_, candidate) = argmin(mdp, s, values, &mut action_value);
            let candidate = value_adj(s, candidate);
            if candidate > values[s] {
                values[s] = candidate;
                iterate = true;
            }
        }
    }
    Ok(())
}

fn check_cancel(cancel: Option<&CancelToken>) -> Result<(), Error> {
    match cancel {
        Some(token) if token.is_cancelled() => Err(Error::Cancelled),
        _ => Ok(()),
    }
}
