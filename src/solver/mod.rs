//! Energy solvers for the qualitative objectives.
//!
//! [`EnergySolver`] owns every derived artifact (min-level vectors,
//! selectors, the MEC decomposition) for one model, capacity and
//! target set; [`solve`] is the one-shot convenience wrapper.

pub(crate) mod fixpoint;

mod energy;

pub use energy::EnergySolver;

use crate::mdp::ConsMdp;
use crate::strategy::CounterSelector;
use crate::{Error, Level, StateId};

/// The qualitative objectives, dispatched by tag.
///
/// `MinInitCons` is the minimal energy that guarantees reaching some
/// reload state; it is the building block of the survival fixpoints
/// and useful on its own. The remaining four are the synthesis
/// objectives proper. Targets are supplied to the solver, not the
/// tag; `Safety` and `MinInitCons` ignore them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Objective {
    MinInitCons,
    Safety,
    PosReach,
    AsReach,
    Buchi,
}

impl Objective {
    pub(crate) const COUNT: usize = 5;

    pub(crate) fn index(self) -> usize {
        match self {
            Objective::MinInitCons => 0,
            Objective::Safety => 1,
            Objective::PosReach => 2,
            Objective::AsReach => 3,
            Objective::Buchi => 4,
        }
    }
}

/// Which fixpoint computes the survival levels.
///
/// Both produce the same vector. The largest fixpoint needs at most
/// `|S|²` rounds; the least fixpoint needs up to `c_max · |S|` and
/// wins when consumptions are small compared to the state count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SafetyVariant {
    #[default]
    LargestFixpoint,
    LeastFixpoint,
}

/// Compute the min-level vector and selector for one objective.
///
/// `targets` is ignored for `Safety` and `MinInitCons`. See
/// [`EnergySolver`] for computing several objectives over one model
/// without repeating shared work.
pub fn solve(
    mdp: &ConsMdp,
    capacity: Level,
    targets: &[StateId],
    objective: Objective,
) -> Result<(Vec<Level>, CounterSelector), Error> {
    let mut solver = EnergySolver::new(mdp, capacity, targets.iter().copied())?;
    let levels = solver.min_levels(objective)?.to_vec();
    let selector = solver.selector(objective)?.clone();
    Ok((levels, selector))
}
