//! The fixpoint computations behind each objective.
//!
//! All five objectives reduce to sweeps of two action-value shapes
//! over a level vector:
//!
//! * the *survival* value `cons(a) + max` over non-reload successors
//!   (a usable reload acts as zero: entering it clips the level up to
//!   the capacity), and
//! * the *directed* value, which picks a preferred successor to make
//!   progress through and pays the survival level for every other
//!   successor the action may produce.
//!
//! Safety, almost-sure reachability and Büchi wrap their fixpoints in
//! a reload-elimination loop: reload states whose value comes out ∞
//! are unusable, removing them can invalidate further reloads, so the
//! fixpoint is repeated on the shrunken model until stable.

use std::collections::BTreeSet;

use crate::mdp::{ActionData, ConsMdp};
use crate::mec::{self, Mec};
use crate::solver::fixpoint::{argmin, largest_fixpoint, least_fixpoint, FixpointParams};
use crate::solver::{Objective, SafetyVariant};
use crate::strategy::CounterSelector;
use crate::{CancelToken, Error, Level, StateId, INF};

/// Largest capacity the level arithmetic supports.
pub const MAX_CAPACITY: Level = i32::MAX as Level;

/// Solver for the qualitative objectives of one ConsMDP.
///
/// Borrows the model immutably for its whole lifetime, which freezes
/// the model while any derived artifact is alive. Results are cached
/// per objective; `min_levels` and `selector` compute on first use.
///
/// Independent analyses can run in parallel by creating one solver
/// per thread over the same model; all mutable state is per-solver.
pub struct EnergySolver<'a> {
    mdp: &'a ConsMdp,
    cap: Level,
    targets: BTreeSet<StateId>,
    variant: SafetyVariant,
    cancel: Option<CancelToken>,
    /// Print the value vector after every fixpoint round to stderr.
    pub debug: bool,
    levels: [Option<Vec<Level>>; Objective::COUNT],
    selectors: [Option<CounterSelector>; Objective::COUNT],
    mecs: Option<Vec<Mec>>,
}

impl<'a> EnergySolver<'a> {
    /// Attach a solver to `mdp` with the given capacity and targets.
    ///
    /// Validates the model invariants: every state has an action, the
    /// zero-consumption transitions are acyclic, all targets exist,
    /// and the capacity fits the level arithmetic.
    pub fn new(
        mdp: &'a ConsMdp,
        capacity: Level,
        targets: impl IntoIterator<Item = StateId>,
    ) -> Result<Self, Error> {
        mdp.validate()?;
        if capacity > MAX_CAPACITY {
            return Err(Error::InvalidModel(format!(
                "capacity {} exceeds the supported maximum {}",
                capacity, MAX_CAPACITY
            )));
        }
        let targets: BTreeSet<StateId> = targets.into_iter().collect();
        if let Some(&t) = targets.iter().find(|&&t| t >= mdp.num_states()) {
            return Err(Error::InvalidModel(format!(
                "target state {} does not exist",
                t
            )));
        }
        Ok(EnergySolver {
            mdp,
            cap: capacity,
            targets,
            variant: SafetyVariant::default(),
            cancel: None,
            debug: false,
            levels: std::array::from_fn(|_| None),
            selectors: std::array::from_fn(|_| None),
            mecs: None,
        })
    }

    /// Select how the survival levels are computed.
    pub fn with_safety_variant(mut self, variant: SafetyVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Check `token` between fixpoint rounds and abort with
    /// [`Error::Cancelled`] once it fires.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn capacity(&self) -> Level {
        self.cap
    }

    pub fn targets(&self) -> &BTreeSet<StateId> {
        &self.targets
    }

    /// Minimal initial levels for `objective`, one entry per state,
    /// [`INF`] where no finite level suffices.
    pub fn min_levels(&mut self, objective: Objective) -> Result<&[Level], Error> {
        self.ensure(objective)?;
        Ok(self.levels[objective.index()].as_deref().unwrap())
    }

    /// The selector witnessing [`min_levels`](Self::min_levels).
    pub fn selector(&mut self, objective: Objective) -> Result<&CounterSelector, Error> {
        self.ensure(objective)?;
        Ok(self.selectors[objective.index()].as_ref().unwrap())
    }

    /// The maximal end components of the model, computed on first use.
    pub fn mecs(&mut self) -> &[Mec] {
        if self.mecs.is_none() {
            self.mecs = Some(mec::decompose(self.mdp));
        }
        self.mecs.as_deref().unwrap()
    }

    fn ensure(&mut self, objective: Objective) -> Result<(), Error> {
        if self.levels[objective.index()].is_some() {
            return Ok(());
        }
        match objective {
            Objective::MinInitCons => self.compute_min_init_cons(),
            Objective::Safety => self.compute_safe(),
            Objective::PosReach => {
                self.ensure(Objective::Safety)?;
                self.compute_pos_reach()
            }
            Objective::AsReach => {
                self.ensure(Objective::Safety)?;
                self.compute_as_reach()
            }
            Objective::Buchi => self.compute_buchi(),
        }
    }

    fn store(&mut self, objective: Objective, levels: Vec<Level>, selector: CounterSelector) {
        self.levels[objective.index()] = Some(levels);
        self.selectors[objective.index()] = Some(selector);
    }

    // ---- objective computations -----------------------------------

    fn compute_min_init_cons(&mut self) -> Result<(), Error> {
        let (mdp, cap) = (self.mdp, self.cap);
        let mut values = vec![INF; mdp.num_states()];
        let mut selector = CounterSelector::for_mdp(mdp);
        largest_fixpoint(
            mdp,
            &mut values,
            FixpointParams {
                action_value: |a: &ActionData, v: &[Level]| {
                    survival_value(a, v, |s| mdp.is_reload(s))
                },
                value_adj: |_, v| cap_adj(cap, v),
                skip_state: |_| false,
                on_update: |s, v, aid| selector.update(mdp, s, v, aid),
                cancel: self.cancel.as_ref(),
                debug: self.debug,
            },
        )?;
        self.store(Objective::MinInitCons, values, selector);
        Ok(())
    }

    fn compute_safe(&mut self) -> Result<(), Error> {
        match self.variant {
            SafetyVariant::LargestFixpoint => self.compute_safe_largest(),
            SafetyVariant::LeastFixpoint => self.compute_safe_least(),
        }
    }

    fn compute_safe_largest(&mut self) -> Result<(), Error> {
        let mdp = self.mdp;
        let mut values = vec![INF; mdp.num_states()];
        let mut selector = CounterSelector::for_mdp(mdp);
        let mut removed = BTreeSet::new();
        self.sufficient_levels(&mut values, &mut removed, |_| INF, Some(&mut selector))?;
        self.store(Objective::Safety, values, selector);
        Ok(())
    }

    /// Survival via the least fixpoint, starting from the
    /// minimal-initial-consumption vector and growing. A reload whose
    /// value outgrows the capacity stops counting as zero for its
    /// predecessors, so unusable reloads propagate without an
    /// explicit elimination loop.
    fn compute_safe_least(&mut self) -> Result<(), Error> {
        self.ensure(Objective::MinInitCons)?;
        let (mdp, cap) = (self.mdp, self.cap);
        let mut values = self.levels[Objective::MinInitCons.index()]
            .clone()
            .unwrap();

        let action_value = |a: &ActionData, v: &[Level]| {
            survival_value(a, v, |s| mdp.is_reload(s) && v[s] <= cap)
        };
        least_fixpoint(
            mdp,
            &mut values,
            action_value,
            |_, v| cap_adj(cap, v),
            self.cancel.as_ref(),
            self.debug,
        )?;

        let mut selector = CounterSelector::for_mdp(mdp);
        let mut av = action_value;
        for s in 0..mdp.num_states() {
            if values[s] != INF {
                let (aid, bound) = argmin(mdp, s, &values, &mut av);
                selector.update(mdp, s, bound, aid);
            }
        }
        for s in 0..mdp.num_states() {
            if mdp.is_reload(s) && values[s] <= cap {
                values[s] = 0;
            }
        }
        self.store(Objective::Safety, values, selector);
        Ok(())
    }

    fn compute_pos_reach(&mut self) -> Result<(), Error> {
        let (mdp, cap) = (self.mdp, self.cap);
        let targets = self.targets.clone();
        let safe = self.levels[Objective::Safety.index()].clone().unwrap();

        let mut values = vec![INF; mdp.num_states()];
        for &t in &targets {
            values[t] = safe[t];
        }
        let mut selector = CounterSelector::for_mdp(mdp);
        largest_fixpoint(
            mdp,
            &mut values,
            FixpointParams {
                action_value: |a: &ActionData, v: &[Level]| directed_value(a, v, |s| safe[s]),
                value_adj: |s, v| reload_capper(mdp, cap, s, v),
                skip_state: |s| targets.contains(&s),
                on_update: |s, v, aid| selector.update(mdp, s, v, aid),
                cancel: self.cancel.as_ref(),
                debug: self.debug,
            },
        )?;

        // In a target the play only has to survive; reuse the safety
        // rules there.
        let safety_selector = self.selectors[Objective::Safety.index()].as_ref().unwrap();
        selector.copy_rules_from(safety_selector, targets.iter().copied());

        let reported = self.report(&values, &mut selector, |s| safe[s]);
        self.store(Objective::PosReach, reported, selector);
        Ok(())
    }

    fn compute_as_reach(&mut self) -> Result<(), Error> {
        let (mdp, cap) = (self.mdp, self.cap);
        let targets = self.targets.clone();
        let safe = self.levels[Objective::Safety.index()].clone().unwrap();

        // Survival levels for the play after T was reached: targets
        // restart each round at their plain safety level, so reloads
        // that are useless before reaching T stay usable afterwards.
        let mut reach_safe = vec![INF; mdp.num_states()];
        let mut removed: BTreeSet<StateId> = BTreeSet::new();
        let mut values = vec![INF; mdp.num_states()];
        let mut selector = CounterSelector::for_mdp(mdp);

        loop {
            self.sufficient_levels(
                &mut reach_safe,
                &mut removed,
                |s| if targets.contains(&s) { safe[s] } else { INF },
                None,
            )?;

            values.iter_mut().for_each(|v| *v = INF);
            for &t in &targets {
                values[t] = safe[t];
            }
            selector.clear_all();
            largest_fixpoint(
                mdp,
                &mut values,
                FixpointParams {
                    action_value: |a: &ActionData, v: &[Level]| {
                        directed_value(a, v, |s| reach_safe[s])
                    },
                    value_adj: |s, v| reload_capper(mdp, cap, s, v),
                    skip_state: |s| removed.contains(&s) || targets.contains(&s),
                    on_update: |s, v, aid| selector.update(mdp, s, v, aid),
                    cancel: self.cancel.as_ref(),
                    debug: self.debug,
                },
            )?;

            if !remove_bad_reloads(mdp, &values, &mut removed) {
                break;
            }
        }

        let safety_selector = self.selectors[Objective::Safety.index()].as_ref().unwrap();
        selector.copy_rules_from(safety_selector, targets.iter().copied());

        let reported = self.report(&values, &mut selector, |s| reach_safe[s]);
        self.store(Objective::AsReach, reported, selector);
        Ok(())
    }

    fn compute_buchi(&mut self) -> Result<(), Error> {
        let (mdp, cap) = (self.mdp, self.cap);
        let targets = self.targets.clone();

        // A play that visits T infinitely often eventually stays in an
        // end component, so without a MEC intersecting T the objective
        // is unsatisfiable from every state and level.
        let has_target_mec = self
            .mecs()
            .iter()
            .any(|m| targets.iter().any(|&t| m.contains(t)));
        if !has_target_mec {
            let values = vec![INF; mdp.num_states()];
            let selector = CounterSelector::for_mdp(mdp);
            self.store(Objective::Buchi, values, selector);
            return Ok(());
        }

        // Unlike almost-sure reachability, the survival levels of
        // targets are not restarted: after visiting T the play must
        // reach T again, on the same shrunken model.
        let mut buchi_safe = vec![INF; mdp.num_states()];
        let mut removed: BTreeSet<StateId> = BTreeSet::new();
        let mut values = vec![INF; mdp.num_states()];
        let mut selector = CounterSelector::for_mdp(mdp);
        let mut helper_selector = CounterSelector::for_mdp(mdp);

        loop {
            self.sufficient_levels(
                &mut buchi_safe,
                &mut removed,
                |_| INF,
                Some(&mut helper_selector),
            )?;

            values.iter_mut().for_each(|v| *v = INF);
            for &t in &targets {
                values[t] = buchi_safe[t];
            }
            selector.clear_all();
            largest_fixpoint(
                mdp,
                &mut values,
                FixpointParams {
                    action_value: |a: &ActionData, v: &[Level]| {
                        directed_value(a, v, |s| buchi_safe[s])
                    },
                    value_adj: |s, v| reload_capper(mdp, cap, s, v),
                    skip_state: |s| removed.contains(&s) || targets.contains(&s),
                    on_update: |s, v, aid| selector.update(mdp, s, v, aid),
                    cancel: self.cancel.as_ref(),
                    debug: self.debug,
                },
            )?;

            if !remove_bad_reloads(mdp, &values, &mut removed) {
                break;
            }
        }

        selector.copy_rules_from(&helper_selector, targets.iter().copied());

        let reported = self.report(&values, &mut selector, |s| buchi_safe[s]);
        self.store(Objective::Buchi, reported, selector);
        Ok(())
    }

    // ---- shared machinery -----------------------------------------

    /// The survival fixpoint with reload elimination: reset the vector
    /// to `init_val`, iterate the survival values with removed reloads
    /// treated as ordinary states, then discard reloads whose value
    /// came out ∞ and repeat until no reload is discarded. Good
    /// reloads end at 0; selection rules keep their real bounds.
    fn sufficient_levels(
        &self,
        values: &mut [Level],
        removed: &mut BTreeSet<StateId>,
        init_val: impl Fn(StateId) -> Level,
        mut selector: Option<&mut CounterSelector>,
    ) -> Result<(), Error> {
        let (mdp, cap) = (self.mdp, self.cap);
        loop {
            if let Some(sel) = selector.as_deref_mut() {
                sel.clear_all();
            }
            for s in 0..mdp.num_states() {
                values[s] = init_val(s);
            }
            let rem: &BTreeSet<StateId> = removed;
            let mut sel = selector.as_deref_mut();
            largest_fixpoint(
                mdp,
                values,
                FixpointParams {
                    action_value: |a: &ActionData, v: &[Level]| {
                        survival_value(a, v, |s| mdp.is_reload(s) && !rem.contains(&s))
                    },
                    value_adj: |_, v| cap_adj(cap, v),
                    skip_state: |s| rem.contains(&s),
                    on_update: |s, v, aid| {
                        if let Some(sel) = sel.as_deref_mut() {
                            sel.update(mdp, s, v, aid);
                        }
                    },
                    cancel: self.cancel.as_ref(),
                    debug: self.debug,
                },
            )?;

            if !remove_bad_reloads(mdp, values, removed) {
                break;
            }
        }
        for s in 0..mdp.num_states() {
            if mdp.is_reload(s) && values[s] <= cap {
                values[s] = 0;
            }
        }
        Ok(())
    }

    /// Publish a reachability vector. Targets report 0 when their
    /// internal value is finite (being there settles the reachability
    /// part; the selector keeps the survival bound). A non-target
    /// reload reports the level needed when the play *starts* there,
    /// without the entry clip: the minimum directed action value at
    /// the converged vector. Its selection rule keeps two entries:
    /// the cheapest action at the published bound, and the recorded
    /// progress witness at its own bound. Mid-play arrivals enter
    /// with a clipped-to-capacity level and must keep making progress
    /// towards the target, which the cheapest action alone may not.
    fn report(
        &self,
        values: &[Level],
        selector: &mut CounterSelector,
        survival: impl Fn(StateId) -> Level,
    ) -> Vec<Level> {
        let (mdp, cap) = (self.mdp, self.cap);
        let mut out = values.to_vec();
        for s in 0..mdp.num_states() {
            if self.targets.contains(&s) {
                out[s] = if values[s] == INF { INF } else { 0 };
            } else if mdp.is_reload(s) && values[s] != INF {
                let mut av =
                    |a: &ActionData, v: &[Level]| directed_value(a, v, &survival);
                let witness = selector.rule(s).iter().last().map(|(_, aid)| aid);
                let (aid, need) = argmin(mdp, s, values, &mut av);
                let need = cap_adj(cap, need);
                out[s] = need;
                selector.clear_rule(s);
                if need != INF {
                    selector.update(mdp, s, need, aid);
                }
                if let Some(witness) = witness.filter(|&w| w != aid) {
                    let bound = cap_adj(cap, av(mdp.action(witness), values));
                    if bound != INF {
                        selector.update(mdp, s, bound, witness);
                    }
                }
            }
        }
        out
    }
}

/// `cons(a) + max` over successors, where states satisfying
/// `zero_cond` (usable reloads) count as zero.
fn survival_value(
    a: &ActionData,
    values: &[Level],
    zero_cond: impl Fn(StateId) -> bool,
) -> Level {
    let mut worst = 0;
    for &s in a.succs() {
        if !zero_cond(s) {
            worst = worst.max(values[s]);
        }
    }
    worst.saturating_add(a.cons)
}

/// Directed action value: pick the successor to make progress
/// through, pay the survival level for every other successor.
fn directed_value(
    a: &ActionData,
    values: &[Level],
    survival: impl Fn(StateId) -> Level,
) -> Level {
    let succs = a.succs();
    let mut best = INF;
    for &t in succs {
        let mut v = values[t];
        for &other in succs {
            if other != t {
                v = v.max(survival(other));
            }
        }
        best = best.min(v);
    }
    best.saturating_add(a.cons)
}

fn cap_adj(cap: Level, v: Level) -> Level {
    if v > cap {
        INF
    } else {
        v
    }
}

/// Over capacity is ∞, a usable reload is 0 (entering it clips the
/// level up to the capacity), anything else passes through.
fn reload_capper(mdp: &ConsMdp, cap: Level, s: StateId, v: Level) -> Level {
    if v > cap {
        INF
    } else if mdp.is_reload(s) {
        0
    } else {
        v
    }
}

/// Discard reloads whose value came out ∞. Returns whether anything
/// changed, in which case the caller's fixpoint must run again.
fn remove_bad_reloads(
    mdp: &ConsMdp,
    values: &[Level],
    removed: &mut BTreeSet<StateId>,
) -> bool {
    let mut changed = false;
    for s in 0..mdp.num_states() {
        if mdp.is_reload(s) && values[s] == INF && removed.insert(s) {
            changed = true;
        }
    }
    changed
}
