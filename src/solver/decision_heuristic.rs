//! VSIDS decision heuristic with phase saving and an adaptive random-phase
//! latch that engages when the search has been stalling.

use crate::formula::assignment::Assignment;
use crate::formula::{Lit, Var, VarHeap, VarMap};
use crate::util::Random;

pub struct DecisionHeuristicConfig {
    pub var_decay: f64,
    pub random_seed: f64,
    /// Configured non-zero random-phase probability; only applied once
    /// adaptivity latches it on, unless `adaptive_random_phase`
    /// is false, in which case it applies from the start.
    pub random_phase_prob: f64,
    pub adaptive_random_phase: bool,
    pub adaptive_threshold_conflicts: u64,
    pub adaptive_restart_ratio: f64,
}

impl Default for DecisionHeuristicConfig {
    fn default() -> Self {
        DecisionHeuristicConfig {
            var_decay: 0.95,
            random_seed: 91648253.0,
            random_phase_prob: 0.0,
            adaptive_random_phase: true,
            adaptive_threshold_conflicts: 1000,
            adaptive_restart_ratio: 0.2,
        }
    }
}

#[derive(Clone, Copy)]
struct VarLine {
    /// Saved phase from the last time this variable was unassigned
    ///. Initialized to `false`.
    polarity: bool,
}

pub struct DecisionHeuristic {
    config: DecisionHeuristicConfig,
    var_inc: f64,
    rand: Random,
    var: VarMap<VarLine>,
    activity: VarMap<f64>,
    queue: VarHeap,
    /// Latched once the adaptive restart-ratio condition fires
    ///; `false` forever if `adaptive_random_phase` is off.
    random_phase_latched: bool,
    pub rnd_decisions: u64,
}

impl DecisionHeuristic {
    pub fn new(config: DecisionHeuristicConfig) -> Self {
        let rand = Random::new(config.random_seed);
        DecisionHeuristic {
            config,
            var_inc: 1.0,
            rand,
            var: VarMap::new(),
            activity: VarMap::new(),
            queue: VarHeap::new(),
            random_phase_latched: false,
            rnd_decisions: 0,
        }
    }

    pub fn init_var(&mut self, v: Var) {
        self.activity.insert(&v, 0.0);
        self.var.insert(&v, VarLine { polarity: false });
        let act = &self.activity;
        self.queue.insert(v, |a, b| act[a] > act[b]);
    }

    /// Called with each literal popped off the trail by
    /// [`Assignment::backtrack_to`]: saves its phase and re-queues the
    /// variable for future decisions.
    pub fn cancel(&mut self, lit: Lit) {
        self.var[&lit.var()].polarity = lit.sign();
        let act = &self.activity;
        self.queue.insert(lit.var(), |a, b| act[a] > act[b]);
    }

    /// Bump `v`'s VSIDS activity by the current global increment, rescaling
    /// everything if it would overflow.
    pub fn bump_activity(&mut self, v: Var) {
        let new = self.activity[&v] + self.var_inc;
        if new > 1e100 {
            self.var_inc *= 1e-100;
            for (_, act) in self.activity.iter_mut() {
                *act *= 1e-100;
            }
            let rescaled = self.activity[&v] + self.var_inc;
            self.activity.insert(&v, rescaled);
        } else {
            self.activity.insert(&v, new);
        }

        let act = &self.activity;
        self.queue.update(&v, |a, b| act[a] > act[b]);
    }

    pub fn decay_activity(&mut self) {
        self.var_inc *= 1.0 / self.config.var_decay;
    }

    /// Called after a restart with the restart/conflict counters so far
    ///. Once latched,
    /// stays latched for the rest of the search.
    pub fn on_restart(&mut self, restarts: u64, conflicts: u64) {
        if self.random_phase_latched || !self.config.adaptive_random_phase {
            return;
        }
        if conflicts >= self.config.adaptive_threshold_conflicts
            && (restarts as f64) / (conflicts.max(1) as f64) > self.config.adaptive_restart_ratio
        {
            self.random_phase_latched = true;
        }
    }

    fn random_phase_prob(&self) -> f64 {
        if self.config.adaptive_random_phase {
            if self.random_phase_latched {
                if self.config.random_phase_prob > 0.0 {
                    self.config.random_phase_prob
                } else {
                    0.05
                }
            } else {
                0.0
            }
        } else {
            self.config.random_phase_prob
        }
    }

    fn pick_branch_var(&mut self, assigns: &Assignment) -> Option<Var> {
        loop {
            let act = &self.activity;
            let v = self.queue.pop(|a, b| act[a] > act[b])?;
            if assigns.is_undef(v) {
                return Some(v);
            }
            // Lazily drop already-assigned variables from the heap top
            //.
        }
    }

    /// `pick_branching_literal()` `None` means every
    /// variable is assigned.
    pub fn pick_branch_lit(&mut self, assigns: &Assignment) -> Option<Lit> {
        let v = self.pick_branch_var(assigns)?;
        let p_rand = self.random_phase_prob();
        let sign = if p_rand > 0.0 && self.rand.chance(p_rand) {
            self.rnd_decisions += 1;
            self.rand.chance(0.5)
        } else {
            self.var[&v].polarity
        };
        Some(v.lit(!sign))
    }

    /// `set_phase_hint(v, value)`: seed the saved phase for
    /// a variable before it is ever decided.
    pub fn set_phase_hint(&mut self, v: Var, value: bool) {
        self.var[&v].polarity = !value;
    }

    /// Rebuild the heap from the current assignment — used after
    /// preprocessing removes or fixes variables.
    pub fn rebuild_order_heap(&mut self, assigns: &Assignment) {
        let mut unassigned = Vec::with_capacity(self.queue.len());
        for i in 0..assigns.num_vars() {
            let v = Var::from_index(i);
            if assigns.is_undef(v) {
                unassigned.push(v);
            }
        }
        let act = &self.activity;
        self.queue.heapify_from(unassigned, |a, b| act[a] > act[b]);
    }
}
