//! Top-level `Solver`: wires the clause database, watch lists, trail,
//! conflict analyzer, decision heuristic, restart controller, reduction
//! guard and inprocessor into the driver loop. `ReduceGuard` and
//! `InprocessGuard` schedule reduction and inprocessing passes with
//! exponential backoff, the same shape as a `LearningGuard`/`SimplifyGuard`
//! pair.

pub mod budget;
pub mod clause_db;
pub mod conflict;
pub mod decision_heuristic;
pub mod inprocess;
pub mod restart;
pub mod watches;

use crate::formula::assignment::{Assignment, DecisionLevel, GROUND_LEVEL};
use crate::formula::clause::ClauseAllocator;
use crate::formula::util::satisfied_with_assignment;
use crate::formula::{Lit, Var};

use self::budget::Budget;
use self::clause_db::{ClauseDb, ClauseDbConfig};
use self::conflict::{AnalyzeContext, CcMinMode, Conflict};
use self::decision_heuristic::{DecisionHeuristic, DecisionHeuristicConfig};
use self::inprocess::Inprocessor;
use self::restart::{RestartConfig, RestartController, RestartStrategy};
use self::watches::Watches;

/// Configuration recognized by the core. Every
/// field is optional in the sense that [`Default`] supplies the documented
/// default.
#[derive(Clone, Copy)]
pub struct Config {
    pub vsids_decay: f64,
    pub clause_decay: f64,
    pub restart_strategy: RestartStrategy,
    pub restart_base: u32,
    pub glucose_window: u32,
    /// External knob as specified: the restart condition is
    /// "fast average exceeds `K` · slow average" read as `fast/slow >
    /// 1/K`, so internally this is inverted to a >1 multiplier.
    pub glucose_k: f64,
    pub restart_postponing: bool,
    pub random_phase_prob: f64,
    pub adaptive_random_phase: bool,
    pub adaptive_threshold_conflicts: u64,
    pub adaptive_restart_ratio: f64,
    pub learned_clause_limit_base: u64,
    pub learned_clause_limit_growth: f64,
    /// `None` disables inprocessing entirely.
    pub inprocessing_interval: Option<u64>,
    pub random_seed: f64,
    pub ccmin_mode: CcMinMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            vsids_decay: 0.95,
            clause_decay: 0.999,
            restart_strategy: RestartStrategy::Glucose,
            restart_base: 100,
            glucose_window: 50,
            glucose_k: 0.8,
            restart_postponing: true,
            random_phase_prob: 0.0,
            adaptive_random_phase: true,
            adaptive_threshold_conflicts: 1000,
            adaptive_restart_ratio: 0.2,
            learned_clause_limit_base: 2000,
            learned_clause_limit_growth: 1.1,
            inprocessing_interval: Some(2000),
            random_seed: 0.0,
            ccmin_mode: CcMinMode::Deep,
        }
    }
}

/// Errors surfaced synchronously at the call site ("Invalid
/// input"). Search is never started once one of these has occurred.
#[derive(Debug)]
pub enum SolverError {
    /// A literal referenced a variable never registered with `new_var`.
    VarOutOfRange { var: Var, num_vars: usize },
    InvalidConfig(&'static str),
}

impl Config {
    fn validate(&self) -> Result<(), SolverError> {
        let in_unit = |x: f64| x > 0.0 && x <= 1.0;
        if !in_unit(self.vsids_decay) {
            return Err(SolverError::InvalidConfig("vsids_decay must be in (0, 1]"));
        }
        if !in_unit(self.clause_decay) {
            return Err(SolverError::InvalidConfig("clause_decay must be in (0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.random_phase_prob) {
            return Err(SolverError::InvalidConfig("random_phase_prob must be in [0, 1]"));
        }
        if self.restart_base == 0 {
            return Err(SolverError::InvalidConfig("restart_base must be positive"));
        }
        Ok(())
    }
}

/// Read-only statistics.
#[derive(Clone, Copy, Debug, Default)]
pub struct Stats {
    pub solves: u64,
    pub conflicts: u64,
    pub decisions: u64,
    pub rnd_decisions: u64,
    pub propagations: u64,
    pub restarts: u64,
    pub reductions: u64,
    pub inprocessings: u64,
    pub num_clauses: usize,
    pub num_learnts: usize,
    pub glue_clauses: usize,
    pub tot_literals: u64,
    pub del_literals: u64,
}

/// Grows the learned-clause count threshold geometrically after each
/// reduction pass, so reductions get rarer (and keep more clauses around)
/// as the search goes on, rather than firing at a fixed clause-count
/// interval.
struct ReduceGuard {
    base: f64,
    growth: f64,
    reductions_done: u32,
}

impl ReduceGuard {
    fn new(base: u64, growth: f64) -> Self {
        ReduceGuard { base: base as f64, growth, reductions_done: 0 }
    }

    fn limit(&self) -> u64 {
        (self.base * self.growth.powi(self.reductions_done as i32)) as u64
    }

    fn bump(&mut self) {
        self.reductions_done += 1;
    }
}

/// Tracks the conflict count of the next scheduled inprocessing pass, with
/// exponential backoff after a pass that subsumed/strengthened little.
struct InprocessGuard {
    interval: Option<u64>,
    next_at: u64,
}

impl InprocessGuard {
    fn new(interval: Option<u64>) -> Self {
        InprocessGuard { next_at: interval.unwrap_or(0), interval }
    }

    fn due(&self, conflicts: u64) -> bool {
        self.interval.is_some() && conflicts >= self.next_at
    }

    /// Called after a pass runs; `yielded` is the number of clauses
    /// subsumed or strengthened. A quiet pass doubles the wait; a
    /// productive one resets to the configured base interval.
    fn record_run(&mut self, conflicts: u64, yielded: u64) {
        let base = match self.interval {
            Some(i) => i,
            None => return,
        };
        let wait = if yielded == 0 { (base as f64 * 1.5) as u64 } else { base };
        self.next_at = conflicts + wait.max(1);
    }
}

/// The outcome of [`Solver::solve`].
pub enum SolveResult {
    /// A total assignment over every declared variable.
    Sat(Vec<bool>),
    Unsat,
    /// Resource budget exhausted before a verdict was reached.
    Unknown,
}

pub struct Solver {
    config: Config,
    ca: ClauseAllocator,
    db: ClauseDb,
    assigns: Assignment,
    watches: Watches,
    heur: DecisionHeuristic,
    analyze: AnalyzeContext,
    restart: RestartController,
    inproc: Inprocessor,
    reduce_guard: ReduceGuard,
    inprocess_guard: InprocessGuard,
    stats: Stats,
    unsat: bool,
}

impl Solver {
    pub fn new(config: Config) -> Result<Self, SolverError> {
        config.validate()?;

        let heur_config = DecisionHeuristicConfig {
            var_decay: config.vsids_decay,
            random_seed: if config.random_seed == 0.0 { 91648253.0 } else { config.random_seed },
            random_phase_prob: config.random_phase_prob,
            adaptive_random_phase: config.adaptive_random_phase,
            adaptive_threshold_conflicts: config.adaptive_threshold_conflicts,
            adaptive_restart_ratio: config.adaptive_restart_ratio,
        };
        let restart_config = RestartConfig {
            strategy: config.restart_strategy,
            luby_restart_first: config.restart_base,
            luby_restart_inc: 2.0,
            glucose_fast_window: config.glucose_window,
            glucose_k: 1.0 / config.glucose_k.max(1e-9),
            postpone_trail_factor: if config.restart_postponing { 1.4 } else { f64::INFINITY },
        };
        let clause_db_config = ClauseDbConfig { remove_satisfied: true, clause_decay: config.clause_decay, glue_lbd_threshold: 2 };

        Ok(Solver {
            ca: ClauseAllocator::new(),
            db: ClauseDb::new(clause_db_config),
            assigns: Assignment::new(),
            watches: Watches::new(),
            heur: DecisionHeuristic::new(heur_config),
            analyze: AnalyzeContext::new(config.ccmin_mode),
            restart: RestartController::new(restart_config),
            inproc: Inprocessor::new(),
            reduce_guard: ReduceGuard::new(config.learned_clause_limit_base, config.learned_clause_limit_growth),
            inprocess_guard: InprocessGuard::new(config.inprocessing_interval),
            stats: Stats::default(),
            unsat: false,
            config,
        })
    }

    pub fn num_vars(&self) -> usize {
        self.assigns.num_vars()
    }

    pub fn num_clauses(&self) -> usize {
        self.db.stats.num_clauses
    }

    pub fn new_var(&mut self) -> Var {
        let v = self.assigns.new_var();
        self.watches.init_var(v);
        self.heur.init_var(v);
        self.analyze.init_var(v);
        self.inproc.init_var(v);
        v
    }

    /// `set_phase_hint(solver, var, value)`
    pub fn set_phase_hint(&mut self, v: Var, value: bool) {
        self.heur.set_phase_hint(v, value);
    }

    fn check_var(&self, lit: Lit) -> Result<(), SolverError> {
        if lit.var().index() >= self.assigns.num_vars() {
            Err(SolverError::VarOutOfRange { var: lit.var(), num_vars: self.assigns.num_vars() })
        } else {
            Ok(())
        }
    }

    /// `add_original(literals)`: dedup, detect tautology,
    /// detect the empty clause (→ UNSAT), enqueue units for level-0
    /// propagation.
    pub fn add_clause(&mut self, literals: &[Lit]) -> Result<(), SolverError> {
        for &lit in literals {
            self.check_var(lit)?;
        }
        if self.unsat {
            return Ok(());
        }

        let mut ps = literals.to_vec();
        ps.sort();
        ps.dedup();

        let mut prev: Option<Lit> = None;
        for &lit in &ps {
            if prev == Some(!lit) {
                return Ok(()); // tautology: trivially satisfied, skip.
            }
            prev = Some(lit);
        }

        ps.retain(|&lit| !self.assigns.is_assigned_false(lit));
        if ps.iter().any(|&lit| self.assigns.is_assigned_true(lit)) {
            return Ok(()); // already satisfied at level 0.
        }

        match ps.len() {
            0 => self.unsat = true,
            1 => {
                if self.assigns.value_of(ps[0]) == crate::formula::assignment::LitVal::Undef {
                    self.assigns.enqueue(ps[0], None);
                }
                if self.watches.propagate(&mut self.ca, &mut self.assigns).is_some() {
                    self.unsat = true;
                }
            }
            _ => {
                let cr = self.db.add_clause(&mut self.ca, ps);
                self.watches.watch_clause(self.ca.view(cr), cr);
                self.inproc.observe_clause(&self.ca, cr);
            }
        }
        Ok(())
    }

    fn backtrack_to(&mut self, level: DecisionLevel) {
        let Solver { assigns, heur, .. } = self;
        assigns.backtrack_to(level, |_, lit| heur.cancel(lit));
    }

    /// Assign every currently-undetermined pure literal — one whose
    /// variable appears with only one polarity across every live original
    /// clause — satisfyingly (step 1, §9 "pure literal
    /// elimination": preprocessing only, never mid-search).
    fn eliminate_pure_literals(&mut self) {
        let n = self.assigns.num_vars();
        let mut seen_pos = vec![false; n];
        let mut seen_neg = vec![false; n];

        for cr in self.db.iter_original().collect::<Vec<_>>() {
            if self.ca.is_deleted(cr) {
                continue;
            }
            let c = self.ca.view(cr);
            if satisfied_with_assignment(c.lits(), &self.assigns) {
                continue;
            }
            for &lit in c.lits() {
                if lit.sign() {
                    seen_neg[lit.var().index()] = true;
                } else {
                    seen_pos[lit.var().index()] = true;
                }
            }
        }

        for i in 0..n {
            let v = Var::from_index(i);
            if !self.assigns.is_undef(v) {
                continue;
            }
            match (seen_pos[i], seen_neg[i]) {
                (true, false) => self.assigns.enqueue(v.pos_lit(), None),
                (false, true) => self.assigns.enqueue(v.neg_lit(), None),
                _ => {}
            }
        }
    }

    /// Step 1 of normalize (already done by `add_clause`),
    /// propagate at level 0, optionally eliminate pure literals, propagate
    /// again. Returns `false` on UNSAT.
    fn preprocess(&mut self) -> bool {
        if self.unsat {
            return false;
        }
        if self.watches.propagate(&mut self.ca, &mut self.assigns).is_some() {
            return false;
        }
        self.eliminate_pure_literals();
        if self.watches.propagate(&mut self.ca, &mut self.assigns).is_some() {
            return false;
        }
        self.heur.rebuild_order_heap(&self.assigns);
        true
    }

    /// Drains conflicts to a fixpoint: propagate, and on every conflict,
    /// analyze/learn/backjump, until propagation reports no conflict.
    /// Returns `false` the moment a conflict is derived at the ground
    /// level (UNSAT).
    fn propagate_learn_backtrack(&mut self) -> bool {
        loop {
            let confl = match self.watches.propagate(&mut self.ca, &mut self.assigns) {
                Some(c) => c,
                None => return true,
            };
            self.stats.conflicts += 1;

            let outcome = {
                let Solver { analyze, heur, db, assigns, ca, .. } = self;
                analyze.analyze(assigns, ca, confl, |v| heur.bump_activity(v), |ca2, cr| db.bump_activity(ca2, cr))
            };

            match outcome {
                Conflict::Ground => return false,
                Conflict::Unit(unit) => {
                    self.backtrack_to(GROUND_LEVEL);
                    match self.assigns.value_of(unit) {
                        crate::formula::assignment::LitVal::Undef => self.assigns.enqueue(unit, None),
                        crate::formula::assignment::LitVal::False => return false,
                        crate::formula::assignment::LitVal::True => {}
                    }
                }
                Conflict::Learned(level, lit, clause, lbd) => {
                    self.backtrack_to(level);
                    let cr = self.db.learn_clause(&mut self.ca, clause, lbd);
                    self.watches.watch_clause(self.ca.view(cr), cr);
                    self.assigns.enqueue(lit, Some(cr));
                    self.inproc.observe_clause(&self.ca, cr);
                    self.restart.on_conflict(lbd, &self.assigns);
                }
            }

            self.heur.decay_activity();
            self.db.decay_activity();
        }
    }

    fn should_inprocess(&self) -> bool {
        self.assigns.is_ground_level() && self.inprocess_guard.due(self.stats.conflicts)
    }

    /// Returns `false` if strengthening a clause down to a unit produced a
    /// ground-level conflict, in which case `self.unsat` is set.
    fn run_inprocess(&mut self) -> bool {
        let before = self.inproc.stats_subsumed + self.inproc.stats_strengthened;
        let ok = {
            let Solver { ca, db, watches, assigns, inproc, .. } = self;
            inproc.run(ca, db, watches, assigns)
        };
        let yielded = self.inproc.stats_subsumed + self.inproc.stats_strengthened - before;
        self.inprocess_guard.record_run(self.stats.conflicts, yielded);
        self.stats.inprocessings += 1;
        if !ok {
            self.unsat = true;
        }
        ok
    }

    fn reduce_learnts(&mut self) {
        let Solver { ca, db, assigns, watches, .. } = self;
        db.reduce(ca, assigns, |c| watches.unwatch_clause_lazy(c));
        self.reduce_guard.bump();
        self.stats.reductions += 1;
    }

    fn extract_model(&self) -> Vec<bool> {
        let mut model = vec![false; self.assigns.num_vars()];
        for lit in self.assigns.model() {
            model[lit.var().index()] = !lit.sign();
        }
        model
    }

    fn snapshot_stats(&mut self) {
        self.stats.propagations = self.watches.propagations;
        self.stats.rnd_decisions = self.heur.rnd_decisions;
        self.stats.num_clauses = self.db.stats.num_clauses;
        self.stats.num_learnts = self.db.stats.num_learnts;
        self.stats.tot_literals = self.analyze.tot_literals;
        self.stats.del_literals = self.analyze.max_literals - self.analyze.tot_literals;
        self.stats.glue_clauses = self
            .db
            .iter_learned()
            .filter(|&cr| !self.ca.is_deleted(cr) && self.ca.view(cr).lbd().map_or(false, |l| l <= 2))
            .count();
    }

    pub fn stats(&mut self) -> Stats {
        self.snapshot_stats();
        self.stats
    }

    /// Runs the decide/propagate/analyze/backtrack loop to a verdict or
    /// until `budget` is exhausted.
    pub fn solve(&mut self, budget: &Budget) -> SolveResult {
        if self.unsat {
            return SolveResult::Unsat;
        }
        if !self.preprocess() {
            self.unsat = true;
            return SolveResult::Unsat;
        }
        {
            let Solver { ca, db, assigns, watches, .. } = self;
            db.remove_satisfied(ca, assigns, |c| watches.unwatch_clause_lazy(c));
        }
        self.stats.solves += 1;

        loop {
            if !self.propagate_learn_backtrack() {
                return SolveResult::Unsat;
            }

            if !budget.within(self.stats.conflicts) {
                self.backtrack_to(GROUND_LEVEL);
                return SolveResult::Unknown;
            }

            if self.restart.should_restart(&self.assigns) {
                self.backtrack_to(GROUND_LEVEL);
                self.restart.on_restart();
                self.heur.on_restart(self.restart.num_restarts, self.stats.conflicts);
                self.stats.restarts += 1;

                if self.should_inprocess() && !self.run_inprocess() {
                    return SolveResult::Unsat;
                }
                continue;
            }

            if self.db.num_learnts() as u64 >= self.reduce_guard.limit() {
                self.reduce_learnts();
            }

            match self.heur.pick_branch_lit(&self.assigns) {
                None => return SolveResult::Sat(self.extract_model()),
                Some(lit) => {
                    self.stats.decisions += 1;
                    self.assigns.new_decision_level();
                    self.assigns.enqueue(lit, None);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(v: Var, positive: bool) -> Lit {
        v.lit(positive)
    }

    #[test]
    fn tautology_is_trivially_sat() {
        let mut s = Solver::new(Config::default()).unwrap();
        let x = s.new_var();
        s.add_clause(&[lit(x, true), lit(x, false)]).unwrap();

        match s.solve(&Budget::unbounded()) {
            SolveResult::Sat(model) => assert_eq!(model.len(), 1),
            _ => panic!("expected SAT"),
        }
    }

    #[test]
    fn unit_propagation_chain_needs_no_decisions() {
        let mut s = Solver::new(Config::default()).unwrap();
        let x1 = s.new_var();
        let x2 = s.new_var();
        let x3 = s.new_var();

        s.add_clause(&[lit(x1, true)]).unwrap();
        s.add_clause(&[lit(x1, false), lit(x2, true)]).unwrap();
        s.add_clause(&[lit(x2, false), lit(x3, true)]).unwrap();

        match s.solve(&Budget::unbounded()) {
            SolveResult::Sat(model) => assert_eq!(model, vec![true, true, true]),
            _ => panic!("expected SAT"),
        }
        assert_eq!(s.stats().decisions, 0);
    }

    #[test]
    fn minimal_unsat_via_resolution() {
        let mut s = Solver::new(Config::default()).unwrap();
        let x1 = s.new_var();
        let x2 = s.new_var();

        s.add_clause(&[lit(x1, true), lit(x2, true)]).unwrap();
        s.add_clause(&[lit(x1, true), lit(x2, false)]).unwrap();
        s.add_clause(&[lit(x1, false), lit(x2, true)]).unwrap();
        s.add_clause(&[lit(x1, false), lit(x2, false)]).unwrap();

        match s.solve(&Budget::unbounded()) {
            SolveResult::Unsat => {}
            _ => panic!("expected UNSAT"),
        }
    }

    #[test]
    fn unit_clauses_on_both_polarities_are_unsat_at_preprocessing() {
        let mut s = Solver::new(Config::default()).unwrap();
        let x1 = s.new_var();
        s.add_clause(&[lit(x1, true)]).unwrap();
        s.add_clause(&[lit(x1, false)]).unwrap();

        match s.solve(&Budget::unbounded()) {
            SolveResult::Unsat => {}
            _ => panic!("expected UNSAT"),
        }
    }

    #[test]
    fn empty_formula_is_sat() {
        let mut s = Solver::new(Config::default()).unwrap();
        s.new_var();
        match s.solve(&Budget::unbounded()) {
            SolveResult::Sat(model) => assert_eq!(model.len(), 1),
            _ => panic!("expected SAT"),
        }
    }

    #[test]
    fn add_clause_rejects_unknown_variable() {
        let mut s = Solver::new(Config::default()).unwrap();
        let bogus = Var::from_index(5);
        match s.add_clause(&[bogus.pos_lit()]) {
            Err(SolverError::VarOutOfRange { .. }) => {}
            _ => panic!("expected VarOutOfRange"),
        }
    }

    #[test]
    fn budget_exhaustion_reports_unknown() {
        // Pigeonhole-ish small unsat instance with a zero-conflict budget:
        // the first conflict must blow the budget before a verdict forms.
        let mut s = Solver::new(Config::default()).unwrap();
        let x1 = s.new_var();
        let x2 = s.new_var();
        s.add_clause(&[lit(x1, true), lit(x2, true)]).unwrap();
        s.add_clause(&[lit(x1, true), lit(x2, false)]).unwrap();
        s.add_clause(&[lit(x1, false), lit(x2, true)]).unwrap();
        s.add_clause(&[lit(x1, false), lit(x2, false)]).unwrap();

        match s.solve(&Budget::new(Some(0))) {
            SolveResult::Unknown => {}
            _ => panic!("expected UNKNOWN: a zero conflict budget must be exhausted immediately"),
        }
    }
}
