//! Level-0 inprocessing: subsumption and self-subsuming resolution, driven
//! off a queue of touched variables and the literal-set test in
//! `formula::subsumes`. Deliberately does NOT
//! implement bounded variable elimination (`simplify/elim_queue.rs`,
//! `simplify/elim_clauses.rs`) — scopes the inprocessor to
//! subsumption and self-subsuming resolution only.

use std::collections::VecDeque;

use crate::formula::assignment::{Assignment, LitVal};
use crate::formula::clause::{ClauseAllocator, ClauseRef};
use crate::formula::subsumes::{subsumes, Subsumes};
use crate::formula::{Lit, Var, VarMap};

use super::clause_db::ClauseDb;
use super::watches::Watches;

/// One clause or one freshly ground-level-assigned literal awaiting a
/// subsumption check.
enum Job {
    Clause(ClauseRef),
    Assign(Lit),
}

/// Drains a queue of clauses/newly-fixed literals, checking each against the
/// clauses containing its variables for subsumption (SC1: soundness at
/// decision level 0 only) and self-subsuming resolution (SC2: strengthening
/// never removes the asserting literal; SC3: never touches a clause that is
/// some assignment's reason).
pub struct Inprocessor {
    queue: VecDeque<ClauseRef>,
    bwdsub_assigns: usize,
    occurs: VarMap<Vec<ClauseRef>>,
    pub stats_subsumed: u64,
    pub stats_strengthened: u64,
}

impl Inprocessor {
    pub fn new() -> Self {
        Inprocessor {
            queue: VecDeque::new(),
            bwdsub_assigns: 0,
            occurs: VarMap::new(),
            stats_subsumed: 0,
            stats_strengthened: 0,
        }
    }

    pub fn init_var(&mut self, v: Var) {
        self.occurs.insert(&v, Vec::new());
    }

    /// Register a clause for both occurrence-list membership and an initial
    /// subsumption check.
    pub fn observe_clause(&mut self, ca: &ClauseAllocator, cr: ClauseRef) {
        for &lit in ca.view(cr).lits() {
            self.occurs[&lit.var()].push(cr);
        }
        self.queue.push_back(cr);
    }

    fn pop(&mut self, assigns: &Assignment) -> Option<Job> {
        loop {
            if let Some(cr) = self.queue.pop_front() {
                return Some(Job::Clause(cr));
            }
            if self.bwdsub_assigns < assigns.num_ground_assigned() {
                let lit = assigns.trail()[self.bwdsub_assigns];
                self.bwdsub_assigns += 1;
                return Some(Job::Assign(lit));
            }
            return None;
        }
    }

    /// Run to a fixpoint: every queued clause is checked against every
    /// clause sharing one of its variables, subsumed clauses are deleted,
    /// and self-subsuming resolution strips resolvable literals. Only sound
    /// to call at the ground decision level. Returns `false` if strengthening
    /// a clause down to a unit produced a ground-level conflict (UNSAT).
    pub fn run(&mut self, ca: &mut ClauseAllocator, db: &mut ClauseDb, watches: &mut Watches, assigns: &mut Assignment) -> bool {
        debug_assert!(assigns.is_ground_level());

        while let Some(job) = self.pop(assigns) {
            match job {
                Job::Clause(cr) => {
                    if ca.is_deleted(cr) {
                        continue;
                    }
                    if !self.backward_subsume(ca, db, watches, assigns, cr) {
                        return false;
                    }
                }
                Job::Assign(lit) => {
                    // Every clause that mentions `lit`'s variable may now be
                    // simplifiable against the new unit `lit` itself: treat
                    // it as a unit "clause" for the same subsumption check.
                    let candidates = self.occurs[&lit.var()].clone();
                    for cr in candidates {
                        if !ca.is_deleted(cr) {
                            self.queue.push_back(cr);
                        }
                    }
                }
            }
        }
        true
    }

    /// Check `cr` against every other clause sharing a variable with it;
    /// delete subsumed clauses and strengthen self-subsuming candidates.
    /// Returns `false` on a ground-level conflict.
    fn backward_subsume(
        &mut self,
        ca: &mut ClauseAllocator,
        db: &mut ClauseDb,
        watches: &mut Watches,
        assigns: &mut Assignment,
        cr: ClauseRef,
    ) -> bool {
        let lits: Vec<Lit> = ca.view(cr).lits().to_vec();
        if lits.is_empty() {
            return true;
        }

        // Scan the shortest occurrence list among this clause's variables,
        // checking against the sparsest candidate set first.
        let pivot = lits
            .iter()
            .map(|l| l.var())
            .min_by_key(|v| self.occurs[v].len())
            .unwrap();

        let candidates = self.occurs[&pivot].clone();
        for other in candidates {
            if other == cr || ca.is_deleted(other) {
                continue;
            }
            if assigns.is_reason_for(other, ca.view(other).head()) {
                continue; // SC3: never touch a clause that is a reason.
            }

            match subsumes(ca.view(cr), ca.view(other)) {
                Subsumes::Exact => {
                    db.remove_clause(ca, other, |c| watches.unwatch_clause_lazy(c));
                    self.stats_subsumed += 1;
                }
                Subsumes::LitSign(l) => {
                    // Mirrors strengthenClause: unwatch before mutating the
                    // clause's literals, then rewatch (or enqueue the
                    // resulting unit) afterward.
                    watches.unwatch_clause_strict(ca.view(other), other);
                    ca.edit(other).strengthen(!l);
                    self.stats_strengthened += 1;

                    let c = ca.view(other);
                    if c.len() == 1 {
                        let unit = c.lits()[0];
                        match assigns.value_of(unit) {
                            LitVal::Undef => assigns.enqueue(unit, Some(other)),
                            LitVal::True => {}
                            LitVal::False => return false,
                        }
                    } else {
                        watches.watch_clause(c, other);
                    }
                    // Re-check the shrunk clause, including the case where
                    // strengthening left it unit.
                    self.queue.push_back(other);
                }
                Subsumes::Different => {}
            }
        }
        true
    }
}

impl Default for Inprocessor {
    fn default() -> Self {
        Self::new()
    }
}
