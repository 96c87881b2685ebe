//! The trail and per-variable assignment state.

use std::fmt;

use super::clause::ClauseRef;
use super::{Lit, Var, VarMap};

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug)]
pub struct DecisionLevel(pub usize);

pub const GROUND_LEVEL: DecisionLevel = DecisionLevel(0);

impl DecisionLevel {
    #[inline]
    pub fn offset(self) -> usize {
        self.0
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum LitVal {
    Undef,
    False,
    True,
}

/// Per-variable state carried while assigned: its decision level and, if
/// propagated rather than decided, the clause that forced it
///.
#[derive(Clone, Copy)]
pub struct VarData {
    pub reason: Option<ClauseRef>,
    pub level: DecisionLevel,
}

struct VarLine {
    // Indexed by `sign as usize`: value[0] is this var's positive-literal
    // truth value, value[1] the negative-literal's.
    value: [LitVal; 2],
    vd: VarData,
}

/// The trail: a chronological record of every
/// currently-assigned literal, partitioned into decision levels by `lim`.
pub struct Assignment {
    vars: Vec<VarLine>,
    trail: Vec<Lit>,
    lim: Vec<usize>,
    qhead: usize,
}

impl Assignment {
    pub fn new() -> Self {
        Assignment {
            vars: Vec::new(),
            trail: Vec::new(),
            lim: Vec::new(),
            qhead: 0,
        }
    }

    #[inline]
    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    #[inline]
    pub fn num_assigned(&self) -> usize {
        self.trail.len()
    }

    #[inline]
    pub fn num_ground_assigned(&self) -> usize {
        self.lim.first().copied().unwrap_or(self.trail.len())
    }

    pub fn new_var(&mut self) -> Var {
        self.vars.push(VarLine {
            value: [LitVal::Undef, LitVal::Undef],
            vd: VarData {
                reason: None,
                level: GROUND_LEVEL,
            },
        });
        Var::from_index(self.vars.len() - 1)
    }

    #[inline]
    pub fn current_level(&self) -> DecisionLevel {
        DecisionLevel(self.lim.len())
    }

    #[inline]
    pub fn is_ground_level(&self) -> bool {
        self.lim.is_empty()
    }

    /// `new_decision_level()`
    #[inline]
    pub fn new_decision_level(&mut self) {
        self.lim.push(self.trail.len());
    }

    /// `enqueue(lit, reason)` The caller must first check
    /// `value_of(lit)` — assigning an already-falsified literal is a conflict
    /// the caller is responsible for detecting, not this method's job.
    #[inline]
    pub fn enqueue(&mut self, lit: Lit, reason: Option<ClauseRef>) {
        debug_assert_eq!(self.value_of(lit), LitVal::Undef);
        let line = &mut self.vars[lit.var().index()];
        let pos = !lit.sign() as usize;
        line.value[pos] = LitVal::True;
        line.value[pos ^ 1] = LitVal::False;
        line.vd = VarData {
            reason,
            level: DecisionLevel(self.lim.len()),
        };
        self.trail.push(lit);
    }

    /// `backtrack_to(level)` `on_pop` is called with
    /// `(level, lit)` for each popped trail entry, most-recent first —
    /// callers use it to feed phase saving and re-queue variables in the
    /// decision heuristic.
    pub fn backtrack_to<F: FnMut(DecisionLevel, Lit)>(&mut self, target: DecisionLevel, mut on_pop: F) {
        while self.lim.len() > target.0 {
            let level = DecisionLevel(self.lim.len());
            let bottom = self.lim.pop().unwrap();
            while self.trail.len() > bottom {
                let lit = self.trail.pop().unwrap();
                on_pop(level, lit);
                let line = &mut self.vars[lit.var().index()];
                line.value = [LitVal::Undef, LitVal::Undef];
                line.vd.reason = None;
            }
        }
        self.qhead = self.qhead.min(self.trail.len());
    }

    #[inline]
    pub fn dequeue_all(&mut self) {
        self.qhead = self.trail.len();
    }

    #[inline]
    pub fn dequeue(&mut self) -> Option<Lit> {
        if self.qhead < self.trail.len() {
            let p = self.trail[self.qhead];
            self.qhead += 1;
            Some(p)
        } else {
            None
        }
    }

    #[inline]
    pub fn is_undef(&self, v: Var) -> bool {
        self.vars[v.index()].value[0] == LitVal::Undef
    }

    #[inline]
    pub fn value_of(&self, lit: Lit) -> LitVal {
        self.vars[lit.var().index()].value[!lit.sign() as usize]
    }

    #[inline]
    pub fn is_assigned_true(&self, lit: Lit) -> bool {
        self.value_of(lit) == LitVal::True
    }

    #[inline]
    pub fn is_assigned_false(&self, lit: Lit) -> bool {
        self.value_of(lit) == LitVal::False
    }

    /// Panics if `lit`'s variable is unassigned — callers only look up
    /// `vardata` for literals known to be on the trail (e.g. resolving a
    /// reason clause during conflict analysis).
    #[inline]
    pub fn vardata(&self, lit: Lit) -> &VarData {
        debug_assert_ne!(self.value_of(lit), LitVal::Undef);
        &self.vars[lit.var().index()].vd
    }

    pub fn is_reason_for(&self, cr: ClauseRef, head: Lit) -> bool {
        let line = &self.vars[head.var().index()];
        line.value[!head.sign() as usize] == LitVal::True && line.vd.reason == Some(cr)
    }

    pub fn trail(&self) -> &[Lit] {
        &self.trail
    }

    pub fn model(&self) -> Vec<Lit> {
        let mut model = Vec::with_capacity(self.vars.len());
        for i in 0..self.vars.len() {
            match self.vars[i].value[0] {
                LitVal::Undef => {}
                LitVal::True => model.push(Var::from_index(i).pos_lit()),
                LitVal::False => model.push(Var::from_index(i).neg_lit()),
            }
        }
        model
    }
}

impl Default for Assignment {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for level in 0..=self.lim.len() {
            let l = if level > 0 { self.lim[level - 1] } else { 0 };
            let r = if level < self.lim.len() { self.lim[level] } else { self.trail.len() };
            if r > l {
                write!(f, "[{}:", level)?;
                for lit in &self.trail[l..r] {
                    write!(f, " {:?}", lit)?;
                }
                write!(f, " ]")?;
            }
        }
        Ok(())
    }
}

/// Estimate of search progress in `[0, 1)`, weighting deeper decision
/// levels less — used for stats reporting on an interrupted search.
pub fn progress_estimate(assigns: &Assignment) -> f64 {
    let f = 1.0 / (assigns.num_vars().max(1) as f64);
    let mut progress = 0.0;
    let cl = assigns.lim.len();
    for level in 0..=cl {
        let l = if level == 0 { 0 } else { assigns.lim[level - 1] };
        let r = if level == cl { assigns.trail.len() } else { assigns.lim[level] };
        progress += f.powi(level as i32) * ((r - l) as f64);
    }
    progress * f
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backtrack_restores_trail_prefix() {
        let mut a = Assignment::new();
        let v0 = a.new_var();
        let v1 = a.new_var();
        let v2 = a.new_var();

        a.enqueue(v0.pos_lit(), None); // level 0
        a.new_decision_level();
        a.enqueue(v1.pos_lit(), None); // level 1
        a.new_decision_level();
        a.enqueue(v2.pos_lit(), None); // level 2

        assert_eq!(a.current_level(), DecisionLevel(2));

        let mut popped = Vec::new();
        a.backtrack_to(DecisionLevel(1), |lvl, lit| popped.push((lvl, lit)));

        assert_eq!(a.current_level(), DecisionLevel(1));
        assert_eq!(popped, vec![(DecisionLevel(2), v2.pos_lit())]);
        assert!(a.is_assigned_true(v0.pos_lit()));
        assert!(a.is_assigned_true(v1.pos_lit()));
        assert!(a.is_undef(v2));
    }

    #[test]
    fn trail_is_chronological_and_exact() {
        let mut a = Assignment::new();
        let vars: Vec<_> = (0..5).map(|_| a.new_var()).collect();
        for v in &vars {
            a.enqueue(v.pos_lit(), None);
        }
        assert_eq!(a.trail().len(), 5);
        for (i, v) in vars.iter().enumerate() {
            assert_eq!(a.trail()[i], v.pos_lit());
        }
    }

    #[test]
    fn dequeue_drains_in_fifo_order() {
        let mut a = Assignment::new();
        let vars: Vec<_> = (0..3).map(|_| a.new_var()).collect();
        for v in &vars {
            a.enqueue(v.pos_lit(), None);
        }
        for v in &vars {
            assert_eq!(a.dequeue(), Some(v.pos_lit()));
        }
        assert_eq!(a.dequeue(), None);
    }
}
