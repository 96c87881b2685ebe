//! First-UIP conflict analysis, clause minimization, and LBD computation
//! for freshly learned clauses.

use crate::formula::assignment::{Assignment, DecisionLevel, GROUND_LEVEL};
use crate::formula::clause::{ClauseAllocator, ClauseRef};
use crate::formula::{Lit, Var, VarMap};

#[derive(PartialEq, Eq, Clone, Copy)]
pub enum CcMinMode {
    None,
    Basic,
    Deep,
}

impl Default for CcMinMode {
    fn default() -> Self {
        CcMinMode::Deep
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
enum Seen {
    Undef,
    Source,
    Removable,
    Failed,
}

/// The outcome of [`AnalyzeContext::analyze`].
pub enum Conflict {
    /// The conflicting clause was already falsified at the ground level:
    /// the formula is unsatisfiable.
    Ground,
    /// A single-literal clause was learned; the search backjumps to the
    /// ground level and enqueues it there.
    Unit(Lit),
    /// A multi-literal clause was learned: `(backjump_level, asserting_lit,
    /// clause_literals, lbd)`. `clause_literals[0]` is the asserting
    /// literal, matching `asserting_lit`.
    Learned(DecisionLevel, Lit, Vec<Lit>, u32),
}

/// Computes the Literal Block Distance of a set of literals: the number of
/// distinct decision levels represented among them, excluding the ground
/// level").
pub fn compute_lbd(lits: &[Lit], assigns: &Assignment) -> u32 {
    let mut levels: Vec<usize> = lits
        .iter()
        .map(|&l| assigns.vardata(l).level.offset())
        .filter(|&lvl| lvl > GROUND_LEVEL.offset())
        .collect();
    levels.sort_unstable();
    levels.dedup();
    levels.len() as u32
}

pub struct AnalyzeContext {
    ccmin_mode: CcMinMode,
    seen: VarMap<Seen>,
    analyze_toclear: Vec<Lit>,
    pub max_literals: u64,
    pub tot_literals: u64,
}

impl AnalyzeContext {
    pub fn new(ccmin_mode: CcMinMode) -> Self {
        AnalyzeContext {
            ccmin_mode,
            seen: VarMap::new(),
            analyze_toclear: Vec::new(),
            max_literals: 0,
            tot_literals: 0,
        }
    }

    pub fn init_var(&mut self, v: Var) {
        self.seen.insert(&v, Seen::Undef);
    }

    /// `analyze(confl)`: walk the implication graph
    /// backwards from the conflicting clause to the first unique implication
    /// point, resolving out every literal assigned at the current decision
    /// level but one. Requires `assigns.current_level() > GROUND_LEVEL`.
    pub fn analyze<BV, BC>(
        &mut self,
        assigns: &Assignment,
        ca: &mut ClauseAllocator,
        confl0: ClauseRef,
        mut bump_var: BV,
        mut bump_cla: BC,
    ) -> Conflict
    where
        BV: FnMut(Var),
        BC: FnMut(&mut ClauseAllocator, ClauseRef),
    {
        if assigns.is_ground_level() {
            return Conflict::Ground;
        }

        let mut out_learnt = Vec::with_capacity(assigns.num_assigned());
        {
            let mut confl = confl0;
            let mut path_c: i64 = 0;

            let trail = assigns.trail();
            let mut index = trail.len();
            loop {
                bump_cla(ca, confl);

                let base = if confl == confl0 { 0 } else { 1 };
                for &q in &ca.view(confl).lits()[base..] {
                    let v = q.var();
                    if self.seen[&v] == Seen::Undef {
                        let level = assigns.vardata(q).level;
                        if level > GROUND_LEVEL {
                            self.seen[&v] = Seen::Source;
                            bump_var(v);
                            if level >= assigns.current_level() {
                                path_c += 1;
                            } else {
                                out_learnt.push(q);
                            }
                        }
                    }
                }

                let pl = loop {
                    index -= 1;
                    if self.seen[&trail[index].var()] != Seen::Undef {
                        break trail[index];
                    }
                };

                self.seen[&pl.var()] = Seen::Undef;
                path_c -= 1;
                if path_c <= 0 {
                    out_learnt.insert(0, !pl);
                    break;
                }

                confl = assigns.vardata(!pl).reason.unwrap();
            }
        }

        // Minimize: drop literals whose falsification is already implied by
        // the rest of the learned clause.
        self.analyze_toclear = out_learnt.clone();
        self.max_literals += out_learnt.len() as u64;
        match self.ccmin_mode {
            CcMinMode::Deep => {
                out_learnt.retain(|&l| !self.lit_redundant(ca, assigns, l));
            }
            CcMinMode::Basic => {
                out_learnt.retain(|&l| !self.lit_redundant_basic(ca, assigns, l));
            }
            CcMinMode::None => {}
        }
        self.tot_literals += out_learnt.len() as u64;

        for l in self.analyze_toclear.iter() {
            self.seen[&l.var()] = Seen::Undef;
        }

        if out_learnt.len() == 1 {
            Conflict::Unit(out_learnt[0])
        } else {
            let mut max_i = 1;
            let mut max_level = assigns.vardata(out_learnt[1]).level;
            for i in 2..out_learnt.len() {
                let level = assigns.vardata(out_learnt[i]).level;
                if level > max_level {
                    max_i = i;
                    max_level = level;
                }
            }
            out_learnt.swap(1, max_i);

            let lbd = compute_lbd(&out_learnt, assigns);
            Conflict::Learned(max_level, out_learnt[0], out_learnt, lbd)
        }
    }

    fn lit_redundant_basic(&self, ca: &ClauseAllocator, assigns: &Assignment, literal: Lit) -> bool {
        match assigns.vardata(literal).reason {
            None => false,
            Some(cr) => ca.view(cr).lits()[1..]
                .iter()
                .all(|&lit| self.seen[&lit.var()] != Seen::Undef || assigns.vardata(lit).level == GROUND_LEVEL),
        }
    }

    /// Whether `literal` can be dropped from the learned clause because its
    /// reason is itself composed entirely of already-removable or
    /// ground-level literals.
    fn lit_redundant(&mut self, ca: &ClauseAllocator, assigns: &Assignment, literal: Lit) -> bool {
        debug_assert!(matches!(self.seen[&literal.var()], Seen::Undef | Seen::Source));

        let mut analyze_stack = match assigns.vardata(literal).reason {
            None => return false,
            Some(cr) => vec![(literal, &ca.view(cr).lits()[1..])],
        };

        while let Some((p, lits)) = analyze_stack.pop() {
            match lits.split_first() {
                Some((&l, tail)) => {
                    analyze_stack.push((p, tail));
                    let vd = assigns.vardata(l);
                    let seen = self.seen[&l.var()];

                    if vd.level == GROUND_LEVEL || seen == Seen::Source || seen == Seen::Removable {
                        continue;
                    }

                    match vd.reason {
                        Some(cr) if seen == Seen::Undef => {
                            analyze_stack.push((l, &ca.view(cr).lits()[1..]));
                        }
                        _ => {
                            for &(l, _) in analyze_stack.iter() {
                                if self.seen[&l.var()] == Seen::Undef {
                                    self.seen[&l.var()] = Seen::Failed;
                                    self.analyze_toclear.push(l);
                                }
                            }
                            return false;
                        }
                    }
                }
                None => {
                    if self.seen[&p.var()] == Seen::Undef {
                        self.seen[&p.var()] = Seen::Removable;
                        self.analyze_toclear.push(p);
                    }
                }
            }
        }

        true
    }
}
