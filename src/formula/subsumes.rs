//! Literal-set subsumption tests used by the inprocessor.

use super::clause::Clause;
use super::Lit;

pub enum Subsumes {
    /// `this` does not subsume `other`, even after flipping one literal.
    Different,
    /// `this ⊆ other` exactly: `other` is redundant.
    Exact,
    /// `this \ {lit} ⊆ other \ {!lit}`: self-subsuming resolution can strip
    /// `!lit` from `other`.
    LitSign(Lit),
}

/// `subsumes(this, other)` Both clauses' abstraction
/// signatures are checked first to reject non-subsuming pairs in O(1)
/// before falling back to the O(|this|*|other|) literal scan.
pub fn subsumes(this: &Clause, other: &Clause) -> Subsumes {
    if other.len() < this.len() || (this.abstraction() & !other.abstraction()) != 0 {
        return Subsumes::Different;
    }

    let mut ret = Subsumes::Exact;
    for &lit in this.lits() {
        let mut found = false;
        for &cur in other.lits() {
            if lit == cur {
                found = true;
                break;
            } else if lit == !cur {
                if let Subsumes::Exact = ret {
                    ret = Subsumes::LitSign(lit);
                    found = true;
                    break;
                } else {
                    // Two literals differ in sign: not subsumption, and not
                    // self-subsumption either (only one flip is tolerated).
                    return Subsumes::Different;
                }
            }
        }
        if !found {
            return Subsumes::Different;
        }
    }
    ret
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::clause::{ClauseAllocator, ClauseHeader};
    use crate::formula::{util::calc_abstraction, Var};

    fn lit(i: usize, positive: bool) -> Lit {
        Var::from_index(i).lit(positive)
    }

    fn clause(ca: &mut ClauseAllocator, lits: Vec<Lit>) -> crate::formula::clause::ClauseRef {
        let abstraction = calc_abstraction(&lits);
        ca.alloc(lits, ClauseHeader::Original { abstraction })
    }

    #[test]
    fn exact_subsumption() {
        let mut ca = ClauseAllocator::new();
        let c = clause(&mut ca, vec![lit(0, true), lit(1, true)]);
        let d = clause(&mut ca, vec![lit(0, true), lit(1, true), lit(2, false)]);
        assert!(matches!(subsumes(ca.view(c), ca.view(d)), Subsumes::Exact));
    }

    #[test]
    fn self_subsuming_resolution_candidate() {
        let mut ca = ClauseAllocator::new();
        let c = clause(&mut ca, vec![lit(0, true), lit(1, true)]);
        let d = clause(&mut ca, vec![lit(0, false), lit(1, true), lit(2, false)]);
        match subsumes(ca.view(c), ca.view(d)) {
            Subsumes::LitSign(l) => assert_eq!(l, lit(0, true)),
            _ => panic!("expected LitSign"),
        }
    }

    #[test]
    fn unrelated_clauses_do_not_subsume() {
        let mut ca = ClauseAllocator::new();
        let c = clause(&mut ca, vec![lit(0, true), lit(3, true)]);
        let d = clause(&mut ca, vec![lit(0, true), lit(1, true), lit(2, false)]);
        assert!(matches!(subsumes(ca.view(c), ca.view(d)), Subsumes::Different));
    }
}
