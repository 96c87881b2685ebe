//! Small, free-standing helpers shared by the clause database and the
//! inprocessor.

use super::assignment::Assignment;
use super::Lit;

/// 32-bit Bloom-filter signature over a literal set's variables, used to
/// cheaply reject non-subsuming clause pairs.
pub fn calc_abstraction(lits: &[Lit]) -> u32 {
    let mut abstraction = 0;
    for &lit in lits {
        abstraction |= lit.abstraction();
    }
    abstraction
}

/// `true` if some literal of `clause` is true under `assignment`.
pub fn satisfied_with_assignment(clause: &[Lit], assignment: &Assignment) -> bool {
    clause.iter().any(|&lit| assignment.is_assigned_true(lit))
}
