//! Two-watched-literal propagation, implemented as a safe read/write-cursor
//! filter-in-place loop over each watch list.

use crate::formula::assignment::Assignment;
use crate::formula::clause::{Clause, ClauseAllocator, ClauseRef};
use crate::formula::{Lit, LitVec, Var};

#[derive(Clone, Copy, Debug)]
struct Watcher {
    cref: ClauseRef,
    /// A literal of the watched clause known to satisfy it as of the last
    /// time this watcher was visited; lets propagation skip re-reading the
    /// clause when `blocker` is already true.
    blocker: Lit,
}

#[derive(Default)]
struct WatchList {
    watchers: Vec<Watcher>,
    /// Set when a watched clause was deleted lazily: the
    /// list is compacted on next visit instead of eagerly.
    dirty: bool,
}

pub struct Watches {
    by_lit: LitVec<WatchList>,
    pub propagations: u64,
}

impl Watches {
    pub fn new() -> Self {
        Watches {
            by_lit: LitVec::new(),
            propagations: 0,
        }
    }

    pub fn init_var(&mut self, v: Var) {
        self.by_lit.init(v.pos_lit());
        self.by_lit.init(v.neg_lit());
    }

    /// A clause watches a literal `lit` by being queued on `!lit`'s list:
    /// once `!lit` becomes true, `lit` is falsified and the watcher must be
    /// re-examined.
    pub fn watch_clause(&mut self, c: &Clause, cr: ClauseRef) {
        let (l0, l1) = c.watched_pair();
        self.by_lit[!l0].watchers.push(Watcher { cref: cr, blocker: l1 });
        self.by_lit[!l1].watchers.push(Watcher { cref: cr, blocker: l0 });
    }

    pub fn unwatch_clause_strict(&mut self, c: &Clause, cr: ClauseRef) {
        let (l0, l1) = c.watched_pair();
        self.by_lit[!l0].watchers.retain(|w| w.cref != cr);
        self.by_lit[!l1].watchers.retain(|w| w.cref != cr);
    }

    /// Mark both watch lists of `c` dirty instead of scanning them now;
    /// they are compacted lazily the next time propagation visits them.
    pub fn unwatch_clause_lazy(&mut self, c: &Clause) {
        let (l0, l1) = c.watched_pair();
        self.by_lit[!l0].dirty = true;
        self.by_lit[!l1].dirty = true;
    }

    /// Whether `cr` is registered on `lit`'s watch list. For tests and
    /// debug assertions, not the propagation hot path.
    pub fn is_watching(&self, lit: Lit, cr: ClauseRef) -> bool {
        self.by_lit[lit].watchers.iter().any(|w| w.cref == cr)
    }

    /// Drain the propagation queue against the watch lists, restoring all
    /// watch-list invariants, or return the first falsified clause
    /// encountered. This is BCP: the entire fixpoint for
    /// literals enqueued so far, not a single step.
    pub fn propagate(&mut self, ca: &mut ClauseAllocator, assigns: &mut Assignment) -> Option<ClauseRef> {
        while let Some(p) = assigns.dequeue() {
            self.propagations += 1;
            let false_lit = !p;

            if self.by_lit[p].dirty {
                let ca_ref = &*ca;
                self.by_lit[p].watchers.retain(|w| !ca_ref.is_deleted(w.cref));
                self.by_lit[p].dirty = false;
            }

            // Filter-in-place: `read` scans every watcher once, `write`
            // keeps the ones that still watch `p`.
            let mut watchers = std::mem::take(&mut self.by_lit[p].watchers);
            let mut write = 0;
            let mut conflict = None;

            let mut read = 0;
            while read < watchers.len() {
                let w = watchers[read];
                read += 1;

                if assigns.is_assigned_true(w.blocker) {
                    watchers[write] = w;
                    write += 1;
                    continue;
                }

                let c = ca.edit(w.cref);
                // Put the falsified literal at position 1; its partner at
                // position 0 is the clause's other watch.
                if c.head() == false_lit {
                    c.swap(0, 1);
                }

                let new_blocker = Watcher { cref: w.cref, blocker: c.head() };
                if new_blocker.blocker != w.blocker && assigns.is_assigned_true(new_blocker.blocker) {
                    watchers[write] = new_blocker;
                    write += 1;
                    continue;
                }

                match c.find_new_watch(1, |lit| !assigns.is_assigned_false(lit)) {
                    Some(lit) => {
                        self.by_lit[!lit].watchers.push(new_blocker);
                    }
                    None => {
                        // No replacement: clause is unit or conflicting
                        // under the current assignment.
                        watchers[write] = new_blocker;
                        write += 1;

                        if assigns.is_assigned_false(new_blocker.blocker) {
                            assigns.dequeue_all();
                            while read < watchers.len() {
                                watchers[write] = watchers[read];
                                write += 1;
                                read += 1;
                            }
                            conflict = Some(new_blocker.cref);
                            break;
                        } else {
                            assigns.enqueue(new_blocker.blocker, Some(new_blocker.cref));
                        }
                    }
                }
            }

            watchers.truncate(write);
            self.by_lit[p].watchers = watchers;

            if conflict.is_some() {
                return conflict;
            }
        }

        None
    }
}

impl Default for Watches {
    fn default() -> Self {
        Self::new()
    }
}
