//! Lower bounds on the number of cuts a search branch still needs.
//!
//! `estimate()` runs the greedy 3-approximation for maximum agreement forests on a copy of the
//! state: common cherries are merged, a cherry whose leaves sit in different fragments costs two
//! cuts, and a cherry whose leaves are separated by pendant subtrees in one fragment costs three.
//! The result is the size increase of an actual agreement forest, so it never undershoots the
//! number of cuts still needed.  Each step cuts at least one edge of some maximum agreement forest,
//! so dividing by `CUTS_PER_STEP` gives a lower bound.  Acyclicity only adds cuts, so the bound
//! holds for acyclic forests too.

use super::state::{Relation, State};

/// The number of cuts the greedy approximation may spend on one cut of an optimal forest
pub const CUTS_PER_STEP: usize = 3;

/// The number of cuts the greedy approximation needs to finish the given state
pub fn estimate(state: &State) -> usize {
    let mut state = state.clone();
    let mut cuts  = 0;
    loop {
        state.remove_singletons();
        if state.tree().leaf_count() < 3 {
            return cuts;
        }
        let (a, b) = match state.tree().first_cherry() {
            Some(cherry) => cherry,
            None         => return cuts,
        };
        match state.relation(a, b) {
            Some(Relation::Siblings) => state.drop_leaf(b),
            Some(Relation::Pendants(fragment, _)) => {
                if let Some(c) = state.neighbour(fragment, a, b) {
                    state.cut_node(fragment, c);
                    cuts += 1;
                }
                cuts += state.cut_leaf(a) as usize + state.cut_leaf(b) as usize;
            },
            Some(Relation::Separate) | None => {
                cuts += state.cut_leaf(a) as usize + state.cut_leaf(b) as usize;
            },
        }
    }
}

/// A lower bound on the cuts still needed, derived from an estimate
pub fn lower_bound(estimate: usize) -> usize {
    (estimate + CUTS_PER_STEP - 1) / CUTS_PER_STEP
}
