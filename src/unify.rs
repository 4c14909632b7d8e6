//! Merging fragments into a molecule.
//!
//! A fragment is any [`Mol`] that has not been attached yet: a pasted
//! clipboard selection, a template ring, or atoms popped out with
//! [`Mol::detach_atoms`] and dragged elsewhere. Merging identifies fragment
//! atoms that land on top of existing atoms, re-points their bonds, and
//! drops any bond that would duplicate an existing one or loop back onto
//! a single atom.

use std::collections::HashMap;

use petgraph::graph::NodeIndex;
use tracing::debug;

use crate::mol::Mol;
use crate::traits::HasPosition2D;

/// Default merge distance, in drawing units.
pub const DEFAULT_MERGE_TOLERANCE: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnifyOptions {
    /// Two atoms closer than this are the same atom.
    pub tolerance: f64,
}

impl Default for UnifyOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_MERGE_TOLERANCE,
        }
    }
}

/// What a merge did to the target molecule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnifyReport {
    /// Fragment atoms absorbed by an existing atom.
    pub merged_atoms: usize,
    /// Fragment atoms added as new atoms.
    pub added_atoms: usize,
    pub added_bonds: usize,
    /// Bonds dropped as duplicates or self-loops.
    pub dropped_bonds: usize,
    /// Fragment atom id to the target atom that now stands for it.
    pub atom_map: HashMap<NodeIndex, NodeIndex>,
}

impl<A: HasPosition2D, B> Mol<A, B> {
    /// First atom, in creation order, within `tolerance` of `pos`.
    pub fn find_overlapping(&self, pos: [f64; 2], tolerance: f64) -> Option<NodeIndex> {
        let tol_sq = tolerance * tolerance;
        self.atoms().find(|&idx| self.atom(idx).distance_sq(pos) < tol_sq)
    }

    /// Merges `fragment` into `self`, consuming it.
    ///
    /// Each fragment atom is matched against the molecule's atoms in
    /// creation order, including atoms this same call has already added;
    /// the first one within tolerance wins. Fragment bonds are then
    /// re-created between the resolved atoms unless the pair is already
    /// bonded or both ends resolved to the same atom.
    pub fn unify(&mut self, mut fragment: Mol<A, B>, options: &UnifyOptions) -> UnifyReport {
        let mut report = UnifyReport::default();

        let frag_atoms: Vec<NodeIndex> = fragment.atoms().collect();
        let frag_bonds: Vec<_> = fragment
            .bonds()
            .filter_map(|e| fragment.bond_endpoints(e).map(|(a, b)| (e, a, b)))
            .collect();

        let mut pending = Vec::with_capacity(frag_bonds.len());
        for (edge, a, b) in frag_bonds {
            if let Some(bond) = fragment.remove_bond(edge) {
                pending.push((a, b, bond));
            }
        }

        for frag_idx in frag_atoms {
            let Some(atom) = fragment.remove_atom(frag_idx) else {
                continue;
            };
            let target = self.resolve_atom(atom, options, &mut report);
            report.atom_map.insert(frag_idx, target);
        }

        for (a, b, bond) in pending {
            let (Some(&ta), Some(&tb)) = (report.atom_map.get(&a), report.atom_map.get(&b)) else {
                report.dropped_bonds += 1;
                continue;
            };
            self.merge_bond(ta, tb, bond, &mut report);
        }

        debug!(
            merged = report.merged_atoms,
            added = report.added_atoms,
            bonds = report.added_bonds,
            dropped = report.dropped_bonds,
            "unified fragment"
        );
        report
    }

    fn resolve_atom(
        &mut self,
        atom: A,
        options: &UnifyOptions,
        report: &mut UnifyReport,
    ) -> NodeIndex {
        match self.find_overlapping(atom.position_2d(), options.tolerance) {
            Some(existing) => {
                report.merged_atoms += 1;
                existing
            }
            None => {
                report.added_atoms += 1;
                self.add_atom(atom)
            }
        }
    }

    fn merge_bond(&mut self, a: NodeIndex, b: NodeIndex, bond: B, report: &mut UnifyReport) {
        if a == b || self.bond_between(a, b).is_some() {
            report.dropped_bonds += 1;
        } else {
            self.add_bond(a, b, bond);
            report.added_bonds += 1;
        }
    }
}
