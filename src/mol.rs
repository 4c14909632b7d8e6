use std::collections::{HashMap, HashSet};

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::stable_graph::StableUnGraph;
use petgraph::visit::EdgeRef;

use crate::bond::BondOrder;
use crate::graph_ops::extract_mapped;
use crate::traits::{HasBondOrder, HasPosition2D};

/// Atoms lifted out of a molecule by [`Mol::detach_atoms`].
///
/// `fragment` holds the lifted atoms, every bond that touched them, and a
/// copy of each neighbour that stayed behind. The copies sit on top of
/// their originals, so merging the fragment back with [`Mol::unify`]
/// reconnects them; if a neighbour is gone by then, its copy is added
/// as a new atom instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Detached<A, B> {
    pub fragment: Mol<A, B>,
    /// Id of each lifted atom in the molecule it came from, mapped to its
    /// id in `fragment`.
    pub lifted: HashMap<NodeIndex, NodeIndex>,
}

impl<A, B> Detached<A, B> {
    /// Where a lifted atom lives in `fragment`.
    pub fn fragment_id(&self, original: NodeIndex) -> Option<NodeIndex> {
        self.lifted.get(&original).copied()
    }
}

impl<A: HasPosition2D, B> Detached<A, B> {
    /// Moves the lifted atoms. Neighbour copies stay put.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        for &idx in self.lifted.values() {
            let atom = self.fragment.atom_mut(idx);
            let [x, y] = atom.position_2d();
            atom.set_position_2d([x + dx, y + dy]);
        }
    }
}

/// Molecular graph with stable atom and bond ids.
///
/// Ids stay valid for as long as the atom or bond lives, regardless of
/// other removals. Atoms and bonds additionally remember the order in
/// which they were created; [`Mol::atoms`] and [`Mol::bonds`] iterate in
/// that order, which is what merge tie-breaks and persistence rely on.
pub struct Mol<A, B> {
    graph: StableUnGraph<A, B>,
    atom_seq: Vec<NodeIndex>,
    bond_seq: Vec<EdgeIndex>,
}

impl<A, B> Mol<A, B> {
    pub fn new() -> Self {
        Self {
            graph: StableUnGraph::default(),
            atom_seq: Vec::new(),
            bond_seq: Vec::new(),
        }
    }

    pub fn graph(&self) -> &StableUnGraph<A, B> {
        &self.graph
    }

    pub fn atom(&self, idx: NodeIndex) -> &A {
        &self.graph[idx]
    }

    pub fn atom_mut(&mut self, idx: NodeIndex) -> &mut A {
        &mut self.graph[idx]
    }

    pub fn bond(&self, idx: EdgeIndex) -> &B {
        &self.graph[idx]
    }

    pub fn bond_mut(&mut self, idx: EdgeIndex) -> &mut B {
        &mut self.graph[idx]
    }

    pub fn get_atom(&self, idx: NodeIndex) -> Option<&A> {
        self.graph.node_weight(idx)
    }

    pub fn get_bond(&self, idx: EdgeIndex) -> Option<&B> {
        self.graph.edge_weight(idx)
    }

    pub fn contains_atom(&self, idx: NodeIndex) -> bool {
        self.graph.contains_node(idx)
    }

    pub fn contains_bond(&self, idx: EdgeIndex) -> bool {
        self.graph.edge_weight(idx).is_some()
    }

    pub fn add_atom(&mut self, atom: A) -> NodeIndex {
        let idx = self.graph.add_node(atom);
        self.atom_seq.push(idx);
        idx
    }

    /// Duplicate bonds are not rejected here; [`Mol::unify`] keeps atom
    /// pairs unique.
    pub fn add_bond(&mut self, a: NodeIndex, b: NodeIndex, bond: B) -> EdgeIndex {
        assert_ne!(a, b, "bond endpoints must be distinct atoms");
        let idx = self.graph.add_edge(a, b, bond);
        self.bond_seq.push(idx);
        idx
    }

    /// Removes an atom and every bond attached to it.
    pub fn remove_atom(&mut self, idx: NodeIndex) -> Option<A> {
        if !self.graph.contains_node(idx) {
            return None;
        }
        let incident: Vec<EdgeIndex> = self.bonds_of(idx).collect();
        for edge in incident {
            self.remove_bond(edge);
        }
        self.atom_seq.retain(|&a| a != idx);
        self.graph.remove_node(idx)
    }

    pub fn remove_bond(&mut self, idx: EdgeIndex) -> Option<B> {
        let bond = self.graph.remove_edge(idx)?;
        self.bond_seq.retain(|&e| e != idx);
        Some(bond)
    }

    pub fn clear(&mut self) {
        self.graph.clear();
        self.atom_seq.clear();
        self.bond_seq.clear();
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.atom_seq.is_empty()
    }

    pub fn neighbors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors(idx)
    }

    pub fn bonds_of(&self, idx: NodeIndex) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edges(idx).map(|e| e.id())
    }

    pub fn degree(&self, idx: NodeIndex) -> usize {
        self.graph.edges(idx).count()
    }

    /// Atoms in creation order.
    pub fn atoms(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.atom_seq.iter().copied()
    }

    /// Bonds in creation order.
    pub fn bonds(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.bond_seq.iter().copied()
    }

    /// Position of an atom in creation order.
    pub fn atom_position(&self, idx: NodeIndex) -> Option<usize> {
        self.atom_seq.iter().position(|&a| a == idx)
    }

    pub fn bond_between(&self, a: NodeIndex, b: NodeIndex) -> Option<EdgeIndex> {
        self.graph.find_edge(a, b)
    }

    pub fn bond_endpoints(&self, idx: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(idx)
    }

    /// The endpoint of `bond` that is not `atom`.
    pub fn other_end(&self, bond: EdgeIndex, atom: NodeIndex) -> Option<NodeIndex> {
        let (a, b) = self.bond_endpoints(bond)?;
        if a == atom {
            Some(b)
        } else if b == atom {
            Some(a)
        } else {
            None
        }
    }
}

impl<B> Mol<crate::atom::Atom, B> {
    /// Shifts an atom's formal charge by `delta`, saturating at the `i8`
    /// range. Returns the new charge.
    pub fn adjust_charge(&mut self, idx: NodeIndex, delta: i8) -> Option<i8> {
        let atom = self.graph.node_weight_mut(idx)?;
        let charge = atom.charge.saturating_add(delta);
        atom.set_charge(charge);
        Some(charge)
    }
}

impl<A> Mol<A, crate::bond::Bond> {
    /// Advances a bond through single → double → triple → single.
    pub fn cycle_bond_order(&mut self, idx: EdgeIndex) -> Option<BondOrder> {
        let bond = self.graph.edge_weight_mut(idx)?;
        bond.order = bond.order.cycle();
        Some(bond.order)
    }
}

impl<A: Clone, B: Clone> Mol<A, B> {
    /// Pops `atoms` out of the molecule together with every bond that
    /// touches them. Ids that are not in the molecule are ignored.
    pub fn detach_atoms(&mut self, atoms: &[NodeIndex]) -> Detached<A, B> {
        let selected: HashSet<NodeIndex> = atoms
            .iter()
            .copied()
            .filter(|&a| self.contains_atom(a))
            .collect();
        let touching: Vec<EdgeIndex> = self
            .bonds()
            .filter(|&e| {
                self.bond_endpoints(e)
                    .is_some_and(|(a, b)| selected.contains(&a) || selected.contains(&b))
            })
            .collect();
        let lifted: Vec<NodeIndex> = self.atoms().filter(|a| selected.contains(a)).collect();

        let (fragment, map) = extract_mapped(self, &lifted, &touching);
        for &idx in &lifted {
            self.remove_atom(idx);
        }
        Detached {
            fragment,
            lifted: map.into_iter().filter(|(old, _)| selected.contains(old)).collect(),
        }
    }

    pub fn detach_atom(&mut self, idx: NodeIndex) -> Option<Detached<A, B>> {
        self.contains_atom(idx).then(|| self.detach_atoms(&[idx]))
    }

    /// Pops an atom and its direct neighbours, the unit the editor drags
    /// when a bond end is picked up.
    pub fn detach_with_neighbours(&mut self, idx: NodeIndex) -> Option<Detached<A, B>> {
        if !self.contains_atom(idx) {
            return None;
        }
        let mut atoms = vec![idx];
        atoms.extend(self.neighbors(idx));
        Some(self.detach_atoms(&atoms))
    }
}

impl<A, B: HasBondOrder> Mol<A, B> {
    pub fn bond_order(&self, idx: EdgeIndex) -> BondOrder {
        self.bond(idx).bond_order()
    }
}

impl<A: Clone, B: Clone> Clone for Mol<A, B> {
    fn clone(&self) -> Self {
        Self {
            graph: self.graph.clone(),
            atom_seq: self.atom_seq.clone(),
            bond_seq: self.bond_seq.clone(),
        }
    }
}

impl<A, B> Default for Mol<A, B> {
    fn default() -> Self {
        Self::new()
    }
}

/// Structural equality: same atoms in the same creation order, and the
/// same bonds in the same order between the same atom positions.
impl<A: PartialEq, B: PartialEq> PartialEq for Mol<A, B> {
    fn eq(&self, other: &Self) -> bool {
        if self.atom_count() != other.atom_count() || self.bond_count() != other.bond_count() {
            return false;
        }
        for (a, b) in self.atoms().zip(other.atoms()) {
            if self.atom(a) != other.atom(b) {
                return false;
            }
        }
        for (ea, eb) in self.bonds().zip(other.bonds()) {
            if self.bond(ea) != other.bond(eb) {
                return false;
            }
            let ends_a = self
                .bond_endpoints(ea)
                .map(|(x, y)| (self.atom_position(x), self.atom_position(y)));
            let ends_b = other
                .bond_endpoints(eb)
                .map(|(x, y)| (other.atom_position(x), other.atom_position(y)));
            if ends_a != ends_b {
                return false;
            }
        }
        true
    }
}

impl<A: std::fmt::Debug, B: std::fmt::Debug> std::fmt::Debug for Mol<A, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mol")
            .field("atom_count", &self.atom_count())
            .field("bond_count", &self.bond_count())
            .finish()
    }
}
