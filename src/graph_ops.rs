use std::collections::{HashMap, HashSet};

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::mol::Mol;
use crate::traits::HasPosition2D;

fn creation_positions<A, B>(mol: &Mol<A, B>) -> HashMap<NodeIndex, usize> {
    mol.atoms().enumerate().map(|(i, a)| (a, i)).collect()
}

/// Components ordered by their earliest atom, each listed in creation
/// order.
pub fn connected_components<A, B>(mol: &Mol<A, B>) -> Vec<Vec<NodeIndex>> {
    let position = creation_positions(mol);
    let mut visited: HashSet<NodeIndex> = HashSet::new();
    let mut components = Vec::new();
    for node in mol.atoms() {
        if !visited.insert(node) {
            continue;
        }
        let mut component = vec![node];
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            for neighbor in mol.neighbors(current) {
                if visited.insert(neighbor) {
                    component.push(neighbor);
                    stack.push(neighbor);
                }
            }
        }
        component.sort_by_key(|a| position[a]);
        components.push(component);
    }
    components
}

/// Whether `bond` lies on a cycle, i.e. its endpoints stay connected
/// without it.
pub fn is_ring_bond<A, B>(mol: &Mol<A, B>, bond: EdgeIndex) -> bool {
    let Some((from, to)) = mol.bond_endpoints(bond) else {
        return false;
    };
    let mut visited: HashSet<NodeIndex> = HashSet::from([from]);
    let mut stack = vec![from];
    while let Some(current) = stack.pop() {
        for e in mol.bonds_of(current) {
            if e == bond {
                continue;
            }
            let Some(next) = mol.other_end(e, current) else {
                continue;
            };
            if next == to {
                return true;
            }
            if visited.insert(next) {
                stack.push(next);
            }
        }
    }
    false
}

/// Copies a selection into a new molecule: the selected atoms, the
/// selected bonds, and both endpoints of every selected bond. Atoms and
/// bonds keep their relative creation order.
pub fn extract<A: Clone, B: Clone>(
    mol: &Mol<A, B>,
    atoms: &[NodeIndex],
    bonds: &[EdgeIndex],
) -> Mol<A, B> {
    extract_mapped(mol, atoms, bonds).0
}

/// [`extract`], also returning where each copied atom landed.
pub fn extract_mapped<A: Clone, B: Clone>(
    mol: &Mol<A, B>,
    atoms: &[NodeIndex],
    bonds: &[EdgeIndex],
) -> (Mol<A, B>, HashMap<NodeIndex, NodeIndex>) {
    let bonds: HashSet<EdgeIndex> = bonds
        .iter()
        .copied()
        .filter(|&e| mol.contains_bond(e))
        .collect();
    let mut wanted: HashSet<NodeIndex> = atoms
        .iter()
        .copied()
        .filter(|&a| mol.contains_atom(a))
        .collect();
    for &e in &bonds {
        if let Some((a, b)) = mol.bond_endpoints(e) {
            wanted.insert(a);
            wanted.insert(b);
        }
    }

    let mut out = Mol::new();
    let mut map: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    for idx in mol.atoms().filter(|a| wanted.contains(a)) {
        map.insert(idx, out.add_atom(mol.atom(idx).clone()));
    }
    for e in mol.bonds().filter(|e| bonds.contains(e)) {
        let Some((a, b)) = mol.bond_endpoints(e) else {
            continue;
        };
        if let (Some(&na), Some(&nb)) = (map.get(&a), map.get(&b)) {
            out.add_bond(na, nb, mol.bond(e).clone());
        }
    }
    (out, map)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenumberError {
    #[error("new order has {got} entries but the molecule has {expected} atoms")]
    LengthMismatch { expected: usize, got: usize },
    #[error("new order is not a permutation of 0..{0}")]
    InvalidPermutation(usize),
}

fn validate_permutation(new_order: &[usize], n: usize) -> Result<(), RenumberError> {
    if new_order.len() != n {
        return Err(RenumberError::LengthMismatch {
            expected: n,
            got: new_order.len(),
        });
    }
    let mut seen = vec![false; n];
    for &idx in new_order {
        if idx >= n || seen[idx] {
            return Err(RenumberError::InvalidPermutation(n));
        }
        seen[idx] = true;
    }
    Ok(())
}

/// Rebuilds `mol` with its atoms created in a new order.
/// `new_order[i]` is the creation position of the atom that becomes the
/// `i`-th atom. Bonds keep their creation order.
pub fn renumber_atoms<A: Clone, B: Clone>(
    mol: &Mol<A, B>,
    new_order: &[usize],
) -> Result<Mol<A, B>, RenumberError> {
    let old: Vec<NodeIndex> = mol.atoms().collect();
    validate_permutation(new_order, old.len())?;

    let mut out = Mol::new();
    let mut map: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    for &pos in new_order {
        let idx = old[pos];
        map.insert(idx, out.add_atom(mol.atom(idx).clone()));
    }
    for e in mol.bonds() {
        if let Some((a, b)) = mol.bond_endpoints(e) {
            out.add_bond(map[&a], map[&b], mol.bond(e).clone());
        }
    }
    Ok(out)
}

/// `(min, max)` corners of the atom positions, or `None` when empty.
pub fn bounding_box<A: HasPosition2D, B>(mol: &Mol<A, B>) -> Option<([f64; 2], [f64; 2])> {
    let mut atoms = mol.atoms().map(|a| mol.atom(a).position_2d());
    let first = atoms.next()?;
    Some(atoms.fold((first, first), |(lo, hi), [x, y]| {
        ([lo[0].min(x), lo[1].min(y)], [hi[0].max(x), hi[1].max(y)])
    }))
}

pub fn centroid<A: HasPosition2D, B>(mol: &Mol<A, B>) -> Option<[f64; 2]> {
    if mol.is_empty() {
        return None;
    }
    let n = mol.atom_count() as f64;
    let [sx, sy] = mol
        .atoms()
        .map(|a| mol.atom(a).position_2d())
        .fold([0.0, 0.0], |[sx, sy], [x, y]| [sx + x, sy + y]);
    Some([sx / n, sy / n])
}

pub fn translate<A: HasPosition2D, B>(mol: &mut Mol<A, B>, dx: f64, dy: f64) {
    let atoms: Vec<NodeIndex> = mol.atoms().collect();
    for idx in atoms {
        let atom = mol.atom_mut(idx);
        let [x, y] = atom.position_2d();
        atom.set_position_2d([x + dx, y + dy]);
    }
}

/// Rotates every atom by `angle` radians counter-clockwise around
/// `center`.
pub fn rotate_about<A: HasPosition2D, B>(mol: &mut Mol<A, B>, center: [f64; 2], angle: f64) {
    let (sin, cos) = angle.sin_cos();
    let atoms: Vec<NodeIndex> = mol.atoms().collect();
    for idx in atoms {
        let atom = mol.atom_mut(idx);
        let [x, y] = atom.position_2d();
        let (rx, ry) = (x - center[0], y - center[1]);
        atom.set_position_2d([
            center[0] + rx * cos - ry * sin,
            center[1] + rx * sin + ry * cos,
        ]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Atom;
    use crate::bond::Bond;
    use crate::element::Element;

    fn approx(a: [f64; 2], b: [f64; 2]) -> bool {
        (a[0] - b[0]).abs() < 1e-9 && (a[1] - b[1]).abs() < 1e-9
    }

    /// Cyclopropane with a methyl tail, plus a lone oxygen.
    fn sample() -> (Mol<Atom, Bond>, Vec<NodeIndex>, Vec<EdgeIndex>) {
        let mut mol = Mol::new();
        let a: Vec<NodeIndex> = [
            Atom::new(Element::C).at(0.0, 0.0),
            Atom::new(Element::C).at(30.0, 0.0),
            Atom::new(Element::C).at(15.0, 26.0),
            Atom::new(Element::C).at(-30.0, 0.0),
            Atom::new(Element::O).at(100.0, 100.0),
        ]
        .into_iter()
        .map(|atom| mol.add_atom(atom))
        .collect();
        let b = vec![
            mol.add_bond(a[0], a[1], Bond::single()),
            mol.add_bond(a[1], a[2], Bond::single()),
            mol.add_bond(a[2], a[0], Bond::single()),
            mol.add_bond(a[0], a[3], Bond::double()),
        ];
        (mol, a, b)
    }

    #[test]
    fn components_in_creation_order() {
        let (mol, a, _) = sample();
        assert_eq!(connected_components(&mol), vec![vec![a[0], a[1], a[2], a[3]], vec![a[4]]]);
    }

    #[test]
    fn ring_bonds() {
        let (mol, _, b) = sample();
        assert!(is_ring_bond(&mol, b[0]));
        assert!(is_ring_bond(&mol, b[2]));
        assert!(!is_ring_bond(&mol, b[3]));
    }

    #[test]
    fn extract_pulls_in_bond_endpoints() {
        let (mol, a, b) = sample();
        let copy = extract(&mol, &[a[4]], &[b[3]]);
        assert_eq!(copy.atom_count(), 3);
        assert_eq!(copy.bond_count(), 1);
        let elements: Vec<Element> = copy.atoms().map(|i| copy.atom(i).element).collect();
        assert_eq!(elements, vec![Element::C, Element::C, Element::O]);
        let bond = copy.bonds().next().unwrap();
        assert_eq!(copy.bond(bond), &Bond::double());
    }

    #[test]
    fn extract_ignores_unselected_bonds() {
        let (mol, a, _) = sample();
        let copy = extract(&mol, &[a[0], a[1]], &[]);
        assert_eq!(copy.atom_count(), 2);
        assert_eq!(copy.bond_count(), 0);
    }

    #[test]
    fn renumber_reverses() {
        let (mol, _, _) = sample();
        let renumbered = renumber_atoms(&mol, &[4, 3, 2, 1, 0]).unwrap();
        let first = renumbered.atoms().next().unwrap();
        assert_eq!(renumbered.atom(first).element, Element::O);
        assert_eq!(renumbered.bond_count(), 4);
        let back = renumber_atoms(&renumbered, &[4, 3, 2, 1, 0]).unwrap();
        assert_eq!(back, mol);
    }

    #[test]
    fn renumber_rejects_bad_orders() {
        let (mol, _, _) = sample();
        assert_eq!(
            renumber_atoms(&mol, &[0, 1]).unwrap_err(),
            RenumberError::LengthMismatch { expected: 5, got: 2 }
        );
        assert_eq!(
            renumber_atoms(&mol, &[0, 1, 2, 3, 3]).unwrap_err(),
            RenumberError::InvalidPermutation(5)
        );
    }

    #[test]
    fn geometry() {
        let (mut mol, a, _) = sample();
        assert_eq!(bounding_box(&mol), Some(([-30.0, 0.0], [100.0, 100.0])));
        assert!(approx(centroid(&mol).unwrap(), [23.0, 25.2]));

        translate(&mut mol, 10.0, -5.0);
        assert!(approx(mol.atom(a[1]).position, [40.0, -5.0]));

        rotate_about(&mut mol, [10.0, -5.0], std::f64::consts::FRAC_PI_2);
        assert!(approx(mol.atom(a[1]).position, [10.0, 25.0]));
        assert!(approx(mol.atom(a[0]).position, [10.0, -5.0]));
    }

    #[test]
    fn empty_geometry() {
        let mol = Mol::<Atom, Bond>::new();
        assert_eq!(bounding_box(&mol), None);
        assert_eq!(centroid(&mol), None);
    }
}
