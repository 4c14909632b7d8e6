//! Ready-made ring fragments for the editor's template tools.
//!
//! Templates are centred on the origin; callers translate them to the drop
//! point and merge them with [`Mol::unify`].

use std::f64::consts::PI;

use petgraph::graph::NodeIndex;

use crate::atom::Atom;
use crate::bond::Bond;
use crate::element::Element;
use crate::mol::Mol;

/// Bond length, in drawing units, used by the named templates.
pub const DEFAULT_BOND_LENGTH: f64 = 50.0;

/// Regular `n`-gon of singly bonded carbons with the given edge length.
/// Returns `None` for fewer than three atoms.
pub fn ring(n: usize, bond_length: f64) -> Option<Mol<Atom, Bond>> {
    if n < 3 {
        return None;
    }
    let radius = bond_length / (2.0 * (PI / n as f64).sin());
    let mut mol = Mol::new();
    let atoms: Vec<NodeIndex> = (0..n)
        .map(|i| {
            let angle = -PI / 2.0 + 2.0 * PI * i as f64 / n as f64;
            mol.add_atom(Atom::new(Element::C).at(radius * angle.cos(), radius * angle.sin()))
        })
        .collect();
    for i in 0..n {
        mol.add_bond(atoms[i], atoms[(i + 1) % n], Bond::single());
    }
    Some(mol)
}

/// Six-membered ring with alternating double bonds.
pub fn benzene(bond_length: f64) -> Mol<Atom, Bond> {
    let mut mol = Mol::new();
    let radius = bond_length;
    let atoms: Vec<NodeIndex> = (0..6)
        .map(|i| {
            let angle = -PI / 2.0 + PI * i as f64 / 3.0;
            mol.add_atom(Atom::new(Element::C).at(radius * angle.cos(), radius * angle.sin()))
        })
        .collect();
    for i in 0..6 {
        let bond = if i % 2 == 0 { Bond::double() } else { Bond::single() };
        mol.add_bond(atoms[i], atoms[(i + 1) % 6], bond);
    }
    mol
}

pub fn cyclopentane() -> Mol<Atom, Bond> {
    named_ring(5)
}

pub fn cyclohexane() -> Mol<Atom, Bond> {
    named_ring(6)
}

pub fn cycloheptane() -> Mol<Atom, Bond> {
    named_ring(7)
}

fn named_ring(n: usize) -> Mol<Atom, Bond> {
    ring(n, DEFAULT_BOND_LENGTH).unwrap_or_default()
}
