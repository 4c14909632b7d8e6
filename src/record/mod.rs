//! Persistence record for the editor's documents.
//!
//! The record is a flat list of atoms and a list of bonds that point into
//! it by 0-based index:
//!
//! ```json
//! {"atoms": [{"x": 0, "y": 0, "element": "C", "charge": 0}],
//!  "bonds": [{"atom1": 0, "atom2": 1, "order": 1}]}
//! ```

pub mod error;

use std::collections::HashMap;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::atom::Atom;
use crate::bond::{Bond, BondOrder};
use crate::element::Element;
use crate::mol::Mol;
pub use error::{BondRecordError, RecordError, SkippedBond};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MolRecord {
    pub atoms: Vec<AtomRecord>,
    pub bonds: Vec<BondRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomRecord {
    pub x: i64,
    pub y: i64,
    pub element: String,
    #[serde(default)]
    pub charge: i8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondRecord {
    pub atom1: i64,
    pub atom2: i64,
    pub order: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub atoms: usize,
    pub bonds: usize,
    pub skipped: Vec<SkippedBond>,
}

/// Snapshot of `mol` in creation order. Positions are rounded to the
/// nearest integer.
pub fn dump(mol: &Mol<Atom, Bond>) -> MolRecord {
    let index: HashMap<NodeIndex, usize> = mol.atoms().enumerate().map(|(i, a)| (a, i)).collect();

    let atoms = mol
        .atoms()
        .map(|idx| {
            let atom = mol.atom(idx);
            AtomRecord {
                x: atom.position[0].round() as i64,
                y: atom.position[1].round() as i64,
                element: atom.element.symbol().to_string(),
                charge: atom.charge,
            }
        })
        .collect();

    let bonds = mol
        .bonds()
        .filter_map(|e| {
            let (a, b) = mol.bond_endpoints(e)?;
            Some(BondRecord {
                atom1: *index.get(&a)? as i64,
                atom2: *index.get(&b)? as i64,
                order: mol.bond(e).order.valence() as i64,
            })
        })
        .collect();

    MolRecord { atoms, bonds }
}

/// Replaces the contents of `mol` with `record`.
///
/// Every element symbol is checked before anything changes. Bonds that
/// cannot be built are skipped and listed in the report.
pub fn parse(mol: &mut Mol<Atom, Bond>, record: &MolRecord) -> Result<ParseReport, RecordError> {
    let elements = record
        .atoms
        .iter()
        .enumerate()
        .map(|(index, a)| {
            a.element
                .parse::<Element>()
                .map_err(|_| RecordError::UnknownElement {
                    index,
                    symbol: a.element.clone(),
                })
        })
        .collect::<Result<Vec<Element>, _>>()?;

    mol.clear();
    let atoms: Vec<NodeIndex> = record
        .atoms
        .iter()
        .zip(elements)
        .map(|(a, element)| {
            mol.add_atom(Atom::new(element).with_charge(a.charge).at(a.x as f64, a.y as f64))
        })
        .collect();

    let mut report = ParseReport {
        atoms: atoms.len(),
        ..Default::default()
    };
    for (index, b) in record.bonds.iter().enumerate() {
        match resolve_bond(mol, &atoms, b) {
            Ok((a1, a2, order)) => {
                mol.add_bond(a1, a2, Bond::new(order));
                report.bonds += 1;
            }
            Err(reason) => {
                warn!(index, %reason, "skipping bond record");
                report.skipped.push(SkippedBond { index, reason });
            }
        }
    }

    debug!(
        atoms = report.atoms,
        bonds = report.bonds,
        skipped = report.skipped.len(),
        "parsed molecule record"
    );
    Ok(report)
}

fn resolve_bond(
    mol: &Mol<Atom, Bond>,
    atoms: &[NodeIndex],
    b: &BondRecord,
) -> Result<(NodeIndex, NodeIndex, BondOrder), BondRecordError> {
    let lookup = |atom: i64| {
        usize::try_from(atom)
            .ok()
            .and_then(|i| atoms.get(i).copied())
            .ok_or(BondRecordError::DanglingReference { atom })
    };
    let a1 = lookup(b.atom1)?;
    let a2 = lookup(b.atom2)?;
    if a1 == a2 {
        return Err(BondRecordError::SelfBond);
    }
    let order =
        BondOrder::try_from(b.order).map_err(|e| BondRecordError::InvalidOrder { order: e.0 })?;
    if mol.bond_between(a1, a2).is_some() {
        return Err(BondRecordError::DuplicateBond);
    }
    Ok((a1, a2, order))
}

pub fn to_json(mol: &Mol<Atom, Bond>) -> Result<String, RecordError> {
    Ok(serde_json::to_string(&dump(mol))?)
}

pub fn from_json(mol: &mut Mol<Atom, Bond>, json: &str) -> Result<ParseReport, RecordError> {
    let record: MolRecord = serde_json::from_str(json)?;
    parse(mol, &record)
}
