//! Molecular formula and molecular weight.
//!
//! [`mol_formula`] produces a Hill system string and
//! [`average_mol_weight`] the average molecular weight in daltons. Both
//! count implicit hydrogens; an over-bonded atom contributes none.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::element::HYDROGEN_WEIGHT;
use crate::mol::Mol;
use crate::traits::{HasBondOrder, HasElement, HasFormalCharge};
use crate::valence::raw_hydrogen_count;

fn hydrogens<A, B>(mol: &Mol<A, B>, idx: petgraph::graph::NodeIndex) -> u32
where
    A: HasElement + HasFormalCharge,
    B: HasBondOrder,
{
    raw_hydrogen_count(mol, idx).max(0) as u32
}

pub fn average_mol_weight<A, B>(mol: &Mol<A, B>) -> f64
where
    A: HasElement + HasFormalCharge,
    B: HasBondOrder,
{
    mol.atoms().fold(0.0, |acc, idx| {
        let h = hydrogens(mol, idx) as f64;
        acc + mol.atom(idx).element().atomic_weight() + h * HYDROGEN_WEIGHT
    })
}

/// Hill system formula: C first, then H, then the rest alphabetically.
/// Without carbon everything is alphabetical. Net charge is appended as
/// `+`, `2+`, `-`, `2-` and so on.
pub fn mol_formula<A, B>(mol: &Mol<A, B>) -> String
where
    A: HasElement + HasFormalCharge,
    B: HasBondOrder,
{
    let mut counts: BTreeMap<&'static str, u32> = BTreeMap::new();
    let mut net_charge: i32 = 0;

    for idx in mol.atoms() {
        let a = mol.atom(idx);
        *counts.entry(a.element().symbol()).or_default() += 1;
        let hc = hydrogens(mol, idx);
        if hc > 0 {
            *counts.entry("H").or_default() += hc;
        }
        net_charge += a.formal_charge() as i32;
    }

    let mut result = String::new();

    if let Some(c) = counts.remove("C") {
        append_element(&mut result, "C", c);
        if let Some(h) = counts.remove("H") {
            append_element(&mut result, "H", h);
        }
    }

    for (sym, count) in &counts {
        append_element(&mut result, sym, *count);
    }

    match net_charge {
        0 => {}
        1 => result.push('+'),
        -1 => result.push('-'),
        c if c > 0 => {
            let _ = write!(result, "{c}+");
        }
        c => {
            let _ = write!(result, "{}-", c.unsigned_abs());
        }
    }

    result
}

fn append_element(buf: &mut String, symbol: &str, count: u32) {
    buf.push_str(symbol);
    if count > 1 {
        let _ = write!(buf, "{count}");
    }
}
