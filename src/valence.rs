use petgraph::graph::NodeIndex;
use tracing::debug;

use crate::element::Element;
use crate::mol::Mol;
use crate::traits::{HasBondOrder, HasElement, HasFormalCharge};

/// An atom carrying more bond order than its element and charge allow.
///
/// This is a diagnostic, not a failure: over-bonded atoms still get a
/// canonical rank and a label. Renderers use it to flag the atom.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("atom {} ({element}{}): bond order sum {bond_order_sum} exceeds available valence by {excess}", .atom_idx.index(), charge_suffix(.charge))]
pub struct OverbondedAtom {
    pub atom_idx: NodeIndex,
    pub element: Element,
    pub charge: i8,
    pub bond_order_sum: u8,
    pub excess: u8,
}

fn charge_suffix(charge: &i8) -> String {
    match *charge {
        0 => String::new(),
        c if c > 0 => format!("{c:+}"),
        c => format!("{c}"),
    }
}

pub fn bond_order_sum<A, B: HasBondOrder>(mol: &Mol<A, B>, atom: NodeIndex) -> u8 {
    mol.bonds_of(atom)
        .map(|e| mol.bond(e).bond_order().valence())
        .fold(0u8, |acc, v| acc.saturating_add(v))
}

/// Valence left for hydrogens once charge is applied.
///
/// The charge shifts the nominal valence; past four the shell fills up,
/// so the value is mirrored as `8 - v`.
fn charged_valence(element: Element, charge: i8) -> i16 {
    let v = element.nominal_valence() as i16 + charge as i16;
    if v > 4 {
        8 - v
    } else {
        v
    }
}

/// Implicit hydrogen count before validation. Negative means the atom
/// is over-bonded; the canonical invariant uses this raw value.
pub fn raw_hydrogen_count<A, B>(mol: &Mol<A, B>, atom: NodeIndex) -> i8
where
    A: HasElement + HasFormalCharge,
    B: HasBondOrder,
{
    let a = mol.atom(atom);
    let element = a.element();
    let charge = a.formal_charge();
    let bonded = bond_order_sum(mol, atom);
    let count = charged_valence(element, charge) - bonded as i16;
    if count < 0 && charge == 0 && element.default_valences().contains(&bonded) {
        return 0;
    }
    count.clamp(i8::MIN as i16, i8::MAX as i16) as i8
}

pub fn implicit_hydrogens<A, B>(mol: &Mol<A, B>, atom: NodeIndex) -> Result<u8, OverbondedAtom>
where
    A: HasElement + HasFormalCharge,
    B: HasBondOrder,
{
    let count = raw_hydrogen_count(mol, atom);
    if count >= 0 {
        return Ok(count as u8);
    }
    let a = mol.atom(atom);
    Err(OverbondedAtom {
        atom_idx: atom,
        element: a.element(),
        charge: a.formal_charge(),
        bond_order_sum: bond_order_sum(mol, atom),
        excess: count.unsigned_abs(),
    })
}

pub fn check_valence<A, B>(mol: &Mol<A, B>) -> Result<(), Vec<OverbondedAtom>>
where
    A: HasElement + HasFormalCharge,
    B: HasBondOrder,
{
    let errors: Vec<OverbondedAtom> = mol
        .atoms()
        .filter_map(|idx| implicit_hydrogens(mol, idx).err())
        .inspect(|e| debug!(atom = e.atom_idx.index(), excess = e.excess, "over-bonded atom"))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Atom;
    use crate::bond::Bond;

    fn star(center: Atom, arms: &[Bond]) -> (Mol<Atom, Bond>, NodeIndex) {
        let mut mol = Mol::new();
        let c = mol.add_atom(center);
        for bond in arms {
            let arm = mol.add_atom(Atom::new(Element::C));
            mol.add_bond(c, arm, bond.clone());
        }
        (mol, c)
    }

    #[test]
    fn methane() {
        let (mol, c) = star(Atom::new(Element::C), &[]);
        assert_eq!(implicit_hydrogens(&mol, c), Ok(4));
    }

    #[test]
    fn ethene_carbon() {
        let (mol, c) = star(Atom::new(Element::C), &[Bond::double()]);
        assert_eq!(implicit_hydrogens(&mol, c), Ok(2));
        assert_eq!(bond_order_sum(&mol, c), 2);
    }

    #[test]
    fn ammonium_nitrogen() {
        let (mol, n) = star(Atom::new(Element::N).with_charge(1), &[Bond::single()]);
        assert_eq!(implicit_hydrogens(&mol, n), Ok(3));
    }

    #[test]
    fn carbocation_mirrors_past_four() {
        let (mol, c) = star(Atom::new(Element::C).with_charge(1), &[]);
        assert_eq!(implicit_hydrogens(&mol, c), Ok(3));
    }

    #[test]
    fn oxide_anion() {
        let (mol, o) = star(Atom::new(Element::O).with_charge(-1), &[Bond::single()]);
        assert_eq!(implicit_hydrogens(&mol, o), Ok(0));
    }

    #[test]
    fn hypervalent_sulfur_is_clamped() {
        let (mol, s) = star(
            Atom::new(Element::S),
            &[Bond::double(), Bond::double(), Bond::single(), Bond::single()],
        );
        assert_eq!(implicit_hydrogens(&mol, s), Ok(0));
        assert!(check_valence(&mol).is_ok());
    }

    #[test]
    fn pentavalent_nitrogen_is_clamped() {
        let (mol, n) = star(Atom::new(Element::N), &[Bond::double(), Bond::triple()]);
        assert_eq!(raw_hydrogen_count(&mol, n), 0);
    }

    #[test]
    fn pentavalent_carbon_is_overbonded() {
        let (mol, c) = star(
            Atom::new(Element::C),
            &[Bond::double(), Bond::double(), Bond::single()],
        );
        assert_eq!(raw_hydrogen_count(&mol, c), -1);
        let err = implicit_hydrogens(&mol, c).unwrap_err();
        assert_eq!(err.excess, 1);
        assert_eq!(err.bond_order_sum, 5);
        let errs = check_valence(&mol).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].atom_idx, c);
    }

    #[test]
    fn charged_hypervalent_is_not_clamped() {
        let (mol, s) = star(
            Atom::new(Element::S).with_charge(1),
            &[Bond::double(), Bond::double()],
        );
        assert!(implicit_hydrogens(&mol, s).is_err());
    }

    #[test]
    fn diagnostic_message() {
        let (mol, c) = star(
            Atom::new(Element::C).with_charge(-1),
            &[Bond::triple(), Bond::single()],
        );
        let err = implicit_hydrogens(&mol, c).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("atom {} (C-1): bond order sum 4 exceeds available valence by 1", c.index())
        );
    }
}
