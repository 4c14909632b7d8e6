use std::collections::HashSet;

use molsketch::graph_ops::translate;
use molsketch::templates::{benzene, cyclopentane, ring, DEFAULT_BOND_LENGTH};
use molsketch::{Atom, Bond, Element, Mol, UnifyOptions};

struct Xorshift64(u64);

impl Xorshift64 {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    /// Grid coordinate so that atoms land exactly on top of each other
    /// often enough to exercise merging.
    fn coord(&mut self) -> f64 {
        (self.next() % 5) as f64 * 20.0
    }
}

fn random_fragment(rng: &mut Xorshift64, atoms: usize) -> Mol<Atom, Bond> {
    let mut mol = Mol::new();
    let idx: Vec<_> = (0..atoms)
        .map(|_| mol.add_atom(Atom::new(Element::C).at(rng.coord(), rng.coord())))
        .collect();
    for w in idx.windows(2) {
        mol.add_bond(w[0], w[1], Bond::single());
    }
    if atoms > 2 && rng.next() % 2 == 0 {
        mol.add_bond(idx[0], idx[atoms - 1], Bond::double());
    }
    mol
}

fn assert_simple_graph(mol: &Mol<Atom, Bond>, context: &str) {
    let mut seen = HashSet::new();
    for e in mol.bonds() {
        let (a, b) = mol.bond_endpoints(e).unwrap();
        assert_ne!(a, b, "{context}: self bond");
        let key = (a.index().min(b.index()), a.index().max(b.index()));
        assert!(seen.insert(key), "{context}: duplicate bond {key:?}");
    }
}

#[test]
fn no_duplicate_or_self_bonds_after_random_merges() {
    let mut rng = Xorshift64(0x1234_5678_9ABC_DEF0);
    let options = UnifyOptions::default();
    for round in 0..200 {
        let mut mol = Mol::new();
        mol.unify(random_fragment(&mut rng, 4), &options);
        for step in 0..5 {
            let size = 2 + (rng.next() % 4) as usize;
            let fragment = random_fragment(&mut rng, size);
            mol.unify(fragment, &options);
            assert_simple_graph(&mol, &format!("round {round} step {step}"));
        }
    }
}

#[test]
fn merging_a_coincident_atom_never_grows_the_molecule() {
    let mut mol = benzene(DEFAULT_BOND_LENGTH);
    let positions: Vec<[f64; 2]> = mol.atoms().map(|a| mol.atom(a).position).collect();
    for [x, y] in positions {
        let mut single = Mol::new();
        single.add_atom(Atom::new(Element::O).at(x + 1.0, y - 1.0));
        let before = mol.atom_count();
        let report = mol.unify(single, &UnifyOptions::default());
        assert_eq!(mol.atom_count(), before);
        assert_eq!(report.merged_atoms, 1);
    }
}

#[test]
fn unifying_a_copy_onto_itself_is_a_no_op() {
    let mut mol = cyclopentane();
    let copy = mol.clone();
    let report = mol.unify(copy, &UnifyOptions::default());
    assert_eq!(report.merged_atoms, 5);
    assert_eq!(report.added_atoms, 0);
    assert_eq!(report.added_bonds, 0);
    assert_eq!(report.dropped_bonds, 5);
    assert_eq!(mol, cyclopentane());
}

#[test]
fn spiro_fusion_shares_one_atom() {
    let mut mol = cyclopentane();
    let mut other = ring(5, DEFAULT_BOND_LENGTH).unwrap();
    // move the copy so its first atom lands on the fourth atom of the first ring
    let anchor = mol.atoms().nth(3).map(|a| mol.atom(a).position).unwrap();
    let top = other.atoms().next().map(|a| other.atom(a).position).unwrap();
    translate(&mut other, anchor[0] - top[0], anchor[1] - top[1]);

    let report = mol.unify(other, &UnifyOptions::default());
    assert_eq!(report.merged_atoms, 1);
    assert_eq!(mol.atom_count(), 9);
    assert_eq!(mol.bond_count(), 10);
    assert_simple_graph(&mol, "spiro");
}

#[test]
fn dragging_a_bond_end_and_dropping_it_back_is_a_no_op() {
    let mut mol = benzene(DEFAULT_BOND_LENGTH);
    let expected = molsketch::to_canonical_string(&mol).unwrap();
    let grabbed = mol.atoms().nth(1).unwrap();
    let mut popped = mol.detach_with_neighbours(grabbed).unwrap();
    assert_eq!(mol.atom_count(), 3);

    popped.translate(2.0, -1.0);
    let report = mol.unify(popped.fragment, &UnifyOptions::default());
    assert_eq!(report.added_atoms, 3);
    assert_eq!(mol.atom_count(), 6);
    assert_eq!(mol.bond_count(), 6);
    assert_simple_graph(&mol, "drag back");
    assert_eq!(molsketch::to_canonical_string(&mol).unwrap(), expected);
}

#[test]
fn detach_and_reunify_restores_connectivity() {
    let mut mol = benzene(DEFAULT_BOND_LENGTH);
    let victim = mol.atoms().nth(2).unwrap();
    let popped = mol.detach_atom(victim).unwrap();
    assert_eq!(mol.atom_count(), 5);
    assert_eq!(mol.bond_count(), 4);

    let report = mol.unify(popped.fragment, &UnifyOptions::default());
    assert_eq!(report.merged_atoms, 2);
    assert_eq!(report.added_atoms, 1);
    assert_eq!(report.added_bonds, 2);
    assert_eq!(mol.atom_count(), 6);
    assert_eq!(mol.bond_count(), 6);
    assert_eq!(
        molsketch::to_canonical_string(&mol).unwrap(),
        molsketch::to_canonical_string(&benzene(DEFAULT_BOND_LENGTH)).unwrap()
    );
}
