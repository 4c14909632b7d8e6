use serde::Deserialize;

use molsketch::record::{dump, parse, MolRecord};
use molsketch::{to_canonical_smiles, Atom, Bond, Mol};

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct CanonicalEntry {
    name: String,
    record: MolRecord,
    smiles: Vec<String>,
}

fn load() -> Vec<CanonicalEntry> {
    serde_json::from_str(include_str!("approval_data/canonical.json")).unwrap()
}

fn build(entry: &CanonicalEntry) -> Mol<Atom, Bond> {
    let mut mol = Mol::new();
    let report = parse(&mut mol, &entry.record)
        .unwrap_or_else(|e| panic!("{}: record rejected: {e}", entry.name));
    assert!(report.skipped.is_empty(), "{}: skipped bonds {:?}", entry.name, report.skipped);
    mol
}

fn report_failures(kind: &str, failures: Vec<String>) {
    if !failures.is_empty() {
        panic!(
            "{kind}: {} failures:\n{}",
            failures.len(),
            failures.join("\n")
        );
    }
}

// ---------------------------------------------------------------------------
// 1. Canonical strings
// ---------------------------------------------------------------------------

#[test]
fn approval_canonical_smiles() {
    let mut failures = Vec::new();
    for entry in &load() {
        let mol = build(entry);
        match to_canonical_smiles(&mol) {
            Ok(got) if got == entry.smiles => {}
            Ok(got) => failures.push(format!(
                "[smiles] {}: expected {:?}, got {:?}",
                entry.name, entry.smiles, got
            )),
            Err(e) => failures.push(format!("[smiles] {}: {e}", entry.name)),
        }
    }
    report_failures("canonical smiles", failures);
}

// ---------------------------------------------------------------------------
// 2. Persistence round trip
// ---------------------------------------------------------------------------

#[test]
fn approval_record_round_trip() {
    let mut failures = Vec::new();
    for entry in &load() {
        let mol = build(entry);
        let dumped = dump(&mol);
        if dumped != entry.record {
            failures.push(format!("[dump] {}: record changed on round trip", entry.name));
        }

        let mut again = Mol::new();
        if let Err(e) = parse(&mut again, &dumped) {
            failures.push(format!("[parse] {}: {e}", entry.name));
            continue;
        }
        if again != mol {
            failures.push(format!("[parse] {}: molecule changed on round trip", entry.name));
        }
    }
    report_failures("record round trip", failures);
}

#[test]
fn approval_json_text_round_trip() {
    for entry in &load() {
        let mol = build(entry);
        let json = molsketch::record::to_json(&mol).unwrap();
        let mut again = Mol::new();
        molsketch::record::from_json(&mut again, &json).unwrap();
        assert_eq!(
            to_canonical_smiles(&again).unwrap(),
            entry.smiles,
            "{}: canonical form changed after JSON round trip",
            entry.name
        );
    }
}
