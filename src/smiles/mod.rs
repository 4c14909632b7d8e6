//! Canonical SMILES-like output.
//!
//! Each connected component becomes one string. Branches are written in
//! parentheses in ascending rank, the highest-ranked neighbour continues
//! the chain, and bonds the traversal did not follow become numbered ring
//! closures.

mod writer;

pub use writer::write_ranked;

use crate::canonical::{canonical_ranking_with, CanonError, RankOptions};
use crate::mol::Mol;
use crate::traits::{HasBondOrder, HasElement, HasFormalCharge};

pub fn to_canonical_smiles<A, B>(mol: &Mol<A, B>) -> Result<Vec<String>, CanonError>
where
    A: HasElement + HasFormalCharge,
    B: HasBondOrder,
{
    to_canonical_smiles_with(mol, &RankOptions::default())
}

pub fn to_canonical_smiles_with<A, B>(
    mol: &Mol<A, B>,
    options: &RankOptions,
) -> Result<Vec<String>, CanonError>
where
    A: HasElement + HasFormalCharge,
    B: HasBondOrder,
{
    let ranking = canonical_ranking_with(mol, options)?;
    Ok(write_ranked(mol, &ranking))
}

/// All components joined with `.`.
pub fn to_canonical_string<A, B>(mol: &Mol<A, B>) -> Result<String, CanonError>
where
    A: HasElement + HasFormalCharge,
    B: HasBondOrder,
{
    Ok(to_canonical_smiles(mol)?.join("."))
}
