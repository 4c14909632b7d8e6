pub mod atom;
pub mod bond;
pub mod canonical;
pub mod element;
pub mod formula;
pub mod graph_ops;
pub mod mol;
pub mod record;
pub mod smiles;
pub mod templates;
pub mod traits;
pub mod unify;
pub mod valence;

pub use atom::Atom;
pub use bond::{Bond, BondOrder, InvalidBondOrder};
pub use canonical::{canonical_ranking, canonical_ranking_with, CanonError, RankOptions, Ranking};
pub use element::{Element, UnknownElement};
pub use formula::{average_mol_weight, mol_formula};
pub use graph_ops::{connected_components, is_ring_bond, renumber_atoms, RenumberError};
pub use mol::{Detached, Mol};
pub use record::{BondRecordError, MolRecord, ParseReport, RecordError};
pub use smiles::{to_canonical_smiles, to_canonical_smiles_with, to_canonical_string};
pub use traits::{HasAtomicNum, HasBondOrder, HasElement, HasFormalCharge, HasPosition2D};
pub use unify::{UnifyOptions, UnifyReport, DEFAULT_MERGE_TOLERANCE};
pub use valence::{check_valence, implicit_hydrogens, OverbondedAtom};
