/// Failures that abort a record parse. The molecule is left untouched.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("atom {index}: unsupported element symbol '{symbol}'")]
    UnknownElement { index: usize, symbol: String },
    #[error("malformed record JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a single bond record was skipped. Never aborts a parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BondRecordError {
    /// The bond names an atom index outside the record's atom list.
    #[error("bond references atom {atom}, which is not in the record")]
    DanglingReference { atom: i64 },
    #[error("bond order {order} is not 1, 2 or 3")]
    InvalidOrder { order: i64 },
    #[error("bond joins an atom to itself")]
    SelfBond,
    #[error("the two atoms are already bonded")]
    DuplicateBond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedBond {
    /// Position of the bond in the record's bond list.
    pub index: usize,
    pub reason: BondRecordError,
}
