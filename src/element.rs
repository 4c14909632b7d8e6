/// Standard atomic weight of hydrogen, used for implicit hydrogens.
pub const HYDROGEN_WEIGHT: f64 = 1.008;

/// Elements that can be placed on the sketch.
///
/// Hydrogen is not a node; it is always derived from valence (see
/// [`crate::valence`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Element {
    C = 6,
    N = 7,
    O = 8,
    F = 9,
    S = 16,
    Cl = 17,
    Br = 35,
    I = 53,
}

const ALL: [Element; 8] = [
    Element::C,
    Element::N,
    Element::O,
    Element::F,
    Element::S,
    Element::Cl,
    Element::Br,
    Element::I,
];

impl Element {
    pub fn all() -> &'static [Element] {
        &ALL
    }

    pub fn from_atomic_num(n: u8) -> Option<Element> {
        ALL.iter().copied().find(|e| e.atomic_num() == n)
    }

    pub fn from_symbol(s: &str) -> Option<Element> {
        ALL.iter().copied().find(|e| e.symbol() == s)
    }

    pub fn atomic_num(self) -> u8 {
        self as u8
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Element::C => "C",
            Element::N => "N",
            Element::O => "O",
            Element::F => "F",
            Element::S => "S",
            Element::Cl => "Cl",
            Element::Br => "Br",
            Element::I => "I",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Element::C => "Carbon",
            Element::N => "Nitrogen",
            Element::O => "Oxygen",
            Element::F => "Fluorine",
            Element::S => "Sulphur",
            Element::Cl => "Chlorine",
            Element::Br => "Bromine",
            Element::I => "Iodine",
        }
    }

    pub fn atomic_weight(self) -> f64 {
        match self {
            Element::C => 12.011,
            Element::N => 14.007,
            Element::O => 15.999,
            Element::F => 18.998,
            Element::S => 32.06,
            Element::Cl => 35.45,
            Element::Br => 79.904,
            Element::I => 126.904,
        }
    }

    /// Allowed valences, lowest first. The first entry is the nominal
    /// valence used for implicit hydrogen counting.
    pub fn default_valences(self) -> &'static [u8] {
        match self {
            Element::C => &[4],
            Element::N => &[3, 5],
            Element::O => &[2],
            Element::S => &[2, 4, 6],
            Element::F | Element::Cl | Element::Br | Element::I => &[1],
        }
    }

    pub fn nominal_valence(self) -> u8 {
        self.default_valences()[0]
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

impl std::str::FromStr for Element {
    type Err = UnknownElement;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Element::from_symbol(s).ok_or_else(|| UnknownElement(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported element symbol '{0}'")]
pub struct UnknownElement(pub String);
