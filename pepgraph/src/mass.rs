//! Residue masses and the weight scalar used on graph edges.
//!
//! The table is parameterised by a scalar kind: integer weights are the
//! floating point residue masses multiplied by a scale factor and rounded to
//! an integer exactly once, which makes sums exact and hashable; float
//! weights use double precision directly and ignore the factor.

use std::ops::Add;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// The mode of mass to use
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Debug, Serialize, Deserialize,
)]
pub enum MassMode {
    /// Monoisotopic mass, uses the base isotope for every element
    #[default]
    Monoisotopic,
    /// The average weight over all naturally occurring isotopes
    Average,
}

impl std::fmt::Display for MassMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Monoisotopic => write!(f, "monoisotopic mass"),
            Self::Average => write!(f, "average weight"),
        }
    }
}

/// The scalar kind of the mass table
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Debug, Serialize, Deserialize,
)]
pub enum MassKind {
    /// Scaled integer masses, exact under addition
    #[default]
    Int,
    /// Plain double precision masses
    Float,
}

/// A single edge weight. All weights of one graph share the same variant
/// because the mass table is fixed for the whole run, so the mixed cases in
/// the arithmetic below are never taken in practice.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub enum Weight {
    /// A mass multiplied by the table's scale factor and rounded once
    Int(i64),
    /// A plain double precision mass
    Float(OrderedFloat<f64>),
}

impl Weight {
    /// The zero weight for the given scalar kind.
    pub const fn zero(kind: MassKind) -> Self {
        match kind {
            MassKind::Int => Self::Int(0),
            MassKind::Float => Self::Float(OrderedFloat(0.0)),
        }
    }

    /// This weight as a plain float, undoing no scaling.
    pub fn to_f64(self) -> f64 {
        match self {
            Self::Int(value) => value as f64,
            Self::Float(value) => value.0,
        }
    }
}

impl Add for Weight {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::Int(a), Self::Int(b)) => Self::Int(a + b),
            (Self::Float(a), Self::Float(b)) => Self::Float(a + b),
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => {
                Self::Float(OrderedFloat(a as f64) + b)
            }
        }
    }
}

impl std::fmt::Display for Weight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
        }
    }
}

/// Monoisotopic and average residue masses in Dalton for the full 26 letter
/// alphabet. The ambiguity codes carry the mean of their candidates (B for
/// N/D, Z for Q/E), J the shared Leu/Ile mass, and X contributes nothing.
const RESIDUE_MASSES: [(u8, f64, f64); 26] = [
    (b'A', 71.037114, 71.0788),
    (b'B', 114.534935, 114.5962),
    (b'C', 103.009185, 103.1388),
    (b'D', 115.026943, 115.0886),
    (b'E', 129.042593, 129.1155),
    (b'F', 147.068414, 147.1766),
    (b'G', 57.021464, 57.0519),
    (b'H', 137.058912, 137.1411),
    (b'I', 113.084064, 113.1594),
    (b'J', 113.084064, 113.1594),
    (b'K', 128.094963, 128.1741),
    (b'L', 113.084064, 113.1594),
    (b'M', 131.040485, 131.1926),
    (b'N', 114.042927, 114.1038),
    (b'O', 237.147727, 237.3018),
    (b'P', 97.052764, 97.1167),
    (b'Q', 128.058578, 128.1307),
    (b'R', 156.101111, 156.1875),
    (b'S', 87.032028, 87.0782),
    (b'T', 101.047679, 101.1051),
    (b'U', 150.953636, 150.0379),
    (b'V', 99.068414, 99.1326),
    (b'W', 186.079313, 186.2132),
    (b'X', 0.0, 0.0),
    (b'Y', 163.063329, 163.1760),
    (b'Z', 128.550586, 128.6231),
];

/// The residue to mass map for one run, constructed once per worker from the
/// immutable configuration and freely shared afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct MassTable {
    kind: MassKind,
    factor: f64,
    monoisotopic: [Weight; 26],
    average: [Weight; 26],
}

impl MassTable {
    /// The default scale factor for integer mass tables.
    pub const DEFAULT_FACTOR: f64 = 1_000_000_000.0;

    /// Build the table for the given scalar kind. The factor only applies to
    /// [`MassKind::Int`] tables. A scaled mass that does not round cleanly is
    /// logged and rounded, it never fails the run.
    pub fn new(kind: MassKind, factor: f64) -> Self {
        let mut monoisotopic = [Weight::zero(kind); 26];
        let mut average = [Weight::zero(kind); 26];
        for (residue, mono, avrg) in RESIDUE_MASSES {
            let index = usize::from(residue - b'A');
            monoisotopic[index] = Self::scale(kind, factor, residue, mono);
            average[index] = Self::scale(kind, factor, residue, avrg);
        }
        Self {
            kind,
            factor,
            monoisotopic,
            average,
        }
    }

    fn scale(kind: MassKind, factor: f64, residue: u8, mass: f64) -> Weight {
        match kind {
            MassKind::Int => {
                let scaled = mass * factor;
                if (scaled - scaled.round()).abs() > f64::EPSILON * scaled.abs() {
                    log::warn!(
                        "mass of residue {} times factor {factor} is not integral ({scaled}), rounding",
                        char::from(residue)
                    );
                }
                Weight::Int(scaled.round() as i64)
            }
            MassKind::Float => Weight::Float(OrderedFloat(mass)),
        }
    }

    /// The scalar kind this table was built with.
    pub const fn kind(&self) -> MassKind {
        self.kind
    }

    /// The scale factor this table was built with.
    pub const fn factor(&self) -> f64 {
        self.factor
    }

    /// The mass of a single residue, or None for a letter outside the
    /// alphabet.
    pub fn residue(&self, residue: u8, mode: MassMode) -> Option<Weight> {
        residue.is_ascii_uppercase().then(|| {
            let index = usize::from(residue - b'A');
            match mode {
                MassMode::Monoisotopic => self.monoisotopic[index],
                MassMode::Average => self.average[index],
            }
        })
    }

    /// The summed mass of a residue run (a merged node's `aminoacid`), or
    /// None if any letter falls outside the alphabet.
    pub fn run(&self, residues: &str, mode: MassMode) -> Option<Weight> {
        residues
            .bytes()
            .map(|residue| self.residue(residue, mode))
            .try_fold(Weight::zero(self.kind), |sum, mass| Some(sum + mass?))
    }
}
