//! Feature table application: every feature kind splices alternative
//! branches into the graph while preserving its single source, single sink,
//! and acyclicity.

mod cleaved_peptide;
pub(crate) mod substitution;
mod terminal;
mod var_seq;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::entry::ProteinEntry;
use crate::error::EntryError;
use crate::graph::ProteinGraph;

pub use var_seq::parse_isoforms;

/// The feature kinds the graph builder understands.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub enum FeatureKind {
    /// Isoform specific sequence variation (alternative splicing and
    /// friends), resolved through the `ALTERNATIVE PRODUCTS` comment.
    VarSeq,
    /// Cleaved initiator methionine.
    InitMet,
    /// Cleaved signal peptide.
    Signal,
    /// A natural single position variant.
    Variant,
    /// An experimentally mutated position.
    Mutagen,
    /// A sequence conflict between literature reports.
    Conflict,
    /// A cleaved propeptide region.
    Propep,
    /// A mature cleaved peptide region.
    Peptide,
}

impl FeatureKind {
    /// All kinds, in application order.
    pub const ALL: [Self; 8] = [
        Self::VarSeq,
        Self::InitMet,
        Self::Signal,
        Self::Variant,
        Self::Mutagen,
        Self::Conflict,
        Self::Propep,
        Self::Peptide,
    ];

    /// The feature table label of this kind.
    pub const fn label(self) -> &'static str {
        match self {
            Self::VarSeq => "VAR_SEQ",
            Self::InitMet => "INIT_MET",
            Self::Signal => "SIGNAL",
            Self::Variant => "VARIANT",
            Self::Mutagen => "MUTAGEN",
            Self::Conflict => "CONFLICT",
            Self::Propep => "PROPEP",
            Self::Peptide => "PEPTIDE",
        }
    }
}

impl std::fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for FeatureKind {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.label() == s)
            .ok_or(())
    }
}

/// A one based, inclusive location within the canonical sequence.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Serialize, Deserialize,
)]
pub struct FeatureLocation {
    /// First affected position.
    pub start: u32,
    /// Last affected position.
    pub end: u32,
}

impl std::fmt::Display for FeatureLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}..{}", self.start, self.end)
        }
    }
}

/// One entry of the feature table.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Feature {
    /// The kind of the feature.
    pub kind: FeatureKind,
    /// Where the feature applies.
    pub location: FeatureLocation,
    /// The free text description (the `/note=` qualifier).
    pub description: String,
    /// The curated feature identifier (`/id=`, e.g. `VSP_000123`).
    pub id: Option<String>,
}

/// A feature origin tag carried on every edge of the branch a feature
/// introduced. Equality over all fields drives parallel edge collapsing.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Qualifier {
    /// The kind of the originating feature.
    pub kind: FeatureKind,
    /// The location of the originating feature.
    pub location: FeatureLocation,
    /// The description of the originating feature.
    pub description: String,
}

impl Qualifier {
    /// The tag for a feature.
    pub fn new(feature: &Feature) -> Self {
        Self {
            kind: feature.kind,
            location: feature.location,
            description: feature.description.clone(),
        }
    }
}

/// How many features of each kind were applied. `None` means the kind was
/// disabled for this run, `Some(0)` that it was enabled but absent.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct FeatureCounts {
    /// Number of isoforms named by the entry.
    pub isoforms: Option<usize>,
    /// Number of initiator methionine features (0 or 1 in practice).
    pub init_met: Option<usize>,
    /// Number of signal peptide features (0 or 1 in practice).
    pub signal: Option<usize>,
    /// Number of applied natural variants.
    pub variants: Option<usize>,
    /// Number of applied mutagenesis sites.
    pub mutagens: Option<usize>,
    /// Number of applied sequence conflicts.
    pub conflicts: Option<usize>,
    /// Number of applied propeptide regions.
    pub propeptides: Option<usize>,
    /// Number of applied mature peptide regions.
    pub peptides: Option<usize>,
}

/// Apply the feature table of an entry to its canonical graph. The order is
/// fixed: isoforms first (later kinds may reference isoform positions), then
/// the N terminal cleavage events, then the generic substitutions, then the
/// internal cleaved peptides.
///
/// # Errors
/// [`EntryError::FeatureResolution`] if a feature references positions the
/// graph does not contain or contradicts the sequence, and
/// [`EntryError::InputInvalid`] for malformed isoform comments. Both abort
/// the current entry only.
pub fn apply_features(
    graph: &mut ProteinGraph,
    entry: &ProteinEntry,
    enabled: &IndexSet<FeatureKind>,
) -> Result<FeatureCounts, EntryError> {
    let mut counts = FeatureCounts::default();
    let of_kind = |kind| {
        entry
            .features
            .iter()
            .filter(move |feature| feature.kind == kind)
    };

    if enabled.contains(&FeatureKind::VarSeq) {
        let var_seqs: Vec<&Feature> = of_kind(FeatureKind::VarSeq).collect();
        counts.isoforms = Some(if var_seqs.is_empty() {
            0
        } else {
            let (isoforms, number) =
                var_seq::parse_isoforms(&entry.comments, entry.primary_accession())?;
            var_seq::apply_isoforms(graph, &isoforms, &var_seqs)?;
            number
        });
    }

    let apply_kind = |graph: &mut ProteinGraph,
                          kind: FeatureKind,
                          apply: fn(&mut ProteinGraph, &Feature) -> Result<(), EntryError>|
     -> Result<Option<usize>, EntryError> {
        if !enabled.contains(&kind) {
            return Ok(None);
        }
        let mut applied = 0;
        for feature in of_kind(kind) {
            apply(graph, feature)?;
            applied += 1;
        }
        Ok(Some(applied))
    };

    counts.init_met = apply_kind(graph, FeatureKind::InitMet, terminal::apply_init_met)?;
    counts.signal = apply_kind(graph, FeatureKind::Signal, terminal::apply_signal)?;
    counts.variants =
        apply_kind(graph, FeatureKind::Variant, substitution::apply_substitution)?;
    counts.mutagens =
        apply_kind(graph, FeatureKind::Mutagen, substitution::apply_substitution)?;
    counts.conflicts =
        apply_kind(graph, FeatureKind::Conflict, substitution::apply_substitution)?;
    counts.propeptides = apply_kind(
        graph,
        FeatureKind::Propep,
        cleaved_peptide::apply_cleaved_peptide,
    )?;
    counts.peptides = apply_kind(
        graph,
        FeatureKind::Peptide,
        cleaved_peptide::apply_cleaved_peptide,
    )?;

    Ok(counts)
}

/// The replacement a substitution style description encodes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Replacement {
    /// The region is deleted outright.
    Missing,
    /// The region is replaced by one or more alternatives.
    Substitution {
        /// The residues the description claims to replace.
        original: String,
        /// The alternative residue runs (more than one for `C->A,S` style
        /// mutagenesis notes). An empty run is a deletion.
        alternatives: Vec<String>,
    },
}

impl Replacement {
    /// Parse a feature description of the forms `Missing`, `A -> B`,
    /// `AB -> CDE (in isoform 2)` or `C->A,S: some effect`.
    pub(crate) fn parse(description: &str) -> Option<Self> {
        let text = description.trim();
        if text.starts_with("Missing") {
            return Some(Self::Missing);
        }
        let (left, right) = text.split_once("->")?;
        let original: String = left.split_whitespace().collect();
        let tail = right
            .split(['(', ':'])
            .next()
            .unwrap_or(right);
        let alternatives: Vec<String> = tail
            .split(',')
            .map(|alternative| alternative.split_whitespace().collect::<String>())
            .collect();
        if original.chars().any(|c| !c.is_ascii_uppercase())
            || alternatives
                .iter()
                .any(|a| a.chars().any(|c| !c.is_ascii_uppercase()))
            || alternatives.iter().all(String::is_empty)
        {
            return None;
        }
        Some(Self::Substitution {
            original,
            alternatives,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_round_trip_through_their_labels() {
        for kind in FeatureKind::ALL {
            assert_eq!(kind.label().parse::<FeatureKind>(), Ok(kind));
        }
        assert!("CHAIN".parse::<FeatureKind>().is_err());
    }

    #[test]
    fn replacement_parsing_understands_the_curated_forms() {
        assert_eq!(
            Replacement::parse("Missing (in isoform 2)"),
            Some(Replacement::Missing)
        );
        assert_eq!(
            Replacement::parse("K -> R (in dbSNP:rs12345)"),
            Some(Replacement::Substitution {
                original: "K".to_string(),
                alternatives: vec!["R".to_string()],
            })
        );
        assert_eq!(
            Replacement::parse("C->A,S: Abolishes activity"),
            Some(Replacement::Substitution {
                original: "C".to_string(),
                alternatives: vec!["A".to_string(), "S".to_string()],
            })
        );
        assert_eq!(
            Replacement::parse("MADE -> MG (in isoform 3)"),
            Some(Replacement::Substitution {
                original: "MADE".to_string(),
                alternatives: vec!["MG".to_string()],
            })
        );
        assert_eq!(Replacement::parse("no arrow here"), None);
    }
}
