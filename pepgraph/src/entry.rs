//! The protein entry record handed from the reader to the graph workers.

use serde::{Deserialize, Serialize};

use crate::error::EntryError;
use crate::features::Feature;

/// One curated protein entry as delivered by the flat file reader.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ProteinEntry {
    /// All accessions, the first one is primary. Never empty for a validated
    /// entry.
    pub accessions: Vec<String>,
    /// The display name of the entry (the `ID` line).
    pub entry_name: String,
    /// The full description text (`DE` lines).
    pub description: String,
    /// The residue sequence, uppercase letters only.
    pub sequence: String,
    /// All sequence features of the kinds the graph builder understands.
    pub features: Vec<Feature>,
    /// Free text comment blocks, used by isoform resolution.
    pub comments: Vec<String>,
}

impl ProteinEntry {
    /// The primary accession.
    ///
    /// # Panics
    /// If the entry was never [validated](Self::validate) and carries no
    /// accession at all.
    pub fn primary_accession(&self) -> &str {
        &self.accessions[0]
    }

    /// Check the reader contract: at least one accession, a sequence over
    /// the 26 letter alphabet, and feature locations inside the sequence.
    pub fn validate(&self) -> Result<(), EntryError> {
        if self.accessions.is_empty() {
            return Err(EntryError::InputInvalid {
                reason: format!("entry {} has no accession", self.entry_name),
            });
        }
        if let Some(residue) = self.sequence.chars().find(|c| !c.is_ascii_uppercase()) {
            return Err(EntryError::InputInvalid {
                reason: format!("residue {residue:?} outside the alphabet"),
            });
        }
        let length = self.sequence.len() as u32;
        for feature in &self.features {
            let location = feature.location;
            if location.start == 0 || location.end < location.start || location.end > length {
                return Err(EntryError::InputInvalid {
                    reason: format!(
                        "{} location {}..{} outside sequence of length {length}",
                        feature.kind, location.start, location.end
                    ),
                });
            }
        }
        Ok(())
    }

    /// The short protein name for the statistics output: the first segment
    /// of the description, stripped of its `RecName: Full=` style prefix.
    pub fn protein_name(&self) -> String {
        let segment = self
            .description
            .split(';')
            .next()
            .unwrap_or(&self.description);
        segment
            .find('=')
            .map_or(segment, |index| &segment[index + 1..])
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{Feature, FeatureKind, FeatureLocation};

    fn entry(sequence: &str) -> ProteinEntry {
        ProteinEntry {
            accessions: vec!["P12345".to_string()],
            entry_name: "TEST_HUMAN".to_string(),
            description: "RecName: Full=Test protein; AltName: Full=Other;".to_string(),
            sequence: sequence.to_string(),
            features: Vec::new(),
            comments: Vec::new(),
        }
    }

    #[test]
    fn valid_entry_passes() {
        assert!(entry("MKAP").validate().is_ok());
    }

    #[test]
    fn lowercase_residues_are_rejected() {
        assert!(matches!(
            entry("MkAP").validate(),
            Err(EntryError::InputInvalid { .. })
        ));
    }

    #[test]
    fn out_of_range_features_are_rejected() {
        let mut e = entry("MKAP");
        e.features.push(Feature {
            kind: FeatureKind::Variant,
            location: FeatureLocation { start: 2, end: 9 },
            description: "K -> R".to_string(),
            id: None,
        });
        assert!(matches!(
            e.validate(),
            Err(EntryError::InputInvalid { .. })
        ));
    }

    #[test]
    fn protein_name_strips_the_recname_prefix() {
        assert_eq!(entry("MK").protein_name(), "Test protein");
    }
}
