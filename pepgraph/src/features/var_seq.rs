//! Isoform application. The `ALTERNATIVE PRODUCTS` comment names every
//! isoform and the VAR_SEQ features realising it; applying an isoform adds a
//! complete alternative walk that shares all unmodified segments with the
//! canonical backbone.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use indexmap::IndexMap;
use regex::Regex;

use super::substitution::{feature_error, region_residues, resolve, splice_branch};
use super::{Feature, Qualifier, Replacement};
use crate::error::EntryError;
use crate::graph::{Node, ProteinGraph};

static ISOFORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"IsoId=([A-Za-z0-9]+-\d+)[^;]*;\s*Sequence=([^;]+);").unwrap()
});
static NAMED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Named isoforms=(\d+)").unwrap());

/// Parse the `ALTERNATIVE PRODUCTS` comment block into a map from isoform
/// accession to the VAR_SEQ feature identifiers realising it, in the order
/// the entry names them, together with the number of isoforms the entry
/// declares. The displayed isoform (the canonical sequence) and isoforms
/// described externally carry no features and are not part of the map.
///
/// # Errors
/// [`EntryError::InputInvalid`] if the comment is missing or does not
/// describe a single isoform.
pub fn parse_isoforms(
    comments: &[String],
    accession: &str,
) -> Result<(IndexMap<String, Vec<String>>, usize), EntryError> {
    let block = comments
        .iter()
        .find(|comment| comment.contains("ALTERNATIVE PRODUCTS"))
        .ok_or_else(|| EntryError::InputInvalid {
            reason: format!("{accession} has VAR_SEQ features but no ALTERNATIVE PRODUCTS comment"),
        })?;

    let mut isoforms = IndexMap::new();
    let mut seen = 0;
    for captures in ISOFORM.captures_iter(block) {
        seen += 1;
        let sequence = captures[2].trim();
        match sequence {
            "Displayed" | "External" | "Not described" => {}
            list => {
                isoforms.insert(
                    captures[1].to_string(),
                    list.split(',').map(|id| id.trim().to_string()).collect(),
                );
            }
        }
    }
    if seen == 0 {
        return Err(EntryError::InputInvalid {
            reason: format!("{accession} has a malformed isoform comment"),
        });
    }
    let number = NAMED
        .captures(block)
        .and_then(|captures| captures[1].parse().ok())
        .unwrap_or(seen);
    Ok((isoforms, number))
}

/// Apply every isoform of the map. Contiguous VAR_SEQ features of one
/// isoform (each ending right before the next starts) are realised as a
/// single alternative sub path, so one isoform contributes exactly one walk
/// per modified region. Vertices on the alternative sub paths carry the
/// isoform accession and their position within the isoform sequence.
pub(crate) fn apply_isoforms(
    graph: &mut ProteinGraph,
    isoforms: &IndexMap<String, Vec<String>>,
    features: &[&Feature],
) -> Result<(), EntryError> {
    let by_id: HashMap<&str, &Feature> = features
        .iter()
        .filter_map(|feature| feature.id.as_deref().map(|id| (id, *feature)))
        .collect();

    for (iso_id, vsp_ids) in isoforms {
        let mut parts = Vec::with_capacity(vsp_ids.len());
        for vsp in vsp_ids {
            let feature =
                by_id
                    .get(vsp.as_str())
                    .copied()
                    .ok_or_else(|| EntryError::InputInvalid {
                        reason: format!("isoform {iso_id} references unknown feature {vsp}"),
                    })?;
            parts.push(feature);
        }
        parts.sort_by_key(|feature| feature.location.start);
        for pair in parts.windows(2) {
            if pair[1].location.start <= pair[0].location.end {
                return Err(feature_error(
                    pair[1],
                    format!("overlaps an earlier VAR_SEQ of isoform {iso_id}"),
                ));
            }
        }

        let isoform_accession: Arc<str> = Arc::from(iso_id.as_str());
        let accession = Arc::clone(graph.accession());
        let mut offset: i64 = 0;
        let mut index = 0;
        while index < parts.len() {
            let mut last = index;
            while last + 1 < parts.len()
                && parts[last].location.end + 1 == parts[last + 1].location.start
            {
                last += 1;
            }
            let run = &parts[index..=last];
            index = last + 1;

            let start = run[0].location.start;
            let end = run[run.len() - 1].location.end;
            let mut replacement = String::new();
            for feature in run {
                match Replacement::parse(&feature.description) {
                    Some(Replacement::Missing) => {}
                    Some(Replacement::Substitution {
                        original,
                        alternatives,
                    }) => {
                        let actual = region_residues(graph, feature)?;
                        if !original.is_empty() && original != actual {
                            return Err(feature_error(
                                feature,
                                format!(
                                    "description replaces {original} but the sequence reads {actual}"
                                ),
                            ));
                        }
                        replacement.push_str(alternatives.first().map_or("", String::as_str));
                    }
                    None => {
                        return Err(feature_error(
                            feature,
                            "description does not encode a replacement",
                        ));
                    }
                }
            }

            let before = resolve(graph, run[0], start - 1)?;
            let after = resolve(graph, run[run.len() - 1], end + 1)?;
            let qualifiers: Vec<Qualifier> = run.iter().copied().map(Qualifier::new).collect();
            let base = i64::from(start) + offset;
            splice_branch(
                graph,
                before,
                after,
                &replacement,
                &qualifiers,
                |position, residue| {
                    Node::isoform(
                        residue,
                        &accession,
                        &isoform_accession,
                        (base + position as i64) as u32,
                    )
                },
            );
            offset += replacement.len() as i64 - i64::from(end - start + 1);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureKind, FeatureLocation};

    fn var_seq(start: u32, end: u32, description: &str, id: &str) -> Feature {
        Feature {
            kind: FeatureKind::VarSeq,
            location: FeatureLocation { start, end },
            description: description.to_string(),
            id: Some(id.to_string()),
        }
    }

    fn comments() -> Vec<String> {
        vec![
            "ALTERNATIVE PRODUCTS: Event=Alternative splicing; Named isoforms=2; \
             Name=1; IsoId=P12345-1; Sequence=Displayed; \
             Name=2; IsoId=P12345-2; Sequence=VSP_000001, VSP_000002;"
                .to_string(),
        ]
    }

    #[test]
    fn the_comment_block_names_the_isoforms() {
        let (isoforms, number) = parse_isoforms(&comments(), "P12345").unwrap();
        assert_eq!(number, 2);
        assert_eq!(isoforms.len(), 1);
        assert_eq!(
            isoforms["P12345-2"],
            vec!["VSP_000001".to_string(), "VSP_000002".to_string()]
        );
    }

    #[test]
    fn a_missing_comment_is_invalid_input() {
        assert!(matches!(
            parse_isoforms(&["nothing here".to_string()], "P12345"),
            Err(EntryError::InputInvalid { .. })
        ));
    }

    #[test]
    fn contiguous_features_become_one_alternative_sub_path() {
        let mut graph = ProteinGraph::canonical("ACDE", "P12345");
        let first = var_seq(2, 2, "C -> G (in isoform 2)", "VSP_000001");
        let second = var_seq(3, 3, "D -> H (in isoform 2)", "VSP_000002");
        let (isoforms, _) = parse_isoforms(&comments(), "P12345").unwrap();
        apply_isoforms(&mut graph, &isoforms, &[&first, &second]).unwrap();

        assert_eq!(graph.walk_sequences(), vec!["ACDE", "AGHE"]);
        let isoform_nodes: Vec<_> = graph
            .graph()
            .node_indices()
            .filter(|&node| graph.graph()[node].isoform_accession.is_some())
            .collect();
        assert_eq!(isoform_nodes.len(), 2);
        for node in isoform_nodes {
            let node = &graph.graph()[node];
            assert_eq!(node.isoform_accession.as_deref(), Some("P12345-2"));
            assert!(matches!(node.isoform_position, Some(2 | 3)));
        }
    }

    #[test]
    fn a_deleting_isoform_is_a_bypass_edge() {
        let mut graph = ProteinGraph::canonical("ACDE", "P12345");
        let feature = var_seq(2, 3, "Missing (in isoform 2)", "VSP_000001");
        let isoforms = IndexMap::from([(
            "P12345-2".to_string(),
            vec!["VSP_000001".to_string()],
        )]);
        apply_isoforms(&mut graph, &isoforms, &[&feature]).unwrap();
        assert_eq!(graph.walk_sequences(), vec!["ACDE", "AE"]);
    }
}
