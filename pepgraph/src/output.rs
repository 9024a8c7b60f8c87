//! The statistics row handed from the workers to the CSV writer.

use itertools::Itertools;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::features::FeatureCounts;
use crate::graph::Statistics;

/// The header of the statistics CSV, written once when the sink is opened.
pub const CSV_HEADER: [&str; 13] = [
    "Accession",
    "Entry ID",
    "Number of isoforms",
    "Has INIT_MET",
    "Has SIGNAL",
    "Number of variants",
    "Number of cleaved edges",
    "Number of nodes",
    "Number of edges",
    "Num of possible paths",
    "Num of possible paths (by miscleavages 0, 1, ...)",
    "Num of possible paths (by hops 0, 1, ...)",
    "Protein description",
];

/// Everything one worker reports about one finished graph. Rows arrive at
/// the writer in completion order, any ordering downstream has to use the
/// accession column.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct StatisticsRow {
    /// The primary accession.
    pub accession: String,
    /// The entry's display name.
    pub entry_name: String,
    /// How many features of each kind were applied.
    pub feature_counts: FeatureCounts,
    /// How many edges the digester marked.
    pub cleaved_edges: usize,
    /// The graph statistics.
    pub statistics: Statistics,
    /// The short protein description, unless suppressed.
    pub description: Option<String>,
}

impl StatisticsRow {
    /// This row in the column order of [`CSV_HEADER`]. Disabled counters are
    /// empty fields, list valued counters use literal list syntax.
    pub fn csv_record(&self) -> Vec<String> {
        vec![
            self.accession.clone(),
            self.entry_name.clone(),
            optional(self.feature_counts.isoforms),
            optional(self.feature_counts.init_met),
            optional(self.feature_counts.signal),
            optional(self.feature_counts.variants),
            self.cleaved_edges.to_string(),
            self.statistics.nodes.to_string(),
            self.statistics.edges.to_string(),
            optional(self.statistics.paths.as_ref()),
            list(self.statistics.paths_by_miscleavages.as_deref()),
            list(self.statistics.paths_by_hops.as_deref()),
            self.description.clone().unwrap_or_default(),
        ]
    }
}

fn optional(value: Option<impl std::fmt::Display>) -> String {
    value.map(|value| value.to_string()).unwrap_or_default()
}

fn list(values: Option<&[BigUint]>) -> String {
    values.map_or_else(String::new, |values| {
        format!("[{}]", values.iter().join(", "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_counters_are_empty_fields() {
        let row = StatisticsRow {
            accession: "P12345".to_string(),
            entry_name: "TEST_HUMAN".to_string(),
            ..StatisticsRow::default()
        };
        let record = row.csv_record();
        assert_eq!(record.len(), CSV_HEADER.len());
        assert_eq!(record[2], "");
        assert_eq!(record[9], "");
        assert_eq!(record[10], "");
    }

    #[test]
    fn list_columns_use_literal_list_syntax() {
        let row = StatisticsRow {
            statistics: Statistics {
                paths_by_miscleavages: Some(vec![
                    BigUint::from(1_u32),
                    BigUint::from(3_u32),
                    BigUint::from(5_u32),
                ]),
                ..Statistics::default()
            },
            ..StatisticsRow::default()
        };
        assert_eq!(row.csv_record()[10], "[1, 3, 5]");
    }
}
