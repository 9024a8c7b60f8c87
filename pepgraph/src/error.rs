use thiserror::Error;

use crate::features::FeatureKind;

/// Failures that are local to a single protein entry. The worker that hits one
/// of these logs the accession together with the failure kind, skips the
/// entry, and continues with the next one.
#[derive(Debug, Error)]
pub enum EntryError {
    /// The entry itself is malformed: a residue outside the alphabet, a
    /// feature location outside the sequence bounds, or an isoform comment
    /// that cannot be interpreted.
    #[error("invalid input: {reason}")]
    InputInvalid {
        /// Human readable explanation of what was wrong.
        reason: String,
    },
    /// A feature could not be applied because the graph no longer contains
    /// the positions it references, or its description contradicts the
    /// sequence.
    #[error("cannot resolve {kind} at {start}..{end}: {reason}")]
    FeatureResolution {
        /// The kind of the offending feature.
        kind: FeatureKind,
        /// One based start position the feature referenced.
        start: u32,
        /// One based end position the feature referenced.
        end: u32,
        /// Why the feature did not resolve.
        reason: String,
    },
    /// One of the graph invariants was violated after a transformation.
    #[error("graph verification failed: {reason}")]
    VerifyFailed {
        /// The invariant that was broken.
        reason: String,
    },
    /// An external sink rejected the graph.
    #[error("exporter {exporter} failed: {reason}")]
    Exporter {
        /// Name of the exporter that failed.
        exporter: &'static str,
        /// The underlying failure.
        reason: String,
    },
}

/// Failures that end the run (or a worker) rather than a single entry.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// An input file or the statistics sink could not be touched.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The statistics sink rejected a row.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    /// A queue endpoint closed before its stop token arrived. This cannot
    /// happen if the shutdown protocol is honoured.
    #[error("channel {0} closed unexpectedly")]
    ChannelClosed(&'static str),
    /// The run could not be set up at all (missing input, unwritable output).
    #[error("{0}")]
    Setup(String),
}
