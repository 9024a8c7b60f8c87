//! A streaming reader for SwissProt/EMBL flat files (`.dat` / `.txt`,
//! optionally gzipped). Only the line types the graph builder consumes are
//! interpreted: `ID`, `AC`, `DE`, `CC` (for isoform resolution), `FT` for
//! the eight understood feature kinds, and the `SQ` sequence block. Both the
//! modern `12..34` and the historic two column feature locations parse.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use thiserror::Error;

use crate::entry::ProteinEntry;
use crate::features::{Feature, FeatureKind, FeatureLocation};

/// A failure while reading entries. Malformed entries are local (the reader
/// resynchronises at the next entry terminator), io failures abort the
/// affected file.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The underlying stream failed.
    #[error("cannot read {path}: {source}")]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// The underlying io error.
        source: std::io::Error,
    },
    /// One entry could not be interpreted.
    #[error("{path}:{line}: {reason}")]
    Malformed {
        /// The file the entry came from.
        path: PathBuf,
        /// The line the entry terminator sat on.
        line: usize,
        /// What was wrong.
        reason: String,
    },
}

/// Load an accession exclusion list: a CSV file whose first column holds the
/// accessions to skip.
///
/// # Errors
/// If the file cannot be read.
pub fn load_exclusions(path: &Path) -> Result<HashSet<String>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    let mut exclusions = HashSet::new();
    for record in reader.records() {
        if let Some(accession) = record?.get(0) {
            let accession = accession.trim();
            if !accession.is_empty() {
                exclusions.insert(accession.to_string());
            }
        }
    }
    Ok(exclusions)
}

/// A streaming entry source over one or more flat files.
#[derive(Debug)]
pub struct EntryReader {
    pending: std::vec::IntoIter<PathBuf>,
    current: Option<Source>,
    exclude: HashSet<String>,
    limit: Option<usize>,
    yielded: usize,
}

struct Source {
    path: PathBuf,
    reader: Box<dyn BufRead + Send>,
    line: usize,
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("path", &self.path)
            .field("line", &self.line)
            .finish_non_exhaustive()
    }
}

impl EntryReader {
    /// Read from the given files in order, stopping after `limit` entries if
    /// one is given and silently dropping entries on the exclusion list.
    pub fn new(files: Vec<PathBuf>, limit: Option<usize>, exclude: HashSet<String>) -> Self {
        Self {
            pending: files.into_iter(),
            current: None,
            exclude,
            limit,
            yielded: 0,
        }
    }

    /// Read from an already opened stream, for input that is not a file.
    pub fn from_reader(name: impl Into<PathBuf>, reader: Box<dyn BufRead + Send>) -> Self {
        Self {
            pending: Vec::new().into_iter(),
            current: Some(Source {
                path: name.into(),
                reader,
                line: 0,
            }),
            exclude: HashSet::new(),
            limit: None,
            yielded: 0,
        }
    }

    fn open(path: PathBuf) -> Result<Source, ReadError> {
        let file = File::open(&path).map_err(|source| ReadError::Io {
            path: path.clone(),
            source,
        })?;
        let reader: Box<dyn BufRead + Send> = if path
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case("gz"))
        {
            Box::new(BufReader::new(MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };
        Ok(Source {
            path,
            reader,
            line: 0,
        })
    }
}

impl Iterator for EntryReader {
    type Item = Result<ProteinEntry, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.limit.is_some_and(|limit| self.yielded >= limit) {
                return None;
            }
            let Some(source) = self.current.as_mut() else {
                match Self::open(self.pending.next()?) {
                    Ok(source) => self.current = Some(source),
                    Err(error) => return Some(Err(error)),
                }
                continue;
            };
            match read_entry(source) {
                Ok(Some(entry)) => {
                    if entry
                        .accessions
                        .first()
                        .is_some_and(|accession| self.exclude.contains(accession))
                    {
                        continue;
                    }
                    self.yielded += 1;
                    return Some(Ok(entry));
                }
                Ok(None) => {
                    self.current = None;
                }
                Err(error) => {
                    if matches!(error, ReadError::Io { .. }) {
                        self.current = None;
                    }
                    return Some(Err(error));
                }
            }
        }
    }
}

/// Read all lines up to and including the next `//` terminator and parse
/// them. `Ok(None)` signals a cleanly exhausted stream.
fn read_entry(source: &mut Source) -> Result<Option<ProteinEntry>, ReadError> {
    let mut lines = Vec::new();
    let mut buffer = String::new();
    loop {
        buffer.clear();
        let read = source
            .reader
            .read_line(&mut buffer)
            .map_err(|error| ReadError::Io {
                path: source.path.clone(),
                source: error,
            })?;
        if read == 0 {
            if lines.iter().all(|line: &String| line.trim().is_empty()) {
                return Ok(None);
            }
            return Err(ReadError::Malformed {
                path: source.path.clone(),
                line: source.line,
                reason: "file ends inside an entry".to_string(),
            });
        }
        source.line += 1;
        let line = buffer.trim_end_matches(['\n', '\r']);
        if line == "//" {
            if lines.iter().all(|line: &String| line.trim().is_empty()) {
                continue;
            }
            return parse_entry(&lines)
                .map(Some)
                .map_err(|reason| ReadError::Malformed {
                    path: source.path.clone(),
                    line: source.line,
                    reason,
                });
        }
        lines.push(line.to_string());
    }
}

/// Which quoted feature qualifier is still waiting for its closing quote.
enum Pending {
    Note,
    Id,
    Other,
}

struct FeatureBuilder {
    kind: FeatureKind,
    location: FeatureLocation,
    description: String,
    id: Option<String>,
    pending: Option<Pending>,
}

impl FeatureBuilder {
    fn finish(self) -> Feature {
        Feature {
            kind: self.kind,
            location: self.location,
            description: self.description,
            id: self.id,
        }
    }
}

fn parse_entry(lines: &[String]) -> Result<ProteinEntry, String> {
    let mut entry = ProteinEntry::default();
    let mut comment_lines: Vec<String> = Vec::new();
    let mut feature: Option<FeatureBuilder> = None;
    let mut skipping_feature = false;
    let mut in_sequence = false;

    for line in lines {
        let (code, content) = line.split_at(line.len().min(5));
        let code = code.trim_end();
        match code {
            "ID" => {
                entry.entry_name = content
                    .split_whitespace()
                    .next()
                    .unwrap_or_default()
                    .to_string();
            }
            "AC" => {
                entry.accessions.extend(
                    content
                        .split(';')
                        .map(str::trim)
                        .filter(|accession| !accession.is_empty())
                        .map(str::to_string),
                );
            }
            "DE" => {
                if !entry.description.is_empty() {
                    entry.description.push(' ');
                }
                entry.description.push_str(content.trim());
            }
            "CC" => comment_lines.push(content.trim().to_string()),
            "FT" => {
                if content.starts_with(char::is_whitespace) {
                    if skipping_feature {
                        continue;
                    }
                    if let Some(builder) = feature.as_mut() {
                        continuation(builder, content.trim());
                    }
                } else {
                    if let Some(builder) = feature.take() {
                        entry.features.push(builder.finish());
                    }
                    skipping_feature = false;
                    match feature_header(content) {
                        Some(builder) => feature = Some(builder),
                        None => skipping_feature = true,
                    }
                }
            }
            "SQ" => in_sequence = true,
            "" if in_sequence => {
                entry
                    .sequence
                    .extend(content.chars().filter(|c| !c.is_whitespace()));
            }
            _ => {}
        }
    }
    if let Some(builder) = feature.take() {
        entry.features.push(builder.finish());
    }
    entry.comments = comment_blocks(&comment_lines);
    entry.sequence = entry.sequence.to_ascii_uppercase();

    if entry.entry_name.is_empty() {
        return Err("entry has no ID line".to_string());
    }
    if entry.accessions.is_empty() {
        return Err(format!("entry {} has no AC line", entry.entry_name));
    }
    if entry.sequence.is_empty() {
        return Err(format!("entry {} has no sequence", entry.entry_name));
    }
    Ok(entry)
}

/// Group the `CC` lines into `-!-` comment blocks, each joined to one line.
fn comment_blocks(lines: &[String]) -> Vec<String> {
    let mut blocks: Vec<String> = Vec::new();
    for line in lines {
        if let Some(fresh) = line.strip_prefix("-!- ") {
            blocks.push(fresh.to_string());
        } else if let Some(block) = blocks.last_mut() {
            block.push(' ');
            block.push_str(line);
        }
    }
    blocks
}

/// Parse the first line of a feature: its kind and location, plus the
/// trailing description in the historic two column format. Unknown kinds
/// and locations with an unknown endpoint yield None, the caller skips the
/// whole feature.
fn feature_header(content: &str) -> Option<FeatureBuilder> {
    let mut tokens = content.split_whitespace();
    let kind: FeatureKind = tokens.next()?.parse().ok()?;
    let first = tokens.next()?;
    let rest: Vec<&str> = tokens.collect();

    let (location, description) = if let Some((start, end)) = first.split_once("..") {
        let location = FeatureLocation {
            start: position(start)?,
            end: position(end)?,
        };
        (location, rest.join(" "))
    } else if let Some(end) = rest.first().and_then(|token| position(token)) {
        // historic format: two position columns, description follows
        let location = FeatureLocation {
            start: position(first)?,
            end,
        };
        (location, rest[1..].join(" "))
    } else {
        let start = position(first)?;
        (FeatureLocation { start, end: start }, rest.join(" "))
    };
    Some(FeatureBuilder {
        kind,
        location,
        description,
        id: None,
        pending: None,
    })
}

/// A single endpoint, stripped of the `<`, `>` fuzziness markers. A fully
/// unknown `?` endpoint does not resolve.
fn position(token: &str) -> Option<u32> {
    token.trim_start_matches(['<', '>', '?']).parse().ok()
}

/// Fold one `FT` continuation line into the feature under construction.
fn continuation(builder: &mut FeatureBuilder, text: &str) {
    if let Some(pending) = &builder.pending {
        let (value, closed) = match text.strip_suffix('"') {
            Some(stripped) => (stripped, true),
            None => (text, false),
        };
        match pending {
            Pending::Note => {
                if !builder.description.is_empty() {
                    builder.description.push(' ');
                }
                builder.description.push_str(value);
            }
            Pending::Id => {
                if let Some(id) = builder.id.as_mut() {
                    id.push_str(value);
                }
            }
            Pending::Other => {}
        }
        if closed {
            builder.pending = None;
        }
        return;
    }
    if let Some(value) = text.strip_prefix("/note=\"") {
        match value.strip_suffix('"') {
            Some(complete) => builder.description = complete.to_string(),
            None => {
                builder.description = value.to_string();
                builder.pending = Some(Pending::Note);
            }
        }
    } else if let Some(value) = text.strip_prefix("/id=\"") {
        match value.strip_suffix('"') {
            Some(complete) => builder.id = Some(complete.to_string()),
            None => {
                builder.id = Some(value.to_string());
                builder.pending = Some(Pending::Id);
            }
        }
    } else if let Some(value) = text.strip_prefix("/FTId=") {
        // historic identifier qualifier, terminated by a full stop
        builder.id = Some(value.trim_end_matches('.').to_string());
    } else if text.starts_with('/') {
        if text.matches('"').count() == 1 {
            builder.pending = Some(Pending::Other);
        }
    } else {
        // historic format: plain description continuation
        if !builder.description.is_empty() {
            builder.description.push(' ');
        }
        builder.description.push_str(text);
    }
}
