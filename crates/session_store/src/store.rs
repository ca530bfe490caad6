use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use chat_protocol::{ConversationEntry, RawEvent, SessionRecord, SessionSummary};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::SessionStoreError;
use crate::schema::{ArchiveLine, SessionHeader};

/// A fully validated session file.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
    header: SessionHeader,
    messages: Vec<ConversationEntry>,
    events: Vec<RawEvent>,
}

impl SessionFile {
    /// Reads and validates every line of the file at `path`.
    pub fn open(path: &Path) -> Result<Self, SessionStoreError> {
        let path = path.to_path_buf();
        let mut header: Option<SessionHeader> = None;
        let mut messages = Vec::new();
        let mut events = Vec::new();
        let mut seen_ids = HashSet::new();

        for_each_record(&path, |line_number, parsed| {
            if header.is_none() {
                header = Some(expect_header(&path, line_number, parsed)?);
                return Ok(true);
            }

            match parsed {
                ArchiveLine::Session(_) => Err(SessionStoreError::InvalidEntryRecord {
                    path: path.clone(),
                    line: line_number,
                }),
                ArchiveLine::Message(record) => {
                    validate_rfc3339(&path, line_number, "ts", &record.ts)?;
                    if !seen_ids.insert(record.entry.id.clone()) {
                        return Err(SessionStoreError::DuplicateEntryId {
                            path: path.clone(),
                            line: line_number,
                            id: record.entry.id,
                        });
                    }
                    messages.push(record.entry);
                    Ok(true)
                }
                ArchiveLine::Event(record) => {
                    validate_rfc3339(&path, line_number, "ts", &record.ts)?;
                    if !record.event.is_object() {
                        return Err(SessionStoreError::InvalidEventRecord {
                            path: path.clone(),
                            line: line_number,
                        });
                    }
                    events.push(record.event);
                    Ok(true)
                }
            }
        })?;

        let header = header.ok_or_else(|| SessionStoreError::MissingHeader { path: path.clone() })?;

        Ok(Self {
            path,
            header,
            messages,
            events,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn header(&self) -> &SessionHeader {
        &self.header
    }

    #[must_use]
    pub fn messages(&self) -> &[ConversationEntry] {
        &self.messages
    }

    #[must_use]
    pub fn events(&self) -> &[RawEvent] {
        &self.events
    }

    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        summary_of(&self.header)
    }

    #[must_use]
    pub fn into_record(self) -> SessionRecord {
        SessionRecord {
            session: summary_of(&self.header),
            messages: self.messages,
            events: self.events,
        }
    }
}

/// Reads only the header of the file at `path`, stopping after the first record.
pub(crate) fn read_header(path: &Path) -> Result<SessionHeader, SessionStoreError> {
    let mut header = None;
    for_each_record(path, |line_number, parsed| {
        header = Some(expect_header(path, line_number, parsed)?);
        Ok(false)
    })?;
    header.ok_or_else(|| SessionStoreError::MissingHeader {
        path: path.to_path_buf(),
    })
}

pub(crate) fn summary_of(header: &SessionHeader) -> SessionSummary {
    SessionSummary {
        session_id: header.session_id.clone(),
        created_at: header.created_at.clone(),
        updated_at: header.updated_at.clone(),
    }
}

/// Feeds each non-blank parsed line to `visit` until it returns `false`.
fn for_each_record(
    path: &Path,
    mut visit: impl FnMut(usize, ArchiveLine) -> Result<bool, SessionStoreError>,
) -> Result<(), SessionStoreError> {
    let file = File::open(path)
        .map_err(|source| SessionStoreError::io("opening session file", path, source))?;
    let reader = BufReader::new(file);

    for (line_index, line_result) in reader.lines().enumerate() {
        let line_number = line_index + 1;
        let line =
            line_result.map_err(|source| SessionStoreError::io_line(path, line_number, source))?;
        if line.trim().is_empty() {
            continue;
        }

        let parsed = parse_json_line(path, line_number, &line)?;
        if !visit(line_number, parsed)? {
            break;
        }
    }

    Ok(())
}

fn expect_header(
    path: &Path,
    line_number: usize,
    parsed: ArchiveLine,
) -> Result<SessionHeader, SessionStoreError> {
    match parsed {
        ArchiveLine::Session(header) => {
            validate_header_line(path, line_number, &header)?;
            Ok(header)
        }
        ArchiveLine::Message(_) | ArchiveLine::Event(_) => {
            Err(SessionStoreError::InvalidHeaderRecord {
                path: path.to_path_buf(),
                line: line_number,
            })
        }
    }
}

pub(crate) fn parse_json_line(
    path: &Path,
    line_number: usize,
    line: &str,
) -> Result<ArchiveLine, SessionStoreError> {
    serde_json::from_str::<ArchiveLine>(line)
        .map_err(|source| SessionStoreError::json_line(path, line_number, source))
}

pub(crate) fn validate_header_line(
    path: &Path,
    line_number: usize,
    header: &SessionHeader,
) -> Result<(), SessionStoreError> {
    if header.version != 1 {
        return Err(SessionStoreError::UnsupportedVersion {
            path: path.to_path_buf(),
            line: line_number,
            found: header.version,
        });
    }

    validate_rfc3339(path, line_number, "created_at", &header.created_at)?;
    validate_rfc3339(path, line_number, "updated_at", &header.updated_at)?;
    Ok(())
}

pub(crate) fn validate_rfc3339(
    path: &Path,
    line_number: usize,
    field: &'static str,
    value: &str,
) -> Result<OffsetDateTime, SessionStoreError> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|_| SessionStoreError::InvalidTimestamp {
        path: path.to_path_buf(),
        line: line_number,
        field,
        value: value.to_string(),
    })
}
