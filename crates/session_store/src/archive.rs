use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chat_protocol::{SessionRecord, SessionSource, SessionSourceError, SessionSummary};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::SessionStoreError;
use crate::paths::{is_session_file, session_root};
use crate::schema::SessionHeader;
use crate::store::{read_header, summary_of, SessionFile};

/// Directory of session files, read on demand.
///
/// Nothing is cached: every call rescans the directory, so files written by
/// another process show up on the next listing. File reads are blocking and
/// sized for local conversation histories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionArchive {
    root: PathBuf,
}

impl SessionArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Archive rooted at `<base>/.buddy/sessions`.
    pub fn for_base(base: &Path) -> Self {
        Self::new(session_root(base))
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Session file paths in the root, sorted by file name. A missing root is empty.
    pub fn session_paths(&self) -> Result<Vec<PathBuf>, SessionStoreError> {
        let read_dir = match fs::read_dir(&self.root) {
            Ok(read_dir) => read_dir,
            Err(source) if source.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(SessionStoreError::io(
                    "reading session directory",
                    &self.root,
                    source,
                ))
            }
        };

        let mut paths = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = dir_entry.map_err(|source| {
                SessionStoreError::io("reading session directory entry", &self.root, source)
            })?;
            let path = dir_entry.path();
            if path.is_file() && is_session_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Summaries of every readable session, newest `updated_at` first.
    pub fn list(&self) -> Result<Vec<SessionSummary>, SessionStoreError> {
        let mut dated: Vec<(OffsetDateTime, SessionHeader)> = self
            .readable_headers()?
            .into_iter()
            .filter_map(|(_, header)| {
                OffsetDateTime::parse(&header.updated_at, &Rfc3339)
                    .ok()
                    .map(|updated_at| (updated_at, header))
            })
            .collect();

        dated.sort_by(|(left_time, left), (right_time, right)| {
            right_time
                .cmp(left_time)
                .then_with(|| left.session_id.cmp(&right.session_id))
        });

        Ok(dated
            .iter()
            .map(|(_, header)| summary_of(header))
            .collect())
    }

    /// Loads and validates the session whose header carries `session_id`.
    pub fn load(&self, session_id: &str) -> Result<SessionFile, SessionStoreError> {
        let path = self
            .readable_headers()?
            .into_iter()
            .find(|(_, header)| header.session_id == session_id)
            .map(|(path, _)| path)
            .ok_or_else(|| SessionStoreError::SessionNotFound {
                root: self.root.clone(),
                session_id: session_id.to_string(),
            })?;

        SessionFile::open(&path)
    }

    fn readable_headers(&self) -> Result<Vec<(PathBuf, SessionHeader)>, SessionStoreError> {
        let mut headers = Vec::new();
        for path in self.session_paths()? {
            match read_header(&path) {
                Ok(header) => headers.push((path, header)),
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "skipping unreadable session file");
                }
            }
        }
        Ok(headers)
    }
}

impl SessionSource for SessionArchive {
    async fn list_sessions(&self, limit: usize) -> Result<Vec<SessionSummary>, SessionSourceError> {
        let mut sessions = self.list()?;
        sessions.truncate(limit);
        Ok(sessions)
    }

    async fn fetch_session(&self, session_id: &str) -> Result<SessionRecord, SessionSourceError> {
        Ok(self.load(session_id)?.into_record())
    }
}
