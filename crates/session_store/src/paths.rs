use std::path::{Path, PathBuf};

pub const SESSION_DIR: [&str; 2] = [".buddy", "sessions"];
pub const SESSION_FILE_EXTENSION: &str = "jsonl";

#[must_use]
pub fn session_root(base: &Path) -> PathBuf {
    base.join(SESSION_DIR[0]).join(SESSION_DIR[1])
}

#[must_use]
pub fn sanitize_timestamp_for_filename(timestamp: &str) -> String {
    timestamp
        .chars()
        .map(|c| match c {
            ':' | '/' | '\\' | ' ' => '-',
            _ => c,
        })
        .collect()
}

#[must_use]
pub fn session_file_name(created_at: &str, session_id: &str) -> String {
    format!(
        "{}_{}.{SESSION_FILE_EXTENSION}",
        sanitize_timestamp_for_filename(created_at),
        session_id
    )
}

pub(crate) fn is_session_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|extension| extension == SESSION_FILE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{is_session_file, session_file_name, session_root};

    #[test]
    fn file_name_replaces_separator_characters() {
        assert_eq!(
            session_file_name("2026-03-01T08:00:00Z", "abc"),
            "2026-03-01T08-00-00Z_abc.jsonl"
        );
    }

    #[test]
    fn root_nests_under_base() {
        assert_eq!(
            session_root(Path::new("/srv/chat")),
            Path::new("/srv/chat/.buddy/sessions")
        );
    }

    #[test]
    fn only_jsonl_files_are_sessions() {
        assert!(is_session_file(Path::new("a/b_c.jsonl")));
        assert!(!is_session_file(Path::new("a/notes.txt")));
        assert!(!is_session_file(Path::new("a/jsonl")));
    }
}
