//! Flat-file persistence for chat transcripts.
//!
//! Each session is stored as a JSON array of messages at
//! `<history_dir>/session_<id>.json`, and `<history_dir>/index.json` keeps an
//! append-only list of every session that was started.  The store assumes a
//! single writer; concurrent processes sharing a history directory can lose
//! index entries.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{from_reader, to_writer_pretty};
use time::OffsetDateTime;

use crate::error::{Error, Result};
use crate::observability::{
    STORE_INDEX_APPENDS, STORE_LOAD_MALFORMED, STORE_LOAD_MISSING, STORE_LOADS, STORE_SAVES,
};
use crate::types::{Message, MessageRole, default_transcript};
use crate::utils::time::session_stamp;

/// Default directory for transcripts and the index.
pub const HISTORY_DIR: &str = "history";

/// Name of the index file inside the history directory.
pub const INDEX_FILE_NAME: &str = "index.json";

/// Prefix of every transcript file name.
pub const SESSION_FILE_PREFIX: &str = "session_";

/// Number of prompt characters embedded in a session identifier.
pub const PROMPT_PREFIX_CHARS: usize = 50;

///////////////////////////////////////////// SessionId ////////////////////////////////////////////

/// Identifier of one run's conversation.
///
/// The first fifty characters of the opening prompt followed by `_` and a
/// `YYYY-MM-DD_HH_MM` timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// An identifier embedding the start of the first prompt of the session.
    ///
    /// Characters that cannot appear in a file name are replaced with `_`.
    pub fn with_prompt(prompt: &str, datetime: OffsetDateTime) -> Self {
        let prefix: String = prompt
            .chars()
            .take(PROMPT_PREFIX_CHARS)
            .map(|c| {
                if c == '/' || c == '\\' || c.is_control() {
                    '_'
                } else {
                    c
                }
            })
            .collect();
        Self(format!("{prefix}_{}", session_stamp(datetime)))
    }

    /// The identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/////////////////////////////////////////////// Index //////////////////////////////////////////////

/// One line of the session index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// The session's identifier.
    pub session_id: String,

    /// Where its transcript lives.
    pub file_path: String,
}

/// Contents of `index.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIndex {
    /// Every session ever registered, in registration order.  Duplicates are
    /// kept.
    pub sessions: Vec<IndexEntry>,
}

/////////////////////////////////////////// SessionStore ///////////////////////////////////////////

/// Reads and writes transcripts and the session index under one directory.
#[derive(Debug, Clone)]
pub struct SessionStore {
    history_dir: PathBuf,
}

impl SessionStore {
    /// Creates a store rooted at `history_dir`.  Nothing is touched on disk
    /// until the first write.
    pub fn new(history_dir: impl Into<PathBuf>) -> Self {
        Self {
            history_dir: history_dir.into(),
        }
    }

    /// The directory holding transcripts and the index.
    pub fn history_dir(&self) -> &Path {
        &self.history_dir
    }

    /// Path of the transcript for `session_id`.
    pub fn session_path(&self, session_id: &SessionId) -> PathBuf {
        self.history_dir
            .join(format!("{SESSION_FILE_PREFIX}{}.json", session_id.as_str()))
    }

    /// Path of the index file.
    pub fn index_path(&self) -> PathBuf {
        self.history_dir.join(INDEX_FILE_NAME)
    }

    /// Creates the history directory if it does not exist.
    pub fn ensure_history_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.history_dir).map_err(|err| {
            Error::io(
                format!(
                    "failed to create history directory {}",
                    self.history_dir.display()
                ),
                err,
            )
        })
    }

    /// Returns true if a transcript exists for `session_id`.
    pub fn exists(&self, session_id: &SessionId) -> bool {
        self.session_path(session_id).is_file()
    }

    /// Loads the transcript for `session_id`.
    ///
    /// Returns `Ok(None)` when no transcript file exists.  A file that does not
    /// parse, is empty, or does not start with a system message is reported as
    /// [`Error::MalformedHistory`].
    pub fn try_load(&self, session_id: &SessionId) -> Result<Option<Vec<Message>>> {
        let path = self.session_path(session_id);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(Error::io(
                    format!("failed to open transcript {}", path.display()),
                    err,
                ));
            }
        };
        let messages: Vec<Message> = from_reader(BufReader::new(file))
            .map_err(|err| Error::malformed_history(&path, err.to_string()))?;
        match messages.first() {
            None => Err(Error::malformed_history(&path, "transcript is empty")),
            Some(first) if first.role != MessageRole::System => Err(Error::malformed_history(
                &path,
                format!("transcript starts with a {} message", first.role),
            )),
            Some(_) => Ok(Some(messages)),
        }
    }

    /// Loads the transcript for `session_id`, falling back to a fresh
    /// transcript holding only the default system message.
    ///
    /// Never fails: a missing, unreadable or malformed file is treated as no
    /// history.
    pub fn load(&self, session_id: &SessionId) -> Vec<Message> {
        STORE_LOADS.click();
        match self.try_load(session_id) {
            Ok(Some(messages)) => messages,
            Ok(None) => {
                STORE_LOAD_MISSING.click();
                default_transcript()
            }
            Err(_) => {
                STORE_LOAD_MALFORMED.click();
                default_transcript()
            }
        }
    }

    /// Writes the full transcript for `session_id`, replacing any previous
    /// content.  Creates the history directory when needed.
    pub fn save(&self, session_id: &SessionId, messages: &[Message]) -> Result<()> {
        self.ensure_history_dir()?;
        let path = self.session_path(session_id);
        let file = File::create(&path).map_err(|err| {
            Error::io(format!("failed to create transcript {}", path.display()), err)
        })?;
        let mut writer = BufWriter::new(file);
        to_writer_pretty(&mut writer, messages).map_err(|err| {
            Error::serialization("failed to serialize transcript", Some(Box::new(err)))
        })?;
        writer.flush().map_err(|err| {
            Error::io(format!("failed to write transcript {}", path.display()), err)
        })?;
        STORE_SAVES.click();
        Ok(())
    }

    /// Reads the session index, returning an empty index if none exists yet.
    pub fn read_index(&self) -> Result<SessionIndex> {
        let path = self.index_path();
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(SessionIndex::default());
            }
            Err(err) => {
                return Err(Error::io(
                    format!("failed to open index {}", path.display()),
                    err,
                ));
            }
        };
        from_reader(BufReader::new(file))
            .map_err(|err| Error::malformed_history(&path, err.to_string()))
    }

    /// Appends an entry to the session index and rewrites it.
    ///
    /// An existing index that cannot be parsed is left untouched and reported
    /// as [`Error::MalformedHistory`].
    pub fn append_index_entry(&self, session_id: &SessionId, file_path: &Path) -> Result<()> {
        self.ensure_history_dir()?;
        let mut index = self.read_index()?;
        index.sessions.push(IndexEntry {
            session_id: session_id.as_str().to_string(),
            file_path: file_path.display().to_string(),
        });
        let path = self.index_path();
        let file = File::create(&path).map_err(|err| {
            Error::io(format!("failed to create index {}", path.display()), err)
        })?;
        let mut writer = BufWriter::new(file);
        to_writer_pretty(&mut writer, &index).map_err(|err| {
            Error::serialization("failed to serialize index", Some(Box::new(err)))
        })?;
        writer.flush().map_err(|err| {
            Error::io(format!("failed to write index {}", path.display()), err)
        })?;
        STORE_INDEX_APPENDS.click();
        Ok(())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(HISTORY_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn store() -> (tempfile::TempDir, SessionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("history"));
        (dir, store)
    }

    #[test]
    fn session_id_embeds_prompt_prefix() {
        let id = SessionId::with_prompt(
            "explain quantum computing",
            datetime!(2024-05-01 14:30 UTC),
        );
        assert_eq!(id.as_str(), "explain quantum computing_2024-05-01_14_30");
    }

    #[test]
    fn session_id_truncates_by_characters() {
        let prompt = "é".repeat(80);
        let id = SessionId::with_prompt(&prompt, datetime!(2024-05-01 14:30 UTC));
        let (prefix, stamp) = id.as_str().rsplit_once('_').unwrap();
        assert_eq!(stamp, "30");
        assert!(prefix.starts_with(&"é".repeat(PROMPT_PREFIX_CHARS)));
        assert_eq!(
            id.as_str().chars().count(),
            PROMPT_PREFIX_CHARS + 1 + "2024-05-01_14_30".len()
        );
    }

    #[test]
    fn session_id_replaces_path_separators() {
        let id = SessionId::with_prompt("a/b\\c\nd", datetime!(2024-05-01 14:30 UTC));
        assert_eq!(id.as_str(), "a_b_c_d_2024-05-01_14_30");
    }

    #[test]
    fn session_path_layout() {
        let store = SessionStore::new("history");
        let id = SessionId::from("2024-05-01_14_30");
        assert_eq!(
            store.session_path(&id),
            Path::new("history").join("session_2024-05-01_14_30.json")
        );
        assert_eq!(store.index_path(), Path::new("history").join("index.json"));
    }

    #[test]
    fn load_missing_returns_default_transcript() {
        let (_dir, store) = store();
        let id = SessionId::from("nothing-here");
        assert_eq!(store.try_load(&id).unwrap(), None);
        assert_eq!(store.load(&id), default_transcript());
        assert!(!store.history_dir().exists());
    }

    #[test]
    fn save_then_load_round_trips() {
        let (_dir, store) = store();
        let id = SessionId::from("round-trip");
        let messages = vec![
            Message::default_system(),
            Message::user("hello"),
            Message::assistant("hi there"),
        ];
        store.save(&id, &messages).unwrap();
        assert!(store.exists(&id));
        assert_eq!(store.load(&id), messages);

        store.save(&id, &store.load(&id)).unwrap();
        assert_eq!(store.load(&id), messages);
    }

    #[test]
    fn save_overwrites_previous_content() {
        let (_dir, store) = store();
        let id = SessionId::from("overwrite");
        store
            .save(&id, &[Message::default_system(), Message::user("one")])
            .unwrap();
        store.save(&id, &default_transcript()).unwrap();
        assert_eq!(store.load(&id), default_transcript());
    }

    #[test]
    fn corrupt_transcript_falls_back() {
        let (_dir, store) = store();
        let id = SessionId::from("corrupt");
        store.ensure_history_dir().unwrap();
        fs::write(store.session_path(&id), "{not json").unwrap();
        assert!(store.try_load(&id).unwrap_err().is_malformed_history());
        assert_eq!(store.load(&id), default_transcript());
    }

    #[test]
    fn transcript_must_start_with_system() {
        let (_dir, store) = store();
        store.ensure_history_dir().unwrap();

        let empty = SessionId::from("empty");
        fs::write(store.session_path(&empty), "[]").unwrap();
        assert!(store.try_load(&empty).unwrap_err().is_malformed_history());

        let headless = SessionId::from("headless");
        fs::write(
            store.session_path(&headless),
            r#"[{"role":"user","content":"hi"}]"#,
        )
        .unwrap();
        assert!(store.try_load(&headless).unwrap_err().is_malformed_history());
        assert_eq!(store.load(&headless), default_transcript());
    }

    #[test]
    fn index_appends_without_deduplication() {
        let (_dir, store) = store();
        let id = SessionId::from("dup");
        let path = store.session_path(&id);
        store.append_index_entry(&id, &path).unwrap();
        store.append_index_entry(&id, &path).unwrap();

        let index = store.read_index().unwrap();
        assert_eq!(index.sessions.len(), 2);
        assert_eq!(index.sessions[0], index.sessions[1]);
        assert_eq!(index.sessions[0].session_id, "dup");
        assert_eq!(index.sessions[0].file_path, path.display().to_string());
    }

    #[test]
    fn index_file_format() {
        let (_dir, store) = store();
        let id = SessionId::from("fmt");
        store
            .append_index_entry(&id, Path::new("history/session_fmt.json"))
            .unwrap();
        let raw = fs::read_to_string(store.index_path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "sessions": [
                    {"session_id": "fmt", "file_path": "history/session_fmt.json"}
                ]
            })
        );
    }

    #[test]
    fn corrupt_index_is_not_overwritten() {
        let (_dir, store) = store();
        store.ensure_history_dir().unwrap();
        fs::write(store.index_path(), "garbage").unwrap();
        let id = SessionId::from("x");
        let err = store
            .append_index_entry(&id, &store.session_path(&id))
            .unwrap_err();
        assert!(err.is_malformed_history());
        assert_eq!(fs::read_to_string(store.index_path()).unwrap(), "garbage");
    }
}
