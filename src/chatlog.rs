//! Turn log: append-only pipe-delimited records of conversation activity.
//!
//! Record shape: `timestamp|kind|message[|reply]` with kinds `system`,
//! `message` and `unanswered`. The `unanswered` records are the offline
//! review queue for utterances the classifier could not place. Logging is
//! best-effort: a write failure warns and the turn carries on.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use chrono::Local;

/// Append-only writer for `chat.log`.
pub struct TurnLog {
    file: Option<Mutex<File>>,
}

impl std::fmt::Debug for TurnLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnLog")
            .field("enabled", &self.file.is_some())
            .finish()
    }
}

impl TurnLog {
    /// Open (or create) the log file for appending.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Some(Mutex::new(file)),
        })
    }

    /// A log that discards everything (tests, ephemeral sessions).
    pub fn disabled() -> Self {
        Self { file: None }
    }

    fn write(&self, kind: &str, message: &str, reply: Option<&str>) {
        let Some(file) = &self.file else {
            return;
        };
        let timestamp = Local::now().format("%Y/%m/%d %H:%M:%S");
        // Pipe is the field separator; strip it from free text.
        let message = message.replace('|', " ");
        let line = match reply {
            Some(reply) => {
                format!("{timestamp}|{kind}|{message}|{}\n", reply.replace('|', " "))
            }
            None => format!("{timestamp}|{kind}|{message}\n"),
        };
        let mut file = file.lock().expect("log lock poisoned");
        if let Err(e) = file.write_all(line.as_bytes()) {
            tracing::warn!(error = %e, "failed to append to chat log");
        }
    }

    /// Record a system event (startup, reload, module failure).
    pub fn system(&self, message: &str) {
        self.write("system", message, None);
    }

    /// Record a completed turn: utterance and reply.
    pub fn turn(&self, message: &str, reply: &str) {
        self.write("message", message, Some(reply));
    }

    /// Record an utterance nothing matched, for offline review.
    pub fn unanswered(&self, message: &str) {
        self.write("unanswered", message, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn read(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| l.to_string())
            .collect()
    }

    #[test]
    fn records_have_kind_and_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chat.log");
        let log = TurnLog::open(&path).unwrap();

        log.system("engine initialized");
        log.turn("hello", "Hi there!");
        log.unanswered("flibbertigibbet");

        let lines = read(&path);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("|system|engine initialized"));
        assert!(lines[1].contains("|message|hello|Hi there!"));
        assert!(lines[2].contains("|unanswered|flibbertigibbet"));
    }

    #[test]
    fn pipes_in_text_are_stripped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chat.log");
        let log = TurnLog::open(&path).unwrap();

        log.turn("a|b", "c|d");
        let lines = read(&path);
        assert_eq!(lines[0].matches('|').count(), 3);
    }

    #[test]
    fn disabled_log_discards_silently() {
        let log = TurnLog::disabled();
        log.system("nothing happens");
        log.turn("a", "b");
    }

    #[test]
    fn reopening_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chat.log");
        TurnLog::open(&path).unwrap().system("first");
        TurnLog::open(&path).unwrap().system("second");
        assert_eq!(read(&path).len(), 2);
    }
}
