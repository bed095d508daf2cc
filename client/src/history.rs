//! Local chat history
//!
//! Keeps one timestamped record per rendered inbound message, viewable in
//! pages (newest first) and exportable to a plain-text file with a
//! readable header. Entirely local: the hub never stores messages.

use chrono::{DateTime, Local};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Receipt time
    pub at: DateTime<Local>,
    /// Wire kind label (SYSTEM, CHAT, PRIVATE, USERS)
    pub kind: &'static str,
    /// Payload as rendered
    pub text: String,
}

#[derive(Debug)]
pub struct ChatHistory {
    entries: Vec<HistoryEntry>,
    page_size: usize,
}

impl ChatHistory {
    pub fn new(page_size: usize) -> Self {
        Self {
            entries: Vec::new(),
            page_size: page_size.max(1),
        }
    }

    pub fn record(&mut self, kind: &'static str, text: &str) {
        self.entries.push(HistoryEntry {
            at: Local::now(),
            kind,
            text: text.to_string(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        self.entries.len().div_ceil(self.page_size)
    }

    /// One page of history, chronological within the page. Page 1 holds
    /// the newest messages; pages past the end are empty.
    pub fn page(&self, page: usize) -> &[HistoryEntry] {
        if page == 0 {
            return &[];
        }
        let end = self.entries.len().saturating_sub((page - 1) * self.page_size);
        let start = end.saturating_sub(self.page_size);
        &self.entries[start..end]
    }

    /// Writes the full history as plain text: an export-timestamp header,
    /// then one line per record.
    pub fn export(&self, path: &Path) -> std::io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        writeln!(
            out,
            "=== Chat history exported {} ({} messages) ===",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            self.entries.len()
        )?;
        for entry in &self.entries {
            writeln!(
                out,
                "[{}] {}: {}",
                entry.at.format("%H:%M:%S"),
                entry.kind,
                entry.text
            )?;
        }
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(count: usize, page_size: usize) -> ChatHistory {
        let mut history = ChatHistory::new(page_size);
        for n in 1..=count {
            history.record("CHAT", &format!("message {}", n));
        }
        history
    }

    #[test]
    fn test_record_and_len() {
        let history = filled(3, 10);
        assert_eq!(history.len(), 3);
        assert!(!history.is_empty());
    }

    #[test]
    fn test_page_one_is_newest() {
        let history = filled(25, 10);
        let page = history.page(1);
        assert_eq!(page.len(), 10);
        assert_eq!(page[0].text, "message 16");
        assert_eq!(page[9].text, "message 25");
    }

    #[test]
    fn test_last_page_is_partial() {
        let history = filled(25, 10);
        assert_eq!(history.page_count(), 3);
        let page = history.page(3);
        assert_eq!(page.len(), 5);
        assert_eq!(page[0].text, "message 1");
    }

    #[test]
    fn test_page_past_the_end_is_empty() {
        let history = filled(5, 10);
        assert!(history.page(2).is_empty());
        assert!(history.page(0).is_empty());
    }

    #[test]
    fn test_empty_history_pages() {
        let history = ChatHistory::new(10);
        assert_eq!(history.page_count(), 0);
        assert!(history.page(1).is_empty());
    }

    #[test]
    fn test_export_writes_header_and_records() {
        let history = filled(2, 10);
        let path = std::env::temp_dir().join("chathub_history_test.txt");
        history.export(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("=== Chat history exported "));
        assert!(header.contains("(2 messages)"));
        assert!(lines.next().unwrap().ends_with("CHAT: message 1"));
        assert!(lines.next().unwrap().ends_with("CHAT: message 2"));

        let _ = std::fs::remove_file(&path);
    }
}
