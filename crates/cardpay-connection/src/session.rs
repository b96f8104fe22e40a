//! Connection session bookkeeping.
//!
//! A [`ConnectionSession`] lives from the start of a scan until the flow
//! reaches a terminal state. It tracks the readers announced so far, in
//! first-seen order with duplicates suppressed by identifier, and at most
//! one selected reader.

use cardpay_core::{Error, ReaderId, Result};
use cardpay_hardware::Reader;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Readers discovered during one connection attempt.
#[derive(Debug)]
pub struct ConnectionSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    readers: Vec<Reader>,
    selected: Option<ReaderId>,
    token: CancellationToken,
}

impl ConnectionSession {
    /// Create an empty session with a fresh cancellation token.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            readers: Vec::new(),
            selected: None,
            token: CancellationToken::new(),
        }
    }

    /// Unique session identifier, used to correlate log lines.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When the session was created.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Track a discovered reader.
    ///
    /// Returns `true` if the reader was not known yet. Later announcements
    /// of a known identifier are ignored and keep the original position.
    pub fn track(&mut self, reader: Reader) -> bool {
        if self.contains(&reader.id) {
            return false;
        }
        self.readers.push(reader);
        true
    }

    /// Tracked readers in discovery order.
    pub fn readers(&self) -> &[Reader] {
        &self.readers
    }

    /// Tracked reader identifiers in discovery order.
    pub fn reader_ids(&self) -> Vec<ReaderId> {
        self.readers.iter().map(|reader| reader.id.clone()).collect()
    }

    /// Number of tracked readers.
    pub fn len(&self) -> usize {
        self.readers.len()
    }

    /// Whether no reader was discovered yet.
    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }

    /// Whether a reader with this identifier is tracked.
    pub fn contains(&self, reader_id: &ReaderId) -> bool {
        self.readers.iter().any(|reader| &reader.id == reader_id)
    }

    /// Look up a tracked reader.
    pub fn get(&self, reader_id: &ReaderId) -> Option<&Reader> {
        self.readers.iter().find(|reader| &reader.id == reader_id)
    }

    /// Mark a tracked reader as selected, replacing any previous selection.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownReader` if the reader was never discovered in
    /// this session.
    pub fn select(&mut self, reader_id: &ReaderId) -> Result<&Reader> {
        let reader = self
            .readers
            .iter()
            .find(|reader| &reader.id == reader_id)
            .ok_or_else(|| Error::UnknownReader(reader_id.to_string()))?;

        self.selected = Some(reader_id.clone());
        Ok(reader)
    }

    /// Identifier of the selected reader, if any.
    pub fn selected(&self) -> Option<&ReaderId> {
        self.selected.as_ref()
    }

    /// The selected reader, if any.
    pub fn selected_reader(&self) -> Option<&Reader> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }

    /// Token cancelled when the session ends.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// End the session. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the session has ended.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Default for ConnectionSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConnectionSession {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(id: &str) -> Reader {
        Reader::new(ReaderId::new(id).unwrap(), format!("Reader {id}"))
    }

    #[test]
    fn test_track_preserves_first_seen_order() {
        let mut session = ConnectionSession::new();

        assert!(session.track(reader("B")));
        assert!(session.track(reader("A")));
        assert!(!session.track(reader("B")));
        assert!(session.track(reader("C")));

        let ids: Vec<_> = session.reader_ids().iter().map(|id| id.to_string()).collect();
        assert_eq!(ids, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_duplicate_keeps_original_entry() {
        let mut session = ConnectionSession::new();
        session.track(reader("A").with_battery_level(0.5));
        session.track(reader("A").with_battery_level(0.9));

        assert_eq!(session.len(), 1);
        assert_eq!(session.readers()[0].battery_level, Some(0.5));
    }

    #[test]
    fn test_select_single_reader() {
        let mut session = ConnectionSession::new();
        session.track(reader("A"));
        session.track(reader("B"));

        session.select(&ReaderId::new("A").unwrap()).unwrap();
        session.select(&ReaderId::new("B").unwrap()).unwrap();

        assert_eq!(session.selected().unwrap().as_str(), "B");
        assert_eq!(session.selected_reader().unwrap().name, "Reader B");
    }

    #[test]
    fn test_select_unknown_reader() {
        let mut session = ConnectionSession::new();
        let result = session.select(&ReaderId::new("ghost").unwrap());

        assert!(matches!(result, Err(Error::UnknownReader(_))));
        assert!(session.selected().is_none());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let session = ConnectionSession::new();
        let token = session.token().clone();

        session.cancel();
        session.cancel();

        assert!(session.is_cancelled());
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_drop_cancels_token() {
        let session = ConnectionSession::new();
        let token = session.token().clone();
        drop(session);

        assert!(token.is_cancelled());
    }

    #[test]
    fn test_sessions_have_distinct_ids() {
        assert_ne!(ConnectionSession::new().id(), ConnectionSession::new().id());
    }
}
