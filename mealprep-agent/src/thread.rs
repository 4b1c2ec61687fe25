//! Conversation threads
//!
//! Message history lives in memory, keyed by thread id. The agent
//! replays the whole thread on every model call, so the store is the
//! only place history accumulates.

use crate::provider::ChatMessage;
use std::collections::HashMap;

/// In-memory store of conversation histories.
#[derive(Debug, Default)]
pub struct ThreadStore {
    threads: HashMap<String, Vec<ChatMessage>>,
}

impl ThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a thread's history, creating an empty one if the id is new.
    pub fn get_or_create(&mut self, thread_id: &str) -> &mut Vec<ChatMessage> {
        self.threads.entry(thread_id.to_string()).or_default()
    }

    pub fn history(&self, thread_id: &str) -> Option<&[ChatMessage]> {
        self.threads.get(thread_id).map(|msgs| msgs.as_slice())
    }

    pub fn append(&mut self, thread_id: &str, message: ChatMessage) {
        self.get_or_create(thread_id).push(message);
    }

    /// Drop a thread's history. Returns whether the thread existed.
    pub fn reset(&mut self, thread_id: &str) -> bool {
        self.threads.remove(thread_id).is_some()
    }

    pub fn thread_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.threads.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_starts_empty() {
        let mut store = ThreadStore::new();
        assert!(store.get_or_create("default").is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_append_and_history() {
        let mut store = ThreadStore::new();
        store.append("default", ChatMessage::user("hello"));
        store.append("default", ChatMessage::assistant("hi there"));

        let history = store.history("default").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content.as_deref(), Some("hello"));
        assert!(store.history("other").is_none());
    }

    #[test]
    fn test_reset_reports_existence() {
        let mut store = ThreadStore::new();
        store.append("default", ChatMessage::user("hello"));

        assert!(store.reset("default"));
        assert!(!store.reset("default"));
        assert!(store.history("default").is_none());
    }

    #[test]
    fn test_thread_ids_sorted() {
        let mut store = ThreadStore::new();
        store.get_or_create("zeta");
        store.get_or_create("alpha");
        store.get_or_create("mid");

        assert_eq!(store.thread_ids(), vec!["alpha", "mid", "zeta"]);
    }
}
