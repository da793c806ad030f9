//! In-memory session store: one [`HistoryEngine`] per session id.

use std::collections::HashMap;

use uuid::Uuid;

use crate::engine::{EngineConfig, HistoryEngine};
use crate::types::SessionStats;

/// Owns every session's history engine. Nothing outside the store keeps a
/// reference to an engine between calls.
pub struct SessionStore {
    sessions: HashMap<String, HistoryEngine>,
    defaults: EngineConfig,
}

impl SessionStore {
    /// Create an empty store whose new sessions use `defaults`.
    pub fn new(defaults: EngineConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            defaults,
        }
    }

    /// Start (or restart) a session with a clean engine.
    ///
    /// A fresh UUID is generated when `session_id` is `None`.
    pub fn start_session(&mut self, session_id: Option<String>) -> String {
        let id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        self.sessions
            .insert(id.clone(), HistoryEngine::new(self.defaults.clone()));
        tracing::info!(
            "Started session {id} (context window {}, summary window {})",
            self.defaults.context_window,
            self.defaults.summary_window
        );
        id
    }

    pub fn get(&self, session_id: &str) -> Option<&HistoryEngine> {
        self.sessions.get(session_id)
    }

    pub fn get_mut(&mut self, session_id: &str) -> Option<&mut HistoryEngine> {
        self.sessions.get_mut(session_id)
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Known session ids, sorted.
    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn stats(&self, session_id: &str) -> Option<SessionStats> {
        self.sessions.get(session_id).map(HistoryEngine::stats)
    }

    /// Reset a session's content. The entry itself is kept.
    ///
    /// Returns `false` for unknown ids without creating anything.
    pub fn clear(&mut self, session_id: &str) -> bool {
        match self.sessions.get_mut(session_id) {
            Some(engine) => {
                engine.clear();
                true
            }
            None => false,
        }
    }

    pub fn defaults(&self) -> &EngineConfig {
        &self.defaults
    }

    /// Change the default context window and apply it to every session.
    pub fn update_context_window(&mut self, window: usize) {
        if window == self.defaults.context_window {
            return;
        }
        self.defaults.context_window = window;
        for engine in self.sessions.values_mut() {
            engine.update_context_window(window);
        }
        tracing::info!(
            "Updated context window to {window} for {} active sessions",
            self.sessions.len()
        );
    }

    /// Change the default summary window and apply it to every session.
    pub fn update_summary_window(&mut self, window: usize) {
        if window == self.defaults.summary_window {
            return;
        }
        self.defaults.summary_window = window;
        for engine in self.sessions.values_mut() {
            engine.update_summary_window(window);
        }
        tracing::info!(
            "Updated summary window to {window} for {} active sessions",
            self.sessions.len()
        );
    }

    pub fn update_windows(&mut self, context_window: usize, summary_window: usize) {
        self.update_context_window(context_window);
        self.update_summary_window(summary_window);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livevlm_types::FrameRecord;

    fn frame(response: &str) -> FrameRecord {
        FrameRecord::new("prompt", "gpt-4o", response)
    }

    #[test]
    fn start_generates_unique_ids() {
        let mut store = SessionStore::default();
        let a = store.start_session(None);
        let b = store.start_session(None);
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn start_with_id_replaces_engine() {
        let mut store = SessionStore::default();
        let id = store.start_session(Some("cam-1".into()));
        assert_eq!(id, "cam-1");
        store.get_mut("cam-1").unwrap().add_frame(frame("a"));

        store.start_session(Some("cam-1".into()));
        assert!(store.get("cam-1").unwrap().is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn stats_unknown_session() {
        let store = SessionStore::default();
        assert!(store.stats("missing").is_none());
    }

    #[test]
    fn clear_unknown_session_creates_nothing() {
        let mut store = SessionStore::default();
        assert!(!store.clear("missing"));
        assert!(store.is_empty());
        assert!(!store.contains("missing"));
    }

    #[test]
    fn clear_keeps_entry() {
        let mut store = SessionStore::default();
        let id = store.start_session(None);
        store.get_mut(&id).unwrap().add_frame(frame("a"));
        assert!(store.clear(&id));
        assert!(store.contains(&id));
        assert_eq!(store.stats(&id).unwrap().total_frames, 0);
    }

    #[test]
    fn window_updates_reach_existing_and_new_sessions() {
        let mut store = SessionStore::default();
        let existing = store.start_session(None);
        store.update_windows(4, 6);

        let engine = store.get(&existing).unwrap();
        assert_eq!(engine.context_window(), 4);
        assert_eq!(engine.summary_window(), 6);

        let fresh = store.start_session(None);
        assert_eq!(store.get(&fresh).unwrap().context_window(), 4);
        assert_eq!(store.defaults().summary_window, 6);
    }

    #[test]
    fn session_ids_sorted() {
        let mut store = SessionStore::default();
        store.start_session(Some("b".into()));
        store.start_session(Some("a".into()));
        assert_eq!(store.session_ids(), ["a", "b"]);
    }
}
