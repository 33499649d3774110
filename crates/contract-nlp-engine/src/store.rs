//! Concurrent session store.
//!
//! Each session id owns a slot behind its own mutex. Turns for one id
//! serialize on that mutex while different ids proceed in parallel. The map
//! itself is only touched to find or drop a slot, never while a slot is
//! locked.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::info;

use crate::session::{Session, SessionStatus};

type Slot = Arc<Mutex<Option<Session>>>;

#[derive(Debug, Default)]
pub struct SessionStore {
    slots: DashMap<String, Slot>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, session_id: &str) -> Slot {
        Arc::clone(
            self.slots
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(None)))
                .value(),
        )
    }

    /// Run `f` with exclusive access to the session slot for `session_id`.
    pub fn with_session<R>(&self, session_id: &str, f: impl FnOnce(&mut Option<Session>) -> R) -> R {
        let slot = self.slot(session_id);
        let out = {
            let mut guard = slot.lock();
            f(&mut guard)
        };
        drop(slot);
        self.release(session_id);
        out
    }

    /// Drop the slot if it is empty and nobody else holds it.
    fn release(&self, session_id: &str) {
        self.slots
            .remove_if(session_id, |_, slot| Arc::strong_count(slot) == 1 && slot.lock().is_none());
    }

    pub fn get(&self, session_id: &str) -> Option<Session> {
        let slot = self.slots.get(session_id).map(|s| Arc::clone(s.value()))?;
        let session = slot.lock().clone();
        session
    }

    /// Remove the session, returning it.
    pub fn remove(&self, session_id: &str) -> Option<Session> {
        self.with_session(session_id, Option::take)
    }

    fn snapshot(&self) -> Vec<(String, Slot)> {
        self.slots
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect()
    }

    /// Ids of sessions still collecting input, sorted.
    pub fn active_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .snapshot()
            .into_iter()
            .filter(|(_, slot)| slot.lock().as_ref().is_some_and(Session::is_in_progress))
            .map(|(id, _)| id)
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.snapshot()
            .into_iter()
            .filter(|(_, slot)| slot.lock().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Time out and drop every session idle longer than `timeout` as of
    /// `now`. Finished sessions are dropped on the same schedule. Returns
    /// the removed ids.
    pub fn sweep_expired_at(&self, now: DateTime<Utc>, timeout: Duration) -> Vec<String> {
        let mut removed = Vec::new();
        for (id, slot) in self.snapshot() {
            let mut guard = slot.lock();
            let Some(session) = guard.as_mut() else {
                continue;
            };
            if !session.is_idle(now, timeout) {
                continue;
            }
            if session.is_in_progress() {
                session.status = SessionStatus::Timeout;
                info!(session_id = %id, step = ?session.current_step, "session timed out");
            }
            *guard = None;
            removed.push(id);
        }
        for id in &removed {
            self.release(id);
        }
        removed.sort();
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_790_000_000 + secs, 0).unwrap()
    }

    fn start(store: &SessionStore, id: &str, now: DateTime<Utc>) {
        store.with_session(id, |slot| {
            *slot = Some(Session::start(id, "create contract", vec!["CUSTOMER_NUMBER".into()], now));
        });
    }

    #[test]
    fn empty_slots_are_not_kept() {
        let store = SessionStore::new();
        store.with_session("nobody", |slot| assert!(slot.is_none()));
        assert!(store.slots.is_empty());
        assert!(store.get("nobody").is_none());
    }

    #[test]
    fn sessions_are_listed_while_in_progress() {
        let store = SessionStore::new();
        start(&store, "b", at(0));
        start(&store, "a", at(0));
        assert_eq!(store.active_ids(), ["a", "b"]);
        store.with_session("a", |slot| {
            if let Some(s) = slot {
                s.status = SessionStatus::Complete;
            }
        });
        assert_eq!(store.active_ids(), ["b"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn sweep_removes_only_idle_sessions() {
        let store = SessionStore::new();
        start(&store, "old", at(0));
        start(&store, "fresh", at(500));
        let removed = store.sweep_expired_at(at(700), Duration::from_secs(600));
        assert_eq!(removed, ["old"]);
        assert_eq!(store.active_ids(), ["fresh"]);
        assert!(store.get("old").is_none());
    }

    #[test]
    fn remove_returns_the_session() {
        let store = SessionStore::new();
        start(&store, "s1", at(0));
        assert_eq!(store.remove("s1").map(|s| s.session_id), Some("s1".into()));
        assert!(store.is_empty());
    }

    #[test]
    fn parallel_turns_on_distinct_ids() {
        let store = Arc::new(SessionStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        start(&store, &format!("s{i}"), at(0));
                        store.get(&format!("s{i}"));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.active_ids().len(), 8);
    }
}
