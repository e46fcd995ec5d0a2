//! # Session store
//! In-memory map from an opaque cookie value to that visitor's [`History`].
//!
//! Handlers classify first and then [`SessionStore::prepend`] the entry, so
//! the read-modify-write of a history happens under the lock and concurrent
//! requests of one session all land. The lock is never held across an await.
//! Sessions idle for longer than the TTL are dropped on the next write, and
//! past `max_sessions` the least recently touched one is evicted.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::http::{header, HeaderMap};
use tracing::debug;

use crate::history::{History, HistoryEntry};

const MAX_SID_LEN: usize = 64;
const DEFAULT_MAX_SESSIONS: usize = 10_000;

#[derive(Debug)]
struct Slot {
    history: History,
    touched: Instant,
}

#[derive(Debug)]
pub struct SessionStore {
    inner: Mutex<HashMap<String, Slot>>,
    cookie_name: String,
    ttl: Duration,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(cookie_name: impl Into<String>, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            cookie_name: cookie_name.into(),
            ttl,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }

    /// Cap the number of live sessions (at least one).
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// History of `sid`, empty when unknown or expired.
    pub fn load(&self, sid: &str) -> History {
        let g = self.inner.lock().expect("session mutex poisoned");
        match g.get(sid) {
            Some(slot) if slot.touched.elapsed() <= self.ttl => slot.history.clone(),
            _ => History::new(),
        }
    }

    /// Prepend `entry` to the history of `sid` in one locked step and return
    /// the updated history.
    pub fn prepend(&self, sid: &str, entry: HistoryEntry) -> History {
        let mut g = self.inner.lock().expect("session mutex poisoned");
        self.make_room(&mut g, sid);
        let now = Instant::now();
        let slot = g.entry(sid.to_string()).or_insert_with(|| Slot {
            history: History::new(),
            touched: now,
        });
        slot.history.push_front(entry);
        slot.touched = now;
        slot.history.clone()
    }

    /// Drop expired sessions, then the least recently touched ones until a
    /// new `sid` fits under the cap.
    fn make_room(&self, g: &mut HashMap<String, Slot>, sid: &str) {
        let before = g.len();
        g.retain(|_, slot| slot.touched.elapsed() <= self.ttl);
        let expired = before - g.len();
        if expired > 0 {
            debug!(expired, "expired sessions dropped");
        }

        if g.contains_key(sid) {
            return;
        }
        while g.len() >= self.max_sessions {
            let Some(oldest) = g
                .iter()
                .min_by_key(|(_, slot)| slot.touched)
                .map(|(k, _)| k.clone())
            else {
                break;
            };
            g.remove(&oldest);
            debug!("session cap reached; least recently used session evicted");
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("session mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Session id from the request's `Cookie` header(s), if present and sane.
    pub fn session_id(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie_name)
            .map(|(_, value)| value.trim().to_string())
            .filter(|v| is_valid_sid(v))
    }

    /// `Set-Cookie` value for a fresh session.
    pub fn set_cookie(&self, sid: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.cookie_name,
            sid,
            self.ttl.as_secs()
        )
    }
}

pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn is_valid_sid(v: &str) -> bool {
    !v.is_empty()
        && v.len() <= MAX_SID_LEN
        && v.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}
