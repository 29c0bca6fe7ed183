//! Pending quality selections, keyed by a short opaque id.
//!
//! Callback payloads carry only `q:<short_id>`; the URL and format id stay
//! server-side, so delimiter characters inside URLs can never break the
//! callback data and payload size stays bounded.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use teloxide::types::ChatId;

/// How long an unanswered quality prompt stays valid.
pub const SELECTION_TTL: Duration = Duration::from_secs(10 * 60);

/// Callback-data prefix for quality buttons.
pub const CALLBACK_PREFIX: &str = "q:";

/// Short id for callback data (8 chars)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShortId(pub String);

impl ShortId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string()[..8].to_string())
    }
}

impl std::fmt::Display for ShortId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One offered quality choice waiting for the user's answer.
#[derive(Debug, Clone)]
pub struct PendingSelection {
    pub chat_id: ChatId,
    pub source_url: String,
    pub format_id: String,
    /// Best-effort title captured when the prompt was built
    pub title: Option<String>,
    created_at: Instant,
}

/// Registry of all unanswered prompts, shared across handler tasks.
#[derive(Default)]
pub struct PendingSelections {
    inner: Mutex<HashMap<ShortId, PendingSelection>>,
}

impl PendingSelections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the choices offered for one link. Any previous pending
    /// prompt for the same chat is superseded, and stale entries from
    /// other chats are purged on the way.
    pub fn insert_choices<I>(
        &self,
        chat_id: ChatId,
        source_url: &str,
        title: Option<&str>,
        format_ids: I,
    ) -> Vec<ShortId>
    where
        I: IntoIterator<Item = String>,
    {
        let mut inner = self.inner.lock().unwrap();
        let now = Instant::now();
        inner.retain(|_, p| p.chat_id != chat_id && now.duration_since(p.created_at) < SELECTION_TTL);

        format_ids
            .into_iter()
            .map(|format_id| {
                let id = ShortId::new();
                inner.insert(
                    id.clone(),
                    PendingSelection {
                        chat_id,
                        source_url: source_url.to_string(),
                        format_id,
                        title: title.map(str::to_string),
                        created_at: now,
                    },
                );
                id
            })
            .collect()
    }

    /// Redeem a selection token. Returns `None` for unknown or expired
    /// tokens. A redeemed token also retires the sibling buttons of the
    /// same prompt, so one prompt yields at most one download.
    pub fn take(&self, id: &ShortId) -> Option<PendingSelection> {
        let mut inner = self.inner.lock().unwrap();
        let selection = inner.remove(id)?;

        if selection.created_at.elapsed() >= SELECTION_TTL {
            return None;
        }

        inner.retain(|_, p| p.chat_id != selection.chat_id);
        Some(selection)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    #[cfg(test)]
    fn backdate(&self, id: &ShortId, age: Duration) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(p) = inner.get_mut(id) {
            p.created_at = Instant::now() - age;
        }
    }
}
