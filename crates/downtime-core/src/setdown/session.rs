//! Session persistence for in-flight timer state.
//!
//! A focus session must survive a momentary view teardown: the UI layer
//! rehydrates the timer when the screen comes back. Rather than a hidden
//! process-wide global, the cache sits behind an explicit [`SessionStore`]
//! seam injected into whoever owns the timer, so resumption logic is
//! testable without simulating teardown.

use crate::error::Result;
use crate::setdown::SetDownTimer;
use crate::storage::Database;

/// Save/load/clear for an in-flight [`SetDownTimer`].
pub trait SessionStore {
    fn save(&mut self, timer: &SetDownTimer) -> Result<()>;
    fn load(&self) -> Result<Option<SetDownTimer>>;
    fn clear(&mut self) -> Result<()>;
}

/// In-memory store. Holds the serialized form, like the kv store would.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Option<String>,
}

impl SessionStore for MemorySessionStore {
    fn save(&mut self, timer: &SetDownTimer) -> Result<()> {
        self.slot = Some(serde_json::to_string(timer)?);
        Ok(())
    }

    fn load(&self) -> Result<Option<SetDownTimer>> {
        match &self.slot {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn clear(&mut self) -> Result<()> {
        self.slot = None;
        Ok(())
    }
}

/// Store backed by the database kv table.
pub struct KvSessionStore<'a> {
    db: &'a Database,
    key: &'static str,
}

impl<'a> KvSessionStore<'a> {
    pub const DEFAULT_KEY: &'static str = "setdown_timer";

    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            key: Self::DEFAULT_KEY,
        }
    }
}

impl SessionStore for KvSessionStore<'_> {
    fn save(&mut self, timer: &SetDownTimer) -> Result<()> {
        let json = serde_json::to_string(timer)?;
        self.db.kv_set(self.key, &json)?;
        Ok(())
    }

    fn load(&self) -> Result<Option<SetDownTimer>> {
        match self.db.kv_get(self.key)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn clear(&mut self) -> Result<()> {
        self.db.kv_delete(self.key)?;
        Ok(())
    }
}
