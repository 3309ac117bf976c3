use std::sync::Arc;

use crate::error::Result;
use crate::{CookieAccess, Session};

/// A persistence strategy for sessions.
///
/// `load` always leaves the session initialised: bound to this store and to
/// `cookies`, and either holding the persisted value or a fresh default. An
/// error means the persisted state was unusable (tampered, malformed) and the
/// session now acts as new.
pub trait SessionStore<T>: Send + Sync + 'static {
    fn load(&self, name: &str, session: &mut Session<T>, cookies: Arc<dyn CookieAccess>) -> Result<()>;
    /// Writes the session back, skipped entirely when its encoding is unchanged.
    fn save(&self, session: &mut Session<T>) -> Result<()>;
    fn destroy(&self, session: &mut Session<T>) -> Result<()>;
}

pub mod cookie_store;
pub mod memory;

pub use cookie_store::CookieStore;
pub use memory::MemoryStore;
