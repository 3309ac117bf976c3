use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Result, SessionError};
use crate::{CookieAccess, SessionStore, Values};

/// Anything a session can carry: a serde type with an empty default.
pub trait SessionData: Serialize + DeserializeOwned + Default + Send + Sync + 'static {}

impl<T> SessionData for T where T: Serialize + DeserializeOwned + Default + Send + Sync + 'static {}

/// Identity and bookkeeping of a session, owned by the [`Session`].
///
/// Stores fill it in on load and keep it current on save; application code
/// only reads it.
pub struct Meta<T> {
    name: String,
    sid: String,
    last_encoded: String,
    store: Option<Arc<dyn SessionStore<T>>>,
    cookies: Option<Arc<dyn CookieAccess>>,
}

impl<T> Default for Meta<T> {
    fn default() -> Self {
        Meta {
            name: String::new(),
            sid: String::new(),
            last_encoded: String::new(),
            store: None,
            cookies: None,
        }
    }
}

impl<T> fmt::Debug for Meta<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Meta")
            .field("name", &self.name)
            .field("sid", &self.sid)
            .field("last_encoded", &self.last_encoded)
            .field("bound", &self.store.is_some())
            .finish()
    }
}

impl<T> Meta<T> {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn sid(&self) -> &str {
        &self.sid
    }
    /// Wire form of the value as last loaded or saved, empty if none.
    pub fn last_encoded(&self) -> &str {
        &self.last_encoded
    }
    pub fn store(&self) -> Option<&Arc<dyn SessionStore<T>>> {
        self.store.as_ref()
    }

    pub(crate) fn init(
        &mut self,
        name: &str,
        store: Arc<dyn SessionStore<T>>,
        cookies: Arc<dyn CookieAccess>,
    ) {
        self.name = name.to_string();
        self.sid.clear();
        self.last_encoded.clear();
        self.store = Some(store);
        self.cookies = Some(cookies);
    }
    pub(crate) fn loaded(&mut self, sid: &str, encoded: &str) {
        self.sid = sid.to_string();
        self.last_encoded = encoded.to_string();
    }
    pub(crate) fn is_changed(&self, encoded: &str) -> bool {
        self.last_encoded != encoded
    }
    pub(crate) fn saved(&mut self, sid: String, encoded: String) {
        self.sid = sid;
        self.last_encoded = encoded;
    }
    pub(crate) fn forget(&mut self) {
        self.sid.clear();
        self.last_encoded.clear();
    }
    pub(crate) fn bound_cookies(&self) -> Result<&Arc<dyn CookieAccess>> {
        self.cookies
            .as_ref()
            .ok_or_else(|| SessionError::Unbound(self.name.clone()))
    }
}

/// Per-request view of a named session.
///
/// Build one with [`Session::new`], hand it to [`SessionStore::load`], then
/// read and mutate the value through `Deref`/`DerefMut` or
/// [`values_mut`](Session::values_mut), and call [`save`](Session::save).
/// `T` is [`Values`] for a dynamic bag or any typed struct:
///
/// ```rust
/// use cookie_session::Session;
///
/// #[derive(Default, serde::Serialize, serde::Deserialize)]
/// struct Account {
///     user_id: String,
///     authed: i64,
/// }
///
/// let mut session: Session<Account> = Session::new();
/// session.user_id = "user123".to_string();
/// assert!(session.is_new());
/// ```
#[derive(Debug, Default)]
pub struct Session<T = Values> {
    meta: Meta<T>,
    values: T,
}

impl<T: SessionData> Session<T> {
    pub fn new() -> Self {
        Session::default()
    }
    pub fn name(&self) -> &str {
        self.meta.name()
    }
    /// Server-side identifier, empty for cookie-backed sessions and before the first save.
    pub fn sid(&self) -> &str {
        self.meta.sid()
    }
    pub fn store(&self) -> Option<&Arc<dyn SessionStore<T>>> {
        self.meta.store()
    }
    pub fn meta(&self) -> &Meta<T> {
        &self.meta
    }
    pub(crate) fn meta_mut(&mut self) -> &mut Meta<T> {
        &mut self.meta
    }
    /// True while the session holds nothing loaded from or saved to its store.
    pub fn is_new(&self) -> bool {
        self.meta.last_encoded.is_empty()
    }
    pub fn values(&self) -> &T {
        &self.values
    }
    pub fn values_mut(&mut self) -> &mut T {
        &mut self.values
    }
    pub(crate) fn replace_values(&mut self, values: T) {
        self.values = values;
    }
    /// Persists the session through the store that loaded it.
    ///
    /// Does nothing when the value encodes the same as it did after load or
    /// the previous save.
    pub fn save(&mut self) -> Result<()> {
        let store = self.bound_store()?;
        store.save(self)
    }
    pub fn destroy(&mut self) -> Result<()> {
        let store = self.bound_store()?;
        store.destroy(self)
    }
    fn bound_store(&self) -> Result<Arc<dyn SessionStore<T>>> {
        self.meta
            .store
            .clone()
            .ok_or_else(|| SessionError::Unbound(self.meta.name.clone()))
    }
}

impl<T> Deref for Session<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.values
    }
}

impl<T> DerefMut for Session<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.values
    }
}
