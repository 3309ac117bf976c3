//! Stateless strategy: the whole encoded value is the cookie.

use std::sync::Arc;

use crate::error::Result;
use crate::inner::codec;
use crate::{CookieAccess, Options, Session, SessionData, SessionStore};

/// Keeps each session entirely inside its own cookie.
///
/// Nothing is held server-side, so any number of processes can serve the
/// same clients. Enable [`Options::signed`] to reject client-edited cookies.
#[derive(Debug, Clone, Default)]
pub struct CookieStore {
    options: Options,
}

impl CookieStore {
    pub fn new(options: Options) -> Self {
        CookieStore { options }
    }
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Like [`SessionStore::save`], but writes the cookie with `options`
    /// instead of the store's own.
    pub fn save_with<T: SessionData>(&self, session: &mut Session<T>, options: &Options) -> Result<()> {
        let encoded = codec::encode(session.values())?;
        if !session.meta().is_changed(&encoded) {
            tracing::trace!(session = session.name(), "cookie session unchanged, skipping write");
            return Ok(());
        }
        let cookies = session.meta().bound_cookies()?.clone();
        cookies.set(session.name(), &encoded, options)?;
        session.meta_mut().saved(String::new(), encoded);
        Ok(())
    }
}

impl<T: SessionData> SessionStore<T> for CookieStore {
    fn load(&self, name: &str, session: &mut Session<T>, cookies: Arc<dyn CookieAccess>) -> Result<()> {
        session.meta_mut().init(name, Arc::new(self.clone()), cookies.clone());
        session.replace_values(T::default());

        let raw = cookies
            .get(name, self.options.signed)
            .inspect_err(|err| tracing::debug!(session = name, %err, "rejected session cookie"))?;
        let Some(raw) = raw else {
            return Ok(());
        };
        let values = codec::decode::<T>(&raw)
            .inspect_err(|err| tracing::debug!(session = name, %err, "undecodable session cookie"))?;
        session.replace_values(values);
        session.meta_mut().loaded("", &raw);
        Ok(())
    }

    fn save(&self, session: &mut Session<T>) -> Result<()> {
        self.save_with(session, &self.options)
    }

    fn destroy(&self, session: &mut Session<T>) -> Result<()> {
        let cookies = session.meta().bound_cookies()?.clone();
        cookies.remove(session.name(), &self.options);
        session.meta_mut().forget();
        Ok(())
    }
}
