//! The cookie capability the stores read from and write to.
//!
//! Stores only talk to [`CookieAccess`]. [`Cookies`] is a ready-made
//! implementation over the request's `Cookie` header that records writes and
//! renders them as `Set-Cookie` headers afterwards.

pub mod signing;

use std::sync::{Mutex, MutexGuard};

use cookie::{Cookie, CookieJar};
use http::HeaderMap;
use http::header::{COOKIE, SET_COOKIE};

use crate::Options;
use crate::error::{Result, SessionError};
pub use signing::{SIGNATURE_SUFFIX, SigningKeys};

/// Read/write access to one request's cookies.
pub trait CookieAccess: Send + Sync {
    /// Value of cookie `name`, `None` when absent or empty.
    ///
    /// With `signed`, a present value must carry a valid companion signature,
    /// otherwise [`SessionError::Integrity`] is returned.
    fn get(&self, name: &str, signed: bool) -> Result<Option<String>>;
    /// Writes cookie `name`, with a companion signature when `options` are signed.
    ///
    /// Fails with [`SessionError::MissingKeys`] and writes nothing when a
    /// signature is required but no key is available.
    fn set(&self, name: &str, value: &str, options: &Options) -> Result<()>;
    fn remove(&self, name: &str, options: &Options);
}

#[derive(Debug, Default)]
pub struct Cookies {
    jar: Mutex<CookieJar>,
    keys: SigningKeys,
}

impl Cookies {
    pub fn new(keys: SigningKeys) -> Self {
        Cookies {
            jar: Mutex::new(CookieJar::new()),
            keys,
        }
    }

    /// Parses a `Cookie` request header value, skipping malformed pairs.
    pub fn parse(header: &str, keys: SigningKeys) -> Self {
        let cookies = Cookies::new(keys);
        cookies.add_header(header);
        cookies
    }

    pub fn from_headers(headers: &HeaderMap, keys: SigningKeys) -> Self {
        let cookies = Cookies::new(keys);
        for value in headers.get_all(COOKIE) {
            if let Ok(header) = value.to_str() {
                cookies.add_header(header);
            }
        }
        cookies
    }

    fn add_header(&self, header: &str) {
        let mut jar = self.jar();
        for cookie in Cookie::split_parse(header.to_string()).flatten() {
            jar.add_original(cookie.into_owned());
        }
    }

    fn jar(&self) -> MutexGuard<'_, CookieJar> {
        self.jar.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn raw(jar: &CookieJar, name: &str) -> Option<String> {
        jar.get(name)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Cookies written or removed through this jar so far.
    pub fn delta(&self) -> Vec<Cookie<'static>> {
        self.jar().delta().cloned().collect()
    }

    /// Appends one `Set-Cookie` header per written or removed cookie.
    pub fn write_to(&self, headers: &mut HeaderMap) {
        for cookie in self.delta() {
            if let Ok(value) = cookie.to_string().parse() {
                headers.append(SET_COOKIE, value);
            }
        }
    }
}

impl CookieAccess for Cookies {
    fn get(&self, name: &str, signed: bool) -> Result<Option<String>> {
        let jar = self.jar();
        let Some(value) = Self::raw(&jar, name) else {
            return Ok(None);
        };
        if !signed {
            return Ok(Some(value));
        }
        match Self::raw(&jar, &format!("{name}{SIGNATURE_SUFFIX}")) {
            Some(signature) if self.keys.verify(name, &value, &signature) => Ok(Some(value)),
            _ => Err(SessionError::Integrity {
                name: name.to_string(),
            }),
        }
    }

    fn set(&self, name: &str, value: &str, options: &Options) -> Result<()> {
        if options.signed && self.keys.is_empty() {
            tracing::warn!(cookie = name, "signed cookie requested but no signing keys configured");
            return Err(SessionError::MissingKeys {
                name: name.to_string(),
            });
        }
        let mut jar = self.jar();
        jar.add(options.build(name, value));
        if let Some(signature) = options.signed.then(|| self.keys.sign(name, value)).flatten() {
            jar.add(options.build(&format!("{name}{SIGNATURE_SUFFIX}"), &signature));
        }
        Ok(())
    }

    fn remove(&self, name: &str, options: &Options) {
        let mut jar = self.jar();
        let mut cookie = options.build(name, "");
        cookie.make_removal();
        jar.add(cookie);
        if options.signed {
            let mut signature = options.build(&format!("{name}{SIGNATURE_SUFFIX}"), "");
            signature.make_removal();
            jar.add(signature);
        }
    }
}
