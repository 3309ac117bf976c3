#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use cookie::Cookie;
use cookie_session::{Cookies, SigningKeys};
use http::HeaderMap;
use http::header::SET_COOKIE;

/// Carries cookies from one response to the next request, like a browser.
#[derive(Debug, Default)]
pub struct Browser {
    cookies: BTreeMap<String, String>,
}

impl Browser {
    pub fn new() -> Self {
        Browser::default()
    }

    /// Jar for a new request carrying every cookie received so far.
    pub fn request(&self, keys: &[&str]) -> Arc<Cookies> {
        let header = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        Arc::new(Cookies::parse(&header, SigningKeys::new(keys)))
    }

    /// Applies the `Set-Cookie` headers a request's jar produced.
    pub fn receive(&mut self, response: &Cookies) -> usize {
        let mut headers = HeaderMap::new();
        response.write_to(&mut headers);
        for value in headers.get_all(SET_COOKIE) {
            let cookie = Cookie::parse(value.to_str().unwrap().to_string()).unwrap();
            if cookie.value().is_empty() || cookie.max_age() == Some(time::Duration::ZERO) {
                self.cookies.remove(cookie.name());
            } else {
                self.cookies
                    .insert(cookie.name().to_string(), cookie.value().to_string());
            }
        }
        headers.get_all(SET_COOKIE).iter().count()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
