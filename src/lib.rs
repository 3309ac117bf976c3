//! # cookie-session
//!
//! Cookie-carried HTTP sessions with interchangeable persistence strategies.
//!
//! ## Features
//!
//! - **Two stores**: [`CookieStore`] keeps the whole session in the cookie,
//!   [`MemoryStore`] keeps it server-side and only puts an opaque SID in the cookie
//! - **Signed cookies**: an HMAC-SHA256 companion cookie rejects client edits,
//!   with key rotation
//! - **Write only on change**: saving an unchanged session sends no cookie and
//!   touches no storage
//! - **Self-expiring memory store**: a background sweeper evicts expired entries
//!   in bounded batches
//! - **Typed or dynamic values**: any serde type with a `Default`, or the
//!   [`Values`] bag keyed by strings and integers
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use cookie_session::{Cookies, MemoryStore, Session, SessionStore, SigningKeys};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), cookie_session::SessionError> {
//!     let store = MemoryStore::new();
//!
//!     // one jar per request, built from its `Cookie` header
//!     let cookies = Arc::new(Cookies::parse("", SigningKeys::new(["secret"])));
//!     let mut session: Session = Session::new();
//!     store.load("teambition", &mut session, cookies.clone())?;
//!
//!     session.insert("name", "mushroom");
//!     session.insert(66, 99);
//!     session.save()?;
//!
//!     // `Set-Cookie: teambition=<sid>; ...`
//!     let mut headers = http::HeaderMap::new();
//!     cookies.write_to(&mut headers);
//!     assert_eq!(headers.len(), 1);
//!
//!     store.close();
//!     Ok(())
//! }
//! ```
//!
//! ## Typed sessions
//!
//! ```rust
//! use std::sync::Arc;
//! use cookie_session::{CookieStore, Cookies, Options, Session, SessionStore, SigningKeys};
//!
//! #[derive(Default, serde::Serialize, serde::Deserialize)]
//! struct Account {
//!     user_id: String,
//!     authed: i64,
//! }
//!
//! let store = CookieStore::new(Options::new().signed(true));
//! let cookies = Arc::new(Cookies::parse("", SigningKeys::new(["secret"])));
//! let mut session: Session<Account> = Session::new();
//! store.load("Sess", &mut session, cookies.clone()).unwrap();
//!
//! session.user_id = "user123".to_string();
//! session.save().unwrap();
//! assert_eq!(cookies.delta().len(), 2); // payload and `Sess.sig`
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use cookie_session::{Options, SweepConfig};
//!
//! let options = Options::new()
//!     .path("/")
//!     .domain("example.com")
//!     .max_age(time::Duration::hours(24))
//!     .secure(true)
//!     .http_only(true)
//!     .same_site(cookie::SameSite::Lax)
//!     .signed(true);
//!
//! let sweep = SweepConfig::new()
//!     .interval(std::time::Duration::from_secs(1))
//!     .time_budget(std::time::Duration::from_millis(100));
//! ```

pub mod cookies;
pub mod error;
pub mod inner;
pub mod storage;

pub use cookies::*;
pub use error::{DecodeError, SessionError};
pub use inner::*;
pub use storage::*;
