use cookie::{Cookie, SameSite};
use time::{Duration, OffsetDateTime, PrimitiveDateTime};

/// Cookie attributes applied to every cookie a store writes.
///
/// `max_age` follows cookie semantics: zero leaves the cookie without an
/// expiry (a browser-session cookie), a negative value expires it
/// immediately, a positive value keeps it for that long.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub(crate) path: String,
    pub(crate) domain: String,
    pub(crate) max_age: Duration,
    pub(crate) secure: bool,
    pub(crate) http_only: bool,
    pub(crate) same_site: Option<SameSite>,
    pub(crate) signed: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            path: "/".to_string(),
            domain: "".to_string(),
            max_age: Duration::ZERO,
            secure: false,
            http_only: true,
            same_site: None,
            signed: false,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Options::default()
    }
    pub fn path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }
    pub fn domain(mut self, domain: &str) -> Self {
        self.domain = domain.to_string();
        self
    }
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }
    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }
    /// Require a companion signature on every cookie read and written.
    ///
    /// Saving under signed options fails with
    /// [`SessionError::MissingKeys`](crate::SessionError::MissingKeys) when the
    /// request's [`Cookies`](crate::Cookies) jar was built without keys.
    pub fn signed(mut self, signed: bool) -> Self {
        self.signed = signed;
        self
    }

    pub fn get_path(&self) -> &str {
        &self.path
    }
    pub fn get_domain(&self) -> &str {
        &self.domain
    }
    pub fn get_max_age(&self) -> Duration {
        self.max_age
    }
    pub fn is_secure(&self) -> bool {
        self.secure
    }
    pub fn is_http_only(&self) -> bool {
        self.http_only
    }
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// Builds the `Set-Cookie` representation of `name=value` under these options.
    pub(crate) fn build(&self, name: &str, value: &str) -> Cookie<'static> {
        let mut builder = Cookie::build((name.to_string(), value.to_string()))
            .path(self.path.clone())
            .secure(self.secure)
            .http_only(self.http_only);
        if !self.domain.is_empty() {
            builder = builder.domain(self.domain.clone());
        }
        if let Some(same_site) = self.same_site {
            builder = builder.same_site(same_site);
        }
        if self.max_age.is_positive() {
            let expires = OffsetDateTime::now_utc()
                .checked_add(self.max_age)
                .unwrap_or_else(|| PrimitiveDateTime::MAX.assume_utc());
            builder = builder.max_age(self.max_age).expires(expires);
        } else if self.max_age.is_negative() {
            builder = builder
                .max_age(Duration::ZERO)
                .expires(OffsetDateTime::UNIX_EPOCH);
        }
        builder.build()
    }
}

/// Tuning of the in-memory store's background expiry sweep.
///
/// Each tick evicts expired entries in rounds of at most `round_size`. Another
/// round follows only while the previous one evicted more than a quarter of
/// `round_size`, `max_rounds` is not reached and `time_budget` is not spent.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub(crate) interval: std::time::Duration,
    pub(crate) time_budget: std::time::Duration,
    pub(crate) round_size: usize,
    pub(crate) max_rounds: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            interval: std::time::Duration::from_secs(1),
            time_budget: std::time::Duration::from_millis(100),
            round_size: 1024,
            max_rounds: 64,
        }
    }
}

impl SweepConfig {
    pub fn new() -> Self {
        SweepConfig::default()
    }
    pub fn interval(mut self, interval: std::time::Duration) -> Self {
        assert!(!interval.is_zero(), "sweep interval must be non-zero");
        self.interval = interval;
        self
    }
    pub fn time_budget(mut self, time_budget: std::time::Duration) -> Self {
        self.time_budget = time_budget;
        self
    }
    pub fn round_size(mut self, round_size: usize) -> Self {
        assert!(round_size > 0, "round_size must be greater than 0");
        self.round_size = round_size;
        self
    }
    pub fn max_rounds(mut self, max_rounds: usize) -> Self {
        assert!(max_rounds > 0, "max_rounds must be greater than 0");
        self.max_rounds = max_rounds;
        self
    }
}
