//! Stateful strategy: the cookie carries an opaque SID, the value stays in
//! process memory until it expires or is destroyed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use rand::RngCore;
use sha256::Sha256Digest;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::error::Result;
use crate::inner::codec;
use crate::{CookieAccess, Options, Session, SessionData, SessionStore, SweepConfig};

#[derive(Debug)]
struct SessionValue {
    payload: String,
    expires_at: Instant,
}

type Entries = Mutex<HashMap<String, SessionValue>>;

#[derive(Debug)]
struct Inner {
    options: Options,
    sweep: SweepConfig,
    entries: Arc<Entries>,
    stop: watch::Sender<bool>,
}

/// Sessions kept in a process-local map keyed by SID.
///
/// The store is a cheap handle; clones share the same map. Construction
/// spawns the expiry sweeper on the current Tokio runtime, which runs until
/// [`close`](MemoryStore::close) is called or the last handle is dropped.
///
/// A non-positive `max_age` makes saved entries expire immediately.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

impl MemoryStore {
    /// Store with a one-day lifetime, `Path=/` and `HttpOnly` cookies.
    ///
    /// # Panics
    /// Outside of a Tokio runtime.
    pub fn new() -> Self {
        MemoryStore::with_options(Options::new().max_age(time::Duration::days(1)))
    }
    pub fn with_options(options: Options) -> Self {
        MemoryStore::with_config(options, SweepConfig::default())
    }
    pub fn with_config(options: Options, sweep: SweepConfig) -> Self {
        let entries = Arc::new(Mutex::new(HashMap::new()));
        let (stop, stopped) = watch::channel(false);
        tokio::spawn(run_sweeper(entries.clone(), sweep.clone(), stopped));
        MemoryStore {
            inner: Arc::new(Inner {
                options,
                sweep,
                entries,
                stop,
            }),
        }
    }

    pub fn options(&self) -> &Options {
        &self.inner.options
    }

    /// Number of entries, expired-but-unswept ones included.
    pub fn len(&self) -> usize {
        self.entries().len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Stops the background sweeper. Calling it again has no effect.
    pub fn close(&self) {
        self.inner.stop.send_replace(true);
    }

    /// Runs one sweep right away and returns how many entries it evicted.
    pub fn sweep(&self) -> usize {
        sweep(&self.inner.entries, &self.inner.sweep)
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, SessionValue>> {
        lock(&self.inner.entries)
    }

    fn expiry(&self) -> Instant {
        let ttl = std::time::Duration::try_from(self.inner.options.max_age).unwrap_or_default();
        let now = Instant::now();
        now.checked_add(ttl)
            .unwrap_or_else(|| now + std::time::Duration::from_secs(u32::MAX as u64))
    }
}

impl<T: SessionData> SessionStore<T> for MemoryStore {
    fn load(&self, name: &str, session: &mut Session<T>, cookies: Arc<dyn CookieAccess>) -> Result<()> {
        session.meta_mut().init(name, Arc::new(self.clone()), cookies.clone());
        session.replace_values(T::default());

        let sid = cookies
            .get(name, self.inner.options.signed)
            .inspect_err(|err| tracing::debug!(session = name, %err, "rejected session cookie"))?;
        let Some(sid) = sid else {
            return Ok(());
        };
        let payload = {
            let entries = self.entries();
            entries
                .get(&sid)
                .filter(|value| value.expires_at > Instant::now())
                .map(|value| value.payload.clone())
        };
        // unknown or expired SIDs are never reused, a new one is minted on save
        let Some(payload) = payload else {
            return Ok(());
        };
        match codec::decode::<T>(&payload) {
            Ok(values) => {
                session.replace_values(values);
                session.meta_mut().loaded(&sid, &payload);
                Ok(())
            }
            Err(err) => {
                tracing::debug!(session = name, %err, "undecodable stored session");
                session.meta_mut().loaded(&sid, "");
                Err(err)
            }
        }
    }

    fn save(&self, session: &mut Session<T>) -> Result<()> {
        let encoded = codec::encode(session.values())?;
        if !session.meta().is_changed(&encoded) {
            tracing::trace!(session = session.name(), "session unchanged, skipping write");
            return Ok(());
        }
        let cookies = session.meta().bound_cookies()?.clone();
        let sid = match session.sid() {
            "" => {
                let sid = new_sid(&encoded);
                tracing::debug!(session = session.name(), "minted session id");
                sid
            }
            sid => sid.to_string(),
        };

        cookies.set(session.name(), &sid, &self.inner.options)?;
        let value = SessionValue {
            payload: encoded.clone(),
            expires_at: self.expiry(),
        };
        self.entries().insert(sid.clone(), value);
        session.meta_mut().saved(sid, encoded);
        Ok(())
    }

    fn destroy(&self, session: &mut Session<T>) -> Result<()> {
        let cookies = session.meta().bound_cookies()?.clone();
        if !session.sid().is_empty() {
            self.entries().remove(session.sid());
        }
        cookies.remove(session.name(), &self.inner.options);
        session.meta_mut().forget();
        Ok(())
    }
}

fn lock(entries: &Entries) -> MutexGuard<'_, HashMap<String, SessionValue>> {
    entries.lock().unwrap_or_else(|e| e.into_inner())
}

/// SHA-256 over the payload and 16 fresh random bytes, as 64 hex characters.
fn new_sid(payload: &str) -> String {
    let mut salt = [0u8; 16];
    rand::rng().fill_bytes(&mut salt);
    let mut seed = Vec::with_capacity(payload.len() + salt.len());
    seed.extend_from_slice(payload.as_bytes());
    seed.extend_from_slice(&salt);
    seed.as_slice().digest()
}

fn sweep(entries: &Entries, config: &SweepConfig) -> usize {
    let mut entries = lock(entries);
    let start = Instant::now();
    let mut evicted = 0;
    for _ in 0..config.max_rounds {
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, value)| value.expires_at <= start)
            .take(config.round_size)
            .map(|(sid, _)| sid.clone())
            .collect();
        for sid in &expired {
            entries.remove(sid);
        }
        evicted += expired.len();
        if expired.len() <= config.round_size / 4 || start.elapsed() >= config.time_budget {
            break;
        }
    }
    if evicted > 0 {
        tracing::debug!(evicted, remaining = entries.len(), "swept expired sessions");
    }
    evicted
}

async fn run_sweeper(entries: Arc<Entries>, config: SweepConfig, mut stop: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                sweep(&entries, &config);
            }
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
        }
    }
    tracing::debug!("session sweeper stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cookies, SessionError, SigningKeys, Values};
    use rstest::rstest;
    use std::time::Duration;

    fn idle_store(options: Options, round_size: usize, max_rounds: usize) -> MemoryStore {
        MemoryStore::with_config(
            options,
            SweepConfig::new()
                .interval(Duration::from_secs(3600))
                .round_size(round_size)
                .max_rounds(max_rounds),
        )
    }

    fn fill(store: &MemoryStore, count: usize, expires_at: Instant) {
        let mut entries = store.entries();
        for i in 0..count {
            entries.insert(
                format!("sid-{i}"),
                SessionValue {
                    payload: "W10".to_string(),
                    expires_at,
                },
            );
        }
    }

    #[rstest]
    fn test_new_sid_is_hex_and_unique() {
        let first = new_sid("W10");
        let second = new_sid("W10");

        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_sweep_keeps_live_entries() {
        let store = idle_store(Options::new(), 8, 8);
        fill(&store, 5, Instant::now() + Duration::from_secs(60));

        assert_eq!(store.sweep(), 0);
        assert_eq!(store.len(), 5);
    }

    #[tokio::test]
    async fn test_sweep_rounds_are_bounded() {
        let store = idle_store(Options::new(), 4, 2);
        fill(&store, 20, Instant::now());

        assert_eq!(store.sweep(), 8);
        assert_eq!(store.len(), 12);
    }

    #[tokio::test]
    async fn test_sweep_stops_when_eviction_rate_drops() {
        let store = idle_store(Options::new(), 8, 64);
        fill(&store, 10, Instant::now());

        // 8 in the first round, 2 in the second, which is below a quarter
        assert_eq!(store.sweep(), 10);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_sweep_stops_when_time_budget_spent() {
        let store = MemoryStore::with_config(
            Options::new(),
            SweepConfig::new()
                .interval(Duration::from_secs(3600))
                .time_budget(Duration::ZERO)
                .round_size(4)
                .max_rounds(64),
        );
        fill(&store, 20, Instant::now());

        assert_eq!(store.sweep(), 4);
        assert_eq!(store.len(), 16);
    }

    #[tokio::test]
    async fn test_save_with_unbounded_max_age() {
        let store = idle_store(Options::new().max_age(time::Duration::MAX), 8, 8);
        let cookies = Arc::new(Cookies::new(SigningKeys::default()));
        let mut session: Session<Values> = Session::new();
        store.load("s", &mut session, cookies.clone()).unwrap();
        session.insert("a", 1);

        session.save().unwrap();

        let mut reloaded: Session<Values> = Session::new();
        store.load("s", &mut reloaded, cookies).unwrap();
        assert_eq!(reloaded.get_as::<i64>("a"), Some(1));
        assert_eq!(store.sweep(), 0);
    }

    #[tokio::test]
    async fn test_signed_save_without_keys_stores_nothing() {
        let store = idle_store(Options::new().signed(true).max_age(time::Duration::minutes(1)), 8, 8);
        let cookies = Arc::new(Cookies::new(SigningKeys::default()));
        let mut session: Session<Values> = Session::new();
        store.load("s", &mut session, cookies.clone()).unwrap();
        session.insert("a", 1);

        let err = session.save().unwrap_err();

        assert!(matches!(err, SessionError::MissingKeys { ref name } if name == "s"));
        assert!(store.is_empty());
        assert!(cookies.delta().is_empty());
        assert!(session.is_new());
    }

    #[tokio::test]
    async fn test_save_mints_sid_once() {
        let store = idle_store(Options::new().max_age(time::Duration::minutes(1)), 8, 8);
        let cookies = Arc::new(Cookies::new(SigningKeys::default()));
        let mut session: Session<Values> = Session::new();
        store.load("teambition", &mut session, cookies.clone()).unwrap();
        session.insert("name", "mushroom");

        session.save().unwrap();
        let sid = session.sid().to_string();
        session.save().unwrap();

        assert_eq!(sid.len(), 64);
        assert_eq!(session.sid(), sid);
        assert_eq!(store.len(), 1);
        assert_eq!(cookies.delta().len(), 1);
        assert_eq!(cookies.get("teambition", false).unwrap(), Some(sid));
    }

    #[tokio::test]
    async fn test_expired_entry_is_not_loaded_before_sweep() {
        let store = idle_store(Options::new().max_age(time::Duration::seconds(-1)), 8, 8);
        let cookies = Arc::new(Cookies::new(SigningKeys::default()));
        let mut session: Session<Values> = Session::new();
        store.load("s", &mut session, cookies.clone()).unwrap();
        session.insert("a", 1);
        session.save().unwrap();

        let mut reloaded: Session<Values> = Session::new();
        store.load("s", &mut reloaded, cookies).unwrap();

        assert_eq!(store.len(), 1);
        assert!(reloaded.is_new());
        assert_eq!(reloaded.sid(), "");
        assert!(reloaded.values().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_entry_keeps_sid_and_resets_values() {
        let store = idle_store(Options::new().max_age(time::Duration::minutes(1)), 8, 8);
        store.entries().insert(
            "known".to_string(),
            SessionValue {
                payload: "not json".to_string(),
                expires_at: Instant::now() + Duration::from_secs(60),
            },
        );
        let cookies = Arc::new(Cookies::parse("s=known", SigningKeys::default()));
        let mut session: Session<Values> = Session::new();

        let err = store.load("s", &mut session, cookies).unwrap_err();
        session.insert("a", 1);
        session.save().unwrap();

        assert!(err.is_decoding());
        assert_eq!(session.sid(), "known");
        assert_eq!(store.len(), 1);
    }
}
