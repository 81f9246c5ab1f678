//! Script-driven header and cookie refresh cache
//!
//! Before each outbound request the transport calls [`ScriptCache::prepare`]
//! with its per-request [`RequestHandle`]. The cache re-runs the configured
//! header and cookie commands when their cached values are missing or past
//! the renew interval, then publishes a private snapshot into the handle.
//!
//! One mutex covers the whole decide / run / publish sequence, so at most
//! one script subprocess runs at a time and no caller ever observes a
//! half-updated cache. The subprocess runs with the lock held: a slow
//! script serializes every request that needs the cache.

pub mod handle;
pub mod runner;

pub use handle::RequestHandle;
pub use runner::ScriptKind;

use crate::config::{Config, ScriptConfig};
use crate::error::ScriptCredsResult;
use chrono::{DateTime, Duration, Utc};
use runner::ScriptRun;
use tokio::sync::Mutex;
use tracing::{debug, error};

/// Per-kind refresh bookkeeping
#[derive(Debug, Default)]
struct Lane {
    /// Time of the last successful run. `None` until one succeeds, so a
    /// failed run is retried on the very next call.
    last_run: Option<DateTime<Utc>>,

    /// Attempt counter exposed to the script as `$iteration`. Increments
    /// once per attempt, success or failure, and never resets.
    iteration: u32,
}

impl Lane {
    /// A run is needed if none ever succeeded, or the kind is renewable
    /// and the interval has elapsed. `renew_secs == 0` means run once.
    fn is_stale(&self, renew_secs: u64, now: DateTime<Utc>) -> bool {
        match self.last_run {
            None => true,
            Some(last) => renew_secs > 0 && now - last >= Duration::seconds(renew_secs as i64),
        }
    }

    /// Counter value for the next attempt
    fn next_iteration(&mut self) -> u32 {
        let n = self.iteration;
        self.iteration += 1;
        n
    }
}

/// Mutable cache state, guarded by the single lock in [`ScriptCache`]
#[derive(Debug, Default)]
struct CacheState {
    header_lane: Lane,
    cookie_lane: Lane,

    /// Header lines from the last header-script run, in output order
    headers: Vec<String>,

    /// Cookie value from the last cookie-script run
    cookie: Option<String>,
}

impl CacheState {
    fn lane(&self, kind: ScriptKind) -> &Lane {
        match kind {
            ScriptKind::Header => &self.header_lane,
            ScriptKind::Cookie => &self.cookie_lane,
        }
    }

    fn lane_mut(&mut self, kind: ScriptKind) -> &mut Lane {
        match kind {
            ScriptKind::Header => &mut self.header_lane,
            ScriptKind::Cookie => &mut self.cookie_lane,
        }
    }
}

/// Process-wide cache of script-generated headers and cookie.
///
/// Construct one at startup and share it (e.g. behind an `Arc`) with
/// whichever component issues requests. Dropping it releases the cached
/// values; [`ScriptCache::clear`] does the same explicitly.
pub struct ScriptCache {
    config: Config,
    state: Mutex<CacheState>,
}

impl ScriptCache {
    /// Create a cache over validated configuration
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// The configuration this cache was built from
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Ensure fresh headers and cookie, then publish them into `handle`.
    ///
    /// Call just before issuing the request. On error the caller must abort
    /// the request rather than proceed with stale or partial state.
    pub async fn prepare(&self, handle: &mut RequestHandle) -> ScriptCredsResult<()> {
        // Common case: feature unused. Reads only immutable config, so it
        // is safe without the lock and adds no contention.
        if !self.config.uses_scripts() {
            return Ok(());
        }

        let mut state = self.state.lock().await;

        self.refresh(ScriptKind::Header, &mut state).await?;
        self.refresh(ScriptKind::Cookie, &mut state).await?;

        // Publish. The handle's previous header copy is dropped and replaced
        // with a fresh one even if nothing was refreshed this call; the
        // transport takes exclusive ownership of the list per request. The
        // cookie is copied by the transport, so a plain clone is enough.
        handle.set_headers(state.headers.clone());
        for header in handle.headers() {
            debug!("setting header {header}");
        }
        handle.set_cookie(state.cookie.clone());
        if let Some(cookie) = handle.cookie() {
            debug!("setting cookie {cookie}");
        }

        Ok(())
    }

    /// Drop the cached headers and cookie. Safe to call at any time,
    /// including when no script was ever configured or run.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.headers.clear();
        state.cookie = None;
    }

    fn script_config(&self, kind: ScriptKind) -> &ScriptConfig {
        match kind {
            ScriptKind::Header => &self.config.header,
            ScriptKind::Cookie => &self.config.cookie,
        }
    }

    /// Run the kind's script if its cached value is missing or stale.
    /// Called with the state lock held.
    async fn refresh(&self, kind: ScriptKind, state: &mut CacheState) -> ScriptCredsResult<()> {
        let script = self.script_config(kind);
        let Some(command) = script.command.as_deref() else {
            return Ok(());
        };

        let now = Utc::now();
        if !state.lane(kind).is_stale(script.renew_secs, now) {
            return Ok(());
        }

        // Reset the kind's cached value before the attempt. A failed run
        // leaves whatever output it managed to produce; see DESIGN.md.
        match kind {
            ScriptKind::Header => state.headers.clear(),
            ScriptKind::Cookie => state.cookie = None,
        }

        let iteration = state.lane_mut(kind).next_iteration();

        let ScriptRun { lines, outcome } =
            runner::run_script(kind, command, &self.config.url, iteration, script.timeout_secs)
                .await;

        match kind {
            ScriptKind::Header => {
                for line in lines {
                    if !line.is_empty() {
                        state.headers.push(line);
                    }
                }
            }
            ScriptKind::Cookie => {
                // Only the first line of output counts.
                if let Some(first) = lines.into_iter().next() {
                    if !first.is_empty() {
                        state.cookie = Some(first);
                    }
                }
            }
        }

        if let Err(e) = outcome {
            error!("{e}");
            return Err(e);
        }

        state.lane_mut(kind).last_run = Some(now);

        match kind {
            ScriptKind::Header => {
                debug!("{} returned {} header(s)", kind.label(), state.headers.len());
            }
            ScriptKind::Cookie => {
                debug!(
                    "{} returned {}cookies",
                    kind.label(),
                    if state.cookie.is_some() { "" } else { "no " }
                );
            }
        }

        Ok(())
    }
}
