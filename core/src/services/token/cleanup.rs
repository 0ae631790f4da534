//! Periodic removal of expired refresh token records
//!
//! The sweep runs off the request path. Its timing only affects how much
//! dead data the store holds, never whether a token is accepted: expired
//! records are rejected on lookup whether or not they were swept yet.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use tw_shared::CleanupConfig;

use crate::repositories::TokenRepository;

use super::service::TokenService;

/// Sweep schedule
#[derive(Debug, Clone)]
pub struct TokenCleanupConfig {
    pub interval_seconds: u64,
    pub enabled: bool,
}

impl Default for TokenCleanupConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 3600,
            enabled: true,
        }
    }
}

impl From<&CleanupConfig> for TokenCleanupConfig {
    fn from(config: &CleanupConfig) -> Self {
        Self {
            interval_seconds: config.interval_seconds,
            enabled: config.enabled,
        }
    }
}

/// Deletes refresh token records whose expiry has passed
pub struct TokenCleanupService<R: TokenRepository + 'static> {
    service: Arc<TokenService<R>>,
    config: TokenCleanupConfig,
}

impl<R: TokenRepository + 'static> TokenCleanupService<R> {
    pub fn new(service: Arc<TokenService<R>>, config: TokenCleanupConfig) -> Self {
        Self { service, config }
    }

    /// One sweep
    ///
    /// A storage failure is reported in the result instead of aborting, so
    /// the next scheduled sweep still runs.
    pub async fn run_cleanup(&self) -> CleanupResult {
        let mut result = CleanupResult::default();
        if !self.config.enabled {
            return result;
        }

        let started = Instant::now();
        match self.service.cleanup_expired_tokens().await {
            Ok(count) => result.expired_tokens_deleted = count,
            Err(e) => {
                error!("Expired token sweep failed: {}", e);
                result.errors.push(e.to_string());
            }
        }
        result.elapsed = started.elapsed();

        if result.expired_tokens_deleted > 0 {
            info!(
                "Swept {} expired refresh tokens in {:?}",
                result.expired_tokens_deleted, result.elapsed
            );
        } else {
            debug!("Expired token sweep found nothing to delete");
        }
        result
    }

    /// Spawn the sweep loop on the current tokio runtime
    ///
    /// Returns `None` when sweeping is disabled. The first sweep runs right
    /// away; a sweep that overruns the interval delays the next one instead
    /// of bunching them up.
    pub fn start_background_task(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.config.enabled {
            warn!("Expired token sweep is disabled; the store will keep dead records");
            return None;
        }

        let period = Duration::from_secs(self.config.interval_seconds.max(1));
        info!("Sweeping expired refresh tokens every {:?}", period);

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let result = self.run_cleanup().await;
                if !result.is_success() {
                    warn!("Sweep finished with {} error(s)", result.errors.len());
                }
            }
        }))
    }
}

/// Outcome of one sweep
#[derive(Debug, Default)]
pub struct CleanupResult {
    pub expired_tokens_deleted: usize,
    pub errors: Vec<String>,
    pub elapsed: Duration,
}

impl CleanupResult {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}
