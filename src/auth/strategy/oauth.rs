//! OAuth authentication strategy.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::Result;
use crate::auth::{OAuthCredential, OAuthParameters};

use super::resolution::{ResolutionWaiter, TokenResolution};

/// Contract for the external exchange flow backing an OAuth strategy.
///
/// The interactive authorization step (typically browser-based) and the
/// silent renewal policy both live outside the core; the strategy only
/// drives this request/response interface.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// Run the user-facing authorization step for the given client identity.
    async fn authorize(&self, parameters: &OAuthParameters) -> Result<OAuthCredential>;

    /// Silently renew a previously-issued credential.
    async fn refresh(
        &self,
        parameters: &OAuthParameters,
        credential: &OAuthCredential,
    ) -> Result<OAuthCredential>;
}

#[derive(Debug)]
enum Phase {
    /// Configured; the exchange has not produced a token yet.
    Pending,
    /// Token exchange completed.
    Authorized(OAuthCredential),
    /// Terminal.
    Deauthorized,
}

#[derive(Debug)]
struct Inner {
    phase: Phase,
    waiters: Vec<ResolutionWaiter>,
    refresh_in_flight: bool,
}

/// OAuth authentication strategy.
///
/// Starts in a pending phase; resolutions queue until the external exchange
/// reports back through [`OAuthStrategy::complete_authorization`]. Once
/// authorized, a stale credential with refresh material triggers at most one
/// in-flight silent refresh.
#[derive(Clone)]
pub struct OAuthStrategy {
    parameters: OAuthParameters,
    exchange: Arc<dyn TokenExchange>,
    inner: Arc<Mutex<Inner>>,
}

impl OAuthStrategy {
    /// Create a strategy awaiting its interactive exchange.
    pub fn new(parameters: OAuthParameters, exchange: Arc<dyn TokenExchange>) -> Self {
        Self::with_phase(parameters, exchange, Phase::Pending)
    }

    /// Reconstruct an authorized strategy from persisted credential material.
    pub fn restored(
        parameters: OAuthParameters,
        exchange: Arc<dyn TokenExchange>,
        credential: OAuthCredential,
    ) -> Self {
        Self::with_phase(parameters, exchange, Phase::Authorized(credential))
    }

    fn with_phase(
        parameters: OAuthParameters,
        exchange: Arc<dyn TokenExchange>,
        phase: Phase,
    ) -> Self {
        Self {
            parameters,
            exchange,
            inner: Arc::new(Mutex::new(Inner {
                phase,
                waiters: Vec::new(),
                refresh_in_flight: false,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn parameters(&self) -> &OAuthParameters {
        &self.parameters
    }

    /// The resolved credential, once the exchange has completed.
    pub fn credential(&self) -> Option<OAuthCredential> {
        match &self.lock().phase {
            Phase::Authorized(credential) => Some(credential.clone()),
            Phase::Pending | Phase::Deauthorized => None,
        }
    }

    pub fn is_authorized(&self) -> bool {
        match &self.lock().phase {
            Phase::Authorized(credential) => {
                !credential.is_expired() || credential.refresh_token.is_some()
            }
            Phase::Pending | Phase::Deauthorized => false,
        }
    }

    /// Begin a token resolution.
    ///
    /// Never blocks: either settles immediately from the held credential or
    /// queues until the exchange (interactive or refresh) reports back.
    pub fn resolve_access_token(&self) -> TokenResolution {
        let mut inner = self.lock();

        let refresh_with = match &inner.phase {
            Phase::Deauthorized => return TokenResolution::ready(None),
            Phase::Authorized(credential) if !credential.needs_refresh() => {
                return TokenResolution::ready(Some(credential.access_token.clone()));
            }
            Phase::Authorized(credential) if credential.refresh_token.is_none() => {
                // Stale with no refresh material: hand the token out while it
                // is still valid, otherwise resolve empty.
                return if credential.is_expired() {
                    TokenResolution::ready(None)
                } else {
                    TokenResolution::ready(Some(credential.access_token.clone()))
                };
            }
            Phase::Authorized(credential) => Some(credential.clone()),
            Phase::Pending => None,
        };

        let (waiter, resolution) = TokenResolution::pending();
        inner.waiters.push(waiter);

        if let Some(credential) = refresh_with
            && !inner.refresh_in_flight
        {
            inner.refresh_in_flight = true;
            drop(inner);
            self.spawn_refresh(credential);
        }

        resolution
    }

    /// Drive the interactive exchange on a background task.
    pub fn begin_authorization(&self) {
        let strategy = self.clone();
        tokio::spawn(async move {
            let result = strategy.exchange.authorize(&strategy.parameters).await;
            strategy.complete_authorization(result);
        });
    }

    /// Record the outcome of the interactive exchange.
    ///
    /// Queued resolutions settle with the new token on success, or with
    /// `None` on failure. A strategy deauthorized while the exchange ran
    /// ignores the outcome; its resolutions already settled.
    pub fn complete_authorization(&self, result: Result<OAuthCredential>) {
        self.settle_exchange(result, false);
    }

    fn spawn_refresh(&self, credential: OAuthCredential) {
        let strategy = self.clone();
        tokio::spawn(async move {
            let result = strategy
                .exchange
                .refresh(&strategy.parameters, &credential)
                .await;
            strategy.settle_exchange(result, true);
        });
    }

    fn settle_exchange(&self, result: Result<OAuthCredential>, from_refresh: bool) {
        let mut inner = self.lock();
        if from_refresh {
            inner.refresh_in_flight = false;
        }
        if matches!(inner.phase, Phase::Deauthorized) {
            return;
        }

        let waiters = std::mem::take(&mut inner.waiters);
        let outcome = match result {
            Ok(credential) => {
                let token = credential.access_token.clone();
                inner.phase = Phase::Authorized(credential);
                Some(token)
            }
            Err(err) => {
                tracing::warn!(from_refresh, "token exchange failed: {err}");
                None
            }
        };
        drop(inner);
        notify(waiters, outcome);
    }

    /// Discard the credential and settle pending resolutions with `None`.
    /// Idempotent.
    pub fn deauthorize(&self) {
        let mut inner = self.lock();
        if matches!(inner.phase, Phase::Deauthorized) {
            return;
        }
        inner.phase = Phase::Deauthorized;
        let waiters = std::mem::take(&mut inner.waiters);
        drop(inner);
        notify(waiters, None);
    }

    /// Settle pending resolutions with `None` without touching the phase.
    ///
    /// Called when the coordinator replaces this strategy: the results of a
    /// superseded strategy are no longer trusted, but its resolutions must
    /// still settle.
    pub(crate) fn invalidate_pending(&self) {
        let waiters = std::mem::take(&mut self.lock().waiters);
        notify(waiters, None);
    }
}

fn notify(waiters: Vec<ResolutionWaiter>, outcome: Option<String>) {
    for waiter in waiters {
        // A closed receiver means the caller stopped waiting; nothing to do.
        let _ = waiter.send(outcome.clone());
    }
}

impl fmt::Debug for OAuthStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthStrategy")
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}
