//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::clock::{Clock, SystemClock};
use crate::config::SiteConfig;
use crate::db::ContentStore;
use crate::services::{
    AccessPolicy, CredentialValidator, LoginThrottle, MemoryLoginThrottle, SessionCodec,
    ThrottleSettings,
};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the content store and the auth services.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    pool: Option<PgPool>,
    store: Arc<dyn ContentStore>,
    sessions: SessionCodec,
    credentials: CredentialValidator,
    throttle: Arc<dyn LoginThrottle>,
    policy: AccessPolicy,
    clock: Arc<dyn Clock>,
}

impl AppState {
    /// Create application state with the system clock and an in-memory
    /// login throttle.
    ///
    /// # Arguments
    ///
    /// * `config` - Site configuration
    /// * `store` - Content store
    /// * `pool` - `PostgreSQL` pool backing `store`, if any (used by readiness checks)
    #[must_use]
    pub fn new(config: SiteConfig, store: Arc<dyn ContentStore>, pool: Option<PgPool>) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let throttle = Arc::new(MemoryLoginThrottle::new(
            ThrottleSettings::default(),
            clock.clone(),
        ));
        Self::with_services(config, store, pool, clock, throttle)
    }

    /// Create application state with an explicit clock and throttle.
    #[must_use]
    pub fn with_services(
        config: SiteConfig,
        store: Arc<dyn ContentStore>,
        pool: Option<PgPool>,
        clock: Arc<dyn Clock>,
        throttle: Arc<dyn LoginThrottle>,
    ) -> Self {
        let sessions = SessionCodec::new(&config.auth, clock.clone());
        let credentials = CredentialValidator::new(&config.auth);
        let policy = AccessPolicy::new(store.clone(), config.auth.admin_allowed_keys.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                store,
                sessions,
                credentials,
                throttle,
                policy,
                clock,
            }),
        }
    }

    /// Get a reference to the site configuration.
    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    /// Get the database pool, when running against `PostgreSQL`.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Get the content store.
    #[must_use]
    pub fn store(&self) -> &dyn ContentStore {
        self.inner.store.as_ref()
    }

    /// Get the session codec.
    #[must_use]
    pub fn sessions(&self) -> &SessionCodec {
        &self.inner.sessions
    }

    /// Get the credential validator.
    #[must_use]
    pub fn credentials(&self) -> &CredentialValidator {
        &self.inner.credentials
    }

    /// Get the login throttle.
    #[must_use]
    pub fn throttle(&self) -> &dyn LoginThrottle {
        self.inner.throttle.as_ref()
    }

    /// Get a shared handle to the login throttle (for the sweep task).
    #[must_use]
    pub fn throttle_handle(&self) -> Arc<dyn LoginThrottle> {
        self.inner.throttle.clone()
    }

    /// Get the admin access policy.
    #[must_use]
    pub fn policy(&self) -> &AccessPolicy {
        &self.inner.policy
    }

    /// Get the clock.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.inner.clock.as_ref()
    }
}
