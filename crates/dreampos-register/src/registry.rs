//! # Session Registry
//!
//! Open checkout sessions, keyed by id, shared across the threads serving a
//! register.
//!
//! ## Thread Safety
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Session Registry                                     │
//! │                                                                         │
//! │   Arc<Mutex<HashMap<Uuid, CheckoutSession>>>                           │
//! │                                                                         │
//! │   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐               │
//! │   │  session A   │   │  session B   │   │  session C   │               │
//! │   │  cart        │   │  cart        │   │  cart        │               │
//! │   │  split       │   │  split       │   │  split       │               │
//! │   └──────────────┘   └──────────────┘   └──────────────┘               │
//! │                                                                         │
//! │   Every access holds the lock for the length of one closure, so a      │
//! │   mutation and its lock check are atomic. Sessions share nothing.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A poisoned lock surfaces as `RegisterError::LockPoisoned` instead of a panic.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use dreampos_core::{CheckoutSession, CoreResult};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{RegisterError, RegisterResult};

/// Shared map of open checkout sessions. Cloning shares the same map.
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<Uuid, CheckoutSession>>>,
    default_payer_count: usize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(dreampos_core::DEFAULT_PAYER_COUNT)
    }
}

impl SessionRegistry {
    /// Sessions opened here start their splits with `default_payer_count` payers.
    pub fn new(default_payer_count: usize) -> Self {
        SessionRegistry {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            default_payer_count,
        }
    }

    fn lock(&self) -> RegisterResult<MutexGuard<'_, HashMap<Uuid, CheckoutSession>>> {
        self.sessions.lock().map_err(|_| RegisterError::LockPoisoned)
    }

    /// Opens a new empty session and returns its id.
    pub fn open(&self) -> RegisterResult<Uuid> {
        let session = CheckoutSession::with_payer_count(self.default_payer_count)?;
        let id = session.id();
        self.lock()?.insert(id, session);
        info!(session = %id, "Checkout session opened");
        Ok(id)
    }

    /// Runs `f` with read access to one session.
    pub fn with_session<F, R>(&self, id: Uuid, f: F) -> RegisterResult<R>
    where
        F: FnOnce(&CheckoutSession) -> R,
    {
        let sessions = self.lock()?;
        let session = sessions.get(&id).ok_or(RegisterError::SessionNotFound(id))?;
        Ok(f(session))
    }

    /// Runs a fallible mutation against one session.
    ///
    /// ```rust
    /// use dreampos_core::{Money, Product, VariationSelection};
    /// use dreampos_register::registry::SessionRegistry;
    ///
    /// let registry = SessionRegistry::default();
    /// let id = registry.open().unwrap();
    /// let water = Product::new("water", Money::from_cents(150));
    ///
    /// registry
    ///     .with_session_mut(id, |s| s.add_item(&water, &VariationSelection::none(), 2))
    ///     .unwrap();
    /// let total = registry.with_session(id, |s| s.totals().total).unwrap();
    /// assert_eq!(total.cents(), 300);
    /// ```
    pub fn with_session_mut<F, R>(&self, id: Uuid, f: F) -> RegisterResult<R>
    where
        F: FnOnce(&mut CheckoutSession) -> CoreResult<R>,
    {
        let mut sessions = self.lock()?;
        let session = sessions
            .get_mut(&id)
            .ok_or(RegisterError::SessionNotFound(id))?;
        Ok(f(session)?)
    }

    /// Removes a session, returning it.
    pub fn close(&self, id: Uuid) -> RegisterResult<CheckoutSession> {
        let session = self
            .lock()?
            .remove(&id)
            .ok_or(RegisterError::SessionNotFound(id))?;
        debug!(session = %id, "Checkout session closed");
        Ok(session)
    }

    pub fn contains(&self, id: Uuid) -> RegisterResult<bool> {
        Ok(self.lock()?.contains_key(&id))
    }

    pub fn len(&self) -> RegisterResult<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> RegisterResult<bool> {
        Ok(self.lock()?.is_empty())
    }
}
