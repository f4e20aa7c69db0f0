use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::cart::Cart;

/// Per-user state that lives between requests.
#[derive(Debug, Default)]
pub struct SessionContext {
    pub cart: Cart,
    pub last_order_id: Option<Uuid>,
}

pub type SharedContext = Arc<Mutex<SessionContext>>;

struct Slot {
    context: SharedContext,
    last_seen: Instant,
}

/// In-process session store. Each user's context has its own async lock so
/// one user's checkout never blocks another's cart. Contexts idle for longer
/// than `idle_ttl` are dropped by [`SessionStore::evict_idle`].
pub struct SessionStore {
    slots: Mutex<HashMap<Uuid, Slot>>,
    idle_ttl: Duration,
}

impl SessionStore {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            idle_ttl,
        }
    }

    /// Context of `user_id`, created on first use. Callers must make sure the
    /// user exists before creating one.
    pub async fn context(&self, user_id: Uuid) -> SharedContext {
        let now = Instant::now();
        let mut slots = self.slots.lock().await;
        let slot = slots.entry(user_id).or_insert_with(|| Slot {
            context: SharedContext::default(),
            last_seen: now,
        });
        slot.last_seen = now;
        Arc::clone(&slot.context)
    }

    /// Context of `user_id` if one is live. Never creates one.
    pub async fn existing(&self, user_id: Uuid) -> Option<SharedContext> {
        let now = Instant::now();
        let mut slots = self.slots.lock().await;
        let stale = {
            let slot = slots.get(&user_id)?;
            now.duration_since(slot.last_seen) >= self.idle_ttl
                && Arc::strong_count(&slot.context) == 1
        };
        if stale {
            slots.remove(&user_id);
            return None;
        }
        let slot = slots.get_mut(&user_id)?;
        slot.last_seen = now;
        Some(Arc::clone(&slot.context))
    }

    /// Drops every idle context and returns how many were removed.
    pub async fn evict_idle(&self) -> usize {
        self.evict_idle_at(Instant::now()).await
    }

    async fn evict_idle_at(&self, now: Instant) -> usize {
        let mut slots = self.slots.lock().await;
        let before = slots.len();
        // A context still held by a request is kept even when stale.
        slots.retain(|_, slot| {
            now.duration_since(slot.last_seen) < self.idle_ttl
                || Arc::strong_count(&slot.context) > 1
        });
        let evicted = before - slots.len();
        if evicted > 0 {
            log::debug!("Evicted {} idle sessions", evicted);
        }
        evicted
    }

    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }

    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
