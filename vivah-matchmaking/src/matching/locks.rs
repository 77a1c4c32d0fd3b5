use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use vivah_shared::clients::redis::RedisClient;
use vivah_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::PairKey;

const LOCK_PREFIX: &str = "matching:pair_lock";
const REDIS_RETRY_DELAY: Duration = Duration::from_millis(25);

/// Serializes match-state writes for one unordered pair of users. Writes for
/// different pairs never wait on each other.
#[async_trait]
pub trait PairLocker: Send + Sync {
    async fn acquire(&self, pair: PairKey) -> AppResult<PairLease>;
}

/// Held while a pair's match state is being changed. Call [`PairLease::release`]
/// when done; a dropped lease unlocks locally and expires in Redis.
pub struct PairLease {
    inner: LeaseInner,
}

enum LeaseInner {
    Local {
        guard: OwnedMutexGuard<()>,
        slots: Slots,
        pair: PairKey,
    },
    Redis {
        redis: RedisClient,
        key: String,
        token: String,
    },
}

impl PairLease {
    pub async fn release(self) {
        match self.inner {
            LeaseInner::Local { guard, slots, pair } => {
                drop(guard);
                let mut slots = slots.lock().unwrap_or_else(|p| p.into_inner());
                // Only the map still points at the mutex: nobody holds or waits on it.
                if slots.get(&pair).is_some_and(|m| Arc::strong_count(m) == 1) {
                    slots.remove(&pair);
                }
            }
            LeaseInner::Redis { redis, key, token } => {
                match redis.del_if_eq(&key, &token).await {
                    Ok(true) => {}
                    Ok(false) => tracing::warn!(key = %key, "pair lock expired before release"),
                    Err(e) => tracing::error!(error = %e, key = %key, "failed to release pair lock"),
                }
            }
        }
    }
}

type Slots = Arc<Mutex<HashMap<PairKey, Arc<tokio::sync::Mutex<()>>>>>;

/// In-process locks, one async mutex per pair currently in use.
pub struct LocalPairLocks {
    slots: Slots,
    wait: Duration,
}

impl LocalPairLocks {
    pub fn new(wait: Duration) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            wait,
        }
    }

    pub fn active_pairs(&self) -> usize {
        self.slots.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

#[async_trait]
impl PairLocker for LocalPairLocks {
    async fn acquire(&self, pair: PairKey) -> AppResult<PairLease> {
        let mutex = {
            let mut slots = self.slots.lock().unwrap_or_else(|p| p.into_inner());
            slots.entry(pair).or_default().clone()
        };

        let guard = tokio::time::timeout(self.wait, mutex.lock_owned())
            .await
            .map_err(|_| busy(pair))?;

        Ok(PairLease {
            inner: LeaseInner::Local {
                guard,
                slots: self.slots.clone(),
                pair,
            },
        })
    }
}

/// Cross-instance locks: `SET NX EX` with a random token, compare-and-delete
/// on release.
pub struct RedisPairLocks {
    redis: RedisClient,
    ttl: Duration,
    wait: Duration,
}

impl RedisPairLocks {
    pub fn new(redis: RedisClient, ttl: Duration, wait: Duration) -> Self {
        Self { redis, ttl, wait }
    }
}

#[async_trait]
impl PairLocker for RedisPairLocks {
    async fn acquire(&self, pair: PairKey) -> AppResult<PairLease> {
        let key = format!("{LOCK_PREFIX}:{pair}");
        let token = Uuid::new_v4().to_string();
        let deadline = tokio::time::Instant::now() + self.wait;

        loop {
            let acquired = self
                .redis
                .set_nx(&key, &token, self.ttl.as_secs().max(1))
                .await
                .map_err(|e| AppError::Internal(e.into()))?;

            if acquired {
                return Ok(PairLease {
                    inner: LeaseInner::Redis {
                        redis: self.redis.clone(),
                        key,
                        token,
                    },
                });
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(busy(pair));
            }
            tokio::time::sleep(REDIS_RETRY_DELAY).await;
        }
    }
}

fn busy(pair: PairKey) -> AppError {
    tracing::warn!(pair = %pair, "timed out waiting for pair lock");
    AppError::new(
        ErrorCode::ServiceUnavailable,
        "match state is being updated, try again",
    )
}
