use std::sync::Arc;

use redis::aio::ConnectionManager;
use redis::{cmd, Client, RedisError};
use tokio::sync::RwLock;

#[derive(Clone)]
pub(crate) struct RedisHandle {
    url: String,
    manager: Arc<RwLock<Option<ConnectionManager>>>,
}

#[derive(Debug, Clone)]
pub(crate) enum RedisHealth {
    Healthy,
    Disconnected,
    Unhealthy(String),
}

impl RedisHandle {
    pub(crate) fn new(url: String) -> Self {
        Self { url, manager: Arc::new(RwLock::new(None)) }
    }

    pub(crate) async fn connect(&self) -> Result<(), RedisError> {
        let client = Client::open(self.url.clone())?;
        let manager = ConnectionManager::new(client).await?;
        let mut guard = self.manager.write().await;
        *guard = Some(manager);
        Ok(())
    }

    pub(crate) async fn disconnect(&self) {
        let mut guard = self.manager.write().await;
        *guard = None;
    }

    pub(crate) async fn health(&self) -> RedisHealth {
        let manager = { self.manager.read().await.clone() };
        let Some(mut manager) = manager else {
            return RedisHealth::Disconnected;
        };

        match cmd("PING").query_async::<_, String>(&mut manager).await {
            Ok(_) => RedisHealth::Healthy,
            Err(err) => RedisHealth::Unhealthy(err.to_string()),
        }
    }

    /// Counts one hit against the fixed window at `key`. The first hit in a
    /// window starts its expiry. A disconnected handle admits everything.
    pub(crate) async fn hit_window(
        &self,
        key: &str,
        limit: u64,
        window_seconds: u64,
    ) -> Result<WindowState, RedisError> {
        let manager = { self.manager.read().await.clone() };
        let Some(mut manager) = manager else {
            return Ok(WindowState::unlimited(limit, window_seconds));
        };

        let script = redis::Script::new(FIXED_WINDOW_SCRIPT);
        let (current, ttl): (i64, i64) =
            script.key(key).arg(window_seconds as i64).invoke_async(&mut manager).await?;

        let current = u64::try_from(current).unwrap_or(0);
        Ok(WindowState {
            allowed: current <= limit,
            limit,
            remaining: limit.saturating_sub(current),
            reset_after: u64::try_from(ttl).unwrap_or(window_seconds),
        })
    }
}

const FIXED_WINDOW_SCRIPT: &str = r#"
    local current = redis.call("INCR", KEYS[1])
    if current == 1 then
        redis.call("EXPIRE", KEYS[1], ARGV[1])
    end
    return { current, redis.call("TTL", KEYS[1]) }
"#;

/// Outcome of one hit against a fixed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WindowState {
    pub(crate) allowed: bool,
    pub(crate) limit: u64,
    pub(crate) remaining: u64,
    pub(crate) reset_after: u64,
}

impl WindowState {
    fn unlimited(limit: u64, window_seconds: u64) -> Self {
        Self { allowed: true, limit, remaining: limit, reset_after: window_seconds }
    }
}

#[cfg(test)]
mod tests {
    use super::RedisHandle;
    use crate::core::config::Settings;
    use crate::test_support;
    use uuid::Uuid;

    #[tokio::test]
    async fn rate_limit_enforces_limit() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();

        let settings = Settings::load().expect("settings");
        test_support::reset_redis(settings.redis().redis_url()).await.expect("redis reset");

        let redis = RedisHandle::new(settings.redis().redis_url());
        redis.connect().await.expect("redis connect");

        let key = format!("rate-limit:{}", Uuid::new_v4());
        let first = redis.hit_window(&key, 1, 5).await.expect("rate limit");
        let second = redis.hit_window(&key, 1, 5).await.expect("rate limit");

        assert!(first.allowed);
        assert_eq!(first.remaining, 0);
        assert!(!second.allowed);
        assert!(second.reset_after <= 5);
    }

    #[tokio::test]
    async fn disconnected_handle_allows_and_reports() {
        let redis = RedisHandle::new("redis://127.0.0.1:1/0".to_string());

        let state = redis.hit_window("rate-limit:any", 1, 5).await.expect("rate limit");
        assert!(state.allowed);
        assert_eq!(state.remaining, 1);
        assert!(matches!(redis.health().await, super::RedisHealth::Disconnected));
    }
}
