//! Rate Limiting Infrastructure
//!
//! Per-client admission control shared by every processing endpoint.
//!
//! Two checks are applied to each request, in order:
//! - **cooldown**: a client must leave `cooldown` between admitted requests
//! - **sliding window**: a client may have at most `max_requests` admitted
//!   requests inside the trailing `window`
//!
//! Both counters are kept per client. The table lives behind a mutex so a
//! client's read-modify-write is atomic under concurrent requests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Rate limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Minimum spacing between admitted requests (zero disables)
    pub cooldown: Duration,
    /// Maximum requests allowed in the window (zero disables)
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_millis(500),
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(cooldown_ms: u64, max_requests: u32, window_secs: u64) -> Self {
        Self {
            cooldown: Duration::from_millis(cooldown_ms),
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Cooldown only, no window cap
    pub fn cooldown_only(cooldown: Duration) -> Self {
        Self {
            cooldown,
            max_requests: 0,
            window: Duration::ZERO,
        }
    }

    fn window_enabled(&self) -> bool {
        self.max_requests > 0 && !self.window.is_zero()
    }
}

/// Why a request was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Cooldown,
    WindowFull,
}

/// Rate limit check result
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub allowed: bool,
    /// Requests left in the current window (`u32::MAX` when the window is disabled)
    pub remaining: u32,
    /// How long the client should wait before retrying (zero when allowed)
    pub retry_after: Duration,
    pub rejection: Option<Rejection>,
}

impl RateLimitResult {
    fn allowed(remaining: u32) -> Self {
        Self {
            allowed: true,
            remaining,
            retry_after: Duration::ZERO,
            rejection: None,
        }
    }

    fn rejected(rejection: Rejection, remaining: u32, retry_after: Duration) -> Self {
        Self {
            allowed: false,
            remaining,
            retry_after,
            rejection: Some(rejection),
        }
    }
}

/// Per-client bookkeeping
#[derive(Debug)]
struct AdmissionRecord {
    last_seen: Instant,
    /// Admitted request times inside the window, oldest first
    hits: VecDeque<Instant>,
}

/// Admission controller keyed by client identifier (usually the source IP)
#[derive(Debug)]
pub struct AdmissionController {
    config: RateLimitConfig,
    table: Mutex<HashMap<String, AdmissionRecord>>,
}

impl Default for AdmissionController {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

impl AdmissionController {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            table: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true and records the request if the client may proceed
    pub fn admit(&self, client_id: &str) -> bool {
        self.admit_at(client_id, Instant::now())
    }

    /// [`admit`](Self::admit) against a caller-supplied clock
    pub fn admit_at(&self, client_id: &str, now: Instant) -> bool {
        self.check_at(client_id, now).allowed
    }

    /// Like [`admit`](Self::admit) but reports why and for how long
    pub fn check(&self, client_id: &str) -> RateLimitResult {
        self.check_at(client_id, Instant::now())
    }

    pub fn check_at(&self, client_id: &str, now: Instant) -> RateLimitResult {
        let mut table = self.table();
        let window_enabled = self.config.window_enabled();

        let Some(record) = table.get_mut(client_id) else {
            let mut hits = VecDeque::new();
            if window_enabled {
                hits.push_back(now);
            }
            table.insert(
                client_id.to_string(),
                AdmissionRecord {
                    last_seen: now,
                    hits,
                },
            );
            return RateLimitResult::allowed(self.remaining_after(1));
        };

        if window_enabled {
            while let Some(&oldest) = record.hits.front() {
                if now.saturating_duration_since(oldest) >= self.config.window {
                    record.hits.pop_front();
                } else {
                    break;
                }
            }
        }
        let used = record.hits.len() as u32;

        let since_last = now.saturating_duration_since(record.last_seen);
        if since_last < self.config.cooldown {
            return RateLimitResult::rejected(
                Rejection::Cooldown,
                self.remaining_after(used),
                self.config.cooldown - since_last,
            );
        }

        if window_enabled && used >= self.config.max_requests {
            let retry_after = record
                .hits
                .front()
                .map(|&oldest| {
                    self.config
                        .window
                        .saturating_sub(now.saturating_duration_since(oldest))
                })
                .unwrap_or(self.config.window);
            return RateLimitResult::rejected(Rejection::WindowFull, 0, retry_after);
        }

        record.last_seen = now;
        if window_enabled {
            record.hits.push_back(now);
        }
        RateLimitResult::allowed(self.remaining_after(used + 1))
    }

    /// Drop clients whose last admitted request is older than `staleness`
    ///
    /// A record is never dropped while its cooldown or window could still
    /// reject the client, so a short `staleness` cannot reset the cap.
    pub fn prune(&self, staleness: Duration) -> usize {
        self.prune_at(Instant::now(), staleness)
    }

    pub fn prune_at(&self, now: Instant, staleness: Duration) -> usize {
        let keep_for = staleness.max(self.config.cooldown).max(self.config.window);
        let mut table = self.table();
        let before = table.len();
        table.retain(|_, record| now.saturating_duration_since(record.last_seen) <= keep_for);
        before - table.len()
    }

    /// Number of tracked clients
    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remaining_after(&self, used: u32) -> u32 {
        if self.config.window_enabled() {
            self.config.max_requests.saturating_sub(used)
        } else {
            u32::MAX
        }
    }

    // A panic while holding the lock cannot leave a record half-written,
    // so a poisoned table is still usable.
    fn table(&self) -> MutexGuard<'_, HashMap<String, AdmissionRecord>> {
        self.table.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Admission table lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_cooldown_scenario() {
        let limiter = AdmissionController::new(RateLimitConfig::cooldown_only(ms(500)));
        let t0 = Instant::now();

        assert!(limiter.admit_at("1.2.3.4", t0));
        assert!(!limiter.admit_at("1.2.3.4", t0 + ms(200)));
        assert!(limiter.admit_at("1.2.3.4", t0 + ms(600)));
    }

    #[test]
    fn test_rejection_does_not_extend_cooldown() {
        let limiter = AdmissionController::new(RateLimitConfig::cooldown_only(ms(500)));
        let t0 = Instant::now();

        assert!(limiter.admit_at("a", t0));
        assert!(!limiter.admit_at("a", t0 + ms(400)));
        // Measured from the last admitted request, not the rejected one
        assert!(limiter.admit_at("a", t0 + ms(500)));
    }

    #[test]
    fn test_cooldown_retry_after() {
        let limiter = AdmissionController::new(RateLimitConfig::cooldown_only(ms(500)));
        let t0 = Instant::now();

        limiter.check_at("a", t0);
        let result = limiter.check_at("a", t0 + ms(200));
        assert!(!result.allowed);
        assert_eq!(result.rejection, Some(Rejection::Cooldown));
        assert_eq!(result.retry_after, ms(300));
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = AdmissionController::new(RateLimitConfig::cooldown_only(ms(500)));
        let t0 = Instant::now();

        assert!(limiter.admit_at("a", t0));
        assert!(limiter.admit_at("b", t0));
        assert!(!limiter.admit_at("a", t0 + ms(1)));
        assert_eq!(limiter.len(), 2);
    }

    #[test]
    fn test_sliding_window_caps_per_client() {
        let limiter = AdmissionController::new(RateLimitConfig::new(0, 3, 60));
        let t0 = Instant::now();

        for i in 0..3 {
            assert!(limiter.admit_at("a", t0 + Duration::from_secs(i)));
        }
        let result = limiter.check_at("a", t0 + Duration::from_secs(3));
        assert!(!result.allowed);
        assert_eq!(result.rejection, Some(Rejection::WindowFull));
        assert_eq!(result.remaining, 0);
        assert_eq!(result.retry_after, Duration::from_secs(57));

        // Another client is not affected by "a" being at its cap
        assert!(limiter.admit_at("b", t0 + Duration::from_secs(3)));
    }

    #[test]
    fn test_sliding_window_slides() {
        let limiter = AdmissionController::new(RateLimitConfig::new(0, 2, 10));
        let t0 = Instant::now();

        assert!(limiter.admit_at("a", t0));
        assert!(limiter.admit_at("a", t0 + Duration::from_secs(5)));
        assert!(!limiter.admit_at("a", t0 + Duration::from_secs(9)));
        // The first hit has left the window
        assert!(limiter.admit_at("a", t0 + Duration::from_secs(10)));
    }

    #[test]
    fn test_remaining_counts_down() {
        let limiter = AdmissionController::new(RateLimitConfig::new(0, 3, 60));
        let t0 = Instant::now();

        assert_eq!(limiter.check_at("a", t0).remaining, 2);
        assert_eq!(limiter.check_at("a", t0 + ms(1)).remaining, 1);
        assert_eq!(limiter.check_at("a", t0 + ms(2)).remaining, 0);
    }

    #[test]
    fn test_prune_removes_only_stale_clients() {
        let limiter = AdmissionController::default();
        let t0 = Instant::now();

        limiter.admit_at("old", t0);
        limiter.admit_at("fresh", t0 + Duration::from_secs(50));

        let removed = limiter.prune_at(t0 + Duration::from_secs(70), Duration::from_secs(60));
        assert_eq!(removed, 1);
        assert_eq!(limiter.len(), 1);
        // "fresh" kept its record, so its cooldown still applies
        assert!(!limiter.admit_at("fresh", t0 + Duration::from_secs(50) + ms(100)));
    }

    #[test]
    fn test_prune_keeps_clients_inside_window() {
        let limiter = AdmissionController::new(RateLimitConfig::new(0, 3, 60));
        let t0 = Instant::now();
        for i in 0..3 {
            assert!(limiter.admit_at("a", t0 + Duration::from_secs(i)));
        }

        // Staleness shorter than the window must not forget the hits
        assert_eq!(limiter.prune_at(t0 + Duration::from_secs(15), Duration::from_secs(10)), 0);

        let admitted = (16..19)
            .filter(|&i| limiter.admit_at("a", t0 + Duration::from_secs(i)))
            .count();
        assert_eq!(admitted, 0);

        // Once the window has passed the record goes
        assert_eq!(limiter.prune_at(t0 + Duration::from_secs(63), Duration::from_secs(10)), 1);
    }

    #[test]
    fn test_prune_on_empty_table() {
        let limiter = AdmissionController::default();
        assert_eq!(limiter.prune(Duration::from_secs(60)), 0);
        assert_eq!(limiter.prune(Duration::from_secs(60)), 0);
        assert!(limiter.is_empty());
    }

    #[test]
    fn test_concurrent_burst_admits_exactly_one() {
        let limiter = Arc::new(AdmissionController::new(RateLimitConfig::cooldown_only(
            Duration::from_secs(60),
        )));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || limiter.admit("same-client"))
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&ok| ok)
            .count();
        assert_eq!(admitted, 1);
    }
}
