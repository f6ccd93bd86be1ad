use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Per-email login failure tracker.
///
/// Failure timestamps are kept and counted over the trailing `window`. Once
/// `max_failures` of them fall inside it, login attempts for that email are
/// rejected until enough failures age out, regardless of whether the
/// submitted password is correct.
pub struct LoginGuard {
    failures: DashMap<String, Vec<Instant>>,
    max_failures: usize,
    window: Duration,
}

impl LoginGuard {
    pub fn new(max_failures: u32, window: Duration) -> Self {
        Self {
            failures: DashMap::new(),
            max_failures: max_failures as usize,
            window,
        }
    }

    pub fn from_env() -> Self {
        let max_failures = std::env::var("LOGIN_MAX_FAILURES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5u32);
        let window_secs = std::env::var("LOGIN_FAILURE_WINDOW_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3600u64);

        tracing::info!(
            "Login guard: max {} failures in {}s window",
            max_failures,
            window_secs
        );

        Self::new(max_failures, Duration::from_secs(window_secs))
    }

    fn key(email: &str) -> String {
        email.trim().to_lowercase()
    }

    /// Record a failed login for the given email.
    pub fn record_failure(&self, email: &str) {
        let now = Instant::now();
        let mut entry = self.failures.entry(Self::key(email)).or_default();
        let timestamps = entry.value_mut();

        timestamps.retain(|t| now.duration_since(*t) < self.window);
        timestamps.push(now);

        if timestamps.len() >= self.max_failures {
            tracing::warn!(
                "Login lockout for {} ({} failures in window)",
                Self::key(email),
                timestamps.len()
            );
        }
    }

    /// Whether login attempts for this email are currently locked out.
    pub fn is_locked(&self, email: &str) -> bool {
        let now = Instant::now();
        self.failures
            .get(&Self::key(email))
            .map(|timestamps| {
                timestamps
                    .iter()
                    .filter(|t| now.duration_since(**t) < self.window)
                    .count()
                    >= self.max_failures
            })
            .unwrap_or(false)
    }

    /// Clear tracking after a successful login.
    pub fn record_success(&self, email: &str) {
        self.failures.remove(&Self::key(email));
    }

    /// Drop aged-out timestamps and empty records. Called periodically by a
    /// background task.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.failures.retain(|_, timestamps| {
            timestamps.retain(|t| now.duration_since(*t) < self.window);
            !timestamps.is_empty()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locks_after_max_failures() {
        let guard = LoginGuard::new(5, Duration::from_secs(3600));

        for _ in 0..4 {
            guard.record_failure("user@example.com");
        }
        assert!(!guard.is_locked("user@example.com"));

        guard.record_failure("user@example.com");
        assert!(guard.is_locked("user@example.com"));
    }

    #[test]
    fn email_keys_are_case_insensitive() {
        let guard = LoginGuard::new(2, Duration::from_secs(3600));

        guard.record_failure("User@Example.com");
        guard.record_failure("user@example.COM");

        assert!(guard.is_locked("user@example.com"));
    }

    #[test]
    fn success_clears_tracking() {
        let guard = LoginGuard::new(2, Duration::from_secs(3600));

        guard.record_failure("user@example.com");
        guard.record_success("user@example.com");
        guard.record_failure("user@example.com");

        assert!(!guard.is_locked("user@example.com"));
    }

    #[test]
    fn lock_expires_with_the_window() {
        let guard = LoginGuard::new(1, Duration::from_millis(10));

        guard.record_failure("user@example.com");
        assert!(guard.is_locked("user@example.com"));

        std::thread::sleep(Duration::from_millis(20));
        assert!(!guard.is_locked("user@example.com"));
    }

    #[test]
    fn window_trails_rather_than_resetting_at_the_first_failure() {
        let guard = LoginGuard::new(4, Duration::from_millis(500));

        // One failure, then two more late in its window.
        guard.record_failure("user@example.com");
        std::thread::sleep(Duration::from_millis(300));
        guard.record_failure("user@example.com");
        guard.record_failure("user@example.com");

        // Past the first failure's horizon now, but the trailing window
        // still holds the two late ones plus these two.
        std::thread::sleep(Duration::from_millis(250));
        guard.record_failure("user@example.com");
        guard.record_failure("user@example.com");
        assert!(guard.is_locked("user@example.com"));

        // Once the late pair ages out only two remain in the window.
        std::thread::sleep(Duration::from_millis(300));
        assert!(!guard.is_locked("user@example.com"));
    }

    #[test]
    fn other_emails_are_unaffected() {
        let guard = LoginGuard::new(1, Duration::from_secs(3600));

        guard.record_failure("a@example.com");
        assert!(!guard.is_locked("b@example.com"));
    }

    #[test]
    fn cleanup_drops_stale_records() {
        let guard = LoginGuard::new(1, Duration::from_millis(10));

        guard.record_failure("user@example.com");
        std::thread::sleep(Duration::from_millis(20));
        guard.cleanup();

        assert!(guard.failures.is_empty());
    }
}
