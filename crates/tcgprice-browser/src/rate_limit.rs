use crate::error::{BrowserError, Result};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Fixed delay between consecutive requests to the same domain.
///
/// Callers reserve a slot and sleep for the returned duration. Reservations
/// are handed out in order, so concurrent callers for one domain end up at
/// least `min_delay` apart.
#[derive(Debug)]
pub struct RateLimiter {
    next_slot: HashMap<String, Instant>,
    min_delay: Duration,
}

impl RateLimiter {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            next_slot: HashMap::new(),
            min_delay,
        }
    }

    /// Reserve the next request slot for `domain`, returning how long to wait.
    pub fn reserve(&mut self, domain: &str, now: Instant) -> Duration {
        let slot = match self.next_slot.get(domain) {
            Some(&next) if next > now => next,
            _ => now,
        };
        self.next_slot
            .insert(domain.to_string(), slot + self.min_delay);
        slot - now
    }
}

/// Helper to extract domain from URL
pub fn extract_domain(url: &str) -> Result<String> {
    let url = url::Url::parse(url)
        .map_err(|e| BrowserError::NavigationError(format!("Invalid URL: {e}")))?;

    url.host_str()
        .ok_or_else(|| BrowserError::NavigationError("No host in URL".to_string()))
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_spaces_requests() {
        let mut limiter = RateLimiter::new(Duration::from_millis(100));
        let start = Instant::now();

        assert_eq!(limiter.reserve("example.com", start), Duration::ZERO);
        assert_eq!(
            limiter.reserve("example.com", start),
            Duration::from_millis(100)
        );
        assert_eq!(
            limiter.reserve("example.com", start),
            Duration::from_millis(200)
        );

        // Once the delay has passed, no wait is needed
        let later = start + Duration::from_secs(1);
        assert_eq!(limiter.reserve("example.com", later), Duration::ZERO);
    }

    #[test]
    fn test_rate_limiter_different_domains() {
        let mut limiter = RateLimiter::new(Duration::from_millis(100));
        let now = Instant::now();

        assert_eq!(limiter.reserve("example.com", now), Duration::ZERO);
        assert_eq!(limiter.reserve("other.com", now), Duration::ZERO);
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(
            extract_domain("https://www.tcgplayer.com/product/1").expect("valid url"),
            "www.tcgplayer.com"
        );
        assert_eq!(
            extract_domain("http://subdomain.example.com:8080/path").expect("valid url"),
            "subdomain.example.com"
        );
        assert!(extract_domain("not-a-url").is_err());
    }
}
