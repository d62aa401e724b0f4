use crate::models::RiskSignals;
use regex::Regex;

/// Dots allowed in a URL before it counts as having excessive subdomains.
const MAX_DOTS: usize = 2;

/// Stateless rule-based URL evaluator.
///
/// Never fails: malformed input simply matches none of the rules.
pub struct HeuristicEvaluator {
    suspicious_pattern: Regex,
    ip_host_pattern: Regex,
}

impl Default for HeuristicEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl HeuristicEvaluator {
    pub fn new() -> Self {
        Self {
            // Credential-bait keyword followed by at least two more dot-separated labels
            suspicious_pattern: Regex::new(
                r"(?:login|secure|verify|account|bank|paypal|update|confirm).*\..*\.",
            )
            .expect("Suspicious keyword regex pattern is valid"),
            // Dotted quad at the start of the host, after an optional scheme and userinfo
            ip_host_pattern: Regex::new(
                r"^(?:[a-z][a-z0-9+.\-]*://)?(?:[^/@]*@)?(?:[0-9]{1,3}\.){3}[0-9]{1,3}",
            )
            .expect("IP host regex pattern is valid"),
        }
    }

    /// Evaluate every rule independently against the URL.
    pub fn evaluate(&self, url: &str) -> RiskSignals {
        let url_lower = url.trim().to_lowercase();
        let dot_count = url_lower.matches('.').count();

        let signals = RiskSignals {
            has_suspicious_pattern: self.suspicious_pattern.is_match(&url_lower),
            has_ip_address: self.ip_host_pattern.is_match(&url_lower),
            has_excessive_subdomains: dot_count > MAX_DOTS,
            dot_count,
        };

        if signals.is_suspicious() {
            tracing::debug!(
                suspicious_pattern = signals.has_suspicious_pattern,
                ip_address = signals.has_ip_address,
                excessive_subdomains = signals.has_excessive_subdomains,
                "Heuristic signals raised"
            );
        }

        signals
    }
}
