use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Decision boundary between "safe" and "phishing".
pub const DECISION_BOUNDARY: f32 = 0.5;

/// Boolean and scalar observations about a URL, produced by the heuristic evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskSignals {
    pub has_suspicious_pattern: bool,
    pub has_ip_address: bool,
    pub has_excessive_subdomains: bool,
    pub dot_count: usize,
}

impl RiskSignals {
    /// Any single signal raised.
    pub fn is_suspicious(&self) -> bool {
        self.has_suspicious_pattern || self.has_ip_address || self.has_excessive_subdomains
    }

    pub fn raised_count(&self) -> usize {
        [
            self.has_suspicious_pattern,
            self.has_ip_address,
            self.has_excessive_subdomains,
        ]
        .iter()
        .filter(|raised| **raised)
        .count()
    }
}

/// Final phishing determination for one URL.
///
/// `is_phishing` is always `probability > 0.5` and `confidence` is the
/// distance from that boundary scaled to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub is_phishing: bool,
    pub probability: f32,
    pub confidence: f32,
}

impl Verdict {
    /// Build a verdict from a model probability, clamping it into `[0, 1]` first.
    pub fn from_probability(probability: f32) -> Self {
        let probability = probability.clamp(0.0, 1.0);
        Self {
            is_phishing: probability > DECISION_BOUNDARY,
            probability,
            confidence: ((probability - DECISION_BOUNDARY).abs() * 2.0).clamp(0.0, 1.0),
        }
    }
}

/// Verdict plus the evidence it was derived from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlAssessment {
    #[serde(flatten)]
    pub verdict: Verdict,
    pub model_probability: f32,
    pub escalated: bool,
    pub signals: SignalReport,
}

/// Serialized form of [`RiskSignals`] including the combined flag.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalReport {
    #[serde(flatten)]
    pub signals: RiskSignals,
    pub is_suspicious: bool,
}

impl From<RiskSignals> for SignalReport {
    fn from(signals: RiskSignals) -> Self {
        Self {
            is_suspicious: signals.is_suspicious(),
            signals,
        }
    }
}

/// One entry in a caller's phishing-check history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    pub url: String,
    pub is_phishing: bool,
    pub probability: f32,
    pub confidence: f32,
    pub timestamp: DateTime<Utc>,
}

impl ScanRecord {
    pub fn new(url: impl Into<String>, verdict: &Verdict) -> Self {
        Self {
            url: url.into(),
            is_phishing: verdict.is_phishing,
            probability: verdict.probability,
            confidence: verdict.confidence,
            timestamp: Utc::now(),
        }
    }
}

/// Body of a scoring request. `url` is optional so a missing field is
/// reported as invalid input rather than a deserialization failure.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckUrlRequest {
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_verdict_from_high_probability() {
        let verdict = Verdict::from_probability(0.82);
        assert!(verdict.is_phishing);
        assert!(approx(verdict.probability, 0.82));
        assert!(approx(verdict.confidence, 0.64));
    }

    #[test]
    fn test_verdict_boundary_is_not_phishing() {
        let verdict = Verdict::from_probability(0.5);
        assert!(!verdict.is_phishing);
        assert_eq!(verdict.confidence, 0.0);
    }

    #[test]
    fn test_verdict_clamps_miscalibrated_probability() {
        let high = Verdict::from_probability(1.7);
        assert_eq!(high.probability, 1.0);
        assert_eq!(high.confidence, 1.0);

        let low = Verdict::from_probability(-0.3);
        assert_eq!(low.probability, 0.0);
        assert!(!low.is_phishing);
        assert_eq!(low.confidence, 1.0);
    }

    #[test]
    fn test_verdict_invariants_over_range() {
        for step in 0..=100 {
            let p = step as f32 / 100.0;
            let verdict = Verdict::from_probability(p);
            assert_eq!(verdict.is_phishing, verdict.probability > 0.5);
            assert!(approx(verdict.confidence, ((p - 0.5).abs() * 2.0).clamp(0.0, 1.0)));
        }
    }

    #[test]
    fn test_signal_counts() {
        let signals = RiskSignals {
            has_suspicious_pattern: true,
            has_ip_address: false,
            has_excessive_subdomains: true,
            dot_count: 3,
        };
        assert!(signals.is_suspicious());
        assert_eq!(signals.raised_count(), 2);
        assert!(!RiskSignals::default().is_suspicious());
    }

    #[test]
    fn test_assessment_serializes_flat() {
        let assessment = UrlAssessment {
            verdict: Verdict::from_probability(0.9),
            model_probability: 0.9,
            escalated: false,
            signals: RiskSignals::default().into(),
        };
        let json = serde_json::to_value(&assessment).unwrap();
        assert_eq!(json["isPhishing"], true);
        assert_eq!(json["escalated"], false);
        assert_eq!(json["signals"]["hasIpAddress"], false);
        assert_eq!(json["signals"]["isSuspicious"], false);
    }
}
