use crate::error::Result;
use crate::metrics;
use crate::models::{RiskSignals, UrlAssessment, Verdict};
use crate::services::{HeuristicEvaluator, PhishingClassifier};
use std::sync::Arc;

/// Lower edge of the band where the classifier is considered undecided.
pub const BORDERLINE_LOW: f32 = 0.4;
/// Upper edge of the undecided band; escalated verdicts report this probability.
pub const BORDERLINE_HIGH: f32 = 0.6;

/// How heuristic signals and the classifier are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsemblePolicy {
    /// Classifier probability alone decides; heuristics are reported only.
    ModelOnly,
    /// A borderline non-phishing probability is escalated to phishing when at
    /// least `min_signals` heuristic signals are raised.
    Escalate { min_signals: usize },
}

impl EnsemblePolicy {
    pub fn escalate(min_signals: usize) -> Self {
        EnsemblePolicy::Escalate {
            min_signals: min_signals.max(1),
        }
    }
}

impl Default for EnsemblePolicy {
    fn default() -> Self {
        EnsemblePolicy::escalate(2)
    }
}

/// Combines heuristic signals and classifier probability into one verdict.
pub struct EnsembleScorer {
    classifier: Arc<PhishingClassifier>,
    heuristics: HeuristicEvaluator,
    policy: EnsemblePolicy,
}

impl EnsembleScorer {
    pub fn new(classifier: Arc<PhishingClassifier>, policy: EnsemblePolicy) -> Self {
        Self {
            classifier,
            heuristics: HeuristicEvaluator::new(),
            policy,
        }
    }

    pub fn policy(&self) -> EnsemblePolicy {
        self.policy
    }

    pub async fn evaluate(&self, url: &str) -> Result<UrlAssessment> {
        let signals = self.heuristics.evaluate(url);

        let model_probability = match self.classifier.score(url).await {
            Ok(probability) => probability.clamp(0.0, 1.0),
            Err(e) => {
                metrics::URL_SCORING_ERRORS_TOTAL
                    .with_label_values(&[e.code()])
                    .inc();
                return Err(e);
            }
        };

        let assessment = combine(self.policy, model_probability, signals);

        metrics::URL_VERDICTS_TOTAL
            .with_label_values(&[outcome_label(&assessment)])
            .inc();

        tracing::info!(
            is_phishing = assessment.verdict.is_phishing,
            probability = assessment.verdict.probability,
            model_probability = assessment.model_probability,
            escalated = assessment.escalated,
            "URL evaluated"
        );

        Ok(assessment)
    }
}

/// Merge a clamped model probability with heuristic signals under `policy`.
pub fn combine(policy: EnsemblePolicy, model_probability: f32, signals: RiskSignals) -> UrlAssessment {
    let model_verdict = Verdict::from_probability(model_probability);

    let escalate = match policy {
        EnsemblePolicy::ModelOnly => false,
        EnsemblePolicy::Escalate { min_signals } => {
            !model_verdict.is_phishing
                && model_verdict.probability >= BORDERLINE_LOW
                && signals.raised_count() >= min_signals
        }
    };

    let verdict = if escalate {
        // Disagreement: flag, but report the low confidence of the band edge
        Verdict::from_probability(BORDERLINE_HIGH)
    } else {
        model_verdict
    };

    UrlAssessment {
        verdict,
        model_probability: model_verdict.probability,
        escalated: escalate,
        signals: signals.into(),
    }
}

fn outcome_label(assessment: &UrlAssessment) -> &'static str {
    match (assessment.verdict.is_phishing, assessment.escalated) {
        (true, true) => "escalated",
        (true, false) => "phishing",
        (false, _) => "safe",
    }
}
