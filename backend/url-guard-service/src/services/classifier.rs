use crate::error::{Result, UrlGuardError};
use crate::metrics;
use ort::session::{Session, SessionInputValue, SessionOutputs};
use ort::value::Tensor;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::OnceCell;

/// Index of the "phishing" class in the model's two-class output.
const PHISHING_CLASS_INDEX: usize = 1;

/// A loaded URL classification model.
#[cfg_attr(test, mockall::automock)]
pub trait UrlModel: Send + Sync {
    /// Probability that `url` is phishing, in `[0, 1]`.
    fn phishing_probability(&self, url: &str) -> Result<f32>;
}

/// Builds a [`UrlModel`]. Called at most once per successful initialization.
pub trait ModelLoader: Send + Sync {
    fn load(&self) -> Result<Arc<dyn UrlModel>>;
}

/// Loads the ONNX URL classifier from disk.
pub struct OnnxModelLoader {
    model_path: PathBuf,
    input_name: String,
    output_name: String,
}

impl OnnxModelLoader {
    pub fn new(
        model_path: impl AsRef<Path>,
        input_name: impl Into<String>,
        output_name: impl Into<String>,
    ) -> Self {
        Self {
            model_path: model_path.as_ref().to_path_buf(),
            input_name: input_name.into(),
            output_name: output_name.into(),
        }
    }
}

impl ModelLoader for OnnxModelLoader {
    fn load(&self) -> Result<Arc<dyn UrlModel>> {
        if !self.model_path.exists() {
            return Err(UrlGuardError::ModelUnavailable(format!(
                "model not found: {}",
                self.model_path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e| UrlGuardError::ModelUnavailable(e.to_string()))?
            .commit_from_file(&self.model_path)
            .map_err(|e| UrlGuardError::ModelUnavailable(e.to_string()))?;

        tracing::info!(
            model_path = %self.model_path.display(),
            "Phishing detection model initialized"
        );

        Ok(Arc::new(OnnxUrlModel {
            session: Mutex::new(session),
            input_name: self.input_name.clone(),
            output_name: self.output_name.clone(),
        }))
    }
}

/// ONNX Runtime session taking a `[1]` string tensor and producing `[1, 2]` probabilities.
struct OnnxUrlModel {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl UrlModel for OnnxUrlModel {
    fn phishing_probability(&self, url: &str) -> Result<f32> {
        let input_value = Tensor::<String>::from_string_array(([1usize], &[url.to_string()][..]))
            .map_err(|e| UrlGuardError::ScoringFailed(e.to_string()))?;

        let inputs: Vec<(Cow<'_, str>, SessionInputValue<'_>)> = vec![(
            Cow::Borrowed(self.input_name.as_str()),
            SessionInputValue::from(input_value),
        )];

        // Run requires a mutable session
        let mut session = self
            .session
            .lock()
            .map_err(|e| UrlGuardError::Internal(format!("Failed to lock session: {}", e)))?;

        let outputs: SessionOutputs = session
            .run(inputs)
            .map_err(|e| UrlGuardError::ScoringFailed(e.to_string()))?;

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            UrlGuardError::ScoringFailed(format!("No output tensor named {}", self.output_name))
        })?;

        let (_, probabilities) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| UrlGuardError::ScoringFailed(e.to_string()))?;

        probabilities
            .get(PHISHING_CLASS_INDEX)
            .copied()
            .ok_or_else(|| {
                UrlGuardError::ScoringFailed(format!(
                    "Expected two class probabilities, got {}",
                    probabilities.len()
                ))
            })
    }
}

/// Owns the process-wide scoring session.
///
/// The session is created on first use. Concurrent first calls wait behind a
/// single initializer; a failed initialization leaves the cell empty so the
/// next call tries again.
pub struct PhishingClassifier {
    loader: Arc<dyn ModelLoader>,
    model: OnceCell<Arc<dyn UrlModel>>,
}

impl PhishingClassifier {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            model: OnceCell::new(),
        }
    }

    /// Classifier backed by the ONNX model at `model_path`.
    pub fn onnx(
        model_path: impl AsRef<Path>,
        input_name: impl Into<String>,
        output_name: impl Into<String>,
    ) -> Self {
        Self::new(Arc::new(OnnxModelLoader::new(
            model_path,
            input_name,
            output_name,
        )))
    }

    pub fn is_initialized(&self) -> bool {
        self.model.initialized()
    }

    async fn model(&self) -> Result<Arc<dyn UrlModel>> {
        let model = self
            .model
            .get_or_try_init(|| async {
                let loader = self.loader.clone();
                let loaded: Result<Arc<dyn UrlModel>> =
                    match tokio::task::spawn_blocking(move || loader.load()).await {
                        Ok(result) => result,
                        Err(e) => Err(UrlGuardError::ModelUnavailable(format!(
                            "model loader panicked: {}",
                            e
                        ))),
                    };

                loaded.map_err(|e| {
                    tracing::error!("Error initializing phishing detection model: {}", e);
                    match e {
                        UrlGuardError::ModelUnavailable(_) => e,
                        other => UrlGuardError::ModelUnavailable(other.to_string()),
                    }
                })
            })
            .await?;

        Ok(model.clone())
    }

    /// Probability that `url` is phishing.
    pub async fn score(&self, url: &str) -> Result<f32> {
        let model = self.model().await?;
        let url = url.to_string();
        let started = Instant::now();

        let probability = tokio::task::spawn_blocking(move || model.phishing_probability(&url))
            .await
            .map_err(|e| UrlGuardError::ScoringFailed(format!("inference task failed: {}", e)))?
            .map_err(|e| match e {
                UrlGuardError::ScoringFailed(_) => e,
                other => UrlGuardError::ScoringFailed(other.to_string()),
            })?;

        metrics::INFERENCE_DURATION_SECONDS.observe(started.elapsed().as_secs_f64());

        if !probability.is_finite() {
            return Err(UrlGuardError::ScoringFailed(format!(
                "model returned non-finite probability: {}",
                probability
            )));
        }

        Ok(probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingLoader {
        loads: AtomicUsize,
        probability: f32,
    }

    impl ModelLoader for CountingLoader {
        fn load(&self) -> Result<Arc<dyn UrlModel>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            // Widen the window for racing initializers
            std::thread::sleep(Duration::from_millis(50));
            let mut model = MockUrlModel::new();
            let probability = self.probability;
            model
                .expect_phishing_probability()
                .returning(move |_| Ok(probability));
            Ok(Arc::new(model))
        }
    }

    struct FailingLoader {
        attempts: AtomicUsize,
    }

    impl ModelLoader for FailingLoader {
        fn load(&self) -> Result<Arc<dyn UrlModel>> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(UrlGuardError::ModelUnavailable("corrupt artifact".to_string()))
        }
    }

    struct FixedModelLoader(Arc<dyn UrlModel>);

    impl ModelLoader for FixedModelLoader {
        fn load(&self) -> Result<Arc<dyn UrlModel>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_score_returns_model_probability() {
        let mut model = MockUrlModel::new();
        model
            .expect_phishing_probability()
            .withf(|url| url == "http://example.com")
            .times(1)
            .returning(|_| Ok(0.82));
        let classifier = PhishingClassifier::new(Arc::new(FixedModelLoader(Arc::new(model))));

        assert!(!classifier.is_initialized());
        let probability = classifier.score("http://example.com").await.unwrap();
        assert!((probability - 0.82).abs() < 1e-6);
        assert!(classifier.is_initialized());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_use_initializes_once() {
        let loader = Arc::new(CountingLoader {
            loads: AtomicUsize::new(0),
            probability: 0.3,
        });
        let classifier = Arc::new(PhishingClassifier::new(loader.clone()));

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let classifier = classifier.clone();
                tokio::spawn(async move { classifier.score(&format!("http://site{}.com", i)).await })
            })
            .collect();

        for task in futures::future::join_all(tasks).await {
            assert!(task.unwrap().is_ok());
        }
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_initialization_failure_is_model_unavailable() {
        let loader = Arc::new(FailingLoader {
            attempts: AtomicUsize::new(0),
        });
        let classifier = PhishingClassifier::new(loader.clone());

        let err = classifier.score("http://example.com").await.unwrap_err();
        assert!(matches!(err, UrlGuardError::ModelUnavailable(_)));
        assert!(!classifier.is_initialized());

        // Not cached: the next call retries initialization
        let err = classifier.score("http://example.com").await.unwrap_err();
        assert!(matches!(err, UrlGuardError::ModelUnavailable(_)));
        assert_eq!(loader.attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_inference_failure_is_scoring_failed() {
        let mut model = MockUrlModel::new();
        model
            .expect_phishing_probability()
            .returning(|_| Err(UrlGuardError::Internal("runtime error".to_string())));
        let classifier = PhishingClassifier::new(Arc::new(FixedModelLoader(Arc::new(model))));

        let err = classifier.score("http://example.com").await.unwrap_err();
        assert!(matches!(err, UrlGuardError::ScoringFailed(_)));
        // The session stays initialized after a failed inference
        assert!(classifier.is_initialized());
    }

    #[tokio::test]
    async fn test_non_finite_probability_is_rejected() {
        let mut model = MockUrlModel::new();
        model
            .expect_phishing_probability()
            .returning(|_| Ok(f32::NAN));
        let classifier = PhishingClassifier::new(Arc::new(FixedModelLoader(Arc::new(model))));

        let err = classifier.score("http://example.com").await.unwrap_err();
        assert!(matches!(err, UrlGuardError::ScoringFailed(_)));
    }

    #[tokio::test]
    async fn test_missing_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let classifier =
            PhishingClassifier::onnx(dir.path().join("absent.onnx"), "inputs", "probabilities");

        let err = classifier.score("http://example.com").await.unwrap_err();
        assert!(matches!(err, UrlGuardError::ModelUnavailable(msg) if msg.contains("absent.onnx")));
    }
}
