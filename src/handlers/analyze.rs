use std::sync::Arc;

use crate::error::AnalysisError;
use crate::models::AnalysisResult;
use crate::services::{cache_key, AnalysisCache, LabelModel, CACHE_TTL_SECS};

/// Runs the label-analysis pipeline: cache lookup, text extraction,
/// nutrition analysis, cache store. Strictly sequential per request.
pub struct AnalyzeHandler {
    model: Arc<dyn LabelModel>,
    cache: Option<Arc<dyn AnalysisCache>>,
}

impl AnalyzeHandler {
    pub fn new(model: Arc<dyn LabelModel>, cache: Option<Arc<dyn AnalysisCache>>) -> Self {
        Self { model, cache }
    }

    pub async fn analyze(&self, image_base64: &str) -> Result<AnalysisResult, AnalysisError> {
        let key = cache_key(image_base64);

        if let Some(cache) = &self.cache {
            match cache.get(&key).await {
                Ok(Some(cached)) => {
                    log::info!("📦 Cache hit for {}, skipping model calls", &key[..12]);
                    return Ok(cached);
                }
                Ok(None) => {
                    log::debug!("🔎 Cache miss for {}", &key[..12]);
                }
                // A broken cache must not take the pipeline down with it.
                Err(err) => AnalysisError::Cache(err).log(),
            }
        }

        let label_text = self
            .model
            .extract_label_text(image_base64)
            .await
            .map_err(AnalysisError::Upstream)?;

        let raw_analysis = self
            .model
            .analyze_ingredients(&label_text)
            .await
            .map_err(AnalysisError::Upstream)?;

        let result: AnalysisResult =
            serde_json::from_str(&raw_analysis).map_err(AnalysisError::Shape)?;

        if let Some(cache) = &self.cache {
            match cache.set(&key, &result, CACHE_TTL_SECS).await {
                Ok(()) => log::debug!("💾 Cached analysis under {}", &key[..12]),
                // The analysis succeeded; a failed store is not the caller's problem.
                Err(err) => AnalysisError::Cache(err).log(),
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HealthStatus, KeyIngredient};
    use crate::services::MemoryCache;
    use anyhow::Result;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample_result() -> AnalysisResult {
        AnalysisResult {
            status: HealthStatus::ExerciseCaution,
            summary: "Processed snack.".to_string(),
            key_ingredients: vec![KeyIngredient {
                name: "Palm Oil".to_string(),
                analysis: "High in saturated fat.".to_string(),
            }],
            concerns: "High sodium.".to_string(),
            recommendation: "Occasional treat only.".to_string(),
        }
    }

    /// Scripted model fake that counts invocations.
    struct ScriptedModel {
        extraction_fails: bool,
        analysis_content: String,
        extract_calls: AtomicUsize,
        analyze_calls: AtomicUsize,
    }

    impl ScriptedModel {
        fn returning(analysis_content: &str) -> Self {
            Self {
                extraction_fails: false,
                analysis_content: analysis_content.to_string(),
                extract_calls: AtomicUsize::new(0),
                analyze_calls: AtomicUsize::new(0),
            }
        }

        fn failing_extraction() -> Self {
            Self {
                extraction_fails: true,
                analysis_content: String::new(),
                extract_calls: AtomicUsize::new(0),
                analyze_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl LabelModel for ScriptedModel {
        async fn extract_label_text(&self, _image_base64: &str) -> Result<String> {
            self.extract_calls.fetch_add(1, Ordering::SeqCst);
            if self.extraction_fails {
                anyhow::bail!("OpenAI API error (429): rate limited");
            }
            Ok("Water, Sugar, Palm Oil, Salt".to_string())
        }

        async fn analyze_ingredients(&self, _label_text: &str) -> Result<String> {
            self.analyze_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.analysis_content.clone())
        }
    }

    /// Cache fake whose operations always fail.
    struct BrokenCache;

    #[async_trait::async_trait]
    impl AnalysisCache for BrokenCache {
        async fn get(&self, _key: &str) -> Result<Option<AnalysisResult>> {
            anyhow::bail!("connection refused")
        }

        async fn set(&self, _key: &str, _result: &AnalysisResult, _ttl_secs: u64) -> Result<()> {
            anyhow::bail!("connection refused")
        }
    }

    #[tokio::test]
    async fn test_fresh_analysis_parses_model_output() {
        let expected = sample_result();
        let model = Arc::new(ScriptedModel::returning(
            &serde_json::to_string(&expected).unwrap(),
        ));
        let handler = AnalyzeHandler::new(model.clone(), None);

        let result = handler.analyze("aW1hZ2U=").await.unwrap();

        assert_eq!(result, expected);
        assert_eq!(model.extract_calls.load(Ordering::SeqCst), 1);
        assert_eq!(model.analyze_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_model_calls() {
        let expected = sample_result();
        let model = Arc::new(ScriptedModel::returning(
            &serde_json::to_string(&expected).unwrap(),
        ));
        let cache: Arc<MemoryCache> = Arc::new(MemoryCache::new());
        let handler = AnalyzeHandler::new(model.clone(), Some(cache));

        let first = handler.analyze("aW1hZ2U=").await.unwrap();
        let second = handler.analyze("aW1hZ2U=").await.unwrap();

        assert_eq!(first, second);
        // Exactly one extraction+analysis pair across both requests.
        assert_eq!(model.extract_calls.load(Ordering::SeqCst), 1);
        assert_eq!(model.analyze_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_payloads_do_not_share_entries() {
        let expected = sample_result();
        let model = Arc::new(ScriptedModel::returning(
            &serde_json::to_string(&expected).unwrap(),
        ));
        let cache: Arc<MemoryCache> = Arc::new(MemoryCache::new());
        let handler = AnalyzeHandler::new(model.clone(), Some(cache));

        handler.analyze("payloadA").await.unwrap();
        handler.analyze("payloadB").await.unwrap();

        assert_eq!(model.extract_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_malformed_analysis_is_shape_error_and_not_cached() {
        let model = Arc::new(ScriptedModel::returning("Sorry, I cannot help with that."));
        let cache = Arc::new(MemoryCache::new());
        let handler = AnalyzeHandler::new(model, Some(cache.clone()));

        let err = handler.analyze("aW1hZ2U=").await.unwrap_err();

        assert!(matches!(err, AnalysisError::Shape(_)));
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_wrong_shape_json_is_shape_error() {
        // Valid JSON but an out-of-enum status must also be rejected.
        let model = Arc::new(ScriptedModel::returning(
            r#"{"status": "Unknown", "summary": "s", "keyIngredients": [], "recommendation": "r"}"#,
        ));
        let handler = AnalyzeHandler::new(model, None);

        let err = handler.analyze("aW1hZ2U=").await.unwrap_err();
        assert!(matches!(err, AnalysisError::Shape(_)));
    }

    #[tokio::test]
    async fn test_extraction_failure_skips_analysis_and_cache() {
        let model = Arc::new(ScriptedModel::failing_extraction());
        let cache = Arc::new(MemoryCache::new());
        let handler = AnalyzeHandler::new(model.clone(), Some(cache.clone()));

        let err = handler.analyze("aW1hZ2U=").await.unwrap_err();

        assert!(matches!(err, AnalysisError::Upstream(_)));
        assert_eq!(model.analyze_calls.load(Ordering::SeqCst), 0);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_broken_cache_degrades_to_fresh_analysis() {
        let expected = sample_result();
        let model = Arc::new(ScriptedModel::returning(
            &serde_json::to_string(&expected).unwrap(),
        ));
        let handler = AnalyzeHandler::new(model.clone(), Some(Arc::new(BrokenCache)));

        let result = handler.analyze("aW1hZ2U=").await.unwrap();

        assert_eq!(result, expected);
        assert_eq!(model.extract_calls.load(Ordering::SeqCst), 1);
    }
}
