use crate::core::extraction::ExtractionAdapter;
use crate::core::reconciler::ComponentReconciler;
use crate::core::sink::ComponentSink;
use crate::domain::model::{Manufacturer, ReferenceData};
use crate::domain::ports::{BrowsingContext, ExtractionOracle, PageRenderer, Storage};
use crate::utils::error::{Result, ScoutError};
use std::fmt;
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// 單一製造商的處理狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManufacturerState {
    Idle,
    Rendering,
    Extracting,
    Reconciling,
    /// 已寫出檔案
    Persisted,
    /// 對應後沒有任何元件，不寫檔
    Empty,
    Failed,
}

impl ManufacturerState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Persisted | Self::Empty | Self::Failed)
    }
}

impl fmt::Display for ManufacturerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Rendering => "rendering",
            Self::Extracting => "extracting",
            Self::Reconciling => "reconciling",
            Self::Persisted => "persisted",
            Self::Empty => "empty",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct ManufacturerOutcome {
    pub manufacturer_id: Uuid,
    pub manufacturer_name: String,
    pub state: ManufacturerState,
    /// 失敗時所在的階段
    pub failed_stage: Option<ManufacturerState>,
    pub component_count: usize,
    pub output_path: Option<String>,
    pub error: Option<String>,
}

struct StageTracker {
    state: ManufacturerState,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            state: ManufacturerState::Idle,
        }
    }

    fn advance(&mut self, next: ManufacturerState) {
        tracing::debug!("{} → {}", self.state, next);
        self.state = next;
    }
}

/// 驅動單一製造商走完 render → extract → reconcile → persist，並隔離失敗
pub struct ManufacturerOrchestrator<R: PageRenderer, O: ExtractionOracle, S: Storage> {
    renderer: R,
    extraction: ExtractionAdapter<O>,
    sink: ComponentSink<S>,
    navigation_timeout: Duration,
}

impl<R: PageRenderer, O: ExtractionOracle, S: Storage> ManufacturerOrchestrator<R, O, S> {
    pub fn new(renderer: R, extraction: ExtractionAdapter<O>, sink: ComponentSink<S>) -> Self {
        Self {
            renderer,
            extraction,
            sink,
            navigation_timeout: NAVIGATION_TIMEOUT,
        }
    }

    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    /// 永不回傳錯誤：所有錯誤都在此邊界記錄並轉為 `Failed`
    pub async fn process(
        &self,
        manufacturer: &Manufacturer,
        reference: &ReferenceData,
    ) -> ManufacturerOutcome {
        let span = tracing::info_span!("manufacturer", name = %manufacturer.name);
        self.process_inner(manufacturer, reference)
            .instrument(span)
            .await
    }

    async fn process_inner(
        &self,
        manufacturer: &Manufacturer,
        reference: &ReferenceData,
    ) -> ManufacturerOutcome {
        let mut tracker = StageTracker::new();
        let mut outcome = ManufacturerOutcome {
            manufacturer_id: manufacturer.id,
            manufacturer_name: manufacturer.name.clone(),
            state: ManufacturerState::Idle,
            failed_stage: None,
            component_count: 0,
            output_path: None,
            error: None,
        };

        tracker.advance(ManufacturerState::Rendering);
        let result = match self.renderer.open_context().await {
            Ok(mut context) => {
                let result = self
                    .run_stages(context.as_mut(), manufacturer, reference, &mut tracker)
                    .await;
                // 不論成功與否都釋放工作階段
                context.close().await;
                result
            }
            Err(e) => Err(into_render_error(e, manufacturer)),
        };

        match result {
            Ok(Some((path, count))) => {
                tracker.advance(ManufacturerState::Persisted);
                tracing::info!("✅ {} components saved to {}", count, path);
                outcome.component_count = count;
                outcome.output_path = Some(path);
            }
            Ok(None) => {
                tracker.advance(ManufacturerState::Empty);
                tracing::debug!("No reconciled components, nothing written");
            }
            Err(e) => {
                let stage = tracker.state;
                tracker.advance(ManufacturerState::Failed);
                if !e.is_manufacturer_scoped() {
                    // 各階段應已把錯誤轉成自己的型別
                    tracing::warn!(
                        stage = %stage,
                        "⚠️ Unexpected {:?} error escaped its stage wrapper",
                        e.category()
                    );
                }
                tracing::error!(
                    stage = %stage,
                    category = ?e.category(),
                    "❌ Processing {} failed during {}: {}",
                    manufacturer.name,
                    stage,
                    e
                );
                outcome.failed_stage = Some(stage);
                outcome.error = Some(e.to_string());
            }
        }

        outcome.state = tracker.state;
        outcome
    }

    async fn run_stages(
        &self,
        context: &mut dyn BrowsingContext,
        manufacturer: &Manufacturer,
        reference: &ReferenceData,
        tracker: &mut StageTracker,
    ) -> Result<Option<(String, usize)>> {
        tracing::info!("🌐 Opening {}", manufacturer.website_url);
        let page = context
            .navigate(manufacturer.website_url.url(), self.navigation_timeout)
            .await
            .map_err(|e| into_render_error(e, manufacturer))?;

        tracker.advance(ManufacturerState::Extracting);
        let items = self
            .extraction
            .extract(&page, &reference.type_names())
            .await?;

        tracker.advance(ManufacturerState::Reconciling);
        let reconciler = ComponentReconciler::new(&reference.component_types);
        let components = reconciler.reconcile(manufacturer, &items)?;
        tracing::debug!(
            "Reconciled {} of {} candidate items",
            components.len(),
            items.len()
        );

        if components.is_empty() {
            return Ok(None);
        }

        let path = self.sink.persist(&manufacturer.name, &components).await?;
        Ok(Some((path, components.len())))
    }
}

fn into_render_error(error: ScoutError, manufacturer: &Manufacturer) -> ScoutError {
    match error {
        ScoutError::RenderError { .. } => error,
        other => ScoutError::RenderError {
            url: manufacturer.website_url.to_string(),
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::LocalStorage;
    use crate::domain::model::{ComponentType, ManufacturerRecord};
    use crate::domain::ports::RenderedPage;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;
    use url::Url;

    #[derive(Clone, Default)]
    struct CountingRenderer {
        opened: Arc<AtomicUsize>,
        closed: Arc<AtomicUsize>,
        fail_navigation: bool,
        fail_open: bool,
    }

    struct CountingContext {
        closed: Arc<AtomicUsize>,
        fail_navigation: bool,
    }

    #[async_trait]
    impl PageRenderer for CountingRenderer {
        async fn open_context(&self) -> Result<Box<dyn BrowsingContext>> {
            if self.fail_open {
                return Err(ScoutError::IoError(std::io::Error::other("browser unavailable")));
            }
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(CountingContext {
                closed: self.closed.clone(),
                fail_navigation: self.fail_navigation,
            }))
        }
    }

    #[async_trait]
    impl BrowsingContext for CountingContext {
        async fn navigate(&mut self, url: &Url, _timeout: Duration) -> Result<RenderedPage> {
            if self.fail_navigation {
                return Err(ScoutError::RenderError {
                    url: url.to_string(),
                    message: "navigation timed out".to_string(),
                });
            }
            Ok(RenderedPage {
                url: url.to_string(),
                title: None,
                text: "products".to_string(),
                links: vec![],
            })
        }

        async fn close(self: Box<Self>) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FixedOracle(String);

    #[async_trait]
    impl ExtractionOracle for FixedOracle {
        async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    fn reference() -> ReferenceData {
        ReferenceData {
            manufacturers: vec![Manufacturer::try_from(ManufacturerRecord {
                id: Some("0b7c5e0a-8f61-4a43-9a55-6f2f5a0f2a11".to_string()),
                name: Some("Acme Air".to_string()),
                website_url: Some("https://acme-air.example.com".to_string()),
                ..Default::default()
            })
            .unwrap()],
            component_types: vec![ComponentType {
                type_id: Uuid::parse_str("9d1e4c6b-2a3f-4e5d-8c7b-1a2b3c4d5e6f").unwrap(),
                name: "compressor".to_string(),
                description: None,
            }],
        }
    }

    fn orchestrator(
        renderer: CountingRenderer,
        reply: serde_json::Value,
        output: &TempDir,
    ) -> ManufacturerOrchestrator<CountingRenderer, FixedOracle, LocalStorage> {
        ManufacturerOrchestrator::new(
            renderer,
            ExtractionAdapter::new(FixedOracle(reply.to_string()), 1024, 10_000),
            ComponentSink::new(LocalStorage::new(output.path())),
        )
    }

    fn compressor_reply() -> serde_json::Value {
        json!({"components": [{
            "name": "ZR42",
            "modelNumber": "ZR-42",
            "type": "Compressor",
            "features": ["Scroll"],
            "description": "Scroll compressor",
            "url": "https://acme-air.example.com/zr42"
        }]})
    }

    #[tokio::test]
    async fn test_success_path_persists_and_releases_context() {
        let output = TempDir::new().unwrap();
        let renderer = CountingRenderer::default();
        let orchestrator = orchestrator(renderer.clone(), compressor_reply(), &output);
        let reference = reference();

        let outcome = orchestrator
            .process(&reference.manufacturers[0], &reference)
            .await;

        assert_eq!(outcome.state, ManufacturerState::Persisted);
        assert_eq!(outcome.component_count, 1);
        assert!(output.path().join("acme_air_components.json").exists());
        assert_eq!(renderer.opened.load(Ordering::SeqCst), 1);
        assert_eq!(renderer.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_navigation_failure_releases_context() {
        let output = TempDir::new().unwrap();
        let renderer = CountingRenderer {
            fail_navigation: true,
            ..Default::default()
        };
        let orchestrator = orchestrator(renderer.clone(), compressor_reply(), &output);
        let reference = reference();

        let outcome = orchestrator
            .process(&reference.manufacturers[0], &reference)
            .await;

        assert_eq!(outcome.state, ManufacturerState::Failed);
        assert_eq!(outcome.failed_stage, Some(ManufacturerState::Rendering));
        assert_eq!(renderer.closed.load(Ordering::SeqCst), 1);
        assert!(!output.path().join("acme_air_components.json").exists());
    }

    #[tokio::test]
    async fn test_invalid_reply_fails_during_extraction() {
        let output = TempDir::new().unwrap();
        let renderer = CountingRenderer::default();
        let orchestrator = ManufacturerOrchestrator::new(
            renderer.clone(),
            ExtractionAdapter::new(FixedOracle("not json at all".to_string()), 1024, 10_000),
            ComponentSink::new(LocalStorage::new(output.path())),
        );
        let reference = reference();

        let outcome = orchestrator
            .process(&reference.manufacturers[0], &reference)
            .await;

        assert_eq!(outcome.state, ManufacturerState::Failed);
        assert_eq!(outcome.failed_stage, Some(ManufacturerState::Extracting));
        assert!(outcome.error.is_some());
        assert_eq!(renderer.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_unmatched_ends_empty_without_file() {
        let output = TempDir::new().unwrap();
        let reply = json!({"components": [{
            "name": "T1", "modelNumber": "T-1", "type": "Thermostat",
            "features": [], "description": "Thermostat", "url": "https://acme-air.example.com/t1"
        }]});
        let orchestrator = orchestrator(CountingRenderer::default(), reply, &output);
        let reference = reference();

        let outcome = orchestrator
            .process(&reference.manufacturers[0], &reference)
            .await;

        assert_eq!(outcome.state, ManufacturerState::Empty);
        assert!(outcome.state.is_terminal());
        assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_component_fails_during_reconciling() {
        let output = TempDir::new().unwrap();
        let reply = json!({"components": [{
            "name": "ZR42", "modelNumber": "ZR-42", "type": "compressor",
            "features": [], "url": "https://acme-air.example.com/zr42"
        }]});
        let orchestrator = orchestrator(CountingRenderer::default(), reply, &output);
        let reference = reference();

        let outcome = orchestrator
            .process(&reference.manufacturers[0], &reference)
            .await;

        assert_eq!(outcome.state, ManufacturerState::Failed);
        assert_eq!(outcome.failed_stage, Some(ManufacturerState::Reconciling));
    }

    #[tokio::test]
    async fn test_context_open_failure_is_render_error() {
        let output = TempDir::new().unwrap();
        let renderer = CountingRenderer {
            fail_open: true,
            ..Default::default()
        };
        let orchestrator = orchestrator(renderer.clone(), compressor_reply(), &output);
        let reference = reference();

        let outcome = orchestrator
            .process(&reference.manufacturers[0], &reference)
            .await;

        assert_eq!(outcome.state, ManufacturerState::Failed);
        assert_eq!(outcome.failed_stage, Some(ManufacturerState::Rendering));
        assert!(outcome
            .error
            .as_deref()
            .is_some_and(|e| e.starts_with("Failed to render")));
        assert_eq!(renderer.opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_write_failure_fails_after_reconciling() {
        let output = TempDir::new().unwrap();
        std::fs::create_dir(output.path().join("acme_air_components.json")).unwrap();
        let renderer = CountingRenderer::default();
        let orchestrator = orchestrator(renderer.clone(), compressor_reply(), &output);
        let reference = reference();

        let outcome = orchestrator
            .process(&reference.manufacturers[0], &reference)
            .await;

        assert_eq!(outcome.state, ManufacturerState::Failed);
        assert_eq!(outcome.failed_stage, Some(ManufacturerState::Reconciling));
        assert!(outcome
            .error
            .as_deref()
            .is_some_and(|e| e.starts_with("Failed to persist")));
        assert_eq!(renderer.closed.load(Ordering::SeqCst), 1);
    }
}
