use crate::core::orchestrator::{ManufacturerOrchestrator, ManufacturerOutcome};
use crate::core::reference_data::ReferenceDataLoader;
use crate::domain::model::{Manufacturer, ReferenceData};
use crate::domain::ports::{ExtractionOracle, PageRenderer, Storage};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// 載入參考資料一次，然後依序處理每個製造商
pub struct ScrapeEngine<R: PageRenderer, O: ExtractionOracle, S: Storage> {
    loader: ReferenceDataLoader<S>,
    orchestrator: ManufacturerOrchestrator<R, O, S>,
    only: Vec<String>,
    monitor: SystemMonitor,
}

impl<R: PageRenderer, O: ExtractionOracle, S: Storage> ScrapeEngine<R, O, S> {
    pub fn new(loader: ReferenceDataLoader<S>, orchestrator: ManufacturerOrchestrator<R, O, S>) -> Self {
        Self::new_with_monitoring(loader, orchestrator, false)
    }

    pub fn new_with_monitoring(
        loader: ReferenceDataLoader<S>,
        orchestrator: ManufacturerOrchestrator<R, O, S>,
        monitor_enabled: bool,
    ) -> Self {
        Self {
            loader,
            orchestrator,
            only: Vec::new(),
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// 只處理名稱（不分大小寫）列在其中的製造商
    pub fn with_filter(mut self, only: Vec<String>) -> Self {
        self.only = only;
        self
    }

    pub async fn load_reference_data(&self) -> Result<ReferenceData> {
        self.loader.load().await
    }

    pub fn select_manufacturers<'a>(&self, reference: &'a ReferenceData) -> Vec<&'a Manufacturer> {
        if self.only.is_empty() {
            return reference.manufacturers.iter().collect();
        }

        let wanted: Vec<String> = self.only.iter().map(|name| name.to_lowercase()).collect();
        for name in &self.only {
            let known = reference
                .manufacturers
                .iter()
                .any(|m| m.name.to_lowercase() == name.to_lowercase());
            if !known {
                tracing::warn!("⚠️ No manufacturer named '{}' in reference data", name);
            }
        }

        reference
            .manufacturers
            .iter()
            .filter(|m| wanted.contains(&m.name.to_lowercase()))
            .collect()
    }

    /// 只有參考資料載入失敗會回傳錯誤；個別製造商的失敗都記在 outcome 中
    pub async fn run(&self) -> Result<Vec<ManufacturerOutcome>> {
        self.monitor.log_stats("Run started");

        let reference = self.load_reference_data().await?;
        let selected = self.select_manufacturers(&reference);
        tracing::info!("🚀 Processing {} manufacturers", selected.len());

        let mut outcomes = Vec::with_capacity(selected.len());
        for manufacturer in selected {
            let outcome = self.orchestrator.process(manufacturer, &reference).await;
            if self.monitor.is_enabled() {
                self.monitor
                    .log_stats(&format!("After {} ({})", manufacturer.name, outcome.state));
            }
            outcomes.push(outcome);
        }

        self.monitor.log_final_stats();
        Ok(outcomes)
    }
}
