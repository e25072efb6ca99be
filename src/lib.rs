pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

pub use adapters::{AnthropicOracle, HttpPageRenderer, LocalStorage};
pub use config::AppConfig;
pub use core::{
    engine::ScrapeEngine,
    extraction::ExtractionAdapter,
    orchestrator::{ManufacturerOrchestrator, ManufacturerOutcome, ManufacturerState},
    reconciler::ComponentReconciler,
    reference_data::ReferenceDataLoader,
    sink::ComponentSink,
};
pub use utils::error::{Result, ScoutError};
