pub mod engine;
pub mod extraction;
pub mod orchestrator;
pub mod reconciler;
pub mod reference_data;
pub mod sink;

pub use crate::domain::model::{Component, ComponentType, Manufacturer, RawExtractedItem, ReferenceData};
pub use crate::domain::ports::{BrowsingContext, ExtractionOracle, PageRenderer, RenderedPage, Storage};
pub use crate::utils::error::Result;
