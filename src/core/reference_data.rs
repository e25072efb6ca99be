use crate::domain::model::{
    ComponentType, ComponentTypeRecord, Manufacturer, ManufacturerRecord, ReferenceData,
};
use crate::domain::ports::Storage;
use crate::utils::error::{Result, ScoutError};
use serde::de::DeserializeOwned;

pub const MANUFACTURERS_FILE: &str = "Manufacturer.json";
pub const COMPONENT_TYPES_FILE: &str = "component_types.json";

/// 讀取並驗證兩份參考資料；任何一筆不合格就整份拒絕
pub struct ReferenceDataLoader<S: Storage> {
    storage: S,
    manufacturers_file: String,
    component_types_file: String,
}

impl<S: Storage> ReferenceDataLoader<S> {
    pub fn new(storage: S) -> Self {
        Self::with_files(storage, MANUFACTURERS_FILE, COMPONENT_TYPES_FILE)
    }

    pub fn with_files(storage: S, manufacturers_file: &str, component_types_file: &str) -> Self {
        Self {
            storage,
            manufacturers_file: manufacturers_file.to_string(),
            component_types_file: component_types_file.to_string(),
        }
    }

    pub async fn load_manufacturers(&self) -> Result<Vec<Manufacturer>> {
        self.load_records::<ManufacturerRecord, Manufacturer>(&self.manufacturers_file)
            .await
    }

    pub async fn load_component_types(&self) -> Result<Vec<ComponentType>> {
        self.load_records::<ComponentTypeRecord, ComponentType>(&self.component_types_file)
            .await
    }

    pub async fn load(&self) -> Result<ReferenceData> {
        let manufacturers = self.load_manufacturers().await?;
        let component_types = self.load_component_types().await?;

        tracing::info!(
            "📚 Loaded {} manufacturers and {} component types",
            manufacturers.len(),
            component_types.len()
        );

        Ok(ReferenceData {
            manufacturers,
            component_types,
        })
    }

    async fn load_records<R, T>(&self, file: &str) -> Result<Vec<T>>
    where
        R: DeserializeOwned,
        T: TryFrom<R, Error = ScoutError>,
    {
        let data_load_error = |message: String| ScoutError::DataLoadError {
            file: self.storage.location(file),
            message,
        };

        tracing::debug!("Reading reference data from {}", self.storage.location(file));
        let bytes = self
            .storage
            .read_file(file)
            .await
            .map_err(|e| data_load_error(e.to_string()))?;

        let document: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|e| data_load_error(format!("invalid JSON: {}", e)))?;
        let serde_json::Value::Array(elements) = document else {
            return Err(data_load_error("expected a JSON array".to_string()));
        };

        elements
            .into_iter()
            .enumerate()
            .map(|(index, element)| {
                let record: R = serde_json::from_value(element)
                    .map_err(|e| data_load_error(format!("record #{}: {}", index, e)))?;
                T::try_from(record).map_err(|e| data_load_error(format!("record #{}: {}", index, e)))
            })
            .collect()
    }
}
