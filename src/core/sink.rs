use crate::domain::model::Component;
use crate::domain::ports::Storage;
use crate::utils::error::{Result, ScoutError};
use once_cell::sync::Lazy;
use regex::Regex;

pub const OUTPUT_SUFFIX: &str = "_components.json";

// 連續的非英數字元合併成一個底線
static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("filename pattern is valid"));

/// 製造商名稱 → 輸出檔名，例如 `Acme/Co. #1` → `acme_co_1_components.json`
pub fn output_file_name(manufacturer_name: &str) -> String {
    let sanitized = UNSAFE_CHARS.replace_all(manufacturer_name, "_");
    format!("{}{}", sanitized.to_lowercase(), OUTPUT_SUFFIX)
}

/// 每個製造商寫一個 JSON 檔，同名檔案直接覆蓋
pub struct ComponentSink<S: Storage> {
    storage: S,
}

impl<S: Storage> ComponentSink<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub async fn persist(&self, manufacturer_name: &str, components: &[Component]) -> Result<String> {
        let file_name = output_file_name(manufacturer_name);
        let location = self.storage.location(&file_name);
        let persistence_error = |message: String| ScoutError::PersistenceError {
            path: location.clone(),
            message,
        };

        if components.is_empty() {
            return Err(persistence_error("refusing to write an empty component list".to_string()));
        }

        // 先完整序列化，再一次寫入
        let json = serde_json::to_string_pretty(components)
            .map_err(|e| persistence_error(e.to_string()))?;
        self.storage
            .write_file(&file_name, json.as_bytes())
            .await
            .map_err(|e| persistence_error(e.to_string()))?;

        tracing::debug!("💾 Wrote {} components to {}", components.len(), location);
        Ok(location)
    }
}
