use crate::domain::model::{Component, ComponentType, Manufacturer, RawExtractedItem};
use crate::utils::error::{Result, ScoutError};
use std::collections::HashMap;

/// 以不分大小寫的完全比對，把自由文字的類型對應到已知的 ComponentType
pub struct ComponentReconciler<'a> {
    types_by_name: HashMap<String, &'a ComponentType>,
}

impl<'a> ComponentReconciler<'a> {
    pub fn new(component_types: &'a [ComponentType]) -> Self {
        let mut types_by_name = HashMap::with_capacity(component_types.len());
        for component_type in component_types {
            // 名稱重複時保留第一筆
            types_by_name
                .entry(component_type.name.to_lowercase())
                .or_insert(component_type);
        }
        Self { types_by_name }
    }

    pub fn resolve(&self, label: &str) -> Option<&'a ComponentType> {
        self.types_by_name.get(&label.to_lowercase()).copied()
    }

    /// 未對應的項目直接略過；對應成功但組裝失敗則整批中止
    pub fn reconcile(
        &self,
        manufacturer: &Manufacturer,
        items: &[RawExtractedItem],
    ) -> Result<Vec<Component>> {
        let mut components = Vec::with_capacity(items.len());

        for item in items {
            let Some(component_type) = item
                .component_type
                .as_deref()
                .and_then(|label| self.resolve(label))
            else {
                tracing::debug!(
                    "Dropping '{}' with unknown type {:?}",
                    item.label(),
                    item.component_type
                );
                continue;
            };

            let component = Component::assemble(manufacturer, component_type, item).map_err(|e| {
                ScoutError::ReconciliationError {
                    item: item.label().to_string(),
                    message: e.to_string(),
                }
            })?;
            components.push(component);
        }

        Ok(components)
    }
}
