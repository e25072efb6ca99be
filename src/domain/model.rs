use crate::utils::error::{Result, ScoutError};
use crate::utils::validation::{
    parse_http_url, parse_uuid, required_text, validate_email, validate_non_empty_string,
    validate_required_field,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use url::Url;
use uuid::Uuid;

/// 已驗證的 http(s) URL，序列化時保留原始字串
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct HttpUrl {
    raw: String,
    parsed: Url,
}

impl HttpUrl {
    pub fn parse(field_name: &str, value: &str) -> Result<Self> {
        let parsed = parse_http_url(field_name, value)?;
        Ok(Self {
            raw: value.trim().to_string(),
            parsed,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn url(&self) -> &Url {
        &self.parsed
    }
}

impl TryFrom<String> for HttpUrl {
    type Error = ScoutError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse("url", &value)
    }
}

impl Serialize for HttpUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl fmt::Display for HttpUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(field_name: &str, value: &str) -> Result<Self> {
        validate_email(field_name, value)?;
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = ScoutError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse("email", &value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// `Manufacturer.json` 中的原始紀錄，尚未驗證
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManufacturerRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub website_url: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub parent_id: Option<String>,
    pub logo_file_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manufacturer {
    pub id: Uuid,
    pub name: String,
    pub website_url: HttpUrl,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<EmailAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    pub parent_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_file_id: Option<Uuid>,
}

impl TryFrom<ManufacturerRecord> for Manufacturer {
    type Error = ScoutError;

    fn try_from(record: ManufacturerRecord) -> Result<Self> {
        let id = required_uuid("id", record.id.as_deref())?;
        let name = required_text("name", record.name.as_deref())?;
        let website_url = HttpUrl::parse(
            "websiteUrl",
            &required_text("websiteUrl", record.website_url.as_deref())?,
        )?;
        let contact_email = record
            .contact_email
            .as_deref()
            .map(|email| EmailAddress::parse("contactEmail", email))
            .transpose()?;
        let parent_id = record
            .parent_id
            .as_deref()
            .map(|id| parse_uuid("parentId", id))
            .transpose()?;
        let logo_file_id = record
            .logo_file_id
            .as_deref()
            .map(|id| parse_uuid("logoFileId", id))
            .transpose()?;

        Ok(Self {
            id,
            name,
            website_url,
            contact_email,
            contact_phone: record.contact_phone,
            parent_id,
            logo_file_id,
        })
    }
}

fn required_uuid(field_name: &str, value: Option<&str>) -> Result<Uuid> {
    parse_uuid(field_name, validate_required_field(field_name, &value)?)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentTypeRecord {
    pub type_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentType {
    pub type_id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TryFrom<ComponentTypeRecord> for ComponentType {
    type Error = ScoutError;

    fn try_from(record: ComponentTypeRecord) -> Result<Self> {
        let type_id = required_uuid("typeId", record.type_id.as_deref())?;
        let name = required_text("name", record.name.as_deref())?;

        Ok(Self {
            type_id,
            name,
            description: record.description,
        })
    }
}

/// 整個執行期間唯讀的參考資料
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub manufacturers: Vec<Manufacturer>,
    pub component_types: Vec<ComponentType>,
}

impl ReferenceData {
    pub fn type_names(&self) -> Vec<String> {
        self.component_types.iter().map(|t| t.name.clone()).collect()
    }
}

/// 模型回傳的候選產品，未經任何驗證；欄位型別留到組裝時才檢查
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawExtractedItem {
    pub name: Option<serde_json::Value>,
    pub model_number: Option<serde_json::Value>,
    /// 非字串的型別視同沒有型別
    #[serde(rename = "type", default, deserialize_with = "lenient_text")]
    pub component_type: Option<String>,
    pub specifications: Option<serde_json::Value>,
    pub features: Option<serde_json::Value>,
    pub description: Option<serde_json::Value>,
    pub url: Option<serde_json::Value>,
}

impl RawExtractedItem {
    /// 用於日誌與錯誤訊息的識別字
    pub fn label(&self) -> &str {
        self.name
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .or_else(|| self.model_number.as_ref().and_then(serde_json::Value::as_str))
            .unwrap_or("<unnamed>")
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(text)) => Some(text),
        _ => None,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Specifications {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_requirements: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operating_conditions: Option<String>,
}

impl Specifications {
    /// 只保留已知欄位；已知欄位若不是字串即視為格式錯誤
    pub fn from_value(value: &serde_json::Value) -> Result<Option<Self>> {
        let object = match value {
            serde_json::Value::Null => return Ok(None),
            serde_json::Value::Object(object) => object,
            other => {
                return Err(ScoutError::ValidationError {
                    field: "specifications".to_string(),
                    value: other.to_string(),
                    reason: "Specifications must be an object".to_string(),
                })
            }
        };

        let field = |key: &str| -> Result<Option<String>> {
            match object.get(key) {
                None | Some(serde_json::Value::Null) => Ok(None),
                Some(serde_json::Value::String(s)) => Ok(Some(s.clone())),
                Some(other) => Err(ScoutError::ValidationError {
                    field: format!("specifications.{}", key),
                    value: other.to_string(),
                    reason: "Specification values must be strings".to_string(),
                }),
            }
        };

        Ok(Some(Self {
            dimensions: field("dimensions")?,
            weight: field("weight")?,
            capacity: field("capacity")?,
            power_requirements: field("powerRequirements")?,
            operating_conditions: field("operatingConditions")?,
        }))
    }
}

/// 輸出紀錄；只能透過 `Component::assemble` 建立
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub manufacturer_id: Uuid,
    pub type_id: Uuid,
    pub name: String,
    pub model_number: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specifications: Option<Specifications>,
    pub features: Vec<String>,
    pub urls: Vec<HttpUrl>,
}

impl Component {
    pub fn assemble(
        manufacturer: &Manufacturer,
        component_type: &ComponentType,
        item: &RawExtractedItem,
    ) -> Result<Self> {
        let name = item_text("name", item.name.as_ref())?;
        let model_number = item_text("modelNumber", item.model_number.as_ref())?;
        let description = item_text("description", item.description.as_ref())?;
        let specifications = match &item.specifications {
            Some(value) => Specifications::from_value(value)?,
            None => None,
        };
        let features = parse_features(item.features.as_ref())?;
        let url = item_text("url", item.url.as_ref())?;
        let urls = vec![HttpUrl::parse("url", &url)?];

        Ok(Self {
            manufacturer_id: manufacturer.id,
            type_id: component_type.type_id,
            name,
            model_number,
            description,
            specifications,
            features,
            urls,
        })
    }
}

fn item_text(field_name: &str, value: Option<&serde_json::Value>) -> Result<String> {
    match value {
        None | Some(serde_json::Value::Null) => required_text(field_name, None),
        Some(serde_json::Value::String(text)) => required_text(field_name, Some(text)),
        Some(other) => Err(ScoutError::ValidationError {
            field: field_name.to_string(),
            value: other.to_string(),
            reason: "Value must be a string".to_string(),
        }),
    }
}

fn parse_features(value: Option<&serde_json::Value>) -> Result<Vec<String>> {
    let invalid = |value: &serde_json::Value, reason: &str| ScoutError::ValidationError {
        field: "features".to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };

    match value {
        None | Some(serde_json::Value::Null) => Err(ScoutError::ValidationError {
            field: "features".to_string(),
            value: "<missing>".to_string(),
            reason: "Required field is missing".to_string(),
        }),
        Some(serde_json::Value::Array(entries)) => entries
            .iter()
            .map(|entry| match entry {
                serde_json::Value::String(feature) => {
                    validate_non_empty_string("features", feature)?;
                    Ok(feature.clone())
                }
                other => Err(invalid(other, "Features must be strings")),
            })
            .collect(),
        Some(other) => Err(invalid(other, "Features must be an array of strings")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manufacturer() -> Manufacturer {
        Manufacturer::try_from(ManufacturerRecord {
            id: Some("0b7c5e0a-8f61-4a43-9a55-6f2f5a0f2a11".to_string()),
            name: Some("Acme Air".to_string()),
            website_url: Some("https://acme-air.example.com".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    fn compressor() -> ComponentType {
        ComponentType {
            type_id: Uuid::parse_str("9d1e4c6b-2a3f-4e5d-8c7b-1a2b3c4d5e6f").unwrap(),
            name: "compressor".to_string(),
            description: None,
        }
    }

    fn raw_item() -> RawExtractedItem {
        serde_json::from_value(json!({
            "name": "Scroll Compressor ZR",
            "modelNumber": "ZR-42",
            "type": "Compressor",
            "specifications": {"capacity": "3 tons", "weight": "30 kg", "color": "grey"},
            "features": ["Quiet operation", "High efficiency"],
            "description": "Hermetic scroll compressor",
            "url": "https://acme-air.example.com/products/zr-42"
        }))
        .unwrap()
    }

    #[test]
    fn test_manufacturer_requires_valid_uuid() {
        let result = Manufacturer::try_from(ManufacturerRecord {
            id: Some("42".to_string()),
            name: Some("Acme".to_string()),
            website_url: Some("https://acme.example.com".to_string()),
            ..Default::default()
        });

        match result {
            Err(ScoutError::ValidationError { field, .. }) => assert_eq!(field, "id"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_manufacturer_rejects_bad_email() {
        let result = Manufacturer::try_from(ManufacturerRecord {
            id: Some("0b7c5e0a-8f61-4a43-9a55-6f2f5a0f2a11".to_string()),
            name: Some("Acme".to_string()),
            website_url: Some("https://acme.example.com".to_string()),
            contact_email: Some("sales-at-acme".to_string()),
            ..Default::default()
        });

        assert!(result.is_err());
    }

    #[test]
    fn test_assemble_binds_ids_and_drops_unknown_specs() {
        let component = Component::assemble(&manufacturer(), &compressor(), &raw_item()).unwrap();

        assert_eq!(component.manufacturer_id, manufacturer().id);
        assert_eq!(component.type_id, compressor().type_id);
        assert_eq!(component.urls.len(), 1);
        assert_eq!(
            component.urls[0].as_str(),
            "https://acme-air.example.com/products/zr-42"
        );

        let specs = component.specifications.unwrap();
        assert_eq!(specs.capacity.as_deref(), Some("3 tons"));
        assert_eq!(specs.dimensions, None);
    }

    #[test]
    fn test_assemble_rejects_malformed_url() {
        let mut item = raw_item();
        item.url = Some(json!("not a url"));

        let err = Component::assemble(&manufacturer(), &compressor(), &item).unwrap_err();
        assert!(matches!(err, ScoutError::ValidationError { ref field, .. } if field == "url"));
    }

    #[test]
    fn test_assemble_rejects_missing_description() {
        let mut item = raw_item();
        item.description = None;

        assert!(Component::assemble(&manufacturer(), &compressor(), &item).is_err());
    }

    #[test]
    fn test_assemble_rejects_non_string_model_number() {
        let mut item = raw_item();
        item.model_number = Some(json!(12345));

        let err = Component::assemble(&manufacturer(), &compressor(), &item).unwrap_err();
        assert!(matches!(err, ScoutError::ValidationError { ref field, .. } if field == "modelNumber"));
    }

    #[test]
    fn test_raw_item_tolerates_any_field_types() {
        let item: RawExtractedItem = serde_json::from_value(json!({
            "name": ["not", "a", "string"],
            "modelNumber": 12345,
            "type": 7,
            "description": {"text": "x"},
            "url": false
        }))
        .unwrap();

        assert_eq!(item.component_type, None);
        assert_eq!(item.model_number, Some(json!(12345)));
        assert_eq!(item.label(), "<unnamed>");
    }

    #[test]
    fn test_assemble_rejects_non_string_features() {
        let mut item = raw_item();
        item.features = Some(json!(["ok", 3]));

        assert!(Component::assemble(&manufacturer(), &compressor(), &item).is_err());
    }

    #[test]
    fn test_component_serializes_camel_case() {
        let component = Component::assemble(&manufacturer(), &compressor(), &raw_item()).unwrap();
        let value = serde_json::to_value(&component).unwrap();

        assert!(value.get("manufacturerId").is_some());
        assert!(value.get("modelNumber").is_some());
        assert_eq!(value["specifications"]["capacity"], "3 tons");
        assert!(value["specifications"].get("color").is_none());
        assert_eq!(value["urls"][0], "https://acme-air.example.com/products/zr-42");
    }
}
