//! Wire and domain types for the case portal.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Repeatable sub-record list inside a service.
pub const INSTANCE_DETAILS_FIELD: &str = "instanceDetails";

/// Tooth list inside an instance record.
pub const TOOTH_NUMBERS_FIELD: &str = "toothNumbers";

/// A case as listed by the portal, before any sanitization.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseRecord {
    /// Raw case identifier as the portal reports it.
    pub case_id: String,
    /// Storage folder holding the case's attachments.
    pub storage_folder_id: Option<String>,
    /// Case creation time, epoch milliseconds.
    pub creation_time_ms: i64,
    pub details: CaseDetails,
    /// Why the details payload could not be parsed. `details` is empty then.
    pub details_error: Option<String>,
}

impl CaseRecord {
    /// Storage folder, if the portal assigned a non-empty one.
    pub fn storage_folder(&self) -> Option<&str> {
        self.storage_folder_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Structured case details entered on the portal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseDetails {
    #[serde(
        rename = "casePriority",
        default,
        deserialize_with = "de_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub case_priority: Option<String>,

    #[serde(rename = "patientName", default, deserialize_with = "de_text")]
    pub patient_name: String,

    /// Service name to service fields, in portal order. A service's
    /// `instanceDetails` field holds a list of repeatable sub-records.
    /// Anything other than an object reads as no services.
    #[serde(default, deserialize_with = "de_services")]
    pub services: Map<String, Value>,

    #[serde(
        rename = "additionalNote",
        default,
        deserialize_with = "de_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_note: Option<String>,

    #[serde(
        rename = "splintedCrowns",
        default,
        deserialize_with = "de_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub splinted_crowns: Option<String>,
}

impl CaseDetails {
    /// Parses a details payload that may be an object or a JSON-encoded string.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::String(s) if s.trim().is_empty() => Ok(Self::default()),
            Value::String(s) => serde_json::from_str(&s),
            other => serde_json::from_value(other),
        }
    }

    /// Services whose fields are objects, in portal order.
    pub fn services(&self) -> impl Iterator<Item = (&str, &Map<String, Value>)> {
        self.services
            .iter()
            .filter_map(|(name, fields)| fields.as_object().map(|f| (name.as_str(), f)))
    }
}

/// Renders a scalar or list value the way the portal displays it.
///
/// Lists are joined with commas, null renders empty, nested objects as JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(display_value).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Case record as it appears on the wire.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawCaseRecord {
    #[serde(default, deserialize_with = "de_text")]
    pub case_id: String,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub box_folder_id: Option<String>,
    #[serde(default)]
    pub creation_time_ms: Value,
    #[serde(default)]
    pub details_json: Value,
}

impl TryFrom<RawCaseRecord> for CaseRecord {
    type Error = String;

    fn try_from(raw: RawCaseRecord) -> Result<Self, Self::Error> {
        if raw.case_id.trim().is_empty() {
            return Err("missing case_id".to_string());
        }
        let creation_time_ms = parse_millis(&raw.creation_time_ms).ok_or_else(|| {
            format!(
                "case {}: invalid creation_time_ms {}",
                raw.case_id, raw.creation_time_ms
            )
        })?;

        // Details only feed the document; the case is still mirrored without them.
        let (details, details_error) = match CaseDetails::from_value(raw.details_json) {
            Ok(details) => (details, None),
            Err(e) => {
                warn!(case_id = %raw.case_id, error = %e, "Unreadable details_json");
                (CaseDetails::default(), Some(format!("invalid details_json: {}", e)))
            }
        };

        Ok(CaseRecord {
            case_id: raw.case_id,
            storage_folder_id: raw.box_folder_id,
            creation_time_ms,
            details,
            details_error,
        })
    }
}

/// Records stay untyped until [`keep_valid`](super::http_client) converts
/// them one by one, so a single malformed record cannot sink the listing.
#[derive(Debug, Deserialize)]
pub(crate) struct CasesResponse {
    #[serde(default)]
    pub cases: Option<Vec<Value>>,
}

/// One entry of a case's activity thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseActivity {
    /// Activity type, e.g. `admin_comment`, `user_comment`, `system_update`.
    #[serde(rename = "type", default, deserialize_with = "de_text")]
    pub kind: String,
    /// Unix seconds. Numeric strings are accepted; anything else reads as 0.
    #[serde(default, deserialize_with = "de_seconds")]
    pub timestamp: i64,
    #[serde(default, deserialize_with = "de_text")]
    pub content: String,
}

/// A redesign request on an existing case.
#[derive(Debug, Clone, PartialEq)]
pub struct RedesignRecord {
    pub redesign_id: String,
    pub case_id: String,
    pub creation_time_ms: i64,
    pub storage_folder_id: Option<String>,
    pub priority: String,
    pub activities: Vec<CaseActivity>,
}

impl RedesignRecord {
    /// Storage folder, if the portal assigned a non-empty one.
    pub fn storage_folder(&self) -> Option<&str> {
        self.storage_folder_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawRedesignRecord {
    #[serde(default, deserialize_with = "de_text")]
    pub rd_case_id: String,
    #[serde(default, deserialize_with = "de_text")]
    pub case_id: String,
    #[serde(default)]
    pub creation_time_ms: Value,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub box_folder_id: Option<String>,
    #[serde(default, deserialize_with = "de_text")]
    pub priority: String,
    #[serde(default)]
    pub activities: Vec<CaseActivity>,
}

impl TryFrom<RawRedesignRecord> for RedesignRecord {
    type Error = String;

    fn try_from(raw: RawRedesignRecord) -> Result<Self, Self::Error> {
        if raw.rd_case_id.trim().is_empty() {
            return Err("missing rd_case_id".to_string());
        }
        let creation_time_ms = parse_millis(&raw.creation_time_ms).ok_or_else(|| {
            format!(
                "redesign {}: invalid creation_time_ms {}",
                raw.rd_case_id, raw.creation_time_ms
            )
        })?;

        Ok(RedesignRecord {
            redesign_id: raw.rd_case_id,
            case_id: raw.case_id,
            creation_time_ms,
            storage_folder_id: raw.box_folder_id,
            priority: raw.priority,
            activities: raw.activities,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RedesignsResponse {
    #[serde(default)]
    pub redesigns: Option<Vec<Value>>,
}

/// Status record posted once a case has been mirrored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseStatusReport {
    pub case_id: String,
    #[serde(rename = "dateFolder")]
    pub date_folder: String,
    pub case_file: String,
    pub queue_status: String,
    pub current_allocation: String,
    #[serde(rename = "patientNames")]
    pub patient_names: String,
    pub case_units: Vec<Value>,
}

impl CaseStatusReport {
    /// A freshly mirrored case, queued for preparation and unallocated.
    pub fn mirrored(case_id: &str, date_folder: &str, patient_names: &str) -> Self {
        Self {
            case_id: case_id.to_string(),
            date_folder: date_folder.to_string(),
            case_file: "Unzipping paused".to_string(),
            queue_status: "Needs prep work".to_string(),
            current_allocation: "None".to_string(),
            patient_names: patient_names.to_string(),
            case_units: Vec::new(),
        }
    }
}

/// A named constant in the portal's key/value store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvEntry {
    #[serde(deserialize_with = "de_text")]
    pub name: String,
    #[serde(default, deserialize_with = "de_text")]
    pub value: String,
}

/// Parses epoch milliseconds from a number or a numeric string.
pub(crate) fn parse_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Accepts strings, numbers and booleans as text; null becomes empty.
fn de_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(display_value(&value))
}

/// Like [`de_text`], but null or missing becomes `None`.
fn de_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        other => Some(display_value(&other)),
    })
}

/// Epoch seconds from a number or numeric string; anything else is 0.
fn de_seconds<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_millis(&value).unwrap_or_default())
}

/// Service map, or empty when the portal sends something other than an object.
fn de_services<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map,
        _ => Map::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_case_with_string_timestamp_and_string_details() {
        let raw: RawCaseRecord = serde_json::from_value(json!({
            "case_id": "AB-123",
            "box_folder_id": "998877",
            "creation_time_ms": "1700000000000",
            "details_json": "{\"patientName\":\"Jane\",\
                \"services\":{\"crownAndBridge\":{\"material\":\"Zirconia\"}}}"
        }))
        .unwrap();

        let case = CaseRecord::try_from(raw).unwrap();
        assert_eq!(case.creation_time_ms, 1_700_000_000_000);
        assert_eq!(case.storage_folder(), Some("998877"));
        assert_eq!(case.details.patient_name, "Jane");
        assert_eq!(case.details.services().count(), 1);
    }

    #[test]
    fn test_raw_case_with_numeric_ids() {
        let raw: RawCaseRecord = serde_json::from_value(json!({
            "case_id": 42,
            "box_folder_id": 1234,
            "creation_time_ms": 1700000000000i64,
            "details_json": {"patientName": "John", "casePriority": 2}
        }))
        .unwrap();

        let case = CaseRecord::try_from(raw).unwrap();
        assert_eq!(case.case_id, "42");
        assert_eq!(case.storage_folder(), Some("1234"));
        assert_eq!(case.details.case_priority.as_deref(), Some("2"));
    }

    #[test]
    fn test_raw_case_invalid_timestamp_is_rejected() {
        let raw: RawCaseRecord = serde_json::from_value(json!({
            "case_id": "AB-1",
            "creation_time_ms": "yesterday"
        }))
        .unwrap();
        let err = CaseRecord::try_from(raw).unwrap_err();
        assert!(err.contains("AB-1"));
    }

    #[test]
    fn test_unreadable_details_keep_the_case() {
        let raw: RawCaseRecord = serde_json::from_value(json!({
            "case_id": "AB-1",
            "box_folder_id": "998877",
            "creation_time_ms": 1700000000000i64,
            "details_json": "{not json"
        }))
        .unwrap();

        let case = CaseRecord::try_from(raw).unwrap();
        assert_eq!(case.storage_folder(), Some("998877"));
        assert_eq!(case.details, CaseDetails::default());
        assert!(case.details_error.unwrap().contains("invalid details_json"));
    }

    #[test]
    fn test_non_object_services_read_as_empty() {
        let details = CaseDetails::from_value(json!({
            "patientName": "Jane",
            "services": []
        }))
        .unwrap();
        assert_eq!(details.patient_name, "Jane");
        assert_eq!(details.services().count(), 0);
    }

    #[test]
    fn test_missing_case_id_is_rejected() {
        let raw: RawCaseRecord =
            serde_json::from_value(json!({"creation_time_ms": 1})).unwrap();
        let err = CaseRecord::try_from(raw).unwrap_err();
        assert!(err.contains("case_id"));
    }

    #[test]
    fn test_activity_timestamp_accepts_strings() {
        let activities: Vec<CaseActivity> = serde_json::from_value(json!([
            {"type": "user_comment", "timestamp": "1700000000", "content": "a"},
            {"type": "user_comment", "timestamp": "yesterday", "content": "b"}
        ]))
        .unwrap();
        assert_eq!(activities[0].timestamp, 1_700_000_000);
        assert_eq!(activities[1].timestamp, 0);
    }

    #[test]
    fn test_blank_storage_folder_is_none() {
        let raw: RawCaseRecord = serde_json::from_value(json!({
            "case_id": "AB-1",
            "box_folder_id": "  ",
            "creation_time_ms": 1
        }))
        .unwrap();
        let case = CaseRecord::try_from(raw).unwrap();
        assert_eq!(case.storage_folder(), None);
    }

    #[test]
    fn test_services_keep_portal_order() {
        let details = CaseDetails::from_value(json!({
            "patientName": "Jane",
            "services": {
                "zebraService": {"a": 1},
                "alphaService": {"b": 2},
                "notAnObject": "skipped"
            }
        }))
        .unwrap();

        let names: Vec<&str> = details.services().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["zebraService", "alphaService"]);
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!(["11", "12", 13])), "11,12,13");
        assert_eq!(display_value(&json!(null)), "");
        assert_eq!(display_value(&json!(true)), "true");
        assert_eq!(display_value(&json!("x")), "x");
    }

    #[test]
    fn test_status_report_wire_shape() {
        let report = CaseStatusReport::mirrored("AB-123", "2023-11-14", "Jane");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["case_id"], "AB-123");
        assert_eq!(json["dateFolder"], "2023-11-14");
        assert_eq!(json["case_file"], "Unzipping paused");
        assert_eq!(json["queue_status"], "Needs prep work");
        assert_eq!(json["current_allocation"], "None");
        assert_eq!(json["patientNames"], "Jane");
        assert_eq!(json["case_units"], json!([]));
    }

    #[test]
    fn test_kv_entry_numeric_value() {
        let entry: KvEntry =
            serde_json::from_value(json!({"name": "portal_case_ts_ms", "value": 1700000000000i64}))
                .unwrap();
        assert_eq!(entry.value, "1700000000000");
    }

    #[test]
    fn test_raw_redesign_record() {
        let raw: RawRedesignRecord = serde_json::from_value(json!({
            "rd_case_id": "RD-7",
            "case_id": "AB-123",
            "creation_time_ms": "1700000000000",
            "priority": "High",
            "activities": [
                {
                    "type": "user_comment",
                    "timestamp": 1700000000,
                    "content": "Please shorten margin"
                }
            ]
        }))
        .unwrap();
        let redesign = RedesignRecord::try_from(raw).unwrap();
        assert_eq!(redesign.redesign_id, "RD-7");
        assert_eq!(redesign.activities.len(), 1);
        assert_eq!(redesign.storage_folder(), None);
    }
}
