//! Canonical message envelope
//!
//! An `Envelope` is produced once per feed fetch cycle:
//!
//! ```json
//! {
//!   "module_name": "feedmaker",
//!   "module_id": "vix",
//!   "acp_ts": "1580132048.123",
//!   "request_data": [ { "Latitude": "52.2", "acp_lat": 52.2 }, ... ]
//! }
//! ```
//!
//! Producers may add further top-level fields (`ts`, `feed_id`, ...) which are
//! kept in `extra` and flattened into the JSON form.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{Document, Record};

/// Canonical published message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Producer module name, e.g. `"feedmaker"`
    #[serde(default)]
    pub module_name: String,

    /// Producer instance id, e.g. `"vix"`
    #[serde(default)]
    pub module_id: String,

    /// Creation time as `"<unix-seconds>.<millis>"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acp_ts: Option<String>,

    /// Records in feed order
    #[serde(default)]
    pub request_data: Vec<Record>,

    /// Additional top-level fields
    #[serde(flatten)]
    pub extra: Document,
}

impl Envelope {
    /// Create an empty envelope stamped with the current `acp_ts`
    pub fn new(module_name: impl Into<String>, module_id: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            module_id: module_id.into(),
            acp_ts: Some(timestamp_now()),
            request_data: Vec::new(),
            extra: Document::new(),
        }
    }

    /// Replace the record list
    #[must_use]
    pub fn with_records(mut self, records: Vec<Record>) -> Self {
        self.request_data = records;
        self
    }

    /// Add a top-level field
    ///
    /// Names that collide with the typed header fields are ignored when the
    /// envelope is turned into a document.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(field.into(), value.into());
        self
    }

    /// Number of records carried
    #[inline]
    pub fn record_count(&self) -> usize {
        self.request_data.len()
    }

    /// JSON object view of the whole envelope
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("module_name".into(), self.module_name.clone().into());
        doc.insert("module_id".into(), self.module_id.clone().into());
        if let Some(ref ts) = self.acp_ts {
            doc.insert("acp_ts".into(), ts.clone().into());
        }
        for (field, value) in &self.extra {
            if !doc.contains_key(field) && field != "request_data" {
                doc.insert(field.clone(), value.clone());
            }
        }
        let records = self
            .request_data
            .iter()
            .map(|r| serde_json::Value::Object(r.to_document()))
            .collect();
        doc.insert("request_data".into(), serde_json::Value::Array(records));
        doc
    }
}

/// Current time formatted as `"<unix-seconds>.<millis>"`
pub fn timestamp_now() -> String {
    let now = Utc::now();
    format!("{}.{:03}", now.timestamp(), now.timestamp_subsec_millis())
}
