//! Record shaping for a route
//!
//! Decides which documents a message turns into before storage:
//!
//! | Mode | Output |
//! |------|--------|
//! | `Whole` | the message itself |
//! | `Flatten` | one document per element of a list field, merged with the rest of the message |
//! | `Extract` | one document per element of a path-selected list, merged with chosen message fields |
//!
//! In both merging modes the element's own fields win on conflict.

use civic_protocol::Document;
use civic_transform::PathExpression;
use serde_json::Value;

/// How a route turns a message into stored documents
#[derive(Debug, Clone, Default)]
pub enum Reshape {
    /// Store the message as is
    #[default]
    Whole,

    /// Explode the named list field
    Flatten {
        /// List field to explode
        field: String,
    },

    /// Store each element of a nested list
    Extract {
        /// Where the list lives
        path: PathExpression,
        /// Message fields copied into every element
        merge_base: Vec<String>,
    },
}

impl Reshape {
    /// Mode name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Whole => "whole",
            Self::Flatten { .. } => "flatten",
            Self::Extract { .. } => "records_data",
        }
    }

    /// Documents to store for `message`
    pub fn apply(&self, message: &Document) -> Vec<Document> {
        match self {
            Self::Whole => vec![message.clone()],
            Self::Flatten { field } => flatten(message, field),
            Self::Extract { path, merge_base } => extract(message, path, merge_base),
        }
    }
}

fn flatten(message: &Document, field: &str) -> Vec<Document> {
    let Some(Value::Array(elements)) = message.get(field) else {
        tracing::warn!(field, "flatten field missing or not a list");
        return Vec::new();
    };

    let mut base = message.clone();
    base.shift_remove(field);

    merge_each(&base, elements, field)
}

fn extract(message: &Document, path: &PathExpression, merge_base: &[String]) -> Vec<Document> {
    let elements = path.resolve(message);
    if elements.is_empty() {
        tracing::debug!(path = %path, "no records at path");
        return Vec::new();
    }

    let mut base = Document::new();
    for key in merge_base {
        if let Some(value) = message.get(key) {
            base.insert(key.clone(), value.clone());
        }
    }

    merge_each(&base, &elements, path.as_str())
}

fn merge_each(base: &Document, elements: &[Value], source: &str) -> Vec<Document> {
    let mut out = Vec::with_capacity(elements.len());
    for (index, element) in elements.iter().enumerate() {
        let Value::Object(fields) = element else {
            tracing::warn!(source, index, "skipping non-object list element");
            continue;
        };
        let mut doc = base.clone();
        for (key, value) in fields {
            doc.insert(key.clone(), value.clone());
        }
        out.push(doc);
    }
    out
}
