//! Civic - Transform
//!
//! The pure building blocks a route applies to each message.
//!
//! # Overview
//!
//! - `filter` - admission predicates (`=`, `inside`, `in`)
//! - `path` - `a>b[0]>c` expressions locating a nested record list
//! - `template` - `{{field}}` / `{{field|fn}}` storage path expansion
//!
//! All three operate on a JSON object ([`Document`]) and are reentrant.
//! Compiling configuration can fail with [`TransformError`]; evaluating
//! against message data never does.
//!
//! # Example
//!
//! ```
//! use civic_transform::{PathExpression, expand};
//!
//! let doc = serde_json::json!({
//!     "ts": 1580132048,
//!     "module_id": "vix",
//!     "request_data": [{ "sites": [{ "id": "a" }, { "id": "b" }] }],
//! });
//! let doc = doc.as_object().unwrap();
//!
//! let path = PathExpression::compile("request_data[0]>sites").unwrap();
//! assert_eq!(path.resolve(doc).len(), 2);
//!
//! assert_eq!(expand("{{module_id}}.json", doc), "vix.json");
//! ```

mod error;
pub mod filter;
pub mod path;
pub mod template;

pub use civic_protocol::Document;
pub use error::{TransformError, TransformResult};
pub use filter::{Point, Predicate};
pub use path::{PathExpression, PathStep};
pub use template::expand;
