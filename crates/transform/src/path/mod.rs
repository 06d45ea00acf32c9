//! Record path expressions
//!
//! A route's `records_data` names the list of records inside a message:
//!
//! ```text
//! request_data          the top-level list `request_data`
//! foo>request_data[0]>sites
//!                       object `foo`, element 0 of its list `request_data`,
//!                       then that element's list `sites`
//! ```
//!
//! Steps are separated by `>`. A step written `name[n]` selects list `name`
//! and continues inside its element `n`. The last step names the list that
//! is returned; every other plain step descends into an object.

use std::fmt;

use civic_protocol::Document;
use serde_json::Value;

use crate::{TransformError, TransformResult};

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

const STEP_SEPARATOR: char = '>';

/// One navigation step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    /// Descend into a nested object
    Object(String),
    /// Select a nested list as the result
    Array(String),
    /// Select a nested list, then continue inside one of its elements
    IndexedArray(String, usize),
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object(name) => write!(f, "OBJECT {name}"),
            Self::Array(name) => write!(f, "ARRAY {name}"),
            Self::IndexedArray(name, index) => write!(f, "INDEXED_ARRAY {name}[{index}]"),
        }
    }
}

/// Compiled path expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpression {
    source: String,
    steps: Vec<PathStep>,
}

impl PathExpression {
    /// Compile a `>`-separated path
    ///
    /// # Errors
    ///
    /// Empty steps and unparseable indexes are rejected.
    pub fn compile(path: &str) -> TransformResult<Self> {
        let parts: Vec<&str> = path.split(STEP_SEPARATOR).collect();
        let last = parts.len() - 1;

        let steps = parts
            .iter()
            .enumerate()
            .map(|(i, part)| compile_step(path, part, i == last))
            .collect::<TransformResult<Vec<_>>>()?;

        tracing::debug!(
            path,
            steps = %steps.iter().map(ToString::to_string).collect::<Vec<_>>().join(" > "),
            "compiled record path"
        );

        Ok(Self {
            source: path.to_string(),
            steps,
        })
    }

    /// The path as written
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Compiled steps
    #[inline]
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Walk `document` and return the last list selected
    ///
    /// Any missing or wrongly-shaped step gives an empty list.
    pub fn resolve(&self, document: &Document) -> Vec<Value> {
        match self.walk(document) {
            Some(list) => list.clone(),
            None => {
                tracing::trace!(path = %self.source, "record path did not resolve");
                Vec::new()
            }
        }
    }

    fn walk<'a>(&self, document: &'a Document) -> Option<&'a Vec<Value>> {
        let mut object = document;
        let mut list: Option<&Vec<Value>> = None;

        for step in &self.steps {
            match step {
                PathStep::Object(name) => {
                    object = object.get(name)?.as_object()?;
                }
                PathStep::Array(name) => {
                    list = Some(object.get(name)?.as_array()?);
                }
                PathStep::IndexedArray(name, index) => {
                    let array = object.get(name)?.as_array()?;
                    object = array.get(*index)?.as_object()?;
                    list = Some(array);
                }
            }
        }

        list
    }
}

impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn compile_step(path: &str, part: &str, last: bool) -> TransformResult<PathStep> {
    if let Some(body) = part.strip_suffix(']') {
        let (name, index) = body
            .split_once('[')
            .ok_or_else(|| TransformError::invalid_path(path, format!("unbalanced ']' in '{part}'")))?;
        let index = index
            .trim()
            .parse::<usize>()
            .map_err(|_| TransformError::invalid_path(path, format!("bad index '{index}'")))?;
        if name.is_empty() {
            return Err(TransformError::invalid_path(path, "index without a field name"));
        }
        return Ok(PathStep::IndexedArray(name.to_string(), index));
    }

    if part.is_empty() {
        return Err(TransformError::invalid_path(path, "empty step"));
    }

    if last {
        Ok(PathStep::Array(part.to_string()))
    } else {
        Ok(PathStep::Object(part.to_string()))
    }
}
