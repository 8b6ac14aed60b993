//! Structured page-builder document stored as draft and version content.
//!
//! The engine only cares about the envelope: a `root` object and a `content`
//! list of blocks. Everything else, including unknown keys, is carried through
//! untouched so the editor gets back exactly what it saved.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

/// Root props key holding the (possibly per-language) page title.
pub const PROP_PAGE_TITLE: &str = "pageTitle";
/// Fallback root props key for the title.
pub const PROP_TITLE: &str = "title";
/// Root props key the editor reads the slug from.
pub const PROP_SLUG: &str = "slug";

/// A page-builder document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    pub root: ContentRoot,
    pub content: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zones: Option<BTreeMap<String, Vec<ContentBlock>>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The document root. Page-level settings live in `props`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentRoot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One block in the content list or a zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub block_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PageContent {
    /// An empty document: `{ root: { props: {} }, content: [], zones: {} }`.
    pub fn empty() -> Self {
        Self {
            root: ContentRoot {
                props: Some(Map::new()),
                extra: Map::new(),
            },
            content: Vec::new(),
            zones: Some(BTreeMap::new()),
            extra: Map::new(),
        }
    }

    /// Parse an untyped JSON value, checking the minimal envelope.
    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        let Value::Object(obj) = &value else {
            return Err(CoreError::Validation(
                "content must be a JSON object".into(),
            ));
        };
        if !obj.get("root").is_some_and(Value::is_object) {
            return Err(CoreError::Validation(
                "content.root must be an object".into(),
            ));
        }
        if !obj.get("content").is_some_and(Value::is_array) {
            return Err(CoreError::Validation(
                "content.content must be a list".into(),
            ));
        }
        serde_json::from_value(value)
            .map_err(|e| CoreError::Validation(format!("invalid content: {e}")))
    }

    /// `true` when neither the content list nor any zone holds a block.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
            && self
                .zones
                .as_ref()
                .map_or(true, |zones| zones.values().all(Vec::is_empty))
    }

    /// Derive the stored page title from the root props.
    ///
    /// `pageTitle` wins over `title`; a blank value falls through to the next
    /// key. A per-language object is serialized to JSON text. Returns an empty
    /// string when neither key carries a value.
    pub fn extract_title(&self) -> String {
        let Some(props) = &self.root.props else {
            return String::new();
        };
        [PROP_PAGE_TITLE, PROP_TITLE]
            .iter()
            .filter_map(|key| props.get(*key))
            .find(|v| is_present(v))
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_default()
    }

    /// Inject the persisted title and slug into `root.props`, overriding
    /// whatever the document carried.
    pub fn with_page_info(mut self, title: &str, slug: &str) -> Self {
        let props = self.root.props.get_or_insert_with(Map::new);
        props.insert(PROP_TITLE.into(), Value::String(title.to_string()));
        props.insert(PROP_SLUG.into(), Value::String(slug.to_string()));
        self
    }
}

fn is_present(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}
