//! Schema value types: desired index specs, the catalog's view of existing
//! indexes, plans, reports, and the webhook request record.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use mongodb::bson::{Bson, DateTime, Document};
use serde::{Deserialize, Serialize};

use crate::errors::InitError;
use crate::utils::validate_field_path;

/// Sort direction of one index key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// The numeric value MongoDB uses in a key document (`1` or `-1`).
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Ascending => 1,
            Self::Descending => -1,
        }
    }

    /// Parse a numeric key value. Any positive value is ascending and any
    /// negative value descending, matching how the server reads key documents.
    pub fn from_number(value: f64) -> Option<Self> {
        if value > 0.0 {
            Some(Self::Ascending)
        } else if value < 0.0 {
            Some(Self::Descending)
        } else {
            None
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i32())
    }
}

/// A validated dotted field path, e.g. `headers.x-signature`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(String);

impl FieldPath {
    /// Create a field path, rejecting empty segments, `$`-prefixed segments and NUL bytes.
    pub fn new(path: impl Into<String>) -> Result<Self, InitError> {
        let path = path.into();
        validate_field_path(&path)?;
        Ok(Self(path))
    }

    /// Wrap a compile-time constant path. Checked again by `IndexSpec::validate`.
    pub(crate) fn from_static(path: &'static str) -> Self {
        Self(path.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The individual segments of the path.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Options of a desired index. Defaults match a plain `createIndex` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexOptions {
    /// Explicit index name. When `None` the server's default name is used.
    pub name: Option<String>,
    pub unique: bool,
    pub sparse: bool,
    /// TTL for documents, only meaningful on date fields.
    pub expire_after: Option<Duration>,
}

/// One desired secondary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub keys: Vec<(FieldPath, SortDirection)>,
    pub options: IndexOptions,
}

impl IndexSpec {
    /// Single-field index with default options.
    pub fn single(field: &str, direction: SortDirection) -> Result<Self, InitError> {
        Ok(Self {
            keys: vec![(FieldPath::new(field)?, direction)],
            options: IndexOptions::default(),
        })
    }

    pub fn with_options(mut self, options: IndexOptions) -> Self {
        self.options = options;
        self
    }

    /// Effective index name: the explicit one, or `<field>_<dir>` pairs joined by `_`.
    pub fn name(&self) -> String {
        if let Some(name) = &self.options.name {
            return name.clone();
        }
        self.keys
            .iter()
            .map(|(field, direction)| format!("{}_{}", field, direction))
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Check the spec has at least one key and no field twice.
    pub fn validate(&self) -> Result<(), InitError> {
        if self.keys.is_empty() {
            return Err(InitError::validation("Index spec must have at least one key"));
        }
        for (i, (field, _)) in self.keys.iter().enumerate() {
            validate_field_path(field.as_str())?;
            if self.keys[..i].iter().any(|(other, _)| other == field) {
                return Err(InitError::validation(format!(
                    "Field '{}' appears more than once in index '{}'",
                    field,
                    self.name()
                )));
            }
        }
        if let Some(name) = &self.options.name {
            if name.is_empty() {
                return Err(InitError::validation("Index name cannot be empty"));
            }
        }
        Ok(())
    }

    /// The ordered field list, ignoring directions.
    pub fn fields(&self) -> Vec<&str> {
        self.keys.iter().map(|(field, _)| field.as_str()).collect()
    }
}

/// Kind of one key in an existing index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyType {
    Ordered(SortDirection),
    /// Non-ordered key types such as `text`, `hashed` or `2dsphere`.
    Special(String),
}

/// An index as reported by the catalog.
///
/// Carries every option that makes two indexes over the same keys behave
/// differently, so a partial, collated or hidden index is never mistaken
/// for a plain one.
#[derive(Debug, Clone, PartialEq)]
pub struct ExistingIndex {
    pub name: String,
    pub keys: Vec<(String, KeyType)>,
    pub unique: bool,
    pub sparse: bool,
    pub expire_after: Option<Duration>,
    pub partial_filter_expression: Option<Document>,
    pub collation: Option<Document>,
    pub hidden: bool,
}

impl ExistingIndex {
    /// Name of the primary-key index every collection carries.
    pub const PRIMARY_KEY_NAME: &'static str = "_id_";

    /// Build the catalog view of a desired spec, as it would look once created.
    pub fn from_spec(spec: &IndexSpec) -> Self {
        Self {
            name: spec.name(),
            keys: spec
                .keys
                .iter()
                .map(|(field, direction)| (field.to_string(), KeyType::Ordered(*direction)))
                .collect(),
            unique: spec.options.unique,
            sparse: spec.options.sparse,
            expire_after: spec.options.expire_after,
            partial_filter_expression: None,
            collation: None,
            hidden: false,
        }
    }

    pub fn primary_key() -> Self {
        Self {
            name: Self::PRIMARY_KEY_NAME.to_string(),
            keys: vec![("_id".to_string(), KeyType::Ordered(SortDirection::Ascending))],
            unique: false,
            sparse: false,
            expire_after: None,
            partial_filter_expression: None,
            collation: None,
            hidden: false,
        }
    }

    pub fn is_primary_key(&self) -> bool {
        self.name == Self::PRIMARY_KEY_NAME
    }

    /// Same fields, same order and same directions as the spec.
    pub fn has_same_keys(&self, spec: &IndexSpec) -> bool {
        self.keys.len() == spec.keys.len()
            && self
                .keys
                .iter()
                .zip(&spec.keys)
                .all(|((field, key_type), (want_field, want_dir))| {
                    field == want_field.as_str() && *key_type == KeyType::Ordered(*want_dir)
                })
    }

    /// Same ordered field list as the spec, regardless of key types.
    pub fn has_same_fields(&self, spec: &IndexSpec) -> bool {
        self.keys.len() == spec.keys.len()
            && self
                .keys
                .iter()
                .zip(&spec.keys)
                .all(|((field, _), (want_field, _))| field == want_field.as_str())
    }

    pub fn has_same_options(&self, spec: &IndexSpec) -> bool {
        self.unique == spec.options.unique
            && self.sparse == spec.options.sparse
            && self.expire_after == spec.options.expire_after
            && self.partial_filter_expression.is_none()
            && self.collation.is_none()
            && !self.hidden
    }

    /// Human-readable key document, e.g. `{method: 1}`.
    pub fn describe_keys(&self) -> String {
        let keys = self
            .keys
            .iter()
            .map(|(field, key_type)| match key_type {
                KeyType::Ordered(direction) => format!("{}: {}", field, direction),
                KeyType::Special(kind) => format!("{}: \"{}\"", field, kind),
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("{{{}}}", keys)
    }

    /// Human-readable option set, e.g. `{unique: true}`; `{}` for defaults.
    pub fn describe_options(&self) -> String {
        let mut options = Vec::new();
        if self.unique {
            options.push("unique: true".to_string());
        }
        if self.sparse {
            options.push("sparse: true".to_string());
        }
        if let Some(ttl) = self.expire_after {
            options.push(format!("expireAfterSeconds: {}", ttl.as_secs()));
        }
        if let Some(filter) = &self.partial_filter_expression {
            options.push(format!("partialFilterExpression: {}", filter));
        }
        if let Some(collation) = &self.collation {
            options.push(format!("collation: {}", collation));
        }
        if self.hidden {
            options.push("hidden: true".to_string());
        }
        format!("{{{}}}", options.join(", "))
    }
}

/// What the initializer will do for one desired index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexAction {
    Create,
    /// An equivalent index already exists, possibly under another name.
    AlreadyPresent { existing_name: String },
}

/// One planned index with its decided action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedIndex {
    pub spec: IndexSpec,
    pub action: IndexAction,
}

/// The difference between the desired schema and the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaPlan {
    pub database: String,
    pub collection: String,
    pub collection_exists: bool,
    pub indexes: Vec<PlannedIndex>,
}

impl SchemaPlan {
    /// Names of the indexes that still need to be created.
    pub fn pending(&self) -> Vec<String> {
        self.indexes
            .iter()
            .filter(|planned| planned.action == IndexAction::Create)
            .map(|planned| planned.spec.name())
            .collect()
    }

    pub fn is_up_to_date(&self) -> bool {
        self.collection_exists && self.pending().is_empty()
    }
}

/// Outcome of a successful initialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
    pub database: String,
    pub collection: String,
    pub collection_created: bool,
    pub created: Vec<String>,
    pub already_present: Vec<String>,
}

/// A captured webhook request as stored in the request collection.
///
/// The initializer never reads or writes these; the type documents the
/// shape the indexes are built for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookRequest {
    pub timestamp: DateTime,
    pub method: String,
    pub url: String,
    pub path: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub query_params: HashMap<String, String>,
    pub body: Option<Bson>,
    pub client_host: Option<String>,
    pub user_agent: Option<String>,
    pub content_type: Option<String>,
    pub content_length: Option<String>,
    pub x_signature: Option<String>,
    pub x_timestamp: Option<String>,
}

impl WebhookRequest {
    /// Header carrying the request signature.
    pub const SIGNATURE_HEADER: &'static str = "x-signature";

    pub fn signature(&self) -> Option<&str> {
        self.headers.get(Self::SIGNATURE_HEADER).map(String::as_str)
    }
}
