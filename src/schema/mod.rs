//! Record shapes used to validate field paths.
//!
//! A path is walked one segment at a time from a collection: `relation`
//! fields continue in their target collection, `object` fields in their
//! nested fields, and `json` fields accept whatever segments remain. Every
//! other field type must be the last segment.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SchemaError};
use crate::filter::FieldPath;

/// Default maximum number of segments in a field path.
pub const DEFAULT_MAX_DEPTH: usize = 6;

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Schema {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default)]
    pub collections: HashMap<String, Collection>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Collection {
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Target collection of a `relation` field.
    #[serde(default)]
    pub collection: Option<String>,
    /// Nested fields of an `object` field.
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Bool,
    Date,
    Select,
    File,
    Json,
    Relation,
    Object,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        FieldDef {
            name: name.into(),
            kind,
            collection: None,
            fields: Vec::new(),
        }
    }

    pub fn relation(name: impl Into<String>, collection: impl Into<String>) -> Self {
        FieldDef {
            collection: Some(collection.into()),
            ..FieldDef::new(name, FieldKind::Relation)
        }
    }

    pub fn object(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        FieldDef {
            fields,
            ..FieldDef::new(name, FieldKind::Object)
        }
    }
}

impl Default for Schema {
    fn default() -> Self {
        Schema {
            max_depth: DEFAULT_MAX_DEPTH,
            collections: HashMap::new(),
        }
    }
}

impl Schema {
    pub fn new(max_depth: usize) -> Self {
        Schema {
            max_depth,
            ..Schema::default()
        }
    }

    /// Load a schema from a YAML or JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let schema: Schema = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(|source| ConfigError::Load {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::debug!(
            "Schema: loaded {} collections from {:?}",
            schema.collections.len(),
            path
        );
        Ok(schema)
    }

    pub fn with_collection(mut self, name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        self.collections.insert(name.into(), Collection { fields });
        self
    }

    pub fn collection(&self, name: &str) -> Result<&Collection, SchemaError> {
        self.collections
            .get(name)
            .ok_or_else(|| SchemaError::UnknownCollection(name.to_string()))
    }

    /// Validate `path` against `collection` and return it as a [`FieldPath`].
    pub fn path(&self, collection: &str, path: &str) -> Result<FieldPath, SchemaError> {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(SchemaError::EmptySegment(path.to_string()));
        }
        if segments.len() > self.max_depth {
            return Err(SchemaError::TooDeep {
                path: path.to_string(),
                depth: segments.len(),
                max: self.max_depth,
            });
        }

        let mut fields: &[FieldDef] = &self.collection(collection)?.fields;
        for (index, segment) in segments.iter().enumerate() {
            let field = fields
                .iter()
                .find(|field| field.name == *segment)
                .ok_or_else(|| SchemaError::UnknownField {
                    path: path.to_string(),
                    segment: segment.to_string(),
                })?;

            if index + 1 == segments.len() {
                break;
            }

            match field.kind {
                FieldKind::Json => break,
                FieldKind::Object => fields = &field.fields,
                FieldKind::Relation => {
                    let target = field
                        .collection
                        .as_deref()
                        .ok_or_else(|| SchemaError::MissingRelationTarget(field.name.clone()))?;
                    fields = &self.collection(target)?.fields;
                }
                _ => {
                    return Err(SchemaError::NotTraversable {
                        path: path.to_string(),
                        segment: segment.to_string(),
                    });
                }
            }
        }

        Ok(FieldPath::from(path))
    }
}
