//! Conversions between index specs and MongoDB index models.

use mongodb::bson::{doc, to_document, Bson, Document};
use mongodb::options::IndexOptions as MongoIndexOptions;
use mongodb::IndexModel;

use crate::types::{ExistingIndex, IndexSpec, KeyType, SortDirection};

/// Build the key document of a spec, e.g. `{ "timestamp": -1 }`.
///
/// Key order is preserved; it is significant for compound indexes.
pub fn keys_document(spec: &IndexSpec) -> Document {
    let mut keys = Document::new();
    for (field, direction) in &spec.keys {
        keys.insert(field.as_str(), direction.as_i32());
    }
    keys
}

/// Build the `createIndexes` model for a spec.
///
/// The name is always set explicitly so the created index carries exactly
/// the name the planner compared against.
pub fn index_model_from_spec(spec: &IndexSpec) -> IndexModel {
    let mut options = MongoIndexOptions::default();
    options.name = Some(spec.name());
    if spec.options.unique {
        options.unique = Some(true);
    }
    if spec.options.sparse {
        options.sparse = Some(true);
    }
    options.expire_after = spec.options.expire_after;

    IndexModel::builder()
        .keys(keys_document(spec))
        .options(options)
        .build()
}

fn key_type(value: &Bson) -> KeyType {
    let number = match value {
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        Bson::String(kind) => return KeyType::Special(kind.clone()),
        _ => None,
    };
    match number.and_then(SortDirection::from_number) {
        Some(direction) => KeyType::Ordered(direction),
        None => KeyType::Special(value.to_string()),
    }
}

/// Convert an index model returned by `listIndexes` into the catalog view.
pub fn existing_index_from_model(model: &IndexModel) -> ExistingIndex {
    let keys: Vec<(String, KeyType)> = model
        .keys
        .iter()
        .map(|(field, value)| (field.clone(), key_type(value)))
        .collect();
    let options = model.options.as_ref();

    let name = options.and_then(|o| o.name.clone()).unwrap_or_else(|| {
        keys.iter()
            .map(|(field, key_type)| match key_type {
                KeyType::Ordered(direction) => format!("{}_{}", field, direction),
                KeyType::Special(kind) => format!("{}_{}", field, kind),
            })
            .collect::<Vec<_>>()
            .join("_")
    });

    ExistingIndex {
        name,
        keys,
        unique: options.and_then(|o| o.unique).unwrap_or(false),
        sparse: options.and_then(|o| o.sparse).unwrap_or(false),
        expire_after: options.and_then(|o| o.expire_after),
        partial_filter_expression: options.and_then(|o| o.partial_filter_expression.clone()),
        collation: options.and_then(|o| o.collation.as_ref()).map(|collation| {
            to_document(collation).unwrap_or_else(|_| doc! { "locale": collation.locale.clone() })
        }),
        hidden: options.and_then(|o| o.hidden).unwrap_or(false),
    }
}
