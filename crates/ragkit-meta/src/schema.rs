//! Metadata schemas per document type.
//!
//! Each schema enumerates its fields, the required subset, enum-constrained
//! values, and array size limits. Validation drops unknown and invalid
//! fields and reports missing required fields without discarding the rest.

use ragkit_core::{DocumentType, Metadata};
use serde_json::Value;

/// Allowed `classification` values, shared by every schema.
pub const CLASSIFICATIONS: &[&str] = &[
    "article",
    "documentation",
    "report",
    "correspondence",
    "code",
    "reference",
    "other",
];

const SCENE_TYPES: &[&str] = &[
    "indoor",
    "outdoor",
    "portrait",
    "landscape",
    "diagram",
    "screenshot",
    "other",
];

const AUDIO_CONTENT_TYPES: &[&str] = &[
    "speech",
    "music",
    "podcast",
    "interview",
    "ambient",
    "other",
];

const PDF_DOCUMENT_TYPES: &[&str] = &[
    "report",
    "manual",
    "paper",
    "form",
    "presentation",
    "book",
    "other",
];

const MODALITIES: &[&str] = &["text", "image", "audio"];

/// Value kind of a schema field.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Free-form string
    Text,
    /// Array of strings, optionally capped
    TextArray { max_items: usize },
    /// String restricted to an allowed set
    Enum(&'static [&'static str]),
    /// Array of strings restricted to an allowed set
    EnumArray {
        allowed: &'static [&'static str],
        max_items: usize,
    },
}

/// One field in a metadata schema.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

/// Schema for one document type.
#[derive(Debug, Clone, Copy)]
pub struct MetadataSchema {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

const TEXT_SCHEMA: MetadataSchema = MetadataSchema {
    name: "TEXT",
    fields: &[
        FieldSpec { name: "summary", kind: FieldKind::Text, required: true },
        FieldSpec { name: "keywords", kind: FieldKind::TextArray { max_items: 10 }, required: true },
        FieldSpec { name: "classification", kind: FieldKind::Enum(CLASSIFICATIONS), required: true },
        FieldSpec { name: "topics", kind: FieldKind::TextArray { max_items: 5 }, required: false },
        FieldSpec { name: "language", kind: FieldKind::Text, required: false },
        FieldSpec { name: "tags", kind: FieldKind::TextArray { max_items: 10 }, required: false },
    ],
};

const IMAGE_SCHEMA: MetadataSchema = MetadataSchema {
    name: "IMAGE",
    fields: &[
        FieldSpec { name: "description", kind: FieldKind::Text, required: true },
        FieldSpec { name: "summary", kind: FieldKind::Text, required: true },
        FieldSpec { name: "scene_type", kind: FieldKind::Enum(SCENE_TYPES), required: true },
        FieldSpec { name: "classification", kind: FieldKind::Enum(CLASSIFICATIONS), required: true },
        FieldSpec { name: "objects", kind: FieldKind::TextArray { max_items: 10 }, required: false },
        FieldSpec { name: "tags", kind: FieldKind::TextArray { max_items: 10 }, required: false },
    ],
};

const AUDIO_SCHEMA: MetadataSchema = MetadataSchema {
    name: "AUDIO",
    fields: &[
        FieldSpec { name: "summary", kind: FieldKind::Text, required: true },
        FieldSpec { name: "content_type", kind: FieldKind::Enum(AUDIO_CONTENT_TYPES), required: true },
        FieldSpec { name: "classification", kind: FieldKind::Enum(CLASSIFICATIONS), required: true },
        FieldSpec { name: "topics", kind: FieldKind::TextArray { max_items: 5 }, required: false },
        FieldSpec { name: "tags", kind: FieldKind::TextArray { max_items: 10 }, required: false },
    ],
};

const PDF_SCHEMA: MetadataSchema = MetadataSchema {
    name: "PDF",
    fields: &[
        FieldSpec { name: "summary", kind: FieldKind::Text, required: true },
        FieldSpec { name: "document_type", kind: FieldKind::Enum(PDF_DOCUMENT_TYPES), required: true },
        FieldSpec { name: "classification", kind: FieldKind::Enum(CLASSIFICATIONS), required: true },
        FieldSpec { name: "keywords", kind: FieldKind::TextArray { max_items: 10 }, required: false },
        FieldSpec { name: "tags", kind: FieldKind::TextArray { max_items: 10 }, required: false },
    ],
};

const MIXED_SCHEMA: MetadataSchema = MetadataSchema {
    name: "MIXED",
    fields: &[
        FieldSpec { name: "summary", kind: FieldKind::Text, required: true },
        FieldSpec {
            name: "content_types",
            kind: FieldKind::EnumArray { allowed: MODALITIES, max_items: 3 },
            required: true,
        },
        FieldSpec { name: "primary_content_type", kind: FieldKind::Enum(MODALITIES), required: true },
        FieldSpec { name: "classification", kind: FieldKind::Enum(CLASSIFICATIONS), required: true },
        FieldSpec { name: "keywords", kind: FieldKind::TextArray { max_items: 10 }, required: false },
        FieldSpec { name: "tags", kind: FieldKind::TextArray { max_items: 10 }, required: false },
    ],
};

/// Select the schema for a document type.
///
/// Text-like formats (docx, html, markdown, plain text) share the TEXT
/// schema; PDFs, images, audio, and mixed documents have their own.
pub fn schema_for(document_type: DocumentType) -> &'static MetadataSchema {
    match document_type {
        DocumentType::Image => &IMAGE_SCHEMA,
        DocumentType::Audio => &AUDIO_SCHEMA,
        DocumentType::Pdf => &PDF_SCHEMA,
        DocumentType::Mixed => &MIXED_SCHEMA,
        _ => &TEXT_SCHEMA,
    }
}

impl MetadataSchema {
    /// Names of the required fields.
    pub fn required_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().filter(|f| f.required).map(|f| f.name)
    }

    /// Whether `metadata` already carries every required field.
    pub fn required_present(&self, metadata: &Metadata) -> bool {
        self.required_fields().all(|name| {
            metadata
                .get(name)
                .is_some_and(|v| !matches!(v, Value::Null))
        })
    }

    /// Validate generated metadata against this schema.
    ///
    /// Unknown fields and enum/type violations are dropped; missing
    /// required fields are reported. Valid fields always survive.
    pub fn validate(&self, input: &Metadata) -> ValidationOutcome {
        let mut valid = Metadata::new();
        let mut dropped = Vec::new();

        for (key, value) in input {
            let Some(field) = self.fields.iter().find(|f| f.name == key) else {
                dropped.push(format!("unknown field `{key}`"));
                continue;
            };

            match coerce(field, value) {
                Some(coerced) => {
                    valid.insert(key.clone(), coerced);
                }
                None => dropped.push(format!("invalid value for `{key}`")),
            }
        }

        let missing_required: Vec<&'static str> = self
            .required_fields()
            .filter(|name| !valid.contains_key(*name))
            .collect();

        ValidationOutcome {
            metadata: valid,
            dropped,
            missing_required,
        }
    }
}

/// Result of validating generated metadata.
#[derive(Debug)]
pub struct ValidationOutcome {
    /// Fields that passed validation
    pub metadata: Metadata,
    /// Reasons for each dropped field
    pub dropped: Vec<String>,
    /// Required fields absent from the valid set
    pub missing_required: Vec<&'static str>,
}

/// Coerce a value to a field's kind, or reject it.
fn coerce(field: &FieldSpec, value: &Value) -> Option<Value> {
    match field.kind {
        FieldKind::Text => value.as_str().map(|s| Value::from(s.trim())),
        FieldKind::TextArray { max_items } => {
            let items: Vec<Value> = value
                .as_array()?
                .iter()
                .filter_map(Value::as_str)
                .map(|s| Value::from(s.trim()))
                .take(max_items)
                .collect();
            Some(Value::from(items))
        }
        FieldKind::Enum(allowed) => {
            let lowered = value.as_str()?.trim().to_lowercase();
            allowed
                .contains(&lowered.as_str())
                .then(|| Value::from(lowered))
        }
        FieldKind::EnumArray { allowed, max_items } => {
            let items: Vec<Value> = value
                .as_array()?
                .iter()
                .filter_map(Value::as_str)
                .map(|s| s.trim().to_lowercase())
                .filter(|s| allowed.contains(&s.as_str()))
                .map(Value::from)
                .take(max_items)
                .collect();
            if items.is_empty() {
                None
            } else {
                Some(Value::from(items))
            }
        }
    }
}

/// Merge generated metadata under existing metadata: caller-set values win.
pub fn merge_under(existing: &Metadata, generated: Metadata) -> Metadata {
    let mut merged = existing.clone();
    for (key, value) in generated {
        merged.entry(key).or_insert(value);
    }
    merged
}
