//! # ragkit-meta
//!
//! Schema-constrained metadata generation for ragkit.
//!
//! Every document type has a metadata schema (required fields, enum
//! constraints, array caps). The generator builds a type-specific prompt
//! with a bounded content preview, validates the provider's JSON against
//! the schema (dropping unknown and invalid fields with warnings), and
//! merges the result under any caller-set metadata. Without a configured
//! provider it synthesizes the required fields deterministically from the
//! gateway fallbacks.

pub mod generator;
pub mod prompt;
pub mod schema;

pub use generator::MetadataGenerator;
pub use schema::{merge_under, schema_for, MetadataSchema, ValidationOutcome, CLASSIFICATIONS};
