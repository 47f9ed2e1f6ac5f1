//! # ragkit-jobs
//!
//! Background ingestion pipeline for ragkit.
//!
//! Three idempotent stages run per document, strictly ordered:
//!
//! 1. `extract_text` — parse the attached file into a content record
//! 2. `generate_metadata` — schema-constrained AI metadata, merged under
//!    caller-set values
//! 3. `generate_embeddings` — chunk, embed, persist one embedding per
//!    chunk
//!
//! [`JobRunner`] owns a worker pool over an mpsc queue of
//! `{document_id, stage}` messages. Jobs for the same document serialize
//! on a keyed mutex; documents process independently of each other. Any
//! stage failure moves the document to `error` and suppresses later
//! stages. Missing documents are a successful no-op at every stage.

pub mod runner;
pub mod stages;

pub use runner::{JobContext, JobRequest, JobRunner, JobStage};
