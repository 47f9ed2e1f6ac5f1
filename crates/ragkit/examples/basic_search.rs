//! Basic example: ingest a few notes, then run semantic and hybrid
//! queries against them.
//!
//! Run with:
//! ```bash
//! cargo run --example basic_search
//! ```
//!
//! Without provider credentials the deterministic fallback embedder is
//! used, so results are only meaningful for near-duplicate text; set
//! `OPENAI_API_KEY` (or another provider) for real semantic search.

use ragkit::{init_logging, RagClient, RagConfig};
use ragkit_core::SearchOptions;

const NOTES: &[(&str, &str)] = &[
    (
        "rust-ownership",
        "Ownership in Rust moves values between bindings. The borrow checker \
         enforces aliasing rules at compile time, so data races are caught \
         before the program ever runs.",
    ),
    (
        "tokio-tasks",
        "Tokio tasks are lightweight cooperative futures. Spawning is cheap, \
         and channels move data between tasks without locks.",
    ),
    (
        "postgres-indexes",
        "Postgres B-tree indexes speed up equality and range scans. Partial \
         indexes keep the tree small when queries always filter on a flag.",
    ),
];

#[tokio::main]
async fn main() -> ragkit_core::Result<()> {
    let config = RagConfig::from_env();
    init_logging(&config.logging);

    let client = RagClient::in_memory(config)?;

    for (title, body) in NOTES {
        let id = client.add_text(body, title).await?;
        client.process_document(id).await?;
    }

    let options = SearchOptions {
        limit: 3,
        similarity_threshold: Some(0.3),
        ..SearchOptions::default()
    };

    let query = "how does the borrow checker prevent data races";
    println!("semantic: {query:?}");
    let response = client.search(query, &options).await?;
    for hit in &response.results {
        let preview: String = hit.content.chars().take(60).collect();
        println!(
            "  {:.3} [{}] {}",
            hit.combined_score, hit.document_title, preview
        );
    }

    println!("\nhybrid: \"postgres indexes\"");
    let hits = client.hybrid_search("postgres indexes", None, &options).await?;
    for hit in &hits {
        println!(
            "  {:.3} [{}] via {:?}",
            hit.combined_score, hit.document_title, hit.search_types
        );
    }

    let enhanced = client.enhance_prompt(query, 2).await?;
    println!(
        "\nenhanced prompt uses {} context chunk(s)",
        enhanced.context_count
    );

    Ok(())
}
