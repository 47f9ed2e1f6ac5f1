//! Basic example: ingesting a directory.
//!
//! Run with:
//! ```bash
//! cargo run --example basic_ingest -- /path/to/directory
//! ```

use ragkit::{init_logging, RagClient, RagConfig};
use ragkit_core::DocumentStatus;
use std::env;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> ragkit_core::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <directory>", args[0]);
        eprintln!("\nExample:");
        eprintln!("  {} ./docs", args[0]);
        std::process::exit(1);
    }

    let source = PathBuf::from(&args[1]);

    let config = RagConfig::from_env();
    init_logging(&config.logging);

    let client = RagClient::in_memory(config)?;

    let results = client.add_directory(&source, true).await?;
    for result in &results {
        match (result.success, &result.error) {
            (true, _) => println!("queued  {}", result.path.display()),
            (false, Some(error)) => println!("failed  {}: {error}", result.path.display()),
            (false, None) => println!("failed  {}", result.path.display()),
        }
    }

    // Drive every queued document to completion before reporting.
    for result in results.iter().filter(|r| r.success) {
        if let Some(id) = result.document_id {
            if let Err(e) = client.process_document(id).await {
                eprintln!("pipeline failed for {}: {e}", result.path.display());
            }
        }
    }

    let stats = client.stats().await?;
    println!(
        "\n{} documents ({} processed, {} errored), {} embeddings",
        stats.total_documents, stats.processed_documents, stats.error_documents,
        stats.total_embeddings
    );

    let pending = client
        .list_documents(&ragkit_core::ListOptions {
            status: Some(DocumentStatus::Error),
            ..Default::default()
        })
        .await?;
    for document in pending {
        println!("errored: {} ({})", document.title, document.location);
    }

    Ok(())
}
