//! Inspection of the knowledge base: a short terminal preview of stored chunks and a
//! full dump to JSON or JSON Lines.

use super::{io, DatasetError};
use crate::{providers::store::VectorStore, types::StoredDocument};
use std::{io::Write, path::Path};
use tracing::info;

/// Characters of chunk text shown per previewed chunk.
pub const PREVIEW_CHARS: usize = 500;

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

/// Prints the metadata and the opening text of the first `limit` documents.
pub fn preview_chunks<W: Write>(
    documents: &[StoredDocument],
    limit: usize,
    out: &mut W,
) -> std::io::Result<()> {
    writeln!(out, "Chunks in store: {}", documents.len())?;
    for (i, doc) in documents.iter().take(limit).enumerate() {
        let meta = &doc.metadata;
        let opening: String = doc.text.chars().take(PREVIEW_CHARS).collect();
        writeln!(out, "--- Chunk {} ---", i + 1)?;
        writeln!(out, "UU: {}", or_dash(&meta.law))?;
        writeln!(out, "BAB: {}", or_dash(&meta.chapter))?;
        writeln!(out, "Pasal: {}", or_dash(&meta.article))?;
        writeln!(out, "Ayat: {}", or_dash(&meta.paragraph))?;
        writeln!(out, "Sumber: {}", or_dash(&meta.source))?;
        writeln!(out, "\n{opening}...")?;
        writeln!(out, "{}", "-".repeat(80))?;
    }
    Ok(())
}

/// Writes every stored chunk to `output` in insertion order.
///
/// Returns the number of chunks written.
pub async fn export_chunks(store: &dyn VectorStore, output: &Path) -> Result<usize, DatasetError> {
    let documents = store.get().await?;
    io::write_records(output, &documents)?;
    info!(
        "Exported {} chunks to '{}'.",
        documents.len(),
        output.display()
    );
    Ok(documents.len())
}
