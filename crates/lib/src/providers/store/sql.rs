//! # Law Chunk Store SQL
//!
//! SQL statements for the `law_chunks` table. Embeddings are stored as little-endian
//! `f32` BLOBs, the layout expected by `vector_distance_cos`.

pub const CREATE_LAW_CHUNKS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS law_chunks (
        id TEXT PRIMARY KEY,
        seq INTEGER NOT NULL,
        content TEXT NOT NULL,
        law TEXT NOT NULL DEFAULT '',
        chapter TEXT NOT NULL DEFAULT '',
        article TEXT NOT NULL DEFAULT '',
        paragraph TEXT NOT NULL DEFAULT '',
        source TEXT NOT NULL DEFAULT '',
        embedding BLOB
    );
";

pub const UPSERT_LAW_CHUNK: &str = "
    INSERT INTO law_chunks (id, seq, content, law, chapter, article, paragraph, source, embedding)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(id) DO UPDATE SET
        content = excluded.content,
        law = excluded.law,
        chapter = excluded.chapter,
        article = excluded.article,
        paragraph = excluded.paragraph,
        source = excluded.source,
        embedding = excluded.embedding
";

pub const NEXT_SEQ: &str = "SELECT COALESCE(MAX(seq), -1) + 1 FROM law_chunks";

pub const DELETE_ALL_CHUNKS: &str = "DELETE FROM law_chunks";

pub const SELECT_ALL_CHUNKS: &str = "
    SELECT id, content, law, chapter, article, paragraph, source
    FROM law_chunks
    ORDER BY seq ASC
";

/// Returns the nearest-neighbour query for a literal `vector32(...)` expression.
pub fn similarity_search(vector_literal: &str, limit: usize) -> String {
    format!(
        "SELECT content, law, chapter, article, paragraph, source,
                vector_distance_cos(embedding, {vector_literal}) AS distance
         FROM law_chunks
         WHERE embedding IS NOT NULL
         ORDER BY distance ASC
         LIMIT {limit};"
    )
}
