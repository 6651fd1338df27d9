pub mod retriever;
pub mod sqlite;
pub mod store;

pub use retriever::{Retriever, DEFAULT_TOP_K};
pub use sqlite::SqliteVectorStore;
pub use store::{ChunkSearchResult, StoredChunk, VectorStore};
