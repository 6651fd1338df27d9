pub mod search;

pub use search::{render_links, SearchClient, SearchResult, SerpApiClient};
