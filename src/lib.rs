pub mod result;
pub mod search;

pub use result::{ResultPage, SearchResult};
pub use search::{Category, Search, SearchError, SearchState, DEFAULT_BASE_URL};
