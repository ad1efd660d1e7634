use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::result::{ResultPage, SearchResult};

pub const DEFAULT_BASE_URL: &str = "https://itunes.apple.com/search";
const RESULT_LIMIT: u32 = 200;
const USER_AGENT: &str = "itunes-search/0.1";

/// Catalog section to search within.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    All,
    Music,
    Software,
    Ebooks,
}

impl Category {
    /// The `entity` query parameter for this category. `All` applies no
    /// entity filter.
    fn entity(self) -> &'static str {
        match self {
            Category::All => "",
            Category::Music => "musicTrack",
            Category::Software => "software",
            Category::Ebooks => "ebook",
        }
    }
}

#[derive(Debug, Error)]
#[error("invalid category index {0}, expected 0-3")]
pub struct InvalidCategory(pub u8);

impl TryFrom<u8> for Category {
    type Error = InvalidCategory;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(Category::All),
            1 => Ok(Category::Music),
            2 => Ok(Category::Software),
            3 => Ok(Category::Ebooks),
            other => Err(InvalidCategory(other)),
        }
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("search endpoint returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("failed to decode search response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Where the service is in the search lifecycle.
///
/// There is no error variant: a failed search reverts to `NotSearched` and
/// failure is reported through the completion flag instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SearchState {
    #[default]
    NotSearched,
    Loading,
    NoResults,
    Results(Vec<SearchResult>),
}

struct Completion {
    generation: u64,
    outcome: Result<Vec<SearchResult>, SearchError>,
}

/// The search service: issues catalog queries, keeps at most one request in
/// flight, and owns the [`SearchState`] consumers render from.
///
/// Starting a new search supersedes the previous one: its task is aborted
/// and any completion it managed to produce is dropped without touching
/// state. State is only ever mutated from the owner's context (in
/// [`search`](Self::search) and when a completion is applied), so no
/// locking is involved.
pub struct Search {
    client: reqwest::Client,
    base_url: String,
    state: SearchState,
    generation: u64,
    in_flight: Option<JoinHandle<()>>,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
}

impl Search {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a service against a non-default endpoint (tests point this at
    /// a local server).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            state: SearchState::NotSearched,
            generation: 0,
            in_flight: None,
            completion_tx,
            completion_rx,
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// Start a search, superseding any search still in flight.
    ///
    /// An empty `text` cancels the previous request and resets state but
    /// issues no request, and no completion is ever delivered for it;
    /// callers waiting on [`next_completion`](Self::next_completion) must
    /// treat that as a third outcome.
    ///
    /// Must be called from within a tokio runtime.
    pub fn search(&mut self, text: &str, category: Category) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
        // Completions still queued from the aborted task carry the old
        // generation and will be skipped unseen.
        self.generation += 1;

        if text.is_empty() {
            self.state = SearchState::NotSearched;
            return;
        }

        self.state = SearchState::Loading;
        let url = build_search_url(&self.base_url, text, category);
        debug!("search request: {}", url);

        let client = self.client.clone();
        let tx = self.completion_tx.clone();
        let generation = self.generation;
        self.in_flight = Some(tokio::spawn(async move {
            let outcome = fetch(&client, &url).await;
            // The service holds the receiver; a failed send means it was
            // dropped and nobody is left to notify.
            let _ = tx.send(Completion {
                generation,
                outcome,
            });
        }));
    }

    /// Wait for the current search to complete and return whether it
    /// succeeded. Completions from superseded searches are discarded along
    /// the way.
    ///
    /// Returns `None` only if the service's channel is closed, which cannot
    /// happen while the service is alive. Note this pends forever if no
    /// search is in flight, so callers pair it with a timeout when the
    /// preceding call may have been an empty-term reset.
    pub async fn next_completion(&mut self) -> Option<bool> {
        loop {
            let completion = self.completion_rx.recv().await?;
            if completion.generation != self.generation {
                continue;
            }
            return Some(self.apply(completion.outcome));
        }
    }

    /// Non-blocking variant of [`next_completion`](Self::next_completion)
    /// for consumers that poll between renders.
    pub fn try_complete(&mut self) -> Option<bool> {
        while let Ok(completion) = self.completion_rx.try_recv() {
            if completion.generation != self.generation {
                continue;
            }
            return Some(self.apply(completion.outcome));
        }
        None
    }

    fn apply(&mut self, outcome: Result<Vec<SearchResult>, SearchError>) -> bool {
        self.in_flight = None;
        match outcome {
            Ok(results) => {
                info!("search returned {} result(s)", results.len());
                self.state = if results.is_empty() {
                    SearchState::NoResults
                } else {
                    SearchState::Results(results)
                };
                true
            }
            Err(e) => {
                warn!("search failed: {}", e);
                self.state = SearchState::NotSearched;
                false
            }
        }
    }
}

impl Default for Search {
    fn default() -> Self {
        Self::new()
    }
}

fn build_search_url(base_url: &str, term: &str, category: Category) -> String {
    format!(
        "{}?term={}&limit={}&entity={}",
        base_url,
        urlencoding::encode(term),
        RESULT_LIMIT,
        category.entity()
    )
}

async fn fetch(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<SearchResult>, SearchError> {
    let response = client
        .get(url)
        .header("User-Agent", USER_AGENT)
        .send()
        .await?;
    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(SearchError::Status(status));
    }
    let body = response.text().await?;
    let page: ResultPage = serde_json::from_str(&body)?;
    debug!(
        "decoded {} of {} advertised result(s)",
        page.results.len(),
        page.result_count
    );
    Ok(page.results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_entity_mapping() {
        assert_eq!(Category::All.entity(), "");
        assert_eq!(Category::Music.entity(), "musicTrack");
        assert_eq!(Category::Software.entity(), "software");
        assert_eq!(Category::Ebooks.entity(), "ebook");
    }

    #[test]
    fn category_from_index() {
        assert_eq!(Category::try_from(0).unwrap(), Category::All);
        assert_eq!(Category::try_from(3).unwrap(), Category::Ebooks);
        assert!(Category::try_from(4).is_err());
    }

    #[test]
    fn url_includes_limit_and_entity() {
        let url = build_search_url(DEFAULT_BASE_URL, "abba", Category::Music);
        assert_eq!(
            url,
            "https://itunes.apple.com/search?term=abba&limit=200&entity=musicTrack"
        );
    }

    #[test]
    fn url_encodes_reserved_characters_round_trip() {
        let term = "fish & chips = dinner";
        let url = build_search_url(DEFAULT_BASE_URL, term, Category::All);
        assert!(!url.contains(' '));

        let parsed = reqwest::Url::parse(&url).unwrap();
        let decoded = parsed
            .query_pairs()
            .find(|(k, _)| k == "term")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        assert_eq!(decoded, term);
    }

    #[test]
    fn initial_state_is_not_searched() {
        let search = Search::new();
        assert_eq!(*search.state(), SearchState::NotSearched);
    }

    #[tokio::test]
    async fn empty_term_resets_without_spawning() {
        let mut search = Search::with_base_url("http://127.0.0.1:1/search");
        search.search("", Category::All);
        assert_eq!(*search.state(), SearchState::NotSearched);
        assert!(search.in_flight.is_none());
        assert!(search.try_complete().is_none());
    }
}
