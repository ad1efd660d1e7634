use std::cmp::Ordering;
use std::fmt;

use serde::Deserialize;

/// Response envelope returned by the search endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ResultPage {
    #[serde(rename = "resultCount", default)]
    pub result_count: u32,
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

/// A single catalog item decoded from a search response.
///
/// The wire format carries track-level and collection-level variants of most
/// fields, and which one is present depends on the item kind. The resolved
/// values are exposed only through accessors ([`name`](Self::name),
/// [`store_url`](Self::store_url), ...) computed from the raw fields at read
/// time, so the two can never disagree.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SearchResult {
    pub kind: Option<String>,
    #[serde(rename = "artistName")]
    artist_name: Option<String>,
    #[serde(rename = "trackName")]
    track_name: Option<String>,
    #[serde(rename = "trackViewUrl")]
    track_view_url: Option<String>,
    #[serde(rename = "collectionName")]
    collection_name: Option<String>,
    #[serde(rename = "collectionViewUrl")]
    collection_view_url: Option<String>,
    #[serde(rename = "trackPrice")]
    track_price: Option<f64>,
    #[serde(rename = "collectionPrice")]
    collection_price: Option<f64>,
    #[serde(default)]
    pub currency: String,
    #[serde(rename = "artworkUrl60", default)]
    pub image_small: String,
    #[serde(rename = "artworkUrl100", default)]
    pub image_large: String,
    #[serde(rename = "primaryGenreName")]
    item_genre: Option<String>,
    #[serde(rename = "genres")]
    genre_list: Option<Vec<String>>,
}

impl SearchResult {
    /// Track name, falling back to the collection name.
    pub fn name(&self) -> &str {
        self.track_name
            .as_deref()
            .or(self.collection_name.as_deref())
            .unwrap_or("")
    }

    pub fn artist(&self) -> &str {
        self.artist_name.as_deref().unwrap_or("")
    }

    /// Store page URL, track-level over collection-level.
    pub fn store_url(&self) -> &str {
        self.track_view_url
            .as_deref()
            .or(self.collection_view_url.as_deref())
            .unwrap_or("")
    }

    /// Track price, falling back to the collection price, then 0 (free).
    pub fn price(&self) -> f64 {
        self.track_price.or(self.collection_price).unwrap_or(0.0)
    }

    /// Primary genre, or the joined genre list for items (e-books) that only
    /// carry one.
    pub fn genre(&self) -> String {
        if let Some(ref genre) = self.item_genre {
            genre.clone()
        } else if let Some(ref genres) = self.genre_list {
            genres.join(", ")
        } else {
            String::new()
        }
    }

    /// Human-readable label for the item kind. Items without a `kind` tag
    /// (audiobooks omit it) are labeled as audio books; unrecognized tags
    /// pass through as-is.
    pub fn kind_display(&self) -> &str {
        match self.kind.as_deref() {
            Some("album") => "Album",
            Some("audiobook") | None => "Audio Book",
            Some("book") => "Book",
            Some("ebook") => "E-Book",
            Some("feature-movie") => "Movie",
            Some("music-video") => "Music Video",
            Some("podcast") => "Podcast",
            Some("software") => "App",
            Some("song") => "Song",
            Some("tv-episode") => "TV Episode",
            Some(other) => other,
        }
    }

    /// Price formatted for display: "Free" for zero, otherwise the amount
    /// with a currency symbol (or the ISO code for currencies without one).
    pub fn display_price(&self) -> String {
        let price = self.price();
        if price == 0.0 {
            return "Free".to_string();
        }
        match self.currency.as_str() {
            "USD" => format!("${:.2}", price),
            "EUR" => format!("\u{20ac}{:.2}", price),
            "GBP" => format!("\u{a3}{:.2}", price),
            code => format!("{:.2} {}", price, code),
        }
    }

    /// Case-insensitive ordering by resolved name, for presentation sorting.
    pub fn cmp_by_name(&self, other: &Self) -> Ordering {
        self.name()
            .to_lowercase()
            .cmp(&other.name().to_lowercase())
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} by {}",
            self.kind_display(),
            self.name(),
            self.artist()
        )
    }
}
