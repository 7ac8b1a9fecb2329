//! The article document model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single harvested article
///
/// `id` is the site's sequential article number and the authoritative
/// dedup key in the store. Articles are created by the fetcher, handed to
/// the store by value, and never mutated after persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// The site's sequential article number
    pub id: u64,

    /// When this article was collected
    pub collected_at: DateTime<Utc>,

    /// The URL the article was fetched from
    pub source_url: String,

    /// Article headline (may be empty if the site omitted it)
    pub title: String,

    /// Publication date as printed on the page, verbatim
    pub published_date: String,

    /// Body paragraphs in page order
    pub body: Vec<String>,
}
