//! HTML extraction for the source site's article markup
//!
//! The site serves HTTP 200 for every id; the only reliable "no such
//! article" signal is an empty content region. Extraction is therefore
//! all-or-nothing: no paragraphs means no article.

use scraper::{Html, Selector};

/// Selector for the article headline
const TITLE_SELECTOR: &str = ".container article .lh-base.fs-1";

/// Selector for the printed publication date
const DATE_SELECTOR: &str =
    ".container header .row.d-flex.justify-content-center.py-3 p.text-center";

/// Selector for the body paragraphs
const BODY_SELECTOR: &str =
    ".container article .row.gx-5.mt-5 .col-sm-8 .col-sm-10.offset-sm-1.fs-5.lh-base.mt-4.mb-5 p";

/// Fields extracted from one article page
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedArticle {
    /// Headline text (empty string if the markup omitted it)
    pub title: String,

    /// Publication date as printed, verbatim
    pub published_date: String,

    /// Body paragraphs in page order
    pub paragraphs: Vec<String>,
}

/// Extracts an article from the site's HTML
///
/// # Arguments
///
/// * `html` - The full page HTML
///
/// # Returns
///
/// * `Some(ExtractedArticle)` - The page contained at least one body paragraph
/// * `None` - The content region was empty (the site's "no such article" page)
pub fn extract_article(html: &str) -> Option<ExtractedArticle> {
    let document = Html::parse_document(html);

    let paragraphs = select_all_text(&document, BODY_SELECTOR);
    if paragraphs.is_empty() {
        return None;
    }

    let title = select_first_text(&document, TITLE_SELECTOR).unwrap_or_default();
    let published_date = select_first_text(&document, DATE_SELECTOR).unwrap_or_default();

    Some(ExtractedArticle {
        title,
        published_date,
        paragraphs,
    })
}

/// Collects the trimmed text of every element matching the selector
fn select_all_text(document: &Html, selector: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect()
}

/// Returns the trimmed text of the first element matching the selector
fn select_first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article_page(title: &str, date: &str, paragraphs: &[&str]) -> String {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<p>{}</p>", p))
            .collect();
        format!(
            r#"<html><body><div class="container">
            <header>
              <div class="row d-flex justify-content-center py-3">
                <p class="text-center">{date}</p>
              </div>
            </header>
            <article>
              <h1 class="lh-base fs-1">{title}</h1>
              <div class="row gx-5 mt-5">
                <div class="col-sm-8">
                  <div class="col-sm-10 offset-sm-1 fs-5 lh-base mt-4 mb-5">{body}</div>
                </div>
              </div>
            </article>
            </div></body></html>"#
        )
    }

    #[test]
    fn test_extract_full_article() {
        let html = article_page("Headline", "10 January 2024", &["One.", "Two."]);
        let extracted = extract_article(&html).unwrap();

        assert_eq!(extracted.title, "Headline");
        assert_eq!(extracted.published_date, "10 January 2024");
        assert_eq!(extracted.paragraphs, vec!["One.", "Two."]);
    }

    #[test]
    fn test_paragraph_order_preserved() {
        let html = article_page("T", "D", &["first", "second", "third", "fourth"]);
        let extracted = extract_article(&html).unwrap();
        assert_eq!(
            extracted.paragraphs,
            vec!["first", "second", "third", "fourth"]
        );
    }

    #[test]
    fn test_empty_content_region_is_none() {
        let html = article_page("Headline", "10 January 2024", &[]);
        assert_eq!(extract_article(&html), None);
    }

    #[test]
    fn test_unrelated_page_is_none() {
        let html = "<html><body><div class='container'><p>nothing here</p></div></body></html>";
        assert_eq!(extract_article(html), None);
    }

    #[test]
    fn test_missing_title_and_date_still_found() {
        // Body paragraphs alone make an article; header fields are best-effort
        let html = r#"<html><body><div class="container"><article>
            <div class="row gx-5 mt-5"><div class="col-sm-8">
              <div class="col-sm-10 offset-sm-1 fs-5 lh-base mt-4 mb-5"><p>lonely paragraph</p></div>
            </div></div>
            </article></div></body></html>"#;

        let extracted = extract_article(html).unwrap();
        assert_eq!(extracted.title, "");
        assert_eq!(extracted.published_date, "");
        assert_eq!(extracted.paragraphs, vec!["lonely paragraph"]);
    }

    #[test]
    fn test_whitespace_only_paragraphs_ignored() {
        let html = article_page("T", "D", &["   ", "\n\t"]);
        assert_eq!(extract_article(&html), None);
    }
}
