//! Metadata text extraction from speech pages

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static EXTRATITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("#extratitle-div").expect("valid selector"));

static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").expect("valid selector"));

/// Metadata sentence of a speech page
///
/// Prefers the `#extratitle-div` block; otherwise falls back to the text
/// of the whole page. Whitespace runs are collapsed to single spaces.
pub fn extract_metadata_text(html: &str) -> String {
    let document = Html::parse_document(html);

    if let Some(element) = document.select(&EXTRATITLE).next() {
        return collapse_whitespace(element.text());
    }

    match document.select(&BODY).next() {
        Some(body) => collapse_whitespace(body.text()),
        None => collapse_whitespace(document.root_element().text()),
    }
}

fn collapse_whitespace<'a>(chunks: impl Iterator<Item = &'a str>) -> String {
    chunks
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
