use scraper::{Html, Selector};

use crate::model::DocumentLocator;

/// Collect the visible labels of links that name a PDF.
///
/// Order follows the page; duplicates are kept. An empty result means the
/// building has no certificates on file, not that the page failed.
pub fn extract_locators(page: &str) -> Vec<DocumentLocator> {
    let Ok(anchor_sel) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let document = Html::parse_document(page);
    document
        .select(&anchor_sel)
        .filter_map(|anchor| {
            let label = anchor.text().collect::<String>();
            let label = label.trim();
            label.to_ascii_lowercase().contains("pdf").then(|| DocumentLocator::new(label))
        })
        .collect()
}
