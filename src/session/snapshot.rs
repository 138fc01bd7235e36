// src/session/snapshot.rs
use scraper::{ElementRef, Html, Selector};

use crate::error::ScrapeError;
use crate::utils::clean_text;

/// Parsed copy of a rendered page.
pub struct PageSnapshot {
    document: Html,
}

impl PageSnapshot {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    /// First element matching `selector`, or `None` when absent.
    pub fn try_find(&self, selector: &str) -> Result<Option<ElementRef<'_>>, ScrapeError> {
        let selector = parse_selector(selector)?;
        Ok(self.document.select(&selector).next())
    }

    /// Like [`try_find`](Self::try_find) but absence is an error.
    pub fn find(&self, selector: &str) -> Result<ElementRef<'_>, ScrapeError> {
        self.try_find(selector)?
            .ok_or_else(|| ScrapeError::element_not_found(selector))
    }

    pub fn find_all(&self, selector: &str) -> Result<Vec<ElementRef<'_>>, ScrapeError> {
        let selector = parse_selector(selector)?;
        Ok(self.document.select(&selector).collect())
    }

    /// Text of the first match if it contains `needle`.
    pub fn text_containing(&self, selector: &str, needle: &str) -> Result<Option<String>, ScrapeError> {
        Ok(self
            .try_find(selector)?
            .map(element_text)
            .filter(|text| text.contains(needle)))
    }
}

/// Elements matching `selector` below `scope`.
pub fn find_within<'a>(scope: ElementRef<'a>, selector: &str) -> Result<Vec<ElementRef<'a>>, ScrapeError> {
    let selector = parse_selector(selector)?;
    Ok(scope.select(&selector).collect())
}

fn parse_selector(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|_| ScrapeError::InvalidSelector(selector.to_string()))
}

/// Whitespace-normalised text content.
pub fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

/// Non-empty trimmed text lines, the way a rendered block breaks them.
pub fn element_lines(element: ElementRef<'_>) -> Vec<String> {
    element
        .text()
        .flat_map(str::lines)
        .map(clean_text)
        .filter(|line| !line.is_empty())
        .collect()
}
