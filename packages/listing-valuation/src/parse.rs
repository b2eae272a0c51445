//! Locating listing links and text fragments in marketplace HTML.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{CrawlError, CrawlResult};
use crate::types::{config::CrawlConfig, Page};

/// Compiled selectors for the index and listing pages.
///
/// Parsing is synchronous and returns owned values so that no `Html`
/// document is ever held across an await point.
#[derive(Debug, Clone)]
pub struct PageParser {
    link: Selector,
    price: Selector,
    plate: Selector,
}

impl PageParser {
    pub fn new(config: &CrawlConfig) -> CrawlResult<Self> {
        Ok(Self {
            link: compile(&config.link_selector)?,
            price: compile(&config.price_selector)?,
            plate: compile(&config.plate_selector)?,
        })
    }

    /// Absolute URLs of every listing link on an index page, in page order.
    pub fn listing_links(&self, page: &Page) -> Vec<Url> {
        let document = Html::parse_document(&page.html);

        document
            .select(&self.link)
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| !href.starts_with('#') && !href.starts_with("javascript:"))
            .filter_map(|href| page.url.join(href).ok())
            .collect()
    }

    /// Price and plate fragments of a listing page, parsed in one pass.
    pub fn listing_fragments(&self, html: &str) -> ListingFragments {
        let document = Html::parse_document(html);
        ListingFragments {
            price_text: first_text(&document, &self.price),
            plate_text: first_text(&document, &self.plate),
        }
    }
}

/// Raw text located on a listing page, before any extraction heuristics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFragments {
    pub price_text: Option<String>,
    pub plate_text: Option<String>,
}

fn compile(selector: &str) -> CrawlResult<Selector> {
    Selector::parse(selector).map_err(|_| CrawlError::InvalidSelector {
        selector: selector.to_string(),
    })
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").trim().to_string()
}
