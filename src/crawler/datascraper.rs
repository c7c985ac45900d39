use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use tracing::debug;
use url::Url;
use whatlang::detect;

use crate::config::HttpConfig;
use crate::error::{Error, Result};

static LINK_SELECTOR: OnceLock<Selector> = OnceLock::new();
static PARAGRAPH_SELECTOR: OnceLock<Selector> = OnceLock::new();

/// Elements whose text never reaches the screen.
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Visible text of one fetched page and the language it appears to be written in.
#[derive(Debug, Clone)]
pub struct PageText {
    pub text: String,
    pub language: String,
}

/// Fetches pages over HTTP and turns them into plain text.
#[derive(Clone)]
pub struct Scraper {
    client: Client,
}

impl Scraper {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(|source| Error::Http {
                url: String::new(),
                source,
            })?;

        Ok(Self { client })
    }

    /// GETs `url` and returns its body. The status code is not inspected.
    pub async fn fetch_html(&self, url: &str) -> Result<String> {
        let http_error = |source| Error::Http {
            url: url.to_string(),
            source,
        };
        let response = self.client.get(url).send().await.map_err(http_error)?;
        let status = response.status();
        let body = response.text().await.map_err(http_error)?;
        debug!(target: "scrape", %url, %status, bytes = body.len(), "fetched page");
        Ok(body)
    }

    /// Fetches `url` and returns its visible text with whitespace collapsed.
    pub async fn extract(&self, url: &str) -> Result<PageText> {
        let body = self.fetch_html(url).await?;
        let document = Html::parse_document(&body);
        let text = visible_text(&document);
        let language = detect_language(&text);
        debug!(target: "scrape", %url, words = text.split_whitespace().count(), %language, "extracted text");

        Ok(PageText { text, language })
    }

    pub async fn extract_text(&self, url: &str) -> Result<String> {
        Ok(self.extract(url).await?.text)
    }

    /// Text of the first `limit` `<p>` elements, joined by single spaces.
    pub async fn extract_paragraphs(&self, url: &str, limit: usize) -> Result<String> {
        let body = self.fetch_html(url).await?;
        let document = Html::parse_document(&body);
        Ok(paragraph_text(&document, limit))
    }
}

/// ISO 639-3 code of the language `text` is written in, `unknown` when undetectable.
pub fn detect_language(text: &str) -> String {
    match detect(text) {
        Some(info) => info.lang().code().to_string(),
        None => "unknown".to_string(),
    }
}

/// All text nodes outside of hidden elements, trimmed and joined by single spaces.
pub fn visible_text(document: &Html) -> String {
    let pieces = document.root_element().descendants().filter_map(|node| {
        let text = node.value().as_text()?;
        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element().map(|e| e.name()))
            .is_some_and(|name| HIDDEN_ELEMENTS.contains(&name));
        (!hidden).then_some(&**text)
    });
    clean_text(pieces)
}

pub fn paragraph_text(document: &Html, limit: usize) -> String {
    let selector = PARAGRAPH_SELECTOR.get_or_init(|| Selector::parse("p").unwrap());
    let paragraphs = document
        .select(selector)
        .take(limit)
        .map(|p| clean_text(p.text()))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>();
    paragraphs.join(" ")
}

/// Every `a[href]` resolved against `base_url`, fragments removed, in document order.
pub fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let selector = LINK_SELECTOR.get_or_init(|| Selector::parse("a[href]").unwrap());
    let mut links = Vec::with_capacity(32);
    for element in document.select(selector) {
        if let Some(href) = element.value().attr("href") {
            if let Ok(mut url) = base_url.join(href.trim()) {
                url.set_fragment(None);
                links.push(url);
            }
        }
    }
    links
}

fn clean_text<'a>(text_iter: impl Iterator<Item = &'a str>) -> String {
    let mut buffer = String::with_capacity(1024);
    for word in text_iter.flat_map(str::split_whitespace) {
        if !buffer.is_empty() {
            buffer.push(' ');
        }
        buffer.push_str(word);
    }
    buffer
}
