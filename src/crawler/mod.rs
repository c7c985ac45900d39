use std::collections::HashSet;
use std::fmt;

use rand::Rng;
use rand::seq::IndexedRandom;
use scraper::Html;
use serde::Serialize;
use tracing::{info, warn};
use url::Url;

pub mod browser;
pub mod datascraper;
pub mod keywords;

use crate::config::CrawlConfig;
use crate::error::{Error, Result};
use browser::PageSource;
use datascraper::extract_links;
use keywords::KeywordSet;

/// Keyword hits for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTally {
    pub category: String,
    pub hits: u64,
}

/// Outcome of one heuristic classification run.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub url: String,
    pub category: String,
    /// Hits per category, in keyword-set order.
    pub tally: Vec<CategoryTally>,
    pub internal_links: usize,
    pub pages_visited: usize,
    pub pages_skipped: usize,
}

impl CrawlReport {
    pub fn total_hits(&self) -> u64 {
        self.tally.iter().map(|t| t.hits).sum()
    }

    /// Each category's share of all hits, in percent. All zero when nothing matched.
    pub fn percentages(&self) -> Vec<(String, f64)> {
        let total = self.total_hits();
        self.tally
            .iter()
            .map(|t| {
                let share = if total == 0 {
                    0.0
                } else {
                    t.hits as f64 * 100.0 / total as f64
                };
                (t.category.clone(), share)
            })
            .collect()
    }
}

impl fmt::Display for CrawlReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.url)?;
        writeln!(
            f,
            "  {} internal links, {} pages visited, {} skipped",
            self.internal_links, self.pages_visited, self.pages_skipped
        )?;
        for ((category, share), tally) in self.percentages().iter().zip(&self.tally) {
            writeln!(f, "  {category:<20} {share:>6.2}% ({} hits)", tally.hits)?;
        }
        write!(f, "Category: {}", self.category)
    }
}

/// What happened to one sampled link.
enum PageOutcome {
    Visited(Vec<u64>),
    Skipped(Error),
}

/// Classifies a site by counting category keywords over its root page and a
/// random sample of its internal links.
pub struct KeywordCrawler<S: PageSource> {
    source: S,
    keywords: KeywordSet,
    config: CrawlConfig,
}

impl<S: PageSource> KeywordCrawler<S> {
    pub fn new(source: S, keywords: KeywordSet, config: CrawlConfig) -> Self {
        Self {
            source,
            keywords,
            config,
        }
    }

    pub fn keywords(&self) -> &KeywordSet {
        &self.keywords
    }

    /// Hands the page source back, e.g. to close a browser session.
    pub fn into_source(self) -> S {
        self.source
    }

    pub fn classify(&mut self, url: &str) -> Result<CrawlReport> {
        self.classify_with_rng(url, &mut rand::rng())
    }

    /// Runs one classification. Failing to load the root page aborts the run,
    /// failures on sampled links are logged and skipped.
    pub fn classify_with_rng<R: Rng + ?Sized>(&mut self, url: &str, rng: &mut R) -> Result<CrawlReport> {
        let root = Url::parse(url).map_err(|source| Error::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let root_html = self.source.load(root.as_str()).map_err(|e| Error::RootPage {
            url: root.to_string(),
            reason: e.to_string(),
        })?;

        let links = internal_links(&root_html, &root);
        let sample_size = sample_size(links.len(), &self.config);
        let sampled: Vec<&Url> = links.choose_multiple(rng, sample_size).collect();
        info!(target: "crawl", url = %root, internal = links.len(), sampled = sampled.len(), "root page loaded");

        let mut tally = self.count_hits(&root_html);
        let mut pages_visited = 1;
        let mut pages_skipped = 0;

        for link in sampled {
            match self.visit(link) {
                PageOutcome::Visited(hits) => {
                    for (total, page_hits) in tally.iter_mut().zip(hits) {
                        *total += page_hits;
                    }
                    pages_visited += 1;
                }
                PageOutcome::Skipped(err) => {
                    warn!(target: "crawl", url = %link, error = %err, "skipping page");
                    pages_skipped += 1;
                }
            }
        }

        let tally: Vec<CategoryTally> = self
            .keywords
            .names()
            .zip(tally)
            .map(|(category, hits)| CategoryTally {
                category: category.to_string(),
                hits,
            })
            .collect();

        let category = best_category(&tally).unwrap_or_default();
        info!(target: "crawl", url = %root, %category, pages_visited, pages_skipped, "classification finished");

        Ok(CrawlReport {
            url: root.to_string(),
            category,
            tally,
            internal_links: links.len(),
            pages_visited,
            pages_skipped,
        })
    }

    fn visit(&mut self, link: &Url) -> PageOutcome {
        match self.source.load(link.as_str()) {
            Ok(html) => PageOutcome::Visited(self.count_hits(&html)),
            Err(err) => PageOutcome::Skipped(err),
        }
    }

    /// Keyword occurrences per category in one page source.
    fn count_hits(&self, html: &str) -> Vec<u64> {
        let source = html.to_lowercase();
        self.keywords
            .iter()
            .map(|(_, words)| {
                words
                    .iter()
                    .map(|word| source.matches(word.as_str()).count() as u64)
                    .sum()
            })
            .collect()
    }
}

/// How many internal links get visited for a site with `link_count` of them.
pub fn sample_size(link_count: usize, config: &CrawlConfig) -> usize {
    if link_count <= config.sample_threshold {
        link_count / config.sample_divisor.max(1)
    } else {
        config.sample_cap.min(link_count)
    }
}

/// Links on the page whose host contains the root host, normalized and deduplicated.
/// The root page itself is left out under either scheme and with or without `www.`.
pub fn internal_links(html: &str, root: &Url) -> Vec<Url> {
    let Some(root_host) = root.host_str().map(site_host) else {
        return Vec::new();
    };
    let root_key = page_key(&normalize_link(root.clone()));

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for link in extract_links(&document, root) {
        if !matches!(link.scheme(), "http" | "https") {
            continue;
        }
        let is_internal = link.host_str().is_some_and(|host| host.contains(root_host));
        if !is_internal {
            continue;
        }
        let link = normalize_link(link);
        if page_key(&link) == root_key {
            continue;
        }
        if seen.insert(link.as_str().to_string()) {
            links.push(link);
        }
    }
    links
}

/// Drops the fragment and a trailing slash on non-root paths. Scheme and host are
/// already lower-cased by the parser.
pub fn normalize_link(mut url: Url) -> Url {
    url.set_fragment(None);
    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        url.set_path(if trimmed.is_empty() { "/" } else { &trimmed });
    }
    url
}

/// Identity of a page regardless of scheme and a leading `www.`.
fn page_key(url: &Url) -> (String, String, Option<String>) {
    (
        url.host_str().map(site_host).unwrap_or_default().to_string(),
        url.path().to_string(),
        url.query().map(str::to_string),
    )
}

fn site_host(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// First category holding the maximum hit count.
fn best_category(tally: &[CategoryTally]) -> Option<String> {
    let mut best: Option<&CategoryTally> = None;
    for entry in tally {
        if best.is_none_or(|b| entry.hits > b.hits) {
            best = Some(entry);
        }
    }
    best.map(|b| b.category.clone())
}
