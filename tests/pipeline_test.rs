//! End-to-end checks over the offline parts of the pipelines: dataset parsing,
//! training, model persistence, keyword crawling and the word report.

use std::collections::HashMap;
use std::fs;

use rand::SeedableRng;
use rand::rngs::StdRng;
use site_categorizer::{
    Error, Result,
    config::{CrawlConfig, HttpConfig},
    crawler::{
        KeywordCrawler,
        browser::PageSource,
        datascraper::Scraper,
        keywords::{KeywordSet, StopWords},
    },
    indexer::{ModelKind, WebsiteClassifier, dataset::TrainingData},
    report::BarChart,
    words,
};
use tempfile::TempDir;

fn category_documents() -> Vec<(String, String)> {
    [
        ("sports", "football goal match league striker stadium referee"),
        ("politics", "election vote parliament minister campaign ballot"),
        ("programming", "rust compiler cargo borrow checker crate trait"),
        ("cooking", "recipe pasta sauce oven garlic kitchen flour"),
        ("travel", "flight hotel passport beach luggage itinerary"),
    ]
    .iter()
    .map(|(c, t)| (c.to_string(), t.to_string()))
    .collect()
}

#[test]
fn saved_model_predicts_like_the_trained_one() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.bin");

    for kind in [ModelKind::Linear, ModelKind::Polynomial] {
        let mut classifier = WebsiteClassifier::new(kind);
        classifier.fit_texts(&category_documents()).unwrap();
        classifier.save(&path).unwrap();

        let loaded = WebsiteClassifier::load(&path).unwrap();
        assert_eq!(loaded.kind(), kind);
        assert_eq!(loaded.categories(), classifier.categories());

        for text in [
            "the referee stopped the match after a goal",
            "book a hotel near the beach",
            "borrow checker errors from the compiler",
            "",
        ] {
            assert_eq!(
                loaded.predict_text(text).unwrap(),
                classifier.predict_text(text).unwrap()
            );
        }
    }
}

#[test]
fn trained_model_classifies_unseen_text() {
    let mut classifier = WebsiteClassifier::new(ModelKind::Linear);
    classifier.fit_texts(&category_documents()).unwrap();

    let prediction = classifier
        .predict_text("Cheap flight deals and hotel packages for your next itinerary")
        .unwrap();
    assert_eq!(prediction.category, "travel");
}

#[test]
fn corrupt_model_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.bin");
    fs::write(&path, b"\x01\x02\x03").unwrap();
    assert!(matches!(WebsiteClassifier::load(&path), Err(Error::ModelCodec(_))));
}

#[test]
fn dataset_file_feeds_the_trainer_in_first_seen_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dataset.csv");
    fs::write(
        &path,
        "domain,category\n\
         https://varzesh3.com,sports\n\
         https://javacup.ir,programming\n\
         https://espn.com,sports\n",
    )
    .unwrap();

    let data = TrainingData::from_csv_path(&path).unwrap();
    let names: Vec<_> = data.iter().map(|(c, _)| c).collect();
    assert_eq!(names, vec!["sports", "programming"]);
    assert_eq!(data.domain_count(), 3);
}

#[tokio::test]
async fn training_propagates_fetch_failures() {
    let scraper = Scraper::new(&HttpConfig::default()).unwrap();
    let mut data = TrainingData::new();
    data.push("sports", "http://127.0.0.1:1/");

    let mut classifier = WebsiteClassifier::new(ModelKind::Linear);
    let result = classifier.train(&scraper, &data).await;
    assert!(matches!(result, Err(Error::Http { .. })));
    assert!(!classifier.is_fitted());
}

struct StaticSite {
    pages: HashMap<String, String>,
}

impl PageSource for StaticSite {
    fn load(&mut self, url: &str) -> Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Browser(format!("{url}: net::ERR_CONNECTION_REFUSED")))
    }
}

fn site_with_links(root: &str, count: usize) -> StaticSite {
    let mut pages = HashMap::new();
    let links: String = (0..count)
        .map(|i| format!(r#"<a href="{root}article/{i}">story {i}</a>"#))
        .collect();
    pages.insert(root.to_string(), format!("<html><body>{links}</body></html>"));
    for i in 0..count {
        pages.insert(
            format!("{root}article/{i}"),
            "<p>The match ended with a late goal.</p>".to_string(),
        );
    }
    StaticSite { pages }
}

#[test]
fn keyword_crawl_over_a_keyword_directory() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("sports.txt"), "goal\nmatch\n").unwrap();
    fs::write(dir.path().join("politics.txt"), "election\nvote\n").unwrap();
    let keywords = KeywordSet::load_dir(dir.path()).unwrap();

    let root = "https://news.example.com/";
    let mut crawler = KeywordCrawler::new(site_with_links(root, 40), keywords, CrawlConfig::default());
    let report = crawler
        .classify_with_rng(root, &mut StdRng::seed_from_u64(42))
        .unwrap();

    assert_eq!(report.internal_links, 40);
    assert_eq!(report.pages_visited, 1 + 10);
    assert_eq!(report.pages_skipped, 0);
    assert_eq!(report.category, "sports");
    assert_eq!(report.total_hits(), 20);

    let percentages = report.percentages();
    assert_eq!(percentages[0], ("politics".to_string(), 0.0));
    assert_eq!(percentages[1], ("sports".to_string(), 100.0));
}

#[test]
fn large_sites_are_capped_at_fifty_pages() {
    let keywords = KeywordSet::new([("sports".to_string(), vec!["goal"])]);
    let root = "https://example.com/";
    let mut crawler = KeywordCrawler::new(site_with_links(root, 240), keywords, CrawlConfig::default());
    let report = crawler.classify(root).unwrap();

    assert_eq!(report.internal_links, 240);
    assert_eq!(report.pages_visited, 1 + 50);
}

#[test]
fn refused_root_page_gives_no_classification() {
    let keywords = KeywordSet::new([("sports".to_string(), vec!["goal"])]);
    let mut crawler = KeywordCrawler::new(
        StaticSite {
            pages: HashMap::new(),
        },
        keywords,
        CrawlConfig::default(),
    );
    match crawler.classify("https://unreachable.example.com/") {
        Err(Error::RootPage { url, reason }) => {
            assert_eq!(url, "https://unreachable.example.com/");
            assert!(reason.contains("CONNECTION_REFUSED"));
        }
        other => panic!("expected a root page failure, got {other:?}"),
    }
}

#[test]
fn word_report_round_trips_through_csv_and_chart_filter() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("website_words.csv");

    let counts = words::count_words("data, data and more data; analysis of data and graphs")
        .without_stop_words(&StopWords::from_words(["of"]));
    let sorted = counts.into_sorted();
    words::write_csv_path(&path, &sorted).unwrap();

    let header = fs::read_to_string(&path).unwrap();
    assert!(header.starts_with("word,number_of_repetition\n"));

    let entries = words::read_csv_path(&path).unwrap();
    assert_eq!(entries, sorted);

    let chart = BarChart::new("bar", entries).with_min_count(2);
    assert_eq!(
        chart.bars,
        vec![("data".to_string(), 4), ("and".to_string(), 2)]
    );
}
