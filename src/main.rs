// src/main.rs

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use site_categorizer::{
    config::{self, AppConfig},
    crawler::{
        KeywordCrawler,
        browser::ChromeSession,
        datascraper::Scraper,
        keywords::{KeywordSet, StopWords},
    },
    indexer::{WebsiteClassifier, dataset::TrainingData},
    interactive, logging,
    report::BarChart,
    words,
};

#[derive(Parser)]
#[command(name = "site-categorizer", version, about = "Categorize websites by their text")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Count word repetitions on a page and write them to a CSV file.
    Words {
        url: String,
        #[arg(long, default_value = "website_words.csv")]
        out: PathBuf,
        /// Number of leading <p> elements to read.
        #[arg(long, default_value_t = 3, conflicts_with = "all")]
        paragraphs: usize,
        /// Use all visible text instead of the leading paragraphs.
        #[arg(long)]
        all: bool,
        #[arg(long)]
        stopwords: Option<PathBuf>,
    },
    /// Draw a bar chart from a word CSV file.
    Plot {
        csv: PathBuf,
        #[arg(long, default_value = "words.svg")]
        out: PathBuf,
        #[arg(long, default_value = "bar")]
        title: String,
        /// Hide words repeated fewer times than this.
        #[arg(long, default_value_t = 2)]
        min_count: u32,
    },
    /// Train a classifier from a `domain,category` CSV file.
    Train {
        dataset: PathBuf,
        #[arg(long)]
        model: PathBuf,
        /// `linear` or `poly`.
        #[arg(long, default_value = "linear")]
        kind: String,
    },
    /// Predict categories with a trained model; prompts when no domain is given.
    Predict {
        domains: Vec<String>,
        #[arg(long)]
        model: PathBuf,
    },
    /// Classify a site by crawling it with a browser and counting keywords.
    Crawl {
        url: String,
        #[arg(long)]
        keywords: PathBuf,
        #[arg(long)]
        stopwords: Option<PathBuf>,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = config::load_config()?;
    logging::init_tracing(&config.logging);

    match cli.command {
        Command::Words {
            url,
            out,
            paragraphs,
            all,
            stopwords,
        } => run_words(&config, &url, &out, (!all).then_some(paragraphs), stopwords.as_deref()).await,
        Command::Plot {
            csv,
            out,
            title,
            min_count,
        } => run_plot(&csv, &out, &title, min_count),
        Command::Train {
            dataset,
            model,
            kind,
        } => run_train(&config, &dataset, &model, &kind).await,
        Command::Predict { domains, model } => run_predict(&config, &domains, &model).await,
        Command::Crawl {
            url,
            keywords,
            stopwords,
            json,
        } => run_crawl(config, url, &keywords, stopwords.as_deref(), json).await,
    }
}

async fn run_words(
    config: &AppConfig,
    url: &str,
    out: &Path,
    paragraphs: Option<usize>,
    stopwords: Option<&Path>,
) -> Result<()> {
    let scraper = Scraper::new(&config.http)?;
    let text = match paragraphs {
        Some(limit) => scraper.extract_paragraphs(url, limit).await?,
        None => scraper.extract_text(url).await?,
    };

    let mut counts = words::count_words(&text);
    if let Some(dir) = stopwords {
        let stop_words = StopWords::load_dir(dir)
            .with_context(|| format!("failed to read stop words from {}", dir.display()))?;
        counts = counts.without_stop_words(&stop_words);
    }

    let sorted = counts.into_sorted();
    words::write_csv_path(out, &sorted)
        .with_context(|| format!("failed to write {}", out.display()))?;
    println!("Wrote {} words to {}", sorted.len(), out.display());
    Ok(())
}

fn run_plot(csv: &Path, out: &Path, title: &str, min_count: u32) -> Result<()> {
    let entries = words::read_csv_path(csv)
        .with_context(|| format!("failed to read {}", csv.display()))?;
    let chart = BarChart::new(title, entries).with_min_count(min_count);
    if chart.is_empty() {
        bail!("no words repeated at least {} times in {}", min_count, csv.display());
    }
    chart.render_svg(out)?;
    println!("Chart saved to {}", out.display());
    Ok(())
}

async fn run_train(config: &AppConfig, dataset: &Path, model: &Path, kind: &str) -> Result<()> {
    let mut classifier = WebsiteClassifier::with_kind_name(kind)?;
    let data = TrainingData::from_csv_path(dataset)
        .with_context(|| format!("failed to read dataset {}", dataset.display()))?;
    println!(
        "Training on {} domains in {} categories...",
        data.domain_count(),
        data.category_count()
    );

    let scraper = Scraper::new(&config.http)?;
    classifier.train(&scraper, &data).await?;
    classifier
        .save(model)
        .with_context(|| format!("failed to save model to {}", model.display()))?;
    println!("Model saved to {}", model.display());
    Ok(())
}

async fn run_predict(config: &AppConfig, domains: &[String], model: &Path) -> Result<()> {
    let classifier = WebsiteClassifier::load(model)
        .with_context(|| format!("failed to load model {}", model.display()))?;
    let scraper = Scraper::new(&config.http)?;

    if domains.is_empty() {
        interactive::run_prompt(&classifier, &scraper).await?;
        return Ok(());
    }

    for domain in domains {
        let prediction = classifier.predict(&scraper, domain).await?;
        println!("The category of {} is {}", domain, prediction.category);
        println!("The confidence score is {:.4}", prediction.confidence);
        println!("The page language is {}", prediction.language);
    }
    Ok(())
}

async fn run_crawl(
    config: AppConfig,
    url: String,
    keywords: &Path,
    stopwords: Option<&Path>,
    json: bool,
) -> Result<()> {
    let mut keyword_set = KeywordSet::load_dir(keywords)
        .with_context(|| format!("failed to read keywords from {}", keywords.display()))?;
    if let Some(dir) = stopwords {
        let stop_words = StopWords::load_dir(dir)
            .with_context(|| format!("failed to read stop words from {}", dir.display()))?;
        keyword_set = keyword_set.without_stop_words(&stop_words);
    }
    if keyword_set.is_empty() {
        bail!("no keyword files found in {}", keywords.display());
    }

    let report = tokio::task::spawn_blocking(move || {
        let session = ChromeSession::launch(&config.browser)?;
        let mut crawler = KeywordCrawler::new(session, keyword_set, config.crawl);
        let report = crawler.classify(&url);
        crawler.into_source().close();
        report
    })
    .await
    .context("crawl task panicked")??;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}
