// src/interactive.rs

use std::io::{self, Write};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::crawler::datascraper::Scraper;
use crate::indexer::WebsiteClassifier;

/// Reads domains from stdin and prints a prediction for each until `exit` or EOF.
pub async fn run_prompt(classifier: &WebsiteClassifier, scraper: &Scraper) -> io::Result<()> {
    let input = BufReader::new(tokio::io::stdin());
    run_prompt_with(classifier, scraper, input, &mut io::stdout()).await
}

pub async fn run_prompt_with<R, W>(
    classifier: &WebsiteClassifier,
    scraper: &Scraper,
    input: R,
    out: &mut W,
) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "Model loaded with categories: {}", classifier.categories().join(", "))?;
    writeln!(out, "Type 'exit' to quit.")?;

    let mut lines = input.lines();
    loop {
        write!(out, "\nDomain > ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let domain = line.trim();
        if domain.is_empty() {
            continue;
        }
        if domain.eq_ignore_ascii_case("exit") {
            break;
        }

        match classifier.predict(scraper, domain).await {
            Ok(prediction) => {
                writeln!(out, "The category of {} is {}", domain, prediction.category)?;
                writeln!(out, "The confidence score is {:.4}", prediction.confidence)?;
                writeln!(out, "The page language is {}", prediction.language)?;
            }
            Err(e) => writeln!(out, "Error classifying {}: {}", domain, e)?,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use crate::indexer::ModelKind;

    #[tokio::test]
    async fn prompt_stops_at_exit_and_reports_errors() {
        let classifier = WebsiteClassifier::new(ModelKind::Linear);
        let scraper = Scraper::new(&HttpConfig::default()).unwrap();
        let input = "\n   \nhttp://127.0.0.1:1/\nEXIT\nhttp://never.example/\n".as_bytes();

        let mut out = Vec::new();
        run_prompt_with(&classifier, &scraper, input, &mut out)
            .await
            .unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Error classifying http://127.0.0.1:1/: classifier has not been trained"));
        assert!(!out.contains("never.example"));
    }

    #[tokio::test]
    async fn prompt_ends_on_end_of_input() {
        let classifier = WebsiteClassifier::new(ModelKind::Linear);
        let scraper = Scraper::new(&HttpConfig::default()).unwrap();

        let mut out = Vec::new();
        run_prompt_with(&classifier, &scraper, "".as_bytes(), &mut out)
            .await
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap().matches("Domain > ").count(), 1);
    }
}
