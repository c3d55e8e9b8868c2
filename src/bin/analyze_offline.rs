//! Runs the analysis pipeline over a few sample texts without any AI model,
//! then searches the resulting history.

use anyhow::Result;
use text_insight::{sentiment, AnalysisStore, SentimentProvider, TextAnalyzer};

const SAMPLES: &[&str] = &[
    "This is an amazing project built with axum! I am really happy with the result and hope it gets approved.",
    "Rust is a fantastic language for building APIs. Axum makes everything simpler and more efficient.",
    "Unfortunately this project is not working as expected. It is full of bugs and problems that need fixing urgently.",
    "The Gemini integration allows far more detailed sentiment analysis than traditional keyword methods.",
];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let analyzer = TextAnalyzer::new(AnalysisStore::default(), SentimentProvider::unconfigured());

    println!("Offline demo: analyzing {} sample texts", SAMPLES.len());
    for (i, text) in SAMPLES.iter().enumerate() {
        let record = analyzer.analyze(text).await?;
        // the provider is unconfigured, so show what the fallback scorer says
        let local = sentiment::score(text);

        println!("\n--- Sample {}/{} ---", i + 1, SAMPLES.len());
        println!("Text:        {}", record.original_text);
        println!("Fingerprint: {}", record.fingerprint);
        println!("Word count:  {}", record.word_count);
        println!("Top words:");
        for (rank, wf) in record.top_words.iter().enumerate() {
            println!("  {}. {} ({}x)", rank + 1, wf.word, wf.frequency);
        }
        println!(
            "Sentiment:   {} ({:.2})",
            local.sentiment,
            local.confidence.unwrap_or_default()
        );
        if let Some(explanation) = &local.explanation {
            println!("Explanation: {}", explanation);
        }
        println!("Timestamp:   {}", record.timestamp);
    }

    println!();
    for term in ["project", "rust", "nothing-like-this"] {
        let result = analyzer.search(term)?;
        println!(
            "Search '{}': found={} occurrences={} last={}",
            result.term,
            result.found,
            result.occurrences,
            result.last_timestamp.as_deref().unwrap_or("-")
        );
    }
    println!("Store size: {}", analyzer.store_size()?);

    Ok(())
}
