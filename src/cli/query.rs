use anyhow::Result;
use console::{style, Emoji};
use std::sync::Arc;

use crate::config::Settings;
use crate::embedder::{create_embedder, Embedder, EmbedderConfig};
use crate::generator::{Generator, OllamaGenerator};
use crate::retriever::Retriever;
use crate::store::{create_index, VectorIndex};

static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "");
static ANSWER: Emoji<'_, '_> = Emoji("💬 ", "");
static SOURCE: Emoji<'_, '_> = Emoji("📄 ", "");

pub async fn run_query(query: &str, k: usize, retrieve_only: bool, json: bool) -> Result<()> {
    let settings = Settings::from_env();

    let embedder: Arc<dyn Embedder> = Arc::from(create_embedder(&EmbedderConfig {
        endpoint: settings.ollama_endpoint.clone(),
        model: settings.embedding_model.clone(),
        dimensions: settings.embed_dimensions,
        timeout_secs: settings.http_timeout_secs,
    }));
    let index: Arc<dyn VectorIndex> = Arc::from(create_index(&settings)?);
    let retriever = Retriever::new(embedder, index);

    let documents = retriever.retrieve(query, k.max(1)).await?;

    if retrieve_only {
        if json {
            println!("{}", serde_json::to_string_pretty(&documents)?);
            return Ok(());
        }
        print_sources(query, &documents);
        return Ok(());
    }

    let generator = Generator::new(Arc::new(OllamaGenerator::new(
        &settings.ollama_endpoint,
        &settings.llm_model,
        settings.http_timeout_secs,
    )));
    let answer = generator.generate(query, &documents).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "answer": answer,
                "sources": documents,
            }))?
        );
        return Ok(());
    }

    println!("\n{}{}\n", ANSWER, style(answer.trim()).bold());
    print_sources(query, &documents);
    Ok(())
}

fn print_sources(query: &str, documents: &[crate::types::RetrievedChunk]) {
    if documents.is_empty() {
        println!("No indexed chunks matched: {}", style(query).italic());
        return;
    }

    println!(
        "{}{} chunks for: {}\n",
        SEARCH,
        style(documents.len()).cyan(),
        style(query).yellow().bold()
    );

    for (i, doc) in documents.iter().enumerate() {
        println!(
            "{} {}. {} {}",
            SOURCE,
            style(i + 1).dim(),
            style(&doc.source_id).green(),
            style(format!("(page {}, distance {:.3})", doc.page_number, doc.distance)).dim()
        );

        let preview: String = doc.text.chars().take(200).collect();
        let suffix = if doc.text.chars().count() > 200 { "..." } else { "" };
        println!("   {}{}\n", style(preview).dim(), suffix);
    }
}
