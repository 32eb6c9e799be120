mod config;
mod research;
mod response;
mod tools;

use agent::Result;
use clap::Parser;
use config::Settings;
use research::ResearchQuery;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::warn;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // credentials may live in .env, and clap reads RESEARCH_* from the environment
    dotenvy::dotenv().ok();
    let settings = Settings::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.log_filter())),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let query = match &settings.query {
        Some(query) => ResearchQuery::new(query)?,
        None => ResearchQuery::new(&read_query().await?)?,
    };

    let llm = match &settings.api_base {
        Some(api_base) => agent::llm::OpenAI::with_api_base(settings.model.clone(), api_base),
        None => agent::llm::OpenAI::new(settings.model.clone()),
    };

    let mut orchestrator = research::Orchestrator::new(llm, &settings)?;
    let transcript = orchestrator.run(&query).await?;

    let outcome = orchestrator.coerce(&transcript);
    if let Err(e) = &outcome {
        warn!("could not coerce the agent's answer: {}", e);
    }
    println!("{}", research::render_outcome(&outcome, &transcript));

    Ok(())
}

async fn read_query() -> Result<String> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"What can I help you research? ").await?;
    stdout.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
    Ok(line)
}
