//! Tools available to the research agent.

use crate::config::Settings;
use agent::Result;
use agent::tools::Tool;

mod save;
mod search;
mod wikipedia;

pub use save::SaveTool;
pub use search::SearchTool;
pub use wikipedia::WikipediaTool;

const USER_AGENT: &str = concat!("research/", env!("CARGO_PKG_VERSION"));

pub fn research_tools(settings: &Settings) -> Result<Vec<Box<dyn Tool + Send>>> {
    let tools: Vec<Box<dyn Tool + Send>> = vec![
        SearchTool::new()?,
        WikipediaTool::new(
            &settings.wiki_lang,
            settings.wiki_top_k,
            settings.wiki_max_chars,
        )?,
        SaveTool::new(settings.output_file.clone()),
    ];
    Ok(tools)
}

fn http_client(tool: &str) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| agent::Error::tool_failed(tool, e))
}
