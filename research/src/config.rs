use clap::Parser;
use std::path::PathBuf;

/// Research a topic with a tool-using LLM agent and get a structured answer.
///
/// Provider credentials (OPENAI_API_KEY) and the RESEARCH_* variables may
/// be set in a `.env` file in the working directory.
#[derive(Parser, Debug, Clone)]
#[command(name = "research", version, about, long_about = None)]
pub struct Settings {
    /// What to research; asked for interactively when omitted
    pub query: Option<String>,

    /// Chat model used by the agent
    #[arg(long, env = "RESEARCH_MODEL", default_value = "gpt-4o")]
    pub model: String,

    /// OpenAI compatible endpoint to use instead of api.openai.com
    #[arg(long, env = "OPENAI_BASE_URL")]
    pub api_base: Option<String>,

    /// File the save tool appends research to
    #[arg(long, env = "RESEARCH_OUTPUT_FILE", default_value = "research_output.txt")]
    pub output_file: PathBuf,

    /// Completions the agent may request before it is stopped
    #[arg(long, env = "RESEARCH_MAX_ITERATIONS", default_value_t = 15)]
    pub max_iterations: usize,

    /// Wikipedia pages returned per lookup
    #[arg(long, default_value_t = 1)]
    pub wiki_top_k: usize,

    /// Maximum characters returned per Wikipedia lookup
    #[arg(long, default_value_t = 100)]
    pub wiki_max_chars: usize,

    /// Wikipedia language edition
    #[arg(long, default_value = "en")]
    pub wiki_lang: String,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Settings {
    /// Log filter used when RUST_LOG is not set.
    pub fn log_filter(&self) -> String {
        let level = match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        format!("research={level},agent={level}")
    }
}
