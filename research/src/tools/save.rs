use agent::tools::TextTool;
use agent::{Error, Result};
use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::info;

const NAME: &str = "save_text_to_file";

/// Appends research to a text file. The file is never truncated or read.
pub struct SaveTool {
    path: PathBuf,
}

impl SaveTool {
    pub fn new(path: PathBuf) -> Box<Self> {
        Box::new(Self { path })
    }
}

#[async_trait]
impl TextTool for SaveTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Persists structured research data into a local text file."
    }

    async fn run(&mut self, input: String) -> Result<String> {
        append_block(&self.path, &input, Local::now().naive_local())
            .await
            .map_err(|e| Error::tool_failed(NAME, e))?;

        info!(path = %self.path.display(), bytes = input.len(), "saved research output");
        Ok(format!(
            "Data successfully saved to '{}'.",
            self.path.display()
        ))
    }
}

fn format_block(data: &str, timestamp: NaiveDateTime) -> String {
    format!(
        "--- Research Output ---\nTimestamp: {}\n\n{}\n\n",
        timestamp.format("%Y-%m-%d %H:%M:%S"),
        data
    )
}

async fn append_block(path: &Path, data: &str, timestamp: NaiveDateTime) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;

    file.write_all(format_block(data, timestamp).as_bytes())
        .await?;
    file.flush().await
}
