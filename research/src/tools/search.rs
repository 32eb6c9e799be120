use agent::tools::TextTool;
use agent::{Error, Result};
use async_trait::async_trait;
use tracing::debug;

const NAME: &str = "search";
const ENDPOINT: &str = "https://html.duckduckgo.com/html/";
const MAX_RESULTS: usize = 5;
const NO_RESULTS: &str = "No good DuckDuckGo Search Result was found";

/// Web search over the DuckDuckGo HTML frontend, which needs no API key.
pub struct SearchTool {
    client: reqwest::Client,
}

impl SearchTool {
    pub fn new() -> Result<Box<Self>> {
        Ok(Box::new(Self {
            client: super::http_client(NAME)?,
        }))
    }

    async fn fetch(&self, query: &str) -> reqwest::Result<String> {
        self.client
            .get(ENDPOINT)
            .query(&[("q", query)])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

#[async_trait]
impl TextTool for SearchTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Perform a web search for real-time information retrieval."
    }

    async fn run(&mut self, input: String) -> Result<String> {
        let html = self
            .fetch(&input)
            .await
            .map_err(|e| Error::tool_failed(NAME, e))?;

        let snippets = extract_snippets(&html, MAX_RESULTS);
        debug!(query = %input, results = snippets.len(), "web search finished");

        if snippets.is_empty() {
            Ok(NO_RESULTS.to_string())
        } else {
            Ok(snippets.join(" "))
        }
    }
}

/// Result snippets from a DuckDuckGo HTML page, in page order.
fn extract_snippets(html: &str, limit: usize) -> Vec<String> {
    html.split("class=\"result__snippet\"")
        .skip(1)
        .filter_map(|chunk| {
            let body = &chunk[chunk.find('>')? + 1..];
            let end = body.find("</a>").or_else(|| body.find("</td>"))?;
            let text = html_decode(&strip_tags(&body[..end]));
            (!text.is_empty()).then_some(text)
        })
        .take(limit)
        .collect()
}

fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;

    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn html_decode(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
