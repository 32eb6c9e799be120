use agent::tools::TextTool;
use agent::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

const NAME: &str = "wikipedia";
const MAX_QUERY_CHARS: usize = 300;
const NO_RESULTS: &str = "No good Wikipedia Search Result was found";

/// Looks a topic up through the MediaWiki action API and returns the intro
/// of the best matching pages.
pub struct WikipediaTool {
    client: reqwest::Client,
    api: String,
    top_k: usize,
    max_chars: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Deserialize)]
struct SearchQuery {
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Deserialize)]
struct ExtractResponse {
    query: Option<ExtractQuery>,
}

#[derive(Deserialize)]
struct ExtractQuery {
    pages: Vec<Page>,
}

#[derive(Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    extract: Option<String>,
}

impl WikipediaTool {
    pub fn new(lang: &str, top_k: usize, max_chars: usize) -> Result<Box<Self>> {
        Ok(Box::new(Self {
            client: super::http_client(NAME)?,
            api: format!("https://{}.wikipedia.org/w/api.php", lang),
            top_k,
            max_chars,
        }))
    }

    async fn search(&self, query: &str) -> reqwest::Result<Vec<String>> {
        let limit = self.top_k.to_string();
        let res: SearchResponse = self
            .client
            .get(&self.api)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(res
            .query
            .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
            .unwrap_or_default())
    }

    async fn summary(&self, title: &str) -> reqwest::Result<Option<Page>> {
        let res: ExtractResponse = self
            .client
            .get(&self.api)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(res.query.and_then(|q| q.pages.into_iter().next()))
    }

    async fn lookup(&self, query: &str) -> reqwest::Result<Vec<Page>> {
        let mut pages = Vec::new();
        for title in self.search(query).await?.into_iter().take(self.top_k) {
            // titles can vanish between search and fetch
            if let Some(page) = self.summary(&title).await? {
                pages.push(page);
            }
        }
        Ok(pages)
    }
}

#[async_trait]
impl TextTool for WikipediaTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "A wrapper around Wikipedia. Useful for when you need to answer general questions about people, places, companies, facts, historical events, or other subjects. Input should be a search query."
    }

    async fn run(&mut self, input: String) -> Result<String> {
        let query: String = input.chars().take(MAX_QUERY_CHARS).collect();

        let pages = self
            .lookup(&query)
            .await
            .map_err(|e| Error::tool_failed(NAME, e))?;
        debug!(query = %query, pages = pages.len(), "wikipedia lookup finished");

        Ok(format_pages(&pages, self.max_chars))
    }
}

fn format_pages(pages: &[Page], max_chars: usize) -> String {
    let summaries = pages
        .iter()
        .filter_map(|page| {
            let extract = page.extract.as_deref()?.trim();
            (!extract.is_empty()).then(|| format!("Page: {}\nSummary: {}", page.title, extract))
        })
        .collect::<Vec<_>>();

    if summaries.is_empty() {
        return NO_RESULTS.to_string();
    }

    summaries.join("\n\n").chars().take(max_chars).collect()
}
