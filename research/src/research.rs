use crate::config::Settings;
use crate::response::ResearchResponse;
use crate::tools;
use agent::callbacks::StepLogger;
use agent::llm;
use agent::output::{OutputParser, ParseError};
use agent::prompt::ChatPrompt;
use agent::{Agent, AgentBuilder, Transcript};
use agent::{Error, Result};
use std::sync::Arc;
use tracing::info;

const RESEARCH_PROMPT: &str = include_str!("prompts/research.md");

/// A user query, trimmed and known to be non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ResearchQuery(String);

impl ResearchQuery {
    pub fn new(input: &str) -> Result<Self> {
        let query = input.trim();
        if query.is_empty() {
            return Err(Error::MissingArg(
                "research query must not be empty".to_string(),
            ));
        }
        Ok(Self(query.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub struct Orchestrator {
    agent: Agent,
    parser: OutputParser<ResearchResponse>,
}

impl Orchestrator {
    pub fn new(llm: Arc<dyn llm::LLM + Send + Sync>, settings: &Settings) -> Result<Self> {
        let parser = OutputParser::<ResearchResponse>::new();
        let prompt = ChatPrompt::new(RESEARCH_PROMPT)
            .partial("format_instructions", &parser.format_instructions()?)?;

        Ok(Self {
            agent: AgentBuilder::new()
                .llm(llm)
                .prompt(prompt)
                .tools(tools::research_tools(settings)?)
                .callback(StepLogger::new())
                .max_iterations(settings.max_iterations)
                .build()?,
            parser,
        })
    }

    pub async fn run(&mut self, query: &ResearchQuery) -> Result<Transcript> {
        info!(query = query.as_str(), "starting research");
        let transcript = self.agent.run(query.as_str()).await?;
        info!(
            iterations = transcript.iterations(),
            tools = ?transcript.tools_invoked(),
            "research finished"
        );
        Ok(transcript)
    }

    /// Coerce the agent's final answer into a [`ResearchResponse`].
    pub fn coerce(
        &self,
        transcript: &Transcript,
    ) -> std::result::Result<ResearchResponse, ParseError> {
        self.parser.parse_transcript(transcript)
    }
}

/// What the user sees: the record, or the parse error and the raw transcript.
pub fn render_outcome(
    outcome: &std::result::Result<ResearchResponse, ParseError>,
    transcript: &Transcript,
) -> String {
    match outcome {
        Ok(response) => response.to_string(),
        Err(e) => format!(
            "Error parsing response: {}\nRaw Response for Debugging:\n{}",
            e, transcript
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{Orchestrator, ResearchQuery, render_outcome};
    use crate::config::Settings;
    use agent::llm::{CompletionRequest, CompletionResponse, LLM, Message};
    use agent::output::ParseError;
    use agent::tools::ToolCall;
    use agent::Result;
    use async_trait::async_trait;
    use clap::Parser;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Replays canned completions in order.
    struct ScriptedLLM(Mutex<VecDeque<CompletionResponse>>);

    impl ScriptedLLM {
        fn new(replies: Vec<CompletionResponse>) -> Arc<Self> {
            Arc::new(Self(Mutex::new(replies.into())))
        }
    }

    #[async_trait]
    impl LLM for ScriptedLLM {
        async fn completion<'a>(
            &self,
            request: CompletionRequest<'a>,
        ) -> Result<CompletionResponse> {
            assert_eq!(request.tools.len(), 3);
            assert!(matches!(&request.messages[0], Message::System(prompt)
                if prompt.contains("\"tools_used\"") && !prompt.contains("{format_instructions}")));

            Ok(self
                .0
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted reply left"))
        }
    }

    fn answer(content: &str) -> CompletionResponse {
        CompletionResponse {
            content: content.to_string(),
            tool_calls: vec![],
        }
    }

    fn settings(output_file: &std::path::Path) -> Settings {
        Settings::try_parse_from(["research", "--output-file", output_file.to_str().unwrap()])
            .unwrap()
    }

    #[test]
    fn test_query_validation() {
        assert_eq!(ResearchQuery::new("  solar \n").unwrap().as_str(), "solar");
        assert!(ResearchQuery::new(" \n").is_err());
    }

    #[tokio::test]
    async fn test_research_with_save() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("research_output.txt");

        let llm = ScriptedLLM::new(vec![
            CompletionResponse {
                content: String::new(),
                tool_calls: vec![ToolCall {
                    id: "call1".to_string(),
                    name: "save_text_to_file".to_string(),
                    args: "{\"input\":\"Solar energy notes\"}".to_string(),
                }],
            },
            answer(
                r#"{"topic":"Solar energy","summary":"...","sources":["a.com"],"tools_used":["save_text_to_file"]}"#,
            ),
        ]);

        let mut orchestrator = Orchestrator::new(llm, &settings(&path))?;
        let transcript = orchestrator
            .run(&ResearchQuery::new("solar energy")?)
            .await?;

        assert_eq!(transcript.tools_invoked(), vec!["save_text_to_file"]);
        assert!(std::fs::read_to_string(&path)?.contains("\n\nSolar energy notes\n\n"));

        let response = orchestrator.coerce(&transcript).unwrap();
        assert_eq!(response.topic, "Solar energy");
        assert_eq!(response.summary, "...");
        assert_eq!(response.sources, vec!["a.com"]);
        assert_eq!(response.tools_used, vec!["save_text_to_file"]);

        Ok(())
    }

    #[tokio::test]
    async fn test_round_trip_fidelity() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let text = r#"```json
{"topic":"Tides","summary":"Caused by the \"Moon\".","sources":["x.org","y.com"],"tools_used":["search","wikipedia"]}
```"#;

        let mut orchestrator = Orchestrator::new(
            ScriptedLLM::new(vec![answer(text)]),
            &settings(&dir.path().join("o.txt")),
        )?;
        let transcript = orchestrator.run(&ResearchQuery::new("tides")?).await?;
        let response = orchestrator.coerce(&transcript).unwrap();

        assert_eq!(response.topic, "Tides");
        assert_eq!(response.summary, "Caused by the \"Moon\".");
        assert_eq!(response.sources, vec!["x.org", "y.com"]);
        assert_eq!(response.tools_used, vec!["search", "wikipedia"]);
        assert_eq!(render_outcome(&Ok(response.clone()), &transcript), response.to_string());

        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_answers_show_raw_transcript() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let invalid = [
            "not json",
            r#"{"topic":"Solar energy","summary":"...","sources":["a.com"]}"#,
            r#"{"topic":"Solar energy","summary":"...","sources":"a.com","tools_used":[]}"#,
            r#"{"topic":"Solar energy","summary":"...","sources":[1],"tools_used":[]}"#,
            r#"{"topic":"Solar energy","summary":"...","sources":[],"tools_used":[],"extra":true}"#,
        ];

        for text in invalid {
            let mut orchestrator = Orchestrator::new(
                ScriptedLLM::new(vec![answer(text)]),
                &settings(&dir.path().join("o.txt")),
            )?;
            let transcript = orchestrator.run(&ResearchQuery::new("solar")?).await?;
            let outcome = orchestrator.coerce(&transcript);

            assert!(matches!(&outcome, Err(ParseError::Invalid { text: t, .. }) if t == text));

            let shown = render_outcome(&outcome, &transcript);
            assert!(shown.starts_with("Error parsing response: "));
            assert!(shown.contains("Raw Response for Debugging:"));
            assert!(shown.contains(text));
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_empty_answer_shows_raw_transcript() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let llm = ScriptedLLM::new(vec![
            CompletionResponse {
                content: String::new(),
                tool_calls: vec![ToolCall {
                    id: "call1".to_string(),
                    name: "save_text_to_file".to_string(),
                    args: "{\"input\":\"tidal notes\"}".to_string(),
                }],
            },
            answer(""),
        ]);

        let mut orchestrator = Orchestrator::new(llm, &settings(&dir.path().join("o.txt")))?;
        let transcript = orchestrator.run(&ResearchQuery::new("tides")?).await?;
        let outcome = orchestrator.coerce(&transcript);

        assert!(matches!(outcome, Err(ParseError::NoOutput)));

        let shown = render_outcome(&outcome, &transcript);
        assert!(shown.starts_with("Error parsing response: agent produced no final answer\n"));
        assert!(shown.contains("Raw Response for Debugging:\nquery: tides\n"));
        assert!(shown.contains("tidal notes"));

        Ok(())
    }

    #[tokio::test]
    async fn test_iteration_limit_is_a_parse_failure() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("o.txt");
        let save = || CompletionResponse {
            content: String::new(),
            tool_calls: vec![ToolCall {
                id: "s".to_string(),
                name: "save_text_to_file".to_string(),
                args: "{\"input\":\"again\"}".to_string(),
            }],
        };

        let mut settings = settings(&path);
        settings.max_iterations = 2;

        let mut orchestrator =
            Orchestrator::new(ScriptedLLM::new(vec![save(), save()]), &settings)?;
        let transcript = orchestrator.run(&ResearchQuery::new("loop")?).await?;

        assert_eq!(transcript.iterations(), 2);
        assert!(orchestrator.coerce(&transcript).is_err());

        Ok(())
    }
}
