use async_openai::error::OpenAIError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Json error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Openai error: {0}")]
    OpenaiError(#[from] OpenAIError),

    #[error("No response from llm: {0}")]
    LLMResponseError(String),

    #[error("Tool {0} does not exist")]
    ToolDoesNotExist(String),

    #[error("Tool {0} is registered more than once")]
    DuplicateTool(String),

    #[error("Missing arg: {0}")]
    MissingArg(String),

    #[error("Prompt error: {0}")]
    PromptError(String),

    #[error("Tool {tool} failed: {source}")]
    ToolFailed {
        tool: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Agent workflow error: {0}")]
    AgentWorkflowError(String),

    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),
}

impl Error {
    pub fn tool_failed<E>(tool: &str, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::ToolFailed {
            tool: tool.to_string(),
            source: source.into(),
        }
    }
}
