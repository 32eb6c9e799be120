use crate::Result;
use crate::tools::{ToolCall, ToolDefinition};
use async_trait::async_trait;

mod openai;
pub use openai::OpenAI;

#[derive(Clone, Debug)]
pub enum Message {
    User(String),
    Assistant(String, Vec<ToolCall>),
    System(String),
    Tool {
        id: String,
        name: String,
        result: String,
    },
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Message::System(content) => writeln!(f, "[system]\n{}", content),
            Message::User(content) => writeln!(f, "[user]\n{}", content),
            Message::Assistant(content, tool_calls) => {
                writeln!(f, "[assistant]")?;
                if !content.is_empty() {
                    writeln!(f, "{}", content)?;
                }
                tool_calls.iter().try_for_each(|call| writeln!(f, "{}", call))
            }
            Message::Tool { name, id, result } => {
                writeln!(f, "[tool {} ({})]\n{}", name, id, result)
            }
        }
    }
}

pub struct CompletionRequest<'a> {
    pub messages: &'a [Message],
    pub tools: &'a [ToolDefinition],
}

pub struct CompletionResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

#[async_trait]
pub trait LLM {
    async fn completion<'a>(&self, request: CompletionRequest<'a>) -> Result<CompletionResponse>;
}
