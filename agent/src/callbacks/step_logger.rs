use crate::Result;
use crate::callbacks::Callback;
use crate::llm::Message;
use async_trait::async_trait;
use tracing::{debug, info};

/// Logs every message the agent adds to its history, one event per message.
pub struct StepLogger {
    seen: usize,
    step: u32,
}

impl StepLogger {
    pub fn new() -> Box<Self> {
        Box::new(Self { seen: 0, step: 0 })
    }

    fn log(&self, message: &Message) {
        match message {
            Message::System(content) => debug!(step = self.step, "system prompt:\n{}", content),
            Message::User(content) => info!(step = self.step, "user: {}", content),
            Message::Assistant(content, tool_calls) => {
                if !content.is_empty() {
                    info!(step = self.step, "assistant: {}", content);
                }
                for call in tool_calls {
                    info!(step = self.step, tool = %call.name, "invoking tool with {}", call.args);
                }
            }
            Message::Tool { name, result, .. } => {
                info!(step = self.step, tool = %name, "tool result: {}", result)
            }
        }
    }
}

#[async_trait]
impl Callback for StepLogger {
    async fn call(&mut self, messages: Vec<Message>) -> Result<Vec<Message>> {
        // a callback earlier in the chain may have shortened the history
        if messages.len() < self.seen {
            self.seen = 0;
        }

        messages[self.seen..].iter().for_each(|m| self.log(m));

        self.step += 1;
        self.seen = messages.len();

        Ok(messages)
    }
}
