use crate::Result;
use crate::llm::Message;
use async_trait::async_trait;

mod step_logger;
pub use step_logger::StepLogger;

/// Hook run after every agent iteration with the full message history.
#[async_trait]
pub trait Callback {
    async fn call(&mut self, messages: Vec<Message>) -> Result<Vec<Message>>;
}
