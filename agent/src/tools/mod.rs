use crate::Result;
use crate::llm::Message;
use async_trait::async_trait;
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;

#[derive(Clone, Debug)]
pub struct ToolDefinition {
    pub name: String,
    pub desc: String,
    pub params: serde_json::Value,
}

impl ToolDefinition {
    pub fn new<P: JsonSchema>(name: &str, desc: &str) -> Result<Self> {
        let schema = schema_for!(P);
        let params = serde_json::to_value(&schema.schema)?;
        Ok(Self {
            name: name.to_string(),
            desc: desc.to_string(),
            params,
        })
    }
}

#[derive(Clone, Debug, std::hash::Hash)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub args: String,
}

impl ToolCall {
    pub fn args<O: for<'de> serde::Deserialize<'de>>(&self) -> Result<O> {
        let args = serde_json::from_str(&self.args)?;
        Ok(args)
    }
}

impl std::fmt::Display for ToolCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "-> {}({}) [{}]", self.name, self.args, self.id)
    }
}

#[async_trait]
pub trait Tool {
    fn definition(&self) -> Result<ToolDefinition>;

    async fn invoke(&mut self, args: &ToolCall, messages: Vec<Message>) -> Result<Vec<Message>>;
}

#[async_trait]
pub trait FunctionalTool {
    fn definition(&self) -> Result<ToolDefinition>;

    async fn invoke_fn(&mut self, args: &ToolCall) -> Result<Message>;
}

#[async_trait]
impl<T> Tool for T
where
    T: FunctionalTool + Send + Sync,
{
    fn definition(&self) -> Result<ToolDefinition> {
        FunctionalTool::definition(self)
    }

    async fn invoke(
        &mut self,
        args: &ToolCall,
        mut messages: Vec<Message>,
    ) -> Result<Vec<Message>> {
        let result = FunctionalTool::invoke_fn(self, args).await?;
        messages.push(result);
        Ok(messages)
    }
}

/// A single free-text input.
#[derive(Deserialize, JsonSchema)]
pub struct TextInput {
    /// input for the tool
    pub input: String,
}

/// A tool that maps one string to one string.
#[async_trait]
pub trait TextTool {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    async fn run(&mut self, input: String) -> Result<String>;
}

#[async_trait]
impl<T> FunctionalTool for T
where
    T: TextTool + Send + Sync,
{
    fn definition(&self) -> Result<ToolDefinition> {
        ToolDefinition::new::<TextInput>(self.name(), self.description())
    }

    async fn invoke_fn(&mut self, call: &ToolCall) -> Result<Message> {
        let args: TextInput = call.args()?;
        let result = self.run(args.input).await?;

        Ok(Message::Tool {
            id: call.id.clone(),
            name: self.name().to_string(),
            result,
        })
    }
}
