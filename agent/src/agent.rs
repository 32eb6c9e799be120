use crate::callbacks;
use crate::llm;
use crate::prompt::ChatPrompt;
use crate::tools;
use crate::transcript::Transcript;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

const DEFAULT_MAX_ITERATIONS: usize = 15;

const ITERATION_LIMIT_OUTPUT: &str = "Agent stopped due to iteration limit or time limit.";

pub trait StopCondition {
    fn done(&self, history: &[llm::Message]) -> bool;
}

/// Stops once the model answers without asking for a tool.
pub struct FinalAnswer;

impl StopCondition for FinalAnswer {
    fn done(&self, history: &[llm::Message]) -> bool {
        matches!(history.last(), Some(llm::Message::Assistant(_, calls)) if calls.is_empty())
    }
}

type Tool = Box<dyn tools::Tool + Send>;
type Callback = Box<dyn callbacks::Callback + Send>;

pub struct Agent {
    llm: Arc<dyn llm::LLM + Send + Sync>,
    prompt: ChatPrompt,
    tools: HashMap<String, Tool>,
    callbacks: Vec<Callback>,
    tool_defs: Vec<tools::ToolDefinition>,
    stop_condition: Box<dyn StopCondition + Send>,
    max_iterations: usize,
}

impl Agent {
    async fn execute_tool_call(
        &mut self,
        tool_call: &tools::ToolCall,
        messages: Vec<llm::Message>,
    ) -> Result<Vec<llm::Message>> {
        let tool = self
            .tools
            .get_mut(&tool_call.name)
            .ok_or(Error::ToolDoesNotExist(tool_call.name.clone()))?;

        debug!(tool = %tool_call.name, id = %tool_call.id, "executing tool call");
        let messages = tool.invoke(tool_call, messages).await?;

        Ok(messages)
    }

    pub async fn run(&mut self, query: &str) -> Result<Transcript> {
        let mut messages = self.prompt.format(&[], query, &[])?;
        let prompt_len = messages.len();
        let mut iterations = 0;

        while !self.stop_condition.done(&messages) {
            if iterations >= self.max_iterations {
                warn!(iterations, "agent reached its iteration limit");
                messages.push(llm::Message::Assistant(
                    ITERATION_LIMIT_OUTPUT.to_string(),
                    vec![],
                ));
                break;
            }
            iterations += 1;

            let next = self
                .llm
                .completion(llm::CompletionRequest {
                    messages: &messages,
                    tools: &self.tool_defs,
                })
                .await?;

            messages.push(llm::Message::Assistant(
                next.content,
                next.tool_calls.clone(),
            ));

            for tool_call in &next.tool_calls {
                messages = self.execute_tool_call(tool_call, messages).await?;
            }

            for callback in &mut self.callbacks {
                messages = callback.call(messages).await?;
            }
        }

        Ok(Transcript::new(
            query.to_string(),
            messages,
            prompt_len,
            iterations,
        ))
    }
}

pub struct AgentBuilder {
    llm: Option<Arc<dyn llm::LLM + Send + Sync>>,
    prompt: Option<ChatPrompt>,
    tools: Vec<Tool>,
    callbacks: Vec<Callback>,
    stop_condition: Option<Box<dyn StopCondition + Send>>,
    max_iterations: usize,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            llm: None,
            prompt: None,
            tools: Vec::new(),
            callbacks: Vec::new(),
            stop_condition: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn llm(mut self, llm: Arc<dyn llm::LLM + Send + Sync>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn prompt(mut self, prompt: ChatPrompt) -> Self {
        self.prompt = Some(prompt);
        self
    }

    pub fn tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn callback(mut self, callback: Callback) -> Self {
        self.callbacks.push(callback);
        self
    }

    /// Defaults to [`FinalAnswer`].
    pub fn stop_condition(mut self, cond: Box<dyn StopCondition + Send>) -> Self {
        self.stop_condition = Some(cond);
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let mut tool_defs = Vec::new();
        let mut tools = HashMap::new();

        for tool in self.tools {
            let def = tool.definition()?;
            if tools.contains_key(&def.name) {
                return Err(Error::DuplicateTool(def.name));
            }
            tools.insert(def.name.clone(), tool);
            tool_defs.push(def);
        }

        Ok(Agent {
            llm: self
                .llm
                .ok_or(Error::MissingArg("llm is required for agent".to_string()))?,
            prompt: self
                .prompt
                .ok_or(Error::MissingArg("prompt is required for agent".to_string()))?,
            tools,
            tool_defs,
            callbacks: self.callbacks,
            stop_condition: self.stop_condition.unwrap_or(Box::new(FinalAnswer)),
            max_iterations: self.max_iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::llm::{CompletionRequest, CompletionResponse, LLM, Message};
    use crate::prompt::ChatPrompt;
    use crate::tools::{FunctionalTool, ToolCall, ToolDefinition};
    use crate::{AgentBuilder, Error, Result};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct MockLLM;

    #[async_trait]
    impl LLM for MockLLM {
        async fn completion<'a>(
            &self,
            request: CompletionRequest<'a>,
        ) -> Result<CompletionResponse> {
            assert_eq!(request.tools.len(), 1);
            match request.messages.last() {
                Some(Message::User(_)) => Ok(CompletionResponse {
                    content: String::new(),
                    tool_calls: vec![ToolCall {
                        id: "call1".to_string(),
                        name: "double".to_string(),
                        args: "{\"arg\":123}".to_string(),
                    }],
                }),
                Some(Message::Tool { .. }) => Ok(CompletionResponse {
                    content: "completed".to_string(),
                    tool_calls: vec![],
                }),
                _ => panic!("unexpected message sequence"),
            }
        }
    }

    /// Never stops asking for tools.
    struct LoopingLLM;

    #[async_trait]
    impl LLM for LoopingLLM {
        async fn completion<'a>(&self, _: CompletionRequest<'a>) -> Result<CompletionResponse> {
            Ok(CompletionResponse {
                content: String::new(),
                tool_calls: vec![ToolCall {
                    id: "again".to_string(),
                    name: "double".to_string(),
                    args: "{\"arg\":1}".to_string(),
                }],
            })
        }
    }

    struct UnknownToolLLM;

    #[async_trait]
    impl LLM for UnknownToolLLM {
        async fn completion<'a>(&self, _: CompletionRequest<'a>) -> Result<CompletionResponse> {
            Ok(CompletionResponse {
                content: String::new(),
                tool_calls: vec![ToolCall {
                    id: "x".to_string(),
                    name: "triple".to_string(),
                    args: "{}".to_string(),
                }],
            })
        }
    }

    struct FailingLLM;

    #[async_trait]
    impl LLM for FailingLLM {
        async fn completion<'a>(&self, _: CompletionRequest<'a>) -> Result<CompletionResponse> {
            Err(Error::LLMResponseError("rate limited".to_string()))
        }
    }

    struct DoubleTool;

    #[derive(serde::Deserialize, schemars::JsonSchema)]
    struct DoubleArgs {
        arg: i32,
    }

    #[async_trait]
    impl FunctionalTool for DoubleTool {
        fn definition(&self) -> Result<ToolDefinition> {
            ToolDefinition::new::<DoubleArgs>("double", "double")
        }

        async fn invoke_fn(&mut self, tool_call: &ToolCall) -> Result<Message> {
            let args: DoubleArgs = tool_call.args()?;
            Ok(Message::Tool {
                id: tool_call.id.clone(),
                name: "double".to_string(),
                result: format!("2 * {} = {}", args.arg, 2 * args.arg),
            })
        }
    }

    fn prompt() -> ChatPrompt {
        ChatPrompt::new("you are a calculator")
    }

    #[tokio::test]
    async fn test_agent() -> Result<()> {
        let mut agent = AgentBuilder::new()
            .llm(Arc::new(MockLLM))
            .prompt(prompt())
            .tool(Box::new(DoubleTool))
            .build()?;

        let transcript = agent.run("do stuff").await?;
        let history = transcript.messages();

        assert_eq!(history.len(), 5);

        assert!(matches!(&history[0], Message::System (content) if content == "you are a calculator"));
        assert!(matches!(&history[1], Message::User (content) if content == "do stuff"));
        assert!(matches!(&history[2], Message::Assistant (_, tool_calls) if tool_calls.len() == 1));
        assert!(matches!(&history[3], Message::Tool {  result,.. } if result == "2 * 123 = 246"));
        assert!(matches!(&history[4], Message::Assistant (content, _) if content== "completed"));

        assert_eq!(transcript.iterations(), 2);
        assert_eq!(transcript.output(), Some("completed"));
        assert_eq!(transcript.tools_invoked(), vec!["double"]);

        Ok(())
    }

    #[tokio::test]
    async fn test_agent_iteration_limit() -> Result<()> {
        let mut agent = AgentBuilder::new()
            .llm(Arc::new(LoopingLLM))
            .prompt(prompt())
            .tool(Box::new(DoubleTool))
            .max_iterations(3)
            .build()?;

        let transcript = agent.run("loop").await?;

        assert_eq!(transcript.iterations(), 3);
        assert_eq!(transcript.tools_invoked().len(), 3);
        assert_eq!(
            transcript.output(),
            Some("Agent stopped due to iteration limit or time limit.")
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_agent_unknown_tool() -> Result<()> {
        let mut agent = AgentBuilder::new()
            .llm(Arc::new(UnknownToolLLM))
            .prompt(prompt())
            .tool(Box::new(DoubleTool))
            .build()?;

        let err = agent.run("triple 2").await.unwrap_err();
        assert!(matches!(err, Error::ToolDoesNotExist(name) if name == "triple"));

        Ok(())
    }

    #[tokio::test]
    async fn test_agent_llm_failure_propagates() -> Result<()> {
        let mut agent = AgentBuilder::new()
            .llm(Arc::new(FailingLLM))
            .prompt(prompt())
            .build()?;

        assert!(matches!(
            agent.run("anything").await,
            Err(Error::LLMResponseError(_))
        ));

        Ok(())
    }

    #[test]
    fn test_builder_requirements() {
        assert!(matches!(
            AgentBuilder::new().prompt(prompt()).build(),
            Err(Error::MissingArg(_))
        ));
        assert!(matches!(
            AgentBuilder::new().llm(Arc::new(MockLLM)).build(),
            Err(Error::MissingArg(_))
        ));
        assert!(matches!(
            AgentBuilder::new()
                .llm(Arc::new(MockLLM))
                .prompt(prompt())
                .tool(Box::new(DoubleTool))
                .tool(Box::new(DoubleTool))
                .build(),
            Err(Error::DuplicateTool(name)) if name == "double"
        ));
    }
}
