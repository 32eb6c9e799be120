use crate::llm::Message;

/// Everything one agent run produced: the rendered prompt followed by the
/// assistant messages and tool results appended while the agent worked.
#[derive(Clone, Debug)]
pub struct Transcript {
    query: String,
    messages: Vec<Message>,
    prompt_len: usize,
    iterations: usize,
}

impl Transcript {
    pub(crate) fn new(
        query: String,
        messages: Vec<Message>,
        prompt_len: usize,
        iterations: usize,
    ) -> Self {
        Self {
            query,
            messages,
            prompt_len,
            iterations,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages produced after the prompt.
    pub fn steps(&self) -> &[Message] {
        &self.messages[self.prompt_len.min(self.messages.len())..]
    }

    /// Number of completions requested.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Text of the final assistant message, if it has any.
    pub fn output(&self) -> Option<&str> {
        self.steps()
            .iter()
            .rev()
            .find_map(|m| match m {
                Message::Assistant(content, _) => Some(content.as_str()),
                _ => None,
            })
            .filter(|content| !content.trim().is_empty())
    }

    /// Names of the tools that were called, in call order.
    pub fn tools_invoked(&self) -> Vec<&str> {
        self.steps()
            .iter()
            .filter_map(|m| match m {
                Message::Tool { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl std::fmt::Display for Transcript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "query: {}", self.query)?;
        self.steps().iter().try_for_each(|m| write!(f, "{}", m))
    }
}
