//! Chat prompt template.
//!
//! A prompt is a system template followed by the chat history, the user
//! query and the agent scratchpad. Template variables are `{name}` tokens in
//! the system template; they are discovered once, when the template is
//! created, so substituted values may contain braces freely.

use crate::llm::Message;
use crate::{Error, Result};
use std::collections::BTreeSet;

#[derive(Clone, Debug, PartialEq)]
enum Segment {
    Text(String),
    Var(String),
}

#[derive(Clone, Debug)]
pub struct ChatPrompt {
    segments: Vec<Segment>,
}

impl ChatPrompt {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            segments: segments(&template.into()),
        }
    }

    /// Fill in a template variable ahead of [`ChatPrompt::format`].
    pub fn partial(mut self, name: &str, value: &str) -> Result<Self> {
        let mut found = false;
        for segment in self.segments.iter_mut() {
            if matches!(segment, Segment::Var(var) if var == name) {
                *segment = Segment::Text(value.to_string());
                found = true;
            }
        }

        if !found {
            return Err(Error::PromptError(format!(
                "template has no variable named {}",
                name
            )));
        }
        Ok(self)
    }

    /// Variables that still need a value.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Var(name) => Some(name.as_str()),
                Segment::Text(_) => None,
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
    }

    pub fn format(
        &self,
        chat_history: &[Message],
        query: &str,
        scratchpad: &[Message],
    ) -> Result<Vec<Message>> {
        let mut system = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => system.push_str(text),
                Segment::Var(_) => {
                    return Err(Error::PromptError(format!(
                        "missing values for template variables: {}",
                        self.variables().collect::<Vec<_>>().join(", ")
                    )));
                }
            }
        }

        let mut messages = Vec::with_capacity(chat_history.len() + scratchpad.len() + 2);
        messages.push(Message::System(system));
        messages.extend(chat_history.iter().cloned());
        messages.push(Message::User(query.to_string()));
        messages.extend(scratchpad.iter().cloned());
        Ok(messages)
    }
}

/// Split a template into literal text and `{name}` slots.
fn segments(template: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut text = String::new();
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        text.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());

        if end > 0 && after[end..].starts_with('}') {
            if !text.is_empty() {
                out.push(Segment::Text(std::mem::take(&mut text)));
            }
            out.push(Segment::Var(after[..end].to_string()));
            rest = &after[end + 1..];
        } else {
            text.push('{');
            rest = after;
        }
    }

    text.push_str(rest);
    if !text.is_empty() {
        out.push(Segment::Text(text));
    }
    out
}
