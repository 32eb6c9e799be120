//! Schema directed parsing of model output.
//!
//! [`OutputParser`] advertises the JSON schema of `T` to the model through
//! [`OutputParser::format_instructions`] and later validates the model's
//! answer against the same type. Parsing never repairs or defaults missing
//! data: the answer either deserializes into a complete `T` or the error
//! carries the text that was rejected.

use crate::Transcript;
use schemars::{JsonSchema, schema_for};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use thiserror::Error;

const FORMAT_INSTRUCTIONS: &str = r#"The output should be formatted as a JSON instance that conforms to the JSON schema below.

As an example, for the schema {"properties": {"foo": {"title": "Foo", "description": "a list of strings", "type": "array", "items": {"type": "string"}}}, "required": ["foo"]}
the object {"foo": ["bar", "baz"]} is a well-formatted instance of the schema. The object {"properties": {"foo": ["bar", "baz"]}} is not well-formatted.

Here is the output schema:
```
{schema}
```"#;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("agent produced no final answer")]
    NoOutput,

    #[error("invalid output: {source}")]
    Invalid {
        source: serde_json::Error,
        text: String,
    },
}

impl ParseError {
    /// The text that failed to parse, if there was any.
    pub fn text(&self) -> Option<&str> {
        match self {
            ParseError::NoOutput => None,
            ParseError::Invalid { text, .. } => Some(text),
        }
    }
}

pub struct OutputParser<T> {
    _target: PhantomData<fn() -> T>,
}

impl<T> Default for OutputParser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OutputParser<T> {
    pub fn new() -> Self {
        Self {
            _target: PhantomData,
        }
    }
}

impl<T> OutputParser<T>
where
    T: JsonSchema + DeserializeOwned,
{
    pub fn format_instructions(&self) -> crate::Result<String> {
        let schema = serde_json::to_string(&schema_for!(T).schema)?;
        Ok(FORMAT_INSTRUCTIONS.replace("{schema}", &schema))
    }

    /// Parse the text as-is first; strip a code fence only if that fails.
    pub fn parse(&self, text: &str) -> Result<T, ParseError> {
        serde_json::from_str(text.trim())
            .or_else(|_| serde_json::from_str(extract_json(text)))
            .map_err(|source| ParseError::Invalid {
                source,
                text: text.to_string(),
            })
    }

    /// Parse the final answer of an agent run.
    pub fn parse_transcript(&self, transcript: &Transcript) -> Result<T, ParseError> {
        transcript
            .output()
            .ok_or(ParseError::NoOutput)
            .and_then(|text| self.parse(text))
    }
}

/// Strip a surrounding markdown code fence, if the text has one.
fn extract_json(text: &str) -> &str {
    let text = text.trim();

    let Some(start) = text.find("```") else {
        return text;
    };

    let body = &text[start + 3..];
    // drop the language tag, e.g. ```json
    let body = match body.find('\n') {
        Some(nl)
            if body[..nl]
                .trim_end_matches('\r')
                .chars()
                .all(|c| c.is_ascii_alphanumeric()) =>
        {
            &body[nl + 1..]
        }
        _ => body,
    };

    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}
