use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A finished piece of research. Every field is required.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ResearchResponse {
    pub topic: String,
    pub summary: String,
    pub sources: Vec<String>,
    pub tools_used: Vec<String>,
}

impl std::fmt::Display for ResearchResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Topic: {}", self.topic)?;
        writeln!(f, "Summary: {}", self.summary)?;
        writeln!(f, "Sources:")?;
        self.sources
            .iter()
            .try_for_each(|source| writeln!(f, "  - {}", source))?;
        write!(f, "Tools used: {}", self.tools_used.join(", "))
    }
}
