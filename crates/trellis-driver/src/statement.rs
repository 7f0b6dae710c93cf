//! Parameterized statements sent to the back-end.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use trellis_core::Value;

/// A query statement: opaque text plus named parameters.
///
/// The session layer composes statement text from templates; the driver is
/// responsible for shipping it to the back-end verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    text: String,
    parameters: HashMap<String, Value>,
}

impl Statement {
    /// Create a statement with no parameters.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), parameters: HashMap::new() }
    }

    /// Create a statement with the given parameter map.
    #[must_use]
    pub fn with_parameters(text: impl Into<String>, parameters: HashMap<String, Value>) -> Self {
        Self { text: text.into(), parameters }
    }

    /// Add a named parameter.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// The statement text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// All named parameters.
    #[must_use]
    pub fn parameters(&self) -> &HashMap<String, Value> {
        &self.parameters
    }

    /// Look up a single parameter by name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parameters.is_empty() {
            return f.write_str(&self.text);
        }
        // parameter names sorted for a stable log line
        let mut names: Vec<&str> = self.parameters.keys().map(String::as_str).collect();
        names.sort_unstable();
        write!(f, "{} [{}]", self.text, names.join(", "))
    }
}
