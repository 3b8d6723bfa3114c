//! Registry of AI tool signatures.

use std::collections::HashSet;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tool name recorded for detections that come from generic patterns.
pub const GENERIC_TOOL: &str = "generic";

/// Problems found while building a signature table.
#[derive(Error, Debug)]
pub enum SignatureError {
    /// Two tools were registered under the same name.
    #[error("Duplicate tool name in signature table: {0}")]
    DuplicateTool(String),

    /// A tool tried to use the generic sentinel as its name.
    #[error("Tool name '{GENERIC_TOOL}' is reserved for generic signatures")]
    ReservedToolName,

    /// A tool was registered without any pattern.
    #[error("Tool '{0}' has no patterns")]
    EmptyTool(String),

    /// A weight is outside `[0, 1]` (or not a number).
    #[error("Weight {weight} for pattern '{pattern}' is outside [0, 1]")]
    WeightOutOfRange {
        /// Offending pattern.
        pattern: String,
        /// Offending weight.
        weight: f64,
    },

    /// A pattern is not a valid regular expression.
    #[error("Invalid pattern '{pattern}'")]
    InvalidPattern {
        /// Offending pattern.
        pattern: String,
        /// Regex compile error.
        #[source]
        source: regex::Error,
    },
}

/// Uncompiled pattern and weight, as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureSpec {
    /// Case-insensitive regular expression.
    pub pattern: String,
    /// Confidence in `[0, 1]` attributed when the pattern matches.
    pub weight: f64,
}

impl From<(&str, f64)> for SignatureSpec {
    fn from((pattern, weight): (&str, f64)) -> Self {
        Self {
            pattern: pattern.to_string(),
            weight,
        }
    }
}

/// A compiled pattern with its weight.
#[derive(Debug, Clone)]
pub struct Signature {
    pattern: String,
    regex: Regex,
    weight: f64,
}

impl Signature {
    /// Compiles a case-insensitive signature, validating its weight.
    pub fn new(pattern: &str, weight: f64) -> Result<Self, SignatureError> {
        if !(0.0..=1.0).contains(&weight) {
            return Err(SignatureError::WeightOutOfRange {
                pattern: pattern.to_string(),
                weight,
            });
        }

        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| SignatureError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            weight,
        })
    }

    /// Returns the pattern source text.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the confidence weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub(crate) fn regex(&self) -> &Regex {
        &self.regex
    }
}

/// The ordered signatures belonging to one tool.
#[derive(Debug, Clone)]
pub struct ToolSignatures {
    name: String,
    signatures: Vec<Signature>,
}

impl ToolSignatures {
    /// Returns the tool's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the tool's signatures in registration order.
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }
}

/// Immutable registry of tool-specific and generic signatures.
///
/// Built once, validated, then handed to the
/// [`Classifier`](super::Classifier). Adding tools or patterns only touches
/// the builder.
#[derive(Debug, Clone)]
pub struct SignatureTable {
    tools: Vec<ToolSignatures>,
    generic: Vec<Signature>,
}

impl SignatureTable {
    /// Starts an empty builder.
    pub fn builder() -> SignatureTableBuilder {
        SignatureTableBuilder::default()
    }

    /// Returns the built-in table.
    #[allow(clippy::expect_used)]
    pub fn builtin() -> Self {
        SignatureTableBuilder::with_builtin()
            .build()
            .expect("built-in signature table is valid")
    }

    /// Returns the signatures for `tool`, or an empty slice for unknown tools.
    pub fn patterns_for(&self, tool: &str) -> &[Signature] {
        self.tools
            .iter()
            .find(|t| t.name == tool)
            .map_or(&[], |t| t.signatures.as_slice())
    }

    /// Returns the generic signatures in registration order.
    pub fn generic(&self) -> &[Signature] {
        &self.generic
    }

    /// Iterates over the tools in registration order.
    pub fn tools(&self) -> impl Iterator<Item = &ToolSignatures> {
        self.tools.iter()
    }

    /// Number of registered tools.
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }
}

impl Default for SignatureTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Accumulates signature definitions and validates them in [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct SignatureTableBuilder {
    tools: Vec<(String, Vec<SignatureSpec>)>,
    generic: Vec<SignatureSpec>,
}

impl SignatureTableBuilder {
    /// Starts a builder pre-populated with the built-in signatures.
    pub fn with_builtin() -> Self {
        let mut builder = Self::default();
        for (tool, patterns) in BUILTIN_TOOLS {
            builder = builder.tool(*tool, patterns.iter().copied());
        }
        builder.generic_all(BUILTIN_GENERIC.iter().copied())
    }

    /// Registers a new tool. Registering the same name twice fails at build time.
    #[must_use]
    pub fn tool<I, S>(mut self, name: impl Into<String>, signatures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SignatureSpec>,
    {
        self.tools.push((
            name.into(),
            signatures.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Appends signatures to an already registered tool, or registers it.
    #[must_use]
    pub fn extend_tool<I, S>(mut self, name: &str, signatures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SignatureSpec>,
    {
        match self.tools.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => existing.extend(signatures.into_iter().map(Into::into)),
            None => {
                return self.tool(name, signatures);
            }
        }
        self
    }

    /// Adds one generic signature.
    #[must_use]
    pub fn generic(mut self, signature: impl Into<SignatureSpec>) -> Self {
        self.generic.push(signature.into());
        self
    }

    /// Adds several generic signatures.
    #[must_use]
    pub fn generic_all<I, S>(mut self, signatures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SignatureSpec>,
    {
        self.generic.extend(signatures.into_iter().map(Into::into));
        self
    }

    /// Compiles and validates every signature.
    pub fn build(self) -> Result<SignatureTable, SignatureError> {
        let mut seen = HashSet::new();
        let mut tools = Vec::with_capacity(self.tools.len());

        for (name, specs) in self.tools {
            if name.eq_ignore_ascii_case(GENERIC_TOOL) {
                return Err(SignatureError::ReservedToolName);
            }
            if !seen.insert(name.clone()) {
                return Err(SignatureError::DuplicateTool(name));
            }
            if specs.is_empty() {
                return Err(SignatureError::EmptyTool(name));
            }
            let signatures = compile(&specs)?;
            tools.push(ToolSignatures { name, signatures });
        }

        let generic = compile(&self.generic)?;

        Ok(SignatureTable { tools, generic })
    }
}

fn compile(specs: &[SignatureSpec]) -> Result<Vec<Signature>, SignatureError> {
    specs
        .iter()
        .map(|spec| Signature::new(&spec.pattern, spec.weight))
        .collect()
}

type PatternList = &'static [(&'static str, f64)];

// Trailer patterns outrank bare mentions of the same tool.
const BUILTIN_TOOLS: &[(&str, PatternList)] = &[
    (
        "GitHub Copilot",
        &[
            (r"co-authored-by:.*copilot", 0.95),
            (r"github\s*copilot", 0.9),
            (r"generated\s*by\s*copilot", 0.9),
            (r"copilot", 0.9),
        ],
    ),
    ("Windsurf", &[(r"windsurf", 0.9)]),
    ("Codeium", &[(r"codeium", 0.9)]),
    ("Cascade", &[(r"cascade", 0.7)]),
    ("Cursor", &[(r"\bcursor\b", 0.8)]),
    (
        "ChatGPT",
        &[(r"chatgpt", 0.85), (r"gpt-?4", 0.8), (r"gpt-?3", 0.8)],
    ),
    (
        "Claude",
        &[
            (r"co-authored-by:.*claude", 0.95),
            (r"claude", 0.85),
            (r"anthropic", 0.8),
        ],
    ),
    ("Devin", &[(r"\bdevin\b", 0.9)]),
    ("Amazon Q", &[(r"amazon\s*q\b", 0.9)]),
    ("Tabnine", &[(r"tabnine", 0.9)]),
    ("Cody", &[(r"\bcody\b", 0.8)]),
    ("OpenAI Codex", &[(r"codex", 0.8)]),
];

const BUILTIN_GENERIC: &[(&str, f64)] = &[
    (r"\bai[\s-]*generated", 0.5),
    (r"\bai[\s-]*assisted", 0.5),
    (r"auto[\s-]*generated", 0.3),
    (r"machine[\s-]*generated", 0.4),
    (r"llm[\s-]*generated", 0.6),
    (r"gpt[\s-]*generated", 0.6),
];
