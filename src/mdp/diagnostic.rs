use std::fmt;

/// What went wrong with a declaration or a node.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticKind {
    /// The line matched none of the reward, probability or edge shapes.
    UnrecognizedLine,
    EmptyNodeName,
    /// An edge list was not wrapped in `[` and `]`.
    MissingBrackets,
    EmptySuccessorName,
    InvalidNumber(String),
    EmptyProbabilities,
    ProbabilityOutOfRange(f64),
    ProbabilitySum(f64),
    /// A second probability line for the same node replaced the first.
    ProbabilitiesRedeclared,
    /// A distribution whose length differs from the successor count.
    DistributionLengthMismatch { successors: usize, weights: usize },
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::UnrecognizedLine => {
                write!(f, "expected `NODE=NUMBER`, `NODE % P...` or `NODE : [...]`")
            }
            DiagnosticKind::EmptyNodeName => write!(f, "missing node name"),
            DiagnosticKind::MissingBrackets => {
                write!(f, "successor list must be enclosed in `[` and `]`")
            }
            DiagnosticKind::EmptySuccessorName => write!(f, "empty successor name"),
            DiagnosticKind::InvalidNumber(token) => write!(f, "`{}` is not a number", token),
            DiagnosticKind::EmptyProbabilities => write!(f, "no probabilities given"),
            DiagnosticKind::ProbabilityOutOfRange(p) => {
                write!(f, "probability {} is outside [0, 1]", p)
            }
            DiagnosticKind::ProbabilitySum(sum) => {
                write!(f, "probabilities must sum to 1, got {}", sum)
            }
            DiagnosticKind::ProbabilitiesRedeclared => {
                write!(f, "probabilities redeclared, earlier entry replaced")
            }
            DiagnosticKind::DistributionLengthMismatch {
                successors,
                weights,
            } => write!(
                f,
                "{} probabilities for {} successors, treating as a decision node",
                weights, successors
            ),
        }
    }
}

/// A non-fatal problem found while loading or classifying a model.
///
/// `line` is the 1-based line number for problems found by the loader and
/// `None` for structural problems found later. `subject` is the offending
/// line text or node name respectively.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub line: Option<usize>,
    pub subject: String,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn at_line(line: usize, text: impl Into<String>, kind: DiagnosticKind) -> Self {
        Self {
            line: Some(line),
            subject: text.into(),
            kind,
        }
    }

    pub fn for_node(name: impl Into<String>, kind: DiagnosticKind) -> Self {
        Self {
            line: None,
            subject: name.into(),
            kind,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {} in `{}`", line, self.kind, self.subject),
            None => write!(f, "node `{}`: {}", self.subject, self.kind),
        }
    }
}
