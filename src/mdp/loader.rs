//! Reads the line-oriented model format into a [`Graph`].
//!
//! ```text
//! # comment
//! S : [Reject, Publish, Consult]    successors, in order
//! Publish % 0.2 0.8                 chance distribution (one per successor)
//! S % 0.9                           decision slip probability
//! Success=50000                     reward
//! ```
//!
//! A line containing `=` is a reward, otherwise one containing `%` is a
//! probability list, otherwise one containing `:` is an edge list. Malformed
//! lines are reported as [`Diagnostic`]s and skipped; loading never fails on
//! content.

use std::fs;
use std::path::Path;

use log::{debug, warn};

use super::diagnostic::{Diagnostic, DiagnosticKind};
use super::graph::{check_probabilities, Graph};
use crate::error::{Error, Result};

/// A parsed model, possibly incomplete, plus everything that was wrong with it.
#[derive(Debug, Clone, Default)]
pub struct LoadedModel {
    pub graph: Graph,
    pub diagnostics: Vec<Diagnostic>,
}

impl LoadedModel {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Reads and parses a model file. Only I/O problems are errors.
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<LoadedModel> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("read {} bytes from {}", text.len(), path.display());
    Ok(parse_model(&text))
}

/// Parses model text. Every malformed line yields one diagnostic and
/// contributes nothing to the graph.
pub fn parse_model(text: &str) -> LoadedModel {
    let mut model = LoadedModel::default();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let number = index + 1;
        let outcome = parse_declaration(line).map(|d| apply(&mut model.graph, d));
        let problem = match outcome {
            Ok(note) => note,
            Err(kind) => Some(kind),
        };
        if let Some(kind) = problem {
            let diagnostic = Diagnostic::at_line(number, line, kind);
            warn!("{}", diagnostic);
            model.diagnostics.push(diagnostic);
        }
    }

    debug!(
        "parsed {} nodes with {} diagnostics",
        model.graph.len(),
        model.diagnostics.len()
    );
    model
}

#[derive(Debug, Clone, PartialEq)]
enum Declaration<'a> {
    Reward(&'a str, f64),
    Probabilities(&'a str, Vec<f64>),
    Successors(&'a str, Vec<&'a str>),
}

fn parse_declaration(line: &str) -> std::result::Result<Declaration<'_>, DiagnosticKind> {
    if let Some((name, value)) = line.split_once('=') {
        let name = node_name(name)?;
        return Ok(Declaration::Reward(name, parse_number(value)?));
    }

    if let Some((name, list)) = line.split_once('%') {
        let name = node_name(name)?;
        let probabilities = list
            .split_whitespace()
            .map(parse_number)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        check_probabilities(&probabilities)?;
        return Ok(Declaration::Probabilities(name, probabilities));
    }

    if let Some((name, list)) = line.split_once(':') {
        let name = node_name(name)?;
        let inner = list
            .trim()
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or(DiagnosticKind::MissingBrackets)?
            .trim();
        if inner.is_empty() {
            return Ok(Declaration::Successors(name, Vec::new()));
        }
        let successors = inner
            .split(',')
            .map(|s| match s.trim() {
                "" => Err(DiagnosticKind::EmptySuccessorName),
                s => Ok(s),
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        return Ok(Declaration::Successors(name, successors));
    }

    Err(DiagnosticKind::UnrecognizedLine)
}

/// Applies a well-formed declaration. Returns a note for declarations that
/// are accepted but worth reporting.
fn apply(graph: &mut Graph, declaration: Declaration<'_>) -> Option<DiagnosticKind> {
    match declaration {
        Declaration::Reward(name, reward) => {
            graph.set_reward(name, reward);
            None
        }
        Declaration::Probabilities(name, probabilities) => graph
            .set_probabilities(name, probabilities)
            .map(|_| DiagnosticKind::ProbabilitiesRedeclared),
        Declaration::Successors(name, successors) => {
            graph.add_successors(name, successors);
            None
        }
    }
}

fn node_name(raw: &str) -> std::result::Result<&str, DiagnosticKind> {
    match raw.trim() {
        "" => Err(DiagnosticKind::EmptyNodeName),
        name => Ok(name),
    }
}

fn parse_number(raw: &str) -> std::result::Result<f64, DiagnosticKind> {
    let token = raw.trim();
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(DiagnosticKind::InvalidNumber(token.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn kinds(model: &LoadedModel) -> Vec<DiagnosticKind> {
        model.diagnostics.iter().map(|d| d.kind.clone()).collect()
    }

    #[test]
    fn test_parses_all_three_shapes() {
        let model = parse_model(
            "# a comment\n\
             \n\
             S : [A, B]\n\
             S % 0.9\n\
             A : [X, Y]\n\
             A % 0.25 0.75\n\
             X=10\n\
             Y = -2.5\n",
        );
        assert!(model.is_clean(), "{:?}", model.diagnostics);

        let graph = &model.graph;
        assert_eq!(graph.len(), 5);
        assert_eq!(graph.get("S").unwrap().probabilities(), Some(&[0.9][..]));
        assert_eq!(
            graph.get("A").unwrap().probabilities(),
            Some(&[0.25, 0.75][..])
        );
        assert_eq!(graph.get("X").unwrap().reward(), Some(10.0));
        assert_eq!(graph.get("Y").unwrap().reward(), Some(-2.5));
        assert_eq!(graph.get("B").unwrap().reward(), None);
        assert!(!graph.get("B").unwrap().is_declared());
    }

    #[test]
    fn test_names_and_successors_are_trimmed() {
        let model = parse_model("   Start   :   [  Left ,Right  ]   \n");
        assert!(model.is_clean());
        let start = model.graph.get("Start").unwrap();
        let names: Vec<&str> = start
            .successors()
            .iter()
            .map(|&id| model.graph.node(id).name())
            .collect();
        assert_eq!(names, vec!["Left", "Right"]);
    }

    #[test]
    fn test_empty_brackets_declare_a_terminal() {
        let model = parse_model("End : []\n");
        assert!(model.is_clean());
        let end = model.graph.get("End").unwrap();
        assert!(end.is_declared());
        assert!(end.is_terminal());
    }

    #[test]
    fn test_malformed_lines_are_reported_and_skipped() {
        let model = parse_model(
            "A : B, C\n\
             B=abc\n\
             C % 0.5 x\n\
             D % 0.5 0.4\n\
             E % 1.5\n\
             F : [G,,H]\n\
             =3\n\
             just some words\n\
             Ok=1\n",
        );

        assert_eq!(
            kinds(&model),
            vec![
                DiagnosticKind::MissingBrackets,
                DiagnosticKind::InvalidNumber("abc".to_string()),
                DiagnosticKind::InvalidNumber("x".to_string()),
                DiagnosticKind::ProbabilitySum(0.5 + 0.4),
                DiagnosticKind::ProbabilityOutOfRange(1.5),
                DiagnosticKind::EmptySuccessorName,
                DiagnosticKind::EmptyNodeName,
                DiagnosticKind::UnrecognizedLine,
            ]
        );
        let lines: Vec<Option<usize>> = model.diagnostics.iter().map(|d| d.line).collect();
        assert_eq!(lines, (1..=8).map(Some).collect::<Vec<_>>());

        // Only the last line contributed to the graph.
        assert_eq!(model.graph.len(), 1);
        assert_eq!(model.graph.get("Ok").unwrap().reward(), Some(1.0));
    }

    #[test]
    fn test_non_finite_numbers_are_rejected() {
        let model = parse_model("A=inf\nB=NaN\n");
        assert_eq!(
            kinds(&model),
            vec![
                DiagnosticKind::InvalidNumber("inf".to_string()),
                DiagnosticKind::InvalidNumber("NaN".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_probability_list() {
        let model = parse_model("A %\n");
        assert_eq!(kinds(&model), vec![DiagnosticKind::EmptyProbabilities]);
    }

    #[test]
    fn test_shape_precedence() {
        // '=' wins over '%', which wins over ':'
        let model = parse_model("A=0.5 % 0.5\nB % 0.5 : [C]\n");
        assert_eq!(
            kinds(&model),
            vec![
                DiagnosticKind::InvalidNumber("0.5 % 0.5".to_string()),
                DiagnosticKind::InvalidNumber(":".to_string()),
            ]
        );
        assert!(model.graph.is_empty());
    }

    #[test]
    fn test_redeclared_probabilities_replace_and_warn() {
        let model = parse_model("A % 0.9\nA % 0.6\n");
        assert_eq!(kinds(&model), vec![DiagnosticKind::ProbabilitiesRedeclared]);
        assert_eq!(model.diagnostics[0].line, Some(2));
        assert_eq!(
            model.graph.get("A").unwrap().probabilities(),
            Some(&[0.6][..])
        );
    }

    #[test]
    fn test_repeated_edge_lines_append() {
        let model = parse_model("A : [B]\nA : [C]\n");
        assert!(model.is_clean());
        assert_eq!(model.graph.get("A").unwrap().successors().len(), 2);
    }

    #[test]
    fn test_tolerant_probability_sum() {
        let model = parse_model("A % 0.1 0.2 0.3 0.4\n");
        assert!(model.is_clean(), "{:?}", model.diagnostics);
    }

    #[test]
    fn test_load_model_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "S : [A, B]").unwrap();
        writeln!(file, "A=1").unwrap();
        writeln!(file, "B=2").unwrap();

        let model = load_model(file.path()).unwrap();
        assert!(model.is_clean());
        assert_eq!(model.graph.len(), 3);
    }

    #[test]
    fn test_load_model_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        match load_model(&missing) {
            Err(Error::Io { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected an I/O error, got {:?}", other),
        }
    }
}
