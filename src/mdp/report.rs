//! Plain-text rendering of a [`Solution`].

use std::fmt::Write;

use super::solver::Solution;

/// Renders a solution in the classic layout: the round count, one
/// `node -> choice` line per decision, a blank line, then every
/// `node=value` on one line.
///
/// ```text
/// Iterations: 2
/// S -> Publish
///
/// Against=0 Consult=-500 Failure=-10000 For=-5500 Publish=2000 ...
/// ```
pub fn render(solution: &Solution) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "Iterations: {}", solution.rounds());
    for (node, choice) in solution.policy() {
        let _ = writeln!(out, "{} -> {}", node, choice);
    }
    out.push('\n');

    let values: Vec<String> = solution
        .values()
        .iter()
        .map(|(node, value)| format!("{}={}", node, format_value(*value)))
        .collect();
    out.push_str(&values.join(" "));
    out.push('\n');

    if !solution.is_converged() {
        let _ = writeln!(
            out,
            "did not converge after {} rounds",
            solution.rounds()
        );
    }
    out
}

/// Formats a value with at most three decimals and no trailing zeros.
pub fn format_value(value: f64) -> String {
    let rounded = format!("{:.3}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" => "0".to_string(),
        s => s.to_string(),
    }
}
