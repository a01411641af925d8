//! Classification and seeding that runs once before policy iteration.

use log::{debug, warn};

use super::diagnostic::{Diagnostic, DiagnosticKind};
use super::graph::{check_probabilities, Graph, NodeId, Transition};
use super::policy::{greedy_successor, Objective};

/// Prepares a freshly built graph for solving.
///
/// 1. Every node is classified as terminal, decision or chance. Nodes with
///    successors but no usable probability entry become decision nodes that
///    never slip.
/// 2. Terminal values are pinned to their reward; every other value starts
///    at 0. Rewards of non-terminal nodes are added during evaluation.
/// 3. Each decision node initially points at the successor with the best
///    *reward*, since values carry no information yet.
///
/// Problems with probability entries degrade the node and are returned as
/// diagnostics. Nothing here is fatal.
pub fn initialize(graph: &mut Graph, objective: Objective) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let order = graph.sweep_order();

    for &id in &order {
        let (transition, problem) = classify(graph, id);
        let node = graph.node_mut(id);
        if let Some(kind) = problem {
            let diagnostic = Diagnostic::for_node(node.name(), kind);
            warn!("{}", diagnostic);
            diagnostics.push(diagnostic);
        }
        node.set_transition(transition);
    }

    for &id in &order {
        let node = graph.node(id);
        let value = if node.is_terminal() {
            if !node.is_declared() {
                debug!(
                    "`{}` is never declared, treating it as a terminal worth 0",
                    node.name()
                );
            }
            node.reward_or_zero()
        } else {
            0.0
        };
        graph.node_mut(id).set_value(value);
    }

    for &id in &order {
        let node = graph.node(id);
        let choice = if node.is_decision() {
            greedy_successor(node.successors(), objective, |s| {
                graph.node(s).reward_or_zero()
            })
        } else {
            None
        };
        graph.node_mut(id).set_policy(choice);
    }

    diagnostics
}

fn classify(graph: &Graph, id: NodeId) -> (Transition, Option<DiagnosticKind>) {
    let node = graph.node(id);
    let successors = node.successors().len();
    if successors == 0 {
        return (Transition::Terminal, None);
    }
    let no_slip = Transition::Decision { slip: 1.0 };

    let probabilities = match node.probabilities() {
        None => return (no_slip, None),
        Some(p) => p,
    };
    if let Err(kind) = check_probabilities(probabilities) {
        return (no_slip, Some(kind));
    }

    match probabilities {
        [slip] => (Transition::Decision { slip: *slip }, None),
        weights if weights.len() == successors => (
            Transition::Chance {
                weights: weights.to_vec(),
            },
            None,
        ),
        weights => (
            no_slip,
            Some(DiagnosticKind::DistributionLengthMismatch {
                successors,
                weights: weights.len(),
            }),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let mut graph = Graph::new();
        graph.add_successors("D", ["T1", "T2"]);
        graph.set_probabilities("D", vec![0.8]);
        graph.add_successors("C", ["T1", "T2"]);
        graph.set_probabilities("C", vec![0.25, 0.75]);
        graph.add_successors("U", ["T1"]);
        graph.set_reward("T1", 1.0);

        let diagnostics = initialize(&mut graph, Objective::Maximize);
        assert!(diagnostics.is_empty());

        assert_eq!(
            graph.get("D").unwrap().transition(),
            &Transition::Decision { slip: 0.8 }
        );
        assert_eq!(
            graph.get("C").unwrap().transition(),
            &Transition::Chance {
                weights: vec![0.25, 0.75]
            }
        );
        assert_eq!(
            graph.get("U").unwrap().transition(),
            &Transition::Decision { slip: 1.0 }
        );
        assert_eq!(graph.get("T1").unwrap().transition(), &Transition::Terminal);
        assert_eq!(graph.get("T2").unwrap().transition(), &Transition::Terminal);
    }

    #[test]
    fn test_probabilities_on_terminal_are_ignored() {
        let mut graph = Graph::new();
        graph.set_reward("T", 4.0);
        graph.set_probabilities("T", vec![0.5]);

        let diagnostics = initialize(&mut graph, Objective::Maximize);
        assert!(diagnostics.is_empty());
        let t = graph.get("T").unwrap();
        assert!(t.transition().is_terminal());
        assert_eq!(t.policy(), None);
        assert_eq!(t.value(), 4.0);
    }

    #[test]
    fn test_values_are_seeded_without_reward() {
        let mut graph = Graph::new();
        graph.add_successors("S", ["Goal"]);
        graph.set_reward("S", -1.0);
        graph.set_reward("Goal", 10.0);

        initialize(&mut graph, Objective::Maximize);
        assert_eq!(graph.get("S").unwrap().value(), 0.0);
        assert_eq!(graph.get("Goal").unwrap().value(), 10.0);
    }

    #[test]
    fn test_dangling_successor_is_terminal_worth_zero() {
        let mut graph = Graph::new();
        graph.add_successors("S", ["Nowhere"]);

        let diagnostics = initialize(&mut graph, Objective::Maximize);
        assert!(diagnostics.is_empty());
        let nowhere = graph.get("Nowhere").unwrap();
        assert!(nowhere.transition().is_terminal());
        assert_eq!(nowhere.value(), 0.0);
    }

    #[test]
    fn test_initial_policy_uses_reward() {
        let mut graph = Graph::new();
        graph.add_successors("S", ["Low", "High", "Mid"]);
        graph.set_reward("Low", -5.0);
        graph.set_reward("High", 5.0);
        graph.set_reward("Mid", 1.0);

        initialize(&mut graph, Objective::Maximize);
        assert_eq!(graph.get("S").unwrap().policy(), graph.node_id("High"));

        initialize(&mut graph, Objective::Minimize);
        assert_eq!(graph.get("S").unwrap().policy(), graph.node_id("Low"));
    }

    #[test]
    fn test_initial_policy_ties_pick_first() {
        let mut graph = Graph::new();
        graph.add_successors("S", ["X", "Y"]);

        initialize(&mut graph, Objective::Maximize);
        assert_eq!(graph.get("S").unwrap().policy(), graph.node_id("X"));
    }

    #[test]
    fn test_length_mismatch_degrades_to_decision() {
        let mut graph = Graph::new();
        graph.add_successors("S", ["A", "B", "C"]);
        graph.set_probabilities("S", vec![0.5, 0.5]);

        let diagnostics = initialize(&mut graph, Objective::Maximize);
        assert_eq!(
            diagnostics,
            vec![Diagnostic::for_node(
                "S",
                DiagnosticKind::DistributionLengthMismatch {
                    successors: 3,
                    weights: 2
                }
            )]
        );
        assert_eq!(
            graph.get("S").unwrap().transition(),
            &Transition::Decision { slip: 1.0 }
        );
        assert!(graph.get("S").unwrap().policy().is_some());
    }

    #[test]
    fn test_bad_distribution_degrades_to_decision() {
        let mut graph = Graph::new();
        graph.add_successors("S", ["A", "B"]);
        graph.set_probabilities("S", vec![0.5, 0.6]);

        let diagnostics = initialize(&mut graph, Objective::Maximize);
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            diagnostics[0].kind,
            DiagnosticKind::ProbabilitySum(_)
        ));
        assert!(graph.get("S").unwrap().is_decision());
    }
}
