//! Bounded, tolerance-gated evaluation of a fixed policy.
//!
//! Each sweep visits the non-terminal nodes in [`Graph::sweep_order`] and
//! overwrites their values in place, so a node later in the sweep already
//! sees the updated values of the nodes before it (Gauss-Seidel style). The
//! visiting order is therefore part of the numeric result.

use log::trace;

use super::graph::{Graph, NodeId, Transition};

/// Knobs of one evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationParams {
    /// Discount applied to successor values.
    pub discount_factor: f64,
    /// A node is settled once a sweep moves its value by at most this much.
    pub tolerance: f64,
    /// Upper bound on the number of sweeps.
    pub max_sweeps: usize,
}

impl Default for EvaluationParams {
    fn default() -> Self {
        Self {
            discount_factor: 1.0,
            tolerance: 0.001,
            max_sweeps: 100,
        }
    }
}

/// Outcome of an evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    /// Number of sweeps performed.
    pub sweeps: usize,
    /// Whether the last sweep left every node settled.
    pub converged: bool,
}

/// Computes the one-step backup of `id` under the current policy and values:
/// the node's reward plus the discounted expected value of its successors.
///
/// For a decision node with `k` successors, the chosen successor carries
/// `slip` and each other successor carries `(1 - slip) / (k - 1)`. A single
/// successor carries only `slip`; there is no remainder term. Terminal nodes
/// return their current (pinned) value.
pub fn backup(graph: &Graph, id: NodeId, discount_factor: f64) -> f64 {
    let node = graph.node(id);
    let successors = node.successors();
    if successors.is_empty() {
        return node.value();
    }

    let mut value = node.reward_or_zero();
    match node.transition() {
        Transition::Chance { weights } => {
            for (&s, &weight) in successors.iter().zip(weights) {
                value += discount_factor * weight * graph.node(s).value();
            }
        }
        Transition::Decision { slip } => {
            value += decision_term(graph, successors, node.policy(), *slip, discount_factor);
        }
        Transition::Unclassified | Transition::Terminal => {
            value += decision_term(graph, successors, node.policy(), 1.0, discount_factor);
        }
    }
    value
}

fn decision_term(
    graph: &Graph,
    successors: &[NodeId],
    choice: Option<NodeId>,
    slip: f64,
    discount_factor: f64,
) -> f64 {
    let others = successors.len() - 1;
    let mut term = 0.0;
    for &s in successors {
        let v = graph.node(s).value();
        if Some(s) == choice {
            term += discount_factor * slip * v;
        } else if others != 0 {
            term += (discount_factor * (1.0 - slip) * v) / others as f64;
        }
    }
    term
}

/// Runs sweeps until every non-terminal node settles or `max_sweeps` is hit.
///
/// Only node values change. Terminal nodes are never written.
pub fn evaluate(graph: &mut Graph, params: &EvaluationParams) -> Evaluation {
    let order: Vec<NodeId> = graph
        .sweep_order()
        .into_iter()
        .filter(|&id| !graph.node(id).is_terminal())
        .collect();

    let mut sweeps = 0;
    while sweeps < params.max_sweeps {
        sweeps += 1;
        let mut settled = 0;
        let mut largest_change = 0.0_f64;
        for &id in &order {
            let previous = graph.node(id).value();
            let next = backup(graph, id, params.discount_factor);
            graph.node_mut(id).set_value(next);

            let change = (next - previous).abs();
            largest_change = largest_change.max(change);
            if change <= params.tolerance {
                settled += 1;
            }
        }
        trace!(
            "sweep {}: {}/{} nodes settled, largest change {}",
            sweeps,
            settled,
            order.len(),
            largest_change
        );
        if settled == order.len() {
            return Evaluation {
                sweeps,
                converged: true,
            };
        }
    }

    Evaluation {
        sweeps,
        converged: false,
    }
}
