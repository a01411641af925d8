//! Greedy policy extraction.

use log::trace;

use super::graph::{Graph, NodeId};

/// Direction of optimisation, fixed for a whole solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Objective {
    #[default]
    Maximize,
    Minimize,
}

impl Objective {
    /// Whether `candidate` is strictly better than `best`. Being strict keeps
    /// the first of several equal successors.
    pub fn improves(self, candidate: f64, best: f64) -> bool {
        match self {
            Objective::Maximize => candidate > best,
            Objective::Minimize => candidate < best,
        }
    }
}

/// Picks the best of `successors` by `score`, preferring the earliest on ties.
/// Returns `None` only when there are no successors.
pub(crate) fn greedy_successor<F>(
    successors: &[NodeId],
    objective: Objective,
    score: F,
) -> Option<NodeId>
where
    F: Fn(NodeId) -> f64,
{
    let (&first, rest) = successors.split_first()?;
    let mut best = first;
    let mut best_score = score(first);
    for &candidate in rest {
        let candidate_score = score(candidate);
        if objective.improves(candidate_score, best_score) {
            best = candidate;
            best_score = candidate_score;
        }
    }
    Some(best)
}

/// Re-points every decision node at the successor with the best current value.
///
/// Only the policy is touched; values are left as they are. Returns how many
/// decision nodes changed their choice.
pub fn extract_policy(graph: &mut Graph, objective: Objective) -> usize {
    let mut changed = 0;
    for id in graph.sweep_order() {
        let node = graph.node(id);
        if !node.is_decision() {
            continue;
        }
        let choice = greedy_successor(node.successors(), objective, |s| graph.node(s).value());
        if choice != node.policy() {
            trace!(
                "policy of `{}` moves to {:?}",
                node.name(),
                choice.map(|c| graph.node(c).name())
            );
            changed += 1;
        }
        graph.node_mut(id).set_policy(choice);
    }
    changed
}
