//! Arena-backed graph of MDP nodes.
//!
//! Nodes are stored in insertion order and addressed by [`NodeId`]. A name
//! index maps the textual node names used in model files onto those ids.
//! Referencing a name that was never declared creates an *implicit* node with
//! no reward and no successors, i.e. a terminal worth 0.

use std::collections::HashMap;
use std::fmt;

use super::diagnostic::DiagnosticKind;

/// Slack allowed when checking that a distribution sums to one.
pub const PROBABILITY_SUM_EPSILON: f64 = 1e-8;

/// Handle to a node inside a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a node moves to its successors.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Not yet resolved by the initializer.
    Unclassified,
    /// No successors; the value is pinned to the reward.
    Terminal,
    /// The agent nominates one successor, reached with probability `slip`.
    /// The remaining mass is spread evenly over the other successors.
    Decision { slip: f64 },
    /// Fixed distribution over the successors, one weight per successor.
    Chance { weights: Vec<f64> },
}

impl Transition {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Transition::Terminal)
    }

    pub fn is_decision(&self) -> bool {
        matches!(self, Transition::Decision { .. })
    }

    pub fn is_chance(&self) -> bool {
        matches!(self, Transition::Chance { .. })
    }
}

/// A single state of the process.
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    reward: Option<f64>,
    successors: Vec<NodeId>,
    probabilities: Option<Vec<f64>>,
    declared: bool,
    transition: Transition,
    value: f64,
    policy: Option<NodeId>,
}

impl Node {
    fn new(name: String) -> Self {
        Self {
            name,
            reward: None,
            successors: Vec::new(),
            probabilities: None,
            declared: false,
            transition: Transition::Unclassified,
            value: 0.0,
            policy: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared reward, if any.
    pub fn reward(&self) -> Option<f64> {
        self.reward
    }

    /// The reward as it enters the value equation; undeclared rewards count as 0.
    pub fn reward_or_zero(&self) -> f64 {
        self.reward.unwrap_or(0.0)
    }

    pub fn successors(&self) -> &[NodeId] {
        &self.successors
    }

    /// The raw probability entry as declared, before classification.
    pub fn probabilities(&self) -> Option<&[f64]> {
        self.probabilities.as_deref()
    }

    pub fn transition(&self) -> &Transition {
        &self.transition
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// The successor currently chosen by the policy. Only set on decision nodes.
    pub fn policy(&self) -> Option<NodeId> {
        self.policy
    }

    /// Whether any declaration named this node directly. Nodes that only
    /// appear inside a successor list are implicit.
    pub fn is_declared(&self) -> bool {
        self.declared
    }

    pub fn is_terminal(&self) -> bool {
        self.successors.is_empty()
    }

    pub fn is_decision(&self) -> bool {
        self.transition.is_decision()
    }

    pub fn is_chance(&self) -> bool {
        self.transition.is_chance()
    }

    pub(crate) fn set_transition(&mut self, transition: Transition) {
        self.transition = transition;
    }

    pub(crate) fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    pub(crate) fn set_policy(&mut self, choice: Option<NodeId>) {
        self.policy = choice;
    }
}

/// The nodes and edges of one model.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    index: HashMap<String, NodeId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    /// Looks up `name`, creating an implicit node for it if it does not exist yet.
    pub fn node_id_or_insert(&mut self, name: &str) -> NodeId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(name.to_string()));
        self.index.insert(name.to_string(), id);
        id
    }

    /// # Panics
    /// Panics if `id` was not produced by this graph.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.node_id(name).map(|id| self.node(id))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Declares the reward of `name`, replacing any earlier one.
    pub fn set_reward(&mut self, name: &str, reward: f64) -> NodeId {
        let id = self.declare(name);
        self.nodes[id.0].reward = Some(reward);
        id
    }

    /// Appends successors to `name`. Successors that were never declared
    /// become implicit terminal nodes.
    pub fn add_successors<I, S>(&mut self, name: &str, successors: I) -> NodeId
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let id = self.declare(name);
        let resolved: Vec<NodeId> = successors
            .into_iter()
            .map(|s| self.node_id_or_insert(s.as_ref()))
            .collect();
        self.nodes[id.0].successors.extend(resolved);
        id
    }

    /// Sets the probability entry of `name`, returning the entry it replaced.
    ///
    /// A single value is a decision node's slip; several values are a chance
    /// node's distribution. The entry is only interpreted by the initializer.
    pub fn set_probabilities(
        &mut self,
        name: &str,
        probabilities: Vec<f64>,
    ) -> Option<Vec<f64>> {
        let id = self.declare(name);
        self.nodes[id.0].probabilities.replace(probabilities)
    }

    /// Node ids ordered by name. Every sweep, policy pass and report walks
    /// nodes in this order, which makes in-place updates reproducible.
    pub fn sweep_order(&self) -> Vec<NodeId> {
        let mut order: Vec<NodeId> = self.ids().collect();
        order.sort_by(|a, b| self.nodes[a.0].name.cmp(&self.nodes[b.0].name));
        order
    }

    /// The current policy choice of every node, indexed by node id.
    pub fn policy_snapshot(&self) -> Vec<Option<NodeId>> {
        self.nodes.iter().map(|n| n.policy).collect()
    }

    fn declare(&mut self, name: &str) -> NodeId {
        let id = self.node_id_or_insert(name);
        self.nodes[id.0].declared = true;
        id
    }
}

/// Checks that every probability lies in `[0, 1]` and that a distribution
/// (more than one value) sums to 1 within [`PROBABILITY_SUM_EPSILON`].
pub fn check_probabilities(probabilities: &[f64]) -> Result<(), DiagnosticKind> {
    if probabilities.is_empty() {
        return Err(DiagnosticKind::EmptyProbabilities);
    }
    if let Some(&p) = probabilities
        .iter()
        .find(|p| !p.is_finite() || !(0.0..=1.0).contains(*p))
    {
        return Err(DiagnosticKind::ProbabilityOutOfRange(p));
    }
    if probabilities.len() > 1 {
        let sum: f64 = probabilities.iter().sum();
        if (sum - 1.0).abs() > PROBABILITY_SUM_EPSILON {
            return Err(DiagnosticKind::ProbabilitySum(sum));
        }
    }
    Ok(())
}
