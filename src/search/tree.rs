//! Arena-allocated search tree. The arena owns every node; parents and
//! children refer to each other by [`NodeIndex`], so there are no reference
//! cycles and backpropagation can still walk upwards.

use std::fmt;

use crate::program::State;

/// Handle of a node in the [`Tree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeIndex(usize);

/// A partial program together with the statistics of the searches that went
/// through it.
#[derive(Debug)]
pub struct Node {
    state: State,
    parent: Option<NodeIndex>,
    children: Vec<NodeIndex>,
    /// Total number of search iterations that went through this node.
    visits: u64,
    /// Sum of the rewards backed up through this node.
    score: f64,
    /// Complete program reached by the first simulation started here.
    playout: Option<State>,
}

impl Node {
    fn new(state: State, parent: Option<NodeIndex>) -> Self {
        Self {
            state,
            parent,
            children: Vec::new(),
            visits: 0,
            score: 0.0,
            playout: None,
        }
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn state(&self) -> &State {
        &self.state
    }

    /// `None` only for the root.
    #[must_use]
    pub const fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    /// Empty until the node is expanded.
    #[must_use]
    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn visits(&self) -> u64 {
        self.visits
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn score(&self) -> f64 {
        self.score
    }

    #[must_use]
    pub(crate) const fn visited(&self) -> bool {
        self.visits > 0
    }

    /// Average reward, `None` for nodes that were never visited.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn mean_score(&self) -> Option<f64> {
        self.visited().then(|| self.score / self.visits as f64)
    }

    /// Complete program produced by the simulation started at this node, if
    /// there was one.
    #[must_use]
    pub const fn playout(&self) -> Option<&State> {
        self.playout.as_ref()
    }

    pub(crate) fn record(&mut self, reward: f64) {
        self.visits += 1;
        self.score += reward;
    }

    pub(crate) fn record_visit(&mut self) {
        self.visits += 1;
    }

    pub(crate) fn record_playout(&mut self, playout: State) {
        if self.playout.is_none() {
            self.playout = Some(playout);
        }
    }
}

impl fmt::Display for Node {
    /// Statistics followed by the rendered program.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mean_score() {
            Some(mean) => writeln!(f, "visits {}, mean {mean}", self.visits)?,
            None => writeln!(f, "unvisited")?,
        }
        write!(f, "{}", self.state)
    }
}

/// Tree of partial programs. Nodes are never removed: the tree only grows for
/// the duration of one search.
#[derive(Debug)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// The root is always the first node in the arena.
    pub const ROOT: NodeIndex = NodeIndex(0);

    /// Creates a tree with a single unvisited root.
    #[must_use]
    pub fn new(root: State) -> Self {
        Self {
            nodes: vec![Node::new(root, None)],
        }
    }

    /// # Panics
    ///
    /// Panics if `index` does not belong to this tree.
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index.0]
    }

    pub(crate) fn node_mut(&mut self, index: NodeIndex) -> &mut Node {
        &mut self.nodes[index.0]
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Trees always have at least the root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of edges between the node and the root.
    #[must_use]
    pub fn depth(&self, mut index: NodeIndex) -> usize {
        let mut depth = 0;
        while let Some(parent) = self.node(index).parent {
            depth += 1;
            index = parent;
        }
        depth
    }

    /// Creates the children of a non-terminal node on the first call (one per
    /// [`State::next_states`] entry, in order) and returns the first child
    /// that was never visited. Subsequent calls only look for an unvisited
    /// child.
    ///
    /// # Panics
    ///
    /// Panics if the node is terminal.
    pub fn expand(&mut self, index: NodeIndex, max_instructions: usize) -> Option<NodeIndex> {
        let node = self.node(index);
        assert!(
            !node.state.is_terminal(),
            "terminal nodes can not be expanded"
        );
        if node.children.is_empty() {
            let states = node.state.next_states(max_instructions);
            let first = self.nodes.len();
            self.nodes
                .extend(states.into_iter().map(|state| Node::new(state, Some(index))));
            let children = (first..self.nodes.len()).map(NodeIndex).collect();
            self.node_mut(index).children = children;
        }
        self.node(index)
            .children
            .iter()
            .copied()
            .find(|&child| !self.node(child).visited())
    }
}
