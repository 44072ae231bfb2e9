//! The four phases of Monte Carlo Tree Search and the search loop:
//!
//! 1. Selection ([`tree_policy`]): descend from the root using UCB1 until a
//!    terminal node is reached or a child that was never visited is found.
//! 2. Expansion ([`Tree::expand`]): children are created lazily, all at once,
//!    the first time a node is descended through.
//! 3. Simulation ([`default_policy`]): complete the selected program with
//!    uniformly random instructions and score it.
//! 4. Backpropagation ([`backup`]): record the reward on the path to the root.
//!
//! Once the budget is spent, [`best_terminal`] follows the children with the
//! highest mean reward.

use log::{debug, trace};
use rand::Rng;

use super::tree::{Node, NodeIndex, Tree};
use super::{Config, Limiter};
use crate::evaluation::{Evaluator, Reward};
use crate::program::State;

/// Exploration constant of the final extraction: pure exploitation.
const EXTRACTION_EXPLORATION: f64 = 0.0;

/// Runs search iterations until the limits in `config` are reached and
/// returns the number of iterations performed.
///
/// The limits are checked after each iteration: at least one iteration always
/// runs, so the root is expanded before [`best_terminal`] is used.
///
/// # Errors
///
/// Fails without touching the tree if the configuration is invalid (see
/// [`Config::validate`]).
pub fn tree_search(
    tree: &mut Tree,
    config: &Config,
    evaluator: &impl Evaluator,
    rng: &mut impl Rng,
) -> anyhow::Result<u64> {
    config.validate()?;
    let limiter = Limiter::new(config.limits);
    let mut iterations = 0;
    let mut best_reward = Reward::NEG_INFINITY;
    loop {
        let leaf = tree_policy(tree, config);
        let (playout, reward) =
            default_policy(tree.node(leaf).state(), config.max_instructions, evaluator, rng);
        trace!(
            "iteration {iterations}: reward {reward} from depth {}",
            tree.depth(leaf)
        );
        if reward > best_reward {
            best_reward = reward;
            debug!("iteration {iterations}: new best reward {reward}\n{playout}");
        }
        tree.node_mut(leaf).record_playout(playout);
        backup(tree, leaf, reward);

        iterations += 1;
        if limiter.exhausted(iterations) {
            break;
        }
    }
    Ok(iterations)
}

/// Selection: starting at the root, expands every node on the way and returns
/// its first unvisited child as soon as there is one. Nodes whose children
/// were all visited are descended through with [`best_child`]. Returns a
/// terminal node if one is reached first.
pub fn tree_policy(tree: &mut Tree, config: &Config) -> NodeIndex {
    let mut node = Tree::ROOT;
    while !tree.node(node).state().is_terminal() {
        if let Some(child) = tree.expand(node, config.max_instructions) {
            return child;
        }
        node = best_child(tree, node, config.exploration)
            .expect("all children of an expanded node without unvisited ones are visited");
    }
    node
}

/// Completes `state` by drawing uniformly among [`State::next_states`] until
/// the program returns.
///
/// The walk ends after at most `max_instructions + 1` steps: every step either
/// adds an instruction, which is only possible below the cap, or returns.
///
/// # Panics
///
/// Panics if `state` has no variables to return.
pub fn simulate(state: &State, max_instructions: usize, rng: &mut impl Rng) -> State {
    let mut state = state.clone();
    let mut steps = 0;
    while !state.is_terminal() {
        let count = state.successor_count(max_instructions);
        state = state.successor(rng.gen_range(0..count), max_instructions);
        steps += 1;
    }
    debug_assert!(steps <= max_instructions + 1);
    state
}

/// Simulation: completes `state` at random and returns the complete program
/// with its reward.
pub fn default_policy(
    state: &State,
    max_instructions: usize,
    evaluator: &impl Evaluator,
    rng: &mut impl Rng,
) -> (State, Reward) {
    let playout = simulate(state, max_instructions, rng);
    let reward = evaluator.evaluate(&playout);
    (playout, reward)
}

/// Backpropagation: every node on the path from `node` up to the root is
/// visited once more and accumulates `reward`, except for the root which only
/// counts the visit.
pub fn backup(tree: &mut Tree, mut node: NodeIndex, reward: Reward) {
    while let Some(parent) = tree.node(node).parent() {
        tree.node_mut(node).record(reward);
        node = parent;
    }
    tree.node_mut(node).record_visit();
}

/// UCB1 value of a visited child: mean reward plus an exploration bonus that
/// shrinks as the child is visited more often relative to its parent.
#[allow(clippy::cast_precision_loss)]
fn ucb(child: &Node, parent_visits: u64, exploration: f64) -> Option<f64> {
    let mean = child.mean_score()?;
    let parent_visits = parent_visits.max(1) as f64;
    let bonus = (2.0 * parent_visits.ln() / child.visits() as f64).sqrt();
    Some(exploration.mul_add(bonus, mean))
}

/// Returns the child of `node` with the highest UCB1 value. Children that
/// were never visited are not considered; `None` is returned if there are no
/// visited children. The first child wins ties.
///
/// # Panics
///
/// Panics if `node` has no children.
#[must_use]
pub fn best_child(tree: &Tree, node: NodeIndex, exploration: f64) -> Option<NodeIndex> {
    let parent = tree.node(node);
    assert!(
        !parent.children().is_empty(),
        "best child requested for a node without children"
    );
    let mut best: Option<(NodeIndex, f64)> = None;
    for &child in parent.children() {
        let Some(value) = ucb(tree.node(child), parent.visits(), exploration) else {
            continue;
        };
        if best.map_or(true, |(_, best_value)| value > best_value) {
            best = Some((child, value));
        }
    }
    best.map(|(child, _)| child)
}

/// Extraction: follows the children with the highest mean reward from the
/// root down to a complete program.
///
/// A node that was visited exactly once has no visited children yet: the
/// only information about it is the simulation started there, so that
/// program is returned. Returns `None` if the root was never visited.
#[must_use]
pub fn best_terminal(tree: &Tree) -> Option<&State> {
    let mut index = Tree::ROOT;
    loop {
        let node = tree.node(index);
        if node.state().is_terminal() {
            return Some(node.state());
        }
        let depth = tree.depth(index);
        for &child in node.children() {
            debug!("extraction depth {depth}: {}", tree.node(child));
        }
        let next = if node.children().is_empty() {
            None
        } else {
            best_child(tree, index, EXTRACTION_EXPLORATION)
        };
        match next {
            Some(child) => index = child,
            None => return node.playout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use test_log::test;

    use super::*;
    use crate::evaluation::ExampleSuite;
    use crate::program::{Variable, DEFAULT_MAX_INSTRUCTIONS};
    use crate::search::Limits;

    fn tree() -> Tree {
        Tree::new(State::initial([Variable::new("a"), Variable::new("b")]))
    }

    fn config(iterations: u64) -> Config {
        Config {
            limits: Limits {
                time: Duration::from_secs(600),
                iterations: Some(iterations),
            },
            ..Config::default()
        }
    }

    /// Expands the root and visits its children with the given rewards.
    fn root_with_rewards(rewards: &[Reward]) -> (Tree, Vec<NodeIndex>) {
        let mut tree = tree();
        let _ = tree.expand(Tree::ROOT, DEFAULT_MAX_INSTRUCTIONS);
        let children = tree.node(Tree::ROOT).children().to_vec();
        for (&child, &reward) in children.iter().zip(rewards) {
            backup(&mut tree, child, reward);
        }
        (tree, children)
    }

    #[test]
    fn simulation_terminates_within_cap() {
        let mut rng = StdRng::seed_from_u64(42);
        for max_instructions in [1, 3, DEFAULT_MAX_INSTRUCTIONS] {
            let initial = State::initial([Variable::new("a"), Variable::new("b")]);
            for _ in 0..200 {
                let program = simulate(&initial, max_instructions, &mut rng);
                assert!(program.is_terminal());
                assert!(program.instructions().len() <= max_instructions + 1);
                assert_eq!(
                    program.variables().len(),
                    program.params().len() + program.assignments()
                );
            }
        }
    }

    #[test]
    fn simulation_is_reproducible() {
        let initial = State::initial([Variable::new("a"), Variable::new("b")]);
        let playouts = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..20)
                .map(|_| simulate(&initial, DEFAULT_MAX_INSTRUCTIONS, &mut rng))
                .collect::<Vec<_>>()
        };
        assert_eq!(playouts(7), playouts(7));
    }

    #[test]
    fn simulation_of_terminal_state() {
        let terminal = State::initial([Variable::new("a")]).successor(4, DEFAULT_MAX_INSTRUCTIONS);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            simulate(&terminal, DEFAULT_MAX_INSTRUCTIONS, &mut rng),
            terminal
        );
    }

    #[test]
    fn backup_updates_path() {
        let mut tree = tree();
        let _ = tree.expand(Tree::ROOT, DEFAULT_MAX_INSTRUCTIONS);
        let child = tree.node(Tree::ROOT).children()[0];
        backup(&mut tree, child, 1.0);
        let grandchild = tree.expand(child, DEFAULT_MAX_INSTRUCTIONS).unwrap();
        backup(&mut tree, grandchild, -3.0);
        backup(&mut tree, grandchild, -1.0);

        assert_eq!(tree.node(Tree::ROOT).visits(), 3);
        assert_eq!(tree.node(Tree::ROOT).score().to_string(), "0");
        assert_eq!(tree.node(child).visits(), 3);
        assert_eq!(tree.node(child).score().to_string(), "-3");
        assert_eq!(tree.node(grandchild).visits(), 2);
        assert_eq!(tree.node(grandchild).score().to_string(), "-4");
    }

    #[test]
    fn root_visits_count_every_backup() {
        let (tree, children) = root_with_rewards(&[1.0; 14]);
        assert_eq!(tree.node(Tree::ROOT).visits(), 14);
        assert_eq!(
            children
                .iter()
                .map(|&child| tree.node(child).visits())
                .sum::<u64>(),
            14
        );
    }

    #[test]
    fn best_child_exploits_mean() {
        let (tree, children) = root_with_rewards(&[-3.0, -2.0, 1.0, -1.0, 1.0]);
        assert_eq!(
            best_child(&tree, Tree::ROOT, EXTRACTION_EXPLORATION),
            Some(children[2])
        );
    }

    #[test]
    fn best_child_prefers_less_visited_when_exploring() {
        let (mut tree, children) = root_with_rewards(&[0.0, 0.0]);
        for _ in 0..10 {
            backup(&mut tree, children[0], 0.0);
        }
        // Equal means: exploration favors the child visited once.
        assert_eq!(best_child(&tree, Tree::ROOT, 1.0), Some(children[1]));
        assert_eq!(
            best_child(&tree, Tree::ROOT, EXTRACTION_EXPLORATION),
            Some(children[0])
        );
    }

    #[test]
    fn best_child_skips_unvisited() {
        let mut tree = tree();
        let _ = tree.expand(Tree::ROOT, DEFAULT_MAX_INSTRUCTIONS);
        assert_eq!(best_child(&tree, Tree::ROOT, 1.0), None);
        let last = *tree.node(Tree::ROOT).children().last().unwrap();
        backup(&mut tree, last, -3.0);
        assert_eq!(best_child(&tree, Tree::ROOT, 1.0), Some(last));
    }

    #[test]
    #[should_panic(expected = "best child requested for a node without children")]
    fn best_child_without_children() {
        let _ = best_child(&tree(), Tree::ROOT, 1.0);
    }

    #[test]
    fn selection_visits_fresh_children_first() {
        let config = config(1);
        let mut tree = tree();
        let mut selected = Vec::new();
        for _ in 0..14 {
            let leaf = tree_policy(&mut tree, &config);
            selected.push(leaf);
            backup(&mut tree, leaf, -3.0);
        }
        assert_eq!(selected, tree.node(Tree::ROOT).children());
        // Every child is visited now: selection descends one level deeper.
        let leaf = tree_policy(&mut tree, &config);
        assert_eq!(tree.depth(leaf), 2);
    }

    #[test]
    fn selection_stops_at_terminal() {
        let config = config(1);
        let mut tree = tree();
        let _ = tree.expand(Tree::ROOT, DEFAULT_MAX_INSTRUCTIONS);
        let children = tree.node(Tree::ROOT).children().to_vec();
        for &child in &children {
            let reward = if tree.node(child).state().is_terminal() {
                1.0
            } else {
                -3.0
            };
            backup(&mut tree, child, reward);
        }
        let leaf = tree_policy(&mut tree, &config);
        assert!(tree.node(leaf).state().is_terminal());
        assert_eq!(leaf, children[12]);
    }

    #[test]
    fn extraction_uses_playout_of_unexpanded_node() {
        let mut tree = tree();
        let mut rng = StdRng::seed_from_u64(3);
        let config = config(1);
        let iterations =
            tree_search(&mut tree, &config, &ExampleSuite::addition(), &mut rng).unwrap();
        assert_eq!(iterations, 1);
        let child = tree.node(Tree::ROOT).children()[0];
        assert_eq!(best_terminal(&tree), tree.node(child).playout());
        assert!(best_terminal(&tree).is_some());
    }

    #[test]
    fn extraction_needs_a_visited_root() {
        assert_eq!(best_terminal(&tree()), None);
    }

    #[test]
    fn search_rejects_invalid_configuration() {
        let mut tree = tree();
        let mut rng = StdRng::seed_from_u64(0);
        let config = Config {
            params: vec![],
            ..config(10)
        };
        let error = tree_search(&mut tree, &config, &ExampleSuite::addition(), &mut rng)
            .unwrap_err();
        assert_eq!(error.to_string(), "at least one parameter is required");
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.node(Tree::ROOT).visits(), 0);
    }

    #[test]
    fn search_rejects_zero_time_budget() {
        let mut tree = tree();
        let mut rng = StdRng::seed_from_u64(0);
        let mut config = config(10);
        config.limits.time = Duration::ZERO;
        let error = tree_search(&mut tree, &config, &ExampleSuite::addition(), &mut rng)
            .unwrap_err();
        assert_eq!(error.to_string(), "time budget should be positive");
        assert_eq!(best_terminal(&tree), None);
    }

    #[test]
    fn search_statistics() {
        let mut tree = tree();
        let mut rng = StdRng::seed_from_u64(11);
        let suite = ExampleSuite::addition();
        let iterations = tree_search(&mut tree, &config(500), &suite, &mut rng).unwrap();
        assert_eq!(iterations, 500);
        let root = tree.node(Tree::ROOT);
        assert_eq!(root.visits(), iterations);
        assert_eq!(root.score().to_string(), "0");
        for &child in root.children() {
            let node = tree.node(child);
            let through_children: u64 = node
                .children()
                .iter()
                .map(|&grandchild| tree.node(grandchild).visits())
                .sum();
            // The first visit of a node is the simulation started there.
            if node.visits() > 0 && !node.state().is_terminal() {
                assert_eq!(node.visits(), through_children + 1);
            }
        }
        let program = best_terminal(&tree).unwrap();
        assert!(program.is_terminal());
    }
}
