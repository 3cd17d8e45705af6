use crate::mcts_node::{DEFAULT_EXPLORATION_CONSTANT, MctsNode, Reward};
use crate::random::RandomGenerator;
use ego_tree::{NodeId, NodeRef, Tree};

/// What happened to the tree when a move was committed.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum TreeReuse {
    /// The played move was a root child; its subtree became the new tree.
    Reused,
    /// The played move was never expanded; the tree starts over from an empty root.
    Reset,
}

/// The search tree.
///
/// Nodes live in an `ego_tree` arena owned by the root; parents are plain [`NodeId`] handles
/// used to walk upwards during backpropagation. The root is always the arena's root node.
#[derive(Debug)]
pub struct ActionTree<M> {
    tree: Tree<MctsNode<M>>,
    exploration: f64,
}

impl<M: Copy + PartialEq> Default for ActionTree<M> {
    fn default() -> Self {
        ActionTree::new(DEFAULT_EXPLORATION_CONSTANT)
    }
}

impl<M: Copy + PartialEq> ActionTree<M> {
    /// Creates a tree holding only an empty root.
    pub fn new(exploration: f64) -> Self {
        Self {
            tree: Tree::new(MctsNode::root()),
            exploration,
        }
    }

    pub fn exploration(&self) -> f64 {
        self.exploration
    }

    pub fn root_id(&self) -> NodeId {
        self.tree.root().id()
    }

    pub fn root(&self) -> &MctsNode<M> {
        self.tree.root().value()
    }

    pub fn get(&self, id: NodeId) -> Option<&MctsNode<M>> {
        self.tree.get(id).map(|node| node.value())
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.tree
            .get(id)
            .map(|node| node.children().map(|child| child.id()).collect())
            .unwrap_or_default()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.tree.get(id)?.parent().map(|parent| parent.id())
    }

    pub fn is_expanded(&self, id: NodeId) -> bool {
        self.tree.get(id).is_some_and(|node| node.has_children())
    }

    pub fn child_for_move(&self, id: NodeId, b_move: M) -> Option<NodeId> {
        self.tree
            .get(id)?
            .children()
            .find(|child| child.value().prev_move == Some(b_move))
            .map(|child| child.id())
    }

    /// Number of nodes reachable from the root.
    pub fn node_count(&self) -> usize {
        self.tree.root().descendants().count()
    }

    /// UCB1 score of a node against its parent's visit count.
    pub fn score(&self, id: NodeId) -> Option<f64> {
        let node = self.tree.get(id)?;
        let parent_visits = node
            .parent()
            .map_or(node.value().visits, |parent| parent.value().visits);
        Some(node.value().score(parent_visits, self.exploration))
    }

    /// Picks the child with the highest UCB1 score, breaking ties uniformly at random.
    /// Returns `None` if the node has no children.
    pub fn select_best_child<K: RandomGenerator>(
        &self,
        id: NodeId,
        random: &mut K,
    ) -> Option<NodeId> {
        let node = self.tree.get(id)?;
        let parent_visits = node.value().visits;
        let best = Self::maximizers(node, |child| {
            child.score(parent_visits, self.exploration)
        });
        if best.is_empty() {
            None
        } else {
            Some(*random.choose(&best))
        }
    }

    /// Creates one zeroed child per move.
    ///
    /// # Panics
    ///
    /// Panics if the node already has children or does not belong to this tree.
    pub fn expand(&mut self, id: NodeId, moves: &[M]) -> Vec<NodeId> {
        let mut node = self
            .tree
            .get_mut(id)
            .expect("expanded node belongs to this tree");
        assert!(!node.has_children(), "BUG: expanding already expanded node");

        let mut children = Vec::with_capacity(moves.len());
        for &b_move in moves {
            children.push(node.append(MctsNode::new(b_move)).id());
        }
        children
    }

    /// The move of the root child with the most visits, ties broken uniformly at random.
    /// Returns `None` while the root has no children.
    pub fn most_visited_child<K: RandomGenerator>(&self, random: &mut K) -> Option<M> {
        let root = self.tree.root();
        let best = Self::maximizers(root, |child| child.visits as f64);
        if best.is_empty() {
            return None;
        }
        let chosen = *random.choose(&best);
        self.get(chosen).and_then(|node| node.prev_move)
    }

    /// Credits `reward` to `leaf` and every ancestor up to the root, each seeing the result
    /// from its own mover's side.
    pub fn backpropagate(&mut self, leaf: NodeId, reward: Reward) {
        let mut current = Some(leaf);
        let mut reward = reward;
        while let Some(id) = current {
            current = self.parent(id);
            let Some(mut node) = self.tree.get_mut(id) else {
                break;
            };
            node.value().record(reward);
            reward = reward.for_parent();
        }
    }

    /// Moves the root to the child reached by `b_move`, keeping its statistics and dropping
    /// every sibling subtree. Falls back to an empty root if the move was never expanded.
    pub fn advance(&mut self, b_move: M) -> TreeReuse {
        match self.child_for_move(self.root_id(), b_move) {
            Some(child) => {
                self.tree = self.extract_subtree(child);
                TreeReuse::Reused
            }
            None => {
                self.reset();
                TreeReuse::Reset
            }
        }
    }

    /// Drops all statistics.
    pub fn reset(&mut self) {
        self.tree = Tree::new(MctsNode::root());
    }

    fn extract_subtree(&self, id: NodeId) -> Tree<MctsNode<M>> {
        let Some(source) = self.tree.get(id) else {
            return Tree::new(MctsNode::root());
        };
        let mut subtree = Tree::new(source.value().clone());
        let mut pending = vec![(id, subtree.root().id())];

        while let Some((source_id, target_id)) = pending.pop() {
            let Some(source) = self.tree.get(source_id) else {
                continue;
            };
            let Some(mut target) = subtree.get_mut(target_id) else {
                continue;
            };
            for child in source.children() {
                let copied = target.append(child.value().clone()).id();
                pending.push((child.id(), copied));
            }
        }
        subtree
    }

    fn maximizers<F>(node: NodeRef<'_, MctsNode<M>>, key: F) -> Vec<NodeId>
    where
        F: Fn(&MctsNode<M>) -> f64,
    {
        let mut best = Vec::new();
        let mut max = f64::NEG_INFINITY;
        for child in node.children() {
            let value = key(child.value());
            if value > max {
                max = value;
                best.clear();
                best.push(child.id());
            } else if value == max {
                best.push(child.id());
            }
        }
        best
    }
}
