/// UCB1 exploration constant.
pub const DEFAULT_EXPLORATION_CONSTANT: f64 = std::f64::consts::SQRT_2;

/// Statistics of a single edge in the Monte Carlo search tree.
///
/// The game state itself is not stored; it is rebuilt by replaying moves from the root during
/// selection.
#[derive(Debug, Clone, PartialEq)]
pub struct MctsNode<M> {
    /// The move that led to this node from its parent. `None` for the root node.
    pub prev_move: Option<M>,
    /// The number of simulations that passed through this node.
    pub visits: u32,
    /// Sum of rewards, seen from the player who made `prev_move`.
    pub total_reward: f64,
}

impl<M> MctsNode<M> {
    pub fn root() -> Self {
        Self {
            prev_move: None,
            visits: 0,
            total_reward: 0.0,
        }
    }

    pub fn new(prev_move: M) -> Self {
        Self {
            prev_move: Some(prev_move),
            visits: 0,
            total_reward: 0.0,
        }
    }

    /// Average reward (Q/N); zero before the first visit.
    pub fn average_reward(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.total_reward / self.visits as f64
        }
    }

    /// UCB1 value of this node as a child of a parent visited `parent_visits` times.
    ///
    /// Unvisited nodes score `+inf`, so every sibling is tried once before any is exploited.
    pub fn score(&self, parent_visits: u32, exploration: f64) -> f64 {
        if self.visits == 0 {
            return f64::INFINITY;
        }
        let visits = self.visits as f64;
        self.average_reward() + exploration * f64::sqrt(f64::ln(parent_visits as f64) / visits)
    }

    pub(crate) fn record(&mut self, reward: Reward) {
        self.visits += 1;
        self.total_reward += reward.value();
    }
}

/// Result of one simulation as credited to a single node.
#[derive(Debug, PartialEq, Copy, Clone)]
pub enum Reward {
    /// Worth zero at every level of the tree.
    Draw,
    /// 1.0 for a win of the node's mover, 0.0 for a loss.
    Decisive(f64),
}

impl Reward {
    pub fn win() -> Self {
        Reward::Decisive(1.0)
    }

    pub fn loss() -> Self {
        Reward::Decisive(0.0)
    }

    pub fn value(&self) -> f64 {
        match self {
            Reward::Draw => 0.0,
            Reward::Decisive(r) => *r,
        }
    }

    /// The same result seen one ply up, by the other player.
    pub fn for_parent(self) -> Self {
        match self {
            Reward::Draw => Reward::Draw,
            Reward::Decisive(r) => Reward::Decisive(1.0 - r),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unvisited_node_scores_infinity() {
        let node = MctsNode::new(3usize);
        assert_eq!(node.score(10, DEFAULT_EXPLORATION_CONSTANT), f64::INFINITY);
        assert_eq!(node.average_reward(), 0.0);
    }

    #[test]
    fn ucb1_value() {
        let node = MctsNode {
            prev_move: Some(0usize),
            visits: 4,
            total_reward: 3.0,
        };

        let expected = 0.75 + std::f64::consts::SQRT_2 * (f64::ln(16.0) / 4.0).sqrt();
        let score = node.score(16, DEFAULT_EXPLORATION_CONSTANT);

        assert!((score - expected).abs() < 1e-12);
        assert!(score.is_finite());
    }

    #[test]
    fn single_parent_visit_has_no_bonus() {
        let node = MctsNode {
            prev_move: Some(0usize),
            visits: 1,
            total_reward: 1.0,
        };
        assert_eq!(node.score(1, DEFAULT_EXPLORATION_CONSTANT), 1.0);
    }

    #[test]
    fn decisive_reward_alternates() {
        let reward = Reward::win();
        assert_eq!(reward.for_parent(), Reward::loss());
        assert_eq!(reward.for_parent().for_parent(), Reward::win());
    }

    #[test]
    fn draw_stays_zero() {
        let mut reward = Reward::Draw;
        for _ in 0..5 {
            assert_eq!(reward.value(), 0.0);
            reward = reward.for_parent();
        }
        assert_eq!(reward, Reward::Draw);
    }

    #[test]
    fn record_counts_visit() {
        let mut node = MctsNode::new(2usize);
        node.record(Reward::win());
        node.record(Reward::Draw);
        assert_eq!(node.visits, 2);
        assert_eq!(node.total_reward, 1.0);
        assert_eq!(node.average_reward(), 0.5);
    }
}
