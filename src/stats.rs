//! Per-generation statistics and the best-of-run elite tracker.

use crate::gp::expr;
use crate::grammar::Expr;
use crate::EvalError;

/// Aggregate measures of one quantity across a population.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Summary {
    /// The smallest observed value.
    pub min: f64,
    /// The largest observed value.
    pub max: f64,
    /// The arithmetic mean.
    pub mean: f64,
    /// The population standard deviation.
    pub std_dev: f64,
}

impl Summary {
    /// Summarise the given non-empty sequence of values.
    pub fn of(values: &[f64]) -> Self {
        let n = values.len() as f64;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for &v in values {
            min = min.min(v);
            max = max.max(v);
            sum += v;
        }
        let mean = sum / n;
        let variance = values.iter().map(|&v| (v - mean) * (v - mean)).sum::<f64>() / n;
        Summary {
            min,
            max,
            mean,
            std_dev: variance.sqrt(),
        }
    }
}

/// Fitness and size summaries for a single generation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GenerationStats {
    /// The generation these summaries describe, starting at 0 for the
    /// initial population.
    pub generation: usize,
    /// Fitness across the population (lower is better).
    pub fitness: Summary,
    /// Tree size (node count) across the population.
    pub size: Summary,
}

/// The single best individual found across a whole run.
#[derive(Clone, Debug)]
pub struct Elite {
    /// The winning expression tree.
    pub tree: Expr,
    /// Its mean squared error over the sample grid.
    pub fitness: f64,
    /// The generation in which it was first found.
    pub generation: usize,
}

impl Elite {
    /// Evaluate the winning expression at the given input.
    pub fn evaluate(&self, x: f64) -> Result<f64, EvalError> {
        expr::eval(&self.tree, &x)
    }
}

/// Retains the best individual seen so far, outside the regular population
/// replacement cycle.
///
/// The tracked fitness is monotonically non-worsening across generations;
/// ties are broken in favour of the earliest find.
#[derive(Debug, Default)]
pub struct EliteTracker {
    best: Option<Elite>,
}

impl EliteTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer one individual to the tracker. The tree is only cloned when it
    /// strictly improves on the current best.
    pub fn consider(&mut self, generation: usize, fitness: f64, tree: &Expr) {
        let improves = match self.best {
            None => true,
            // Strict improvement only, so the earliest find wins ties. A NaN
            // incumbent is displaced by any comparable fitness.
            Some(ref best) => fitness < best.fitness || (best.fitness.is_nan() && !fitness.is_nan()),
        };
        if improves {
            self.best = Some(Elite {
                tree: tree.clone(),
                fitness,
                generation,
            });
        }
    }

    /// The best individual found so far, if any generation has been observed.
    pub fn best(&self) -> Option<&Elite> {
        self.best.as_ref()
    }

    /// Consume the tracker, yielding the best individual found.
    pub fn into_best(self) -> Option<Elite> {
        self.best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Node, Terminal};

    fn var_tree() -> Expr {
        let mut tree = Expr::new();
        tree.add_node(Node::Terminal(Terminal::Var));
        tree
    }

    #[test]
    fn summary_of_known_values() {
        let s = Summary::of(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(s.min, 2.0);
        assert_eq!(s.max, 9.0);
        assert_eq!(s.mean, 5.0);
        assert_eq!(s.std_dev, 2.0);
    }

    #[test]
    fn summary_of_a_single_value() {
        let s = Summary::of(&[3.5]);
        assert_eq!(s.min, 3.5);
        assert_eq!(s.max, 3.5);
        assert_eq!(s.mean, 3.5);
        assert_eq!(s.std_dev, 0.0);
    }

    #[test]
    fn tracker_is_monotone_and_first_find_wins_ties() {
        let tree = var_tree();
        let mut tracker = EliteTracker::new();
        tracker.consider(0, 5.0, &tree);
        assert_eq!(tracker.best().unwrap().fitness, 5.0);

        // A worse individual changes nothing.
        tracker.consider(1, 6.0, &tree);
        assert_eq!(tracker.best().unwrap().generation, 0);

        // An equal individual does not displace the earlier find.
        tracker.consider(2, 5.0, &tree);
        assert_eq!(tracker.best().unwrap().generation, 0);

        // A strictly better one does.
        tracker.consider(3, 4.0, &tree);
        let best = tracker.best().unwrap();
        assert_eq!(best.fitness, 4.0);
        assert_eq!(best.generation, 3);
    }

    #[test]
    fn nan_incumbent_is_displaced() {
        let tree = var_tree();
        let mut tracker = EliteTracker::new();
        tracker.consider(0, f64::NAN, &tree);
        tracker.consider(1, 100.0, &tree);
        assert_eq!(tracker.best().unwrap().fitness, 100.0);
    }
}
