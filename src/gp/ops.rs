//! Genetic operators over expression trees.
//!
//! Selection is by tournament, variation is one-point subtree crossover and
//! uniform subtree mutation. Crossover and mutation come in `_bounded`
//! variants wrapping the raw operator with a height-limit guard that keeps
//! tree bloat in check.

use super::expr::{self, gen, NodeIndex, Tree};
use rand::Rng;
use std::cmp::Ordering;

/// The maximum height a crossover or mutation result may reach before the
/// height-limit guard discards it in favour of an unmodified parent.
pub const MAX_HEIGHT: u32 = 17;

/// Depth bounds for the subtrees grown by uniform mutation.
const MUTATION_MIN_DEPTH: u32 = 0;
const MUTATION_MAX_DEPTH: u32 = 2;

/// Tournament selection: draw `k` distinct competitors uniformly at random
/// and return the index of the one with the lowest fitness.
///
/// Draws within one tournament are without replacement; NaN fitness never
/// wins against a comparable value. `k` must be in `1..=fitness.len()`,
/// which the run configuration guarantees.
pub fn tournament<R>(rng: &mut R, fitness: &[f64], k: usize) -> usize
where
    R: Rng,
{
    rand::seq::index::sample(rng, fitness.len(), k)
        .iter()
        .min_by(|&a, &b| {
            fitness[a].partial_cmp(&fitness[b]).unwrap_or_else(|| {
                // Incomparable means at least one side is NaN; order the
                // NaN side as the worse of the two.
                if fitness[a].is_nan() {
                    Ordering::Greater
                } else {
                    Ordering::Less
                }
            })
        })
        .expect("tournament must have at least one competitor")
}

/// One-point subtree crossover.
///
/// Picks a uniformly random node in each parent (the root is eligible) and
/// exchanges the subtrees rooted there, producing two children.
pub fn crossover<R, N>(rng: &mut R, a: &Tree<N>, b: &Tree<N>) -> (Tree<N>, Tree<N>)
where
    R: Rng,
    N: Clone,
{
    let ax = NodeIndex::new(rng.gen_range(0..a.node_count()));
    let bx = NodeIndex::new(rng.gen_range(0..b.node_count()));
    let a_sub = expr::clone_subtree(a, ax);
    let b_sub = expr::clone_subtree(b, bx);
    (
        expr::replace_subtree(a, ax, &b_sub),
        expr::replace_subtree(b, bx, &a_sub),
    )
}

/// Uniform subtree mutation.
///
/// Picks a uniformly random node and replaces the subtree rooted there with
/// a freshly grown subtree of depth `0..=2`.
pub fn mutate<R, N>(rng: &mut R, tree: &Tree<N>) -> Tree<N>
where
    R: Rng,
    N: gen::Node + Clone,
{
    let nx = NodeIndex::new(rng.gen_range(0..tree.node_count()));
    let sub = gen::grow_tree(rng, MUTATION_MIN_DEPTH, MUTATION_MAX_DEPTH);
    expr::replace_subtree(tree, nx, &sub)
}

/// Crossover wrapped by the height-limit guard.
///
/// Any child whose height exceeds `max_height` is discarded and replaced by
/// a clone of the first parent.
pub fn crossover_bounded<R, N>(
    rng: &mut R,
    a: &Tree<N>,
    b: &Tree<N>,
    max_height: u32,
) -> (Tree<N>, Tree<N>)
where
    R: Rng,
    N: Clone,
{
    let (child_a, child_b) = crossover(rng, a, b);
    let child_a = if expr::height(&child_a) > max_height {
        a.clone()
    } else {
        child_a
    };
    let child_b = if expr::height(&child_b) > max_height {
        a.clone()
    } else {
        child_b
    };
    (child_a, child_b)
}

/// Mutation wrapped by the height-limit guard.
///
/// If the mutant's height exceeds `max_height` it is discarded and the input
/// tree is returned unmodified.
pub fn mutate_bounded<R, N>(rng: &mut R, tree: &Tree<N>, max_height: u32) -> Tree<N>
where
    R: Rng,
    N: gen::Node + Clone,
{
    let mutant = mutate(rng, tree);
    if expr::height(&mutant) > max_height {
        tree.clone()
    } else {
        mutant
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{to_algebraic, Expr};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn tournament_of_full_population_picks_the_best() {
        let mut rng = StdRng::seed_from_u64(1);
        let fitness = [3.0, 0.5, 2.0, 9.0, 1.5];
        for _ in 0..20 {
            assert_eq!(tournament(&mut rng, &fitness, fitness.len()), 1);
        }
    }

    #[test]
    fn tournament_never_picks_nan_over_a_number() {
        // Draw order within a tournament is random, so run many seeds with
        // the NaN in each slot: it must lose whether it is compared first
        // or second.
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert_eq!(tournament(&mut rng, &[f64::NAN, 5.0], 2), 1);
            assert_eq!(tournament(&mut rng, &[5.0, f64::NAN], 2), 0);
        }
    }

    #[test]
    fn crossover_children_are_well_formed() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let a: Expr = expr::gen(&mut rng, 1, 2);
            let b: Expr = expr::gen(&mut rng, 1, 2);
            let (ca, cb) = crossover(&mut rng, &a, &b);
            assert!(expr::size(&ca) >= 1);
            assert!(expr::size(&cb) >= 1);
            // Node material is conserved by the exchange.
            assert_eq!(
                expr::size(&ca) + expr::size(&cb),
                expr::size(&a) + expr::size(&b)
            );
        }
    }

    #[test]
    fn bounded_crossover_respects_the_height_limit() {
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..50 {
            let a: Expr = expr::gen(&mut rng, 1, 3);
            let b: Expr = expr::gen(&mut rng, 1, 3);
            let (ca, cb) = crossover_bounded(&mut rng, &a, &b, 3);
            assert!(expr::height(&ca) <= 3);
            assert!(expr::height(&cb) <= 3);
        }
    }

    #[test]
    fn over_limit_crossover_substitutes_the_first_parent() {
        let mut rng = StdRng::seed_from_u64(5);
        let a: Expr = expr::gen::full_tree(&mut rng, 2);
        let b: Expr = expr::gen::full_tree(&mut rng, 2);
        // A limit of zero rejects everything but lone terminals, so any
        // operator-rooted child must come back as the first parent.
        let (ca, cb) = crossover_bounded(&mut rng, &a, &b, 0);
        for child in [&ca, &cb] {
            if expr::height(child) > 0 {
                assert_eq!(to_algebraic(child), to_algebraic(&a));
            }
        }
    }

    #[test]
    fn bounded_mutation_respects_the_height_limit() {
        let mut rng = StdRng::seed_from_u64(6);
        for _ in 0..50 {
            let tree: Expr = expr::gen(&mut rng, 1, 3);
            let mutant = mutate_bounded(&mut rng, &tree, MAX_HEIGHT);
            assert!(expr::height(&mutant) <= MAX_HEIGHT);
            assert!(expr::size(&mutant) >= 1);
        }
    }
}
