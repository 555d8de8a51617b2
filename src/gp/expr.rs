//! Items related to expression trees.
//!
//! A tree is stored as a directed graph whose edges point from a child node
//! to its parent. Each node is either a `Function` (an operator application,
//! arity 1 or more) or a `Terminal` (a leaf, arity 0). Edge weights carry the
//! argument slot of the child within its parent, so operand order is well
//! defined even for non-commutative operators.
//!
//! Two structural invariants hold for every tree produced by this module:
//!
//! - The root is always the node at index `0`.
//! - Every child node carries a higher index than its parent (trees are
//!   built breadth-first, and `replace_subtree` appends new nodes after the
//!   retained ones).

use crate::error::EvalError;
use fnv::{FnvHashMap, FnvHashSet};
use petgraph::visit::{EdgeRef, Topo};
use petgraph::{Incoming, Outgoing};
use rand::Rng;
use std::mem;

/// A node/expression type that can be evaluated to a single value.
pub trait Evaluate<E> {
    /// The type of the value produced by the node type.
    type Value;
    /// Evaluate this node in terms of the given operands within the given
    /// environment. Operands arrive in argument-slot order.
    fn evaluate(&self, operands: &[&Self::Value], env: &E) -> Self::Value;
}

/// The directed graph type used to represent an expression tree.
///
/// Edges point from child to parent; the edge weight is the child's argument
/// slot within its parent. A node's operands are found by iterating over its
/// `Incoming` edges and sorting by slot.
pub type Tree<N> = petgraph::graph::DiGraph<N, u32, u32>;

/// The node index type used within the expression tree type.
pub type NodeIndex = petgraph::graph::NodeIndex<u32>;

/// The root of every tree produced by this module.
pub fn root() -> NodeIndex {
    NodeIndex::new(0)
}

/// Generate a random expression tree using the "half and half" policy.
///
/// Each call independently chooses, with equal probability, between
/// [`gen::full_tree`] (with a target depth drawn uniformly from
/// `min_depth..=max_depth`) and [`gen::grow_tree`].
///
/// Depths are measured in edges: a lone terminal has depth `0`.
pub fn gen<R, N>(rng: &mut R, min_depth: u32, max_depth: u32) -> Tree<N>
where
    R: Rng,
    N: gen::Node,
{
    match rng.gen_range(0..2) {
        0 => {
            let depth = rng.gen_range(min_depth..=max_depth);
            gen::full_tree(rng, depth)
        }
        1 => gen::grow_tree(rng, min_depth, max_depth),
        _ => unreachable!(),
    }
}

/// Evaluate the given expression tree within the given environment.
///
/// Nodes are visited in topological order (operands before their operator)
/// and the value at the root is returned. Fails if the tree is empty or if
/// any node's operand count disagrees with its declared arity - both are
/// internal-contract violations, as trees are well-formed by construction.
pub fn eval<N, E>(tree: &Tree<N>, env: &E) -> Result<N::Value, EvalError>
where
    N: Evaluate<E> + gen::Arity,
    N::Value: Clone,
{
    if tree.node_count() == 0 {
        return Err(EvalError::EmptyTree);
    }
    let mut topo = Topo::new(tree);
    let mut evaluated: FnvHashMap<NodeIndex, N::Value> =
        FnvHashMap::with_capacity_and_hasher(tree.node_count(), Default::default());
    while let Some(nx) = topo.next(tree) {
        let value = {
            let mut operands = tree
                .edges_directed(nx, Incoming)
                .map(|e| (*e.weight(), evaluated[&e.source()].clone()))
                .collect::<Vec<_>>();
            operands.sort_by_key(|&(slot, _)| slot);
            if operands.len() != tree[nx].arity() as usize {
                return Err(EvalError::ArityMismatch {
                    expected: tree[nx].arity(),
                    found: operands.len(),
                });
            }
            let operands = operands.iter().map(|(_, v)| v).collect::<Vec<_>>();
            N::evaluate(&tree[nx], &operands[..], env)
        };
        evaluated.insert(nx, value);
    }
    evaluated.remove(&root()).ok_or(EvalError::EmptyTree)
}

/// The number of nodes within the tree.
pub fn size<N>(tree: &Tree<N>) -> usize {
    tree.node_count()
}

/// The maximum root-to-leaf edge count of the tree.
///
/// A lone terminal has height `0`; an empty tree is also reported as `0`.
pub fn height<N>(tree: &Tree<N>) -> u32 {
    if tree.node_count() == 0 {
        return 0;
    }
    let mut curr = vec![root()];
    let mut next = vec![];
    let mut height = 0;
    loop {
        for a in curr.drain(..) {
            for e in tree.edges_directed(a, Incoming) {
                next.push(e.source());
            }
        }
        if next.is_empty() {
            return height;
        }
        height += 1;
        mem::swap(&mut curr, &mut next);
    }
}

/// Clone the subtree whose root is at the given node into a new tree.
pub fn clone_subtree<N>(tree: &Tree<N>, subtree_root: NodeIndex) -> Tree<N>
where
    N: Clone,
{
    let mut subtree = Tree::new();

    // Add the root without adding any outgoing edges.
    let new_root = subtree.add_node(tree[subtree_root].clone());

    // For all others, add both nodes and their edges into their parent.
    let mut curr = vec![(subtree_root, new_root)];
    let mut next = vec![];
    while !curr.is_empty() {
        for (old, new) in curr.drain(..) {
            for e in tree.edges_directed(old, Incoming) {
                let child = subtree.add_node(tree[e.source()].clone());
                subtree.add_edge(child, new, *e.weight());
                next.push((e.source(), child));
            }
        }
        mem::swap(&mut curr, &mut next);
    }

    subtree
}

/// Replace the subtree rooted at `nx` with the given subtree, returning the
/// resulting tree.
///
/// The replaced subtree's nodes all carry indices greater than or equal to
/// `nx`, so retained nodes below `nx` - in particular the root and the
/// replaced node's parent - keep their indices through the compaction;
/// retained nodes above `nx` shift down but stay in relative order, which
/// preserves the child-above-parent invariant.
pub fn replace_subtree<N>(tree: &Tree<N>, nx: NodeIndex, subtree: &Tree<N>) -> Tree<N>
where
    N: Clone,
{
    // Collect the nodes that make way for the new subtree. Edges point from
    // child to parent, so the subtree is reached along `Incoming` edges.
    let mut removed = FnvHashSet::default();
    let mut queue = vec![nx];
    while let Some(n) = queue.pop() {
        if removed.insert(n) {
            queue.extend(tree.edges_directed(n, Incoming).map(|e| e.source()));
        }
    }

    // Clone the original tree, discluding the replaced subtree.
    let mut new_tree = tree.filter_map(
        |n, w| if removed.contains(&n) { None } else { Some(w.clone()) },
        |_, w| Some(*w),
    );

    // Attach the root of the new subtree in place of `nx`, keeping the
    // argument slot it occupied within its parent.
    let sub_root = NodeIndex::new(0);
    let new_root = new_tree.add_node(subtree[sub_root].clone());
    for e in tree.edges_directed(nx, Outgoing) {
        new_tree.add_edge(new_root, e.target(), *e.weight());
    }

    // Clone the rest of the subtree breadth-first.
    let mut curr = vec![(sub_root, new_root)];
    let mut next = vec![];
    while !curr.is_empty() {
        for (old, new) in curr.drain(..) {
            for e in subtree.edges_directed(old, Incoming) {
                let child = new_tree.add_node(subtree[e.source()].clone());
                new_tree.add_edge(child, new, *e.weight());
                next.push((e.source(), child));
            }
        }
        mem::swap(&mut curr, &mut next);
    }

    new_tree
}

/// Functions for generating random expression trees.
pub mod gen {
    use super::Tree;
    use rand::Rng;
    use std::mem;

    /// Node types that know their number of operands.
    pub trait Arity {
        /// The number of operands to the node.
        ///
        /// Function nodes will return 1 or more. Terminal nodes will return 0.
        fn arity(&self) -> u32;
    }

    /// Function types that may be generated for use within an expression.
    pub trait Function: Arity {
        /// Generate an instance of this Function type.
        fn generate<R>(rng: &mut R) -> Self
        where
            R: Rng;
    }

    /// Terminal types that may be generated for use within an expression.
    pub trait Terminal {
        /// Generate an instance of this Terminal type.
        fn generate<R>(rng: &mut R) -> Self
        where
            R: Rng;
    }

    /// Expression nodes that may be generated.
    pub trait Node: Function + Terminal {}

    impl<T> Node for T where T: Function + Terminal {}

    /// Generate an expression tree using the "full" approach.
    ///
    /// Every position above the target depth is a `Function`; every position
    /// at the target depth is a `Terminal`. `depth` is measured in edges, so
    /// `full_tree(rng, 0)` is a lone terminal.
    ///
    /// The "root" or "output" of the expression is the node at index `0`.
    /// Nodes are generated in breadth-first order.
    pub fn full_tree<R, N>(rng: &mut R, depth: u32) -> Tree<N>
    where
        R: Rng,
        N: Node,
    {
        let mut g = Tree::new();
        if depth == 0 {
            g.add_node(Terminal::generate(rng));
            return g;
        }

        // Fill each depth level one at a time.
        let mut curr = vec![g.add_node(Function::generate(rng))];
        let mut next = vec![];
        for _ in 1..depth {
            for a in curr.drain(..) {
                for slot in 0..g[a].arity() {
                    let b = g.add_node(Function::generate(rng));
                    g.add_edge(b, a, slot);
                    next.push(b);
                }
            }
            mem::swap(&mut curr, &mut next);
        }

        // Generate the final depth of nodes.
        for a in curr.drain(..) {
            for slot in 0..g[a].arity() {
                let b = g.add_node(Terminal::generate(rng));
                g.add_edge(b, a, slot);
            }
        }

        g
    }

    /// Generate an expression tree using the "grow" approach.
    ///
    /// The tree is "grown" by randomly choosing between functions and
    /// terminals for each position. Terminals are forbidden above
    /// `min_depth` and forced at `max_depth`; in between, a terminal becomes
    /// more likely the closer the position is to the maximum.
    pub fn grow_tree<R, N>(rng: &mut R, min_depth: u32, max_depth: u32) -> Tree<N>
    where
        R: Rng,
        N: Node,
    {
        let mut g = Tree::new();
        if max_depth == 0 || (min_depth == 0 && rng.gen_range(0..=max_depth) == 0) {
            g.add_node(Terminal::generate(rng));
            return g;
        }

        // Fill each depth level one at a time.
        let mut curr = vec![g.add_node(Function::generate(rng))];
        let mut next = vec![];
        for d in 1..=max_depth {
            for a in curr.drain(..) {
                for slot in 0..g[a].arity() {
                    let terminal =
                        d >= min_depth && rng.gen_range(0..=(max_depth - d)) == 0;
                    let b = if terminal {
                        g.add_node(Terminal::generate(rng))
                    } else {
                        let b = g.add_node(Function::generate(rng));
                        next.push(b);
                        b
                    };
                    g.add_edge(b, a, slot);
                }
            }
            mem::swap(&mut curr, &mut next);
        }

        g
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Expr, Node};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn well_formed(tree: &Expr) {
        assert!(tree.node_count() >= 1);
        for nx in tree.node_indices() {
            let children = tree.edges_directed(nx, Incoming).count();
            assert_eq!(children as u32, gen::Arity::arity(&tree[nx]));
        }
    }

    #[test]
    fn full_tree_has_exact_height() {
        let mut rng = StdRng::seed_from_u64(7);
        for depth in 0..4 {
            for _ in 0..20 {
                let tree: Expr = gen::full_tree(&mut rng, depth);
                well_formed(&tree);
                assert_eq!(height(&tree), depth);
            }
        }
    }

    #[test]
    fn grow_tree_respects_depth_bounds() {
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..100 {
            let tree: Expr = gen::grow_tree(&mut rng, 0, 3);
            well_formed(&tree);
            assert!(height(&tree) <= 3);
        }
        for _ in 0..100 {
            let tree: Expr = gen::grow_tree(&mut rng, 1, 3);
            assert!(height(&tree) >= 1);
            assert!(height(&tree) <= 3);
        }
    }

    #[test]
    fn half_and_half_generator_is_well_formed() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            let tree: Expr = gen(&mut rng, 1, 2);
            well_formed(&tree);
            assert!(height(&tree) >= 1);
            assert!(height(&tree) <= 2);
        }
    }

    #[test]
    fn clone_subtree_extracts_a_well_formed_tree() {
        let mut rng = StdRng::seed_from_u64(10);
        let tree: Expr = gen::full_tree(&mut rng, 3);
        for nx in tree.node_indices() {
            let sub = clone_subtree(&tree, nx);
            well_formed(&sub);
            assert!(size(&sub) <= size(&tree));
        }
    }

    #[test]
    fn replace_subtree_preserves_well_formedness() {
        let mut rng = StdRng::seed_from_u64(11);
        let tree: Expr = gen::full_tree(&mut rng, 3);
        let sub: Expr = gen::grow_tree(&mut rng, 0, 2);
        for nx in tree.node_indices() {
            let new = replace_subtree(&tree, nx, &sub);
            well_formed(&new);
            let expected = size(&tree) - size(&clone_subtree(&tree, nx)) + size(&sub);
            assert_eq!(size(&new), expected);
        }
    }

    #[test]
    fn replace_subtree_at_root_yields_the_subtree() {
        let mut rng = StdRng::seed_from_u64(12);
        let tree: Expr = gen::full_tree(&mut rng, 2);
        let sub: Expr = gen::full_tree(&mut rng, 1);
        let new = replace_subtree(&tree, root(), &sub);
        assert_eq!(size(&new), size(&sub));
        assert_eq!(height(&new), height(&sub));
    }

    #[test]
    fn eval_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(13);
        let tree: Expr = gen(&mut rng, 1, 2);
        let a = eval::<Node, f64>(&tree, &1.5).unwrap();
        let b = eval::<Node, f64>(&tree, &1.5).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn eval_of_empty_tree_fails() {
        let tree = Expr::new();
        assert_eq!(
            eval::<Node, f64>(&tree, &0.0),
            Err(crate::error::EvalError::EmptyTree)
        );
    }
}
