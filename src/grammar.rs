//! The symbolic-regression grammar.
//!
//! Trees are built from four operators - `add`, `sub`, `mul` (arity 2) and
//! `neg` (arity 1) - over a single free variable `x` and ephemeral integer
//! constants. A constant's value is sampled once from `[-1, 1]` when the
//! terminal is created and is fixed for the life of the tree.

use crate::gp::expr::{self, gen, Evaluate, NodeIndex, Tree};
use petgraph::visit::EdgeRef;
use petgraph::Incoming;
use rand::Rng;

/// Inclusive bounds for ephemeral constant values.
const CONST_MIN: i32 = -1;
const CONST_MAX: i32 = 1;

/// The operators usable within an expression tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Op {
    /// `a + b`
    Add,
    /// `a - b`
    Sub,
    /// `a * b`
    Mul,
    /// `-a`
    Neg,
}

/// The leaves of an expression tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Terminal {
    /// The free variable `x`.
    Var,
    /// An ephemeral constant, fixed at creation time.
    Const(i32),
}

/// The node type used within symbolic-regression expression trees.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// An operator application.
    Op(Op),
    /// A leaf.
    Terminal(Terminal),
}

/// The tree type representing a candidate expression.
pub type Expr = Tree<Node>;

// Arity impls.

impl gen::Arity for Op {
    fn arity(&self) -> u32 {
        match *self {
            Op::Add | Op::Sub | Op::Mul => 2,
            Op::Neg => 1,
        }
    }
}

impl gen::Arity for Node {
    fn arity(&self) -> u32 {
        match *self {
            Node::Op(ref op) => op.arity(),
            Node::Terminal(_) => 0,
        }
    }
}

// Generation impls.

impl gen::Function for Op {
    fn generate<R>(rng: &mut R) -> Self
    where
        R: Rng,
    {
        match rng.gen_range(0..4) {
            0 => Op::Sub,
            1 => Op::Mul,
            2 => Op::Add,
            3 => Op::Neg,
            _ => unreachable!(),
        }
    }
}

impl gen::Function for Node {
    fn generate<R>(rng: &mut R) -> Self
    where
        R: Rng,
    {
        Node::Op(gen::Function::generate(rng))
    }
}

impl gen::Terminal for Terminal {
    fn generate<R>(rng: &mut R) -> Self
    where
        R: Rng,
    {
        if rng.gen::<bool>() {
            Terminal::Var
        } else {
            Terminal::Const(rng.gen_range(CONST_MIN..=CONST_MAX))
        }
    }
}

impl gen::Terminal for Node {
    fn generate<R>(rng: &mut R) -> Self
    where
        R: Rng,
    {
        Node::Terminal(gen::Terminal::generate(rng))
    }
}

// Evaluate impl. The environment is the value of the free variable.

impl Evaluate<f64> for Node {
    type Value = f64;
    fn evaluate(&self, operands: &[&f64], x: &f64) -> f64 {
        match *self {
            Node::Terminal(Terminal::Var) => *x,
            Node::Terminal(Terminal::Const(c)) => f64::from(c),
            Node::Op(ref op) => match *op {
                Op::Add => *operands[0] + *operands[1],
                Op::Sub => *operands[0] - *operands[1],
                Op::Mul => *operands[0] * *operands[1],
                Op::Neg => -*operands[0],
            },
        }
    }
}

/// Render the tree as a fully parenthesized infix algebraic string, ready
/// for an external computer-algebra system to simplify or expand.
///
/// A lone variable renders as `x`; `add(x, x)` renders as `(x + x)`;
/// `neg(a)` renders as `(-a)`.
pub fn to_algebraic(tree: &Expr) -> String {
    render(tree, expr::root())
}

fn render(tree: &Expr, nx: NodeIndex) -> String {
    let mut children = tree
        .edges_directed(nx, Incoming)
        .map(|e| (*e.weight(), e.source()))
        .collect::<Vec<_>>();
    children.sort_by_key(|&(slot, _)| slot);

    match tree[nx] {
        Node::Terminal(Terminal::Var) => "x".to_string(),
        Node::Terminal(Terminal::Const(c)) => c.to_string(),
        Node::Op(op) => {
            let infix = |sym: &str| {
                format!(
                    "({} {} {})",
                    render(tree, children[0].1),
                    sym,
                    render(tree, children[1].1),
                )
            };
            match op {
                Op::Add => infix("+"),
                Op::Sub => infix("-"),
                Op::Mul => infix("*"),
                Op::Neg => format!("(-{})", render(tree, children[0].1)),
            }
        }
    }
}
