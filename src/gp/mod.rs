//! Common items related to Genetic Programming.
//!
//! Expressions are trees of nodes with some level of arity - aka the number
//! of operands. `expr` holds the generic tree machinery (generation, subtree
//! surgery, evaluation); `ops` holds the genetic operators that act on those
//! trees (selection, crossover, mutation and the height-limit guard).

pub mod expr;
pub mod ops;
