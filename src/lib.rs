//! Symbolic regression via genetic programming.
//!
//! A population of expression trees is evolved against a target function:
//!
//! 1. Initialise a *Population* of random expression trees.
//! 2. Evaluate the *Fitness* of each tree (mean squared error over a fixed
//!    sample grid - lower is better).
//! 3. Form a mating pool via tournament selection, then apply subtree
//!    crossover and subtree mutation to produce the next generation.
//! 4. If the generation budget is spent, we're done.
//! 5. GOTO 2.
//!
//! The best tree ever seen is retained outside the population by an
//! [`stats::EliteTracker`] and can be rendered as an infix algebraic string
//! via [`grammar::to_algebraic`] for external symbolic simplification.

pub mod dataset;
pub mod ea;
mod error;
pub mod gp;
pub mod grammar;
pub mod stats;

pub use ea::{error_margin, run, Config, Run};
pub use error::{ConfigError, DatasetError, Error, EvalError};
pub use grammar::{to_algebraic, Expr};
pub use stats::{Elite, GenerationStats, Summary};
