//! Error kinds surfaced by the crate.
//!
//! Configuration problems are caught before the evolutionary loop starts and
//! are never retried. Evaluation errors indicate a violated internal contract
//! (trees are well-formed by construction) and abort the whole run.

use thiserror::Error;

/// A rejected run configuration. Raised by `Config::validate` before any
/// evolutionary work happens.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The population must contain at least one individual.
    #[error("population size must be greater than zero")]
    EmptyPopulation,
    /// At least one generation (generation 0) must run.
    #[error("generation count must be greater than zero")]
    NoGenerations,
    /// Crossover and mutation probabilities must lie within `[0, 1]`.
    #[error("{name} probability {value} is outside [0, 1]")]
    ProbabilityOutOfRange {
        /// Which probability was rejected.
        name: &'static str,
        /// The offending value.
        value: f64,
    },
    /// Tournament size must be in `1..=population_size`.
    #[error("tournament size {size} is invalid for a population of {population}")]
    InvalidTournamentSize {
        /// The configured tournament size.
        size: usize,
        /// The configured population size.
        population: usize,
    },
    /// The fitness sample grid may not be empty.
    #[error("the fitness sample grid is empty")]
    EmptySampleGrid,
}

/// A violated tree contract encountered during evaluation.
#[derive(Debug, Error, PartialEq)]
pub enum EvalError {
    /// A tree must always contain at least a root terminal.
    #[error("expression tree has no nodes")]
    EmptyTree,
    /// An operator node's child count disagreed with its declared arity.
    #[error("node arity mismatch: expected {expected} operands, found {found}")]
    ArityMismatch {
        /// The node's declared arity.
        expected: u32,
        /// The number of operands actually attached.
        found: usize,
    },
    /// Selection was attempted over an individual without a cached fitness.
    #[error("individual is missing a cached fitness")]
    MissingFitness,
}

/// A failure while loading a validation coordinate file.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The file could not be read.
    #[error("failed to read validation file")]
    Io(#[from] std::io::Error),
    /// A line did not parse as `(<input> <output>)`.
    #[error("malformed coordinate on line {line}: {text:?}")]
    MalformedLine {
        /// 1-based line number of the offending line.
        line: usize,
        /// The offending line's text.
        text: String,
    },
}

/// Any failure produced by a full evolutionary run.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration was rejected up front.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// An internal tree contract was violated mid-run.
    #[error(transparent)]
    Eval(#[from] EvalError),
}
