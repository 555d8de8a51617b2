//! The generational evolutionary algorithm.
//!
//! One [`run`] owns the whole lifecycle: build the initial population,
//! evaluate it, then repeatedly select a mating pool by tournament, vary it
//! by crossover and mutation, and replace the population wholesale. The best
//! individual ever seen is kept aside by an [`EliteTracker`] and returned
//! once the generation budget is spent.
//!
//! The random number generator is owned by the loop and threaded into every
//! operator that needs randomness, so a fixed seed yields an identical
//! sequence of statistics and an identical final elite.

use crate::error::{ConfigError, Error, EvalError};
use crate::gp::{expr, ops};
use crate::grammar::Expr;
use crate::stats::{Elite, EliteTracker, GenerationStats, Summary};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scoped_threadpool::Pool as ThreadPool;
use std::sync::mpsc;

/// Parameters of one evolutionary run.
///
/// The defaults reproduce the reference setup: 600 individuals for 172
/// generations with crossover 0.85, mutation 0.15, tournaments of 3 and a
/// 60-point sample grid from -3.0 to 2.9.
#[derive(Clone, Debug)]
pub struct Config {
    /// The fixed population size N.
    pub population_size: usize,
    /// Total number of generations, counting generation 0.
    pub generations: usize,
    /// Probability that a consecutive pair in the mating pool is crossed.
    pub crossover_prob: f64,
    /// Probability that a pool member is mutated.
    pub mutation_prob: f64,
    /// Number of competitors per tournament.
    pub tournament_size: usize,
    /// The inputs over which mean squared error is measured.
    pub sample_points: Vec<f64>,
    /// Seed for the run's random number generator. `Some` makes the run
    /// reproducible; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            population_size: 600,
            generations: 172,
            crossover_prob: 0.85,
            mutation_prob: 0.15,
            tournament_size: 3,
            sample_points: default_sample_grid(),
            seed: None,
        }
    }
}

impl Config {
    /// Reject impossible configurations before any evolutionary work starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.generations == 0 {
            return Err(ConfigError::NoGenerations);
        }
        for (name, value) in [
            ("crossover", self.crossover_prob),
            ("mutation", self.mutation_prob),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ProbabilityOutOfRange { name, value });
            }
        }
        if self.tournament_size == 0 || self.tournament_size > self.population_size {
            return Err(ConfigError::InvalidTournamentSize {
                size: self.tournament_size,
                population: self.population_size,
            });
        }
        if self.sample_points.is_empty() {
            return Err(ConfigError::EmptySampleGrid);
        }
        Ok(())
    }
}

/// The reference sample grid: 60 evenly spaced points, `x = (i - 30) / 10`
/// for `i` in `0..60` (-3.0 to 2.9, step 0.1).
pub fn default_sample_grid() -> Vec<f64> {
    (0..60).map(|i| f64::from(i - 30) / 10.0).collect()
}

/// The outcome of a completed run.
#[derive(Debug)]
pub struct Run {
    /// The best individual found across all generations.
    pub elite: Elite,
    /// One statistics record per generation, starting at generation 0.
    pub stats: Vec<GenerationStats>,
}

/// One population member: a tree plus its cached fitness.
///
/// The fitness is `None` until evaluated and is invalidated whenever the
/// genotype changes.
#[derive(Clone, Debug)]
struct Individual {
    tree: Expr,
    fitness: Option<f64>,
}

impl Individual {
    fn new(tree: Expr) -> Self {
        Individual {
            tree,
            fitness: None,
        }
    }
}

/// Scores trees by mean squared error against precomputed target values.
struct Evaluator {
    points: Vec<f64>,
    targets: Vec<f64>,
}

impl Evaluator {
    /// Build an evaluator by sampling the target function once over the grid.
    fn new<F>(points: Vec<f64>, target: F) -> Result<Self, ConfigError>
    where
        F: Fn(f64) -> f64,
    {
        if points.is_empty() {
            return Err(ConfigError::EmptySampleGrid);
        }
        let targets = points.iter().map(|&x| target(x)).collect();
        Ok(Evaluator { points, targets })
    }

    /// Mean squared error of the tree over the sample grid.
    ///
    /// Squared errors are accumulated with Neumaier compensation so the
    /// result does not drift with grid size.
    fn mse(&self, tree: &Expr) -> Result<f64, EvalError> {
        let mut sum = 0.0;
        let mut compensation = 0.0;
        for (&x, &target) in self.points.iter().zip(&self.targets) {
            let diff = expr::eval(tree, &x)? - target;
            let term = diff * diff;
            let new_sum = sum + term;
            compensation += if sum.abs() >= term.abs() {
                (sum - new_sum) + term
            } else {
                (term - new_sum) + sum
            };
            sum = new_sum;
        }
        Ok((sum + compensation) / self.points.len() as f64)
    }

    /// Fill in the cached fitness of every individual that lacks one.
    ///
    /// Evaluation is farmed out to the thread pool; each result is written
    /// back by population index, so the outcome is identical to serial
    /// evaluation regardless of scheduling. The first evaluation failure
    /// (by population index) aborts the run.
    fn evaluate_population(
        &self,
        pool: &mut ThreadPool,
        population: &mut [Individual],
    ) -> Result<(), EvalError> {
        let (tx, rx) = mpsc::channel();
        {
            let shared: &[Individual] = population;
            pool.scoped(|scoped| {
                let pending = shared
                    .iter()
                    .enumerate()
                    .filter(|(_, indv)| indv.fitness.is_none());
                for (i, indv) in pending {
                    let tx = tx.clone();
                    let evaluator = &*self;
                    scoped.execute(move || {
                        tx.send((i, evaluator.mse(&indv.tree)))
                            .expect("fitness receiver dropped");
                    });
                }
            });
        }
        drop(tx);
        let mut results = rx.iter().collect::<Vec<_>>();
        results.sort_by_key(|&(i, _)| i);
        for (i, result) in results {
            population[i].fitness = Some(result?);
        }
        Ok(())
    }
}

/// Collect every cached fitness, failing if any individual lacks one.
fn fitness_of(population: &[Individual]) -> Result<Vec<f64>, EvalError> {
    population
        .iter()
        .map(|indv| indv.fitness.ok_or(EvalError::MissingFitness))
        .collect()
}

/// Form the next generation's starting pool by tournament selection.
fn select<R>(rng: &mut R, population: &[Individual], tournament_size: usize) -> Result<Vec<Individual>, EvalError>
where
    R: Rng,
{
    let fitness = fitness_of(population)?;
    Ok((0..population.len())
        .map(|_| population[ops::tournament(rng, &fitness, tournament_size)].clone())
        .collect())
}

/// Apply crossover to consecutive disjoint pairs and mutation to each member
/// of the pool, invalidating the fitness of everything that changed.
fn vary<R>(rng: &mut R, pool: &mut [Individual], crossover_prob: f64, mutation_prob: f64)
where
    R: Rng,
{
    for i in (1..pool.len()).step_by(2) {
        if rng.gen_bool(crossover_prob) {
            let (a, b) =
                ops::crossover_bounded(rng, &pool[i - 1].tree, &pool[i].tree, ops::MAX_HEIGHT);
            pool[i - 1] = Individual::new(a);
            pool[i] = Individual::new(b);
        }
    }
    for indv in pool.iter_mut() {
        if rng.gen_bool(mutation_prob) {
            indv.tree = ops::mutate_bounded(rng, &indv.tree, ops::MAX_HEIGHT);
            indv.fitness = None;
        }
    }
}

/// Run the full generational algorithm against the given target function.
///
/// Returns the best-of-run elite together with one statistics record per
/// generation. Identical seed and configuration produce identical results.
pub fn run<F>(config: &Config, target: F) -> Result<Run, Error>
where
    F: Fn(f64) -> f64,
{
    config.validate()?;
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let evaluator = Evaluator::new(config.sample_points.clone(), target)?;
    let mut pool = ThreadPool::new(num_cpus::get() as u32);

    info!(
        "starting run: {} individuals, {} generations, cx {}, mut {}, tournament {}",
        config.population_size,
        config.generations,
        config.crossover_prob,
        config.mutation_prob,
        config.tournament_size,
    );

    // Generation 0: independently generated trees, no cross-tree correlation.
    let mut population = (0..config.population_size)
        .map(|_| Individual::new(expr::gen(&mut rng, 1, 2)))
        .collect::<Vec<_>>();

    let mut tracker = EliteTracker::new();
    let mut stats = Vec::with_capacity(config.generations);

    for generation in 0..config.generations {
        if generation > 0 {
            let mut offspring = select(&mut rng, &population, config.tournament_size)?;
            vary(
                &mut rng,
                &mut offspring,
                config.crossover_prob,
                config.mutation_prob,
            );
            population = offspring;
        }

        evaluator.evaluate_population(&mut pool, &mut population)?;

        let fitness = fitness_of(&population)?;
        for (indv, &fit) in population.iter().zip(&fitness) {
            tracker.consider(generation, fit, &indv.tree);
        }
        let sizes = population
            .iter()
            .map(|indv| expr::size(&indv.tree) as f64)
            .collect::<Vec<_>>();
        let record = GenerationStats {
            generation,
            fitness: Summary::of(&fitness),
            size: Summary::of(&sizes),
        };
        debug!(
            "gen {:>4}: fitness min {:.6} mean {:.6}, size mean {:.1}",
            generation, record.fitness.min, record.fitness.mean, record.size.mean,
        );
        stats.push(record);
    }

    let elite = tracker
        .into_best()
        .expect("at least one generation must have been observed");
    info!(
        "run complete: elite fitness {:.6}, found in generation {}",
        elite.fitness, elite.generation,
    );
    Ok(Run { elite, stats })
}

/// Sum of absolute errors of a tree against validation coordinate pairs.
///
/// This is the post-run quality report against an independently sourced
/// dataset, not part of the evolutionary loop itself.
pub fn error_margin(tree: &Expr, coordinates: &[(f64, f64)]) -> Result<f64, EvalError> {
    let mut margin = 0.0;
    for &(input, output) in coordinates {
        margin += (expr::eval(tree, &input)? - output).abs();
    }
    Ok(margin)
}
