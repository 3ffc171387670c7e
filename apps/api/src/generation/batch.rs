//! Dedup/Resume Loop — fills `provocations.json` up to a target size.
//!
//! Resumes from whatever the store already holds, skips tasks it has already
//! seen, persists after every accepted provocation, and backs off
//! exponentially while the generator is rate limited. A failed save is
//! treated like any other unexpected failure: pause, then carry on. Whether the run reaches
//! its target or is interrupted, the collection is saved once more on the way
//! out.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{error, info, warn};

use crate::generation::generator::generate_for_thinker;
use crate::llm_client::TextGenerator;
use crate::models::provocation::Provocation;
use crate::models::thinker::Thinker;
use crate::store::ProvocationStore;

#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub target: usize,
    /// Pause after each accepted provocation.
    pub pause: Duration,
    pub initial_backoff: Duration,
    /// Upper bound for the rate-limit backoff. `None` doubles without limit.
    pub max_backoff: Option<Duration>,
    /// Pause after any failure other than rate limiting.
    pub error_pause: Duration,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            target: 200,
            pause: Duration::from_millis(300),
            initial_backoff: Duration::from_secs(5),
            max_backoff: None,
            error_pause: Duration::from_secs(10),
        }
    }
}

/// Doubling delay used while the generator reports rate limiting.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    current: Duration,
    max: Option<Duration>,
}

impl Backoff {
    pub fn new(initial: Duration, max: Option<Duration>) -> Self {
        Self {
            initial,
            current: initial,
            max,
        }
    }

    /// Returns the delay to wait now and doubles the next one.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        let doubled = self.current.saturating_mul(2);
        self.current = match self.max {
            Some(max) => doubled.min(max),
            None => doubled,
        };
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// What one iteration of the loop did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Accepted,
    Duplicate,
    Empty,
    RateLimited(Duration),
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub total: usize,
    pub added: usize,
    pub interrupted: bool,
}

pub struct BatchRunner {
    generator: Arc<dyn TextGenerator>,
    store: Arc<dyn ProvocationStore>,
    thinkers: Vec<Thinker>,
    settings: BatchSettings,
    rng: StdRng,
    collection: Vec<Provocation>,
    seen_tasks: HashSet<String>,
    backoff: Backoff,
    added: usize,
}

impl BatchRunner {
    /// Loads the existing collection so the run resumes where the last one
    /// stopped. Thinkers without seeds are dropped.
    pub async fn new(
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn ProvocationStore>,
        thinkers: Vec<Thinker>,
        settings: BatchSettings,
        rng: StdRng,
    ) -> Result<Self> {
        let (thinkers, seedless): (Vec<_>, Vec<_>) =
            thinkers.into_iter().partition(|t| !t.seeds.is_empty());
        for thinker in &seedless {
            warn!("Skipping thinker '{}': no seeds", thinker.name);
        }
        if thinkers.is_empty() {
            bail!("No thinkers with seeds available");
        }

        let collection = store.load_collection().await?;
        let seen_tasks = collection.iter().filter_map(|p| p.task.clone()).collect();
        let backoff = Backoff::new(settings.initial_backoff, settings.max_backoff);

        info!("Found {} existing provocations.", collection.len());
        info!("Goal is to generate {} total.", settings.target);

        Ok(Self {
            generator,
            store,
            thinkers,
            settings,
            rng,
            collection,
            seen_tasks,
            backoff,
            added: 0,
        })
    }

    pub fn collection(&self) -> &[Provocation] {
        &self.collection
    }

    /// Runs until the target is reached or `shutdown` resolves, then saves the
    /// collection one final time.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<BatchReport>
    where
        F: Future<Output = ()>,
    {
        let outcome = tokio::select! {
            result = self.fill() => result.map(|_| false),
            _ = shutdown => {
                info!("Process interrupted by user.");
                Ok(true)
            }
        };

        info!(
            "Finalizing... saving {} provocations",
            self.collection.len()
        );
        self.store.save_collection(&self.collection).await?;

        Ok(BatchReport {
            total: self.collection.len(),
            added: self.added,
            interrupted: outcome?,
        })
    }

    async fn fill(&mut self) -> Result<()> {
        while self.collection.len() < self.settings.target {
            self.step().await?;
            // Scripted or cached generators may never suspend.
            tokio::task::yield_now().await;
        }
        Ok(())
    }

    /// One generate → dedup → persist iteration.
    pub async fn step(&mut self) -> Result<StepOutcome> {
        let Some(thinker) = self.thinkers.choose(&mut self.rng) else {
            bail!("No thinkers available");
        };

        let result =
            generate_for_thinker(self.generator.as_ref(), thinker, &mut self.rng).await;

        match result {
            Ok(Some(provocation)) => {
                let task = provocation.task.clone().unwrap_or_default();
                if !self.seen_tasks.insert(task.clone()) {
                    info!("Duplicate detected. Skipping.");
                    return Ok(StepOutcome::Duplicate);
                }

                self.collection.push(provocation);
                self.added += 1;
                self.backoff.reset();
                if let Err(e) = self.store.save_collection(&self.collection).await {
                    // The accepted item stays in memory for the next save.
                    error!(
                        "Could not save provocations: {e}. Retrying after {} seconds...",
                        self.settings.error_pause.as_secs_f64()
                    );
                    tokio::time::sleep(self.settings.error_pause).await;
                    return Ok(StepOutcome::Failed);
                }

                info!(
                    "({}/{}) Saved: {}...",
                    self.collection.len(),
                    self.settings.target,
                    task.chars().take(80).collect::<String>()
                );

                tokio::time::sleep(self.settings.pause).await;
                Ok(StepOutcome::Accepted)
            }
            Ok(None) => {
                warn!("Generation failed (empty response). Retrying...");
                Ok(StepOutcome::Empty)
            }
            Err(e) if e.is_rate_limited() => {
                let delay = self.backoff.next_delay();
                warn!(
                    "Rate limit hit. Waiting for {} seconds before retrying...",
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
                Ok(StepOutcome::RateLimited(delay))
            }
            Err(e) => {
                error!(
                    "An unexpected error occurred: {e}. Retrying after {} seconds...",
                    self.settings.error_pause.as_secs_f64()
                );
                tokio::time::sleep(self.settings.error_pause).await;
                Ok(StepOutcome::Failed)
            }
        }
    }
}
