//! Product list loading with capped retries and first-load seeding.
//!
//! A load runs up to `max_attempts` list requests. Before attempt `n`
//! (n >= 2) the loader sleeps `(n - 1) * backoff_step`. When the very first
//! attempt finds an empty collection, three sample products are created and
//! the list is fetched once more after [`SEED_RELOAD_DELAY`]; that reload
//! counts as the next attempt but is not delayed by the backoff step.

use std::str::FromStr;
use std::time::Duration;

use log::{debug, error, info, warn};
use rust_decimal::Decimal;

use crate::api::{ApiError, Collection};
use crate::model::{Product, ProductDraft};
use crate::output::Surface;

pub const MAX_ATTEMPTS: u32 = 3;
pub const BACKOFF_STEP: Duration = Duration::from_millis(1000);
pub const SEED_RELOAD_DELAY: Duration = Duration::from_millis(1000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_step: Duration,
    pub seed_on_empty: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            backoff_step: BACKOFF_STEP,
            seed_on_empty: true,
        }
    }
}

impl RetryPolicy {
    /// Delay imposed before `attempt` (1-based). The first attempt never waits.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        self.backoff_step
            .checked_mul(attempt.saturating_sub(1))
            .unwrap_or(Duration::MAX)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading(u32),
    Retrying(u32),
    Loaded(usize),
    Failed,
}

#[derive(Debug)]
pub enum LoadEvent<'a> {
    Loading {
        attempt: u32,
        max_attempts: u32,
    },
    Retrying {
        attempt: u32,
        max_attempts: u32,
        remaining: u32,
        delay: Duration,
        error: &'a ApiError,
    },
    Seeding,
    SeedRejected {
        name: &'a str,
        error: &'a ApiError,
    },
    Seeded {
        created: usize,
        total: usize,
    },
    SeedFailed {
        created: usize,
        error: &'a ApiError,
    },
    Loaded {
        products: &'a [Product],
    },
    Empty,
    Failed {
        attempts: u32,
        error: &'a ApiError,
    },
}

#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(Vec<Product>),
    Empty,
    Failed(ApiError),
}

impl LoadOutcome {
    pub fn products(&self) -> &[Product] {
        match self {
            LoadOutcome::Loaded(products) => products,
            _ => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LoadOutcome::Failed(_))
    }
}

/// The sample catalog created when the backend starts out empty.
pub fn seed_drafts() -> Vec<ProductDraft> {
    let samples: [(&str, &str, &str, u32); 3] = [
        (
            "Laptop HP",
            "Laptop HP Pavilion 15.6\" con Intel Core i5",
            "12999.99",
            50,
        ),
        ("Monitor LG", "Monitor LG 24\" Full HD IPS", "3499.99", 100),
        (
            "Mouse Inalámbrico",
            "Mouse inalámbrico ergonómico",
            "499.99",
            75,
        ),
    ];
    samples
        .into_iter()
        .map(|(name, description, price, quantity)| ProductDraft {
            name: name.to_string(),
            description: Some(description.to_string()),
            price: Decimal::from_str(price).unwrap_or_default(),
            quantity,
        })
        .collect()
}

#[derive(Clone, Debug)]
pub struct ProductLoader {
    policy: RetryPolicy,
    attempts: u32,
    state: LoadState,
}

impl ProductLoader {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            state: LoadState::Idle,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
        self.state = LoadState::Idle;
    }

    /// Manual retry: start over from attempt one.
    pub async fn retry<C, S>(&mut self, products: &C, surface: &mut S) -> LoadOutcome
    where
        C: Collection<Product>,
        S: Surface + ?Sized,
    {
        self.reset();
        self.load(products, surface).await
    }

    /// Runs the load sequence, continuing from the current attempt count.
    pub async fn load<C, S>(&mut self, products: &C, surface: &mut S) -> LoadOutcome
    where
        C: Collection<Product>,
        S: Surface + ?Sized,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        loop {
            self.attempts += 1;
            let attempt = self.attempts;
            self.state = LoadState::Loading(attempt);
            debug!("product load attempt #{attempt}");
            surface.load_event(&LoadEvent::Loading {
                attempt,
                max_attempts,
            });

            match products.list().await {
                Ok(list) if !list.is_empty() => {
                    info!("loaded {} products", list.len());
                    self.state = LoadState::Loaded(list.len());
                    surface.load_event(&LoadEvent::Loaded { products: &list });
                    return LoadOutcome::Loaded(list);
                }
                Ok(_) if attempt == 1 && self.policy.seed_on_empty => {
                    surface.load_event(&LoadEvent::Seeding);
                    self.seed(products, surface).await;
                    tokio::time::sleep(SEED_RELOAD_DELAY).await;
                }
                Ok(_) => {
                    self.state = LoadState::Loaded(0);
                    surface.load_event(&LoadEvent::Empty);
                    return LoadOutcome::Empty;
                }
                Err(err) if attempt < max_attempts => {
                    let delay = self.policy.delay_before(attempt + 1);
                    warn!("product load attempt #{attempt} failed: {err}");
                    self.state = LoadState::Retrying(attempt);
                    surface.load_event(&LoadEvent::Retrying {
                        attempt,
                        max_attempts,
                        remaining: max_attempts - attempt,
                        delay,
                        error: &err,
                    });
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    error!("giving up on products after {attempt} attempts: {err}");
                    self.state = LoadState::Failed;
                    surface.load_event(&LoadEvent::Failed {
                        attempts: attempt,
                        error: &err,
                    });
                    return LoadOutcome::Failed(err);
                }
            }
        }
    }

    async fn seed<C, S>(&self, products: &C, surface: &mut S)
    where
        C: Collection<Product>,
        S: Surface + ?Sized,
    {
        let drafts = seed_drafts();
        let total = drafts.len();
        let mut created = 0;
        for draft in drafts {
            match products.create(&draft).await {
                Ok(()) => created += 1,
                Err(err) if err.is_transport() => {
                    error!("failed to create sample product '{}': {err}", draft.name);
                    surface.load_event(&LoadEvent::SeedFailed {
                        created,
                        error: &err,
                    });
                    return;
                }
                // The backend answered; the remaining samples are still sent.
                Err(err) => {
                    warn!("sample product '{}' rejected: {err}", draft.name);
                    surface.load_event(&LoadEvent::SeedRejected {
                        name: &draft.name,
                        error: &err,
                    });
                }
            }
        }
        surface.load_event(&LoadEvent::Seeded { created, total });
    }
}
