//! Concurrent fan-out over a fixed set of providers.
//!
//! Every provider is queried in its own task. Outcomes are consumed in
//! completion order under one global deadline; the first provider error or
//! the deadline ends the aggregation. Remaining tasks are aborted when the
//! aggregation returns early.

use std::{sync::Arc, time::Duration};

use tokio::{
    task::JoinSet,
    time::{Instant, timeout_at},
};
use tracing::{info, warn};

use crate::{AggregationError, Kelvin, provider::TemperatureProvider};

pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct Aggregator {
    providers: Vec<Arc<dyn TemperatureProvider>>,
    deadline: Duration,
}

impl Aggregator {
    pub fn new(providers: Vec<Arc<dyn TemperatureProvider>>) -> Self {
        Self { providers, deadline: DEFAULT_DEADLINE }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn providers(&self) -> &[Arc<dyn TemperatureProvider>] {
        &self.providers
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Mean temperature of `city` across all providers.
    ///
    /// Fails as soon as any provider fails, or when all outcomes have not
    /// arrived within the deadline. No partial average is ever produced.
    pub async fn temperature(&self, city: &str) -> Result<Kelvin, AggregationError> {
        if self.providers.is_empty() {
            info!("no providers available: {city}: 0");
            return Err(AggregationError::NoProviders);
        }

        // A deadline past the end of the clock means no deadline at all.
        let deadline = Instant::now().checked_add(self.deadline);
        let mut workers = JoinSet::new();
        for provider in &self.providers {
            let provider = Arc::clone(provider);
            let city = city.to_owned();
            workers.spawn(async move { provider.temperature(&city).await });
        }

        let mut sum = 0.0;
        loop {
            let next = match deadline {
                Some(deadline) => timeout_at(deadline, workers.join_next()).await,
                None => Ok(workers.join_next().await),
            };
            let joined = match next {
                Ok(Some(joined)) => joined,
                Ok(None) => break,
                Err(_) => {
                    warn!(pending = workers.len(), "aggregation timed out: {city}");
                    return Err(AggregationError::TimedOut);
                }
            };

            let outcome = joined.map_err(|e| AggregationError::Worker(e.to_string()))?;
            match outcome {
                Ok(kelvin) => sum += kelvin.value(),
                Err(err) => {
                    warn!(error = %err, "provider failed: {city}");
                    return Err(err.into());
                }
            }
        }

        let mean = Kelvin::new(sum / self.providers.len() as f64);
        info!("mean temperature: {city}: {mean:.2}");
        Ok(mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProviderError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Fixed {
        delay: Duration,
        outcome: Result<Kelvin, ProviderError>,
        calls: Arc<AtomicUsize>,
        finished: Arc<AtomicBool>,
    }

    impl Fixed {
        fn ok(kelvin: f64) -> Self {
            Self::after(Duration::ZERO, Ok(Kelvin::new(kelvin)))
        }

        fn err(err: ProviderError) -> Self {
            Self::after(Duration::ZERO, Err(err))
        }

        fn after(delay: Duration, outcome: Result<Kelvin, ProviderError>) -> Self {
            Self {
                delay,
                outcome,
                calls: Arc::new(AtomicUsize::new(0)),
                finished: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    #[async_trait]
    impl TemperatureProvider for Fixed {
        async fn temperature(&self, _city: &str) -> Result<Kelvin, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.finished.store(true, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    fn aggregator(providers: Vec<Fixed>) -> Aggregator {
        Aggregator::new(
            providers
                .into_iter()
                .map(|p| Arc::new(p) as Arc<dyn TemperatureProvider>)
                .collect(),
        )
    }

    #[tokio::test]
    async fn empty_set_fails_without_calls() {
        let err = Aggregator::new(Vec::new()).temperature("Paris").await.unwrap_err();
        assert_eq!(err, AggregationError::NoProviders);
        assert_eq!(err.to_string(), "no providers available");
    }

    #[tokio::test]
    async fn mean_of_two_providers() {
        let agg = aggregator(vec![Fixed::ok(300.0), Fixed::ok(280.0)]);

        let mean = agg.temperature("Paris").await.unwrap();
        assert_eq!(mean.value(), 290.0);
    }

    #[tokio::test(start_paused = true)]
    async fn mean_is_independent_of_completion_order() {
        let agg = aggregator(vec![
            Fixed::after(Duration::from_secs(3), Ok(Kelvin::new(271.0))),
            Fixed::after(Duration::from_secs(1), Ok(Kelvin::new(285.5))),
            Fixed::after(Duration::from_secs(2), Ok(Kelvin::new(300.25))),
        ]);

        let mean = agg.temperature("Oslo").await.unwrap();
        let expected = (271.0 + 285.5 + 300.25) / 3.0;
        assert!((mean.value() - expected).abs() < 1e-9);
    }

    #[tokio::test]
    async fn single_provider_error_fails_aggregation() {
        let agg = aggregator(vec![
            Fixed::ok(290.0),
            Fixed::err(ProviderError::Transport("connection refused".into())),
        ]);

        let err = agg.temperature("Paris").await.unwrap_err();
        assert_eq!(err.to_string(), "connection refused");
        assert!(matches!(err, AggregationError::Provider(ProviderError::Transport(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn first_error_does_not_wait_for_slow_providers() {
        let slow = Fixed::after(Duration::from_secs(8), Ok(Kelvin::new(280.0)));
        let slow_finished = Arc::clone(&slow.finished);
        let agg = aggregator(vec![
            slow,
            Fixed::after(
                Duration::from_secs(1),
                Err(ProviderError::Status { status: 401, code: 401, message: "bad key".into() }),
            ),
        ]);

        let started = Instant::now();
        let err = agg.temperature("Paris").await.unwrap_err();

        assert_eq!(err.to_string(), "401:bad key");
        assert!(started.elapsed() < Duration::from_secs(2));

        // The abandoned lookup is cancelled rather than left running.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(!slow_finished.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out_whole_aggregation() {
        let agg = aggregator(vec![
            Fixed::ok(290.0),
            Fixed::ok(291.0),
            Fixed::after(Duration::from_secs(60), Ok(Kelvin::new(292.0))),
        ]);

        let started = Instant::now();
        let err = agg.temperature("Paris").await.unwrap_err();

        assert_eq!(err, AggregationError::TimedOut);
        assert_eq!(err.to_string(), "timed out");
        assert!(started.elapsed() >= DEFAULT_DEADLINE);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_is_global_not_per_provider() {
        // Each provider alone fits in the deadline; together they do not run serially.
        let agg = aggregator(vec![
            Fixed::after(Duration::from_secs(4), Ok(Kelvin::new(280.0))),
            Fixed::after(Duration::from_secs(4), Ok(Kelvin::new(300.0))),
            Fixed::after(Duration::from_secs(4), Ok(Kelvin::new(290.0))),
        ])
        .with_deadline(Duration::from_secs(5));

        let mean = agg.temperature("Lyon").await.unwrap();
        assert_eq!(mean.value(), 290.0);

        let agg = aggregator(vec![Fixed::after(Duration::from_secs(6), Ok(Kelvin::new(280.0)))])
            .with_deadline(Duration::from_secs(5));
        assert_eq!(agg.temperature("Lyon").await.unwrap_err(), AggregationError::TimedOut);
    }

    #[tokio::test]
    async fn unbounded_deadline_does_not_overflow() {
        let agg = aggregator(vec![Fixed::ok(280.0), Fixed::ok(300.0)])
            .with_deadline(Duration::from_secs(u64::MAX));

        let mean = agg.temperature("Paris").await.unwrap();
        assert_eq!(mean.value(), 290.0);
    }

    #[tokio::test]
    async fn each_provider_is_called_once() {
        let providers = vec![Fixed::ok(280.0), Fixed::ok(290.0)];
        let counters: Vec<_> = providers.iter().map(|p| Arc::clone(&p.calls)).collect();

        aggregator(providers).temperature("Paris").await.unwrap();

        for calls in counters {
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }
    }

    #[derive(Debug)]
    struct Panicking;

    #[async_trait]
    impl TemperatureProvider for Panicking {
        async fn temperature(&self, _city: &str) -> Result<Kelvin, ProviderError> {
            panic!("provider blew up")
        }
    }

    #[tokio::test]
    async fn panicking_provider_is_reported_as_worker_failure() {
        let agg = Aggregator::new(vec![Arc::new(Panicking)]);

        let err = agg.temperature("Paris").await.unwrap_err();
        assert!(matches!(err, AggregationError::Worker(_)));
    }
}
