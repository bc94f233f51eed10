//! circuit_breaker.rs
//!
//! "Автоматический выключатель" для запросов к внешнему бэкенду.
//! Если бэкенд подряд падает `failure_threshold` раз, запросы перестают уходить
//! на `open_timeout`, после чего пропускается один пробный запрос.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Состояния выключателя.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// **Closed (Замкнуто)**: нормальный режим, запросы разрешены.
    Closed,
    /// **Open (Разомкнуто)**: после серии сбоев запросы временно запрещены.
    Open,
    /// **HalfOpen (Полуоткрыто)**: таймаут истёк, разрешён пробный запрос.
    HalfOpen,
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    /// Счетчик последовательных сбоев.
    failure_count: u32,
    /// Момент размыкания, от него считается таймаут.
    opened_at: Option<Instant>,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<Inner>,
    failure_threshold: u32,
    open_timeout: Duration,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, timeout_seconds: u64) -> Self {
        Self::with_timeout(failure_threshold, Duration::from_secs(timeout_seconds))
    }

    pub fn with_timeout(failure_threshold: u32, open_timeout: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                failure_count: 0,
                opened_at: None,
            }),
            failure_threshold: failure_threshold.max(1),
            open_timeout,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Состояние консистентно и после паники в другом потоке
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Можно ли выполнить следующий запрос.
    pub fn can_execute(&self) -> bool {
        let mut inner = self.lock();

        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let expired = inner
                    .opened_at
                    .map_or(true, |at| at.elapsed() >= self.open_timeout);
                if expired {
                    inner.state = CircuitState::HalfOpen;
                    info!("Circuit breaker transitioning to HalfOpen state");
                }
                expired
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.lock();

        if inner.state == CircuitState::HalfOpen {
            info!("Circuit breaker recovered - transitioning to Closed state");
        }
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.opened_at = None;
    }

    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.failure_count += 1;

        match inner.state {
            CircuitState::Closed if inner.failure_count >= self.failure_threshold => {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                error!(
                    "Circuit breaker OPENED - {} failures reached threshold {}",
                    inner.failure_count, self.failure_threshold
                );
            }
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                warn!("Circuit breaker test failed - returning to Open state");
            }
            _ => {}
        }
    }

    /// Текущее состояние и число сбоев подряд, для мониторинга.
    pub fn status(&self) -> (CircuitState, u32) {
        let inner = self.lock();
        (inner.state, inner.failure_count)
    }
}
