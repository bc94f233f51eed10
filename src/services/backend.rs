//! backend.rs
//!
//! Клиент внешнего REST-бэкенда: список мест автобуса и карточка автобуса.
//! Каждый вызов проходит через `CircuitBreaker` и пишется в отдельный tracing-span
//! (метод, URL, статус, время ответа).

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, field, info_span, warn, Instrument};

use crate::{
    config::{BackendConfig, CircuitBreakerConfig},
    error::LoadError,
    middleware::SessionContext,
    models::BusDetails,
    services::circuit_breaker::{CircuitBreaker, CircuitState},
};

/// Бэкенд отдаёт места либо голым массивом, либо объектом с полем `seats`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SeatListPayload {
    Bare(Vec<Value>),
    Wrapped {
        #[serde(default)]
        seats: Option<Vec<Value>>,
    },
}

impl SeatListPayload {
    fn into_records(self) -> Vec<Value> {
        match self {
            SeatListPayload::Bare(records) => records,
            SeatListPayload::Wrapped { seats } => seats.unwrap_or_default(),
        }
    }
}

#[derive(Clone)]
pub struct BackendClient {
    base_url: String,
    http_client: reqwest::Client,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl BackendClient {
    pub fn from_config(backend: &BackendConfig, breaker: &CircuitBreakerConfig) -> Result<Self, LoadError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(backend.timeout_seconds))
            .build()?;

        Ok(Self {
            base_url: backend.base_url.trim_end_matches('/').to_string(),
            http_client,
            circuit_breaker: Arc::new(CircuitBreaker::new(
                breaker.failure_threshold,
                breaker.timeout_seconds,
            )),
        })
    }

    /// Сырые записи мест автобуса. Не-2xx ответ - ошибка, а не пустой список.
    pub async fn fetch_seats(&self, ctx: &SessionContext, bus_id: i64) -> Result<Vec<Value>, LoadError> {
        let payload: SeatListPayload = self.get_json(ctx, &format!("/seats/bus/{bus_id}")).await?;
        Ok(payload.into_records())
    }

    pub async fn fetch_bus(&self, ctx: &SessionContext, bus_id: i64) -> Result<BusDetails, LoadError> {
        self.get_json(ctx, &format!("/bus/{bus_id}")).await
    }

    pub fn circuit_breaker_status(&self) -> (CircuitState, u32) {
        self.circuit_breaker.status()
    }

    async fn get_json<T: DeserializeOwned>(&self, ctx: &SessionContext, path: &str) -> Result<T, LoadError> {
        let url = format!("{}{}", self.base_url, path);

        if !self.circuit_breaker.can_execute() {
            warn!("Circuit breaker is OPEN - blocking backend request to {}", url);
            return Err(LoadError::CircuitOpen);
        }

        let span = info_span!(
            "backend_request",
            method = "GET",
            url = %url,
            status = field::Empty,
            elapsed_ms = field::Empty
        );

        let result: Result<T, LoadError> = async {
            let started = Instant::now();
            let mut request = self.http_client.get(&url);
            if let Some(token) = &ctx.bearer_token {
                request = request.bearer_auth(token);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    error!("Backend request failed: {:?}", e);
                    self.circuit_breaker.record_failure();
                    return Err(LoadError::Transport(e));
                }
            };

            let status = response.status();
            let span = tracing::Span::current();
            span.record("status", status.as_u16());
            span.record("elapsed_ms", started.elapsed().as_millis() as u64);

            // 4xx - проблема запроса, а не доступности бэкенда
            if status.is_server_error() {
                self.circuit_breaker.record_failure();
            } else {
                self.circuit_breaker.record_success();
            }

            if !status.is_success() {
                return Err(LoadError::Status {
                    status: status.as_u16(),
                    url: url.clone(),
                });
            }

            let body = response.bytes().await?;
            Ok(serde_json::from_slice(&body)?)
        }
        .instrument(span)
        .await;

        result
    }
}
