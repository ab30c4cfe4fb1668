// Booking backend client
// The workflow talks to the booking service only through the BookingBackend
// trait; HttpBookingBackend is the production implementation over reqwest.

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

use crate::booking::{
    AvailabilityQuery, AvailabilityResponse, BookingConfirmation, BookingRequest,
    CreateBookingResponse,
};
use crate::unit::{Unit, UnitId};

pub const APARTMENTS_PATH: &str = "/api/apartments/";
pub const CHECK_AVAILABILITY_PATH: &str = "/api/check-availability/";
pub const CREATE_BOOKING_PATH: &str = "/api/create-booking/";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("API error: {status_code} - {message}")]
    ApiResponseError { status_code: u16, message: String },

    // The booking service answered but refused to create the booking
    #[error("Booking rejected: {}", reason.as_deref().unwrap_or("no reason given"))]
    Rejected {
        status_code: Option<u16>,
        reason: Option<String>,
    },

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    // Server-provided reason, if the server gave one
    pub fn reason(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { reason, .. } => reason.as_deref(),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Initialization error: {0}")]
    InitError(String),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_ms: 30_000,
            user_agent: concat!("apartment-booking/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Default, Clone)]
pub struct ClientStats {
    pub requests_sent: usize,
    pub requests_succeeded: usize,
    pub requests_failed: usize,
    pub requests_timeout: usize,
    pub average_response_time_ms: f64,
    pub max_response_time_ms: f64,
}

#[async_trait]
pub trait BookingBackend: Send + Sync + 'static {
    // All bookable units
    async fn list_units(&self) -> Result<Vec<Unit>, ApiError>;

    async fn unit_details(&self, id: &UnitId) -> Result<Unit, ApiError>;

    async fn check_availability(&self, query: &AvailabilityQuery) -> Result<bool, ApiError>;

    // Any refusal by the service comes back as ApiError::Rejected
    async fn create_booking(&self, request: &BookingRequest) -> Result<BookingConfirmation, ApiError>;
}

pub struct HttpBookingBackend {
    client: Client,
    config: ClientConfig,
    stats: Mutex<ClientStats>,
}

impl HttpBookingBackend {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        if config.base_url.trim().is_empty() {
            return Err(ClientError::ConfigError("base_url must not be empty".to_string()));
        }
        if config.timeout_ms == 0 {
            return Err(ClientError::ConfigError("timeout_ms must be positive".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;

        Ok(Self {
            client,
            config,
            stats: Mutex::new(ClientStats::default()),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn stats(&self) -> ClientStats {
        self.stats.lock().clone()
    }

    fn map_transport_error(&self, error: reqwest::Error) -> ApiError {
        if error.is_timeout() {
            ApiError::Timeout(self.config.timeout_ms)
        } else if error.is_decode() {
            ApiError::Decode(error.to_string())
        } else {
            ApiError::NetworkError(error.to_string())
        }
    }

    fn record(&self, started: Instant, result: Result<(), &ApiError>) {
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        let mut stats = self.stats.lock();
        stats.requests_sent += 1;
        match result {
            Ok(()) => stats.requests_succeeded += 1,
            Err(ApiError::Timeout(_)) => {
                stats.requests_failed += 1;
                stats.requests_timeout += 1;
            }
            Err(_) => stats.requests_failed += 1,
        }
        let n = stats.requests_sent as f64;
        stats.average_response_time_ms += (elapsed_ms - stats.average_response_time_ms) / n;
        stats.max_response_time_ms = stats.max_response_time_ms.max(elapsed_ms);
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await.map_err(|e| self.map_transport_error(e))?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::ApiResponseError {
                status_code: status.as_u16(),
                message,
            });
        }
        response.json::<T>().await.map_err(|e| self.map_transport_error(e))
    }

    async fn timed<T, F>(&self, call: F) -> Result<T, ApiError>
    where
        F: std::future::Future<Output = Result<T, ApiError>> + Send,
    {
        let started = Instant::now();
        let result = call.await;
        self.record(started, result.as_ref().map(|_| ()));
        result
    }
}

// Maps a create-booking reply onto a confirmation or a rejection.
// Success needs a 2xx status, `success: true` and a booking id.
pub(crate) fn interpret_create_response(
    status: StatusCode,
    body: Option<CreateBookingResponse>,
) -> Result<BookingConfirmation, ApiError> {
    let body = body.unwrap_or_default();
    match (status.is_success(), body.success, body.booking_id) {
        (true, true, Some(booking_id)) => Ok(BookingConfirmation { booking_id }),
        _ => Err(ApiError::Rejected {
            status_code: Some(status.as_u16()),
            reason: body.error.filter(|e| !e.trim().is_empty()),
        }),
    }
}

#[async_trait]
impl BookingBackend for HttpBookingBackend {
    async fn list_units(&self) -> Result<Vec<Unit>, ApiError> {
        let url = self.config.endpoint(APARTMENTS_PATH);
        debug!(%url, "fetching units");
        self.timed(self.get_json(self.client.get(&url))).await
    }

    async fn unit_details(&self, id: &UnitId) -> Result<Unit, ApiError> {
        let url = self.config.endpoint(&format!("{APARTMENTS_PATH}{id}/"));
        debug!(%url, "fetching unit details");
        self.timed(self.get_json(self.client.get(&url))).await
    }

    async fn check_availability(&self, query: &AvailabilityQuery) -> Result<bool, ApiError> {
        let url = self.config.endpoint(CHECK_AVAILABILITY_PATH);
        debug!(
            apartment_id = %query.apartment_id,
            check_in = %query.check_in,
            check_out = %query.check_out,
            "checking availability"
        );
        let request = self.client.get(&url).query(query);
        let response: AvailabilityResponse = self.timed(self.get_json(request)).await?;
        Ok(response.available)
    }

    async fn create_booking(&self, request: &BookingRequest) -> Result<BookingConfirmation, ApiError> {
        let url = self.config.endpoint(CREATE_BOOKING_PATH);
        debug!(apartment_id = %request.apartment_id, "creating booking");
        self.timed(async {
            let response = self
                .client
                .post(&url)
                .json(request)
                .send()
                .await
                .map_err(|e| self.map_transport_error(e))?;
            let status = response.status();
            let body = match response.json::<CreateBookingResponse>().await {
                Ok(body) => Some(body),
                Err(e) => {
                    warn!(%status, error = %e, "unreadable create-booking response");
                    None
                }
            };
            interpret_create_response(status, body)
        })
        .await
    }
}
