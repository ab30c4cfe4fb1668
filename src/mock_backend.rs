// In-memory booking backend
// Behaves like the booking service (overlap checks, assigned ids) and can be
// told to fail, delay or refuse so every branch of the workflow is reachable
// without a server.

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::api::{ApiError, BookingBackend};
use crate::booking::{AvailabilityQuery, BookingConfirmation, BookingId, BookingRequest};
use crate::unit::{Unit, UnitId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    ListUnits,
    UnitDetails(UnitId),
    CheckAvailability(AvailabilityQuery),
    CreateBooking(BookingRequest),
}

#[derive(Debug, Clone)]
enum BookingFailure {
    Refuse(Option<String>),
    Network,
}

pub struct InMemoryBackend {
    units: Vec<Unit>,
    bookings: DashMap<BookingId, BookingRequest>,
    availability_delays: DashMap<UnitId, Duration>,
    availability_override: Mutex<Option<bool>>,
    booking_failure: Mutex<Option<BookingFailure>>,
    next_booking_id: Mutex<Option<BookingId>>,
    calls: Mutex<Vec<BackendCall>>,
    fail_catalog: AtomicBool,
    fail_availability: AtomicBool,
    request_count: AtomicUsize,
}

impl InMemoryBackend {
    pub fn new(units: Vec<Unit>) -> Self {
        Self {
            units,
            bookings: DashMap::new(),
            availability_delays: DashMap::new(),
            availability_override: Mutex::new(None),
            booking_failure: Mutex::new(None),
            next_booking_id: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            fail_catalog: AtomicBool::new(false),
            fail_availability: AtomicBool::new(false),
            request_count: AtomicUsize::new(0),
        }
    }

    pub fn fail_catalog(&self, fail: bool) {
        self.fail_catalog.store(fail, Ordering::SeqCst);
    }

    pub fn fail_availability(&self, fail: bool) {
        self.fail_availability.store(fail, Ordering::SeqCst);
    }

    // Forces every availability answer regardless of stored bookings
    pub fn set_availability(&self, available: Option<bool>) {
        *self.availability_override.lock() = available;
    }

    pub fn delay_availability(&self, unit_id: UnitId, delay: Duration) {
        self.availability_delays.insert(unit_id, delay);
    }

    pub fn refuse_bookings(&self, reason: Option<&str>) {
        *self.booking_failure.lock() = Some(BookingFailure::Refuse(reason.map(str::to_string)));
    }

    pub fn drop_bookings(&self) {
        *self.booking_failure.lock() = Some(BookingFailure::Network);
    }

    pub fn accept_bookings(&self) {
        *self.booking_failure.lock() = None;
    }

    pub fn assign_next_booking_id(&self, id: impl Into<String>) {
        *self.next_booking_id.lock() = Some(BookingId::new(id));
    }

    pub fn insert_booking(&self, request: BookingRequest) -> BookingId {
        let id = BookingId::new(format!("BK-{:08}", rand::random::<u32>()));
        self.bookings.insert(id.clone(), request);
        id
    }

    pub fn bookings(&self) -> Vec<(BookingId, BookingRequest)> {
        self.bookings
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().clone()
    }

    pub fn create_calls(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, BackendCall::CreateBooking(_)))
            .count()
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    fn log(&self, call: BackendCall) {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(call);
    }

    fn find_unit(&self, id: &UnitId) -> Option<&Unit> {
        self.units.iter().find(|unit| &unit.id == id)
    }

    // Same rule as the booking service: ranges overlap when each starts
    // before the other ends
    fn is_free(&self, unit_id: &UnitId, check_in: NaiveDate, check_out: NaiveDate) -> bool {
        !self.bookings.iter().any(|entry| {
            let booked = entry.value();
            &booked.apartment_id == unit_id
                && booked.check_in_date < check_out
                && booked.check_out_date > check_in
        })
    }
}

#[async_trait]
impl BookingBackend for InMemoryBackend {
    async fn list_units(&self) -> Result<Vec<Unit>, ApiError> {
        self.log(BackendCall::ListUnits);
        if self.fail_catalog.load(Ordering::SeqCst) {
            return Err(ApiError::ApiResponseError {
                status_code: 503,
                message: "Service unavailable".to_string(),
            });
        }
        Ok(self.units.clone())
    }

    async fn unit_details(&self, id: &UnitId) -> Result<Unit, ApiError> {
        self.log(BackendCall::UnitDetails(id.clone()));
        self.find_unit(id).cloned().ok_or_else(|| ApiError::ApiResponseError {
            status_code: 404,
            message: format!("Apartment {id} not found"),
        })
    }

    async fn check_availability(&self, query: &AvailabilityQuery) -> Result<bool, ApiError> {
        self.log(BackendCall::CheckAvailability(query.clone()));

        let delay = self.availability_delays.get(&query.apartment_id).map(|d| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_availability.load(Ordering::SeqCst) {
            return Err(ApiError::NetworkError("connection reset".to_string()));
        }
        if let Some(available) = *self.availability_override.lock() {
            return Ok(available);
        }
        if self.find_unit(&query.apartment_id).is_none() {
            return Err(ApiError::ApiResponseError {
                status_code: 404,
                message: format!("Apartment {} not found", query.apartment_id),
            });
        }
        if query.check_out <= query.check_in {
            return Err(ApiError::ApiResponseError {
                status_code: 400,
                message: "check_out must be after check_in".to_string(),
            });
        }
        Ok(self.is_free(&query.apartment_id, query.check_in, query.check_out))
    }

    async fn create_booking(&self, request: &BookingRequest) -> Result<BookingConfirmation, ApiError> {
        self.log(BackendCall::CreateBooking(request.clone()));

        let failure = self.booking_failure.lock().clone();
        match failure {
            Some(BookingFailure::Network) => {
                return Err(ApiError::NetworkError("connection closed".to_string()))
            }
            Some(BookingFailure::Refuse(reason)) => {
                return Err(ApiError::Rejected {
                    status_code: Some(400),
                    reason,
                })
            }
            None => {}
        }

        if self.find_unit(&request.apartment_id).is_none() {
            return Err(ApiError::Rejected {
                status_code: Some(404),
                reason: Some("Apartment not found".to_string()),
            });
        }
        if !self.is_free(&request.apartment_id, request.check_in_date, request.check_out_date) {
            return Err(ApiError::Rejected {
                status_code: Some(400),
                reason: Some("Apartment is not available for the selected dates".to_string()),
            });
        }

        let assigned = self.next_booking_id.lock().take();
        let booking_id = match assigned {
            Some(id) => {
                self.bookings.insert(id.clone(), request.clone());
                id
            }
            None => self.insert_booking(request.clone()),
        };
        Ok(BookingConfirmation { booking_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn request(check_in: &str, check_out: &str) -> BookingRequest {
        BookingRequest {
            apartment_id: UnitId::new("1"),
            guest_name: "Ada Obi".to_string(),
            guest_email: "ada@example.com".to_string(),
            check_in_date: date(check_in),
            check_out_date: date(check_out),
        }
    }

    fn backend() -> InMemoryBackend {
        InMemoryBackend::new(vec![Unit::new(1u64, "Flat", Decimal::from(1_000))])
    }

    #[tokio::test]
    async fn test_overlapping_stays_are_unavailable() {
        let backend = backend();
        backend.insert_booking(request("2024-06-03", "2024-06-06"));

        let query = |a: &str, b: &str| AvailabilityQuery {
            apartment_id: UnitId::new("1"),
            check_in: date(a),
            check_out: date(b),
        };
        assert!(!backend.check_availability(&query("2024-06-01", "2024-06-04")).await.unwrap());
        assert!(!backend.check_availability(&query("2024-06-04", "2024-06-05")).await.unwrap());
        // Back-to-back stays do not overlap
        assert!(backend.check_availability(&query("2024-06-01", "2024-06-03")).await.unwrap());
        assert!(backend.check_availability(&query("2024-06-06", "2024-06-08")).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_booking_assigns_ids_and_blocks_dates() {
        let backend = backend();
        backend.assign_next_booking_id("X");

        let first = backend.create_booking(&request("2024-06-01", "2024-06-04")).await.unwrap();
        assert_eq!(first.booking_id.as_str(), "X");

        let second = backend.create_booking(&request("2024-06-02", "2024-06-03")).await;
        assert!(matches!(second, Err(ApiError::Rejected { .. })));
        assert_eq!(backend.bookings().len(), 1);
        assert_eq!(backend.create_calls(), 2);
    }

    #[tokio::test]
    async fn test_configured_failures() {
        let backend = backend();
        backend.fail_catalog(true);
        assert!(backend.list_units().await.is_err());

        backend.refuse_bookings(Some("closed for renovation"));
        let err = backend.create_booking(&request("2024-06-01", "2024-06-02")).await.unwrap_err();
        assert_eq!(err.reason(), Some("closed for renovation"));

        backend.drop_bookings();
        let err = backend.create_booking(&request("2024-06-01", "2024-06-02")).await.unwrap_err();
        assert!(matches!(err, ApiError::NetworkError(_)));

        assert_eq!(backend.request_count(), 3);
    }
}
