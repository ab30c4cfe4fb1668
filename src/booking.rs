// Wire payloads for availability checks and booking creation, and the
// closed set of outcomes a submission can end in
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::selection::{FieldError, ValidationFailed};
use crate::unit::{RawId, UnitId};

pub const UNAVAILABLE_MESSAGE: &str = "Sorry, this apartment is not available for the selected dates.";
pub const AVAILABLE_MESSAGE: &str = "This apartment is available for the selected dates!";
pub const GENERIC_FAILURE: &str = "Failed to create booking. Please try again later.";

// Query string of the availability endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityQuery {
    pub apartment_id: UnitId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AvailabilityResponse {
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub apartment_id: UnitId,
    pub guest_name: String,
    pub guest_email: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
}

impl BookingRequest {
    pub fn availability_query(&self) -> AvailabilityQuery {
        AvailabilityQuery {
            apartment_id: self.apartment_id.clone(),
            check_in: self.check_in_date,
            check_out: self.check_out_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BookingId(String);

impl BookingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for BookingId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawId::deserialize(deserializer).map(|raw| Self(raw.into_string()))
    }
}

// Body of the create-booking endpoint, for both success and failure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateBookingResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub booking_id: Option<BookingId>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingConfirmation {
    pub booking_id: BookingId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingOutcome {
    Confirmed { booking_id: BookingId },
    Rejected { reason: String },
    ValidationFailed { fields: Vec<FieldError> },
    Unavailable,
}

impl BookingOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, BookingOutcome::Confirmed { .. })
    }

    pub fn message(&self) -> String {
        match self {
            BookingOutcome::Confirmed { booking_id } => {
                format!("Booking created successfully! Your booking ID is: {booking_id}")
            }
            BookingOutcome::Rejected { reason } => format!("Error creating booking: {reason}"),
            BookingOutcome::ValidationFailed { fields } => ValidationFailed {
                fields: fields.clone(),
            }
            .message(),
            BookingOutcome::Unavailable => UNAVAILABLE_MESSAGE.to_string(),
        }
    }
}

impl From<ValidationFailed> for BookingOutcome {
    fn from(failed: ValidationFailed) -> Self {
        BookingOutcome::ValidationFailed {
            fields: failed.fields,
        }
    }
}
