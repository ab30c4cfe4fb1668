// Stay selection and the local checks run before anything reaches the network
use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use thiserror::Error;

use crate::booking::BookingRequest;
use crate::unit::UnitId;

/// The user's current intent, as read from the form at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaySelection {
    pub unit_id: Option<UnitId>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub guests: u32,
}

impl StaySelection {
    // Unit and both dates present, in any order
    pub fn is_complete(&self) -> bool {
        self.unit_id.is_some() && self.check_in.is_some() && self.check_out.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuestDetails {
    pub name: String,
    pub email: String,
}

impl GuestDetails {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Unit,
    GuestName,
    GuestEmail,
    CheckIn,
    CheckOut,
    Guests,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Unit => "apartment",
            Field::GuestName => "guest name",
            Field::GuestEmail => "email",
            Field::CheckIn => "check-in date",
            Field::CheckOut => "check-out date",
            Field::Guests => "guests",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("Please fill in all required fields ({0} is missing).")]
    Missing(Field),

    #[error("Please enter a valid email address.")]
    MalformedEmail,

    #[error("Check-out date must be after check-in date.")]
    CheckOutNotAfterCheckIn,

    #[error("Check-in date cannot be in the past.")]
    CheckInInPast,

    #[error("Number of guests must be at least 1.")]
    TooFewGuests,

    #[error("Number of guests must be between 1 and {max}.")]
    GuestsOutOfRange { max: u32 },
}

impl FieldError {
    pub fn field(&self) -> Field {
        match self {
            FieldError::Missing(field) => *field,
            FieldError::MalformedEmail => Field::GuestEmail,
            FieldError::CheckOutNotAfterCheckIn => Field::CheckOut,
            FieldError::CheckInInPast => Field::CheckIn,
            FieldError::TooFewGuests | FieldError::GuestsOutOfRange { .. } => Field::Guests,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", self.message())]
pub struct ValidationFailed {
    pub fields: Vec<FieldError>,
}

impl ValidationFailed {
    // The first problem is the one shown to the user
    pub fn message(&self) -> String {
        self.fields
            .first()
            .map(ToString::to_string)
            .unwrap_or_else(|| "Please check the booking details.".to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRules {
    pub today: NaiveDate,
    pub max_guests: Option<u32>,
}

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

pub fn is_plausible_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Checks a selection and guest details before submission.
///
/// Presence of every required field is checked first; if anything is
/// missing, only the missing fields are reported. Otherwise the email shape,
/// date order, past check-in and guest range are all checked.
pub fn validate(
    selection: &StaySelection,
    guest: &GuestDetails,
    rules: &ValidationRules,
) -> Result<BookingRequest, ValidationFailed> {
    let name = guest.name.trim();
    let email = guest.email.trim();

    let mut missing = Vec::new();
    if selection.unit_id.is_none() {
        missing.push(FieldError::Missing(Field::Unit));
    }
    if name.is_empty() {
        missing.push(FieldError::Missing(Field::GuestName));
    }
    if email.is_empty() {
        missing.push(FieldError::Missing(Field::GuestEmail));
    }
    if selection.check_in.is_none() {
        missing.push(FieldError::Missing(Field::CheckIn));
    }
    if selection.check_out.is_none() {
        missing.push(FieldError::Missing(Field::CheckOut));
    }

    let (Some(unit_id), Some(check_in), Some(check_out), true) = (
        selection.unit_id.clone(),
        selection.check_in,
        selection.check_out,
        missing.is_empty(),
    ) else {
        return Err(ValidationFailed { fields: missing });
    };

    let mut fields = Vec::new();
    if !is_plausible_email(email) {
        fields.push(FieldError::MalformedEmail);
    }
    if check_out <= check_in {
        fields.push(FieldError::CheckOutNotAfterCheckIn);
    }
    if check_in < rules.today {
        fields.push(FieldError::CheckInInPast);
    }
    match rules.max_guests {
        _ if selection.guests < 1 => fields.push(FieldError::TooFewGuests),
        Some(max) if selection.guests > max => fields.push(FieldError::GuestsOutOfRange { max }),
        _ => {}
    }

    if !fields.is_empty() {
        return Err(ValidationFailed { fields });
    }

    Ok(BookingRequest {
        apartment_id: unit_id,
        guest_name: name.to_string(),
        guest_email: email.to_string(),
        check_in_date: check_in,
        check_out_date: check_out,
    })
}
