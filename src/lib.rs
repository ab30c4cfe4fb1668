// Apartment booking client
// Catalog loading, stay pricing and the availability/submission workflow of
// the booking page, independent of how the page is rendered.

pub mod api;
pub mod booking;
pub mod catalog;
pub mod coordinator;
pub mod form;
pub mod markup;
pub mod mock_backend;
pub mod money;
pub mod quote;
pub mod selection;
pub mod state;
pub mod unit;

// Re-export key types for convenience
pub use api::{ApiError, BookingBackend, ClientConfig, ClientError, ClientStats, HttpBookingBackend};
pub use booking::{BookingId, BookingOutcome, BookingRequest};
pub use catalog::{CatalogLoader, CatalogSource, UnitSelector};
pub use coordinator::{AvailabilityUpdate, BookingCoordinator};
pub use form::{BookingForm, Notice, NoticeKind};
pub use markup::{MarkupError, PageConfig};
pub use quote::{recompute_quote, StayQuote};
pub use selection::{validate, FieldError, GuestDetails, StaySelection, ValidationFailed};
pub use state::{FormEvent, FormState};
pub use unit::{fallback_units, Unit, UnitId};
