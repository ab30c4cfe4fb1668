// Availability & submission coordinator
// Drives the booking form through its state machine. Handlers may overlap:
// every availability request carries a generation number and only an answer
// for the most recently issued generation reaches the form.

use chrono::{Local, NaiveDate};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::{ApiError, BookingBackend};
use crate::booking::{
    AvailabilityQuery, BookingOutcome, AVAILABLE_MESSAGE, GENERIC_FAILURE, UNAVAILABLE_MESSAGE,
};
use crate::catalog::{CatalogLoader, CatalogSource};
use crate::form::{BookingForm, NoticeKind};
use crate::markup::PageConfig;
use crate::selection::{validate, GuestDetails, ValidationRules};
use crate::state::{FormEvent, FormState};
use crate::unit::UnitId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityUpdate {
    // Unit or a date is still empty; nothing was sent
    Skipped,
    Applied { available: bool },
    // A newer request was issued while this one was in flight
    Superseded,
    Failed,
}

pub struct BookingCoordinator<B> {
    backend: Arc<B>,
    catalog: CatalogLoader<B>,
    page: PageConfig,
    today: NaiveDate,
    form: Mutex<BookingForm>,
    state: Mutex<FormState>,
    generation: AtomicU64,
}

impl<B: BookingBackend> BookingCoordinator<B> {
    pub fn new(backend: Arc<B>, page: PageConfig) -> Self {
        Self::with_today(backend, page, Local::now().date_naive())
    }

    // Units embedded in the page are offered until the catalog request lands
    pub fn with_today(backend: Arc<B>, page: PageConfig, today: NaiveDate) -> Self {
        let mut form = BookingForm::new(today, page.price_per_night);
        if !page.embedded_units.is_empty() {
            form.selector.replace_options(page.embedded_units.clone());
        }

        Self {
            catalog: CatalogLoader::new(Arc::clone(&backend)),
            backend,
            page,
            today,
            form: Mutex::new(form),
            state: Mutex::new(FormState::Editing),
            generation: AtomicU64::new(0),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn state(&self) -> FormState {
        self.state.lock().clone()
    }

    // Copy of the form as it is displayed right now
    pub fn form(&self) -> BookingForm {
        self.form.lock().clone()
    }

    pub fn catalog(&self) -> &CatalogLoader<B> {
        &self.catalog
    }

    // Runs once when the page is ready
    pub async fn load_catalog(&self) -> CatalogSource {
        let catalog = self.catalog.load_units().await;
        let mut form = self.form.lock();
        form.selector.replace_options(catalog.units);
        form.refresh_quote();
        catalog.source
    }

    pub async fn select_unit(&self, unit_id: Option<UnitId>) -> AvailabilityUpdate {
        self.edit(|form| form.select_unit(unit_id));
        self.check_availability().await
    }

    pub async fn change_check_in(&self, check_in: Option<NaiveDate>) -> AvailabilityUpdate {
        self.edit(|form| form.set_check_in(check_in));
        self.check_availability().await
    }

    pub async fn change_check_out(&self, check_out: Option<NaiveDate>) -> AvailabilityUpdate {
        self.edit(|form| form.set_check_out(check_out));
        self.check_availability().await
    }

    // Guest count only affects the quote display; no availability request
    pub fn change_guests(&self, guests: u32) {
        let mut state = self.state.lock();
        Self::step(&mut state, FormEvent::Edited);
        self.form.lock().set_guests(guests);
    }

    // Generation bump, state change and form change happen under the state
    // lock, so a resolving check sees either all of an edit or none of it.
    // Lock order is always state, then form.
    fn edit(&self, change: impl FnOnce(&mut BookingForm)) {
        let mut state = self.state.lock();
        self.generation.fetch_add(1, Ordering::SeqCst);
        Self::step(&mut state, FormEvent::Edited);
        change(&mut *self.form.lock());
    }

    fn apply(&self, event: FormEvent) -> FormState {
        Self::step(&mut self.state.lock(), event)
    }

    fn step(state: &mut FormState, event: FormEvent) -> FormState {
        match state.clone().transition(event) {
            Ok(next) => {
                if next != *state {
                    debug!(from = %state, to = %next, "form state changed");
                }
                *state = next;
            }
            Err(e) => warn!(error = %e, "ignored form event"),
        }
        state.clone()
    }

    fn availability_query(&self) -> Option<AvailabilityQuery> {
        let selection = self.form.lock().selection();
        Some(AvailabilityQuery {
            apartment_id: selection.unit_id?,
            check_in: selection.check_in?,
            check_out: selection.check_out?,
        })
    }

    fn validation_rules(&self) -> ValidationRules {
        let form = self.form.lock();
        ValidationRules {
            today: self.today,
            max_guests: form
                .selected_unit()
                .and_then(|unit| unit.max_guests)
                .or(self.page.max_guests),
        }
    }

    pub async fn check_availability(&self) -> AvailabilityUpdate {
        let Some((generation, query)) = self.issue_check() else {
            return AvailabilityUpdate::Skipped;
        };
        let result = self.backend.check_availability(&query).await;
        self.resolve_check(generation, &query, result)
    }

    fn issue_check(&self) -> Option<(u64, AvailabilityQuery)> {
        let mut state = self.state.lock();
        let query = self.availability_query()?;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        Self::step(&mut state, FormEvent::CheckIssued { generation });
        Some((generation, query))
    }

    fn resolve_check(
        &self,
        generation: u64,
        query: &AvailabilityQuery,
        result: Result<bool, ApiError>,
    ) -> AvailabilityUpdate {
        let mut state = self.state.lock();
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "discarding superseded availability answer");
            return AvailabilityUpdate::Superseded;
        }

        match result {
            Ok(available) => {
                let next = Self::step(
                    &mut state,
                    FormEvent::CheckResolved {
                        generation,
                        available,
                    },
                );
                if matches!(next, FormState::Available | FormState::Unavailable) {
                    let text = if available {
                        AVAILABLE_MESSAGE
                    } else {
                        UNAVAILABLE_MESSAGE
                    };
                    self.form.lock().show_availability(available, text);
                }
                AvailabilityUpdate::Applied { available }
            }
            Err(e) => {
                warn!(
                    apartment_id = %query.apartment_id,
                    error = %e,
                    "availability check failed"
                );
                Self::step(&mut state, FormEvent::CheckFailed { generation });
                self.form.lock().clear_availability();
                AvailabilityUpdate::Failed
            }
        }
    }

    /// Submits the booking.
    ///
    /// Local validation runs first and never touches the network. Availability
    /// is then re-checked as a precondition; only an explicit "available"
    /// answer lets the booking be posted. Each call is independent: nothing is
    /// retried or deduplicated.
    pub async fn submit(&self, guest: GuestDetails) -> BookingOutcome {
        self.apply(FormEvent::SubmitRequested);

        let selection = {
            let mut form = self.form.lock();
            form.set_guest(guest.clone());
            form.selection()
        };

        let request = match validate(&selection, &guest, &self.validation_rules()) {
            Ok(request) => request,
            Err(failed) => {
                debug!(problems = failed.fields.len(), "submission blocked by validation");
                self.form.lock().show_notice(NoticeKind::Error, failed.message());
                self.apply(FormEvent::SubmitBlocked);
                return failed.into();
            }
        };

        let available = match self.backend.check_availability(&request.availability_query()).await {
            Ok(available) => available,
            Err(e) => {
                warn!(error = %e, "availability precondition failed");
                false
            }
        };
        if !available {
            self.form.lock().show_notice(NoticeKind::Error, UNAVAILABLE_MESSAGE);
            self.apply(FormEvent::SubmitBlocked);
            return BookingOutcome::Unavailable;
        }

        let outcome = match self.backend.create_booking(&request).await {
            Ok(confirmation) => {
                info!(booking_id = %confirmation.booking_id, "booking confirmed");
                BookingOutcome::Confirmed {
                    booking_id: confirmation.booking_id,
                }
            }
            Err(e) => {
                warn!(error = %e, "booking creation failed");
                BookingOutcome::Rejected {
                    reason: rejection_reason(&e),
                }
            }
        };

        match &outcome {
            BookingOutcome::Confirmed { booking_id } => {
                let mut state = self.state.lock();
                Self::step(
                    &mut state,
                    FormEvent::BookingCreated {
                        booking_id: booking_id.clone(),
                    },
                );
                self.generation.fetch_add(1, Ordering::SeqCst);
                let mut form = self.form.lock();
                form.reset(self.today);
                form.show_notice(NoticeKind::Success, outcome.message());
            }
            BookingOutcome::Rejected { reason } => {
                self.apply(FormEvent::BookingFailed {
                    reason: reason.clone(),
                });
                self.form.lock().show_notice(NoticeKind::Error, outcome.message());
            }
            BookingOutcome::ValidationFailed { .. } | BookingOutcome::Unavailable => {}
        }
        outcome
    }
}

fn rejection_reason(error: &ApiError) -> String {
    error
        .reason()
        .map(str::to_string)
        .unwrap_or_else(|| GENERIC_FAILURE.to_string())
}
