// Booking form adapter
// Holds the field values and display regions of the rendered form. All
// arithmetic and validation happen on the values it hands out; it only
// stores what the widgets would show.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::time::{Duration, Instant};

use crate::catalog::UnitSelector;
use crate::money::{format_amount, format_nightly_price};
use crate::quote::{quote_for, DateBounds, StayQuote};
use crate::selection::{GuestDetails, StaySelection};
use crate::unit::{Unit, UnitId};

pub const NOTICE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

// Feedback message; disappears NOTICE_TTL after it is shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    pub shown_at: Instant,
}

impl Notice {
    pub fn new(kind: NoticeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            shown_at: Instant::now(),
        }
    }

    pub fn is_visible_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) < NOTICE_TTL
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityMessage {
    pub available: bool,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteDisplay {
    pub nights: String,
    pub total: String,
    // Hidden input submitted with the form
    pub total_input: String,
}

impl From<&StayQuote> for QuoteDisplay {
    fn from(quote: &StayQuote) -> Self {
        Self {
            nights: quote.nights.to_string(),
            total: quote.total_display(),
            total_input: quote.total.normalize().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSummary {
    pub name: String,
    pub image: Option<String>,
    pub price: String,
    // Only shown once the dates give at least one night
    pub total: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BookingForm {
    pub selector: UnitSelector,
    unit_id: Option<UnitId>,
    guest: GuestDetails,
    check_in: Option<NaiveDate>,
    check_out: Option<NaiveDate>,
    guests: u32,
    bounds: DateBounds,
    // Page-level price used when no unit is selected
    page_price: Option<Decimal>,
    quote: QuoteDisplay,
    summary: Option<UnitSummary>,
    availability: Option<AvailabilityMessage>,
    notice: Option<Notice>,
}

impl BookingForm {
    // Fields seeded the way the page initialises them: today / tomorrow
    pub fn new(today: NaiveDate, page_price: Option<Decimal>) -> Self {
        let bounds = DateBounds::for_today(today);
        let mut form = Self {
            selector: UnitSelector::default(),
            unit_id: None,
            guest: GuestDetails::default(),
            check_in: Some(bounds.check_in_min),
            check_out: Some(bounds.check_out_min),
            guests: 1,
            bounds,
            page_price,
            quote: QuoteDisplay::from(&StayQuote::ZERO),
            summary: None,
            availability: None,
            notice: None,
        };
        form.refresh_quote();
        form
    }

    pub fn reset(&mut self, today: NaiveDate) {
        let selector = std::mem::take(&mut self.selector);
        let notice = self.notice.take();
        *self = Self::new(today, self.page_price);
        self.selector = selector;
        self.notice = notice;
    }

    pub fn selection(&self) -> StaySelection {
        StaySelection {
            unit_id: self.unit_id.clone(),
            check_in: self.check_in,
            check_out: self.check_out,
            guests: self.guests,
        }
    }

    pub fn guest(&self) -> &GuestDetails {
        &self.guest
    }

    pub fn bounds(&self) -> DateBounds {
        self.bounds
    }

    pub fn quote_display(&self) -> &QuoteDisplay {
        &self.quote
    }

    pub fn summary(&self) -> Option<&UnitSummary> {
        self.summary.as_ref()
    }

    pub fn availability(&self) -> Option<&AvailabilityMessage> {
        self.availability.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn visible_notice(&self, now: Instant) -> Option<&Notice> {
        self.notice.as_ref().filter(|notice| notice.is_visible_at(now))
    }

    pub fn selected_unit(&self) -> Option<&Unit> {
        self.unit_id.as_ref().and_then(|id| self.selector.find(id))
    }

    pub fn price_per_night(&self) -> Option<Decimal> {
        self.selected_unit()
            .map(|unit| unit.price_per_night)
            .or(self.page_price)
    }

    pub fn set_guest(&mut self, guest: GuestDetails) {
        self.guest = guest;
    }

    pub fn select_unit(&mut self, unit_id: Option<UnitId>) {
        self.unit_id = unit_id;
        self.refresh_quote();
    }

    pub fn set_check_in(&mut self, check_in: Option<NaiveDate>) {
        self.check_in = check_in;
        if let Some(check_in) = check_in {
            self.check_out = self.bounds.apply_check_in(check_in, self.check_out);
        }
        self.refresh_quote();
    }

    pub fn set_check_out(&mut self, check_out: Option<NaiveDate>) {
        self.check_out = check_out;
        self.refresh_quote();
    }

    pub fn set_guests(&mut self, guests: u32) {
        self.guests = guests;
        self.refresh_quote();
    }

    pub fn show_availability(&mut self, available: bool, text: impl Into<String>) {
        self.availability = Some(AvailabilityMessage {
            available,
            text: text.into(),
        });
    }

    pub fn clear_availability(&mut self) {
        self.availability = None;
    }

    pub fn show_notice(&mut self, kind: NoticeKind, text: impl Into<String>) {
        self.notice = Some(Notice::new(kind, text));
    }

    // Recomputed from scratch on every change
    pub fn refresh_quote(&mut self) -> StayQuote {
        let quote = quote_for(self.check_in, self.check_out, self.price_per_night());
        self.quote = QuoteDisplay::from(&quote);
        self.summary = self.selected_unit().map(|unit| UnitSummary {
            name: unit.name.clone(),
            image: unit.image.clone(),
            price: format_nightly_price(unit.price_per_night),
            total: (!quote.is_zero()).then(|| format_amount(quote.total)),
        });
        quote
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::fallback_units;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn form() -> BookingForm {
        let mut form = BookingForm::new(date("2024-05-20"), Some(Decimal::from(150_000)));
        form.selector.replace_options(fallback_units());
        form
    }

    #[test]
    fn test_initial_fields_use_today_and_tomorrow() {
        let form = form();
        let selection = form.selection();
        assert_eq!(selection.check_in, Some(date("2024-05-20")));
        assert_eq!(selection.check_out, Some(date("2024-05-21")));
        assert_eq!(selection.guests, 1);
        assert_eq!(form.bounds().check_in_min, date("2024-05-20"));
        assert_eq!(form.bounds().check_out_min, date("2024-05-21"));

        // Seeded from the page price before any unit is picked
        assert_eq!(form.quote_display().nights, "1");
        assert_eq!(form.quote_display().total, "₦150,000");
        assert_eq!(form.quote_display().total_input, "150000");
    }

    #[test]
    fn test_check_in_change_snaps_check_out() {
        let mut form = form();
        form.set_check_out(Some(date("2024-06-04")));
        form.set_check_in(Some(date("2024-06-10")));

        assert_eq!(form.bounds().check_out_min, date("2024-06-11"));
        assert_eq!(form.selection().check_out, Some(date("2024-06-11")));
        assert_eq!(form.quote_display().nights, "1");
    }

    #[test]
    fn test_selected_unit_drives_quote_and_summary() {
        let mut form = form();
        form.set_check_in(Some(date("2024-06-01")));
        form.set_check_out(Some(date("2024-06-04")));
        form.select_unit(Some(UnitId::new("2")));

        assert_eq!(form.price_per_night(), Some(Decimal::from(250_000)));
        assert_eq!(form.quote_display().total, "₦750,000");
        let summary = form.summary().unwrap();
        assert_eq!(summary.name, "3 Bedroom Premium Apartment");
        assert_eq!(summary.price, "₦250,000/night");
        assert_eq!(summary.total.as_deref(), Some("₦750,000"));
        assert_eq!(summary.image.as_deref(), Some("media/IMG-20250918-WA0006.jpg"));
    }

    #[test]
    fn test_reversed_dates_show_zero() {
        let mut form = form();
        form.set_check_in(Some(date("2024-06-04")));
        form.set_check_out(Some(date("2024-06-01")));
        form.select_unit(Some(UnitId::new("1")));

        assert_eq!(form.quote_display().nights, "0");
        assert_eq!(form.quote_display().total, "₦0");
        assert_eq!(form.quote_display().total_input, "0");
        assert_eq!(form.summary().unwrap().total, None);
    }

    #[test]
    fn test_guest_change_recomputes_without_changing_total() {
        let mut form = form();
        let before = form.quote_display().clone();
        form.set_guests(3);
        assert_eq!(form.selection().guests, 3);
        assert_eq!(form.quote_display(), &before);
    }

    #[test]
    fn test_notice_expires() {
        let mut form = form();
        form.show_notice(NoticeKind::Error, "Please fill in all required fields");
        let shown_at = form.notice().unwrap().shown_at;

        assert!(form.visible_notice(shown_at + Duration::from_secs(4)).is_some());
        assert!(form.visible_notice(shown_at + NOTICE_TTL).is_none());
    }

    #[test]
    fn test_reset_keeps_catalog() {
        let mut form = form();
        form.select_unit(Some(UnitId::new("3")));
        form.set_guest(GuestDetails::new("Ada", "ada@example.com"));
        form.set_guests(2);
        form.show_availability(true, "free");

        form.reset(date("2024-05-21"));
        assert_eq!(form.selector.len(), 3);
        assert_eq!(form.selection().unit_id, None);
        assert_eq!(form.selection().check_in, Some(date("2024-05-21")));
        assert_eq!(form.selection().guests, 1);
        assert_eq!(form.guest(), &GuestDetails::default());
        assert!(form.availability().is_none());
        assert!(form.summary().is_none());
    }
}
