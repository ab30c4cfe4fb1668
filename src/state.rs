// Booking form state machine
//
//   Editing -> Checking -> {Available, Unavailable} -> Editing (on edit)
//   any idle state -> Submitting -> {Confirmed, Rejected} -> Editing (on edit)
//
// Submitting falls back to Editing when local validation or the availability
// precondition blocks the submission.

use std::fmt;
use thiserror::Error;

use crate::booking::BookingId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    Editing,
    Checking { generation: u64 },
    Available,
    Unavailable,
    Submitting,
    Confirmed { booking_id: BookingId },
    Rejected { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    Edited,
    CheckIssued { generation: u64 },
    CheckResolved { generation: u64, available: bool },
    CheckFailed { generation: u64 },
    SubmitRequested,
    SubmitBlocked,
    BookingCreated { booking_id: BookingId },
    BookingFailed { reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot apply {event} while {state}")]
pub struct TransitionError {
    pub state: &'static str,
    pub event: &'static str,
}

impl FormState {
    pub fn name(&self) -> &'static str {
        match self {
            FormState::Editing => "editing",
            FormState::Checking { .. } => "checking",
            FormState::Available => "available",
            FormState::Unavailable => "unavailable",
            FormState::Submitting => "submitting",
            FormState::Confirmed { .. } => "confirmed",
            FormState::Rejected { .. } => "rejected",
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, FormState::Submitting)
    }

    /// Applies one event.
    ///
    /// While checking, availability answers only move the machine when they
    /// belong to the generation it is waiting for; late answers for older
    /// generations leave the state untouched. Edits made while a submission
    /// is in flight do not interrupt it.
    pub fn transition(self, event: FormEvent) -> Result<FormState, TransitionError> {
        use FormEvent as E;
        use FormState as S;

        let next = match (self, event) {
            (S::Submitting, E::Edited) => S::Submitting,
            (_, E::Edited) => S::Editing,

            (S::Submitting, E::CheckIssued { .. }) => S::Submitting,
            (_, E::CheckIssued { generation }) => S::Checking { generation },

            (S::Checking { generation }, E::CheckResolved { generation: g, available })
                if g == generation =>
            {
                if available {
                    S::Available
                } else {
                    S::Unavailable
                }
            }
            // Only answers the caller has verified as the latest reach an
            // editing form, e.g. after a guest-count change mid-check
            (S::Editing, E::CheckResolved { available, .. }) => {
                if available {
                    S::Available
                } else {
                    S::Unavailable
                }
            }
            (S::Checking { generation }, E::CheckFailed { generation: g }) if g == generation => {
                S::Editing
            }
            (state, E::CheckResolved { .. }) | (state, E::CheckFailed { .. }) => state,

            (_, E::SubmitRequested) => S::Submitting,
            (S::Submitting, E::SubmitBlocked) => S::Editing,
            (S::Submitting, E::BookingCreated { booking_id }) => S::Confirmed { booking_id },
            (S::Submitting, E::BookingFailed { reason }) => S::Rejected { reason },

            (state, event) => {
                return Err(TransitionError {
                    state: state.name(),
                    event: event.name(),
                })
            }
        };
        Ok(next)
    }
}

impl FormEvent {
    pub fn name(&self) -> &'static str {
        match self {
            FormEvent::Edited => "edited",
            FormEvent::CheckIssued { .. } => "check-issued",
            FormEvent::CheckResolved { .. } => "check-resolved",
            FormEvent::CheckFailed { .. } => "check-failed",
            FormEvent::SubmitRequested => "submit-requested",
            FormEvent::SubmitBlocked => "submit-blocked",
            FormEvent::BookingCreated { .. } => "booking-created",
            FormEvent::BookingFailed { .. } => "booking-failed",
        }
    }
}

impl fmt::Display for FormState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn run(events: Vec<FormEvent>) -> Result<FormState, TransitionError> {
        events
            .into_iter()
            .try_fold(FormState::Editing, |state, event| state.transition(event))
    }

    #[test]
    fn test_check_then_edit() {
        let state = run(vec![
            FormEvent::CheckIssued { generation: 1 },
            FormEvent::CheckResolved { generation: 1, available: true },
        ])
        .unwrap();
        assert_eq!(state, FormState::Available);
        assert_eq!(state.transition(FormEvent::Edited).unwrap(), FormState::Editing);
    }

    #[test]
    fn test_stale_answer_is_ignored() {
        let state = run(vec![
            FormEvent::CheckIssued { generation: 1 },
            FormEvent::CheckIssued { generation: 2 },
            FormEvent::CheckResolved { generation: 1, available: false },
        ])
        .unwrap();
        assert_eq!(state, FormState::Checking { generation: 2 });

        let state = state
            .transition(FormEvent::CheckResolved { generation: 2, available: true })
            .unwrap();
        assert_eq!(state, FormState::Available);
    }

    #[test]
    fn test_answer_after_unrelated_edit() {
        let state = run(vec![
            FormEvent::CheckIssued { generation: 1 },
            FormEvent::Edited,
            FormEvent::CheckResolved { generation: 1, available: false },
        ])
        .unwrap();
        assert_eq!(state, FormState::Unavailable);
    }

    #[test]
    fn test_answers_do_not_disturb_outcomes() {
        let state = FormState::Confirmed { booking_id: BookingId::new("7") };
        let state = state
            .transition(FormEvent::CheckResolved { generation: 9, available: false })
            .unwrap();
        assert_eq!(state, FormState::Confirmed { booking_id: BookingId::new("7") });
        let submitting = FormState::Submitting
            .transition(FormEvent::CheckResolved { generation: 9, available: true })
            .unwrap();
        assert!(submitting.is_submitting());
    }

    #[test]
    fn test_failed_check_returns_to_editing() {
        let state = run(vec![
            FormEvent::CheckIssued { generation: 3 },
            FormEvent::CheckFailed { generation: 3 },
        ])
        .unwrap();
        assert_eq!(state, FormState::Editing);
    }

    #[test]
    fn test_submission_paths() {
        let confirmed = run(vec![
            FormEvent::SubmitRequested,
            FormEvent::BookingCreated { booking_id: BookingId::new("X") },
        ])
        .unwrap();
        assert_eq!(confirmed, FormState::Confirmed { booking_id: BookingId::new("X") });

        let rejected = run(vec![
            FormEvent::CheckIssued { generation: 1 },
            FormEvent::CheckResolved { generation: 1, available: false },
            FormEvent::SubmitRequested,
            FormEvent::BookingFailed { reason: "taken".to_string() },
        ])
        .unwrap();
        assert_eq!(rejected, FormState::Rejected { reason: "taken".to_string() });

        let blocked = run(vec![FormEvent::SubmitRequested, FormEvent::SubmitBlocked]).unwrap();
        assert_eq!(blocked, FormState::Editing);
    }

    #[test]
    fn test_outcome_states_allow_resubmission() {
        let state = FormState::Rejected { reason: "taken".to_string() };
        assert_eq!(state.transition(FormEvent::SubmitRequested).unwrap(), FormState::Submitting);
        let state = FormState::Confirmed { booking_id: BookingId::new("1") };
        assert_eq!(state.transition(FormEvent::Edited).unwrap(), FormState::Editing);
    }

    #[test]
    fn test_submission_is_not_interrupted() {
        let state = run(vec![
            FormEvent::SubmitRequested,
            FormEvent::Edited,
            FormEvent::CheckIssued { generation: 4 },
        ])
        .unwrap();
        assert!(state.is_submitting());
    }

    #[test_case(FormState::Editing, FormEvent::SubmitBlocked ; "blocked while editing")]
    #[test_case(FormState::Available, FormEvent::BookingCreated { booking_id: BookingId::new("1") } ; "created without submit")]
    #[test_case(FormState::Checking { generation: 1 }, FormEvent::BookingFailed { reason: String::new() } ; "failed while checking")]
    fn test_illegal_transitions(state: FormState, event: FormEvent) {
        let err = state.clone().transition(event.clone()).unwrap_err();
        assert_eq!(err.state, state.name());
        assert_eq!(err.event, event.name());
    }
}
