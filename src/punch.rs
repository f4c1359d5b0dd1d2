// src/punch.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::hr_api::{AttendanceApi, AttendanceDay, Coordinates, HrApiError};
use crate::location::{LocationError, LocationProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PunchAction {
    In,
    Out,
}

impl PunchAction {
    fn verb(&self) -> &'static str {
        match self {
            PunchAction::In => "punch in",
            PunchAction::Out => "punch out",
        }
    }

    fn generic_failure_message(&self) -> &'static str {
        match self {
            PunchAction::In => "Punch in failed. Please try again.",
            PunchAction::Out => "Punch out failed. Please try again.",
        }
    }
}

/// Per-subject, per-day progression. `PunchedOut` is terminal for the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PunchState {
    NoPunch,
    PunchedIn,
    PunchedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PunchSubject {
    /// The signed-in employee punching their own attendance.
    Own,
    /// An employee acted on by a manager; location is not required.
    Employee(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPunch {
    pub action: PunchAction,
    pub requested_at: DateTime<Utc>,
}

// --- Error Type ---

#[derive(Error, Debug)]
pub enum PunchError {
    #[error("Already punched for this slot today")]
    AlreadyPunched,

    #[error("Cannot punch out before punching in")]
    NotYetPunchedIn,

    #[error("Location capture failed: {0}")]
    Location(#[from] LocationError),

    #[error("{0}")]
    Backend(String),
}

fn map_backend_error(action: PunchAction, err: HrApiError) -> PunchError {
    match err {
        HrApiError::Backend { message, .. } if !message.trim().is_empty() => {
            PunchError::Backend(message)
        }
        other => {
            debug!("{} transport failure: {:?}", action.verb(), other);
            PunchError::Backend(action.generic_failure_message().to_string())
        }
    }
}

// --- Workflow ---

struct WorkflowInner {
    today: Option<AttendanceDay>,
    pending: Option<PendingPunch>,
    submitting: bool,
}

/// State machine governing punch eligibility and submission for one subject
/// and day. Invalid transitions are rejected before any network call; a
/// failed submission leaves the slot eligible for retry.
pub struct PunchWorkflow<A: AttendanceApi> {
    api: Arc<A>,
    location: Option<LocationProvider>,
    subject: PunchSubject,
    inner: Arc<Mutex<WorkflowInner>>,
}

impl<A: AttendanceApi> Clone for PunchWorkflow<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            location: self.location.clone(),
            subject: self.subject.clone(),
            inner: Arc::clone(&self.inner),
        }
    }
}

fn state_of(today: &Option<AttendanceDay>) -> PunchState {
    match today {
        Some(day) if day.punch_out.is_some() => PunchState::PunchedOut,
        Some(day) if day.punch_in.is_some() => PunchState::PunchedIn,
        _ => PunchState::NoPunch,
    }
}

fn check_transition(
    state: PunchState,
    action: PunchAction,
    submitting: bool,
) -> Result<(), PunchError> {
    // A submission already in flight holds the slot; the duplicate is
    // rejected before it can reach the backend.
    if submitting {
        return Err(PunchError::AlreadyPunched);
    }
    match (state, action) {
        (PunchState::NoPunch, PunchAction::In) => Ok(()),
        (PunchState::PunchedIn, PunchAction::Out) => Ok(()),
        (PunchState::NoPunch, PunchAction::Out) => Err(PunchError::NotYetPunchedIn),
        (PunchState::PunchedIn, PunchAction::In) => Err(PunchError::AlreadyPunched),
        (PunchState::PunchedOut, PunchAction::In) => Err(PunchError::AlreadyPunched),
        (PunchState::PunchedOut, PunchAction::Out) => Err(PunchError::AlreadyPunched),
    }
}

impl<A: AttendanceApi> PunchWorkflow<A> {
    pub fn for_self(api: Arc<A>, location: LocationProvider) -> Self {
        Self {
            api,
            location: Some(location),
            subject: PunchSubject::Own,
            inner: Arc::new(Mutex::new(WorkflowInner {
                today: None,
                pending: None,
                submitting: false,
            })),
        }
    }

    pub fn for_employee(api: Arc<A>, employee_id: impl Into<String>) -> Self {
        Self {
            api,
            location: None,
            subject: PunchSubject::Employee(employee_id.into()),
            inner: Arc::new(Mutex::new(WorkflowInner {
                today: None,
                pending: None,
                submitting: false,
            })),
        }
    }

    pub async fn state(&self) -> PunchState {
        state_of(&self.inner.lock().await.today)
    }

    pub async fn pending(&self) -> Option<PendingPunch> {
        self.inner.lock().await.pending.clone()
    }

    /// Prime the cached day from the backend so eligibility reflects punches
    /// made elsewhere (another device, an earlier session).
    pub async fn refresh_today(&self) -> Result<Option<AttendanceDay>, PunchError> {
        let fetched = match &self.subject {
            PunchSubject::Own => self.api.today().await,
            PunchSubject::Employee(id) => self.api.employee_today(id).await,
        }
        .map_err(|e| match e {
            HrApiError::Backend { message, .. } if !message.trim().is_empty() => {
                PunchError::Backend(message)
            }
            other => {
                debug!("Today lookup transport failure: {:?}", other);
                PunchError::Backend("Could not load today's attendance.".to_string())
            }
        })?;

        let mut inner = self.inner.lock().await;
        inner.today = fetched.clone();
        Ok(fetched)
    }

    /// Eligibility-checked confirmation step. No transition happens here;
    /// the machine moves only when `submit_punch` succeeds.
    pub async fn request_confirmation(
        &self,
        action: PunchAction,
        now: DateTime<Utc>,
    ) -> Result<PendingPunch, PunchError> {
        let mut inner = self.inner.lock().await;
        check_transition(state_of(&inner.today), action, inner.submitting)?;
        let pending = PendingPunch {
            action,
            requested_at: now,
        };
        inner.pending = Some(pending.clone());
        Ok(pending)
    }

    pub async fn cancel_confirmation(&self) {
        self.inner.lock().await.pending = None;
    }

    /// Validate, capture location when the subject punches for themselves,
    /// submit, and commit the backend's authoritative day on success.
    /// `manual_time` is honoured only for manager punches.
    pub async fn submit_punch(
        &self,
        action: PunchAction,
        manual_time: Option<DateTime<Utc>>,
    ) -> Result<AttendanceDay, PunchError> {
        {
            let mut inner = self.inner.lock().await;
            check_transition(state_of(&inner.today), action, inner.submitting)?;
            inner.submitting = true;
        }

        let result = self.dispatch(action, manual_time).await;

        let mut inner = self.inner.lock().await;
        inner.submitting = false;
        match result {
            Ok(day) => {
                info!(
                    "{} accepted for {} on {} (status now {:?})",
                    action.verb(),
                    day.employee_id,
                    day.date,
                    day.status
                );
                inner.today = Some(day.clone());
                inner.pending = None;
                Ok(day)
            }
            Err(e) => {
                warn!("{} rejected: {}", action.verb(), e);
                Err(e)
            }
        }
    }

    async fn dispatch(
        &self,
        action: PunchAction,
        manual_time: Option<DateTime<Utc>>,
    ) -> Result<AttendanceDay, PunchError> {
        match &self.subject {
            PunchSubject::Own => {
                if manual_time.is_some() {
                    debug!("Manual time ignored for a self punch");
                }
                let provider = self
                    .location
                    .as_ref()
                    .ok_or(PunchError::Location(LocationError::Unsupported))?;
                let reading = provider.capture().await?;
                let coordinates = Some(Coordinates {
                    latitude: reading.latitude,
                    longitude: reading.longitude,
                });
                match action {
                    PunchAction::In => self.api.punch_in(coordinates).await,
                    PunchAction::Out => self.api.punch_out(coordinates).await,
                }
                .map_err(|e| map_backend_error(action, e))
            }
            PunchSubject::Employee(id) => match action {
                PunchAction::In => self.api.punch_in_by_hr(id, manual_time).await,
                PunchAction::Out => self.api.punch_out_by_hr(id, manual_time).await,
            }
            .map_err(|e| map_backend_error(action, e)),
        }
    }
}
