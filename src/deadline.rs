// src/deadline.rs

use chrono::{DateTime, Utc};

use crate::hr_api::{Task, TaskStatus};

/// Derived urgency of a task's deadline. Never persisted; recomputed from
/// `(status, deadline, now)` at every render or query pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeadlineUrgency {
    Completed,
    Overdue,
    DueToday,
    DueTomorrow,
    ApproachingSoon,
    OnTrack,
    NoDeadline,
}

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Whole days until the deadline, rounded up. A deadline a few hours ahead
/// counts as one day out; a deadline a few hours past still counts as zero.
fn days_until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = (deadline - now).num_seconds() as f64;
    (seconds / SECONDS_PER_DAY).ceil() as i64
}

pub fn classify(task: &Task, now: DateTime<Utc>) -> DeadlineUrgency {
    if matches!(task.status, TaskStatus::Completed | TaskStatus::Approved) {
        return DeadlineUrgency::Completed;
    }

    let deadline = match task.deadline {
        Some(deadline) => deadline,
        None => return DeadlineUrgency::NoDeadline,
    };

    let days = days_until(deadline, now);
    if days < 0 {
        DeadlineUrgency::Overdue
    } else if days == 0 {
        DeadlineUrgency::DueToday
    } else if days == 1 {
        DeadlineUrgency::DueTomorrow
    } else if days <= 3 {
        DeadlineUrgency::ApproachingSoon
    } else {
        DeadlineUrgency::OnTrack
    }
}

/// Classify a batch against a single `now` sample so a list rendered
/// together is internally consistent.
pub fn classify_batch(tasks: &[Task], now: DateTime<Utc>) -> Vec<DeadlineUrgency> {
    tasks.iter().map(|task| classify(task, now)).collect()
}

// --- Presentation ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrgencyStyle {
    pub label: &'static str,
    pub color: &'static str,
}

pub fn style(urgency: DeadlineUrgency) -> UrgencyStyle {
    match urgency {
        DeadlineUrgency::Completed => UrgencyStyle {
            label: "Completed",
            color: "#22c55e",
        },
        DeadlineUrgency::Overdue => UrgencyStyle {
            label: "Overdue",
            color: "#ef4444",
        },
        DeadlineUrgency::DueToday => UrgencyStyle {
            label: "Due today",
            color: "#f97316",
        },
        DeadlineUrgency::DueTomorrow => UrgencyStyle {
            label: "Due tomorrow",
            color: "#f59e0b",
        },
        DeadlineUrgency::ApproachingSoon => UrgencyStyle {
            label: "Approaching",
            color: "#eab308",
        },
        DeadlineUrgency::OnTrack => UrgencyStyle {
            label: "On track",
            color: "#3b82f6",
        },
        DeadlineUrgency::NoDeadline => UrgencyStyle {
            label: "No deadline",
            color: "#9ca3af",
        },
    }
}
