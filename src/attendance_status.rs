// src/attendance_status.rs

use std::collections::BTreeMap;

use crate::hr_api::{AttendanceDay, AttendanceStatus};

/// Fixed visual weight for a day status. The match below is exhaustive on
/// purpose: adding a status without a style row fails to compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusStyle {
    pub label: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
    pub order: u8,
}

pub fn style(status: AttendanceStatus) -> StatusStyle {
    match status {
        AttendanceStatus::Present => StatusStyle {
            label: "Present",
            color: "#22c55e",
            icon: "✓",
            order: 0,
        },
        AttendanceStatus::Late => StatusStyle {
            label: "Late",
            color: "#f59e0b",
            icon: "L",
            order: 1,
        },
        AttendanceStatus::EarlyDeparture => StatusStyle {
            label: "Early departure",
            color: "#f97316",
            icon: "E",
            order: 2,
        },
        AttendanceStatus::HalfDay => StatusStyle {
            label: "Half day",
            color: "#eab308",
            icon: "½",
            order: 3,
        },
        AttendanceStatus::OnLeave => StatusStyle {
            label: "On leave",
            color: "#3b82f6",
            icon: "V",
            order: 4,
        },
        AttendanceStatus::Absent => StatusStyle {
            label: "Absent",
            color: "#ef4444",
            icon: "✗",
            order: 5,
        },
        AttendanceStatus::Holiday => StatusStyle {
            label: "Holiday",
            color: "#8b5cf6",
            icon: "H",
            order: 6,
        },
        AttendanceStatus::WeekOff => StatusStyle {
            label: "Week off",
            color: "#64748b",
            icon: "W",
            order: 7,
        },
        AttendanceStatus::NotRecorded => StatusStyle {
            label: "Not recorded",
            color: "#9ca3af",
            icon: "·",
            order: 8,
        },
    }
}

// --- Aggregation ---

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttendanceSummary {
    pub counts: BTreeMap<AttendanceStatus, u32>,
    pub total_hours: f64,
    pub total_overtime: f64,
}

impl AttendanceSummary {
    pub fn count_of(&self, status: AttendanceStatus) -> u32 {
        self.counts.get(&status).copied().unwrap_or(0)
    }
}

/// Simple reduction over server-computed per-day figures. Missing hour
/// fields count as zero.
pub fn summarize(days: &[AttendanceDay]) -> AttendanceSummary {
    let mut summary = AttendanceSummary::default();
    for day in days {
        *summary.counts.entry(day.status).or_insert(0) += 1;
        summary.total_hours += day.total_work_hours.unwrap_or(0.0);
        summary.total_overtime += day.overtime_hours.unwrap_or(0.0);
    }
    summary
}
