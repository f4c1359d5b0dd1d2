// src/calendar.rs

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::hr_api::{AttendanceDay, AttendanceStatus, PunchEvent};

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarDay {
    pub day: u32,
    pub day_of_week: Weekday,
    pub is_today: bool,
    pub is_current_month: bool,
    pub status: AttendanceStatus,
    pub punch_in: Option<PunchEvent>,
    pub punch_out: Option<PunchEvent>,
    pub work_hours: f64,
    pub overtime: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthSummary {
    pub working_days: u32,
    /// Attended working days as a percentage, one decimal.
    pub attendance_rate: f64,
    pub total_hours: f64,
    pub total_overtime: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthView {
    pub cells: Vec<CalendarDay>,
    pub summary: MonthSummary,
}

fn out_of_month_cell(date: NaiveDate) -> CalendarDay {
    CalendarDay {
        day: date.day(),
        day_of_week: date.weekday(),
        is_today: false,
        is_current_month: false,
        status: AttendanceStatus::NotRecorded,
        punch_in: None,
        punch_out: None,
        work_hours: 0.0,
        overtime: 0.0,
        notes: None,
    }
}

fn is_attended(status: AttendanceStatus) -> bool {
    matches!(
        status,
        AttendanceStatus::Present
            | AttendanceStatus::Late
            | AttendanceStatus::HalfDay
            | AttendanceStatus::EarlyDeparture
    )
}

fn is_non_working(status: AttendanceStatus) -> bool {
    matches!(status, AttendanceStatus::Holiday | AttendanceStatus::WeekOff)
}

/// Assemble one month of per-day records into a Sunday-first 7-column grid.
/// Cells before day 1 and after the last day belong to adjacent months;
/// in-month days without a record are synthesized as `NotRecorded`.
/// Returns `None` only for an invalid year/month.
pub fn build_month(
    year: i32,
    month: u32,
    days: &[AttendanceDay],
    today: NaiveDate,
) -> Option<MonthView> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let days_in_month = (first_of_next - first).num_days() as u32;

    let by_date: BTreeMap<NaiveDate, &AttendanceDay> =
        days.iter().map(|day| (day.date, day)).collect();

    let lead = first.weekday().num_days_from_sunday();
    let mut cells = Vec::with_capacity((lead + days_in_month + 6) as usize);

    for offset in (1..=lead as i64).rev() {
        cells.push(out_of_month_cell(first - Duration::days(offset)));
    }

    let mut working_days = 0u32;
    let mut attended = 0u32;
    let mut total_hours = 0.0f64;
    let mut total_overtime = 0.0f64;

    for day_number in 1..=days_in_month {
        // Within 1..=days_in_month this cannot fail.
        let date = NaiveDate::from_ymd_opt(year, month, day_number)?;
        let cell = match by_date.get(&date) {
            Some(record) => {
                let work_hours = record.total_work_hours.unwrap_or(0.0);
                let overtime = record.overtime_hours.unwrap_or(0.0);
                total_hours += work_hours;
                total_overtime += overtime;
                CalendarDay {
                    day: day_number,
                    day_of_week: date.weekday(),
                    is_today: date == today,
                    is_current_month: true,
                    status: record.status,
                    punch_in: record.punch_in.clone(),
                    punch_out: record.punch_out.clone(),
                    work_hours,
                    overtime,
                    notes: record.notes.clone(),
                }
            }
            None => CalendarDay {
                day: day_number,
                day_of_week: date.weekday(),
                is_today: date == today,
                is_current_month: true,
                status: AttendanceStatus::NotRecorded,
                punch_in: None,
                punch_out: None,
                work_hours: 0.0,
                overtime: 0.0,
                notes: None,
            },
        };

        if !is_non_working(cell.status) {
            working_days += 1;
        }
        if is_attended(cell.status) {
            attended += 1;
        }
        cells.push(cell);
    }

    let mut trailing = first_of_next;
    while cells.len() % 7 != 0 {
        cells.push(out_of_month_cell(trailing));
        trailing = trailing + Duration::days(1);
    }

    let attendance_rate = if working_days == 0 {
        0.0
    } else {
        (attended as f64 / working_days as f64 * 1000.0).round() / 10.0
    };

    Some(MonthView {
        cells,
        summary: MonthSummary {
            working_days,
            attendance_rate,
            total_hours,
            total_overtime,
        },
    })
}
