// src/calendar_tests.rs

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Weekday};

    use crate::calendar::build_month;
    use crate::hr_api::{AttendanceDay, AttendanceStatus};

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn day(
        date: NaiveDate,
        status: AttendanceStatus,
        hours: Option<f64>,
        overtime: Option<f64>,
    ) -> AttendanceDay {
        AttendanceDay {
            date,
            employee_id: "E-17".to_string(),
            punch_in: None,
            punch_out: None,
            status,
            total_work_hours: hours,
            overtime_hours: overtime,
            is_within_office_location: false,
            notes: None,
        }
    }

    #[test]
    fn leap_year_february_with_no_records() {
        let today = ymd(2024, 2, 15);
        let view = build_month(2024, 2, &[], today).unwrap();

        let in_month: Vec<_> = view
            .cells
            .iter()
            .filter(|cell| cell.is_current_month)
            .collect();
        assert_eq!(in_month.len(), 29);
        assert!(in_month
            .iter()
            .all(|cell| cell.status == AttendanceStatus::NotRecorded));
        assert!(in_month
            .iter()
            .all(|cell| cell.work_hours == 0.0 && cell.overtime == 0.0));

        let today_cells: Vec<_> = view.cells.iter().filter(|cell| cell.is_today).collect();
        assert_eq!(today_cells.len(), 1);
        assert_eq!(today_cells[0].day, 15);

        // 2024-02-01 is a Thursday: four leading cells, two trailing.
        assert_eq!(view.cells.len(), 35);
        assert_eq!(view.cells.len() % 7, 0);
        assert!(view.cells[..4].iter().all(|cell| !cell.is_current_month));
        assert!(view.cells[33..].iter().all(|cell| !cell.is_current_month));
        assert_eq!(view.cells[0].day_of_week, Weekday::Sun);

        assert_eq!(view.summary.working_days, 29);
        assert_eq!(view.summary.attendance_rate, 0.0);
        assert_eq!(view.summary.total_hours, 0.0);
    }

    #[test]
    fn records_land_on_their_cells_and_roll_into_the_summary() {
        let records = vec![
            day(ymd(2025, 4, 1), AttendanceStatus::Present, Some(8.0), Some(0.5)),
            day(ymd(2025, 4, 2), AttendanceStatus::Late, Some(7.0), None),
            day(ymd(2025, 4, 5), AttendanceStatus::Holiday, None, None),
            day(ymd(2025, 4, 6), AttendanceStatus::WeekOff, None, None),
            day(ymd(2025, 4, 7), AttendanceStatus::HalfDay, Some(4.0), None),
        ];
        let today = ymd(2025, 4, 2);
        let view = build_month(2025, 4, &records, today).unwrap();

        // 2025-04-01 is a Tuesday: two leading cells.
        let first = &view.cells[2];
        assert_eq!(first.day, 1);
        assert_eq!(first.status, AttendanceStatus::Present);
        assert_eq!(first.work_hours, 8.0);
        assert_eq!(first.overtime, 0.5);
        assert!(!first.is_today);
        assert!(view.cells[3].is_today);

        // Unmatched in-month dates synthesize an empty day.
        let unmatched = &view.cells[2 + 2];
        assert_eq!(unmatched.day, 3);
        assert_eq!(unmatched.status, AttendanceStatus::NotRecorded);
        assert_eq!(unmatched.work_hours, 0.0);

        // 30 days minus one holiday and one week-off.
        assert_eq!(view.summary.working_days, 28);
        // Present, Late and HalfDay attended out of 28.
        assert_eq!(view.summary.attendance_rate, 10.7);
        assert_eq!(view.summary.total_hours, 19.0);
        assert_eq!(view.summary.total_overtime, 0.5);
    }

    #[test]
    fn trailing_cells_pad_the_final_week_with_the_next_month() {
        let view = build_month(2025, 4, &[], ymd(2025, 4, 10)).unwrap();

        // Two leading + 30 days = 32, padded to 35.
        assert_eq!(view.cells.len(), 35);
        let trailing: Vec<_> = view.cells[32..].iter().collect();
        assert_eq!(trailing.len(), 3);
        assert!(trailing.iter().all(|cell| !cell.is_current_month));
        assert_eq!(
            trailing.iter().map(|cell| cell.day).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn a_today_outside_the_month_marks_no_cell() {
        let view = build_month(2025, 4, &[], ymd(2025, 5, 10)).unwrap();
        assert!(view.cells.iter().all(|cell| !cell.is_today));
    }

    #[test]
    fn month_starting_on_sunday_needs_no_leading_cells() {
        // 2025-06-01 is a Sunday.
        let view = build_month(2025, 6, &[], ymd(2025, 6, 15)).unwrap();
        assert!(view.cells[0].is_current_month);
        assert_eq!(view.cells[0].day, 1);
        assert_eq!(view.cells[0].day_of_week, Weekday::Sun);
        assert_eq!(view.cells.len() % 7, 0);
    }

    #[test]
    fn an_invalid_month_is_rejected() {
        assert!(build_month(2025, 13, &[], ymd(2025, 4, 1)).is_none());
        assert!(build_month(2025, 0, &[], ymd(2025, 4, 1)).is_none());
    }

    #[test]
    fn december_rolls_into_january_for_trailing_cells() {
        // 2025-12-01 is a Monday; 1 leading + 31 days = 32, padded to 35.
        let view = build_month(2025, 12, &[], ymd(2025, 12, 25)).unwrap();
        assert_eq!(view.cells.len(), 35);
        let last = view.cells.last().unwrap();
        assert!(!last.is_current_month);
        assert_eq!(last.day, 3);
    }
}
