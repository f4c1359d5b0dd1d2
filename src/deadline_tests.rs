// src/deadline_tests.rs

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use crate::deadline::{classify, classify_batch, DeadlineUrgency};
    use crate::hr_api::{Task, TaskStatus};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
    }

    fn task(status: TaskStatus, deadline: Option<DateTime<Utc>>) -> Task {
        Task {
            id: "T-1".to_string(),
            title: "Prepare payroll export".to_string(),
            status,
            priority: Some("high".to_string()),
            deadline,
            due_date: None,
            assigned_to: Some("E-17".to_string()),
            assigned_by: Some("M-3".to_string()),
            is_active: true,
        }
    }

    #[test]
    fn completed_and_approved_win_regardless_of_deadline() {
        let long_past = Some(now() - Duration::days(30));
        assert_eq!(
            classify(&task(TaskStatus::Completed, long_past), now()),
            DeadlineUrgency::Completed
        );
        assert_eq!(
            classify(&task(TaskStatus::Approved, long_past), now()),
            DeadlineUrgency::Completed
        );
        assert_eq!(
            classify(&task(TaskStatus::Completed, None), now()),
            DeadlineUrgency::Completed
        );
    }

    #[test]
    fn a_missing_deadline_is_its_own_bucket() {
        assert_eq!(
            classify(&task(TaskStatus::InProgress, None), now()),
            DeadlineUrgency::NoDeadline
        );
    }

    #[test]
    fn more_than_a_day_past_is_overdue() {
        assert_eq!(
            classify(&task(TaskStatus::Pending, Some(now() - Duration::hours(25))), now()),
            DeadlineUrgency::Overdue
        );
        assert_eq!(
            classify(&task(TaskStatus::Pending, Some(now() - Duration::days(1))), now()),
            DeadlineUrgency::Overdue
        );
        assert_eq!(
            classify(&task(TaskStatus::Pending, Some(now() - Duration::days(14))), now()),
            DeadlineUrgency::Overdue
        );
    }

    #[test]
    fn within_the_past_day_still_counts_as_due_today() {
        // Ceiling arithmetic: a deadline a few hours gone rounds up to zero
        // days out, so the task reads as due today rather than overdue.
        assert_eq!(
            classify(&task(TaskStatus::Assigned, Some(now() - Duration::hours(5))), now()),
            DeadlineUrgency::DueToday
        );
        assert_eq!(
            classify(&task(TaskStatus::Assigned, Some(now())), now()),
            DeadlineUrgency::DueToday
        );
    }

    #[test]
    fn hours_ahead_round_up_to_due_tomorrow() {
        assert_eq!(
            classify(&task(TaskStatus::New, Some(now() + Duration::hours(5))), now()),
            DeadlineUrgency::DueTomorrow
        );
        assert_eq!(
            classify(&task(TaskStatus::New, Some(now() + Duration::hours(24))), now()),
            DeadlineUrgency::DueTomorrow
        );
    }

    #[test]
    fn two_and_three_days_out_are_approaching() {
        assert_eq!(
            classify(&task(TaskStatus::New, Some(now() + Duration::hours(48))), now()),
            DeadlineUrgency::ApproachingSoon
        );
        assert_eq!(
            classify(&task(TaskStatus::New, Some(now() + Duration::hours(72))), now()),
            DeadlineUrgency::ApproachingSoon
        );
    }

    #[test]
    fn beyond_three_days_is_on_track() {
        assert_eq!(
            classify(&task(TaskStatus::New, Some(now() + Duration::hours(73))), now()),
            DeadlineUrgency::OnTrack
        );
        assert_eq!(
            classify(&task(TaskStatus::New, Some(now() + Duration::days(10))), now()),
            DeadlineUrgency::OnTrack
        );
    }

    #[test]
    fn rejected_tasks_classify_by_deadline_like_any_open_task() {
        assert_eq!(
            classify(&task(TaskStatus::Rejected, Some(now() + Duration::days(10))), now()),
            DeadlineUrgency::OnTrack
        );
    }

    #[test]
    fn a_batch_shares_one_time_sample() {
        let tasks = vec![
            task(TaskStatus::Completed, Some(now() - Duration::days(3))),
            task(TaskStatus::New, Some(now() + Duration::hours(24))),
            task(TaskStatus::InProgress, None),
        ];

        let labels = classify_batch(&tasks, now());
        assert_eq!(
            labels,
            vec![
                DeadlineUrgency::Completed,
                DeadlineUrgency::DueTomorrow,
                DeadlineUrgency::NoDeadline,
            ]
        );
        // Identical inputs always yield identical labels.
        assert_eq!(labels, classify_batch(&tasks, now()));
    }
}
