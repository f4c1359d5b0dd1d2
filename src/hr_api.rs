// src/hr_api.rs

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::config::ConsoleConfig;

// --- HR API Data Structures ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PunchEvent {
    pub timestamp: DateTime<Utc>,
    pub coordinates: Option<Coordinates>,
}

/// Day-level attendance status as the backend reports it. The server owns
/// this value; the client only renders and aggregates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
    HalfDay,
    OnLeave,
    Holiday,
    WeekOff,
    EarlyDeparture,
    NotRecorded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceDay {
    pub date: NaiveDate,
    pub employee_id: String,
    pub punch_in: Option<PunchEvent>,
    pub punch_out: Option<PunchEvent>,
    pub status: AttendanceStatus,
    // Hours are computed server-side; absent fields aggregate as zero.
    pub total_work_hours: Option<f64>,
    pub overtime_hours: Option<f64>,
    #[serde(default)]
    pub is_within_office_location: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    New,
    Assigned,
    InProgress,
    Pending,
    Completed,
    Approved,
    Rejected,
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(TaskStatus::New),
            "assigned" => Ok(TaskStatus::Assigned),
            "inProgress" | "in-progress" => Ok(TaskStatus::InProgress),
            "pending" => Ok(TaskStatus::Pending),
            "completed" => Ok(TaskStatus::Completed),
            "approved" => Ok(TaskStatus::Approved),
            "rejected" => Ok(TaskStatus::Rejected),
            other => Err(format!("unknown task status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    pub priority: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<String>,
    pub assigned_by: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

/// Period roll-up returned by the details endpoint; fields the server does
/// not populate stay `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendancePeriodSummary {
    pub working_days: Option<u32>,
    pub present_days: Option<u32>,
    pub absent_days: Option<u32>,
    pub total_hours: Option<f64>,
    pub overtime_hours: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskReview {
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

// --- Request Bodies ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PunchBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    coordinates: Option<Coordinates>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HrPunchInBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    punch_in_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HrPunchOutBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    punch_out_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskStatusBody {
    status: TaskStatus,
}

#[derive(Debug, Deserialize)]
struct CalendarDetailPayload {
    #[serde(default)]
    days: Vec<AttendanceDay>,
}

// --- Error Type ---

#[derive(Error, Debug)]
pub enum HrApiError {
    #[error("HTTP request failed")]
    Request(#[from] reqwest::Error),

    #[error("JSON processing error")]
    Json(#[from] serde_json::Error),

    #[error("URL parsing error")]
    UrlParse(#[from] url::ParseError),

    #[error("HR API error: Status={status}, Message='{message}'")]
    Backend { status: StatusCode, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

// Error body shape used across the HR endpoints.
#[derive(Debug, Deserialize)]
struct ApiErrorPayload {
    message: Option<String>,
}

// --- Client Seams ---

#[async_trait]
pub trait AttendanceApi: Send + Sync {
    async fn punch_in(&self, coordinates: Option<Coordinates>) -> Result<AttendanceDay, HrApiError>;
    async fn punch_out(&self, coordinates: Option<Coordinates>)
        -> Result<AttendanceDay, HrApiError>;
    async fn punch_in_by_hr(
        &self,
        employee_id: &str,
        punch_in_time: Option<DateTime<Utc>>,
    ) -> Result<AttendanceDay, HrApiError>;
    async fn punch_out_by_hr(
        &self,
        employee_id: &str,
        punch_out_time: Option<DateTime<Utc>>,
    ) -> Result<AttendanceDay, HrApiError>;
    async fn today(&self) -> Result<Option<AttendanceDay>, HrApiError>;
    async fn employee_today(&self, employee_id: &str)
        -> Result<Option<AttendanceDay>, HrApiError>;
}

// --- Client Implementation ---

#[derive(Clone)]
pub struct HrApiClient {
    http: Client,
    base_url: String,
    token: String,
}

impl HrApiClient {
    pub fn new(config: &ConsoleConfig) -> Result<Self, HrApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let base_url = config.api_base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(HrApiError::Config("api base url is empty".to_string()));
        }
        // Validate once up front so later request building cannot produce
        // a malformed URL.
        Url::parse(&base_url)?;

        Ok(Self {
            http,
            base_url,
            token: config.api_token.clone(),
        })
    }

    fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder, HrApiError> {
        let url = if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        };
        Url::parse(&url)?;

        Ok(self
            .http
            .request(method, &url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json"))
    }

    async fn send_and_deserialize<T: DeserializeOwned>(
        &self,
        request_builder: RequestBuilder,
        context_msg: &str,
    ) -> Result<T, HrApiError> {
        debug!("Sending request: {}", context_msg);
        let response = request_builder.send().await?;
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            let parsed = serde_json::from_str::<T>(&body)?;
            Ok(parsed)
        } else {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            let message = match serde_json::from_str::<ApiErrorPayload>(&body) {
                Ok(parsed) => parsed.message.unwrap_or(body),
                Err(_) => body,
            };
            error!(
                "{} failed: status={}, message='{}'",
                context_msg, status, message
            );
            Err(HrApiError::Backend { status, message })
        }
    }

    // --- Attendance Lists ---

    pub async fn list_attendance(
        &self,
        params: &BTreeMap<String, String>,
    ) -> Result<Page<AttendanceDay>, HrApiError> {
        let request = self.request(Method::GET, "attendance")?.query(params);
        self.send_and_deserialize(request, "list attendance").await
    }

    pub async fn my_attendances(
        &self,
        params: &BTreeMap<String, String>,
    ) -> Result<Page<AttendanceDay>, HrApiError> {
        let request = self
            .request(Method::GET, "attendance/my-attendances")?
            .query(params);
        self.send_and_deserialize(request, "list my attendances")
            .await
    }

    pub async fn attendance_records(
        &self,
        employee_id: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<Page<AttendanceDay>, HrApiError> {
        let request = self
            .request(Method::GET, &format!("attendance/{}/details", employee_id))?
            .query(&[("type", "records")])
            .query(params);
        self.send_and_deserialize(request, "attendance records detail")
            .await
    }

    pub async fn attendance_calendar(
        &self,
        employee_id: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<Vec<AttendanceDay>, HrApiError> {
        let request = self
            .request(Method::GET, &format!("attendance/{}/details", employee_id))?
            .query(&[("type", "calendar")])
            .query(params);
        let payload: CalendarDetailPayload = self
            .send_and_deserialize(request, "attendance calendar detail")
            .await?;
        Ok(payload.days)
    }

    pub async fn attendance_summary(
        &self,
        employee_id: &str,
        period: &str,
    ) -> Result<AttendancePeriodSummary, HrApiError> {
        let request = self
            .request(Method::GET, &format!("attendance/{}/details", employee_id))?
            .query(&[("type", "summary"), ("period", period)]);
        self.send_and_deserialize(request, "attendance summary detail")
            .await
    }

    // --- Tasks ---

    pub async fn list_tasks(
        &self,
        params: &BTreeMap<String, String>,
    ) -> Result<Page<Task>, HrApiError> {
        let request = self.request(Method::GET, "tasks")?.query(params);
        self.send_and_deserialize(request, "list tasks").await
    }

    pub async fn my_tasks(
        &self,
        params: &BTreeMap<String, String>,
    ) -> Result<Page<Task>, HrApiError> {
        let request = self.request(Method::GET, "tasks/my")?.query(params);
        self.send_and_deserialize(request, "list my tasks").await
    }

    pub async fn update_task_status(
        &self,
        task_id: &str,
        status: TaskStatus,
    ) -> Result<Task, HrApiError> {
        let request = self
            .request(Method::PUT, &format!("tasks/{}/status", task_id))?
            .json(&TaskStatusBody { status });
        self.send_and_deserialize(request, "update task status")
            .await
    }

    pub async fn review_task(&self, task_id: &str, review: &TaskReview) -> Result<Task, HrApiError> {
        let request = self
            .request(Method::PUT, &format!("tasks/{}/review", task_id))?
            .json(review);
        self.send_and_deserialize(request, "review task").await
    }
}

#[async_trait]
impl AttendanceApi for HrApiClient {
    async fn punch_in(&self, coordinates: Option<Coordinates>) -> Result<AttendanceDay, HrApiError> {
        let request = self
            .request(Method::POST, "attendance/punch-in")?
            .json(&PunchBody { coordinates });
        self.send_and_deserialize(request, "punch in").await
    }

    async fn punch_out(
        &self,
        coordinates: Option<Coordinates>,
    ) -> Result<AttendanceDay, HrApiError> {
        let request = self
            .request(Method::POST, "attendance/punch-out")?
            .json(&PunchBody { coordinates });
        self.send_and_deserialize(request, "punch out").await
    }

    async fn punch_in_by_hr(
        &self,
        employee_id: &str,
        punch_in_time: Option<DateTime<Utc>>,
    ) -> Result<AttendanceDay, HrApiError> {
        let request = self
            .request(
                Method::POST,
                &format!("attendance/{}/punch-in/by-hr", employee_id),
            )?
            .json(&HrPunchInBody { punch_in_time });
        self.send_and_deserialize(request, "punch in by hr").await
    }

    async fn punch_out_by_hr(
        &self,
        employee_id: &str,
        punch_out_time: Option<DateTime<Utc>>,
    ) -> Result<AttendanceDay, HrApiError> {
        let request = self
            .request(
                Method::POST,
                &format!("attendance/{}/punch-out/by-hr", employee_id),
            )?
            .json(&HrPunchOutBody { punch_out_time });
        self.send_and_deserialize(request, "punch out by hr").await
    }

    async fn today(&self) -> Result<Option<AttendanceDay>, HrApiError> {
        let request = self.request(Method::GET, "attendance/today")?;
        self.send_and_deserialize(request, "today's attendance").await
    }

    async fn employee_today(
        &self,
        employee_id: &str,
    ) -> Result<Option<AttendanceDay>, HrApiError> {
        let request = self.request(
            Method::GET,
            &format!("attendance/employee/{}/today", employee_id),
        )?;
        self.send_and_deserialize(request, "employee's attendance today")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn punch_body_omits_missing_coordinates() {
        let body = serde_json::to_string(&PunchBody { coordinates: None }).unwrap();
        assert_eq!(body, "{}");

        let body = serde_json::to_string(&PunchBody {
            coordinates: Some(Coordinates {
                latitude: 59.3346,
                longitude: 18.0632,
            }),
        })
        .unwrap();
        assert!(body.contains("\"latitude\":59.3346"));
        assert!(body.contains("\"longitude\":18.0632"));
    }

    #[test]
    fn hr_punch_bodies_use_wire_field_names() {
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let body = serde_json::to_string(&HrPunchInBody {
            punch_in_time: Some(at),
        })
        .unwrap();
        assert!(body.contains("punchInTime"));

        let body = serde_json::to_string(&HrPunchOutBody {
            punch_out_time: Some(at),
        })
        .unwrap();
        assert!(body.contains("punchOutTime"));
    }

    #[test]
    fn attendance_day_tolerates_missing_optional_fields() {
        let day: AttendanceDay = serde_json::from_str(
            r#"{"date":"2026-03-02","employeeId":"E-17","status":"present"}"#,
        )
        .unwrap();
        assert_eq!(day.status, AttendanceStatus::Present);
        assert!(day.punch_in.is_none());
        assert!(day.total_work_hours.is_none());
        assert!(!day.is_within_office_location);
    }

    #[test]
    fn status_uses_camel_case_wire_names() {
        let status: AttendanceStatus = serde_json::from_str("\"halfDay\"").unwrap();
        assert_eq!(status, AttendanceStatus::HalfDay);
        assert_eq!(
            serde_json::to_string(&AttendanceStatus::WeekOff).unwrap(),
            "\"weekOff\""
        );
    }
}
