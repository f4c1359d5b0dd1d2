// src/query.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::hr_api::{AttendanceDay, HrApiClient, HrApiError, Page, Task};

const PAGE_KEY: &str = "page";

// --- Query State ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_param(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }

    fn toggled(&self) -> SortOrder {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

/// List views sharing one filter state. Each view understands only a subset
/// of the filter keys; the outbound query carries nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListView {
    Records,
    TeamRecords,
    Calendar,
    Tasks,
}

impl ListView {
    fn accepted_keys(&self) -> &'static [&'static str] {
        match self {
            ListView::Records => &[
                "employeeId",
                "startDate",
                "endDate",
                "status",
                "search",
                "page",
                "limit",
                "sortBy",
                "sortOrder",
            ],
            ListView::TeamRecords => &[
                "employeeId",
                "startDate",
                "endDate",
                "status",
                "department",
                "designation",
                "officeLocation",
                "shift",
                "search",
                "page",
                "limit",
                "sortBy",
                "sortOrder",
            ],
            ListView::Calendar => &["employeeId", "year", "month", "period"],
            ListView::Tasks => &[
                "status",
                "priority",
                "search",
                "page",
                "limit",
                "sortBy",
                "sortOrder",
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub search: String,
    pub filters: BTreeMap<String, String>,
    pub page: u32,
    pub limit: u32,
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            search: String::new(),
            filters: BTreeMap::new(),
            page: 1,
            limit: 20,
            sort_by: None,
            sort_order: SortOrder::Ascending,
        }
    }
}

impl QueryState {
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Outbound query parameters for a view, restricted to the keys that
    /// view understands.
    pub fn scoped_query(&self, view: ListView) -> BTreeMap<String, String> {
        let accepted = view.accepted_keys();
        let mut params = BTreeMap::new();

        for (key, value) in &self.filters {
            if accepted.contains(&key.as_str()) && !value.is_empty() {
                params.insert(key.clone(), value.clone());
            }
        }
        if !self.search.is_empty() && accepted.contains(&"search") {
            params.insert("search".to_string(), self.search.clone());
        }
        if accepted.contains(&"page") {
            params.insert("page".to_string(), self.page.to_string());
            params.insert("limit".to_string(), self.limit.to_string());
        }
        if let Some(sort_by) = &self.sort_by {
            if accepted.contains(&"sortBy") {
                params.insert("sortBy".to_string(), sort_by.clone());
                params.insert("sortOrder".to_string(), self.sort_order.as_param().to_string());
            }
        }
        params
    }
}

fn apply_filter_patch(state: &mut QueryState, patch: BTreeMap<String, String>) {
    let page_only = patch.len() == 1 && patch.contains_key(PAGE_KEY);
    if page_only {
        if let Ok(page) = patch[PAGE_KEY].parse::<u32>() {
            state.page = page.max(1);
        }
        return;
    }
    for (key, value) in patch {
        if key == PAGE_KEY {
            continue;
        }
        if value.is_empty() {
            state.filters.remove(&key);
        } else {
            state.filters.insert(key, value);
        }
    }
    state.page = 1;
}

// --- Error Type ---

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Network failure while querying the HR API")]
    NetworkFailure,

    #[error("{0}")]
    BackendRejected(String),
}

impl From<HrApiError> for QueryError {
    fn from(err: HrApiError) -> Self {
        match err {
            HrApiError::Backend { message, .. } => QueryError::BackendRejected(message),
            other => {
                debug!("List query transport failure: {:?}", other);
                QueryError::NetworkFailure
            }
        }
    }
}

// --- Fetch Seam ---

#[async_trait]
pub trait ListFetcher: Send + Sync {
    type Output: Clone + Send;

    async fn fetch(
        &self,
        view: ListView,
        query: &BTreeMap<String, String>,
    ) -> Result<Self::Output, QueryError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    /// Result of the most recent state change; rendered.
    Applied(T),
    Failed(QueryError),
    /// A newer state change overtook this fetch; its result is discarded.
    Superseded,
}

// --- Coordinator ---

struct CoordinatorInner<T> {
    view: ListView,
    state: QueryState,
    generation: u64,
    latest: Option<T>,
}

/// Keeps filter/sort/page state in lockstep with outbound list fetches.
/// Every mutation issues exactly one fetch; a response that arrives after a
/// newer mutation is dropped rather than rendered (last state wins).
pub struct QueryCoordinator<F: ListFetcher> {
    fetcher: Arc<F>,
    inner: Arc<Mutex<CoordinatorInner<F::Output>>>,
}

impl<F: ListFetcher> Clone for QueryCoordinator<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: ListFetcher> QueryCoordinator<F> {
    pub fn new(fetcher: F, view: ListView, state: QueryState) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            inner: Arc::new(Mutex::new(CoordinatorInner {
                view,
                state,
                generation: 0,
                latest: None,
            })),
        }
    }

    pub async fn state(&self) -> QueryState {
        self.inner.lock().await.state.clone()
    }

    pub async fn latest(&self) -> Option<F::Output> {
        self.inner.lock().await.latest.clone()
    }

    /// Fetch for the current state without mutating it (initial load).
    pub async fn refresh(&self) -> FetchOutcome<F::Output> {
        self.run_fetch(|_| {}).await
    }

    /// Merge `patch` into the filters. The page resets to 1 unless the
    /// patch is purely a page change.
    pub async fn update_filter(&self, patch: BTreeMap<String, String>) -> FetchOutcome<F::Output> {
        self.run_fetch(move |inner| apply_filter_patch(&mut inner.state, patch))
            .await
    }

    pub async fn update_page(&self, page: u32) -> FetchOutcome<F::Output> {
        let mut patch = BTreeMap::new();
        patch.insert(PAGE_KEY.to_string(), page.to_string());
        self.update_filter(patch).await
    }

    pub async fn update_search(&self, term: impl Into<String>) -> FetchOutcome<F::Output> {
        let term = term.into();
        self.run_fetch(move |inner| {
            inner.state.search = term;
            inner.state.page = 1;
        })
        .await
    }

    /// Toggle direction when the key repeats, else sort ascending by the
    /// new key.
    pub async fn update_sort(&self, key: impl Into<String>) -> FetchOutcome<F::Output> {
        let key = key.into();
        self.run_fetch(move |inner| {
            if inner.state.sort_by.as_deref() == Some(key.as_str()) {
                inner.state.sort_order = inner.state.sort_order.toggled();
            } else {
                inner.state.sort_by = Some(key);
                inner.state.sort_order = SortOrder::Ascending;
            }
            inner.state.page = 1;
        })
        .await
    }

    /// Switch to another view sharing the same filter state. Not a filter
    /// change: filters and page survive, the new view just ignores the keys
    /// it does not understand.
    pub async fn switch_view(&self, view: ListView) -> FetchOutcome<F::Output> {
        self.run_fetch(move |inner| inner.view = view).await
    }

    async fn run_fetch(
        &self,
        mutate: impl FnOnce(&mut CoordinatorInner<F::Output>),
    ) -> FetchOutcome<F::Output> {
        let (generation, view, query) = {
            let mut inner = self.inner.lock().await;
            mutate(&mut inner);
            inner.generation += 1;
            (
                inner.generation,
                inner.view,
                inner.state.scoped_query(inner.view),
            )
        };

        info!("Issuing {:?} fetch (generation {})", view, generation);
        let result = self.fetcher.fetch(view, &query).await;

        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            warn!(
                "Discarding superseded {:?} response (generation {}, current {})",
                view, generation, inner.generation
            );
            return FetchOutcome::Superseded;
        }
        match result {
            Ok(payload) => {
                inner.latest = Some(payload.clone());
                FetchOutcome::Applied(payload)
            }
            Err(err) => FetchOutcome::Failed(err),
        }
    }
}

// --- Production Fetcher ---

#[derive(Debug, Clone, PartialEq)]
pub enum ListData {
    Attendance(Page<AttendanceDay>),
    CalendarDays(Vec<AttendanceDay>),
    Tasks(Page<Task>),
}

pub struct HrListFetcher {
    api: Arc<HrApiClient>,
    /// Subject employee for the employee-scoped views (detail records,
    /// calendar); `None` means the signed-in user's own data.
    employee_id: Option<String>,
    all_tasks: bool,
}

impl HrListFetcher {
    pub fn new(api: Arc<HrApiClient>, employee_id: Option<String>) -> Self {
        Self {
            api,
            employee_id,
            all_tasks: false,
        }
    }

    /// Query the team-wide task list instead of the user's own.
    pub fn with_all_tasks(mut self, all_tasks: bool) -> Self {
        self.all_tasks = all_tasks;
        self
    }
}

#[async_trait]
impl ListFetcher for HrListFetcher {
    type Output = ListData;

    async fn fetch(
        &self,
        view: ListView,
        query: &BTreeMap<String, String>,
    ) -> Result<ListData, QueryError> {
        match view {
            ListView::Records => match &self.employee_id {
                Some(id) => Ok(ListData::Attendance(
                    self.api.attendance_records(id, query).await?,
                )),
                None => Ok(ListData::Attendance(self.api.my_attendances(query).await?)),
            },
            ListView::TeamRecords => {
                Ok(ListData::Attendance(self.api.list_attendance(query).await?))
            }
            ListView::Calendar => {
                let employee_id = self.employee_id.as_deref().ok_or_else(|| {
                    QueryError::BackendRejected("No employee selected for the calendar view".into())
                })?;
                Ok(ListData::CalendarDays(
                    self.api.attendance_calendar(employee_id, query).await?,
                ))
            }
            ListView::Tasks => {
                if self.all_tasks {
                    Ok(ListData::Tasks(self.api.list_tasks(query).await?))
                } else {
                    Ok(ListData::Tasks(self.api.my_tasks(query).await?))
                }
            }
        }
    }
}
