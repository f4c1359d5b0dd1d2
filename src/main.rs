// src/main.rs

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Datelike, Utc};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod attendance_status;
mod calendar;
mod config;
mod deadline;
mod hr_api;
mod location;
mod punch;
mod query;

mod calendar_tests;
mod deadline_tests;
mod location_tests;

use config::ConsoleConfig;
use hr_api::{AttendanceDay, AttendanceStatus, HrApiClient, Task, TaskReview, TaskStatus};
use location::{FixedLocationSource, LocationProvider, LocationSource, UnsupportedLocationSource};
use punch::{PunchAction, PunchWorkflow};
use query::{FetchOutcome, HrListFetcher, ListData, ListView, QueryCoordinator, QueryState};

#[derive(Parser)]
#[command(
    name = "punchdesk",
    about = "HR console: attendance punches, calendars and tasks",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record a punch-in, for yourself or for an employee you manage
    PunchIn {
        /// Punch on behalf of this employee (manager flow, no location)
        #[arg(long)]
        employee: Option<String>,
        /// Manual timestamp, RFC 3339; manager punches only
        #[arg(long)]
        time: Option<DateTime<Utc>>,
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Record a punch-out, for yourself or for an employee you manage
    PunchOut {
        #[arg(long)]
        employee: Option<String>,
        #[arg(long)]
        time: Option<DateTime<Utc>>,
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,
        #[arg(long)]
        yes: bool,
    },
    /// Show today's attendance
    Today {
        #[arg(long)]
        employee: Option<String>,
    },
    /// List attendance records
    Records {
        /// Query the whole team instead of your own records
        #[arg(long)]
        team: bool,
        /// Employee whose record history to read (manager detail view)
        #[arg(long)]
        employee: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        sort: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Render a month calendar for an employee
    Calendar {
        #[arg(long)]
        employee: Option<String>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
    },
    /// Show an employee's attendance roll-up for a period
    Summary {
        #[arg(long)]
        employee: Option<String>,
        /// Period in YYYY-MM form
        #[arg(long)]
        period: String,
    },
    /// List tasks with deadline urgency
    Tasks {
        /// Query every task you can see instead of only your own
        #[arg(long)]
        all: bool,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Update a task's status
    TaskStatus { id: String, status: TaskStatus },
    /// Review a completed task
    TaskReview {
        id: String,
        #[arg(long)]
        approve: bool,
        #[arg(long)]
        remarks: Option<String>,
    },
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting tracing subscriber")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    let config = ConsoleConfig::from_env().context("loading configuration")?;
    let api = Arc::new(HrApiClient::new(&config).context("building HR API client")?);

    match cli.command {
        Command::PunchIn {
            employee,
            time,
            lat,
            lon,
            yes,
        } => {
            run_punch(
                &config,
                api,
                PunchAction::In,
                employee,
                time,
                lat,
                lon,
                yes,
            )
            .await
        }
        Command::PunchOut {
            employee,
            time,
            lat,
            lon,
            yes,
        } => {
            run_punch(
                &config,
                api,
                PunchAction::Out,
                employee,
                time,
                lat,
                lon,
                yes,
            )
            .await
        }
        Command::Today { employee } => run_today(api, employee).await,
        Command::Records {
            team,
            employee,
            status,
            department,
            search,
            sort,
            page,
            limit,
        } => {
            run_records(
                api, team, employee, status, department, search, sort, page, limit,
            )
            .await
        }
        Command::Calendar {
            employee,
            year,
            month,
        } => run_calendar(&config, api, employee, year, month).await,
        Command::Summary { employee, period } => {
            run_summary(&config, api, employee, period).await
        }
        Command::Tasks {
            all,
            status,
            search,
            page,
            limit,
        } => run_tasks(api, all, status, search, page, limit).await,
        Command::TaskStatus { id, status } => {
            let task = api.update_task_status(&id, status).await?;
            print_task(&task, deadline::classify(&task, Utc::now()));
            Ok(())
        }
        Command::TaskReview {
            id,
            approve,
            remarks,
        } => {
            let review = TaskReview {
                status: if approve {
                    TaskStatus::Approved
                } else {
                    TaskStatus::Rejected
                },
                remarks,
            };
            let task = api.review_task(&id, &review).await?;
            print_task(&task, deadline::classify(&task, Utc::now()));
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_punch(
    config: &ConsoleConfig,
    api: Arc<HrApiClient>,
    action: PunchAction,
    employee: Option<String>,
    time: Option<DateTime<Utc>>,
    lat: Option<f64>,
    lon: Option<f64>,
    yes: bool,
) -> Result<()> {
    let workflow = match employee {
        Some(id) => PunchWorkflow::for_employee(api, id),
        None => {
            let source: Arc<dyn LocationSource> = match (lat, lon) {
                (Some(lat), Some(lon)) => Arc::new(FixedLocationSource::new(lat, lon, 25.0)),
                _ => Arc::new(UnsupportedLocationSource),
            };
            let provider = LocationProvider::new(source, config.reverse_geocoder());
            PunchWorkflow::for_self(api, provider)
        }
    };

    workflow.refresh_today().await?;

    if !yes {
        let pending = workflow.request_confirmation(action, Utc::now()).await?;
        let target = time.unwrap_or(pending.requested_at);
        print!(
            "Confirm {} at {}? [y/N] ",
            match action {
                PunchAction::In => "punch-in",
                PunchAction::Out => "punch-out",
            },
            target.format("%Y-%m-%d %H:%M:%S UTC")
        );
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        if !answer.trim().eq_ignore_ascii_case("y") {
            workflow.cancel_confirmation().await;
            println!("Cancelled.");
            return Ok(());
        }
    }

    let day = workflow.submit_punch(action, time).await?;
    print_day(&day);
    Ok(())
}

async fn run_today(api: Arc<HrApiClient>, employee: Option<String>) -> Result<()> {
    let workflow = match employee {
        Some(id) => PunchWorkflow::for_employee(api, id),
        None => PunchWorkflow::for_self(
            api,
            LocationProvider::new(Arc::new(UnsupportedLocationSource), None),
        ),
    };
    match workflow.refresh_today().await? {
        Some(day) => print_day(&day),
        None => println!("No attendance recorded today."),
    }
    if workflow.state().await == punch::PunchState::PunchedIn {
        println!("Currently punched in; remember to punch out.");
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_records(
    api: Arc<HrApiClient>,
    team: bool,
    employee: Option<String>,
    status: Option<String>,
    department: Option<String>,
    search: Option<String>,
    sort: Option<String>,
    page: u32,
    limit: u32,
) -> Result<()> {
    let view = if team {
        ListView::TeamRecords
    } else {
        ListView::Records
    };
    let fetcher = HrListFetcher::new(api, employee);
    let coordinator = QueryCoordinator::new(fetcher, view, QueryState::with_limit(limit));

    let mut patch = BTreeMap::new();
    if let Some(status) = status {
        patch.insert("status".to_string(), status);
    }
    if let Some(department) = department {
        patch.insert("department".to_string(), department);
    }

    let mut outcome = if patch.is_empty() {
        coordinator.refresh().await
    } else {
        coordinator.update_filter(patch).await
    };
    if let Some(term) = search {
        outcome = coordinator.update_search(term).await;
    }
    if let Some(key) = sort {
        outcome = coordinator.update_sort(key).await;
    }
    if page > 1 {
        outcome = coordinator.update_page(page).await;
    }

    if let FetchOutcome::Failed(err) = outcome {
        return Err(err).context("fetching attendance records");
    }
    match coordinator.latest().await {
        Some(ListData::Attendance(records)) => {
            info!(
                "Fetched {} of {} attendance records (page {})",
                records.items.len(),
                records.total,
                records.page
            );
            for day in &records.items {
                print_day_line(day);
            }
            if records.items.is_empty() {
                println!("No records matched.");
                return Ok(());
            }
            let summary = attendance_status::summarize(&records.items);
            println!(
                "present: {}  late: {}  absent: {}  hours: {:.1}  overtime: {:.1}",
                summary.count_of(AttendanceStatus::Present),
                summary.count_of(AttendanceStatus::Late),
                summary.count_of(AttendanceStatus::Absent),
                summary.total_hours,
                summary.total_overtime
            );
            Ok(())
        }
        _ => bail!("unexpected payload for a records view"),
    }
}

async fn run_summary(
    config: &ConsoleConfig,
    api: Arc<HrApiClient>,
    employee: Option<String>,
    period: String,
) -> Result<()> {
    let employee_id = match employee.or_else(|| config.employee_id.clone()) {
        Some(id) => id,
        None => bail!("no employee id given (use --employee or PUNCHDESK_EMPLOYEE_ID)"),
    };
    let summary = api.attendance_summary(&employee_id, &period).await?;
    println!("{}  ({})", period, employee_id);
    println!(
        "working days: {}  present: {}  absent: {}",
        summary.working_days.unwrap_or(0),
        summary.present_days.unwrap_or(0),
        summary.absent_days.unwrap_or(0)
    );
    println!(
        "hours: {:.1}  overtime: {:.1}",
        summary.total_hours.unwrap_or(0.0),
        summary.overtime_hours.unwrap_or(0.0)
    );
    Ok(())
}

async fn run_calendar(
    config: &ConsoleConfig,
    api: Arc<HrApiClient>,
    employee: Option<String>,
    year: Option<i32>,
    month: Option<u32>,
) -> Result<()> {
    let employee_id = match employee.or_else(|| config.employee_id.clone()) {
        Some(id) => id,
        None => bail!("no employee id given (use --employee or PUNCHDESK_EMPLOYEE_ID)"),
    };
    let today = Utc::now().date_naive();
    let year = year.unwrap_or_else(|| today.year());
    let month = month.unwrap_or_else(|| today.month());

    let mut params = BTreeMap::new();
    params.insert("year".to_string(), year.to_string());
    params.insert("month".to_string(), month.to_string());
    let days = api.attendance_calendar(&employee_id, &params).await?;

    let view = match calendar::build_month(year, month, &days, today) {
        Some(view) => view,
        None => bail!("invalid month: {}-{}", year, month),
    };

    println!("{}-{:02}  ({})", year, month, employee_id);
    println!(" Su  Mo  Tu  We  Th  Fr  Sa");
    for week in view.cells.chunks(7) {
        let mut line = String::new();
        for cell in week {
            if cell.is_current_month {
                let style = attendance_status::style(cell.status);
                let marker = if cell.is_today { '*' } else { ' ' };
                line.push_str(&format!("{:>2}{}{}", cell.day, style.icon, marker));
            } else {
                line.push_str("  . ");
            }
        }
        println!("{}", line);
    }
    println!(
        "working days: {}  attendance: {:.1}%  hours: {:.1}  overtime: {:.1}",
        view.summary.working_days,
        view.summary.attendance_rate,
        view.summary.total_hours,
        view.summary.total_overtime
    );
    Ok(())
}

async fn run_tasks(
    api: Arc<HrApiClient>,
    all: bool,
    status: Option<String>,
    search: Option<String>,
    page: u32,
    limit: u32,
) -> Result<()> {
    let fetcher = HrListFetcher::new(api, None).with_all_tasks(all);
    let coordinator =
        QueryCoordinator::new(fetcher, ListView::Tasks, QueryState::with_limit(limit));

    let mut patch = BTreeMap::new();
    if let Some(status) = status {
        patch.insert("status".to_string(), status);
    }
    let mut outcome = if patch.is_empty() {
        coordinator.refresh().await
    } else {
        coordinator.update_filter(patch).await
    };
    if let Some(term) = search {
        outcome = coordinator.update_search(term).await;
    }
    if page > 1 {
        outcome = coordinator.update_page(page).await;
    }

    if let FetchOutcome::Failed(err) = outcome {
        return Err(err).context("fetching tasks");
    }
    match coordinator.latest().await {
        Some(ListData::Tasks(tasks)) => {
            // One sample for the whole batch keeps the list consistent.
            let labels = deadline::classify_batch(&tasks.items, Utc::now());
            for (task, urgency) in tasks.items.iter().zip(labels) {
                print_task(task, urgency);
            }
            if tasks.items.is_empty() {
                println!("No tasks matched.");
            }
            Ok(())
        }
        _ => bail!("unexpected payload for the tasks view"),
    }
}

// --- Rendering ---

fn print_day(day: &AttendanceDay) {
    let style = attendance_status::style(day.status);
    println!("{}  {}  {}", day.date, style.icon, style.label);
    if let Some(punch) = &day.punch_in {
        println!("  in:  {}", punch.timestamp.format("%H:%M:%S UTC"));
    }
    if let Some(punch) = &day.punch_out {
        println!("  out: {}", punch.timestamp.format("%H:%M:%S UTC"));
    }
    println!(
        "  hours: {:.2}  overtime: {:.2}  office: {}",
        day.total_work_hours.unwrap_or(0.0),
        day.overtime_hours.unwrap_or(0.0),
        if day.is_within_office_location {
            "inside"
        } else {
            "outside"
        }
    );
}

fn print_day_line(day: &AttendanceDay) {
    let style = attendance_status::style(day.status);
    println!(
        "{}  {:<14} {:>6.2}h  {}",
        day.date,
        style.label,
        day.total_work_hours.unwrap_or(0.0),
        day.employee_id
    );
}

fn print_task(task: &Task, urgency: deadline::DeadlineUrgency) {
    let style = deadline::style(urgency);
    let deadline_text = task
        .deadline
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{:<12} {:<28} {:<12} {}",
        task.id, task.title, style.label, deadline_text
    );
}
