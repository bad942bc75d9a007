use crate::calc;
use crate::ipc::handlers::dispatch;
use crate::ipc::helpers::HandlerErr;
use crate::ipc::types::{AppState, Request};
use crate::models::StudentStatus;
use crate::period::{self, PeriodKind};
use crate::store;
use chrono::NaiveDate;
use rusqlite::Connection;
use serde_json::json;

/// Per-student absence/tardiness counts for a week or month period.
///
/// Without an anchor the period is the current week/month; with one, the
/// resolver snaps it to the period start. The default-period marker keeps
/// the empty current-week view from claiming "no data".
fn reports_attendance(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let kind = match params.get("period").and_then(|v| v.as_str()) {
        None | Some("") | Some("week") => PeriodKind::Week,
        Some("month") => PeriodKind::Month,
        Some(other) => {
            return Err(HandlerErr::bad_params(format!(
                "period must be week or month, got {}",
                other
            )))
        }
    };

    let today = chrono::Local::now().date_naive();
    let (anchor, default_period) = match params
        .get("anchor")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
    {
        None => (
            period::default_anchor(kind, today),
            kind == PeriodKind::Week,
        ),
        Some(raw) => {
            let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") else {
                return Err(HandlerErr::bad_params("anchor must be YYYY-MM-DD"));
            };
            let default_period =
                kind == PeriodKind::Week && period::week_start(date) == period::week_start(today);
            (date, default_period)
        }
    };

    let range = period::resolve(kind, anchor);
    let students = store::list_students(conn, Some(StudentStatus::Active));
    let absences = store::list_absences(conn);

    let report = calc::attendance_report(&students, &absences, range, default_period);
    Ok(json!({
        "period": kind,
        "range": report.range,
        "rows": report.rows,
        "noData": report.no_data
    }))
}

fn reports_dashboard(
    conn: &Connection,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let students = store::list_students(conn, Some(StudentStatus::Active));
    let absences = store::list_absences(conn);
    Ok(json!(calc::dashboard_stats(&students, &absences)))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let handler = match req.method.as_str() {
        "reports.attendance" => reports_attendance,
        "reports.dashboard" => reports_dashboard,
        _ => return None,
    };
    Some(dispatch(state, req, handler))
}
