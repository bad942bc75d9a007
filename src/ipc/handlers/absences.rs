use crate::ipc::handlers::dispatch;
use crate::ipc::helpers::{
    db_delete_failed, db_insert_failed, db_update_failed, get_nonempty_str, get_opt_bool,
    get_opt_str, get_required_str, is_date, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::models::{Absence, AbsenceKind, StudentStatus};
use crate::store;
use rusqlite::Connection;
use serde_json::json;
use uuid::Uuid;

fn validate_absence(a: &Absence) -> Result<(), HandlerErr> {
    if !is_date(&a.date) {
        return Err(HandlerErr::bad_params("date must be YYYY-MM-DD"));
    }
    Ok(())
}

fn absences_list(
    conn: &Connection,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let absences = store::list_absences(conn);
    let students = store::list_students(conn, Some(StudentStatus::Active));

    let rows: Vec<serde_json::Value> = absences
        .iter()
        .map(|a| {
            let student_name = students
                .iter()
                .find(|s| s.id == a.student_id)
                .map(|s| s.display_name())
                .unwrap_or_else(|| "-".to_string());
            json!({
                "id": a.id,
                "studentId": a.student_id,
                "studentName": student_name,
                "date": a.date,
                "type": a.kind.as_str(),
                "justified": a.justified,
                "comment": a.comment,
                "notified": a.notified
            })
        })
        .collect();
    Ok(json!({ "absences": rows }))
}

fn absences_create(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let kind_raw = get_required_str(params, "type")?;
    let absence = Absence {
        id: Uuid::new_v4().to_string(),
        student_id: get_nonempty_str(params, "studentId")?,
        date: get_required_str(params, "date")?,
        kind: AbsenceKind::parse(&kind_raw)
            .ok_or_else(|| HandlerErr::bad_params("type must be absence or retard"))?,
        justified: get_opt_bool(params, "justified"),
        comment: get_opt_str(params, "comment"),
        // Creation stamps the simulated parent notification; nothing is sent.
        notified: true,
    };
    validate_absence(&absence)?;

    store::insert_absence(conn, &absence).map_err(db_insert_failed("absences"))?;
    Ok(json!({ "absenceId": absence.id, "notified": true }))
}

fn absences_update(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let absence_id = get_required_str(params, "absenceId")?;
    let Some(patch) = params.get("patch").filter(|v| v.is_object()) else {
        return Err(HandlerErr::bad_params("missing patch"));
    };

    let Some(current) = store::get_absence(conn, &absence_id) else {
        return Ok(json!({ "updated": false }));
    };
    let merged: Absence = store::apply_patch(&current, patch)
        .map_err(|e| HandlerErr::bad_params(e.to_string()))?;
    validate_absence(&merged)?;

    let updated = store::replace_absence(conn, &merged).map_err(db_update_failed("absences"))?;
    Ok(json!({ "updated": updated }))
}

fn absences_delete(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let absence_id = get_required_str(params, "absenceId")?;
    let deleted = store::delete_absence(conn, &absence_id).map_err(db_delete_failed("absences"))?;
    Ok(json!({ "deleted": deleted }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let handler = match req.method.as_str() {
        "absences.list" => absences_list,
        "absences.create" => absences_create,
        "absences.update" => absences_update,
        "absences.delete" => absences_delete,
        _ => return None,
    };
    Some(dispatch(state, req, handler))
}
