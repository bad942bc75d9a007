use crate::calc::{self, GradeFilters, SUBJECTS};
use crate::ipc::handlers::dispatch;
use crate::ipc::helpers::{
    db_delete_failed, db_insert_failed, db_update_failed, get_filter_str, get_nonempty_str,
    get_opt_str, get_required_f64, get_required_str, is_date, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::models::{Grade, StudentStatus};
use crate::store;
use rusqlite::Connection;
use serde_json::json;
use uuid::Uuid;

fn validate_grade(g: &Grade) -> Result<(), HandlerErr> {
    if !SUBJECTS.contains(&g.subject.as_str()) {
        return Err(HandlerErr::bad_params(format!(
            "unknown subject: {}",
            g.subject
        )));
    }
    if !(0.0..=20.0).contains(&g.value) {
        return Err(HandlerErr::bad_params("value must be between 0 and 20"));
    }
    if !is_date(&g.date) {
        return Err(HandlerErr::bad_params("date must be YYYY-MM-DD"));
    }
    Ok(())
}

fn grades_list(
    conn: &Connection,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let grades = store::list_grades(conn);
    let students = store::list_students(conn, Some(StudentStatus::Active));

    let rows: Vec<serde_json::Value> = grades
        .iter()
        .map(|g| {
            let student_name = students
                .iter()
                .find(|s| s.id == g.student_id)
                .map(|s| s.display_name())
                .unwrap_or_else(|| "-".to_string());
            json!({
                "id": g.id,
                "studentId": g.student_id,
                "studentName": student_name,
                "subject": g.subject,
                "value": g.value,
                "appreciation": g.appreciation,
                "date": g.date
            })
        })
        .collect();
    Ok(json!({ "grades": rows }))
}

/// Progressive-disclosure view: class → subject → grade rows, plus the class
/// roster driving the filter picker.
fn grades_grouped(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let filters = GradeFilters {
        class: get_filter_str(params, "class"),
        subject: get_filter_str(params, "subject"),
        student_id: get_filter_str(params, "studentId"),
    };

    let grades = store::list_grades(conn);
    let students = store::list_students(conn, Some(StudentStatus::Active));
    let schedule = store::list_schedule(conn);

    let groups = calc::grouped_grades(&grades, &students, &schedule, &filters);
    Ok(json!({
        "classes": calc::class_roster(&students, &schedule),
        "subjects": SUBJECTS,
        "groups": groups
    }))
}

fn grades_create(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let grade = Grade {
        id: Uuid::new_v4().to_string(),
        student_id: get_nonempty_str(params, "studentId")?,
        subject: get_required_str(params, "subject")?,
        value: get_required_f64(params, "value")?,
        appreciation: get_opt_str(params, "appreciation"),
        date: get_required_str(params, "date")?,
    };
    validate_grade(&grade)?;

    store::insert_grade(conn, &grade).map_err(db_insert_failed("grades"))?;
    Ok(json!({ "gradeId": grade.id }))
}

fn grades_update(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let grade_id = get_required_str(params, "gradeId")?;
    let Some(patch) = params.get("patch").filter(|v| v.is_object()) else {
        return Err(HandlerErr::bad_params("missing patch"));
    };

    let Some(current) = store::get_grade(conn, &grade_id) else {
        return Ok(json!({ "updated": false }));
    };
    let merged: Grade = store::apply_patch(&current, patch)
        .map_err(|e| HandlerErr::bad_params(e.to_string()))?;
    validate_grade(&merged)?;

    let updated = store::replace_grade(conn, &merged).map_err(db_update_failed("grades"))?;
    Ok(json!({ "updated": updated }))
}

fn grades_delete(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let grade_id = get_required_str(params, "gradeId")?;
    let deleted = store::delete_grade(conn, &grade_id).map_err(db_delete_failed("grades"))?;
    Ok(json!({ "deleted": deleted }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let handler = match req.method.as_str() {
        "grades.list" => grades_list,
        "grades.grouped" => grades_grouped,
        "grades.create" => grades_create,
        "grades.update" => grades_update,
        "grades.delete" => grades_delete,
        _ => return None,
    };
    Some(dispatch(state, req, handler))
}
