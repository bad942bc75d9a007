use crate::ipc::handlers::dispatch;
use crate::ipc::helpers::{
    db_delete_failed, db_insert_failed, db_update_failed, get_nonempty_str, get_required_f64,
    get_required_str, is_date, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::models::{Gender, Student, StudentStatus};
use crate::store;
use rusqlite::Connection;
use serde_json::json;
use uuid::Uuid;

fn parse_status_param(params: &serde_json::Value) -> Result<StudentStatus, HandlerErr> {
    match params.get("status").and_then(|v| v.as_str()) {
        None | Some("") | Some("active") => Ok(StudentStatus::Active),
        Some("archived") => Ok(StudentStatus::Archived),
        Some(other) => Err(HandlerErr::bad_params(format!(
            "status must be active or archived, got {}",
            other
        ))),
    }
}

fn validate_student(s: &Student) -> Result<(), HandlerErr> {
    if !is_date(&s.birth_date) {
        return Err(HandlerErr::bad_params("birthDate must be YYYY-MM-DD"));
    }
    Ok(())
}

fn students_list(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let status = parse_status_param(params)?;
    let students = store::list_students(conn, Some(status));
    Ok(json!({ "students": students }))
}

fn students_create(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let gender_raw = get_required_str(params, "gender")?;
    let student = Student {
        id: Uuid::new_v4().to_string(),
        first_name: get_nonempty_str(params, "firstName")?,
        last_name: get_nonempty_str(params, "lastName")?,
        birth_date: get_required_str(params, "birthDate")?,
        gender: Gender::parse(&gender_raw)
            .ok_or_else(|| HandlerErr::bad_params("gender must be M or F"))?,
        class: get_nonempty_str(params, "class")?,
        level: get_nonempty_str(params, "level")?,
        average: get_required_f64(params, "average")?,
        payment_up_to_date: params
            .get("paymentUpToDate")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        status: StudentStatus::Active,
        parent_name: get_nonempty_str(params, "parentName")?,
        parent_email: get_nonempty_str(params, "parentEmail")?,
        parent_phone: get_nonempty_str(params, "parentPhone")?,
    };
    validate_student(&student)?;

    store::insert_student(conn, &student).map_err(db_insert_failed("students"))?;
    Ok(json!({ "studentId": student.id }))
}

fn students_update(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let Some(patch) = params.get("patch").filter(|v| v.is_object()) else {
        return Err(HandlerErr::bad_params("missing patch"));
    };

    let Some(current) = store::get_student(conn, &student_id) else {
        return Ok(json!({ "updated": false }));
    };
    let merged: Student = store::apply_patch(&current, patch)
        .map_err(|e| HandlerErr::bad_params(e.to_string()))?;
    validate_student(&merged)?;

    let updated = store::replace_student(conn, &merged).map_err(db_update_failed("students"))?;
    Ok(json!({ "updated": updated }))
}

fn students_archive(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let Some(mut student) = store::get_student(conn, &student_id) else {
        return Ok(json!({ "archived": false }));
    };
    student.status = StudentStatus::Archived;
    let archived = store::replace_student(conn, &student).map_err(db_update_failed("students"))?;
    Ok(json!({ "archived": archived }))
}

fn students_delete(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let deleted = store::delete_student(conn, &student_id).map_err(db_delete_failed("students"))?;
    Ok(json!({ "deleted": deleted }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let handler = match req.method.as_str() {
        "students.list" => students_list,
        "students.create" => students_create,
        "students.update" => students_update,
        "students.archive" => students_archive,
        "students.delete" => students_delete,
        _ => return None,
    };
    Some(dispatch(state, req, handler))
}
