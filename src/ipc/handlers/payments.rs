use crate::calc::{self, FinanceFilters};
use crate::ipc::handlers::dispatch;
use crate::ipc::helpers::{
    db_delete_failed, db_insert_failed, db_update_failed, get_filter_str, get_nonempty_str,
    get_opt_str, get_required_f64, get_required_str, is_date, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::models::{Payment, PaymentStatus, StudentStatus};
use crate::store;
use rusqlite::Connection;
use serde_json::json;
use uuid::Uuid;

fn parse_filters(params: &serde_json::Value) -> Result<FinanceFilters, HandlerErr> {
    let status = match get_filter_str(params, "status") {
        None => None,
        Some(raw) => Some(
            PaymentStatus::parse(&raw)
                .ok_or_else(|| HandlerErr::bad_params(format!("unknown status: {}", raw)))?,
        ),
    };
    Ok(FinanceFilters {
        class: get_filter_str(params, "class"),
        status,
        student_id: get_filter_str(params, "studentId"),
    })
}

fn validate_payment(p: &Payment) -> Result<(), HandlerErr> {
    if p.amount_due < 0.0 {
        return Err(HandlerErr::bad_params("amountDue must be non-negative"));
    }
    if p.amount_paid < 0.0 {
        return Err(HandlerErr::bad_params("amountPaid must be non-negative"));
    }
    if !is_date(&p.date) {
        return Err(HandlerErr::bad_params("date must be YYYY-MM-DD"));
    }
    Ok(())
}

fn payments_list(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let filters = parse_filters(params)?;
    let payments = store::list_payments(conn);
    let students = store::list_students(conn, Some(StudentStatus::Active));

    let rows: Vec<serde_json::Value> = calc::filter_payments(&payments, &students, &filters)
        .into_iter()
        .map(|p| {
            let student = students.iter().find(|s| s.id == p.student_id);
            json!({
                "id": p.id,
                "studentId": p.student_id,
                "studentName": student.map(|s| s.display_name()).unwrap_or_else(|| "-".to_string()),
                "studentClass": student.map(|s| s.class.clone()).unwrap_or_else(|| "-".to_string()),
                "amountDue": p.amount_due,
                "amountPaid": p.amount_paid,
                "status": p.status.as_str(),
                "date": p.date,
                "description": p.description
            })
        })
        .collect();
    Ok(json!({ "payments": rows }))
}

fn payments_summary(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let filters = parse_filters(params)?;
    let payments = store::list_payments(conn);
    let students = store::list_students(conn, Some(StudentStatus::Active));

    let filtered = calc::filter_payments(&payments, &students, &filters);
    Ok(json!(calc::finance_summary(&filtered)))
}

fn payments_create(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let status_raw = get_required_str(params, "status")?;
    let payment = Payment {
        id: Uuid::new_v4().to_string(),
        student_id: get_nonempty_str(params, "studentId")?,
        amount_due: get_required_f64(params, "amountDue")?,
        amount_paid: get_required_f64(params, "amountPaid")?,
        status: PaymentStatus::parse(&status_raw)
            .ok_or_else(|| HandlerErr::bad_params(format!("unknown status: {}", status_raw)))?,
        date: get_required_str(params, "date")?,
        description: get_opt_str(params, "description"),
    };
    validate_payment(&payment)?;

    store::insert_payment(conn, &payment).map_err(db_insert_failed("payments"))?;
    Ok(json!({ "paymentId": payment.id }))
}

fn payments_update(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let payment_id = get_required_str(params, "paymentId")?;
    let Some(patch) = params.get("patch").filter(|v| v.is_object()) else {
        return Err(HandlerErr::bad_params("missing patch"));
    };

    let Some(current) = store::get_payment(conn, &payment_id) else {
        return Ok(json!({ "updated": false }));
    };
    let merged: Payment = store::apply_patch(&current, patch)
        .map_err(|e| HandlerErr::bad_params(e.to_string()))?;
    validate_payment(&merged)?;

    let updated = store::replace_payment(conn, &merged).map_err(db_update_failed("payments"))?;
    Ok(json!({ "updated": updated }))
}

fn payments_delete(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let payment_id = get_required_str(params, "paymentId")?;
    let deleted = store::delete_payment(conn, &payment_id).map_err(db_delete_failed("payments"))?;
    Ok(json!({ "deleted": deleted }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let handler = match req.method.as_str() {
        "payments.list" => payments_list,
        "payments.summary" => payments_summary,
        "payments.create" => payments_create,
        "payments.update" => payments_update,
        "payments.delete" => payments_delete,
        _ => return None,
    };
    Some(dispatch(state, req, handler))
}
