use crate::calc::{self, WEEKDAYS};
use crate::ipc::handlers::dispatch;
use crate::ipc::helpers::{
    db_delete_failed, db_insert_failed, db_update_failed, get_filter_str, get_nonempty_str,
    get_opt_str, get_required_str, is_hhmm, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::models::ScheduleEntry;
use crate::store;
use rusqlite::Connection;
use serde_json::json;
use std::collections::HashSet;
use uuid::Uuid;

fn validate_entry(e: &ScheduleEntry) -> Result<(), HandlerErr> {
    if !WEEKDAYS.contains(&e.day.as_str()) {
        return Err(HandlerErr::bad_params(format!("unknown day: {}", e.day)));
    }
    if !is_hhmm(&e.start_time) {
        return Err(HandlerErr::bad_params("startTime must be HH:MM"));
    }
    if !is_hhmm(&e.end_time) {
        return Err(HandlerErr::bad_params("endTime must be HH:MM"));
    }
    Ok(())
}

fn schedule_list(
    conn: &Connection,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let entries = store::list_schedule(conn);
    Ok(json!({ "entries": entries }))
}

/// Classes observed on schedule entries, first occurrence first; this is the
/// class-picker view in front of the weekly grid.
fn schedule_classes(
    conn: &Connection,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let entries = store::list_schedule(conn);
    let mut seen = HashSet::new();
    let mut classes = Vec::new();
    for e in &entries {
        if seen.insert(e.class.clone()) {
            classes.push(e.class.clone());
        }
    }
    Ok(json!({ "classes": classes }))
}

/// The weekly grid for one class: merged slot rows × weekday columns. With
/// no class selected only the default slot list is returned.
fn schedule_grid(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let class = get_filter_str(params, "class");
    let entries = store::list_schedule(conn);
    let slots = calc::merge_slots(&entries, class.as_deref());

    let rows: Vec<serde_json::Value> = match class.as_deref() {
        Some(class) => calc::weekly_grid(&entries, class, &slots)
            .into_iter()
            .zip(slots.iter())
            .map(|(cells, slot)| json!({ "slot": slot, "cells": cells }))
            .collect(),
        None => Vec::new(),
    };

    Ok(json!({
        "class": class,
        "days": WEEKDAYS,
        "slots": slots,
        "rows": rows
    }))
}

fn schedule_create(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let entry = ScheduleEntry {
        id: Uuid::new_v4().to_string(),
        class: get_nonempty_str(params, "class")?,
        day: get_required_str(params, "day")?,
        start_time: get_required_str(params, "startTime")?,
        end_time: get_required_str(params, "endTime")?,
        subject: get_nonempty_str(params, "subject")?,
        teacher: get_nonempty_str(params, "teacher")?,
        room: get_nonempty_str(params, "room")?,
        description: get_opt_str(params, "description"),
    };
    validate_entry(&entry)?;

    store::insert_schedule_entry(conn, &entry).map_err(db_insert_failed("schedule_entries"))?;
    Ok(json!({ "entryId": entry.id }))
}

fn schedule_update(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let entry_id = get_required_str(params, "entryId")?;
    let Some(patch) = params.get("patch").filter(|v| v.is_object()) else {
        return Err(HandlerErr::bad_params("missing patch"));
    };

    let Some(current) = store::get_schedule_entry(conn, &entry_id) else {
        return Ok(json!({ "updated": false }));
    };
    let merged: ScheduleEntry = store::apply_patch(&current, patch)
        .map_err(|e| HandlerErr::bad_params(e.to_string()))?;
    validate_entry(&merged)?;

    let updated = store::replace_schedule_entry(conn, &merged)
        .map_err(db_update_failed("schedule_entries"))?;
    Ok(json!({ "updated": updated }))
}

fn schedule_delete(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let entry_id = get_required_str(params, "entryId")?;
    let deleted = store::delete_schedule_entry(conn, &entry_id)
        .map_err(db_delete_failed("schedule_entries"))?;
    Ok(json!({ "deleted": deleted }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let handler = match req.method.as_str() {
        "schedule.list" => schedule_list,
        "schedule.classes" => schedule_classes,
        "schedule.grid" => schedule_grid,
        "schedule.create" => schedule_create,
        "schedule.update" => schedule_update,
        "schedule.delete" => schedule_delete,
        _ => return None,
    };
    Some(dispatch(state, req, handler))
}
