//! Single-administrator credentials and the persisted session flag.
//!
//! The credential record lives cleartext in settings; the check is a plain
//! comparison. A failed login is a normal `authenticated: false` result,
//! not an error.

use crate::db;
use crate::ipc::handlers::dispatch;
use crate::ipc::helpers::{db_update_failed, get_nonempty_str, get_required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::models::AdminAccount;
use rusqlite::Connection;
use serde_json::json;

const ADMIN_KEY: &str = "admin";
const SESSION_KEY: &str = "authenticated";

fn admin_register(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let account = AdminAccount {
        full_name: get_nonempty_str(params, "fullName")?,
        phone: get_nonempty_str(params, "phone")?,
        email: get_nonempty_str(params, "email")?,
        username: get_nonempty_str(params, "username")?,
        password: get_nonempty_str(params, "password")?,
    };

    let value = serde_json::to_value(&account)
        .map_err(|e| HandlerErr::bad_params(e.to_string()))?;
    db::settings_set_json(conn, ADMIN_KEY, &value).map_err(db_update_failed("settings"))?;
    Ok(json!({ "registered": true }))
}

fn admin_login(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let username = get_required_str(params, "username")?;
    let password = get_required_str(params, "password")?;

    // A missing or unreadable record simply fails the login.
    let stored = db::settings_get_json(conn, ADMIN_KEY).ok().flatten();
    let account = stored.and_then(|v| serde_json::from_value::<AdminAccount>(v).ok());

    let authenticated = account
        .map(|a| a.username == username && a.password == password)
        .unwrap_or(false);
    if authenticated {
        db::settings_set(conn, SESSION_KEY, "true").map_err(db_update_failed("settings"))?;
    }
    Ok(json!({ "authenticated": authenticated }))
}

fn admin_logout(
    conn: &Connection,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    db::settings_set(conn, SESSION_KEY, "false").map_err(db_update_failed("settings"))?;
    Ok(json!({ "authenticated": false }))
}

fn admin_session(
    conn: &Connection,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let registered = db::settings_get(conn, ADMIN_KEY).ok().flatten().is_some();
    let authenticated =
        db::settings_get(conn, SESSION_KEY).ok().flatten().as_deref() == Some("true");
    Ok(json!({ "registered": registered, "authenticated": authenticated }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let handler = match req.method.as_str() {
        "admin.register" => admin_register,
        "admin.login" => admin_login,
        "admin.logout" => admin_logout,
        "admin.session" => admin_session,
        _ => return None,
    };
    Some(dispatch(state, req, handler))
}
