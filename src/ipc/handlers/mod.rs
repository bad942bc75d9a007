pub mod absences;
pub mod auth;
pub mod backup;
pub mod core;
pub mod grades;
pub mod payments;
pub mod reports;
pub mod schedule;
pub mod students;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::HandlerErr;
use crate::ipc::types::{AppState, Request};
use rusqlite::Connection;

pub type DataHandler = fn(&Connection, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>;

/// Run a data handler against the selected workspace; every data method
/// shares the same no-workspace guard and ok/err envelope.
pub fn dispatch(state: &mut AppState, req: &Request, handler: DataHandler) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match handler(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}
