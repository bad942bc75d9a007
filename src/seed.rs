//! First-run seed import.
//!
//! A workspace may ship a `seeds/` directory with one JSON array per entity
//! category. The first `workspace.select` copies each file into its (still
//! empty) table, then stamps the `seeded` flag so the files are never read
//! again. The import is best-effort: a missing or malformed file is skipped
//! and must not keep the workspace from opening.

use crate::models::{Absence, Grade, Payment, ScheduleEntry, Student};
use crate::store::{self, Category};
use crate::db;
use rusqlite::Connection;
use std::path::Path;

const SEED_DIR: &str = "seeds";
const SEEDED_FLAG: &str = "seeded";

pub fn import_seeds(conn: &Connection, workspace: &Path) -> anyhow::Result<usize> {
    if db::settings_get(conn, SEEDED_FLAG)?.as_deref() == Some("true") {
        return Ok(0);
    }

    let dir = workspace.join(SEED_DIR);
    let mut imported = 0;
    for category in Category::ALL {
        let path = dir.join(format!("{}.json", category.key()));
        if !path.is_file() {
            continue;
        }
        if !store::is_empty(conn, category)? {
            continue;
        }
        let Ok(text) = std::fs::read_to_string(&path) else {
            continue;
        };
        let Ok(records) = serde_json::from_str::<Vec<serde_json::Value>>(&text) else {
            continue;
        };
        for record in records {
            if insert_record(conn, category, record)? {
                imported += 1;
            }
        }
    }

    db::settings_set(conn, SEEDED_FLAG, "true")?;
    Ok(imported)
}

/// Returns false for a record that does not parse as its category; bad seed
/// rows are dropped silently, the rest of the file still loads.
fn insert_record(
    conn: &Connection,
    category: Category,
    record: serde_json::Value,
) -> anyhow::Result<bool> {
    match category {
        Category::Students => {
            let Ok(s) = serde_json::from_value::<Student>(record) else {
                return Ok(false);
            };
            store::insert_student(conn, &s)?;
        }
        Category::Absences => {
            let Ok(a) = serde_json::from_value::<Absence>(record) else {
                return Ok(false);
            };
            store::insert_absence(conn, &a)?;
        }
        Category::Grades => {
            let Ok(g) = serde_json::from_value::<Grade>(record) else {
                return Ok(false);
            };
            store::insert_grade(conn, &g)?;
        }
        Category::Payments => {
            let Ok(p) = serde_json::from_value::<Payment>(record) else {
                return Ok(false);
            };
            store::insert_payment(conn, &p)?;
        }
        Category::Schedule => {
            let Ok(e) = serde_json::from_value::<ScheduleEntry>(record) else {
                return Ok(false);
            };
            store::insert_schedule_entry(conn, &e)?;
        }
    }
    Ok(true)
}
