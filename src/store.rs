//! Typed access to the five entity tables.
//!
//! Each category maps to its own strongly typed table; list order is store
//! insertion order. Reads degrade to "no data" when the medium fails so the
//! screens can always render; mutations report their failures to the caller.

use crate::models::{
    Absence, AbsenceKind, Gender, Grade, Payment, PaymentStatus, ScheduleEntry, Student,
    StudentStatus,
};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Students,
    Absences,
    Grades,
    Payments,
    Schedule,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Students,
        Category::Absences,
        Category::Grades,
        Category::Payments,
        Category::Schedule,
    ];

    pub fn table(self) -> &'static str {
        match self {
            Category::Students => "students",
            Category::Absences => "absences",
            Category::Grades => "grades",
            Category::Payments => "payments",
            Category::Schedule => "schedule_entries",
        }
    }

    /// Key used for seed files (`seeds/<key>.json`).
    pub fn key(self) -> &'static str {
        match self {
            Category::Schedule => "schedule",
            other => other.table(),
        }
    }
}

pub fn is_empty(conn: &Connection, category: Category) -> anyhow::Result<bool> {
    let sql = format!("SELECT COUNT(*) FROM {}", category.table());
    let count: i64 = conn.query_row(&sql, [], |r| r.get(0))?;
    Ok(count == 0)
}

/// Merge a partial JSON object over an existing record, original-store style:
/// present keys replace fields, absent keys keep them, identity is immutable.
pub fn apply_patch<T>(current: &T, patch: &serde_json::Value) -> anyhow::Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut merged = serde_json::to_value(current)?;
    if let (Some(target), Some(fields)) = (merged.as_object_mut(), patch.as_object()) {
        for (key, value) in fields {
            if key == "id" {
                continue;
            }
            target.insert(key.clone(), value.clone());
        }
    }
    Ok(serde_json::from_value(merged)?)
}

fn bad_enum(column: usize, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        format!("unrecognized value: {value}").into(),
    )
}

// ---- students ----

const STUDENT_COLS: &str = "id, first_name, last_name, birth_date, gender, class, level, \
     average, payment_up_to_date, status, parent_name, parent_email, parent_phone";

fn student_from_row(r: &Row) -> rusqlite::Result<Student> {
    let gender: String = r.get(4)?;
    let status: String = r.get(9)?;
    Ok(Student {
        id: r.get(0)?,
        first_name: r.get(1)?,
        last_name: r.get(2)?,
        birth_date: r.get(3)?,
        gender: Gender::parse(&gender).ok_or_else(|| bad_enum(4, &gender))?,
        class: r.get(5)?,
        level: r.get(6)?,
        average: r.get(7)?,
        payment_up_to_date: r.get(8)?,
        status: StudentStatus::parse(&status).ok_or_else(|| bad_enum(9, &status))?,
        parent_name: r.get(10)?,
        parent_email: r.get(11)?,
        parent_phone: r.get(12)?,
    })
}

/// One status-parameterized query serves both the active listing and the
/// archived one; `None` returns everything.
pub fn list_students(conn: &Connection, status: Option<StudentStatus>) -> Vec<Student> {
    try_list_students(conn, status).unwrap_or_default()
}

fn try_list_students(
    conn: &Connection,
    status: Option<StudentStatus>,
) -> anyhow::Result<Vec<Student>> {
    let rows = match status {
        Some(status) => {
            let sql = format!(
                "SELECT {STUDENT_COLS} FROM students WHERE status = ? ORDER BY rowid"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([status.as_str()], student_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        }
        None => {
            let sql = format!("SELECT {STUDENT_COLS} FROM students ORDER BY rowid");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], student_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        }
    };
    Ok(rows)
}

pub fn get_student(conn: &Connection, id: &str) -> Option<Student> {
    let sql = format!("SELECT {STUDENT_COLS} FROM students WHERE id = ?");
    conn.query_row(&sql, [id], student_from_row)
        .optional()
        .ok()
        .flatten()
}

pub fn insert_student(conn: &Connection, s: &Student) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO students(id, first_name, last_name, birth_date, gender, class, level,
            average, payment_up_to_date, status, parent_name, parent_email, parent_phone)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        (
            &s.id,
            &s.first_name,
            &s.last_name,
            &s.birth_date,
            s.gender.as_str(),
            &s.class,
            &s.level,
            s.average,
            s.payment_up_to_date,
            s.status.as_str(),
            &s.parent_name,
            &s.parent_email,
            &s.parent_phone,
        ),
    )?;
    Ok(())
}

pub fn replace_student(conn: &Connection, s: &Student) -> anyhow::Result<bool> {
    let changed = conn.execute(
        "UPDATE students SET first_name = ?, last_name = ?, birth_date = ?, gender = ?,
            class = ?, level = ?, average = ?, payment_up_to_date = ?, status = ?,
            parent_name = ?, parent_email = ?, parent_phone = ?
         WHERE id = ?",
        (
            &s.first_name,
            &s.last_name,
            &s.birth_date,
            s.gender.as_str(),
            &s.class,
            &s.level,
            s.average,
            s.payment_up_to_date,
            s.status.as_str(),
            &s.parent_name,
            &s.parent_email,
            &s.parent_phone,
            &s.id,
        ),
    )?;
    Ok(changed > 0)
}

pub fn delete_student(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let changed = conn.execute("DELETE FROM students WHERE id = ?", [id])?;
    Ok(changed > 0)
}

// ---- absences ----

const ABSENCE_COLS: &str = "id, student_id, date, kind, justified, comment, notified";

fn absence_from_row(r: &Row) -> rusqlite::Result<Absence> {
    let kind: String = r.get(3)?;
    Ok(Absence {
        id: r.get(0)?,
        student_id: r.get(1)?,
        date: r.get(2)?,
        kind: AbsenceKind::parse(&kind).ok_or_else(|| bad_enum(3, &kind))?,
        justified: r.get(4)?,
        comment: r.get(5)?,
        notified: r.get(6)?,
    })
}

pub fn list_absences(conn: &Connection) -> Vec<Absence> {
    try_list_absences(conn).unwrap_or_default()
}

fn try_list_absences(conn: &Connection) -> anyhow::Result<Vec<Absence>> {
    let sql = format!("SELECT {ABSENCE_COLS} FROM absences ORDER BY rowid");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], absence_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_absence(conn: &Connection, id: &str) -> Option<Absence> {
    let sql = format!("SELECT {ABSENCE_COLS} FROM absences WHERE id = ?");
    conn.query_row(&sql, [id], absence_from_row)
        .optional()
        .ok()
        .flatten()
}

pub fn insert_absence(conn: &Connection, a: &Absence) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO absences(id, student_id, date, kind, justified, comment, notified)
         VALUES(?, ?, ?, ?, ?, ?, ?)",
        (
            &a.id,
            &a.student_id,
            &a.date,
            a.kind.as_str(),
            a.justified,
            &a.comment,
            a.notified,
        ),
    )?;
    Ok(())
}

pub fn replace_absence(conn: &Connection, a: &Absence) -> anyhow::Result<bool> {
    let changed = conn.execute(
        "UPDATE absences SET student_id = ?, date = ?, kind = ?, justified = ?,
            comment = ?, notified = ?
         WHERE id = ?",
        (
            &a.student_id,
            &a.date,
            a.kind.as_str(),
            a.justified,
            &a.comment,
            a.notified,
            &a.id,
        ),
    )?;
    Ok(changed > 0)
}

pub fn delete_absence(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let changed = conn.execute("DELETE FROM absences WHERE id = ?", [id])?;
    Ok(changed > 0)
}

// ---- grades ----

const GRADE_COLS: &str = "id, student_id, subject, value, appreciation, date";

fn grade_from_row(r: &Row) -> rusqlite::Result<Grade> {
    Ok(Grade {
        id: r.get(0)?,
        student_id: r.get(1)?,
        subject: r.get(2)?,
        value: r.get(3)?,
        appreciation: r.get(4)?,
        date: r.get(5)?,
    })
}

pub fn list_grades(conn: &Connection) -> Vec<Grade> {
    try_list_grades(conn).unwrap_or_default()
}

fn try_list_grades(conn: &Connection) -> anyhow::Result<Vec<Grade>> {
    let sql = format!("SELECT {GRADE_COLS} FROM grades ORDER BY rowid");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], grade_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_grade(conn: &Connection, id: &str) -> Option<Grade> {
    let sql = format!("SELECT {GRADE_COLS} FROM grades WHERE id = ?");
    conn.query_row(&sql, [id], grade_from_row)
        .optional()
        .ok()
        .flatten()
}

pub fn insert_grade(conn: &Connection, g: &Grade) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO grades(id, student_id, subject, value, appreciation, date)
         VALUES(?, ?, ?, ?, ?, ?)",
        (
            &g.id,
            &g.student_id,
            &g.subject,
            g.value,
            &g.appreciation,
            &g.date,
        ),
    )?;
    Ok(())
}

pub fn replace_grade(conn: &Connection, g: &Grade) -> anyhow::Result<bool> {
    let changed = conn.execute(
        "UPDATE grades SET student_id = ?, subject = ?, value = ?, appreciation = ?, date = ?
         WHERE id = ?",
        (
            &g.student_id,
            &g.subject,
            g.value,
            &g.appreciation,
            &g.date,
            &g.id,
        ),
    )?;
    Ok(changed > 0)
}

pub fn delete_grade(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let changed = conn.execute("DELETE FROM grades WHERE id = ?", [id])?;
    Ok(changed > 0)
}

// ---- payments ----

const PAYMENT_COLS: &str = "id, student_id, amount_due, amount_paid, status, date, description";

fn payment_from_row(r: &Row) -> rusqlite::Result<Payment> {
    let status: String = r.get(4)?;
    Ok(Payment {
        id: r.get(0)?,
        student_id: r.get(1)?,
        amount_due: r.get(2)?,
        amount_paid: r.get(3)?,
        status: PaymentStatus::parse(&status).ok_or_else(|| bad_enum(4, &status))?,
        date: r.get(5)?,
        description: r.get(6)?,
    })
}

pub fn list_payments(conn: &Connection) -> Vec<Payment> {
    try_list_payments(conn).unwrap_or_default()
}

fn try_list_payments(conn: &Connection) -> anyhow::Result<Vec<Payment>> {
    let sql = format!("SELECT {PAYMENT_COLS} FROM payments ORDER BY rowid");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], payment_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_payment(conn: &Connection, id: &str) -> Option<Payment> {
    let sql = format!("SELECT {PAYMENT_COLS} FROM payments WHERE id = ?");
    conn.query_row(&sql, [id], payment_from_row)
        .optional()
        .ok()
        .flatten()
}

pub fn insert_payment(conn: &Connection, p: &Payment) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO payments(id, student_id, amount_due, amount_paid, status, date, description)
         VALUES(?, ?, ?, ?, ?, ?, ?)",
        (
            &p.id,
            &p.student_id,
            p.amount_due,
            p.amount_paid,
            p.status.as_str(),
            &p.date,
            &p.description,
        ),
    )?;
    Ok(())
}

pub fn replace_payment(conn: &Connection, p: &Payment) -> anyhow::Result<bool> {
    let changed = conn.execute(
        "UPDATE payments SET student_id = ?, amount_due = ?, amount_paid = ?, status = ?,
            date = ?, description = ?
         WHERE id = ?",
        (
            &p.student_id,
            p.amount_due,
            p.amount_paid,
            p.status.as_str(),
            &p.date,
            &p.description,
            &p.id,
        ),
    )?;
    Ok(changed > 0)
}

pub fn delete_payment(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let changed = conn.execute("DELETE FROM payments WHERE id = ?", [id])?;
    Ok(changed > 0)
}

// ---- schedule entries ----

const SCHEDULE_COLS: &str =
    "id, class, day, start_time, end_time, subject, teacher, room, description";

fn schedule_entry_from_row(r: &Row) -> rusqlite::Result<ScheduleEntry> {
    Ok(ScheduleEntry {
        id: r.get(0)?,
        class: r.get(1)?,
        day: r.get(2)?,
        start_time: r.get(3)?,
        end_time: r.get(4)?,
        subject: r.get(5)?,
        teacher: r.get(6)?,
        room: r.get(7)?,
        description: r.get(8)?,
    })
}

pub fn list_schedule(conn: &Connection) -> Vec<ScheduleEntry> {
    try_list_schedule(conn).unwrap_or_default()
}

fn try_list_schedule(conn: &Connection) -> anyhow::Result<Vec<ScheduleEntry>> {
    let sql = format!("SELECT {SCHEDULE_COLS} FROM schedule_entries ORDER BY rowid");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], schedule_entry_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_schedule_entry(conn: &Connection, id: &str) -> Option<ScheduleEntry> {
    let sql = format!("SELECT {SCHEDULE_COLS} FROM schedule_entries WHERE id = ?");
    conn.query_row(&sql, [id], schedule_entry_from_row)
        .optional()
        .ok()
        .flatten()
}

pub fn insert_schedule_entry(conn: &Connection, e: &ScheduleEntry) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO schedule_entries(id, class, day, start_time, end_time, subject,
            teacher, room, description)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?)",
        (
            &e.id,
            &e.class,
            &e.day,
            &e.start_time,
            &e.end_time,
            &e.subject,
            &e.teacher,
            &e.room,
            &e.description,
        ),
    )?;
    Ok(())
}

pub fn replace_schedule_entry(conn: &Connection, e: &ScheduleEntry) -> anyhow::Result<bool> {
    let changed = conn.execute(
        "UPDATE schedule_entries SET class = ?, day = ?, start_time = ?, end_time = ?,
            subject = ?, teacher = ?, room = ?, description = ?
         WHERE id = ?",
        (
            &e.class,
            &e.day,
            &e.start_time,
            &e.end_time,
            &e.subject,
            &e.teacher,
            &e.room,
            &e.description,
            &e.id,
        ),
    )?;
    Ok(changed > 0)
}

pub fn delete_schedule_entry(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let changed = conn.execute("DELETE FROM schedule_entries WHERE id = ?", [id])?;
    Ok(changed > 0)
}
