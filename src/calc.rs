//! Pure report/aggregation logic behind the admin screens.
//!
//! Everything here is a function of the entity lists handed in by the
//! handlers; nothing reads the store or holds state across calls.

use crate::models::{Absence, AbsenceKind, Grade, Payment, PaymentStatus, ScheduleEntry, Student};
use crate::period::DateRange;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const SUBJECTS: [&str; 5] = ["Mathématiques", "Français", "Histoire", "SVT", "Anglais"];

pub const WEEKDAYS: [&str; 6] = ["Lundi", "Mardi", "Mercredi", "Jeudi", "Vendredi", "Samedi"];

/// Class labels that always appear in pickers, even before any student or
/// schedule entry references them.
pub const CANONICAL_CLASSES: [&str; 14] = [
    "3A", "3B", "3C", "4A", "4B", "4C", "5A", "5B", "5C", "5D", "6A", "6B", "6C", "6D",
];

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn round_dp(x: f64, decimals: i32) -> f64 {
    let p = 10f64.powi(decimals);
    (x * p).round() / p
}

// ---- attendance ----

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRow {
    pub student_id: String,
    pub last_name: String,
    pub first_name: String,
    pub class: String,
    pub absences: usize,
    pub tardies: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceReport {
    pub range: DateRange,
    pub rows: Vec<AttendanceRow>,
    /// True only when the report is empty for an explicitly chosen period;
    /// the default current-week view stays quiet on first load.
    pub no_data: bool,
}

/// Per-student absence/tardiness counts over a resolved period.
///
/// The match window is padded by one day on each side of the range so both
/// boundary days always count. Students with no matching records are left
/// out entirely; unparseable dates never match.
pub fn attendance_report(
    students: &[Student],
    absences: &[Absence],
    range: DateRange,
    default_period: bool,
) -> AttendanceReport {
    let lo = range.start - Duration::days(1);
    let hi = range.end + Duration::days(1);
    let in_period: Vec<&Absence> = absences
        .iter()
        .filter(|a| {
            parse_date(&a.date)
                .map(|d| d >= lo && d <= hi)
                .unwrap_or(false)
        })
        .collect();

    let mut rows = Vec::new();
    for s in students {
        let absent = in_period
            .iter()
            .filter(|a| a.student_id == s.id && a.kind == AbsenceKind::Absence)
            .count();
        let tardy = in_period
            .iter()
            .filter(|a| a.student_id == s.id && a.kind == AbsenceKind::Tardiness)
            .count();
        if absent + tardy > 0 {
            rows.push(AttendanceRow {
                student_id: s.id.clone(),
                last_name: s.last_name.clone(),
                first_name: s.first_name.clone(),
                class: s.class.clone(),
                absences: absent,
                tardies: tardy,
            });
        }
    }

    let no_data = rows.is_empty() && !default_period;
    AttendanceReport {
        range,
        rows,
        no_data,
    }
}

// ---- finances ----

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceFilters {
    pub class: Option<String>,
    pub status: Option<PaymentStatus>,
    pub student_id: Option<String>,
}

/// A payment passes when every present filter matches. The class filter goes
/// through the student lookup, so a dangling studentId fails it.
pub fn filter_payments<'a>(
    payments: &'a [Payment],
    students: &[Student],
    filters: &FinanceFilters,
) -> Vec<&'a Payment> {
    payments
        .iter()
        .filter(|p| {
            let class_ok = match &filters.class {
                None => true,
                Some(class) => students
                    .iter()
                    .find(|s| s.id == p.student_id)
                    .map(|s| s.class == *class)
                    .unwrap_or(false),
            };
            let status_ok = filters.status.map(|st| p.status == st).unwrap_or(true);
            let student_ok = filters
                .student_id
                .as_deref()
                .map(|id| p.student_id == id)
                .unwrap_or(true);
            class_ok && status_ok && student_ok
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceSummary {
    pub count: usize,
    pub total_due: f64,
    pub total_paid: f64,
    /// May be negative when more was paid than due; not clamped.
    pub total_rest: f64,
    pub count_paid: usize,
    pub count_late: usize,
    pub percent_paid: i64,
    pub avg_paid: i64,
    pub avg_due: i64,
}

/// Totals, counts and half-away-from-zero rounded ratios over a filtered
/// payment set. An empty set yields zeroes, never a division by zero.
pub fn finance_summary(filtered: &[&Payment]) -> FinanceSummary {
    let count = filtered.len();
    let total_due: f64 = filtered.iter().map(|p| p.amount_due).sum();
    let total_paid: f64 = filtered.iter().map(|p| p.amount_paid).sum();
    let count_paid = filtered
        .iter()
        .filter(|p| p.status == PaymentStatus::Paid)
        .count();
    let count_late = filtered
        .iter()
        .filter(|p| p.status == PaymentStatus::Late)
        .count();

    let (percent_paid, avg_paid, avg_due) = if count > 0 {
        let n = count as f64;
        (
            (100.0 * count_paid as f64 / n).round() as i64,
            (total_paid / n).round() as i64,
            (total_due / n).round() as i64,
        )
    } else {
        (0, 0, 0)
    };

    FinanceSummary {
        count,
        total_due,
        total_paid,
        total_rest: total_due - total_paid,
        count_paid,
        count_late,
        percent_paid,
        avg_paid,
        avg_due,
    }
}

// ---- schedule ----

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Slot {
    pub start: String,
    pub end: String,
}

/// 8–12 and 14–16 in one-hour steps: the rows every class grid starts from.
pub fn default_slots() -> Vec<Slot> {
    [
        ("08:00", "09:00"),
        ("09:00", "10:00"),
        ("10:00", "11:00"),
        ("11:00", "12:00"),
        ("14:00", "15:00"),
        ("15:00", "16:00"),
    ]
    .into_iter()
    .map(|(start, end)| Slot {
        start: start.to_string(),
        end: end.to_string(),
    })
    .collect()
}

/// With no class selected the default list is returned as-is (class-picker
/// view). With a class, its entries' (start, end) pairs are unioned with the
/// defaults, de-duplicated by exact pair, and sorted by start time; the
/// zero-padded 24h `HH:MM` format makes the string order the time order.
pub fn merge_slots(entries: &[ScheduleEntry], class: Option<&str>) -> Vec<Slot> {
    let mut slots = default_slots();
    let Some(class) = class else {
        return slots;
    };

    let mut seen: HashSet<Slot> = slots.iter().cloned().collect();
    for e in entries.iter().filter(|e| e.class == class) {
        let slot = Slot {
            start: e.start_time.clone(),
            end: e.end_time.clone(),
        };
        if seen.insert(slot.clone()) {
            slots.push(slot);
        }
    }
    slots.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.end.cmp(&b.end)));
    slots
}

/// slot × weekday cells for one class; a cell holds the first entry matching
/// class + day + start + end exactly, or nothing (rendered addable).
pub fn weekly_grid<'a>(
    entries: &'a [ScheduleEntry],
    class: &str,
    slots: &[Slot],
) -> Vec<Vec<Option<&'a ScheduleEntry>>> {
    slots
        .iter()
        .map(|slot| {
            WEEKDAYS
                .iter()
                .map(|day| {
                    entries.iter().find(|e| {
                        e.class == class
                            && e.day == *day
                            && e.start_time == slot.start
                            && e.end_time == slot.end
                    })
                })
                .collect()
        })
        .collect()
}

// ---- grades ----

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeFilters {
    pub class: Option<String>,
    pub subject: Option<String>,
    pub student_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRow {
    pub student_id: String,
    pub student_name: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appreciation: Option<String>,
    pub date: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectGroup {
    pub subject: String,
    pub rows: Vec<GradeRow>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassGroup {
    pub class: String,
    pub subjects: Vec<SubjectGroup>,
}

/// Canonical class labels unioned with every class observed on students or
/// schedule entries, first occurrence wins.
pub fn class_roster(students: &[Student], schedule: &[ScheduleEntry]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut roster = Vec::new();
    let observed = CANONICAL_CLASSES
        .iter()
        .map(|c| c.to_string())
        .chain(students.iter().map(|s| s.class.clone()))
        .chain(schedule.iter().map(|e| e.class.clone()));
    for class in observed {
        if seen.insert(class.clone()) {
            roster.push(class);
        }
    }
    roster
}

/// Grades grouped by class then subject for progressive disclosure. Classes
/// and subjects without a matching grade are skipped; rows keep the store
/// insertion order. A grade whose student is gone belongs to no class and
/// never shows here.
pub fn grouped_grades(
    grades: &[Grade],
    students: &[Student],
    schedule: &[ScheduleEntry],
    filters: &GradeFilters,
) -> Vec<ClassGroup> {
    let classes = match &filters.class {
        Some(class) => vec![class.clone()],
        None => class_roster(students, schedule),
    };

    let mut groups = Vec::new();
    for class in classes {
        let class_grades: Vec<(&Grade, &Student)> = grades
            .iter()
            .filter_map(|g| {
                students
                    .iter()
                    .find(|s| s.id == g.student_id)
                    .map(|s| (g, s))
            })
            .filter(|(g, s)| {
                s.class == class
                    && filters
                        .subject
                        .as_deref()
                        .map(|sub| g.subject == sub)
                        .unwrap_or(true)
                    && filters
                        .student_id
                        .as_deref()
                        .map(|id| g.student_id == id)
                        .unwrap_or(true)
            })
            .collect();
        if class_grades.is_empty() {
            continue;
        }

        let subjects: Vec<&str> = match filters.subject.as_deref() {
            Some(subject) => vec![subject],
            None => SUBJECTS.to_vec(),
        };
        let mut subject_groups = Vec::new();
        for subject in subjects {
            let rows: Vec<GradeRow> = class_grades
                .iter()
                .filter(|(g, _)| g.subject == subject)
                .map(|(g, s)| GradeRow {
                    student_id: g.student_id.clone(),
                    student_name: s.display_name(),
                    value: g.value,
                    appreciation: g.appreciation.clone(),
                    date: g.date.clone(),
                })
                .collect();
            if rows.is_empty() {
                continue;
            }
            subject_groups.push(SubjectGroup {
                subject: subject.to_string(),
                rows,
            });
        }
        if subject_groups.is_empty() {
            continue;
        }
        groups.push(ClassGroup {
            class,
            subjects: subject_groups,
        });
    }
    groups
}

// ---- dashboard ----

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_students: usize,
    pub total_absences: usize,
    pub total_tardies: usize,
    pub payments_up_to_date: usize,
    pub payments_late: usize,
    /// 100 × absences / students, one decimal.
    pub absent_rate: f64,
    /// Mean of student averages, two decimals.
    pub overall_average: f64,
    pub classes: Vec<String>,
    pub absences_by_class: Vec<usize>,
    pub tardies_by_class: Vec<usize>,
}

pub fn dashboard_stats(students: &[Student], absences: &[Absence]) -> DashboardStats {
    let total_students = students.len();
    let total_absences = absences
        .iter()
        .filter(|a| a.kind == AbsenceKind::Absence)
        .count();
    let total_tardies = absences
        .iter()
        .filter(|a| a.kind == AbsenceKind::Tardiness)
        .count();
    let payments_up_to_date = students.iter().filter(|s| s.payment_up_to_date).count();
    let payments_late = total_students - payments_up_to_date;

    let absent_rate = if total_students > 0 {
        round_dp(100.0 * total_absences as f64 / total_students as f64, 1)
    } else {
        0.0
    };
    let overall_average = if total_students > 0 {
        round_dp(
            students.iter().map(|s| s.average).sum::<f64>() / total_students as f64,
            2,
        )
    } else {
        0.0
    };

    let mut classes = Vec::new();
    let mut seen = HashSet::new();
    for s in students {
        if seen.insert(s.class.clone()) {
            classes.push(s.class.clone());
        }
    }

    let count_by_class = |kind: AbsenceKind| -> Vec<usize> {
        classes
            .iter()
            .map(|class| {
                absences
                    .iter()
                    .filter(|a| {
                        a.kind == kind
                            && students
                                .iter()
                                .find(|s| s.id == a.student_id)
                                .map(|s| &s.class == class)
                                .unwrap_or(false)
                    })
                    .count()
            })
            .collect()
    };
    let absences_by_class = count_by_class(AbsenceKind::Absence);
    let tardies_by_class = count_by_class(AbsenceKind::Tardiness);

    DashboardStats {
        total_students,
        total_absences,
        total_tardies,
        payments_up_to_date,
        payments_late,
        absent_rate,
        overall_average,
        classes,
        absences_by_class,
        tardies_by_class,
    }
}
