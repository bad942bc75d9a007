use serde::{Deserialize, Serialize};

/// Lifecycle tag for a student record. Archiving keeps the record in the
/// store; it only moves the student out of the active listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    Active,
    Archived,
}

impl Default for StudentStatus {
    fn default() -> Self {
        StudentStatus::Active
    }
}

impl StudentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StudentStatus::Active => "active",
            StudentStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(StudentStatus::Active),
            "archived" => Some(StudentStatus::Archived),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    M,
    F,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::M => "M",
            Gender::F => "F",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "M" => Some(Gender::M),
            "F" => Some(Gender::F),
            _ => None,
        }
    }
}

/// Wire values match the legacy store ("retard" = tardiness).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbsenceKind {
    #[serde(rename = "absence")]
    Absence,
    #[serde(rename = "retard")]
    Tardiness,
}

impl AbsenceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AbsenceKind::Absence => "absence",
            AbsenceKind::Tardiness => "retard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "absence" => Some(AbsenceKind::Absence),
            "retard" => Some(AbsenceKind::Tardiness),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "payé")]
    Paid,
    #[serde(rename = "en retard")]
    Late,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Paid => "payé",
            PaymentStatus::Late => "en retard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "payé" => Some(PaymentStatus::Paid),
            "en retard" => Some(PaymentStatus::Late),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
    pub gender: Gender,
    pub class: String,
    pub level: String,
    pub average: f64,
    pub payment_up_to_date: bool,
    #[serde(default)]
    pub status: StudentStatus,
    pub parent_name: String,
    pub parent_email: String,
    pub parent_phone: String,
}

impl Student {
    /// "Lastname Firstname" as the admin screens render it.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Absence {
    pub id: String,
    pub student_id: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    #[serde(rename = "type")]
    pub kind: AbsenceKind,
    pub justified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Set at creation to mark the simulated parent notification.
    #[serde(default)]
    pub notified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub id: String,
    pub student_id: String,
    pub subject: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appreciation: Option<String>,
    pub date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub student_id: String,
    pub amount_due: f64,
    pub amount_paid: f64,
    pub status: PaymentStatus,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub id: String,
    pub class: String,
    /// One of Lundi…Samedi.
    pub day: String,
    /// Zero-padded `HH:MM`, 24h.
    pub start_time: String,
    pub end_time: String,
    pub subject: String,
    pub teacher: String,
    pub room: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The single administrator credential record, stored cleartext in settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAccount {
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub username: String,
    pub password: String,
}
