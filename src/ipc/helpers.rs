//! Shared param extraction and error plumbing for the handler modules.

use crate::ipc::error::err;
use chrono::NaiveDate;
use serde_json::json;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn bad_params(message: impl Into<String>) -> Self {
        HandlerErr {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

pub fn db_insert_failed(table: &'static str) -> impl FnOnce(anyhow::Error) -> HandlerErr {
    move |e| HandlerErr {
        code: "db_insert_failed",
        message: e.to_string(),
        details: Some(json!({ "table": table })),
    }
}

pub fn db_update_failed(table: &'static str) -> impl FnOnce(anyhow::Error) -> HandlerErr {
    move |e| HandlerErr {
        code: "db_update_failed",
        message: e.to_string(),
        details: Some(json!({ "table": table })),
    }
}

pub fn db_delete_failed(table: &'static str) -> impl FnOnce(anyhow::Error) -> HandlerErr {
    move |e| HandlerErr {
        code: "db_delete_failed",
        message: e.to_string(),
        details: Some(json!({ "table": table })),
    }
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

/// Required string that may not be blank once trimmed.
pub fn get_nonempty_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    let value = get_required_str(params, key)?;
    if value.trim().is_empty() {
        return Err(HandlerErr::bad_params(format!("{} must not be empty", key)));
    }
    Ok(value)
}

/// Accepts a JSON number or a numeric string (form inputs arrive as either).
pub fn get_required_f64(params: &serde_json::Value, key: &str) -> Result<f64, HandlerErr> {
    let value = params
        .get(key)
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))?;
    if let Some(n) = value.as_f64() {
        return Ok(n);
    }
    if let Some(s) = value.as_str() {
        if let Ok(n) = s.trim().parse::<f64>() {
            return Ok(n);
        }
    }
    Err(HandlerErr::bad_params(format!("{} must be numeric", key)))
}

pub fn get_opt_str(params: &serde_json::Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Filter params treat an empty string the same as an absent key ("all").
pub fn get_filter_str(params: &serde_json::Value, key: &str) -> Option<String> {
    get_opt_str(params, key).filter(|s| !s.is_empty())
}

pub fn get_opt_bool(params: &serde_json::Value, key: &str) -> bool {
    params.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
}

pub fn is_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Zero-padded 24h `HH:MM`; the schedule relies on the string order matching
/// the time order.
pub fn is_hhmm(s: &str) -> bool {
    let b = s.as_bytes();
    if b.len() != 5 || b[2] != b':' {
        return false;
    }
    if ![b[0], b[1], b[3], b[4]].iter().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let hours = (b[0] - b'0') * 10 + (b[1] - b'0');
    let minutes = (b[3] - b'0') * 10 + (b[4] - b'0');
    hours <= 23 && minutes <= 59
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_params_accept_numbers_and_numeric_strings() {
        let params = json!({ "a": 12.5, "b": "13", "c": "treize" });
        assert_eq!(get_required_f64(&params, "a").ok(), Some(12.5));
        assert_eq!(get_required_f64(&params, "b").ok(), Some(13.0));
        assert!(get_required_f64(&params, "c").is_err());
        assert!(get_required_f64(&params, "missing").is_err());
    }

    #[test]
    fn hhmm_requires_zero_padding() {
        assert!(is_hhmm("08:00"));
        assert!(is_hhmm("23:59"));
        assert!(!is_hhmm("8:00"));
        assert!(!is_hhmm("24:00"));
        assert!(!is_hhmm("08:60"));
        assert!(!is_hhmm("08h00"));
    }

    #[test]
    fn empty_filter_means_no_filter() {
        let params = json!({ "class": "", "status": "payé" });
        assert_eq!(get_filter_str(&params, "class"), None);
        assert_eq!(get_filter_str(&params, "status").as_deref(), Some("payé"));
        assert_eq!(get_filter_str(&params, "studentId"), None);
    }
}
