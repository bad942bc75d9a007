use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_ecoled");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn ecoled");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "request {} failed: {}",
        id,
        value
    );
    value.get("result").cloned().expect("result payload")
}

fn create_student(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    last_name: &str,
    class: &str,
) -> String {
    let result = request_ok(
        stdin,
        reader,
        id,
        "students.create",
        json!({
            "firstName": "Eleve",
            "lastName": last_name,
            "birthDate": "2011-06-20",
            "gender": "M",
            "class": class,
            "level": "Primaire",
            "average": 11,
            "paymentUpToDate": false,
            "parentName": "Parent",
            "parentEmail": "parent@example.com",
            "parentPhone": "0600000000"
        }),
    );
    result
        .get("studentId")
        .and_then(|v| v.as_str())
        .expect("studentId")
        .to_string()
}

fn create_payment(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    student_id: &str,
    due: f64,
    paid: f64,
    status: &str,
) {
    let _ = request_ok(
        stdin,
        reader,
        id,
        "payments.create",
        json!({
            "studentId": student_id,
            "amountDue": due,
            "amountPaid": paid,
            "status": status,
            "date": "2026-03-02"
        }),
    );
}

#[test]
fn unfiltered_summary_matches_reference_figures() {
    let workspace = temp_dir("ecoled-finance-summary");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let s1 = create_student(&mut stdin, &mut reader, "2", "Farouk", "5A");
    let s2 = create_student(&mut stdin, &mut reader, "3", "Ghali", "6B");

    create_payment(&mut stdin, &mut reader, "4", &s1, 500.0, 500.0, "payé");
    create_payment(&mut stdin, &mut reader, "5", &s2, 300.0, 0.0, "en retard");

    let summary = request_ok(&mut stdin, &mut reader, "6", "payments.summary", json!({}));
    assert_eq!(summary.get("totalDue").and_then(|v| v.as_f64()), Some(800.0));
    assert_eq!(summary.get("totalPaid").and_then(|v| v.as_f64()), Some(500.0));
    assert_eq!(summary.get("totalRest").and_then(|v| v.as_f64()), Some(300.0));
    assert_eq!(summary.get("countPaid").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(summary.get("countLate").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(summary.get("percentPaid").and_then(|v| v.as_i64()), Some(50));
    assert_eq!(summary.get("avgPaid").and_then(|v| v.as_i64()), Some(250));
    assert_eq!(summary.get("avgDue").and_then(|v| v.as_i64()), Some(400));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn filters_compose_and_dangling_students_fail_the_class_filter() {
    let workspace = temp_dir("ecoled-finance-filters");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let s1 = create_student(&mut stdin, &mut reader, "2", "Hiba", "5A");
    let s2 = create_student(&mut stdin, &mut reader, "3", "Imane", "6B");

    create_payment(&mut stdin, &mut reader, "4", &s1, 500.0, 500.0, "payé");
    create_payment(&mut stdin, &mut reader, "5", &s2, 300.0, 100.0, "en retard");
    // The store does not enforce references; this payment dangles.
    create_payment(&mut stdin, &mut reader, "6", "ghost", 100.0, 0.0, "en retard");

    let by_class = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "payments.summary",
        json!({ "class": "5A" }),
    );
    assert_eq!(by_class.get("count").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(by_class.get("percentPaid").and_then(|v| v.as_i64()), Some(100));

    let by_status = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "payments.summary",
        json!({ "status": "en retard" }),
    );
    assert_eq!(by_status.get("count").and_then(|v| v.as_u64()), Some(2));
    assert_eq!(by_status.get("percentPaid").and_then(|v| v.as_i64()), Some(0));

    let by_student = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "payments.summary",
        json!({ "studentId": s2 }),
    );
    assert_eq!(by_student.get("count").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(by_student.get("totalRest").and_then(|v| v.as_f64()), Some(200.0));

    // Empty string filters mean "all".
    let all = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "payments.summary",
        json!({ "class": "", "status": "", "studentId": "" }),
    );
    assert_eq!(all.get("count").and_then(|v| v.as_u64()), Some(3));

    // A class without payments: zeroes, no division by zero.
    let empty = request_ok(
        &mut stdin,
        &mut reader,
        "11",
        "payments.summary",
        json!({ "class": "3C" }),
    );
    assert_eq!(empty.get("count").and_then(|v| v.as_u64()), Some(0));
    assert_eq!(empty.get("percentPaid").and_then(|v| v.as_i64()), Some(0));
    assert_eq!(empty.get("avgPaid").and_then(|v| v.as_i64()), Some(0));
    assert_eq!(empty.get("avgDue").and_then(|v| v.as_i64()), Some(0));

    // The dangling payment renders placeholders in the listing.
    let listing = request_ok(&mut stdin, &mut reader, "12", "payments.list", json!({}));
    let rows = listing
        .get("payments")
        .and_then(|v| v.as_array())
        .expect("payments");
    let ghost_row = rows
        .iter()
        .find(|r| r.get("studentId").and_then(|v| v.as_str()) == Some("ghost"))
        .expect("dangling payment listed");
    assert_eq!(ghost_row.get("studentName").and_then(|v| v.as_str()), Some("-"));
    assert_eq!(ghost_row.get("studentClass").and_then(|v| v.as_str()), Some("-"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn invalid_amounts_and_statuses_are_rejected() {
    let workspace = temp_dir("ecoled-finance-validation");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let s1 = create_student(&mut stdin, &mut reader, "2", "Jad", "5A");

    for (id, params) in [
        (
            "3",
            json!({ "studentId": s1, "amountDue": -5, "amountPaid": 0, "status": "payé", "date": "2026-03-02" }),
        ),
        (
            "4",
            json!({ "studentId": s1, "amountDue": "cent", "amountPaid": 0, "status": "payé", "date": "2026-03-02" }),
        ),
        (
            "5",
            json!({ "studentId": s1, "amountDue": 100, "amountPaid": 0, "status": "inconnu", "date": "2026-03-02" }),
        ),
        (
            "6",
            json!({ "studentId": s1, "amountDue": 100, "amountPaid": 0, "status": "payé", "date": "02/03/2026" }),
        ),
    ] {
        let resp = request(&mut stdin, &mut reader, id, "payments.create", params);
        assert_eq!(resp.get("ok").and_then(|v| v.as_bool()), Some(false));
        assert_eq!(
            resp.pointer("/error/code").and_then(|v| v.as_str()),
            Some("bad_params"),
            "request {} should fail validation: {}",
            id,
            resp
        );
    }

    // Nothing was written.
    let summary = request_ok(&mut stdin, &mut reader, "7", "payments.summary", json!({}));
    assert_eq!(summary.get("count").and_then(|v| v.as_u64()), Some(0));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
