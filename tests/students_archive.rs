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
) -> String {
    let result = request_ok(
        stdin,
        reader,
        id,
        "students.create",
        json!({
            "firstName": "Eleve",
            "lastName": last_name,
            "birthDate": "2012-05-05",
            "gender": "M",
            "class": "5A",
            "level": "Primaire",
            "average": 12,
            "paymentUpToDate": true,
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

fn list_names(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    params: serde_json::Value,
) -> Vec<String> {
    let result = request_ok(stdin, reader, id, "students.list", params);
    result
        .get("students")
        .and_then(|v| v.as_array())
        .expect("students")
        .iter()
        .map(|s| {
            s.get("lastName")
                .and_then(|v| v.as_str())
                .expect("lastName")
                .to_string()
        })
        .collect()
}

#[test]
fn archiving_moves_a_student_to_the_archived_listing() {
    let workspace = temp_dir("ecoled-students-archive");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let rita = create_student(&mut stdin, &mut reader, "2", "Rita");
    let sami = create_student(&mut stdin, &mut reader, "3", "Sami");

    assert_eq!(
        list_names(&mut stdin, &mut reader, "4", json!({})),
        vec!["Rita", "Sami"]
    );

    let archived = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "students.archive",
        json!({ "studentId": rita }),
    );
    assert_eq!(archived.get("archived").and_then(|v| v.as_bool()), Some(true));

    // Gone from the default listing, still retrievable as archived.
    assert_eq!(list_names(&mut stdin, &mut reader, "6", json!({})), vec!["Sami"]);
    assert_eq!(
        list_names(&mut stdin, &mut reader, "7", json!({ "status": "archived" })),
        vec!["Rita"]
    );

    // Deleting removes the record for good.
    let deleted = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "students.delete",
        json!({ "studentId": sami }),
    );
    assert_eq!(deleted.get("deleted").and_then(|v| v.as_bool()), Some(true));
    assert!(list_names(&mut stdin, &mut reader, "9", json!({})).is_empty());

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn updates_merge_patches_and_absent_ids_are_noops() {
    let workspace = temp_dir("ecoled-students-update");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let tarik = create_student(&mut stdin, &mut reader, "2", "Tarik");

    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.update",
        json!({ "studentId": tarik, "patch": { "class": "6C", "average": 16.5 } }),
    );
    assert_eq!(updated.get("updated").and_then(|v| v.as_bool()), Some(true));

    let listing = request_ok(&mut stdin, &mut reader, "4", "students.list", json!({}));
    let students = listing.get("students").and_then(|v| v.as_array()).expect("students");
    assert_eq!(students[0].get("class").and_then(|v| v.as_str()), Some("6C"));
    assert_eq!(students[0].get("average").and_then(|v| v.as_f64()), Some(16.5));
    // Untouched fields survive the patch.
    assert_eq!(students[0].get("lastName").and_then(|v| v.as_str()), Some("Tarik"));

    // Unknown ids are a reported no-op, not an error.
    let missing_update = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "students.update",
        json!({ "studentId": "missing", "patch": { "class": "3A" } }),
    );
    assert_eq!(
        missing_update.get("updated").and_then(|v| v.as_bool()),
        Some(false)
    );
    let missing_archive = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "students.archive",
        json!({ "studentId": "missing" }),
    );
    assert_eq!(
        missing_archive.get("archived").and_then(|v| v.as_bool()),
        Some(false)
    );
    let missing_delete = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "students.delete",
        json!({ "studentId": "missing" }),
    );
    assert_eq!(
        missing_delete.get("deleted").and_then(|v| v.as_bool()),
        Some(false)
    );

    // Patches cannot move identity or smuggle bad values.
    let bad_patch = request(
        &mut stdin,
        &mut reader,
        "8",
        "students.update",
        json!({ "studentId": tarik, "patch": { "average": "seize" } }),
    );
    assert_eq!(
        bad_patch.pointer("/error/code").and_then(|v| v.as_str()),
        Some("bad_params")
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn creation_validates_required_fields() {
    let workspace = temp_dir("ecoled-students-validation");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let base = json!({
        "firstName": "Walid",
        "lastName": "Ziani",
        "birthDate": "2012-05-05",
        "gender": "M",
        "class": "5A",
        "level": "Primaire",
        "average": 12,
        "parentName": "Parent",
        "parentEmail": "parent@example.com",
        "parentPhone": "0600000000"
    });

    let mut missing_name = base.clone();
    missing_name["lastName"] = json!("  ");
    let mut bad_gender = base.clone();
    bad_gender["gender"] = json!("X");
    let mut bad_date = base.clone();
    bad_date["birthDate"] = json!("05/05/2012");
    let mut bad_average = base.clone();
    bad_average["average"] = json!("douze virgule cinq");

    for (id, params) in [
        ("2", missing_name),
        ("3", bad_gender),
        ("4", bad_date),
        ("5", bad_average),
    ] {
        let resp = request(&mut stdin, &mut reader, id, "students.create", params);
        assert_eq!(
            resp.pointer("/error/code").and_then(|v| v.as_str()),
            Some("bad_params"),
            "student {} should be rejected: {}",
            id,
            resp
        );
    }

    let listing = request_ok(&mut stdin, &mut reader, "6", "students.list", json!({}));
    assert_eq!(
        listing.get("students").and_then(|v| v.as_array()).map(|s| s.len()),
        Some(0)
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
