mod test_support;

use serde_json::json;
use test_support::{request_ok, select_workspace, spawn_sidecar, temp_dir};

#[test]
fn marks_save_returns_computed_results_and_persists_entry() {
    let workspace = temp_dir("gradecalc-pipeline");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "records.add",
        json!({ "rollNo": "21CS001", "name": "Asha", "branch": "CSE", "year": "2" }),
    );

    let saved = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "marks.save",
        json!({
            "rollNo": "21CS001",
            "marks": {
                "type": "theory",
                "subject": "Math",
                "sems": {
                    "sem1": { "mid1": 30, "mid2": 0, "exam": 70 },
                    "sem2": { "mid1": 20, "mid2": 25, "exam": 40 }
                }
            }
        }),
    );
    assert_eq!(saved["sem1Result"]["internal"].as_f64(), Some(24.0));
    assert_eq!(saved["sem1Result"]["total"].as_f64(), Some(94.0));
    assert_eq!(saved["sem1Result"]["grade"].as_str(), Some("O"));
    assert_eq!(saved["sem2Result"]["internal"].as_f64(), Some(24.0));
    assert_eq!(saved["sem2Result"]["total"].as_f64(), Some(64.0));
    assert_eq!(saved["sem2Result"]["grade"].as_str(), Some("B"));

    let data = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "student.data",
        json!({ "rollNo": "21CS001" }),
    );
    assert_eq!(data["record"]["branch"].as_str(), Some("CSE"));
    let marks = data["marks"].as_array().expect("marks array");
    assert_eq!(marks.len(), 1);
    let entry = &marks[0];
    assert_eq!(entry["subject"].as_str(), Some("Math"));
    assert_eq!(entry["type"].as_str(), Some("theory"));
    assert_eq!(entry["sems"]["sem1"]["mid1"].as_f64(), Some(30.0));
    assert_eq!(entry["sem1Result"]["grade"].as_str(), Some("O"));
    assert_eq!(entry["sem2Result"]["grade"].as_str(), Some("B"));

    let _ = child.kill();
}

#[test]
fn absent_fields_default_to_zero_and_missing_semester_gets_sentinel() {
    let workspace = temp_dir("gradecalc-tolerant");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    // mid2/exam omitted from sem1, sem2 never submitted, mid1 malformed
    // string counts as 0.
    let saved = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "marks.save",
        json!({
            "rollNo": "21CS002",
            "marks": {
                "type": "lab",
                "subject": "Physics Lab",
                "sems": { "sem1": { "mid1": "oops" } }
            }
        }),
    );
    assert_eq!(saved["sem1Result"]["internal"].as_f64(), Some(0.0));
    assert_eq!(saved["sem1Result"]["total"].as_f64(), Some(0.0));
    assert_eq!(saved["sem1Result"]["grade"].as_str(), Some("F"));
    assert_eq!(saved["sem2Result"]["total"].as_f64(), Some(0.0));
    assert_eq!(saved["sem2Result"]["grade"].as_str(), Some("F"));

    let data = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "student.data",
        json!({ "rollNo": "21CS002" }),
    );
    let entry = &data["marks"][0];
    // sem1 was submitted (as zeros); sem2 was not.
    assert!(entry["sems"]["sem1"].is_object());
    assert!(entry["sems"]["sem2"].is_null());

    let _ = child.kill();
}
