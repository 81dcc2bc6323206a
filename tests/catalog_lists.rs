mod test_support;

use serde_json::json;
use test_support::{request_ok, select_workspace, spawn_sidecar, temp_dir};

#[test]
fn subjects_and_labs_are_separate_insertion_ordered_lists() {
    let workspace = temp_dir("gradecalc-catalog");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    for (id, name) in [("1", "Math"), ("2", "Physics"), ("3", "Chemistry")] {
        let added = request_ok(
            &mut stdin,
            &mut reader,
            id,
            "subjects.add",
            json!({ "name": name }),
        );
        assert_eq!(added["added"].as_bool(), Some(true));
    }
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "labs.add",
        json!({ "name": "Physics Lab" }),
    );

    let subjects = request_ok(&mut stdin, &mut reader, "5", "subjects.list", json!({}));
    assert_eq!(
        subjects["names"],
        json!(["Math", "Physics", "Chemistry"]),
        "insertion order preserved"
    );

    let labs = request_ok(&mut stdin, &mut reader, "6", "labs.list", json!({}));
    assert_eq!(labs["names"], json!(["Physics Lab"]));

    let _ = child.kill();
}

#[test]
fn duplicate_subject_add_is_a_no_op() {
    let workspace = temp_dir("gradecalc-catalog-dup");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let first = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "subjects.add",
        json!({ "name": "Math" }),
    );
    assert_eq!(first["added"].as_bool(), Some(true));

    let again = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "subjects.add",
        json!({ "name": "Math" }),
    );
    assert_eq!(again["added"].as_bool(), Some(false));

    let subjects = request_ok(&mut stdin, &mut reader, "3", "subjects.list", json!({}));
    assert_eq!(subjects["names"], json!(["Math"]));

    let _ = child.kill();
}
