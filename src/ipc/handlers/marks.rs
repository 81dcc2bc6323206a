use crate::calc::{self, MarkSubmission, Semester, SemesterInput, Semesters};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::{MarkKind, MarkStore, SqliteStore};
use serde_json::json;

// Tolerant-input policy: absent or non-numeric score fields count as 0.
// The UI submits whatever the form held; the engine never rejects a
// score value.
fn score_field(sem: &serde_json::Value, field: &str) -> f64 {
    sem.get(field).and_then(|v| v.as_f64()).unwrap_or(0.0)
}

fn parse_semester(sems: &serde_json::Value, key: &str) -> Option<SemesterInput> {
    let sem = sems.get(key)?;
    if !sem.is_object() {
        return None;
    }
    Some(SemesterInput {
        mid1: score_field(sem, "mid1"),
        mid2: score_field(sem, "mid2"),
        exam: score_field(sem, "exam"),
    })
}

fn parse_submission(req: &Request) -> Result<(String, MarkSubmission), serde_json::Value> {
    let roll_no = match req.params.get("rollNo").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => return Err(err(&req.id, "bad_params", "missing params.rollNo", None)),
    };
    let Some(marks) = req.params.get("marks").filter(|v| v.is_object()) else {
        return Err(err(&req.id, "bad_params", "missing params.marks", None));
    };

    let subject = match marks.get("subject").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => {
            return Err(err(
                &req.id,
                "bad_params",
                "missing params.marks.subject",
                None,
            ))
        }
    };
    let kind = match marks.get("type").and_then(|v| v.as_str()) {
        Some(raw) => match MarkKind::parse(raw) {
            Some(k) => k,
            None => {
                return Err(err(
                    &req.id,
                    "bad_params",
                    "marks.type must be 'theory' or 'lab'",
                    Some(json!({ "type": raw })),
                ))
            }
        },
        None => {
            return Err(err(
                &req.id,
                "bad_params",
                "missing params.marks.type",
                None,
            ))
        }
    };

    let empty = json!({});
    let sems_raw = marks.get("sems").unwrap_or(&empty);
    let sems = Semesters {
        sem1: parse_semester(sems_raw, "sem1"),
        sem2: parse_semester(sems_raw, "sem2"),
    };

    Ok((
        roll_no,
        MarkSubmission {
            subject,
            kind,
            sems,
        },
    ))
}

fn handle_marks_save(state: &AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let (roll_no, submission) = match parse_submission(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let store = SqliteStore::new(conn);
    match calc::save_marks(&store, &roll_no, &submission) {
        Ok(full) => ok(
            &req.id,
            serde_json::to_value(full).unwrap_or_else(|_| json!({})),
        ),
        Err(e) => err(&req.id, &e.code, e.message, e.details),
    }
}

// Single-entry read used by the marks entry form to prefill previously
// submitted scores for a (student, subject) pair.
fn handle_marks_get(state: &AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let roll_no = match req.params.get("rollNo").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing params.rollNo", None),
    };
    let subject = match req.params.get("subject").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing params.subject", None),
    };

    match SqliteStore::new(conn).get_mark_entry(&roll_no, &subject) {
        Ok(entry) => ok(&req.id, json!({ "entry": entry })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_class_stats(state: &AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let branch = match req.params.get("branch").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing params.branch", None),
    };
    let year = match req.params.get("year").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing params.year", None),
    };
    let semester = match req.params.get("semester").and_then(|v| v.as_str()) {
        Some(raw) => match Semester::parse(raw) {
            Ok(v) => v,
            Err(e) => return err(&req.id, &e.code, e.message, e.details),
        },
        None => return err(&req.id, "bad_params", "missing params.semester", None),
    };

    let store = SqliteStore::new(conn);
    match calc::compute_class_stats(&store, &branch, &year, semester) {
        Ok(stats) => ok(&req.id, json!({ "stats": stats })),
        Err(e) => err(&req.id, &e.code, e.message, e.details),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "marks.save" => Some(handle_marks_save(state, req)),
        "marks.get" => Some(handle_marks_get(state, req)),
        "class.stats" => Some(handle_class_stats(state, req)),
        _ => None,
    }
}
