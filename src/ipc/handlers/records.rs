use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::{self, MarkStore, SqliteStore};
use rusqlite::Connection;
use serde_json::json;

struct RecordParams {
    roll_no: String,
    name: String,
    branch: String,
    year: String,
}

fn parse_record_params(req: &Request) -> Result<RecordParams, serde_json::Value> {
    let field = |name: &str| -> Result<String, serde_json::Value> {
        match req.params.get(name).and_then(|v| v.as_str()) {
            Some(v) if !v.trim().is_empty() => Ok(v.to_string()),
            _ => Err(err(
                &req.id,
                "bad_params",
                format!("missing params.{}", name),
                None,
            )),
        }
    };
    Ok(RecordParams {
        roll_no: field("rollNo")?,
        name: field("name")?,
        branch: field("branch")?,
        year: field("year")?,
    })
}

fn record_exists(conn: &Connection, roll_no: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) FROM records WHERE roll_no = ?",
        [roll_no],
        |r| r.get::<_, i64>(0),
    )
    .map(|n| n > 0)
}

// First-time insert only. When the roll number is already on file the
// caller is told so and nothing is written; overwriting is a separate,
// deliberate call.
fn handle_records_add(conn: &Connection, req: &Request) -> serde_json::Value {
    let p = match parse_record_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match record_exists(conn, &p.roll_no) {
        Ok(true) => return ok(&req.id, json!({ "exists": true })),
        Ok(false) => {}
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    }

    if let Err(e) = conn.execute(
        "INSERT INTO records(roll_no, name, branch, year, updated_at)
         VALUES(?, ?, ?, ?, strftime('%Y-%m-%dT%H:%M:%SZ','now'))",
        (&p.roll_no, &p.name, &p.branch, &p.year),
    ) {
        return err(&req.id, "db_insert_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "exists": false }))
}

// Replaces the record and wipes the student's marks so the new record
// starts clean, as the original backend does.
fn handle_records_overwrite(conn: &Connection, req: &Request) -> serde_json::Value {
    let p = match parse_record_params(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let updated = match conn.execute(
        "UPDATE records
         SET name = ?, branch = ?, year = ?,
             updated_at = strftime('%Y-%m-%dT%H:%M:%SZ','now')
         WHERE roll_no = ?",
        (&p.name, &p.branch, &p.year, &p.roll_no),
    ) {
        Ok(n) => n,
        Err(e) => return err(&req.id, "db_insert_failed", e.to_string(), None),
    };
    if updated == 0 {
        return err(
            &req.id,
            "not_found",
            "no record for roll number",
            Some(json!({ "rollNo": p.roll_no })),
        );
    }

    if let Err(e) = conn.execute("DELETE FROM marks WHERE roll_no = ?", [&p.roll_no]) {
        return err(&req.id, "db_insert_failed", e.to_string(), None);
    }
    ok(&req.id, json!({}))
}

fn handle_student_data(conn: &Connection, req: &Request) -> serde_json::Value {
    let roll_no = match req.params.get("rollNo").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing params.rollNo", None),
    };

    let record = match SqliteStore::new(conn).get_student_record(&roll_no) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let marks = match store::list_marks_for_student(conn, &roll_no) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    ok(
        &req.id,
        json!({
            "record": record,
            "marks": marks,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let handled = matches!(
        req.method.as_str(),
        "records.add" | "records.overwrite" | "student.data"
    );
    if !handled {
        return None;
    }

    let Some(conn) = state.db.as_ref() else {
        return Some(err(&req.id, "no_workspace", "select a workspace first", None));
    };

    Some(match req.method.as_str() {
        "records.add" => handle_records_add(conn, req),
        "records.overwrite" => handle_records_overwrite(conn, req),
        _ => handle_student_data(conn, req),
    })
}
