use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use rusqlite::{Connection, OptionalExtension};
use serde_json::json;
use sha2::{Digest, Sha256};

fn password_digest(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn required_str<'a>(req: &'a Request, field: &str) -> Result<&'a str, serde_json::Value> {
    match req.params.get(field).and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(err(
            &req.id,
            "bad_params",
            format!("missing params.{}", field),
            None,
        )),
    }
}

fn handle_teacher_signup(conn: &Connection, req: &Request) -> serde_json::Value {
    let email = match required_str(req, "email") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let password = match required_str(req, "password") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let inserted = match conn.execute(
        "INSERT INTO teachers(email, name, password_digest, created_at)
         VALUES(?, ?, ?, strftime('%Y-%m-%dT%H:%M:%SZ','now'))
         ON CONFLICT(email) DO NOTHING",
        (email, name, password_digest(password)),
    ) {
        Ok(n) => n,
        Err(e) => return err(&req.id, "db_insert_failed", e.to_string(), None),
    };
    if inserted == 0 {
        return err(
            &req.id,
            "conflict",
            "email already registered",
            Some(json!({ "email": email })),
        );
    }
    ok(&req.id, json!({}))
}

fn handle_teacher_login(conn: &Connection, req: &Request) -> serde_json::Value {
    let email = match required_str(req, "email") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let password = match required_str(req, "password") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let row: Option<(String, String)> = match conn
        .query_row(
            "SELECT name, password_digest FROM teachers WHERE email = ?",
            [email],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    match row {
        Some((name, digest)) if digest == password_digest(password) => ok(
            &req.id,
            json!({ "user": { "email": email, "name": name } }),
        ),
        _ => err(&req.id, "invalid_credentials", "invalid credentials", None),
    }
}

fn handle_student_signup(conn: &Connection, req: &Request) -> serde_json::Value {
    let roll_no = match required_str(req, "rollNo") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let password = match required_str(req, "password") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let inserted = match conn.execute(
        "INSERT INTO student_accounts(roll_no, name, password_digest, created_at)
         VALUES(?, ?, ?, strftime('%Y-%m-%dT%H:%M:%SZ','now'))
         ON CONFLICT(roll_no) DO NOTHING",
        (roll_no, name, password_digest(password)),
    ) {
        Ok(n) => n,
        Err(e) => return err(&req.id, "db_insert_failed", e.to_string(), None),
    };
    if inserted == 0 {
        return err(
            &req.id,
            "conflict",
            "roll number already registered",
            Some(json!({ "rollNo": roll_no })),
        );
    }
    ok(&req.id, json!({}))
}

fn handle_student_login(conn: &Connection, req: &Request) -> serde_json::Value {
    let roll_no = match required_str(req, "rollNo") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let password = match required_str(req, "password") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let row: Option<(String, String)> = match conn
        .query_row(
            "SELECT name, password_digest FROM student_accounts WHERE roll_no = ?",
            [roll_no],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    match row {
        Some((name, digest)) if digest == password_digest(password) => ok(
            &req.id,
            json!({ "user": { "rollNo": roll_no, "name": name } }),
        ),
        _ => err(&req.id, "invalid_credentials", "invalid credentials", None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let handled = matches!(
        req.method.as_str(),
        "teacher.signup" | "teacher.login" | "student.signup" | "student.login"
    );
    if !handled {
        return None;
    }

    let Some(conn) = state.db.as_ref() else {
        return Some(err(&req.id, "no_workspace", "select a workspace first", None));
    };

    Some(match req.method.as_str() {
        "teacher.signup" => handle_teacher_signup(conn, req),
        "teacher.login" => handle_teacher_login(conn, req),
        "student.signup" => handle_student_signup(conn, req),
        _ => handle_student_login(conn, req),
    })
}
