use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use rusqlite::Connection;
use serde_json::json;
use uuid::Uuid;

// Subject and lab name lists share one shape; only the table differs.
fn handle_list(conn: &Connection, req: &Request, table: &str) -> serde_json::Value {
    let sql = format!("SELECT name FROM {} ORDER BY sort_order", table);
    let mut stmt = match conn.prepare(&sql) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let names: Result<Vec<String>, _> = stmt
        .query_map([], |r| r.get::<_, String>(0))
        .and_then(|it| it.collect());
    match names {
        Ok(names) => ok(&req.id, json!({ "names": names })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_add(conn: &Connection, req: &Request, table: &str) -> serde_json::Value {
    let name = match req.params.get("name").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing params.name", None),
    };

    let id = Uuid::new_v4().to_string();
    let sql = format!(
        "INSERT INTO {}(id, name, sort_order)
         VALUES(?, ?, (SELECT COALESCE(MAX(sort_order) + 1, 0) FROM {}))
         ON CONFLICT(name) DO NOTHING",
        table, table
    );
    match conn.execute(&sql, (&id, &name)) {
        Ok(n) => ok(&req.id, json!({ "added": n > 0 })),
        Err(e) => err(&req.id, "db_insert_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let table = match req.method.as_str() {
        "subjects.list" | "subjects.add" => "subjects",
        "labs.list" | "labs.add" => "labs",
        _ => return None,
    };

    let Some(conn) = state.db.as_ref() else {
        return Some(err(&req.id, "no_workspace", "select a workspace first", None));
    };

    Some(if req.method.ends_with(".list") {
        handle_list(conn, req, table)
    } else {
        handle_add(conn, req, table)
    })
}
