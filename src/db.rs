use rusqlite::Connection;
use std::path::Path;

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("gradecalc.sqlite3");
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS teachers(
            email TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            password_digest TEXT NOT NULL,
            created_at TEXT
        )",
        [],
    )?;

    // Auth profiles; distinct from academic records, which a teacher
    // creates separately.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS student_accounts(
            roll_no TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            password_digest TEXT NOT NULL,
            created_at TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS records(
            roll_no TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            branch TEXT NOT NULL,
            year TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_records_branch_year ON records(branch, year)",
        [],
    )?;

    // One row per (student, subject). A NULL mid/exam triple means that
    // semester was never submitted; result columns always hold the
    // computed values, sentinel included.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS marks(
            id TEXT PRIMARY KEY,
            roll_no TEXT NOT NULL,
            subject TEXT NOT NULL,
            kind TEXT NOT NULL,
            sem1_mid1 REAL,
            sem1_mid2 REAL,
            sem1_exam REAL,
            sem2_mid1 REAL,
            sem2_mid2 REAL,
            sem2_exam REAL,
            sem1_internal REAL NOT NULL,
            sem1_total REAL NOT NULL,
            sem1_grade TEXT NOT NULL,
            sem2_internal REAL NOT NULL,
            sem2_total REAL NOT NULL,
            sem2_grade TEXT NOT NULL,
            updated_at TEXT,
            UNIQUE(roll_no, subject)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_marks_roll ON marks(roll_no)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS subjects(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            sort_order INTEGER NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS labs(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            sort_order INTEGER NOT NULL
        )",
        [],
    )?;

    Ok(conn)
}
