use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calc::{Grade, SemesterInput, SemesterResult, Semesters};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkKind {
    Theory,
    Lab,
}

impl MarkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkKind::Theory => "theory",
            MarkKind::Lab => "lab",
        }
    }

    pub fn parse(s: &str) -> Option<MarkKind> {
        match s {
            "theory" => Some(MarkKind::Theory),
            "lab" => Some(MarkKind::Lab),
            _ => None,
        }
    }
}

/// Academic record for one student. `roll_no` is the identity;
/// `(branch, year)` places the student in a class for aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub roll_no: String,
    pub name: String,
    pub branch: String,
    pub year: String,
}

/// Stored marks for one (student, subject) pair: the raw semester
/// inputs as submitted plus the derived results. At most one entry per
/// pair exists; saves replace the whole row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkEntry {
    pub roll_no: String,
    pub subject: String,
    #[serde(rename = "type")]
    pub kind: MarkKind,
    pub sems: Semesters,
    pub sem1_result: SemesterResult,
    pub sem2_result: SemesterResult,
}

/// Storage collaborator for the grading core. The core reads and writes
/// through this seam only, so tests can swap in an in-memory fake.
pub trait MarkStore {
    fn get_mark_entry(&self, roll_no: &str, subject: &str) -> anyhow::Result<Option<MarkEntry>>;
    fn put_mark_entry(&self, entry: &MarkEntry) -> anyhow::Result<()>;
    /// Entries for every student whose record matches (branch, year).
    /// The roll-number join happens here; mark rows without a matching
    /// record are dropped.
    fn list_mark_entries_for_class(&self, branch: &str, year: &str)
        -> anyhow::Result<Vec<MarkEntry>>;
    fn get_student_record(&self, roll_no: &str) -> anyhow::Result<Option<StudentRecord>>;
}

pub struct SqliteStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

const MARK_COLUMNS: &str = "roll_no, subject, kind,
    sem1_mid1, sem1_mid2, sem1_exam,
    sem2_mid1, sem2_mid2, sem2_exam,
    sem1_internal, sem1_total, sem1_grade,
    sem2_internal, sem2_total, sem2_grade";

fn semester_from_row(
    mid1: Option<f64>,
    mid2: Option<f64>,
    exam: Option<f64>,
) -> Option<SemesterInput> {
    // A submitted semester always stores all three values; an
    // unsubmitted one stores NULL across the board.
    mid1.map(|m1| SemesterInput {
        mid1: m1,
        mid2: mid2.unwrap_or(0.0),
        exam: exam.unwrap_or(0.0),
    })
}

fn result_from_row(internal: f64, total: f64, grade: &str) -> anyhow::Result<SemesterResult> {
    let grade = Grade::parse(grade)
        .ok_or_else(|| anyhow::anyhow!("unrecognized grade in marks row: {}", grade))?;
    Ok(SemesterResult {
        internal,
        total,
        grade,
    })
}

fn mark_entry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawMarkRow> {
    Ok(RawMarkRow {
        roll_no: row.get(0)?,
        subject: row.get(1)?,
        kind: row.get(2)?,
        sem1_mid1: row.get(3)?,
        sem1_mid2: row.get(4)?,
        sem1_exam: row.get(5)?,
        sem2_mid1: row.get(6)?,
        sem2_mid2: row.get(7)?,
        sem2_exam: row.get(8)?,
        sem1_internal: row.get(9)?,
        sem1_total: row.get(10)?,
        sem1_grade: row.get(11)?,
        sem2_internal: row.get(12)?,
        sem2_total: row.get(13)?,
        sem2_grade: row.get(14)?,
    })
}

struct RawMarkRow {
    roll_no: String,
    subject: String,
    kind: String,
    sem1_mid1: Option<f64>,
    sem1_mid2: Option<f64>,
    sem1_exam: Option<f64>,
    sem2_mid1: Option<f64>,
    sem2_mid2: Option<f64>,
    sem2_exam: Option<f64>,
    sem1_internal: f64,
    sem1_total: f64,
    sem1_grade: String,
    sem2_internal: f64,
    sem2_total: f64,
    sem2_grade: String,
}

impl RawMarkRow {
    fn into_entry(self) -> anyhow::Result<MarkEntry> {
        let kind = MarkKind::parse(&self.kind)
            .ok_or_else(|| anyhow::anyhow!("unrecognized mark kind in row: {}", self.kind))?;
        Ok(MarkEntry {
            roll_no: self.roll_no,
            subject: self.subject,
            kind,
            sems: Semesters {
                sem1: semester_from_row(self.sem1_mid1, self.sem1_mid2, self.sem1_exam),
                sem2: semester_from_row(self.sem2_mid1, self.sem2_mid2, self.sem2_exam),
            },
            sem1_result: result_from_row(self.sem1_internal, self.sem1_total, &self.sem1_grade)?,
            sem2_result: result_from_row(self.sem2_internal, self.sem2_total, &self.sem2_grade)?,
        })
    }
}

impl MarkStore for SqliteStore<'_> {
    fn get_mark_entry(&self, roll_no: &str, subject: &str) -> anyhow::Result<Option<MarkEntry>> {
        let sql = format!(
            "SELECT {} FROM marks WHERE roll_no = ? AND subject = ?",
            MARK_COLUMNS
        );
        let row = self
            .conn
            .query_row(&sql, (roll_no, subject), mark_entry_from_row)
            .optional()?;
        row.map(RawMarkRow::into_entry).transpose()
    }

    fn put_mark_entry(&self, entry: &MarkEntry) -> anyhow::Result<()> {
        let mark_id = Uuid::new_v4().to_string();
        let s1 = entry.sems.sem1;
        let s2 = entry.sems.sem2;
        self.conn.execute(
            "INSERT INTO marks(id, roll_no, subject, kind,
                 sem1_mid1, sem1_mid2, sem1_exam,
                 sem2_mid1, sem2_mid2, sem2_exam,
                 sem1_internal, sem1_total, sem1_grade,
                 sem2_internal, sem2_total, sem2_grade,
                 updated_at)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                 strftime('%Y-%m-%dT%H:%M:%SZ','now'))
             ON CONFLICT(roll_no, subject) DO UPDATE SET
                 kind = excluded.kind,
                 sem1_mid1 = excluded.sem1_mid1,
                 sem1_mid2 = excluded.sem1_mid2,
                 sem1_exam = excluded.sem1_exam,
                 sem2_mid1 = excluded.sem2_mid1,
                 sem2_mid2 = excluded.sem2_mid2,
                 sem2_exam = excluded.sem2_exam,
                 sem1_internal = excluded.sem1_internal,
                 sem1_total = excluded.sem1_total,
                 sem1_grade = excluded.sem1_grade,
                 sem2_internal = excluded.sem2_internal,
                 sem2_total = excluded.sem2_total,
                 sem2_grade = excluded.sem2_grade,
                 updated_at = excluded.updated_at",
            rusqlite::params![
                mark_id,
                entry.roll_no,
                entry.subject,
                entry.kind.as_str(),
                s1.map(|s| s.mid1),
                s1.map(|s| s.mid2),
                s1.map(|s| s.exam),
                s2.map(|s| s.mid1),
                s2.map(|s| s.mid2),
                s2.map(|s| s.exam),
                entry.sem1_result.internal,
                entry.sem1_result.total,
                entry.sem1_result.grade.as_str(),
                entry.sem2_result.internal,
                entry.sem2_result.total,
                entry.sem2_result.grade.as_str(),
            ],
        )?;
        Ok(())
    }

    fn list_mark_entries_for_class(
        &self,
        branch: &str,
        year: &str,
    ) -> anyhow::Result<Vec<MarkEntry>> {
        let sql = "SELECT m.roll_no, m.subject, m.kind,
                 m.sem1_mid1, m.sem1_mid2, m.sem1_exam,
                 m.sem2_mid1, m.sem2_mid2, m.sem2_exam,
                 m.sem1_internal, m.sem1_total, m.sem1_grade,
                 m.sem2_internal, m.sem2_total, m.sem2_grade
             FROM marks m
             JOIN records r ON r.roll_no = m.roll_no
             WHERE r.branch = ? AND r.year = ?
             ORDER BY m.roll_no, m.subject";
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map((branch, year), mark_entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RawMarkRow::into_entry).collect()
    }

    fn get_student_record(&self, roll_no: &str) -> anyhow::Result<Option<StudentRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT roll_no, name, branch, year FROM records WHERE roll_no = ?",
                [roll_no],
                |r| {
                    Ok(StudentRecord {
                        roll_no: r.get(0)?,
                        name: r.get(1)?,
                        branch: r.get(2)?,
                        year: r.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }
}

/// Marks for one student across all subjects, for the student-facing
/// view. Not part of the core's storage contract.
pub fn list_marks_for_student(conn: &Connection, roll_no: &str) -> anyhow::Result<Vec<MarkEntry>> {
    let sql = format!(
        "SELECT {} FROM marks WHERE roll_no = ? ORDER BY subject",
        MARK_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([roll_no], mark_entry_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(RawMarkRow::into_entry).collect()
}
