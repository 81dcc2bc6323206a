use serde::{Deserialize, Serialize};

use crate::store::{MarkEntry, MarkKind, MarkStore};

/// 2-decimal round-off used for class averages:
/// `Int(100*x + 0.5) / 100`
pub fn round_off_2_decimals(x: f64) -> f64 {
    ((100.0 * x) + 0.5).floor() / 100.0
}

/// Raw scores for one semester of one subject. Absent fields default to
/// zero at the wire boundary; values are stored and used as supplied,
/// never clamped (mids are nominally out of 30, the exam out of 70).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SemesterInput {
    pub mid1: f64,
    pub mid2: f64,
    pub exam: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Semesters {
    pub sem1: Option<SemesterInput>,
    pub sem2: Option<SemesterInput>,
}

/// Fixed letter scale. Thresholds are inclusive lower bounds on the
/// semester total; a boundary total takes the higher grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    O,
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_total(total: f64) -> Grade {
        if total >= 90.0 {
            Grade::O
        } else if total >= 80.0 {
            Grade::APlus
        } else if total >= 70.0 {
            Grade::A
        } else if total >= 60.0 {
            Grade::B
        } else if total >= 50.0 {
            Grade::C
        } else if total >= 40.0 {
            Grade::D
        } else {
            Grade::F
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::O => "O",
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }

    pub fn parse(s: &str) -> Option<Grade> {
        match s {
            "O" => Some(Grade::O),
            "A+" => Some(Grade::APlus),
            "A" => Some(Grade::A),
            "B" => Some(Grade::B),
            "C" => Some(Grade::C),
            "D" => Some(Grade::D),
            "F" => Some(Grade::F),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterResult {
    pub internal: f64,
    pub total: f64,
    pub grade: Grade,
}

impl SemesterResult {
    /// Result attached to a semester that was never submitted. Not an
    /// error: downstream aggregation folds these zeros in as-is.
    pub fn no_data() -> SemesterResult {
        SemesterResult {
            internal: 0.0,
            total: 0.0,
            grade: Grade::F,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullResult {
    pub sem1_result: SemesterResult,
    pub sem2_result: SemesterResult,
}

/// Internal mark = 80% of the better mid-term plus 20% of the other;
/// total = internal + exam. Pure; storage never enters here.
pub fn compute_semester_result(input: Option<&SemesterInput>) -> SemesterResult {
    let Some(s) = input else {
        return SemesterResult::no_data();
    };
    let best_mid = s.mid1.max(s.mid2);
    let other_mid = s.mid1.min(s.mid2);
    let internal = (best_mid * 0.8) + (other_mid * 0.2);
    let total = internal + s.exam;
    SemesterResult {
        internal,
        total,
        grade: Grade::from_total(total),
    }
}

/// The two semesters are scored independently; there is no carry-over
/// or cross-semester weighting. Both results are always populated.
pub fn compute_full_result(sems: &Semesters) -> FullResult {
    FullResult {
        sem1_result: compute_semester_result(sems.sem1.as_ref()),
        sem2_result: compute_semester_result(sems.sem2.as_ref()),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CalcError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl CalcError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Semester {
    One,
    Two,
}

impl Semester {
    pub fn parse(raw: &str) -> Result<Semester, CalcError> {
        match raw.trim() {
            "1" => Ok(Semester::One),
            "2" => Ok(Semester::Two),
            _ => Err(CalcError::new("bad_params", "semester must be '1' or '2'")),
        }
    }
}

/// One teacher submission of marks for a (student, subject) pair.
#[derive(Debug, Clone)]
pub struct MarkSubmission {
    pub subject: String,
    pub kind: MarkKind,
    pub sems: Semesters,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassStat {
    pub average: f64,
    pub count: usize,
}

/// Computes results for the submission and upserts the entry wholesale.
/// A resubmission replaces everything stored under (rollNo, subject);
/// semesters left out of the new submission are not carried forward.
pub fn save_marks(
    store: &dyn MarkStore,
    roll_no: &str,
    submission: &MarkSubmission,
) -> Result<FullResult, CalcError> {
    let full = compute_full_result(&submission.sems);
    let entry = MarkEntry {
        roll_no: roll_no.to_string(),
        subject: submission.subject.clone(),
        kind: submission.kind,
        sems: submission.sems,
        sem1_result: full.sem1_result,
        sem2_result: full.sem2_result,
    };
    store
        .put_mark_entry(&entry)
        .map_err(|e| CalcError::new("db_insert_failed", e.to_string()))?;
    Ok(full)
}

/// Mean of the requested semester's totals across every mark entry in
/// the class. Entries whose student never submitted that semester carry
/// the zero sentinel and count toward the mean. Returns None when the
/// class has no entries at all; a zero-count class is not an average of
/// zero.
pub fn compute_class_stats(
    store: &dyn MarkStore,
    branch: &str,
    year: &str,
    semester: Semester,
) -> Result<Option<ClassStat>, CalcError> {
    let entries = store
        .list_mark_entries_for_class(branch, year)
        .map_err(|e| CalcError::new("db_query_failed", e.to_string()))?;
    if entries.is_empty() {
        return Ok(None);
    }

    let sum: f64 = entries
        .iter()
        .map(|e| match semester {
            Semester::One => e.sem1_result.total,
            Semester::Two => e.sem2_result.total,
        })
        .sum();
    let count = entries.len();

    Ok(Some(ClassStat {
        average: round_off_2_decimals(sum / (count as f64)),
        count,
    }))
}
