use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::error::DomainError;

/// Lowercases and strips separators so "Dropped Out", "dropped_out" and
/// "DroppedOut" compare equal.
fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModuleStatus {
    Compulsory,
    Elective,
    Active,
    Repeat,
    Resit,
    Exempted,
    Supplementary,
    Delete,
    Drop,
}

impl ModuleStatus {
    pub fn is_excluded(self) -> bool {
        matches!(self, ModuleStatus::Delete | ModuleStatus::Drop)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModuleStatus::Compulsory => "Compulsory",
            ModuleStatus::Elective => "Elective",
            ModuleStatus::Active => "Active",
            ModuleStatus::Repeat => "Repeat",
            ModuleStatus::Resit => "Resit",
            ModuleStatus::Exempted => "Exempted",
            ModuleStatus::Supplementary => "Supplementary",
            ModuleStatus::Delete => "Delete",
            ModuleStatus::Drop => "Drop",
        }
    }
}

impl FromStr for ModuleStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize(value).as_str() {
            "compulsory" => Ok(ModuleStatus::Compulsory),
            "elective" => Ok(ModuleStatus::Elective),
            "active" => Ok(ModuleStatus::Active),
            "repeat" => Ok(ModuleStatus::Repeat),
            "resit" => Ok(ModuleStatus::Resit),
            "exempted" => Ok(ModuleStatus::Exempted),
            "supplementary" => Ok(ModuleStatus::Supplementary),
            "delete" | "deleted" => Ok(ModuleStatus::Delete),
            "drop" | "dropped" => Ok(ModuleStatus::Drop),
            _ => Err(DomainError::UnknownStatus {
                kind: "module",
                value: value.to_string(),
            }),
        }
    }
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SemesterStatus {
    Active,
    Enrolled,
    Repeat,
    Exempted,
    Outstanding,
    Deferred,
    DroppedOut,
    Withdrawn,
    Deleted,
}

impl SemesterStatus {
    /// Semesters that take no part in any academic computation.
    pub fn is_excluded(self) -> bool {
        matches!(
            self,
            SemesterStatus::Deleted
                | SemesterStatus::Deferred
                | SemesterStatus::DroppedOut
                | SemesterStatus::Withdrawn
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SemesterStatus::Active => "Active",
            SemesterStatus::Enrolled => "Enrolled",
            SemesterStatus::Repeat => "Repeat",
            SemesterStatus::Exempted => "Exempted",
            SemesterStatus::Outstanding => "Outstanding",
            SemesterStatus::Deferred => "Deferred",
            SemesterStatus::DroppedOut => "DroppedOut",
            SemesterStatus::Withdrawn => "Withdrawn",
            SemesterStatus::Deleted => "Deleted",
        }
    }
}

impl FromStr for SemesterStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize(value).as_str() {
            "active" => Ok(SemesterStatus::Active),
            "enrolled" => Ok(SemesterStatus::Enrolled),
            "repeat" => Ok(SemesterStatus::Repeat),
            "exempted" => Ok(SemesterStatus::Exempted),
            "outstanding" => Ok(SemesterStatus::Outstanding),
            "deferred" => Ok(SemesterStatus::Deferred),
            "droppedout" => Ok(SemesterStatus::DroppedOut),
            "withdrawn" => Ok(SemesterStatus::Withdrawn),
            "deleted" => Ok(SemesterStatus::Deleted),
            _ => Err(DomainError::UnknownStatus {
                kind: "semester",
                value: value.to_string(),
            }),
        }
    }
}

impl fmt::Display for SemesterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProgramStatus {
    Active,
    Changed,
    Completed,
    Deleted,
    Inactive,
}

impl ProgramStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProgramStatus::Active => "Active",
            ProgramStatus::Changed => "Changed",
            ProgramStatus::Completed => "Completed",
            ProgramStatus::Deleted => "Deleted",
            ProgramStatus::Inactive => "Inactive",
        }
    }
}

impl FromStr for ProgramStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize(value).as_str() {
            "active" => Ok(ProgramStatus::Active),
            "changed" => Ok(ProgramStatus::Changed),
            "completed" => Ok(ProgramStatus::Completed),
            "deleted" => Ok(ProgramStatus::Deleted),
            "inactive" => Ok(ProgramStatus::Inactive),
            _ => Err(DomainError::UnknownStatus {
                kind: "program",
                value: value.to_string(),
            }),
        }
    }
}

impl fmt::Display for ProgramStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClearanceStatus {
    Pending,
    Approved,
    Rejected,
}

impl ClearanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ClearanceStatus::Pending => "pending",
            ClearanceStatus::Approved => "approved",
            ClearanceStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for ClearanceStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize(value).as_str() {
            "pending" => Ok(ClearanceStatus::Pending),
            "approved" => Ok(ClearanceStatus::Approved),
            "rejected" => Ok(ClearanceStatus::Rejected),
            _ => Err(DomainError::UnknownStatus {
                kind: "clearance",
                value: value.to_string(),
            }),
        }
    }
}

impl fmt::Display for ClearanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Department {
    Finance,
    Library,
    Registry,
    Academic,
}

impl Department {
    pub const ALL: [Department; 4] = [
        Department::Finance,
        Department::Library,
        Department::Registry,
        Department::Academic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Department::Finance => "finance",
            Department::Library => "library",
            Department::Registry => "registry",
            Department::Academic => "academic",
        }
    }
}

impl FromStr for Department {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize(value).as_str() {
            "finance" => Ok(Department::Finance),
            "library" => Ok(Department::Library),
            "registry" => Ok(Department::Registry),
            "academic" => Ok(Department::Academic),
            _ => Err(DomainError::UnknownDepartment(value.to_string())),
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Student {
    pub std_no: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentModule {
    pub module_code: String,
    pub module_name: String,
    /// Letter grade as stored; `None` until marks are captured.
    pub grade: Option<String>,
    pub marks: Option<f64>,
    pub credits: f64,
    pub status: ModuleStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentSemester {
    pub id: i64,
    pub term: String,
    pub semester_number: i32,
    pub status: SemesterStatus,
    pub modules: Vec<StudentModule>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentProgram {
    pub id: i64,
    pub program_code: String,
    pub program_name: String,
    pub status: ProgramStatus,
    pub semesters: Vec<StudentSemester>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradePoint {
    pub semester_id: i64,
    pub term: String,
    pub gpa: f64,
    pub cgpa: f64,
    pub credits_attempted: f64,
    pub credits_completed: f64,
    pub cumulative_credits_attempted: f64,
    pub cumulative_credits_completed: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClearanceRecord {
    pub request_id: Uuid,
    pub department: Department,
    pub status: ClearanceStatus,
    pub responded_by: Option<String>,
    pub responded_on: Option<NaiveDate>,
    pub message: Option<String>,
}
