use serde::Serialize;
use tracing::debug;

use crate::gpa;
use crate::grades::{self, Grade};
use crate::models::{GradePoint, ModuleStatus, StudentModule, StudentProgram, StudentSemester};

/// Thresholds separating a supplementary result from an outright failure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemarksPolicy {
    pub pass_mark: f64,
    pub supplementary_floor: f64,
}

impl Default for RemarksPolicy {
    fn default() -> Self {
        Self {
            pass_mark: 50.0,
            supplementary_floor: 45.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RemarkStatus {
    Proceed,
    RemainInSemester,
    NoMarks,
}

impl RemarkStatus {
    pub fn label(self) -> &'static str {
        match self {
            RemarkStatus::Proceed => "Proceed",
            RemarkStatus::RemainInSemester => "Remain in Semester",
            RemarkStatus::NoMarks => "No Marks",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Supplementary,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleResult {
    pub module_code: String,
    pub module_name: String,
    pub grade: Option<String>,
    pub marks: Option<f64>,
    pub term: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AcademicRemarks {
    pub status: RemarkStatus,
    pub failed_modules: Vec<ModuleResult>,
    pub supplementary_modules: Vec<ModuleResult>,
    pub message: String,
    pub total_modules: usize,
    pub total_credits_attempted: f64,
    pub total_credits_completed: f64,
}

/// Judges a single module result. `None` means there is nothing to judge
/// yet (ungraded, deferred or exempted).
pub fn assess(module: &StudentModule, policy: &RemarksPolicy) -> Option<Outcome> {
    let raw = module.grade.as_deref();
    if !grades::is_graded(raw) {
        return None;
    }

    let grade = raw.and_then(|value| value.parse::<Grade>().ok());
    if module.status == ModuleStatus::Exempted || grade == Some(Grade::EXP) {
        return Some(Outcome::Pass);
    }
    if grade == Some(Grade::DEF) {
        return None;
    }

    if grade.is_some_and(Grade::is_pass) {
        return Some(Outcome::Pass);
    }
    if grade == Some(Grade::PP) {
        return Some(Outcome::Supplementary);
    }
    match module.marks {
        Some(marks) if marks >= policy.supplementary_floor && marks < policy.pass_mark => {
            Some(Outcome::Supplementary)
        }
        _ => Some(Outcome::Fail),
    }
}

fn module_result(module: &StudentModule, term: &str) -> ModuleResult {
    ModuleResult {
        module_code: module.module_code.clone(),
        module_name: module.module_name.clone(),
        grade: module.grade.clone(),
        marks: module.marks,
        term: term.to_string(),
    }
}

/// Derives the progression remark for a student.
///
/// The status is decided by the current (latest counted) semester alone.
/// The failed and supplementary lists carry every result still outstanding
/// across the record: a failure disappears once the same module code is
/// passed later on.
pub fn classify(
    programs: &[StudentProgram],
    latest: Option<&GradePoint>,
    policy: &RemarksPolicy,
) -> AcademicRemarks {
    let mut failed: Vec<ModuleResult> = Vec::new();
    let mut supplementary: Vec<ModuleResult> = Vec::new();
    let mut total_modules = 0usize;
    let mut current: Option<&StudentSemester> = None;

    for semester in gpa::counted_semesters(programs) {
        current = Some(semester);
        for module in gpa::counted_modules(semester) {
            total_modules += 1;
            let Some(outcome) = assess(module, policy) else {
                continue;
            };

            failed.retain(|m| m.module_code != module.module_code);
            supplementary.retain(|m| m.module_code != module.module_code);
            match outcome {
                Outcome::Pass => {}
                Outcome::Supplementary => {
                    supplementary.push(module_result(module, &semester.term));
                }
                Outcome::Fail => failed.push(module_result(module, &semester.term)),
            }
        }
    }

    let (status, message) = match current {
        None => (RemarkStatus::NoMarks, "No marks captured".to_string()),
        Some(semester) => {
            current_semester_status(semester, policy, failed.len(), supplementary.len())
        }
    };

    debug!(
        status = status.label(),
        failed = failed.len(),
        supplementary = supplementary.len(),
        "classified academic remarks"
    );

    AcademicRemarks {
        status,
        failed_modules: failed,
        supplementary_modules: supplementary,
        message,
        total_modules,
        total_credits_attempted: latest.map_or(0.0, |p| p.cumulative_credits_attempted),
        total_credits_completed: latest.map_or(0.0, |p| p.cumulative_credits_completed),
    }
}

fn current_semester_status(
    semester: &StudentSemester,
    policy: &RemarksPolicy,
    outstanding_failed: usize,
    outstanding_supplementary: usize,
) -> (RemarkStatus, String) {
    let outcomes: Vec<Outcome> = gpa::counted_modules(semester)
        .filter_map(|module| assess(module, policy))
        .collect();

    // Deferred and ungraded results leave nothing to judge.
    if outcomes.is_empty() {
        return (
            RemarkStatus::NoMarks,
            format!("No marks captured for {}", semester.term),
        );
    }

    let failures = outcomes.iter().filter(|o| **o == Outcome::Fail).count();
    if failures > 0 {
        return (
            RemarkStatus::RemainInSemester,
            format!("Remain in Semester, {failures} failed module(s)"),
        );
    }

    let message = match (outstanding_failed, outstanding_supplementary) {
        (0, 0) => "Proceed".to_string(),
        (0, supp) => format!("Proceed with {supp} supplementary module(s)"),
        (failed, 0) => format!("Proceed with {failed} failed module(s) outstanding"),
        (failed, supp) => format!(
            "Proceed with {failed} failed and {supp} supplementary module(s) outstanding"
        ),
    };
    (RemarkStatus::Proceed, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpa::tests::{module, semester};
    use crate::models::{ProgramStatus, SemesterStatus};

    fn program(status: ProgramStatus, semesters: Vec<StudentSemester>) -> StudentProgram {
        StudentProgram {
            id: 1,
            program_code: "BSCSE".to_string(),
            program_name: "BSc Software Engineering".to_string(),
            status,
            semesters,
        }
    }

    fn with_marks(code: &str, grade: &str, marks: f64) -> StudentModule {
        let mut m = module(code, Some(grade), 3.0);
        m.marks = Some(marks);
        m
    }

    fn run(programs: &[StudentProgram]) -> AcademicRemarks {
        let points = gpa::program_grade_points(programs);
        classify(programs, points.last(), &RemarksPolicy::default())
    }

    #[test]
    fn clean_semester_proceeds() {
        let programs = vec![program(
            ProgramStatus::Active,
            vec![semester(
                1,
                SemesterStatus::Active,
                vec![module("M1", Some("A"), 3.0), module("M2", Some("C"), 3.0)],
            )],
        )];

        let remarks = run(&programs);
        assert_eq!(remarks.status, RemarkStatus::Proceed);
        assert_eq!(remarks.message, "Proceed");
        assert!(remarks.failed_modules.is_empty());
        assert_eq!(remarks.total_modules, 2);
        assert_eq!(remarks.total_credits_attempted, 6.0);
        assert_eq!(remarks.total_credits_completed, 6.0);
    }

    #[test]
    fn failure_in_current_semester_holds_student_back() {
        let programs = vec![program(
            ProgramStatus::Active,
            vec![semester(
                1,
                SemesterStatus::Active,
                vec![module("M1", Some("B"), 3.0), with_marks("M2", "F", 30.0)],
            )],
        )];

        let remarks = run(&programs);
        assert_eq!(remarks.status, RemarkStatus::RemainInSemester);
        assert_eq!(remarks.message, "Remain in Semester, 1 failed module(s)");
        assert_eq!(remarks.failed_modules.len(), 1);
        assert_eq!(remarks.failed_modules[0].module_code, "M2");
        assert_eq!(remarks.total_credits_completed, 3.0);
    }

    #[test]
    fn borderline_marks_are_supplementary() {
        let programs = vec![program(
            ProgramStatus::Active,
            vec![semester(
                1,
                SemesterStatus::Active,
                vec![
                    module("M1", Some("B"), 3.0),
                    with_marks("M2", "F", 46.0),
                    module("M3", Some("PP"), 3.0),
                ],
            )],
        )];

        let remarks = run(&programs);
        assert_eq!(remarks.status, RemarkStatus::Proceed);
        assert_eq!(remarks.supplementary_modules.len(), 2);
        assert!(remarks.failed_modules.is_empty());
        assert_eq!(remarks.message, "Proceed with 2 supplementary module(s)");
    }

    #[test]
    fn supplementary_floor_is_configurable() {
        let m = with_marks("M1", "F", 42.0);
        assert_eq!(assess(&m, &RemarksPolicy::default()), Some(Outcome::Fail));

        let lenient = RemarksPolicy {
            pass_mark: 50.0,
            supplementary_floor: 40.0,
        };
        assert_eq!(assess(&m, &lenient), Some(Outcome::Supplementary));
    }

    #[test]
    fn ungraded_semester_reports_no_marks() {
        let programs = vec![program(
            ProgramStatus::Active,
            vec![
                semester(1, SemesterStatus::Active, vec![module("M1", Some("F"), 3.0)]),
                semester(
                    2,
                    SemesterStatus::Active,
                    vec![module("M2", None, 3.0), module("M3", Some("NM"), 3.0)],
                ),
            ],
        )];

        let remarks = run(&programs);
        assert_eq!(remarks.status, RemarkStatus::NoMarks);
        assert_eq!(remarks.message, "No marks captured for 2024-02");
        assert_eq!(remarks.failed_modules.len(), 1);
    }

    #[test]
    fn later_pass_clears_earlier_failure() {
        let mut repeat = module("M1", Some("C"), 3.0);
        repeat.status = ModuleStatus::Repeat;
        let programs = vec![program(
            ProgramStatus::Active,
            vec![
                semester(1, SemesterStatus::Active, vec![module("M1", Some("F"), 3.0)]),
                semester(2, SemesterStatus::Repeat, vec![repeat]),
            ],
        )];

        let remarks = run(&programs);
        assert_eq!(remarks.status, RemarkStatus::Proceed);
        assert!(remarks.failed_modules.is_empty());
        assert_eq!(remarks.total_modules, 2);
    }

    #[test]
    fn excluded_semesters_do_not_become_current() {
        let programs = vec![program(
            ProgramStatus::Active,
            vec![
                semester(1, SemesterStatus::Active, vec![module("M1", Some("B"), 3.0)]),
                semester(2, SemesterStatus::Withdrawn, vec![module("M2", Some("F"), 3.0)]),
            ],
        )];

        let remarks = run(&programs);
        assert_eq!(remarks.status, RemarkStatus::Proceed);
        assert_eq!(remarks.total_modules, 1);
    }

    #[test]
    fn empty_record_has_no_marks() {
        let remarks = classify(&[], None, &RemarksPolicy::default());
        assert_eq!(remarks.status, RemarkStatus::NoMarks);
        assert_eq!(remarks.total_modules, 0);
        assert_eq!(remarks.total_credits_attempted, 0.0);
    }

    #[test]
    fn exempted_and_deferred_results_are_not_failures() {
        let mut exempted = module("M1", Some("F"), 3.0);
        exempted.status = ModuleStatus::Exempted;
        assert_eq!(
            assess(&exempted, &RemarksPolicy::default()),
            Some(Outcome::Pass)
        );
        assert_eq!(
            assess(&module("M2", Some("DEF"), 3.0), &RemarksPolicy::default()),
            None
        );
        assert_eq!(
            assess(&module("M3", Some("Q"), 3.0), &RemarksPolicy::default()),
            Some(Outcome::Fail)
        );
    }

    #[test]
    fn deferred_only_semester_has_no_marks() {
        let programs = vec![program(
            ProgramStatus::Active,
            vec![
                semester(1, SemesterStatus::Active, vec![module("M1", Some("B"), 3.0)]),
                semester(
                    2,
                    SemesterStatus::Active,
                    vec![module("M2", Some("DEF"), 3.0), module("M3", Some("def"), 3.0)],
                ),
            ],
        )];

        let remarks = run(&programs);
        assert_eq!(remarks.status, RemarkStatus::NoMarks);
        assert_eq!(remarks.message, "No marks captured for 2024-02");
    }

    #[test]
    fn earlier_failures_are_named_in_proceed_message() {
        let programs = vec![program(
            ProgramStatus::Active,
            vec![
                semester(1, SemesterStatus::Active, vec![module("M1", Some("F"), 3.0)]),
                semester(
                    2,
                    SemesterStatus::Active,
                    vec![module("M2", Some("B"), 3.0), module("M3", Some("PP"), 3.0)],
                ),
            ],
        )];

        let remarks = run(&programs);
        assert_eq!(remarks.status, RemarkStatus::Proceed);
        assert_eq!(remarks.failed_modules.len(), 1);
        assert_eq!(
            remarks.message,
            "Proceed with 1 failed and 1 supplementary module(s) outstanding"
        );

        let only_failed = vec![program(
            ProgramStatus::Active,
            vec![
                semester(1, SemesterStatus::Active, vec![module("M1", Some("F"), 3.0)]),
                semester(2, SemesterStatus::Active, vec![module("M2", Some("A"), 3.0)]),
            ],
        )];
        assert_eq!(
            run(&only_failed).message,
            "Proceed with 1 failed module(s) outstanding"
        );
    }
}
