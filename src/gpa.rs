use tracing::debug;

use crate::grades;
use crate::models::{GradePoint, ProgramStatus, StudentModule, StudentProgram, StudentSemester};

/// Credit-weighted totals for a set of modules.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SemesterTotals {
    pub weighted_points: f64,
    pub credits_attempted: f64,
    pub credits_completed: f64,
}

impl SemesterTotals {
    /// Folds one module into the totals. Ungraded modules still count
    /// toward attempted credits.
    pub fn add(&mut self, module: &StudentModule) {
        let point = grades::grade_point(module.grade.as_deref());
        self.weighted_points += point * module.credits;
        self.credits_attempted += module.credits;
        if point >= 1.0 {
            self.credits_completed += module.credits;
        }
    }

    pub fn merge(&mut self, other: SemesterTotals) {
        self.weighted_points += other.weighted_points;
        self.credits_attempted += other.credits_attempted;
        self.credits_completed += other.credits_completed;
    }

    pub fn average(&self) -> f64 {
        if self.credits_attempted > 0.0 {
            self.weighted_points / self.credits_attempted
        } else {
            0.0
        }
    }
}

pub fn counted_modules(semester: &StudentSemester) -> impl Iterator<Item = &StudentModule> {
    semester
        .modules
        .iter()
        .filter(|module| !module.status.is_excluded())
}

pub fn semester_totals(semester: &StudentSemester) -> SemesterTotals {
    let mut totals = SemesterTotals::default();
    for module in counted_modules(semester) {
        totals.add(module);
    }
    totals
}

/// Produces one [`GradePoint`] per counted semester, in the given
/// (chronological) order, with running cumulative figures.
pub fn calculate_grade_points<'a, I>(semesters: I) -> Vec<GradePoint>
where
    I: IntoIterator<Item = &'a StudentSemester>,
{
    let mut cumulative = SemesterTotals::default();
    let mut points = Vec::new();

    for semester in semesters {
        if semester.status.is_excluded() {
            debug!(term = %semester.term, status = %semester.status, "skipping semester");
            continue;
        }

        let totals = semester_totals(semester);
        cumulative.merge(totals);

        points.push(GradePoint {
            semester_id: semester.id,
            term: semester.term.clone(),
            gpa: totals.average(),
            cgpa: cumulative.average(),
            credits_attempted: totals.credits_attempted,
            credits_completed: totals.credits_completed,
            cumulative_credits_attempted: cumulative.credits_attempted,
            cumulative_credits_completed: cumulative.credits_completed,
        });
    }

    points
}

/// Runs the accumulator across every program's semesters in order, so
/// credits carry forward when a student changes program. Deleted programs
/// are skipped.
pub fn program_grade_points(programs: &[StudentProgram]) -> Vec<GradePoint> {
    calculate_grade_points(counted_semesters(programs))
}

/// Semesters that take part in academic computations, in record order.
pub fn counted_semesters(programs: &[StudentProgram]) -> impl Iterator<Item = &StudentSemester> {
    programs
        .iter()
        .filter(|program| program.status != ProgramStatus::Deleted)
        .flat_map(|program| program.semesters.iter())
        .filter(|semester| !semester.status.is_excluded())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{ModuleStatus, SemesterStatus};
    use proptest::prelude::*;

    pub(crate) fn module(code: &str, grade: Option<&str>, credits: f64) -> StudentModule {
        StudentModule {
            module_code: code.to_string(),
            module_name: format!("{code} module"),
            grade: grade.map(str::to_string),
            marks: None,
            credits,
            status: ModuleStatus::Compulsory,
        }
    }

    pub(crate) fn semester(
        id: i64,
        status: SemesterStatus,
        modules: Vec<StudentModule>,
    ) -> StudentSemester {
        StudentSemester {
            id,
            term: format!("2024-{id:02}"),
            semester_number: id as i32,
            status,
            modules,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn mixed_pass_and_fail_semester() {
        let semesters = vec![semester(
            1,
            SemesterStatus::Active,
            vec![module("M1", Some("A"), 3.0), module("M2", Some("F"), 3.0)],
        )];

        let totals = semester_totals(&semesters[0]);
        assert!(close(totals.weighted_points, 12.0));
        assert!(close(totals.credits_attempted, 6.0));
        assert!(close(totals.credits_completed, 3.0));

        let points = calculate_grade_points(&semesters);
        assert_eq!(points.len(), 1);
        assert!(close(points[0].gpa, 2.0));
        assert!(close(points[0].cgpa, 2.0));
        assert!(close(points[0].credits_completed, 3.0));
    }

    #[test]
    fn cgpa_accumulates_across_semesters() {
        let semesters = vec![
            semester(1, SemesterStatus::Active, vec![module("M1", Some("A"), 4.0)]),
            semester(2, SemesterStatus::Active, vec![module("M2", Some("C"), 2.0)]),
        ];

        let points = calculate_grade_points(&semesters);
        assert_eq!(points.len(), 2);
        assert!(close(points[1].gpa, 2.0));
        assert!(close(points[1].cgpa, (16.0 + 4.0) / 6.0));
        assert!(close(points[1].cumulative_credits_attempted, 6.0));
        assert!(close(points[1].cumulative_credits_completed, 6.0));
    }

    #[test]
    fn excluded_semesters_and_modules_are_skipped() {
        let mut dropped = module("M3", Some("F"), 3.0);
        dropped.status = ModuleStatus::Drop;
        let semesters = vec![
            semester(1, SemesterStatus::Deferred, vec![module("M1", Some("F"), 3.0)]),
            semester(
                2,
                SemesterStatus::Active,
                vec![module("M2", Some("B"), 3.0), dropped],
            ),
        ];

        let points = calculate_grade_points(&semesters);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].semester_id, 2);
        assert!(close(points[0].gpa, 3.0));
        assert!(close(points[0].cumulative_credits_attempted, 3.0));
    }

    #[test]
    fn ungraded_modules_count_as_attempted() {
        let semesters = vec![semester(
            1,
            SemesterStatus::Active,
            vec![module("M1", Some("A"), 3.0), module("M2", None, 3.0)],
        )];

        let points = calculate_grade_points(&semesters);
        assert!(close(points[0].gpa, 2.0));
        assert!(close(points[0].credits_attempted, 6.0));
        assert!(close(points[0].credits_completed, 3.0));
    }

    #[test]
    fn no_credits_yields_zero_gpa() {
        let semesters = vec![semester(1, SemesterStatus::Active, Vec::new())];
        let points = calculate_grade_points(&semesters);
        assert_eq!(points[0].gpa, 0.0);
        assert_eq!(points[0].cgpa, 0.0);
        assert!(calculate_grade_points(&Vec::<StudentSemester>::new()).is_empty());
    }

    #[test]
    fn credits_carry_across_programs() {
        let programs = vec![
            StudentProgram {
                id: 1,
                program_code: "DIT".to_string(),
                program_name: "Diploma in IT".to_string(),
                status: ProgramStatus::Changed,
                semesters: vec![semester(
                    1,
                    SemesterStatus::Active,
                    vec![module("M1", Some("B"), 3.0)],
                )],
            },
            StudentProgram {
                id: 2,
                program_code: "BSCIT".to_string(),
                program_name: "BSc in IT".to_string(),
                status: ProgramStatus::Active,
                semesters: vec![semester(
                    2,
                    SemesterStatus::Active,
                    vec![module("M2", Some("A"), 3.0)],
                )],
            },
        ];

        let points = program_grade_points(&programs);
        assert_eq!(points.len(), 2);
        assert!(close(points[1].cgpa, 3.5));
    }

    fn grade_strategy() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            prop::sample::select(vec!["A+", "A", "B-", "C", "D", "PP", "F", "NM", "Q"])
                .prop_map(|g| Some(g.to_string())),
        ]
    }

    fn status_strategy() -> impl Strategy<Value = SemesterStatus> {
        prop::sample::select(vec![
            SemesterStatus::Active,
            SemesterStatus::Repeat,
            SemesterStatus::Deleted,
            SemesterStatus::Deferred,
            SemesterStatus::DroppedOut,
            SemesterStatus::Withdrawn,
        ])
    }

    fn semesters_strategy() -> impl Strategy<Value = Vec<StudentSemester>> {
        prop::collection::vec(
            (
                status_strategy(),
                prop::collection::vec((grade_strategy(), 1u8..=6), 0..6),
            ),
            0..6,
        )
        .prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(idx, (status, modules))| {
                    let modules = modules
                        .into_iter()
                        .enumerate()
                        .map(|(m, (grade, credits))| {
                            module(&format!("M{m}"), grade.as_deref(), credits as f64)
                        })
                        .collect();
                    semester(idx as i64 + 1, status, modules)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn final_cgpa_ignores_semester_order(semesters in semesters_strategy()) {
            let forward = calculate_grade_points(&semesters);
            let reversed: Vec<StudentSemester> = semesters.iter().rev().cloned().collect();
            let backward = calculate_grade_points(&reversed);

            let last_forward = forward.last().map(|p| (p.cgpa, p.cumulative_credits_completed));
            let last_backward = backward.last().map(|p| (p.cgpa, p.cumulative_credits_completed));
            match (last_forward, last_backward) {
                (Some((a, ca)), Some((b, cb))) => {
                    prop_assert!((a - b).abs() < 1e-9);
                    prop_assert!((ca - cb).abs() < 1e-9);
                }
                (None, None) => {}
                _ => prop_assert!(false, "semester counts differ"),
            }
        }

        #[test]
        fn semester_gpa_depends_only_on_own_modules(semesters in semesters_strategy()) {
            let points = calculate_grade_points(&semesters);
            for point in &points {
                let own = semesters.iter().find(|s| s.id == point.semester_id).map(semester_totals);
                prop_assert_eq!(own.map(|t| t.average()), Some(point.gpa));
            }
        }

        #[test]
        fn accumulator_is_idempotent(semesters in semesters_strategy()) {
            prop_assert_eq!(calculate_grade_points(&semesters), calculate_grade_points(&semesters));
        }

        #[test]
        fn all_excluded_semesters_yield_nothing(semesters in semesters_strategy()) {
            let excluded: Vec<StudentSemester> = semesters
                .into_iter()
                .map(|mut s| {
                    s.status = SemesterStatus::Withdrawn;
                    s
                })
                .collect();
            let points = calculate_grade_points(&excluded);
            prop_assert!(points.is_empty());
        }

        #[test]
        fn contribution_is_point_times_credits(grade in grade_strategy(), credits in 0u8..=12) {
            let m = module("M", grade.as_deref(), credits as f64);
            let mut totals = SemesterTotals::default();
            totals.add(&m);
            let expected = grades::grade_point(grade.as_deref()) * credits as f64;
            prop_assert!((totals.weighted_points - expected).abs() < 1e-12);
        }
    }
}
