use std::fmt::Write;

use crate::gpa;
use crate::grades::Grade;
use crate::models::{ClearanceRecord, GradePoint, Student, StudentProgram};
use crate::remarks::{AcademicRemarks, ModuleResult};

#[derive(Debug, Clone, PartialEq)]
pub struct GradeCount {
    pub grade: String,
    pub count: usize,
}

/// Counts graded results per letter across all counted semesters, most
/// frequent first.
pub fn grade_distribution(programs: &[StudentProgram]) -> Vec<GradeCount> {
    let mut map: std::collections::HashMap<String, usize> = std::collections::HashMap::new();

    for semester in gpa::counted_semesters(programs) {
        for module in gpa::counted_modules(semester) {
            if let Some(grade) = module.grade.as_deref() {
                *map.entry(grade.to_string()).or_insert(0) += 1;
            }
        }
    }

    let mut counts: Vec<GradeCount> = map
        .into_iter()
        .map(|(grade, count)| GradeCount { grade, count })
        .collect();

    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.grade.cmp(&b.grade)));
    counts
}

/// Clearance details for one request, already reduced to an overall status.
pub struct ClearanceSection<'a> {
    pub request_id: uuid::Uuid,
    pub records: &'a [ClearanceRecord],
    pub overall: crate::models::ClearanceStatus,
}

fn write_modules(output: &mut String, modules: &[ModuleResult]) {
    for module in modules {
        let marks = module
            .marks
            .map(|m| format!("{m:.0}"))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            output,
            "- {} {} ({}): grade {} marks {}",
            module.module_code,
            module.module_name,
            module.term,
            module.grade.as_deref().unwrap_or("-"),
            marks
        );
    }
}

pub fn build_report(
    student: &Student,
    programs: &[StudentProgram],
    points: &[GradePoint],
    remarks: &AcademicRemarks,
    clearance: Option<ClearanceSection<'_>>,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Academic Statement");
    let _ = writeln!(output, "Student {} ({})", student.name, student.std_no);
    for program in programs {
        let _ = writeln!(
            output,
            "- {} {} [{}]",
            program.program_code, program.program_name, program.status
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Grade Points");

    if points.is_empty() {
        let _ = writeln!(output, "No counted semesters on record.");
    } else {
        let _ = writeln!(output, "| Term | GPA | CGPA | Attempted | Completed |");
        let _ = writeln!(output, "| --- | --- | --- | --- | --- |");
        for point in points {
            let _ = writeln!(
                output,
                "| {} | {:.2} | {:.2} | {} | {} |",
                point.term,
                point.gpa,
                point.cgpa,
                point.credits_attempted,
                point.credits_completed
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Grade Mix");

    let distribution = grade_distribution(programs);
    if distribution.is_empty() {
        let _ = writeln!(output, "No graded modules.");
    } else {
        for entry in distribution {
            match entry.grade.parse::<Grade>() {
                Ok(grade) => {
                    let _ = writeln!(
                        output,
                        "- {}: {} ({})",
                        entry.grade,
                        entry.count,
                        grade.description()
                    );
                }
                Err(()) => {
                    let _ = writeln!(output, "- {}: {}", entry.grade, entry.count);
                }
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Remarks");
    let _ = writeln!(output, "Status: {}", remarks.status.label());
    let _ = writeln!(output, "{}", remarks.message);
    let _ = writeln!(
        output,
        "Modules: {}, credits attempted {}, credits completed {}",
        remarks.total_modules, remarks.total_credits_attempted, remarks.total_credits_completed
    );

    if !remarks.failed_modules.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "### Failed Modules");
        write_modules(&mut output, &remarks.failed_modules);
    }

    if !remarks.supplementary_modules.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "### Supplementary Modules");
        write_modules(&mut output, &remarks.supplementary_modules);
    }

    if let Some(section) = clearance {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Clearance {}", section.request_id);
        let _ = writeln!(output, "Overall: {}", section.overall);
        if section.records.is_empty() {
            let _ = writeln!(output, "No department has responded.");
        }
        for record in section.records {
            let _ = writeln!(
                output,
                "- {}: {}{}",
                record.department,
                record.status,
                record
                    .responded_by
                    .as_deref()
                    .map(|who| format!(" by {who}"))
                    .unwrap_or_default()
            );
        }
    }

    output
}
