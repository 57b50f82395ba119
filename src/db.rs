use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::grades::Grade;
use crate::models::{
    ClearanceRecord, ClearanceStatus, Department, ModuleStatus, SemesterStatus, Student,
    StudentModule, StudentProgram, StudentSemester,
};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// One module result as it arrives from a results export.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ResultRow {
    pub std_no: i64,
    pub name: String,
    pub program_code: String,
    pub program_name: String,
    pub term: String,
    pub semester_number: i32,
    pub semester_status: String,
    pub module_code: String,
    pub module_name: String,
    pub credits: f64,
    pub marks: Option<f64>,
    pub grade: Option<String>,
    pub status: String,
}

impl ResultRow {
    /// Stored grade: the given letter, or one derived from marks when only
    /// marks were captured.
    fn resolved_grade(&self) -> Option<String> {
        match self.grade.as_deref().map(str::trim) {
            Some(letter) if !letter.is_empty() => Some(letter.to_ascii_uppercase()),
            _ => self.marks.map(|m| Grade::from_marks(m).to_string()),
        }
    }
}

async fn upsert_student(pool: &PgPool, std_no: i64, name: &str) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO academic_status.students (std_no, name)
        VALUES ($1, $2)
        ON CONFLICT (std_no) DO UPDATE SET name = EXCLUDED.name
        "#,
    )
    .bind(std_no)
    .bind(name)
    .execute(pool)
    .await?;
    Ok(())
}

async fn upsert_program(
    pool: &PgPool,
    std_no: i64,
    program_code: &str,
    program_name: &str,
) -> anyhow::Result<i64> {
    let id: i64 = sqlx::query(
        r#"
        INSERT INTO academic_status.student_programs (std_no, program_code, program_name)
        VALUES ($1, $2, $3)
        ON CONFLICT (std_no, program_code) DO UPDATE SET program_name = EXCLUDED.program_name
        RETURNING id
        "#,
    )
    .bind(std_no)
    .bind(program_code)
    .bind(program_name)
    .fetch_one(pool)
    .await?
    .get("id");
    Ok(id)
}

async fn upsert_semester(
    pool: &PgPool,
    program_id: i64,
    term: &str,
    semester_number: i32,
    status: SemesterStatus,
) -> anyhow::Result<i64> {
    let id: i64 = sqlx::query(
        r#"
        INSERT INTO academic_status.student_semesters
        (student_program_id, term, semester_number, status)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (student_program_id, term) DO UPDATE
        SET semester_number = EXCLUDED.semester_number, status = EXCLUDED.status
        RETURNING id
        "#,
    )
    .bind(program_id)
    .bind(term)
    .bind(semester_number)
    .bind(status.as_str())
    .fetch_one(pool)
    .await?
    .get("id");
    Ok(id)
}

/// Returns true when the result was new, false when it replaced an
/// existing one.
async fn upsert_module(
    pool: &PgPool,
    semester_id: i64,
    module: &StudentModule,
) -> anyhow::Result<bool> {
    let inserted: bool = sqlx::query(
        r#"
        INSERT INTO academic_status.student_modules
        (student_semester_id, module_code, module_name, credits, marks, grade, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (student_semester_id, module_code) DO UPDATE
        SET module_name = EXCLUDED.module_name,
            credits = EXCLUDED.credits,
            marks = EXCLUDED.marks,
            grade = EXCLUDED.grade,
            status = EXCLUDED.status
        RETURNING (xmax = 0) AS inserted
        "#,
    )
    .bind(semester_id)
    .bind(&module.module_code)
    .bind(&module.module_name)
    .bind(module.credits)
    .bind(module.marks)
    .bind(module.grade.as_deref())
    .bind(module.status.as_str())
    .fetch_one(pool)
    .await?
    .get("inserted");
    Ok(inserted)
}

async fn store_result(pool: &PgPool, row: &ResultRow) -> anyhow::Result<bool> {
    let semester_status: SemesterStatus = row.semester_status.parse()?;
    let module = StudentModule {
        module_code: row.module_code.trim().to_string(),
        module_name: row.module_name.trim().to_string(),
        grade: row.resolved_grade(),
        marks: row.marks,
        credits: row.credits,
        status: row.status.parse::<ModuleStatus>()?,
    };

    upsert_student(pool, row.std_no, &row.name).await?;
    let program_id = upsert_program(pool, row.std_no, &row.program_code, &row.program_name).await?;
    let semester_id = upsert_semester(
        pool,
        program_id,
        &row.term,
        row.semester_number,
        semester_status,
    )
    .await?;
    upsert_module(pool, semester_id, &module).await
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let rows = vec![
        (
            901000101,
            "Lerato Nthabiseng",
            "DIT",
            "Diploma in Information Technology",
            "2024-08",
            1,
            "Active",
            "DIT110",
            "Fundamentals of Programming",
            3.0,
            Some(78.0),
            "Compulsory",
        ),
        (
            901000101,
            "Lerato Nthabiseng",
            "DIT",
            "Diploma in Information Technology",
            "2024-08",
            1,
            "Active",
            "DIT120",
            "Computer Architecture",
            3.0,
            Some(41.0),
            "Compulsory",
        ),
        (
            901000101,
            "Lerato Nthabiseng",
            "DIT",
            "Diploma in Information Technology",
            "2024-08",
            1,
            "Active",
            "DIT130",
            "Communication Skills",
            2.0,
            Some(66.0),
            "Compulsory",
        ),
        (
            901000101,
            "Lerato Nthabiseng",
            "DIT",
            "Diploma in Information Technology",
            "2025-02",
            2,
            "Active",
            "DIT120",
            "Computer Architecture",
            3.0,
            Some(58.0),
            "Repeat",
        ),
        (
            901000101,
            "Lerato Nthabiseng",
            "DIT",
            "Diploma in Information Technology",
            "2025-02",
            2,
            "Active",
            "DIT210",
            "Database Systems",
            3.0,
            Some(47.0),
            "Compulsory",
        ),
        (
            901000101,
            "Lerato Nthabiseng",
            "DIT",
            "Diploma in Information Technology",
            "2025-02",
            2,
            "Active",
            "DIT220",
            "Web Design",
            3.0,
            Some(83.0),
            "Compulsory",
        ),
        (
            901000102,
            "Katleho Ramakau",
            "BSCSE",
            "BSc in Software Engineering",
            "2024-08",
            1,
            "Active",
            "SE110",
            "Discrete Mathematics",
            4.0,
            Some(92.0),
            "Compulsory",
        ),
        (
            901000102,
            "Katleho Ramakau",
            "BSCSE",
            "BSc in Software Engineering",
            "2024-08",
            1,
            "Active",
            "SE120",
            "Programming I",
            4.0,
            Some(71.0),
            "Compulsory",
        ),
        (
            901000102,
            "Katleho Ramakau",
            "BSCSE",
            "BSc in Software Engineering",
            "2025-02",
            2,
            "Deferred",
            "SE210",
            "Programming II",
            4.0,
            None,
            "Compulsory",
        ),
        (
            901000103,
            "Palesa Mohapi",
            "DBM",
            "Diploma in Business Management",
            "2025-02",
            1,
            "Active",
            "DBM110",
            "Principles of Accounting",
            3.0,
            Some(35.0),
            "Compulsory",
        ),
        (
            901000103,
            "Palesa Mohapi",
            "DBM",
            "Diploma in Business Management",
            "2025-02",
            1,
            "Active",
            "DBM120",
            "Business Communication",
            3.0,
            None,
            "Compulsory",
        ),
    ];

    for (
        std_no,
        name,
        program_code,
        program_name,
        term,
        semester_number,
        semester_status,
        module_code,
        module_name,
        credits,
        marks,
        status,
    ) in rows
    {
        let row = ResultRow {
            std_no,
            name: name.to_string(),
            program_code: program_code.to_string(),
            program_name: program_name.to_string(),
            term: term.to_string(),
            semester_number,
            semester_status: semester_status.to_string(),
            module_code: module_code.to_string(),
            module_name: module_name.to_string(),
            credits,
            marks,
            grade: None,
            status: status.to_string(),
        };
        store_result(pool, &row).await?;
    }

    let request_id = Uuid::parse_str("6b1f0c4e-3a52-4d1c-9f0e-2d5c8a7b9e10")?;
    let decisions = vec![
        (
            Department::Finance,
            ClearanceStatus::Approved,
            Some("Finance Office"),
            NaiveDate::from_ymd_opt(2026, 1, 12),
        ),
        (Department::Library, ClearanceStatus::Pending, None, None),
        (
            Department::Registry,
            ClearanceStatus::Approved,
            Some("Registry Desk"),
            NaiveDate::from_ymd_opt(2026, 1, 14),
        ),
    ];

    for (department, status, responded_by, responded_on) in decisions {
        sqlx::query(
            r#"
            INSERT INTO academic_status.clearances
            (id, request_id, department, status, responded_by, responded_on)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (request_id, department) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request_id)
        .bind(department.as_str())
        .bind(status.as_str())
        .bind(responded_by)
        .bind(responded_on)
        .execute(pool)
        .await?;
    }

    info!(%request_id, "seeded sample students and clearance request");
    Ok(())
}

/// Rows stored by an import, split by whether they were new.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportCounts {
    pub inserted: usize,
    pub updated: usize,
}

impl ImportCounts {
    fn record(&mut self, inserted: bool) {
        if inserted {
            self.inserted += 1;
        } else {
            self.updated += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.inserted + self.updated
    }
}

pub async fn import_results_csv(
    pool: &PgPool,
    csv_path: &std::path::Path,
) -> anyhow::Result<ImportCounts> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut counts = ImportCounts::default();

    for (index, result) in reader.deserialize::<ResultRow>().enumerate() {
        let line = index + 2;
        let row = result.with_context(|| format!("malformed row at line {line}"))?;
        let inserted = store_result(pool, &row)
            .await
            .with_context(|| format!("failed to store row at line {line}"))?;

        if !inserted {
            debug!(line, module = %row.module_code, term = %row.term, "replaced existing result");
        }
        counts.record(inserted);
    }

    info!(
        inserted = counts.inserted,
        updated = counts.updated,
        path = %csv_path.display(),
        "imported module results"
    );
    Ok(counts)
}

/// One row of the program/semester/module left join. Semester and module
/// columns are empty for programs or semesters with nothing beneath them.
#[derive(Debug, Clone, Default)]
pub struct RecordRow {
    pub program_id: i64,
    pub program_code: String,
    pub program_name: String,
    pub program_status: String,
    pub semester_id: Option<i64>,
    pub term: Option<String>,
    pub semester_number: Option<i32>,
    pub semester_status: Option<String>,
    pub module_code: Option<String>,
    pub module_name: Option<String>,
    pub credits: Option<f64>,
    pub marks: Option<f64>,
    pub grade: Option<String>,
    pub module_status: Option<String>,
}

/// Folds joined rows into the Program -> Semester -> Module graph.
///
/// Rows may arrive in any order. Semesters are sorted by term and semester
/// number, and programs by their earliest term. Programs without semesters
/// go last.
pub fn build_programs(rows: Vec<RecordRow>) -> anyhow::Result<Vec<StudentProgram>> {
    let mut programs: Vec<StudentProgram> = Vec::new();

    for row in rows {
        let index = match programs.iter().position(|p| p.id == row.program_id) {
            Some(index) => index,
            None => {
                programs.push(StudentProgram {
                    id: row.program_id,
                    program_code: row.program_code,
                    program_name: row.program_name,
                    status: row.program_status.parse()?,
                    semesters: Vec::new(),
                });
                programs.len() - 1
            }
        };
        let program = &mut programs[index];

        let Some(semester_id) = row.semester_id else {
            continue;
        };
        let index = match program.semesters.iter().position(|s| s.id == semester_id) {
            Some(index) => index,
            None => {
                let status = row
                    .semester_status
                    .with_context(|| format!("semester {semester_id} has no status"))?;
                program.semesters.push(StudentSemester {
                    id: semester_id,
                    term: row.term.unwrap_or_default(),
                    semester_number: row.semester_number.unwrap_or_default(),
                    status: status.parse()?,
                    modules: Vec::new(),
                });
                program.semesters.len() - 1
            }
        };
        let semester = &mut program.semesters[index];

        let Some(module_code) = row.module_code else {
            continue;
        };
        let status = row
            .module_status
            .with_context(|| format!("module {module_code} has no status"))?;
        semester.modules.push(StudentModule {
            module_name: row.module_name.unwrap_or_else(|| module_code.clone()),
            module_code,
            grade: row.grade,
            marks: row.marks,
            credits: row.credits.unwrap_or_default(),
            status: status.parse()?,
        });
    }

    for program in &mut programs {
        program.semesters.sort_by(|a, b| {
            a.term
                .cmp(&b.term)
                .then(a.semester_number.cmp(&b.semester_number))
        });
    }
    programs.sort_by(|a, b| {
        let first = |p: &StudentProgram| p.semesters.first().map(|s| s.term.clone());
        match (first(a), first(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
    });

    Ok(programs)
}

/// Loads a student's full Program -> Semester -> Module graph in
/// chronological order.
pub async fn fetch_student(
    pool: &PgPool,
    std_no: i64,
) -> anyhow::Result<(Student, Vec<StudentProgram>)> {
    let student_row = sqlx::query("SELECT std_no, name FROM academic_status.students WHERE std_no = $1")
        .bind(std_no)
        .fetch_optional(pool)
        .await?
        .with_context(|| format!("student {std_no} not found"))?;

    let student = Student {
        std_no: student_row.get("std_no"),
        name: student_row.get("name"),
    };

    let rows = sqlx::query(
        r#"
        SELECT p.id AS program_id, p.program_code, p.program_name, p.status AS program_status,
               s.id AS semester_id, s.term, s.semester_number, s.status AS semester_status,
               m.module_code, m.module_name, m.credits, m.marks, m.grade, m.status AS module_status
        FROM academic_status.student_programs p
        LEFT JOIN academic_status.student_semesters s ON s.student_program_id = p.id
        LEFT JOIN academic_status.student_modules m ON m.student_semester_id = s.id
        WHERE p.std_no = $1
        ORDER BY MIN(s.term) OVER (PARTITION BY p.id), p.id, s.term, s.semester_number, m.id
        "#,
    )
    .bind(std_no)
    .fetch_all(pool)
    .await?;

    let rows: Vec<RecordRow> = rows
        .iter()
        .map(|row| RecordRow {
            program_id: row.get("program_id"),
            program_code: row.get("program_code"),
            program_name: row.get("program_name"),
            program_status: row.get("program_status"),
            semester_id: row.get("semester_id"),
            term: row.get("term"),
            semester_number: row.get("semester_number"),
            semester_status: row.get("semester_status"),
            module_code: row.get("module_code"),
            module_name: row.get("module_name"),
            credits: row.get("credits"),
            marks: row.get("marks"),
            grade: row.get("grade"),
            module_status: row.get("module_status"),
        })
        .collect();
    let programs = build_programs(rows)?;

    debug!(std_no, programs = programs.len(), "loaded student record");
    Ok((student, programs))
}

pub async fn fetch_clearance(
    pool: &PgPool,
    request_id: Uuid,
) -> anyhow::Result<Vec<ClearanceRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT request_id, department, status, responded_by, responded_on, message
        FROM academic_status.clearances
        WHERE request_id = $1
        ORDER BY department
        "#,
    )
    .bind(request_id)
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let department: String = row.get("department");
        let status: String = row.get("status");
        records.push(ClearanceRecord {
            request_id: row.get("request_id"),
            department: department.parse()?,
            status: status.parse()?,
            responded_by: row.get("responded_by"),
            responded_on: row.get("responded_on"),
            message: row.get("message"),
        });
    }

    debug!(%request_id, records = records.len(), "loaded clearance records");
    Ok(records)
}
