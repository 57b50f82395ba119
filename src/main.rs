use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod clearance;
mod config;
mod db;
mod error;
mod gpa;
mod grades;
mod models;
mod remarks;
mod report;

#[derive(Parser)]
#[command(name = "academic-status")]
#[command(about = "Academic standing and clearance status for the registry", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import module results from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Show per-semester GPA and CGPA for a student
    Transcript {
        #[arg(long)]
        std_no: i64,
        #[arg(long)]
        json: bool,
    },
    /// Derive the progression remark for a student
    Remarks {
        #[arg(long)]
        std_no: i64,
        #[arg(long)]
        json: bool,
    },
    /// Show the overall status of a clearance request
    Clearance {
        #[arg(long)]
        request_id: Uuid,
    },
    /// Generate a markdown academic statement
    Report {
        #[arg(long)]
        std_no: i64,
        #[arg(long)]
        request_id: Option<Uuid>,
        #[arg(long, default_value = "statement.md")]
        out: PathBuf,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}=info", env!("CARGO_CRATE_NAME"))));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = config::AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;
    info!(max_connections = config.max_connections, "connected to Postgres");

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let counts = db::import_results_csv(&pool, &csv).await?;
            println!(
                "Stored {} module results from {} ({} new, {} updated).",
                counts.total(),
                csv.display(),
                counts.inserted,
                counts.updated
            );
        }
        Commands::Transcript { std_no, json } => {
            let (student, programs) = db::fetch_student(&pool, std_no).await?;
            let points = gpa::program_grade_points(&programs);

            if json {
                println!("{}", serde_json::to_string_pretty(&points)?);
                return Ok(());
            }

            if points.is_empty() {
                println!("No counted semesters for {} ({}).", student.name, student.std_no);
                return Ok(());
            }

            println!("Grade points for {} ({}):", student.name, student.std_no);
            for point in &points {
                println!(
                    "- {} GPA {:.2} CGPA {:.2} ({} of {} credits completed)",
                    point.term,
                    point.gpa,
                    point.cgpa,
                    point.credits_completed,
                    point.credits_attempted
                );
            }
        }
        Commands::Remarks { std_no, json } => {
            let (student, programs) = db::fetch_student(&pool, std_no).await?;
            let points = gpa::program_grade_points(&programs);
            let remarks = remarks::classify(&programs, points.last(), &config.remarks);

            if json {
                println!("{}", serde_json::to_string_pretty(&remarks)?);
                return Ok(());
            }

            println!(
                "{} ({}): {}",
                student.name,
                student.std_no,
                remarks.status.label()
            );
            println!("{}", remarks.message);
            for module in &remarks.failed_modules {
                println!("- failed {} {} ({})", module.module_code, module.module_name, module.term);
            }
            for module in &remarks.supplementary_modules {
                println!(
                    "- supplementary {} {} ({})",
                    module.module_code, module.module_name, module.term
                );
            }
        }
        Commands::Clearance { request_id } => {
            let records = db::fetch_clearance(&pool, request_id).await?;
            let overall = clearance::aggregate_required(&records, &config.required_departments);

            println!("Clearance {request_id}: {overall}");
            for (department, status) in
                clearance::outstanding_departments(&records, &config.required_departments)
            {
                println!("- {department} is {status}");
            }
        }
        Commands::Report {
            std_no,
            request_id,
            out,
        } => {
            let (student, programs) = db::fetch_student(&pool, std_no).await?;
            let points = gpa::program_grade_points(&programs);
            let remarks = remarks::classify(&programs, points.last(), &config.remarks);

            let records = match request_id {
                Some(id) => Some((id, db::fetch_clearance(&pool, id).await?)),
                None => None,
            };
            let section = records.as_ref().map(|(id, records)| report::ClearanceSection {
                request_id: *id,
                records,
                overall: clearance::aggregate_required(records, &config.required_departments),
            });

            let statement =
                report::build_report(&student, &programs, &points, &remarks, section);
            std::fs::write(&out, statement)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Statement written to {}.", out.display());
        }
    }

    Ok(())
}
