use std::env;

use anyhow::Context;

use crate::error::DomainError;
use crate::models::Department;
use crate::remarks::RemarksPolicy;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub remarks: RemarksPolicy,
    pub required_departments: Vec<Department>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .context("DATABASE_URL must be set to a production Postgres instance")?;

        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5u32)?;
        let defaults = RemarksPolicy::default();
        let remarks = RemarksPolicy {
            pass_mark: parse_mark(&lookup, "REMARKS_PASS_MARK", defaults.pass_mark)?,
            supplementary_floor: parse_mark(
                &lookup,
                "REMARKS_SUPPLEMENTARY_FLOOR",
                defaults.supplementary_floor,
            )?,
        };
        if remarks.supplementary_floor > remarks.pass_mark {
            return Err(DomainError::InvalidConfig {
                key: "REMARKS_SUPPLEMENTARY_FLOOR",
                reason: format!(
                    "{} is above the pass mark {}",
                    remarks.supplementary_floor, remarks.pass_mark
                ),
            }
            .into());
        }

        let required_departments = match lookup("CLEARANCE_REQUIRED_DEPARTMENTS") {
            Some(raw) => parse_departments(&raw)
                .context("CLEARANCE_REQUIRED_DEPARTMENTS is not a valid department list")?,
            None => Department::ALL.to_vec(),
        };

        Ok(Self {
            database_url,
            max_connections,
            remarks,
            required_departments,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, DomainError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| DomainError::InvalidConfig {
            key,
            reason: format!("{raw:?}: {e}"),
        }),
        None => Ok(default),
    }
}

/// Like [`parse_or`], but only finite marks are accepted.
fn parse_mark<F>(lookup: &F, key: &'static str, default: f64) -> Result<f64, DomainError>
where
    F: Fn(&str) -> Option<String>,
{
    let mark = parse_or(lookup, key, default)?;
    if mark.is_finite() {
        Ok(mark)
    } else {
        Err(DomainError::InvalidConfig {
            key,
            reason: format!("{mark} is not a finite mark"),
        })
    }
}

fn parse_departments(raw: &str) -> Result<Vec<Department>, DomainError> {
    let mut departments = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let department: Department = part.parse()?;
        if !departments.contains(&department) {
            departments.push(department);
        }
    }
    Ok(departments)
}
