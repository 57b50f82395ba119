use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Letter grades recognised by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    APlus,
    A,
    AMinus,
    BPlus,
    B,
    BMinus,
    CPlus,
    C,
    CMinus,
    DPlus,
    D,
    /// Pass provisional: marginal fail eligible for a supplementary exam.
    PP,
    F,
    /// Annulled.
    ANN,
    /// Did not complete.
    DNC,
    /// Deferred.
    DEF,
    /// Exempted.
    EXP,
    /// No mark.
    NM,
}

impl Grade {
    pub const ALL: [Grade; 18] = [
        Grade::APlus,
        Grade::A,
        Grade::AMinus,
        Grade::BPlus,
        Grade::B,
        Grade::BMinus,
        Grade::CPlus,
        Grade::C,
        Grade::CMinus,
        Grade::DPlus,
        Grade::D,
        Grade::PP,
        Grade::F,
        Grade::ANN,
        Grade::DNC,
        Grade::DEF,
        Grade::EXP,
        Grade::NM,
    ];

    pub fn points(self) -> f64 {
        match self {
            Grade::APlus | Grade::A => 4.0,
            Grade::AMinus => 3.67,
            Grade::BPlus => 3.33,
            Grade::B => 3.0,
            Grade::BMinus => 2.67,
            Grade::CPlus => 2.33,
            Grade::C => 2.0,
            Grade::CMinus => 1.67,
            Grade::DPlus => 1.33,
            Grade::D => 1.0,
            Grade::PP
            | Grade::F
            | Grade::ANN
            | Grade::DNC
            | Grade::DEF
            | Grade::EXP
            | Grade::NM => 0.0,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Grade::APlus => "Pass with Distinction",
            Grade::A => "Pass with Distinction",
            Grade::AMinus => "Pass with Distinction",
            Grade::BPlus => "Pass with Merit",
            Grade::B => "Pass with Merit",
            Grade::BMinus => "Pass with Merit",
            Grade::CPlus => "Pass",
            Grade::C => "Pass",
            Grade::CMinus => "Pass",
            Grade::DPlus => "Marginal Pass",
            Grade::D => "Marginal Pass",
            Grade::PP => "Pass Provisional",
            Grade::F => "Fail",
            Grade::ANN => "Result Annulled",
            Grade::DNC => "Did Not Complete",
            Grade::DEF => "Deferred",
            Grade::EXP => "Exempted",
            Grade::NM => "No Mark",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::AMinus => "A-",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::BMinus => "B-",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::CMinus => "C-",
            Grade::DPlus => "D+",
            Grade::D => "D",
            Grade::PP => "PP",
            Grade::F => "F",
            Grade::ANN => "ANN",
            Grade::DNC => "DNC",
            Grade::DEF => "DEF",
            Grade::EXP => "EXP",
            Grade::NM => "NM",
        }
    }

    /// A grade that represents an actual result rather than a placeholder.
    pub fn is_graded(self) -> bool {
        !matches!(self, Grade::NM)
    }

    /// Credit-bearing pass: D or better.
    pub fn is_pass(self) -> bool {
        self.points() >= 1.0
    }

    /// Maps a percentage mark onto its letter grade. Out-of-range marks are
    /// clamped to 0..=100.
    pub fn from_marks(marks: f64) -> Grade {
        let marks = marks.clamp(0.0, 100.0);
        match marks {
            m if m >= 90.0 => Grade::APlus,
            m if m >= 85.0 => Grade::A,
            m if m >= 80.0 => Grade::AMinus,
            m if m >= 75.0 => Grade::BPlus,
            m if m >= 70.0 => Grade::B,
            m if m >= 65.0 => Grade::BMinus,
            m if m >= 60.0 => Grade::CPlus,
            m if m >= 55.0 => Grade::C,
            m if m >= 50.0 => Grade::CMinus,
            m if m >= 45.0 => Grade::PP,
            _ => Grade::F,
        }
    }
}

impl FromStr for Grade {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let upper = value.trim().to_ascii_uppercase();
        Grade::ALL
            .into_iter()
            .find(|grade| grade.as_str() == upper)
            .ok_or(())
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point value of a stored letter grade. Missing or unrecognised letters
/// score zero.
pub fn grade_point(raw: Option<&str>) -> f64 {
    raw.and_then(|value| value.parse::<Grade>().ok())
        .map(Grade::points)
        .unwrap_or(0.0)
}

/// True when the stored grade is an actual result. Unrecognised letters
/// count as graded since someone entered them.
pub fn is_graded(raw: Option<&str>) -> bool {
    match raw.map(str::trim) {
        None | Some("") => false,
        Some(value) => value.parse::<Grade>().map(Grade::is_graded).unwrap_or(true),
    }
}
