//! Core data types for filing acquisition.
//!
//! This module defines the fundamental data structures:
//!
//! - [`Symbol`] - Trading symbol/ticker
//! - [`Entity`] - A roster member and the identifier the archive knows it by
//! - [`FiscalPeriod`] - Reporting period end and fiscal year end month

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FilingsError;

/// A trading symbol/ticker.
///
/// Symbols are automatically uppercased on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol from a string, converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_uppercase())
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A roster member.
///
/// `archive_id` is what the archive is queried with and what the staging
/// directory is keyed by. It equals the symbol unless the ticker was retired
/// and a registry identifier (CIK) stands in for it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    /// Public ticker symbol.
    pub symbol: Symbol,
    /// Identifier the archive expects.
    pub archive_id: String,
}

impl Entity {
    /// Creates an entity whose archive identifier is the symbol itself.
    #[must_use]
    pub fn new(symbol: Symbol) -> Self {
        let archive_id = symbol.as_str().to_string();
        Self { symbol, archive_id }
    }

    /// Sets a substitute archive identifier.
    #[must_use]
    pub fn with_archive_id(mut self, archive_id: impl Into<String>) -> Self {
        self.archive_id = archive_id.into();
        self
    }

    /// Returns true if the archive identifier differs from the symbol.
    #[must_use]
    pub fn is_substituted(&self) -> bool {
        self.archive_id != self.symbol.as_str()
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_substituted() {
            write!(f, "{} ({})", self.symbol, self.archive_id)
        } else {
            write!(f, "{}", self.symbol)
        }
    }
}

/// Reporting period of one filing bundle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FiscalPeriod {
    /// Last day of the reporting period.
    pub period_end: NaiveDate,
    /// Month (1-12) in which the entity's fiscal year ends.
    pub fiscal_year_end_month: u32,
}

impl FiscalPeriod {
    /// Creates a fiscal period, rejecting months outside 1-12.
    pub fn new(period_end: NaiveDate, fiscal_year_end_month: u32) -> crate::Result<Self> {
        if !(1..=12).contains(&fiscal_year_end_month) {
            return Err(FilingsError::InvalidParameter(format!(
                "fiscal year end month out of range: {fiscal_year_end_month}"
            )));
        }
        Ok(Self {
            period_end,
            fiscal_year_end_month,
        })
    }

    /// Calendar year of the period end, as used in bundle names.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.period_end.year()
    }

    /// Fiscal quarter (1-4) relative to the fiscal year end month.
    ///
    /// The quarter ending in the fiscal year end month is Q4.
    #[must_use]
    pub fn quarter(&self) -> u32 {
        fiscal_quarter(self.period_end.month(), self.fiscal_year_end_month)
    }
}

/// Fiscal quarter of a period ending in `period_month` for a fiscal year
/// ending in `fy_end_month`: `4 - (|period_month - fy_end_month| mod 12) / 3`.
///
/// The distance is taken in both directions, so a period month three months
/// after the year end lands in the same quarter as one three months before.
#[must_use]
pub const fn fiscal_quarter(period_month: u32, fy_end_month: u32) -> u32 {
    4 - (period_month.abs_diff(fy_end_month) % 12) / 3
}
