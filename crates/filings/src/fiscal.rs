//! Fiscal period extraction from submission headers.
//!
//! Only the first [`HEADER_SCAN_LINES`] lines of a bundle's full submission
//! are read. Two labeled header fields are matched:
//!
//! ```text
//! CONFORMED PERIOD OF REPORT:	20250930
//!         FISCAL YEAR END:			1231
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

use chrono::NaiveDate;
use filings_core::{FilingsError, FiscalPeriod, Result};
use regex::Regex;

/// Name of the submission file holding the header.
pub const SUBMISSION_FILE: &str = "full-submission.txt";

/// Number of leading lines scanned for header fields.
pub const HEADER_SCAN_LINES: usize = 30;

static PERIOD_OF_REPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"CONFORMED PERIOD OF REPORT:\s+(\d{8})").expect("valid period regex")
});

static FISCAL_YEAR_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"FISCAL YEAR END:\s+(\d{4})").expect("valid fiscal year regex"));

/// Header fields recovered from a submission. Either may be missing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeaderFields {
    /// Reporting period end date.
    pub period_end: Option<NaiveDate>,
    /// Month (1-12) of the fiscal year end.
    pub fiscal_year_end_month: Option<u32>,
}

impl HeaderFields {
    /// Scan at most [`HEADER_SCAN_LINES`] lines. Invalid UTF-8 is tolerated.
    pub fn scan<R: BufRead>(mut reader: R) -> Result<Self> {
        let mut fields = Self::default();
        let mut buf = Vec::new();

        for _ in 0..HEADER_SCAN_LINES {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);

            if fields.period_end.is_none()
                && let Some(caps) = PERIOD_OF_REPORT.captures(&line)
            {
                fields.period_end = NaiveDate::parse_from_str(&caps[1], "%Y%m%d").ok();
            }

            if fields.fiscal_year_end_month.is_none()
                && let Some(caps) = FISCAL_YEAR_END.captures(&line)
            {
                fields.fiscal_year_end_month = caps[1][..2]
                    .parse()
                    .ok()
                    .filter(|m| (1..=12).contains(m));
            }

            if fields.is_complete() {
                break;
            }
        }

        Ok(fields)
    }

    /// Returns true if both fields were found.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.period_end.is_some() && self.fiscal_year_end_month.is_some()
    }

    /// Combine both fields into a fiscal period.
    ///
    /// Fails when either field is missing; a December year end is never assumed.
    pub fn fiscal_period(&self) -> Result<FiscalPeriod> {
        let period_end = self.period_end.ok_or_else(|| {
            FilingsError::Parse("CONFORMED PERIOD OF REPORT missing from header".to_string())
        })?;
        let month = self.fiscal_year_end_month.ok_or_else(|| {
            FilingsError::Parse("FISCAL YEAR END missing from header".to_string())
        })?;
        FiscalPeriod::new(period_end, month)
    }
}

/// Read the header fields of a bundle's submission file.
pub fn extract(bundle_dir: &Path) -> Result<HeaderFields> {
    let path = bundle_dir.join(SUBMISSION_FILE);
    let file = File::open(&path)
        .map_err(|e| FilingsError::Io(format!("{}: {}", path.display(), e)))?;
    HeaderFields::scan(BufReader::new(file))
}

/// Read a bundle's fiscal period, failing closed on any missing field.
pub fn extract_period(bundle_dir: &Path) -> Result<FiscalPeriod> {
    extract(bundle_dir)?.fiscal_period()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{submission_header, write_bundle};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn scan(text: &str) -> HeaderFields {
        HeaderFields::scan(Cursor::new(text.as_bytes())).unwrap()
    }

    #[test]
    fn test_scan_full_header() {
        let fields = scan(&submission_header("10-Q", Some("20250930"), Some("1231")));
        assert_eq!(fields.period_end, NaiveDate::from_ymd_opt(2025, 9, 30));
        assert_eq!(fields.fiscal_year_end_month, Some(12));

        let period = fields.fiscal_period().unwrap();
        assert_eq!(period.quarter(), 3);
        assert_eq!(period.year(), 2025);
    }

    #[test]
    fn test_non_calendar_fiscal_year() {
        let fields = scan(&submission_header("10-K", Some("20250131"), Some("0131")));
        assert_eq!(fields.fiscal_year_end_month, Some(1));
        assert_eq!(fields.fiscal_period().unwrap().quarter(), 4);
    }

    #[test]
    fn test_missing_fiscal_year_end_fails_closed() {
        let fields = scan(&submission_header("8-K", Some("20250115"), None));
        assert!(fields.period_end.is_some());
        assert_eq!(fields.fiscal_year_end_month, None);
        assert!(fields.fiscal_period().is_err());
    }

    #[test]
    fn test_missing_period_fails_closed() {
        let fields = scan(&submission_header("DEF 14A", None, Some("1231")));
        assert_eq!(fields.period_end, None);
        assert!(fields.fiscal_period().is_err());
    }

    #[test]
    fn test_fields_beyond_scan_window_are_ignored() {
        let mut text = "filler\n".repeat(HEADER_SCAN_LINES);
        text.push_str("CONFORMED PERIOD OF REPORT:\t20250930\n");
        text.push_str("FISCAL YEAR END:\t1231\n");

        assert_eq!(scan(&text), HeaderFields::default());
    }

    #[test]
    fn test_invalid_values_are_missing() {
        let fields = scan("CONFORMED PERIOD OF REPORT:\t20251340\nFISCAL YEAR END:\t1331\n");
        assert_eq!(fields, HeaderFields::default());
    }

    #[test]
    fn test_invalid_utf8_is_tolerated() {
        let mut bytes = b"\xff\xfe garbage\n".to_vec();
        bytes.extend_from_slice(b"CONFORMED PERIOD OF REPORT:\t20240630\n");
        bytes.extend_from_slice(b"\tFISCAL YEAR END:\t\t0630\n");

        let fields = HeaderFields::scan(Cursor::new(bytes)).unwrap();
        assert_eq!(fields.fiscal_period().unwrap().quarter(), 4);
    }

    #[test]
    fn test_extract_from_bundle() {
        let dir = TempDir::new().unwrap();
        let bundle = write_bundle(
            dir.path(),
            "0000012345-24-000030",
            "10-Q",
            Some("20240930"),
            Some("1231"),
        );

        let period = extract_period(&bundle).unwrap();
        assert_eq!(period.quarter(), 3);
    }

    #[test]
    fn test_missing_submission_file() {
        let dir = TempDir::new().unwrap();
        let err = extract(dir.path()).unwrap_err();
        assert!(matches!(err, FilingsError::Io(_)));
    }
}
