//! Test doubles shared by the pipeline tests.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use filings_core::{Archive, DocumentType, FetchRequest, FilingsError, Result};

/// A filing the scripted archive can serve.
#[derive(Debug, Clone)]
pub(crate) struct StubFiling {
    pub(crate) accession: String,
    pub(crate) period: Option<&'static str>,
    pub(crate) fy_end: Option<&'static str>,
}

impl StubFiling {
    pub(crate) fn new(accession: &str, period: &'static str) -> Self {
        Self {
            accession: accession.to_string(),
            period: Some(period),
            fy_end: Some("1231"),
        }
    }
}

/// Two annual reports, newest first.
pub(crate) fn annual_filings() -> Vec<StubFiling> {
    vec![
        StubFiling::new("0000012345-25-000004", "20241231"),
        StubFiling::new("0000012345-24-000004", "20231231"),
    ]
}

/// Eight quarterly reports with distinct fiscal quarters, newest first.
pub(crate) fn quarterly_filings() -> Vec<StubFiling> {
    [
        ("0000012345-25-000030", "20250930"),
        ("0000012345-25-000020", "20250630"),
        ("0000012345-25-000010", "20250331"),
        ("0000012345-24-000030", "20240930"),
        ("0000012345-24-000020", "20240630"),
        ("0000012345-24-000010", "20240331"),
        ("0000012345-23-000030", "20230930"),
        ("0000012345-23-000020", "20230630"),
    ]
    .into_iter()
    .map(|(accession, period)| StubFiling::new(accession, period))
    .collect()
}

/// Submission header in EDGAR's SGML layout.
pub(crate) fn submission_header(form: &str, period: Option<&str>, fy_end: Option<&str>) -> String {
    let mut header = String::from("<SEC-DOCUMENT>0000012345-25-000001.txt : 20250101\n");
    header.push_str("<SEC-HEADER>0000012345-25-000001.hdr.sgml : 20250101\n");
    header.push_str("ACCESSION NUMBER:\t\t0000012345-25-000001\n");
    header.push_str(&format!("CONFORMED SUBMISSION TYPE:\t{form}\n"));
    header.push_str("PUBLIC DOCUMENT COUNT:\t\t12\n");
    if let Some(period) = period {
        header.push_str(&format!("CONFORMED PERIOD OF REPORT:\t{period}\n"));
    }
    header.push_str("FILED AS OF DATE:\t\t20250101\n");
    header.push_str("DATE AS OF CHANGE:\t\t20250101\n\n");
    header.push_str("FILER:\n\n\tCOMPANY DATA:\t\n");
    header.push_str("\t\tCOMPANY CONFORMED NAME:\t\t\tXYZ BANCORP\n");
    header.push_str("\t\tCENTRAL INDEX KEY:\t\t\t0000012345\n");
    header.push_str("\t\tSTANDARD INDUSTRIAL CLASSIFICATION:\tNATIONAL COMMERCIAL BANKS [6021]\n");
    header.push_str("\t\tSTATE OF INCORPORATION:\t\t\tDE\n");
    if let Some(fy_end) = fy_end {
        header.push_str(&format!("\t\tFISCAL YEAR END:\t\t\t{fy_end}\n"));
    }
    header.push_str("\n\tFILING VALUES:\n\t\tFORM TYPE:\t\t10-Q\n</SEC-HEADER>\n<DOCUMENT>\n");
    header
}

/// Write a bundle with a full submission and a primary document.
pub(crate) fn write_bundle(
    form_dir: &Path,
    accession: &str,
    form: &str,
    period: Option<&str>,
    fy_end: Option<&str>,
) -> PathBuf {
    let bundle = form_dir.join(accession);
    std::fs::create_dir_all(&bundle).unwrap();
    std::fs::write(
        bundle.join("full-submission.txt"),
        submission_header(form, period, fy_end),
    )
    .unwrap();
    std::fs::write(bundle.join("primary-document.htm"), "<html></html>").unwrap();
    bundle
}

/// In-memory archive serving stub filings for any identifier.
#[derive(Debug, Default)]
pub(crate) struct ScriptedArchive {
    filings: HashMap<DocumentType, Vec<StubFiling>>,
    /// Filings held back per call, consumed front to back.
    withheld: Mutex<HashMap<DocumentType, VecDeque<usize>>>,
    /// Filings held back once the per-call script runs out.
    always_withheld: HashMap<DocumentType, usize>,
    /// Number of upcoming calls that fail with a network error.
    failing: Mutex<HashMap<DocumentType, usize>>,
    calls: Mutex<Vec<(String, DocumentType)>>,
    unavailable: bool,
}

impl ScriptedArchive {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Two annual and eight quarterly reports.
    pub(crate) fn xyz() -> Self {
        Self::new()
            .with_filings(DocumentType::AnnualReport, annual_filings())
            .with_filings(DocumentType::QuarterlyReport, quarterly_filings())
    }

    pub(crate) fn with_filings(mut self, doc_type: DocumentType, filings: Vec<StubFiling>) -> Self {
        self.filings.insert(doc_type, filings);
        self
    }

    pub(crate) fn withhold(self, doc_type: DocumentType, per_call: &[usize]) -> Self {
        self.withheld
            .lock()
            .unwrap()
            .insert(doc_type, per_call.iter().copied().collect());
        self
    }

    pub(crate) fn always_withhold(mut self, doc_type: DocumentType, count: usize) -> Self {
        self.always_withheld.insert(doc_type, count);
        self
    }

    pub(crate) fn fail_calls(self, doc_type: DocumentType, count: usize) -> Self {
        self.failing.lock().unwrap().insert(doc_type, count);
        self
    }

    /// Fail the startup probe.
    pub(crate) fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn calls_for(&self, doc_type: DocumentType) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, t)| *t == doc_type)
            .count()
    }

    pub(crate) fn identifiers(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect();
        ids.dedup();
        ids
    }
}

#[async_trait]
impl Archive for ScriptedArchive {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn check_available(&self) -> Result<()> {
        if self.unavailable {
            return Err(FilingsError::Configuration("archive unreachable".to_string()));
        }
        Ok(())
    }

    async fn fetch(&self, request: &FetchRequest<'_>, root: &Path) -> Result<usize> {
        self.calls
            .lock()
            .unwrap()
            .push((request.identifier.to_string(), request.doc_type));

        {
            let mut failing = self.failing.lock().unwrap();
            if let Some(remaining) = failing.get_mut(&request.doc_type)
                && *remaining > 0
            {
                *remaining -= 1;
                return Err(FilingsError::Network("connection reset".to_string()));
            }
        }

        let filings = self
            .filings
            .get(&request.doc_type)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let shortfall = self
            .withheld
            .lock()
            .unwrap()
            .get_mut(&request.doc_type)
            .and_then(VecDeque::pop_front)
            .or_else(|| self.always_withheld.get(&request.doc_type).copied())
            .unwrap_or(0);

        let count = request.limit.min(filings.len()).saturating_sub(shortfall);
        let form = request.doc_type.form();
        let form_dir = root.join(request.identifier).join(form);
        for filing in &filings[..count] {
            write_bundle(&form_dir, &filing.accession, form, filing.period, filing.fy_end);
        }

        Ok(count)
    }
}
