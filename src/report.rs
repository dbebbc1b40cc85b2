//! Per-file and per-page diagnostics collected during a run.

use serde::Serialize;
use std::path::PathBuf;

/// One failed backend call for one node/language.
#[derive(Debug, Clone, Serialize)]
pub struct NodeFailure {
    pub node_id: String,
    pub language: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub name: String,
    /// Detected language, or the configured fallback when detection failed.
    pub detected_language: Option<String>,
    pub detection_fallback: bool,
    /// Payload could not be decoded; the raw payload was passed through.
    pub decode_failed: bool,
    pub nodes_wrapped: usize,
    pub nodes_missing_id: usize,
    pub attributes_written: usize,
    pub attributes_skipped: usize,
    pub failures: Vec<NodeFailure>,
}

impl PageReport {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            detected_language: None,
            detection_fallback: false,
            decode_failed: false,
            nodes_wrapped: 0,
            nodes_missing_id: 0,
            attributes_written: 0,
            attributes_skipped: 0,
            failures: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub pages: Vec<PageReport>,
    /// File-fatal error (unreadable input, unparseable container, unwritable
    /// output). Per-page problems live in `pages` instead.
    pub error: Option<String>,
}

impl FileReport {
    pub fn failed(input: PathBuf, error: String) -> Self {
        Self {
            input,
            output: None,
            pages: Vec::new(),
            error: Some(error),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    pub fn attributes_written(&self) -> usize {
        self.pages.iter().map(|p| p.attributes_written).sum()
    }

    pub fn translation_failures(&self) -> usize {
        self.pages.iter().map(|p| p.failures.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serializes_to_json() {
        let mut page = PageReport::new("Page-1");
        page.detected_language = Some("de".to_string());
        page.attributes_written = 6;
        page.failures.push(NodeFailure {
            node_id: "n1".to_string(),
            language: "fr".to_string(),
            error: "timeout".to_string(),
        });
        let report = FileReport {
            input: PathBuf::from("a.drawio"),
            output: Some(PathBuf::from("out/a.drawio")),
            pages: vec![page],
            error: None,
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["pages"][0]["detected_language"], "de");
        assert_eq!(json["pages"][0]["failures"][0]["language"], "fr");
        assert_eq!(report.attributes_written(), 6);
        assert_eq!(report.translation_failures(), 1);
    }
}
