//! Review data model.
//!
//! The shapes here mirror the JSON document the language model is asked to
//! produce. Deserialization is deliberately lenient: model output is
//! expected-but-not-guaranteed to match, so absent or mistyped fields fall
//! back to defaults instead of rejecting the whole response.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{Result, ReviewError};

/// Filename recorded when the originating task could not be identified.
pub const UNKNOWN_FILENAME: &str = "unknown";

/// One changed file queued for review, with its pull request address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTask {
    pub filename: String,
    pub content: String,
    pub owner: String,
    pub repo: String,
    pub pr_number: u64,
}

impl FileTask {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
            owner: String::new(),
            repo: String::new(),
            pr_number: 0,
        }
    }

    pub fn with_pull_request(
        mut self,
        owner: impl Into<String>,
        repo: impl Into<String>,
        pr_number: u64,
    ) -> Self {
        self.owner = owner.into();
        self.repo = repo.into();
        self.pr_number = pr_number;
        self
    }

    /// Check the fields the analyzer cannot work without.
    pub fn validate(&self) -> Result<()> {
        if self.filename.trim().is_empty() {
            return Err(ReviewError::MissingField("filename"));
        }
        Ok(())
    }

    /// True when there is nothing to review.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Category of a review finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Bug,
    Style,
    Performance,
    BestPractice,
    Readability,
    FutureRisk,
    #[default]
    Info,
}

impl IssueType {
    /// Parse a model-supplied label. Unknown labels become `Info`.
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "bug" => Self::Bug,
            "style" => Self::Style,
            "performance" => Self::Performance,
            "best_practice" => Self::BestPractice,
            "readability" => Self::Readability,
            "future_risk" => Self::FutureRisk,
            _ => Self::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bug => "bug",
            Self::Style => "style",
            Self::Performance => "performance",
            Self::BestPractice => "best_practice",
            Self::Readability => "readability",
            Self::FutureRisk => "future_risk",
            Self::Info => "info",
        }
    }

    /// Label used in the report: the wire name with its first letter upper-cased.
    pub fn display_label(&self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        }
    }
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding reported by the model.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type", default, deserialize_with = "lenient_issue_type")]
    pub issue_type: IssueType,
    #[serde(default, deserialize_with = "lenient_line")]
    pub line: Option<u64>,
    #[serde(default, alias = "issue", deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub suggestion: Option<String>,
}

impl Issue {
    pub fn new(issue_type: IssueType, description: impl Into<String>) -> Self {
        Self {
            issue_type,
            line: None,
            description: Some(description.into()),
            suggestion: None,
        }
    }

    pub fn at_line(mut self, line: u64) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Findings grouped under one file entry of a review document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileFindings {
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub issues: Vec<Issue>,
}

/// Issue counts for a review document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReviewSummary {
    #[serde(
        default,
        deserialize_with = "lenient_optional_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_files: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_issues: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub critical_issues: u64,
}

/// The structured review the model returns for one file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReviewDocument {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub files: Vec<FileFindings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<ReviewSummary>,
}

impl ReviewDocument {
    /// A document with no findings and a zeroed summary.
    pub fn empty() -> Self {
        Self {
            files: Vec::new(),
            summary: Some(ReviewSummary::default()),
        }
    }

    /// Wrap a bare issue list into the canonical document shape.
    ///
    /// Bugs are counted as critical, since a bare list carries no summary.
    pub fn from_issues(filename: &str, issues: Vec<Issue>) -> Self {
        let critical = issues
            .iter()
            .filter(|i| i.issue_type == IssueType::Bug)
            .count() as u64;
        let total = issues.len() as u64;
        Self {
            files: vec![FileFindings {
                name: Some(filename.to_string()),
                issues,
            }],
            summary: Some(ReviewSummary {
                total_files: Some(1),
                total_issues: total,
                critical_issues: critical,
            }),
        }
    }

    /// All issues across every file entry, in document order.
    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.files.iter().flat_map(|f| f.issues.iter())
    }

    /// The model-reported summary, zeroed when absent.
    pub fn summary_or_default(&self) -> ReviewSummary {
        self.summary.clone().unwrap_or_default()
    }
}

/// Outcome of reviewing one file: a document, or the text of whatever went wrong.
///
/// Serialized untagged, so a failure appears as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CodeReview {
    Structured(ReviewDocument),
    Failed(String),
}

impl CodeReview {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn document(&self) -> Option<&ReviewDocument> {
        match self {
            Self::Structured(doc) => Some(doc),
            Self::Failed(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Structured(_) => None,
            Self::Failed(msg) => Some(msg),
        }
    }
}

/// Review result for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReview {
    pub filename: String,
    pub code_review: CodeReview,
}

impl FileReview {
    pub fn structured(filename: impl Into<String>, document: ReviewDocument) -> Self {
        Self {
            filename: filename.into(),
            code_review: CodeReview::Structured(document),
        }
    }

    pub fn failed(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            code_review: CodeReview::Failed(message.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.code_review.is_failed()
    }
}

fn lenient_issue_type<'de, D>(deserializer: D) -> std::result::Result<IssueType, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(label)) => IssueType::from_label(&label),
        _ => IssueType::Info,
    })
}

fn lenient_line<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

fn lenient_count<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_optional_count(deserializer)?.unwrap_or(0))
}

fn lenient_optional_count<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_vec<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    // Entries that do not fit the expected shape are dropped individually.
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_issue_type_labels() {
        assert_eq!(IssueType::from_label("Bug"), IssueType::Bug);
        assert_eq!(IssueType::from_label("best-practice"), IssueType::BestPractice);
        assert_eq!(IssueType::from_label("future risk"), IssueType::FutureRisk);
        assert_eq!(IssueType::from_label("security"), IssueType::Info);
        assert_eq!(IssueType::BestPractice.display_label(), "Best_practice");
        assert_eq!(IssueType::Style.display_label(), "Style");
    }

    #[test]
    fn test_lenient_issue_fields() {
        let issue: Issue = serde_json::from_value(json!({
            "type": null,
            "line": "42",
            "issue": "legacy key",
            "suggestion": 7
        }))
        .unwrap();

        assert_eq!(issue.issue_type, IssueType::Info);
        assert_eq!(issue.line, Some(42));
        assert_eq!(issue.description.as_deref(), Some("legacy key"));
        assert_eq!(issue.suggestion, None);
    }

    #[test]
    fn test_lenient_summary_and_file_name() {
        let doc: ReviewDocument = serde_json::from_value(json!({
            "files": [{"name": 7, "issues": [{"type": "bug", "line": 1, "description": "boom"}]}],
            "summary": {"total_files": "1", "total_issues": 1, "critical_issues": 1}
        }))
        .unwrap();

        assert_eq!(doc.files.len(), 1);
        assert_eq!(doc.files[0].name, None);
        assert_eq!(doc.issues().count(), 1);
        assert_eq!(doc.summary_or_default().total_files, Some(1));

        let doc: ReviewDocument = serde_json::from_value(json!({
            "summary": {"total_files": "several", "total_issues": 0}
        }))
        .unwrap();
        assert_eq!(doc.summary_or_default().total_files, None);
    }

    #[test]
    fn test_document_defaults_when_fields_absent() {
        let doc: ReviewDocument = serde_json::from_value(json!({})).unwrap();
        assert!(doc.files.is_empty());
        assert_eq!(doc.summary_or_default(), ReviewSummary::default());
    }

    #[test]
    fn test_code_review_untagged() {
        let failed: CodeReview = serde_json::from_value(json!("LLM crashed")).unwrap();
        assert_eq!(failed.error_message(), Some("LLM crashed"));

        let structured: CodeReview = serde_json::from_value(json!({
            "files": [],
            "summary": {"total_issues": 0, "critical_issues": 0}
        }))
        .unwrap();
        assert_eq!(structured, CodeReview::Structured(ReviewDocument::empty()));
        assert_eq!(
            serde_json::to_value(&structured).unwrap(),
            json!({"files": [], "summary": {"total_issues": 0, "critical_issues": 0}})
        );
    }

    #[test]
    fn test_from_issues_counts_bugs_as_critical() {
        let doc = ReviewDocument::from_issues(
            "a.py",
            vec![
                Issue::new(IssueType::Bug, "null deref").at_line(3),
                Issue::new(IssueType::Style, "naming"),
            ],
        );
        let summary = doc.summary_or_default();
        assert_eq!(summary.total_issues, 2);
        assert_eq!(summary.critical_issues, 1);
        assert_eq!(doc.files[0].name.as_deref(), Some("a.py"));
        assert_eq!(doc.issues().count(), 2);
    }

    #[test]
    fn test_file_task_validation() {
        assert!(FileTask::new("a.py", "x=1").validate().is_ok());
        let err = FileTask::new("  ", "x=1").validate().unwrap_err();
        assert!(err.to_string().contains("filename"));
        assert!(FileTask::new("a.py", "\n  \n").is_blank());
    }
}
