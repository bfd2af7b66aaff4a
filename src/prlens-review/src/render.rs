//! Markdown report for pull request comments.

use tracing::{debug, info};

use crate::types::{CodeReview, FileReview, Issue};

const PLACEHOLDER_FILENAME: &str = "Unknown File";
const DEFAULT_DESCRIPTION: &str = "No description";
const DEFAULT_SUGGESTION: &str = "No suggestion";
const FILE_SEPARATOR: &str = "\n---\n\n";

/// Render per-file reviews as a markdown document.
///
/// Pure: the same input always produces the same text. An empty input yields
/// a placeholder section rather than an empty string.
pub fn render_markdown(results: &[FileReview]) -> String {
    info!("Starting to generate GitHub markdown review.");

    if results.is_empty() {
        debug!("No reviews to render, emitting placeholder");
        return render_section(PLACEHOLDER_FILENAME, &[], None, 0, 0);
    }

    let sections: Vec<String> = results.iter().map(render_file).collect();

    info!("Completed generating GitHub markdown review.");
    sections.join(FILE_SEPARATOR)
}

fn render_file(review: &FileReview) -> String {
    let filename = if review.filename.trim().is_empty() {
        PLACEHOLDER_FILENAME
    } else {
        review.filename.as_str()
    };

    match &review.code_review {
        CodeReview::Structured(document) => {
            let issues: Vec<&Issue> = document.issues().collect();
            let summary = document.summary_or_default();
            info!(
                "Summary for {}: {} issues, {} critical.",
                filename, summary.total_issues, summary.critical_issues
            );
            render_section(
                filename,
                &issues,
                None,
                summary.total_issues,
                summary.critical_issues,
            )
        }
        CodeReview::Failed(message) => {
            debug!(file = %filename, "Rendering failed review");
            render_section(filename, &[], Some(message), 0, 0)
        }
    }
}

fn render_section(
    filename: &str,
    issues: &[&Issue],
    failure: Option<&str>,
    total: u64,
    critical: u64,
) -> String {
    let mut out = format!("### 📄 `{filename}`\n\n");

    if let Some(message) = failure {
        out.push_str(&format!("> ⚠️ Review failed: {}\n\n", single_line(message)));
    }

    for issue in issues {
        out.push_str(&render_issue(issue));
    }
    if !issues.is_empty() {
        out.push('\n');
    }

    out.push_str(&format!(
        "> 🔎 **Summary**: {total} issue(s), {critical} critical\n"
    ));
    out
}

fn render_issue(issue: &Issue) -> String {
    let line = issue
        .line
        .map(|l| l.to_string())
        .unwrap_or_else(|| "?".to_string());
    let description = issue.description.as_deref().unwrap_or(DEFAULT_DESCRIPTION);
    let suggestion = issue.suggestion.as_deref().unwrap_or(DEFAULT_SUGGESTION);

    format!(
        "- **Line {line}** [{}]: {}\n  💡 _Suggestion_: {}\n",
        issue.issue_type.display_label(),
        single_line(description),
        single_line(suggestion)
    )
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
