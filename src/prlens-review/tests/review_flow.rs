use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use prlens_review::{AnalysisCapability, Analyzer, FileTask, render_markdown};

/// Replies with a bare issue list for Python files and prose for anything else.
struct LooseModel;

#[async_trait]
impl AnalysisCapability for LooseModel {
    async fn invoke(&self, prompt: &str) -> anyhow::Result<String> {
        if prompt.contains("File: main.py") {
            return Ok(r#"[
                {"type": "bug", "line": "4", "issue": "Unchecked index"},
                {"type": "naming", "line": null, "description": "Vague name", "suggestion": "Rename `x`"}
            ]"#
            .to_string());
        }
        Ok("Looks fine to me!".to_string())
    }
}

#[tokio::test]
async fn test_analyze_then_render() {
    let analyzer = Analyzer::new(Arc::new(LooseModel));

    let reviews = vec![
        analyzer
            .analyze(&FileTask::new("main.py", "x = items[4]"))
            .await,
        analyzer.analyze(&FileTask::new("notes.txt", "hello")).await,
    ];

    assert!(!reviews[0].is_failed());
    assert!(reviews[1].is_failed());

    let markdown = render_markdown(&reviews);
    let expected_first = "### 📄 `main.py`\n\n\
        - **Line 4** [Bug]: Unchecked index\n  💡 _Suggestion_: No suggestion\n\
        - **Line ?** [Info]: Vague name\n  💡 _Suggestion_: Rename `x`\n\
        \n\
        > 🔎 **Summary**: 2 issue(s), 1 critical\n";

    assert!(markdown.starts_with(expected_first), "{markdown}");
    assert!(markdown.contains(
        "\n---\n\n### 📄 `notes.txt`\n\n> ⚠️ Review failed: expected value at line 1 column 1\n"
    ));
    assert!(markdown.ends_with("> 🔎 **Summary**: 0 issue(s), 0 critical\n"));
    assert_eq!(markdown, render_markdown(&reviews));
}
