//! Review prompt for the language model.

/// Prompt for reviewing a single changed file.
const FILE_REVIEW_PROMPT: &str = r#"You are a senior software engineer reviewing a pull request.

Your review should follow professional standards as outlined here:
https://google.github.io/eng-practices/review/reviewer/standard.html

Please analyze the following file and return your review as a JSON object in the following format:

{
    "files": [
        {
            "name": "{filename}",
            "issues": [
                {
                    "type": "bug" | "style" | "performance" | "best_practice" | "readability" | "future_risk",
                    "line": <line_number>,
                    "description": "<clear explanation of the issue or concern>",
                    "suggestion": "<concise, actionable recommendation>"
                },
                ...
            ]
        }
    ],
    "summary": {
        "total_files": <number_of_files_reviewed>,
        "total_issues": <total_number_of_issues_found>,
        "critical_issues": <number_of_critical_issues>
    }
}

Guidelines:
- Identify any potential **bugs or logic errors**.
- Flag violations of **style, naming, or formatting conventions**.
- Suggest improvements for **readability, maintainability**, and **performance**.
- Warn about **future risks**, such as fragile logic, unhandled edge cases, or scalability bottlenecks.
- Only flag real issues; do not invent problems or give vague advice.
- Focus on improving what is already there rather than rewriting it.

Now review the following file:

File: {filename}
Code:
{code}

Only output the JSON object, nothing else."#;

/// Build the review prompt for one file.
///
/// Placeholders are substituted in one pass over the template, so a
/// placeholder appearing in either value is left as written.
pub fn build_review_prompt(filename: &str, code: &str) -> String {
    let mut out =
        String::with_capacity(FILE_REVIEW_PROMPT.len() + 2 * filename.len() + code.len());
    let mut rest = FILE_REVIEW_PROMPT;

    while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if let Some(after) = tail.strip_prefix("{filename}") {
            out.push_str(filename);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{code}") {
            out.push_str(code);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}
