//! Repository addressing.

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::{Result, TaskError};

/// The pull request a task works on, plus the credential used to reach it.
#[derive(Debug)]
pub struct PullRequestContext {
    pub owner: String,
    pub repo: String,
    pub number: u64,
    token: SecretString,
}

impl PullRequestContext {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        number: u64,
        token: SecretString,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            number,
            token,
        }
    }

    /// Access token for the repository host.
    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }

    /// `owner/repo#number`, for logs.
    pub fn slug(&self) -> String {
        format!("{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// Split a repository URL into `(owner, repo)`.
///
/// Accepts `https://host/owner/repo[.git][/...]` and the `owner/repo` shorthand.
pub fn parse_repo_url(input: &str) -> Result<(String, String)> {
    let trimmed = input.trim();
    let invalid = || TaskError::InvalidRepoUrl(input.to_string());

    let segments: Vec<String> = if trimmed.contains("://") {
        let url = Url::parse(trimmed).map_err(|_| invalid())?;
        url.path_segments()
            .map(|parts| {
                parts
                    .filter(|p| !p.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    } else {
        let parts: Vec<String> = trimmed.split('/').map(String::from).collect();
        if parts.len() != 2 {
            return Err(invalid());
        }
        parts
    };

    if segments.len() < 2 {
        return Err(invalid());
    }

    let owner = segments[0].clone();
    let repo = segments[1].trim_end_matches(".git").to_string();
    if owner.is_empty() || repo.is_empty() {
        return Err(invalid());
    }

    tracing::info!("Parsed repo URL: owner={}, repo={}", owner, repo);
    Ok((owner, repo))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repo_url() {
        let (owner, repo) = parse_repo_url("https://github.com/user/repo-name").unwrap();
        assert_eq!(owner, "user");
        assert_eq!(repo, "repo-name");
    }

    #[test]
    fn test_parse_repo_url_variants() {
        assert_eq!(
            parse_repo_url("https://github.com/user/repo.git").unwrap(),
            ("user".to_string(), "repo".to_string())
        );
        assert_eq!(
            parse_repo_url("https://ghe.example.com/org/svc/pull/7/").unwrap(),
            ("org".to_string(), "svc".to_string())
        );
        assert_eq!(
            parse_repo_url("user/repo").unwrap(),
            ("user".to_string(), "repo".to_string())
        );
    }

    #[test]
    fn test_parse_repo_url_invalid() {
        assert!(parse_repo_url("").is_err());
        assert!(parse_repo_url("invalid").is_err());
        assert!(parse_repo_url("too/many/parts").is_err());
        assert!(parse_repo_url("https://github.com/only-owner").is_err());
        assert!(parse_repo_url("/repo").is_err());
    }

    #[test]
    fn test_context_hides_token() {
        let ctx = PullRequestContext::new("o", "r", 5, SecretString::from("ghp_secret".to_string()));
        assert_eq!(ctx.token(), "ghp_secret");
        assert_eq!(ctx.slug(), "o/r#5");
        assert!(!format!("{ctx:?}").contains("ghp_secret"));
    }
}
