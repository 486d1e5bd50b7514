//! GitHub token discovery

use crate::auth::AuthSource;
use crate::error::{Error, Result};
use tokio::process::Command;
use tracing::debug;

/// Environment variables checked for a token, in priority order
const TOKEN_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// GitHub credentials and where they came from
#[derive(Clone)]
pub struct GitHubAuthConfig {
    /// API token
    pub token: String,
    /// Where the token was found
    pub source: AuthSource,
}

impl std::fmt::Debug for GitHubAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubAuthConfig")
            .field("token", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Find a token among the environment variables, via `lookup`
///
/// Blank values are ignored.
pub fn token_from_env(lookup: impl Fn(&str) -> Option<String>) -> Option<GitHubAuthConfig> {
    TOKEN_VARS.iter().find_map(|var| {
        let token = lookup(var)?.trim().to_string();
        if token.is_empty() {
            return None;
        }
        debug!(var, "using GitHub token from environment");
        Some(GitHubAuthConfig {
            token,
            source: AuthSource::EnvVar,
        })
    })
}

/// Resolve GitHub credentials: environment first, then `gh auth token`
pub async fn get_github_auth(host: Option<&str>) -> Result<GitHubAuthConfig> {
    if let Some(auth) = token_from_env(|var| std::env::var(var).ok()) {
        return Ok(auth);
    }

    let mut cmd = Command::new("gh");
    cmd.args(["auth", "token"]);
    if let Some(host) = host {
        cmd.args(["--hostname", host]);
    }

    let output = cmd.output().await.map_err(|e| {
        Error::Auth(format!(
            "no GITHUB_TOKEN or GH_TOKEN set and `gh` could not be run: {e}"
        ))
    })?;

    if !output.status.success() {
        return Err(Error::Auth(format!(
            "`gh auth token` failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(Error::Auth("`gh auth token` returned no token".to_string()));
    }

    debug!("using GitHub token from gh CLI");
    Ok(GitHubAuthConfig {
        token,
        source: AuthSource::Cli,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_github_token_takes_priority() {
        let auth = token_from_env(env(&[("GITHUB_TOKEN", "a"), ("GH_TOKEN", "b")])).unwrap();
        assert_eq!(auth.token, "a");
        assert_eq!(auth.source, AuthSource::EnvVar);
    }

    #[test]
    fn test_falls_back_to_gh_token() {
        let auth = token_from_env(env(&[("GH_TOKEN", "b")])).unwrap();
        assert_eq!(auth.token, "b");
    }

    #[test]
    fn test_blank_token_is_ignored() {
        assert!(token_from_env(env(&[("GITHUB_TOKEN", "  ")])).is_none());
        let auth = token_from_env(env(&[("GITHUB_TOKEN", ""), ("GH_TOKEN", "x\n")])).unwrap();
        assert_eq!(auth.token, "x");
    }

    #[test]
    fn test_debug_redacts_token() {
        let auth = token_from_env(env(&[("GITHUB_TOKEN", "secret")])).unwrap();
        assert!(!format!("{auth:?}").contains("secret"));
    }
}
