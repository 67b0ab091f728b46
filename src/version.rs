//! Project version from the CMake manifest.

use std::fmt;
use std::fs;
use std::path::Path;

/// Version used to name the portable archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectVersion(String);

impl ProjectVersion {
    pub const UNKNOWN: &'static str = "unknown";

    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_known(&self) -> bool {
        self.0 != Self::UNKNOWN
    }

    /// Read `manifest` and parse its `project(... VERSION x.y.z ...)` call.
    /// Unreadable or unparsable manifests yield `unknown` with a warning.
    pub fn from_manifest(manifest: &Path) -> Self {
        let text = match fs::read_to_string(manifest) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(
                    "could not read {} ({err}); using version '{}'",
                    manifest.display(),
                    Self::UNKNOWN
                );
                return Self::unknown();
            }
        };
        match parse_cmake_project_version(&text) {
            Some(version) => Self(version),
            None => {
                tracing::warn!(
                    "no project VERSION in {}; using version '{}'",
                    manifest.display(),
                    Self::UNKNOWN
                );
                Self::unknown()
            }
        }
    }
}

impl fmt::Display for ProjectVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `VERSION` argument of the first `project()` command, if any.
pub fn parse_cmake_project_version(text: &str) -> Option<String> {
    let lower = text.to_ascii_lowercase();
    let mut search_from = 0;
    while let Some(offset) = lower[search_from..].find("project") {
        let start = search_from + offset;
        search_from = start + "project".len();

        // must be a whole command name, not e.g. `my_project(` or `PROJECT_NAME`
        let preceded_ok = lower[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !(c.is_ascii_alphanumeric() || c == '_'));
        let rest = lower[search_from..].trim_start();
        if !preceded_ok || !rest.starts_with('(') {
            continue;
        }

        let open = search_from + (lower[search_from..].len() - rest.len()) + 1;
        let close = open + text[open..].find(')')?;
        let mut tokens = text[open..close].split_whitespace();
        while let Some(token) = tokens.next() {
            if token.eq_ignore_ascii_case("VERSION") {
                return tokens
                    .next()
                    .map(|v| v.trim_matches('"').to_string())
                    .filter(|v| v.chars().next().is_some_and(|c| c.is_ascii_digit()));
            }
        }
        return None;
    }
    None
}
