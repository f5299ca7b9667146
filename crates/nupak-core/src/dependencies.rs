//! `nupak.dependencies`: the user's direct requirements.
//!
//! A line-oriented grammar; `#` and `//` start comments.
//!
//! ```text
//! references strict
//! source https://nuget.org/api/v2
//! nuget Castle.Windsor >= 3.2.1
//! nuget Nancy ~> 0.23
//! nuget log4net !>= 1.2.10
//! github fsharp/FAKE src/app/FAKE/Cli.fs
//! github fsharp/FAKE:0bd81e3 src/app/Fake.Deploy/Deploy.fs
//! ```
//!
//! A `nuget` line searches every `source` declared above it. A range
//! prefixed with `!` overrides what transitive dependencies ask for.

use std::path::Path;

use miette::Diagnostic;
use thiserror::Error;

use crate::lockfile::SourceFile;
use crate::range::VersionRange;
use crate::requirement::PackageRequirement;
use crate::source::PackageSource;

/// Parsed contents of a `nupak.dependencies` file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependenciesFile {
    pub strict: bool,
    /// Every `source` line, in declaration order.
    pub sources: Vec<PackageSource>,
    pub requirements: Vec<PackageRequirement>,
    pub remote_files: Vec<SourceFile>,
}

/// A malformed line in a dependencies file.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
#[error("line {line}: {reason}")]
#[diagnostic(code(nupak::dependencies::parse))]
pub struct DependenciesError {
    pub line: usize,
    pub reason: String,
}

impl DependenciesFile {
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            nupak_util::errors::NupakError::Dependencies {
                message: format!("Failed to read {}: {e}", path.display()),
            }
        })?;
        Self::parse(&content).map_err(|e| {
            nupak_util::errors::NupakError::Dependencies {
                message: format!("{}: {e}", path.display()),
            }
            .into()
        })
    }

    pub fn parse(text: &str) -> Result<Self, DependenciesError> {
        let mut file = DependenciesFile::default();

        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let fail = |reason: String| DependenciesError { line, reason };
            let content = strip_comment(raw).trim();
            if content.is_empty() {
                continue;
            }

            let (directive, rest) = match content.split_once(char::is_whitespace) {
                Some((d, r)) => (d, r.trim()),
                None => (content, ""),
            };
            match directive {
                "references" => {
                    if rest != "strict" {
                        return Err(fail(format!("unknown references mode '{rest}'")));
                    }
                    file.strict = true;
                }
                "source" => {
                    if rest.is_empty() {
                        return Err(fail("source needs a URL or path".to_string()));
                    }
                    let source = PackageSource::parse(rest);
                    if !file.sources.contains(&source) {
                        file.sources.push(source);
                    }
                }
                "nuget" => {
                    let (name, range_text) = match rest.split_once(char::is_whitespace) {
                        Some((n, r)) => (n, r.trim()),
                        None => (rest, ""),
                    };
                    if name.is_empty() {
                        return Err(fail("nuget needs a package name".to_string()));
                    }
                    let (overrides, range_text) = match range_text.strip_prefix('!') {
                        Some(r) => (true, r),
                        None => (false, range_text),
                    };
                    let range = VersionRange::parse(range_text).map_err(|e| fail(e.to_string()))?;
                    let mut requirement =
                        PackageRequirement::new(name, range, file.sources.clone());
                    requirement.overrides = overrides;
                    file.requirements.push(requirement);
                }
                "github" => file.remote_files.push(parse_github(rest).map_err(fail)?),
                other => return Err(fail(format!("unknown directive '{other}'"))),
            }
        }

        Ok(file)
    }

    /// Fill in `defaults` for requirements that were declared without any
    /// `source` line above them.
    pub fn with_default_sources(mut self, defaults: &[PackageSource]) -> Self {
        for requirement in &mut self.requirements {
            if requirement.sources.is_empty() {
                requirement.sources = defaults.to_vec();
            }
        }
        self
    }
}

fn strip_comment(line: &str) -> &str {
    // A marker only opens a comment at the start of the line or after
    // whitespace, so `https://` stays intact.
    let cut = line
        .match_indices('#')
        .chain(line.match_indices("//"))
        .map(|(pos, _)| pos)
        .filter(|&pos| pos == 0 || line.as_bytes()[pos - 1].is_ascii_whitespace())
        .min();
    match cut {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn parse_github(rest: &str) -> Result<SourceFile, String> {
    let (repo, path) = rest
        .split_once(char::is_whitespace)
        .ok_or_else(|| "github needs 'owner/project[:commit] path'".to_string())?;
    let (repo, commit) = match repo.split_once(':') {
        Some((r, c)) if !c.is_empty() => (r, Some(c.to_string())),
        Some(_) => return Err("empty commit after ':'".to_string()),
        None => (repo, None),
    };
    let (owner, project) = repo
        .split_once('/')
        .filter(|(o, p)| !o.is_empty() && !p.is_empty() && !p.contains('/'))
        .ok_or_else(|| format!("'{repo}' is not of the form owner/project"))?;
    Ok(SourceFile {
        owner: owner.to_string(),
        project: project.to_string(),
        path: path.trim().to_string(),
        commit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_are_stripped() {
        assert_eq!(strip_comment("nuget Foo # pinned"), "nuget Foo ");
        assert_eq!(strip_comment("// whole line"), "");
        assert_eq!(
            strip_comment("source https://nuget.org/api/v2"),
            "source https://nuget.org/api/v2"
        );
        assert_eq!(
            strip_comment("source https://nuget.org/api/v2 // main feed"),
            "source https://nuget.org/api/v2 "
        );
        assert_eq!(strip_comment("source http://host/a#b # note"), "source http://host/a#b ");
    }

    #[test]
    fn github_with_and_without_commit() {
        let file = parse_github("fsharp/FAKE src/Cli.fs").unwrap();
        assert_eq!(file.commit, None);
        let file = parse_github("fsharp/FAKE:abc123 src/Cli.fs").unwrap();
        assert_eq!(file.commit.as_deref(), Some("abc123"));
        assert!(parse_github("fsharp src/Cli.fs").is_err());
        assert!(parse_github("fsharp/FAKE").is_err());
    }
}
