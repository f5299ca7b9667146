//! `nupak.lock`: the persisted resolution.
//!
//! ```text
//! REFERENCES: STRICT
//! NUGET
//!   remote: https://nuget.org/api/v2
//!   specs:
//!     Castle.Core (3.3.0)
//!     Castle.Windsor (3.2.1)
//!       Castle.Core (>= 3.2.0)
//! GITHUB
//!   remote: fsharp/FAKE
//!   specs:
//!     src/app/FAKE/Cli.fs (0bd81e3)
//! ```
//!
//! Serialization is a pure function of the [`LockFile`] value, and parsing
//! its output yields the same value back.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use miette::Diagnostic;
use thiserror::Error;

use crate::name::{PackageKey, PackageName};
use crate::range::VersionRange;
use crate::resolution::{PackageResolution, ResolvedPackage};
use crate::source::PackageSource;
use crate::version::SemVer;

const STRICT_LINE: &str = "REFERENCES: STRICT";
const NUGET_HEADER: &str = "NUGET";
const GITHUB_HEADER: &str = "GITHUB";
const REMOTE_PREFIX: &str = "remote:";
const SPECS_LINE: &str = "specs:";

const REMOTE_INDENT: usize = 2;
const ENTRY_INDENT: usize = 4;
const DEPENDENCY_INDENT: usize = 6;

/// A single file pinned from a remote code repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub owner: String,
    pub project: String,
    pub path: String,
    /// The pinned commit, or `None` when the file follows the default branch.
    pub commit: Option<String>,
}

impl SourceFile {
    pub fn commit_specified(&self) -> bool {
        self.commit.is_some()
    }

    /// Ordering key: owner, project, then path, case-insensitively. Exact
    /// spellings break ties so files of one repository stay contiguous.
    fn sort_key(&self) -> (String, String, &str, &str, String, &str) {
        (
            self.owner.to_lowercase(),
            self.project.to_lowercase(),
            &self.owner,
            &self.project,
            self.path.to_lowercase(),
            &self.path,
        )
    }
}

/// Deterministic lock file recording exact resolved package versions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LockFile {
    /// Whether consumers may only reference explicitly listed packages.
    pub strict: bool,
    pub resolution: PackageResolution,
    /// Pinned remote files, kept in owner/project/path order by every
    /// constructor.
    source_files: Vec<SourceFile>,
}

/// Structural error while parsing a lock file.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
#[error("line {line}: {reason}")]
#[diagnostic(code(nupak::lockfile::parse))]
pub struct LockFileError {
    /// 1-based line number.
    pub line: usize,
    pub reason: String,
}

impl LockFileError {
    fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Nuget,
    GitHub,
}

impl LockFile {
    pub fn new(strict: bool, resolution: PackageResolution, mut source_files: Vec<SourceFile>) -> Self {
        source_files.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Self {
            strict,
            resolution,
            source_files,
        }
    }

    /// Pinned remote files in owner/project/path order.
    pub fn source_files(&self) -> &[SourceFile] {
        &self.source_files
    }

    /// Load and parse a `nupak.lock` file from the given path.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| nupak_util::errors::NupakError::LockFile {
                message: format!("Failed to read {}: {e}", path.display()),
            })?;
        Self::parse(&content).map_err(|e| {
            nupak_util::errors::NupakError::LockFile {
                message: format!("Failed to parse {}: {e}", path.display()),
            }
            .into()
        })
    }

    /// Serialize and atomically replace the file at `path`.
    pub fn write_to(&self, path: &Path) -> miette::Result<()> {
        nupak_util::fs::write_atomic(path, self.serialize().as_bytes())
            .map_err(nupak_util::errors::NupakError::Io)?;
        tracing::debug!(
            path = %path.display(),
            packages = self.resolution.len(),
            files = self.source_files.len(),
            "wrote lock file"
        );
        Ok(())
    }

    /// Render the lock file text.
    pub fn serialize(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        if self.strict {
            lines.push(STRICT_LINE.to_string());
        }

        if !self.resolution.is_empty() {
            lines.push(NUGET_HEADER.to_string());
            for (source, packages) in group_by_source(&self.resolution) {
                lines.push(format!("  {REMOTE_PREFIX} {source}"));
                lines.push(format!("  {SPECS_LINE}"));
                for package in packages {
                    lines.push(format!("    {} ({})", package.name, package.version));
                    for (name, range) in &package.dependencies {
                        lines.push(match range {
                            VersionRange::NoRestriction => format!("      {name}"),
                            _ => format!("      {name} ({range})"),
                        });
                    }
                }
            }
        }

        if !self.source_files.is_empty() {
            lines.push(GITHUB_HEADER.to_string());
            let mut current: Option<(&str, &str)> = None;
            for file in &self.source_files {
                let repo = (file.owner.as_str(), file.project.as_str());
                if current != Some(repo) {
                    lines.push(format!("  {REMOTE_PREFIX} {}/{}", file.owner, file.project));
                    lines.push(format!("  {SPECS_LINE}"));
                    current = Some(repo);
                }
                lines.push(match &file.commit {
                    Some(commit) => format!("    {} ({commit})", file.path),
                    None => format!("    {}", file.path),
                });
            }
        }

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    /// Parse lock file text. Any structural problem is an error; nothing is
    /// skipped silently.
    pub fn parse(text: &str) -> Result<Self, LockFileError> {
        let mut strict = false;
        let mut section: Option<Section> = None;
        let mut remote: Option<String> = None;
        let mut packages: BTreeMap<PackageKey, ResolvedPackage> = BTreeMap::new();
        let mut current: Option<(usize, ResolvedPackage)> = None;
        let mut source_files = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim_end();
            let content = line.trim_start();
            if content.is_empty() {
                continue;
            }
            if content == STRICT_LINE {
                strict = true;
                continue;
            }
            if line.starts_with('\t') {
                return Err(LockFileError::new(line_no, "tabs are not allowed for indentation"));
            }

            let indent = line.len() - content.len();
            match indent {
                0 => {
                    section = Some(match content {
                        NUGET_HEADER => Section::Nuget,
                        GITHUB_HEADER => Section::GitHub,
                        other => {
                            return Err(LockFileError::new(
                                line_no,
                                format!("unknown section '{other}'"),
                            ))
                        }
                    });
                    remote = None;
                    flush(&mut packages, &mut current)?;
                }
                REMOTE_INDENT => {
                    if content == SPECS_LINE {
                        continue;
                    }
                    let Some(value) = content.strip_prefix(REMOTE_PREFIX) else {
                        return Err(LockFileError::new(
                            line_no,
                            format!("unknown directive '{content}'"),
                        ));
                    };
                    let value = value.trim();
                    match section {
                        None => {
                            return Err(LockFileError::new(line_no, "remote before any section header"))
                        }
                        Some(Section::GitHub) if split_repository(value).is_none() => {
                            return Err(LockFileError::new(
                                line_no,
                                format!("remote '{value}' is not of the form owner/project"),
                            ));
                        }
                        _ => {}
                    }
                    if value.is_empty() {
                        return Err(LockFileError::new(line_no, "empty remote"));
                    }
                    flush(&mut packages, &mut current)?;
                    remote = Some(value.to_string());
                }
                ENTRY_INDENT => {
                    let Some(active) = section else {
                        return Err(LockFileError::new(line_no, "entry before any section header"));
                    };
                    let Some(remote) = remote.as_deref() else {
                        return Err(LockFileError::new(line_no, "entry before any remote"));
                    };
                    match active {
                        Section::Nuget => {
                            flush(&mut packages, &mut current)?;
                            let package = parse_package_line(content, remote, line_no)?;
                            current = Some((line_no, package));
                        }
                        Section::GitHub => {
                            source_files.push(parse_file_line(content, remote, line_no)?);
                        }
                    }
                }
                DEPENDENCY_INDENT => {
                    let Some((_, package)) = current.as_mut() else {
                        return Err(LockFileError::new(line_no, "dependency before any package"));
                    };
                    package.dependencies.push(parse_dependency_line(content, line_no)?);
                }
                other => {
                    return Err(LockFileError::new(
                        line_no,
                        format!("unexpected indentation of {other} spaces"),
                    ))
                }
            }
        }
        flush(&mut packages, &mut current)?;

        Ok(Self::new(strict, packages.into_values().collect(), source_files))
    }

    /// The locked version for a package, by any spelling of its name.
    pub fn locked_version(&self, name: &str) -> Option<&SemVer> {
        self.resolution.find(name).map(|p| &p.version)
    }
}

impl fmt::Display for LockFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

/// Group packages by source; groups appear in the order their first package
/// appears in normalized-key order.
fn group_by_source(resolution: &PackageResolution) -> Vec<(&PackageSource, Vec<&ResolvedPackage>)> {
    let mut groups: Vec<(&PackageSource, Vec<&ResolvedPackage>)> = Vec::new();
    for package in resolution.packages() {
        match groups.iter_mut().find(|(src, _)| **src == package.source) {
            Some((_, members)) => members.push(package),
            None => groups.push((&package.source, vec![package])),
        }
    }
    groups
}

fn flush(
    packages: &mut BTreeMap<PackageKey, ResolvedPackage>,
    current: &mut Option<(usize, ResolvedPackage)>,
) -> Result<(), LockFileError> {
    if let Some((line_no, package)) = current.take() {
        match packages.entry(package.name.key().clone()) {
            Entry::Occupied(_) => {
                return Err(LockFileError::new(
                    line_no,
                    format!("package '{}' is listed more than once", package.name),
                ))
            }
            Entry::Vacant(slot) => {
                slot.insert(package);
            }
        }
    }
    Ok(())
}

/// Split `Name (inner)` into its name and the text between the parentheses.
fn split_entry(content: &str) -> Option<(&str, Option<&str>)> {
    match content.split_once(" (") {
        Some((name, rest)) => {
            let inner = rest.strip_suffix(')')?;
            Some((name.trim(), Some(inner.trim())))
        }
        None if content.contains('(') || content.contains(')') => None,
        None => Some((content, None)),
    }
}

fn parse_package_line(
    content: &str,
    remote: &str,
    line_no: usize,
) -> Result<ResolvedPackage, LockFileError> {
    let Some((name, Some(version))) = split_entry(content) else {
        return Err(LockFileError::new(
            line_no,
            format!("expected 'Name (Version)', found '{content}'"),
        ));
    };
    let version =
        SemVer::parse(version).map_err(|e| LockFileError::new(line_no, e.to_string()))?;
    Ok(ResolvedPackage {
        name: PackageName::new(name),
        version,
        source: PackageSource::parse(remote),
        dependencies: Vec::new(),
    })
}

fn parse_dependency_line(
    content: &str,
    line_no: usize,
) -> Result<(PackageName, VersionRange), LockFileError> {
    let Some((name, range)) = split_entry(content) else {
        return Err(LockFileError::new(
            line_no,
            format!("expected 'Name (range)', found '{content}'"),
        ));
    };
    let range = match range {
        Some(text) if text.is_empty() => {
            return Err(LockFileError::new(line_no, "empty version range"))
        }
        Some(text) => {
            VersionRange::parse(text).map_err(|e| LockFileError::new(line_no, e.to_string()))?
        }
        None => VersionRange::NoRestriction,
    };
    Ok((PackageName::new(name), range))
}

fn parse_file_line(content: &str, remote: &str, line_no: usize) -> Result<SourceFile, LockFileError> {
    let (owner, project) = split_repository(remote).ok_or_else(|| {
        LockFileError::new(line_no, format!("remote '{remote}' is not of the form owner/project"))
    })?;
    let (path, commit) = match content.rsplit_once(" (") {
        Some((path, rest)) if rest.ends_with(')') => {
            let commit = rest.trim_end_matches(')').trim();
            if commit.is_empty() {
                return Err(LockFileError::new(line_no, "empty commit"));
            }
            (path.trim(), Some(commit.to_string()))
        }
        _ => (content, None),
    };
    Ok(SourceFile {
        owner: owner.to_string(),
        project: project.to_string(),
        path: path.to_string(),
        commit,
    })
}

fn split_repository(remote: &str) -> Option<(&str, &str)> {
    let (owner, project) = remote.split_once('/')?;
    if owner.is_empty() || project.is_empty() || project.contains('/') {
        return None;
    }
    Some((owner, project))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_entry_forms() {
        assert_eq!(split_entry("Foo (1.0)"), Some(("Foo", Some("1.0"))));
        assert_eq!(split_entry("Foo"), Some(("Foo", None)));
        assert_eq!(split_entry("Foo (1.0"), None);
        assert_eq!(split_entry("Foo(1.0)"), None);
    }

    #[test]
    fn split_repository_requires_owner_and_project() {
        assert_eq!(split_repository("fsharp/FAKE"), Some(("fsharp", "FAKE")));
        assert_eq!(split_repository("fsharp"), None);
        assert_eq!(split_repository("/FAKE"), None);
        assert_eq!(split_repository("a/b/c"), None);
    }

    #[test]
    fn empty_lock_file() {
        let lock = LockFile::default();
        assert_eq!(lock.serialize(), "\n");
        assert_eq!(LockFile::parse("\n").unwrap(), lock);
    }
}
