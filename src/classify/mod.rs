//! Repository classification
//!
//! Decides which deploys a push to a repository should cause. Two
//! independent checks run for every repository:
//!
//! - **Module metadata**: `metadata.json` at `HEAD` names a Puppet module as
//!   `<org>-<module>`. Only when that file is missing is the long obsolete
//!   `Modulefile` consulted instead. A `metadata.json` that exists but cannot
//!   be parsed does not fall back to the `Modulefile`.
//! - **Repository name**: `*_hiera*` repositories are hiera data, and the
//!   `puppet_r10k` / `hiera_r10k` control repositories redeploy every
//!   environment.
//!
//! Both checks can fire for the same push.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::deploy::DeployTrigger;
use crate::git::BlobReader;

pub const METADATA_FILE: &str = "metadata.json";
pub const LEGACY_MODULE_FILE: &str = "Modulefile";

const HIERA_MARKER: &str = "_hiera";
const PUPPET_CONTROL_REPO: &str = "puppet_r10k";
const HIERA_CONTROL_REPO: &str = "hiera_r10k";

/// Something noteworthy found while classifying. None of these stop
/// classification; they explain why a trigger did or did not fire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// `metadata.json` exists but is not usable module metadata
    MetadataMalformed { reason: String },
    /// Module name is not of the form `<org>-<module>`
    InvalidModuleName { name: String, source: String },
    /// Module identified from the obsolete `Modulefile`
    LegacyModulefile,
    /// Reading a metadata blob failed; treated as absent
    MetadataUnavailable { file: String, reason: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MetadataMalformed { reason } => {
                write!(f, "{METADATA_FILE} could not be parsed: {reason}")
            }
            Diagnostic::InvalidModuleName { name, source } => write!(
                f,
                "invalid module name '{name}' in {source}, should be [organization]-[module_name]"
            ),
            Diagnostic::LegacyModulefile => write!(
                f,
                "module found through {LEGACY_MODULE_FILE}, which is long obsolete; add a {METADATA_FILE}"
            ),
            Diagnostic::MetadataUnavailable { file, reason } => {
                write!(f, "{file} could not be read: {reason}")
            }
        }
    }
}

/// Outcome of classifying one repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Triggers in dispatch order: module, hiera, puppet environment, hiera environment
    pub triggers: Vec<DeployTrigger>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Classification {
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct ModuleMetadata {
    name: String,
}

/// Classifies repositories using blobs read through a [`BlobReader`].
pub struct RepositoryClassifier<B> {
    blobs: B,
}

impl<B: BlobReader> RepositoryClassifier<B> {
    pub fn new(blobs: B) -> Self {
        Self { blobs }
    }

    /// Classify the repository `repo_full_name` (`<org>/<repo>`).
    pub fn classify(&self, repo_full_name: &str) -> Classification {
        let mut classification = Classification::default();

        if let Some(module) = self.module_name(repo_full_name, &mut classification.diagnostics) {
            tracing::debug!(repository = repo_full_name, module = %module, "Found puppet module");
            classification.triggers.push(DeployTrigger::Module { module });
        }

        let repo_name = bare_name(repo_full_name);
        if repo_name.contains(HIERA_MARKER) {
            tracing::debug!(repository = repo_full_name, "Found hiera repo");
            classification.triggers.push(DeployTrigger::Hiera {
                module: repo_name.to_string(),
            });
        }
        if repo_name == PUPPET_CONTROL_REPO {
            tracing::debug!(repository = repo_full_name, "Found puppet r10k repo");
            classification.triggers.push(DeployTrigger::PuppetEnvironment);
        }
        if repo_name == HIERA_CONTROL_REPO {
            tracing::debug!(repository = repo_full_name, "Found hiera r10k repo");
            classification.triggers.push(DeployTrigger::HieraEnvironment);
        }

        for diagnostic in &classification.diagnostics {
            match diagnostic {
                Diagnostic::MetadataUnavailable { .. } => {
                    tracing::debug!(repository = repo_full_name, "{diagnostic}")
                }
                _ => tracing::warn!(repository = repo_full_name, "{diagnostic}"),
            }
        }

        classification
    }

    /// Module short-name from `metadata.json`, or from `Modulefile` when
    /// `metadata.json` is absent.
    fn module_name(&self, repo_full_name: &str, diagnostics: &mut Vec<Diagnostic>) -> Option<String> {
        if let Some(metadata) = self.read_blob(repo_full_name, METADATA_FILE, diagnostics) {
            tracing::debug!(repository = repo_full_name, "Found {METADATA_FILE}, parsing");
            return match serde_json::from_slice::<ModuleMetadata>(&metadata) {
                Ok(metadata) => short_module_name(&metadata.name, METADATA_FILE, diagnostics),
                Err(e) => {
                    diagnostics.push(Diagnostic::MetadataMalformed {
                        reason: e.to_string(),
                    });
                    None
                }
            };
        }

        let modulefile = self.read_blob(repo_full_name, LEGACY_MODULE_FILE, diagnostics)?;
        diagnostics.push(Diagnostic::LegacyModulefile);

        let content = String::from_utf8_lossy(&modulefile);
        match quoted_token(&content) {
            Some(full_name) => short_module_name(full_name, LEGACY_MODULE_FILE, diagnostics),
            None => {
                diagnostics.push(Diagnostic::InvalidModuleName {
                    name: String::new(),
                    source: LEGACY_MODULE_FILE.to_string(),
                });
                None
            }
        }
    }

    /// Read a blob, folding read failures into absence.
    fn read_blob(
        &self,
        repo_full_name: &str,
        file: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<Vec<u8>> {
        match self.blobs.read_head_blob(repo_full_name, file) {
            Ok(blob) => blob,
            Err(e) => {
                diagnostics.push(Diagnostic::MetadataUnavailable {
                    file: file.to_string(),
                    reason: format!("{e:#}"),
                });
                None
            }
        }
    }
}

/// Last path segment of `<org>/<repo>`
pub fn bare_name(repo_full_name: &str) -> &str {
    repo_full_name.rsplit('/').next().unwrap_or(repo_full_name)
}

/// `<org>-<module>` to `<module>`, recording a diagnostic when the name
/// has no organization part or no module part.
fn short_module_name(full_name: &str, source: &str, diagnostics: &mut Vec<Diagnostic>) -> Option<String> {
    match full_name.split_once('-') {
        Some((_, module)) if !module.is_empty() => Some(module.to_string()),
        _ => {
            diagnostics.push(Diagnostic::InvalidModuleName {
                name: full_name.to_string(),
                source: source.to_string(),
            });
            None
        }
    }
}

/// First `'...'` token in a Modulefile, e.g. `name 'acme-ntp'`.
fn quoted_token(content: &str) -> Option<&str> {
    let mut parts = content.split('\'');
    parts.next()?;
    let token = parts.next()?;
    // An opening quote with nothing closing it is not a token
    parts.next()?;
    Some(token)
}
