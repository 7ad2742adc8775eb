use std::collections::BTreeSet;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::digest::SpecDigest;
use crate::error::CoreError;
use crate::package::{OutputKind, PackageName};

/// Command launched inside the sandbox when none is given.
pub const DEFAULT_RUN_COMMAND: &str = "bash";

/// Longest derivation name the package manager accepts.
const MAX_NAME_LEN: usize = 211;

/// Declaration of an isolated FHS-style shell environment.
///
/// Built through [`SandboxSpec::builder`]; immutable afterwards. The external
/// provisioner materializes the filesystem, sources `profile_script` once and
/// launches `run_command`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSandboxSpec")]
#[non_exhaustive]
pub struct SandboxSpec {
    /// Name of the resulting sandbox artifact.
    pub name: String,
    /// Packages made available inside the sandbox, in declaration order.
    /// Duplicates are allowed here and collapse in [`SandboxSpec::describe`].
    pub target_packages: Vec<PackageName>,
    /// Extra outputs to install for every target package.
    pub extra_outputs: BTreeSet<OutputKind>,
    /// Shell source executed once on entry.
    pub profile_script: String,
    /// Program launched on entry.
    pub run_command: String,
}

impl SandboxSpec {
    /// Start building a sandbox with the given name.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> SandboxSpecBuilder {
        SandboxSpecBuilder {
            name: name.into(),
            target_packages: Vec::new(),
            extra_outputs: BTreeSet::new(),
            profile_script: String::new(),
            run_command: DEFAULT_RUN_COMMAND.to_owned(),
        }
    }

    /// Load a sandbox declaration from JSON.
    ///
    /// # Errors
    /// Returns [`CoreError::Json`] if the document is malformed or fails
    /// validation.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Produce the description handed to the external provisioner.
    ///
    /// Every unique target package becomes one member, in first-seen order,
    /// with the default output plus every requested extra output.
    #[must_use]
    pub fn describe(&self) -> SandboxDescription {
        let mut outputs = self.extra_outputs.clone();
        outputs.insert(OutputKind::Out);

        let unique: IndexSet<&PackageName> = self.target_packages.iter().collect();
        let members = unique
            .into_iter()
            .map(|package| SandboxMember {
                package: package.clone(),
                outputs: outputs.clone(),
            })
            .collect();

        SandboxDescription {
            name: self.name.clone(),
            members,
            profile_script: self.profile_script.clone(),
            run_command: self.run_command.clone(),
        }
    }
}

/// Fluent builder for [`SandboxSpec`].
#[derive(Debug, Clone)]
#[must_use]
pub struct SandboxSpecBuilder {
    name: String,
    target_packages: Vec<PackageName>,
    extra_outputs: BTreeSet<OutputKind>,
    profile_script: String,
    run_command: String,
}

impl SandboxSpecBuilder {
    /// Add one target package.
    pub fn target_package(mut self, package: PackageName) -> Self {
        self.target_packages.push(package);
        self
    }

    /// Add several target packages.
    pub fn target_packages(mut self, packages: impl IntoIterator<Item = PackageName>) -> Self {
        self.target_packages.extend(packages);
        self
    }

    /// Request an extra output for every target package.
    pub fn extra_output(mut self, output: OutputKind) -> Self {
        self.extra_outputs.insert(output);
        self
    }

    /// Set the profile script sourced on entry.
    pub fn profile(mut self, script: impl Into<String>) -> Self {
        self.profile_script = script.into();
        self
    }

    /// Set the program launched on entry.
    pub fn run_command(mut self, command: impl Into<String>) -> Self {
        self.run_command = command.into();
        self
    }

    /// Validate and freeze the declaration.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidSandboxName`] if the name is not a valid
    /// derivation name, or [`CoreError::DeclarationValidation`] if the run
    /// command is blank.
    pub fn build(self) -> Result<SandboxSpec, CoreError> {
        validate_name(&self.name)?;
        if self.run_command.trim().is_empty() {
            return Err(CoreError::DeclarationValidation {
                field: "run_command".to_owned(),
                reason: "must not be blank".to_owned(),
            });
        }
        Ok(SandboxSpec {
            name: self.name,
            target_packages: self.target_packages,
            extra_outputs: self.extra_outputs,
            profile_script: self.profile_script,
            run_command: self.run_command,
        })
    }
}

/// Description of a sandbox as consumed by the provisioner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct SandboxDescription {
    /// Name of the sandbox artifact.
    pub name: String,
    /// Unique packages with their installed outputs.
    pub members: Vec<SandboxMember>,
    /// Shell source executed once on entry.
    pub profile_script: String,
    /// Program launched on entry.
    pub run_command: String,
}

impl SandboxDescription {
    /// Canonical JSON rendering, byte-identical for equal declarations.
    ///
    /// # Errors
    /// Returns [`CoreError::Json`] if serialization fails.
    pub fn to_canonical_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// SHA-256 of the canonical JSON rendering.
    ///
    /// # Errors
    /// Returns [`CoreError::Json`] if serialization fails.
    pub fn digest(&self) -> Result<SpecDigest, CoreError> {
        Ok(SpecDigest::of(self.to_canonical_json()?.as_bytes()))
    }

    /// Returns `true` if `package` is a member of the sandbox.
    #[must_use]
    pub fn contains(&self, package: &PackageName) -> bool {
        self.members.iter().any(|m| &m.package == package)
    }
}

/// One package inside a sandbox description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct SandboxMember {
    /// The package attribute path.
    pub package: PackageName,
    /// Outputs installed for this package; always includes `out`.
    pub outputs: BTreeSet<OutputKind>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSandboxSpec {
    name: String,
    #[serde(default)]
    target_packages: Vec<PackageName>,
    #[serde(default)]
    extra_outputs: BTreeSet<OutputKind>,
    #[serde(default)]
    profile_script: String,
    #[serde(default = "default_run_command")]
    run_command: String,
}

fn default_run_command() -> String {
    DEFAULT_RUN_COMMAND.to_owned()
}

impl TryFrom<RawSandboxSpec> for SandboxSpec {
    type Error = CoreError;

    fn try_from(raw: RawSandboxSpec) -> Result<Self, Self::Error> {
        let mut builder = SandboxSpec::builder(raw.name)
            .target_packages(raw.target_packages)
            .profile(raw.profile_script)
            .run_command(raw.run_command);
        for output in raw.extra_outputs {
            builder = builder.extra_output(output);
        }
        builder.build()
    }
}

fn validate_name(name: &str) -> Result<(), CoreError> {
    let invalid = |reason: String| CoreError::InvalidSandboxName {
        name: name.to_owned(),
        reason,
    };
    if name.is_empty() {
        return Err(invalid("name is empty".to_owned()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(invalid(format!("longer than {MAX_NAME_LEN} characters")));
    }
    if name.starts_with('.') {
        return Err(invalid("starts with '.'".to_owned()));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(*c, '+' | '-' | '.' | '_' | '?' | '=')))
    {
        return Err(invalid(format!("contains '{c}'")));
    }
    Ok(())
}
