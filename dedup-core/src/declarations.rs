//! The project's own environment declarations.
//!
//! `project_environment` is the development environment (tools plus the
//! Rust toolchain); `project_sandbox` is the FHS shell used on hosts where
//! prebuilt compilers expect a conventional filesystem layout.

use crate::environment::EnvironmentSpec;
use crate::package::{OutputKind, PackageName, ToolchainId};
use crate::sandbox::SandboxSpec;

/// Name of the project sandbox artifact.
pub const SANDBOX_NAME: &str = "elm-dedup-project";

/// Profile sourced on sandbox entry. Points editor tooling at the standard
/// library sources of the active Rust toolchain.
pub const SANDBOX_PROFILE: &str =
    "export RUST_SRC_PATH=\"$(rustc --print sysroot)/lib/rustlib/src/rust/library\"\n";

const ENVIRONMENT_PACKAGES: [&str; 7] = [
    "git",
    "nodejs",
    "elmPackages.elm",
    "elmPackages.elm-test-rs",
    "elmPackages.elm-review",
    "openssl",
    "pkg-config",
];

const SANDBOX_PACKAGES: [&str; 6] = ["rustup", "pkg-config", "openssl", "git", "nodejs", "zlib"];

/// The development environment of the project.
#[must_use]
pub fn project_environment() -> EnvironmentSpec {
    EnvironmentSpec::new(ENVIRONMENT_PACKAGES.map(known), [known_toolchain("rust")])
}

/// The sandboxed FHS shell of the project.
#[must_use]
pub fn project_sandbox() -> SandboxSpec {
    #[expect(clippy::unwrap_used, reason = "the project sandbox name and run command are valid")]
    let sandbox = SandboxSpec::builder(SANDBOX_NAME)
        .target_packages(SANDBOX_PACKAGES.map(known))
        .extra_output(OutputKind::Dev)
        .profile(SANDBOX_PROFILE)
        .run_command("bash")
        .build()
        .unwrap();
    sandbox
}

fn known(name: &'static str) -> PackageName {
    #[expect(clippy::unwrap_used, reason = "built-in package names are valid attribute paths")]
    let name = PackageName::new(name).unwrap();
    name
}

fn known_toolchain(id: &'static str) -> ToolchainId {
    #[expect(clippy::unwrap_used, reason = "built-in toolchain ids are valid identifiers")]
    let id = ToolchainId::new(id).unwrap();
    id
}
