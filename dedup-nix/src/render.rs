//! Rendering of declarations as Nix expressions.
//!
//! The environment becomes a devenv module; the sandbox becomes a
//! `buildFHSEnv` expression suitable for `nix-shell`. Output is a pure
//! function of the declaration, so rendering twice is byte-identical.

use std::fmt::Write as _;

use dedup_core::{EnvironmentSpec, OutputKind, PackageName, SandboxSpec};

/// Nix keywords that must be quoted when used as attribute names.
const KEYWORDS: [&str; 10] = [
    "assert", "else", "if", "in", "inherit", "let", "or", "rec", "then", "with",
];

/// Render an environment declaration as a devenv module.
#[must_use]
pub fn render_environment(env: &EnvironmentSpec) -> String {
    let mut out = String::from("{ pkgs, ... }:\n\n{\n  packages = [\n");
    for package in &env.packages {
        let _ = writeln!(out, "    {}", package_ref(package));
    }
    out.push_str("  ];\n");
    for toolchain in &env.toolchains {
        let _ = write!(out, "\n  languages.{}.enable = true;\n", attr_segment(toolchain.as_str()));
    }
    out.push_str("}\n");
    out
}

/// Render a sandbox declaration as a `buildFHSEnv` expression.
///
/// Target packages are deduplicated through [`SandboxSpec::describe`]. The
/// profile is passed through verbatim as a double-quoted Nix string.
#[must_use]
pub fn render_sandbox(spec: &SandboxSpec) -> String {
    let description = spec.describe();
    let mut out = String::from("{ pkgs ? import <nixpkgs> { } }:\n\n(pkgs.buildFHSEnv {\n");
    let _ = writeln!(out, "  name = {};", nix_string(&description.name));

    if description.members.is_empty() {
        out.push_str("  targetPkgs = pkgs: [ ];\n");
    } else {
        out.push_str("  targetPkgs = pkgs: [\n");
        for member in &description.members {
            let _ = writeln!(out, "    {}", package_ref(&member.package));
        }
        out.push_str("  ];\n");
    }

    let extra: Vec<String> = spec
        .extra_outputs
        .iter()
        .filter(|o| **o != OutputKind::Out)
        .map(|o| nix_string(o.as_str()))
        .collect();
    if extra.is_empty() {
        out.push_str("  extraOutputsToInstall = [ ];\n");
    } else {
        let _ = writeln!(out, "  extraOutputsToInstall = [ {} ];", extra.join(" "));
    }

    let _ = writeln!(out, "  profile = {};", nix_string(&description.profile_script));
    let _ = writeln!(out, "  runScript = {};", nix_string(&description.run_command));
    out.push_str("}).env\n");
    out
}

/// Quote `s` as a double-quoted Nix string literal.
#[must_use]
pub fn nix_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

fn package_ref(package: &PackageName) -> String {
    let path: Vec<String> = package.as_str().split('.').map(attr_segment).collect();
    format!("pkgs.{}", path.join("."))
}

fn attr_segment(segment: &str) -> String {
    if KEYWORDS.contains(&segment) {
        nix_string(segment)
    } else {
        segment.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use dedup_core::declarations::{project_environment, project_sandbox};
    use dedup_core::ToolchainId;

    use super::*;

    fn pkg(name: &str) -> PackageName {
        match PackageName::new(name) {
            Ok(p) => p,
            Err(e) => panic!("invalid test package {name}: {e}"),
        }
    }

    #[test]
    fn environment_lists_packages_and_toolchains() {
        let env = match EnvironmentSpec::parse(["git", "elmPackages.elm"], ["rust"]) {
            Ok(e) => e,
            Err(e) => panic!("unexpected error: {e}"),
        };
        let nix = render_environment(&env);
        assert!(nix.starts_with("{ pkgs, ... }:"));
        assert!(nix.contains("    pkgs.git\n"));
        assert!(nix.contains("    pkgs.elmPackages.elm\n"));
        assert!(nix.contains("languages.rust.enable = true;"));
    }

    #[test]
    fn keyword_segments_are_quoted() {
        let env = EnvironmentSpec::new(
            [pkg("lib.if")],
            [match ToolchainId::new("rec") {
                Ok(t) => t,
                Err(e) => panic!("unexpected error: {e}"),
            }],
        );
        let nix = render_environment(&env);
        assert!(nix.contains("pkgs.lib.\"if\""), "got:\n{nix}");
        assert!(nix.contains("languages.\"rec\".enable"), "got:\n{nix}");
    }

    #[test]
    fn sandbox_renders_exact_members_and_dev_outputs() {
        let spec = match SandboxSpec::builder("scenario")
            .target_packages([pkg("a"), pkg("b"), pkg("a")])
            .extra_output(OutputKind::Dev)
            .run_command("shell")
            .build()
        {
            Ok(s) => s,
            Err(e) => panic!("unexpected error: {e}"),
        };
        let nix = render_sandbox(&spec);
        assert_eq!(nix.matches("    pkgs.").count(), 2, "exactly the two unique members:\n{nix}");
        assert!(nix.contains("extraOutputsToInstall = [ \"dev\" ];"));
        assert!(nix.contains("runScript = \"shell\";"));
        assert!(nix.trim_end().ends_with("}).env"));
    }

    #[test]
    fn empty_sandbox_renders_empty_lists() {
        let spec = match SandboxSpec::builder("empty").build() {
            Ok(s) => s,
            Err(e) => panic!("unexpected error: {e}"),
        };
        let nix = render_sandbox(&spec);
        assert!(nix.contains("targetPkgs = pkgs: [ ];"));
        assert!(nix.contains("extraOutputsToInstall = [ ];"));
    }

    #[test]
    fn nix_string_escapes_interpolation_and_quotes() {
        assert_eq!(nix_string("plain"), "\"plain\"");
        assert_eq!(nix_string("a \"b\""), "\"a \\\"b\\\"\"");
        assert_eq!(nix_string("${HOME}"), "\"\\${HOME}\"");
        assert_eq!(nix_string("$HOME"), "\"$HOME\"", "bare $ needs no escape");
        assert_eq!(nix_string("x\ny"), "\"x\\ny\"");
        assert_eq!(nix_string("back\\slash"), "\"back\\\\slash\"");
    }

    #[test]
    fn project_declarations_render_deterministically() {
        assert_eq!(render_sandbox(&project_sandbox()), render_sandbox(&project_sandbox()));
        assert_eq!(
            render_environment(&project_environment()),
            render_environment(&project_environment())
        );
        assert!(render_sandbox(&project_sandbox()).contains("RUST_SRC_PATH"));
    }

    proptest::proptest! {
        #[test]
        fn proptest_nix_string_never_leaves_raw_interpolation(s in ".{0,64}") {
            let quoted = nix_string(&s);
            let inner = &quoted[1..quoted.len() - 1];
            let bytes = inner.as_bytes();
            for i in 0..bytes.len().saturating_sub(1) {
                if bytes[i] == b'$' && bytes[i + 1] == b'{' {
                    proptest::prop_assert!(i > 0 && bytes[i - 1] == b'\\', "unescaped ${{ in {}", quoted);
                }
            }
            proptest::prop_assert!(!inner.contains('\n'));
        }
    }
}
