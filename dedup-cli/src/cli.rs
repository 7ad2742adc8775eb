//! Command-line interface definition.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use dedup_core::CompilerKind;
use dedup_executor::config::{
    DEFAULT_CLONE_URL_TEMPLATE, DEFAULT_CONCURRENCY, PACKAGE_INDEX_URL,
};
use dedup_executor::export::DEFAULT_EXPORT_PATH;
use dedup_executor::{Compilers, HarnessConfig};

/// Development environments and cross-compiler test harness for Elm packages.
#[derive(Parser, Debug)]
#[command(name = "elm-dedup", author, version, disable_help_subcommand = true)]
pub struct Cli {
    /// Increase logging (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Development environment declaration.
    #[command(subcommand)]
    Env(EnvCommand),

    /// Sandboxed FHS shell declaration.
    #[command(subcommand)]
    Sandbox(SandboxCommand),

    /// Clone every published package version into the repositories root.
    Download(DownloadArgs),

    /// Run every discovered test suite with each compiler.
    Test(TestArgs),

    /// Run elm-review over every checked-out package version.
    Review(ReviewArgs),
}

#[derive(Subcommand, Debug)]
pub enum EnvCommand {
    /// Print the environment as a devenv module or canonical JSON.
    Render(RenderArgs),
    /// Write the environment module and enter it with `devenv shell`.
    Enter(EnterArgs),
}

#[derive(Subcommand, Debug)]
pub enum SandboxCommand {
    /// Print the sandbox as a Nix expression or canonical JSON.
    Render(RenderArgs),
    /// Validate the sandbox and print its description and digest.
    Check(SpecArgs),
    /// Write the sandbox expression and enter it with `nix-shell`.
    Enter(EnterArgs),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Nix,
    Json,
}

#[derive(Args, Debug)]
pub struct SpecArgs {
    /// Load the declaration from a JSON file instead of the built-in one.
    #[arg(long, value_name = "FILE")]
    pub spec: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub spec: SpecArgs,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Nix)]
    pub format: Format,
}

#[derive(Args, Debug)]
pub struct EnterArgs {
    #[command(flatten)]
    pub spec: SpecArgs,

    /// Directory receiving the rendered expressions.
    #[arg(long, env = "ELM_DEDUP_STATE_DIR", default_value = ".elm-dedup")]
    pub state_dir: PathBuf,

    /// Print the command instead of running it.
    #[arg(long)]
    pub dry_run: bool,
}

/// Settings shared by the harness commands.
#[derive(Args, Debug)]
pub struct HarnessArgs {
    /// Root holding `<author>/<package>/<version>` checkouts.
    #[arg(long, env = "ELM_DEDUP_REPOS", default_value = "repos")]
    pub repos: PathBuf,

    /// Maximum number of concurrent jobs.
    #[arg(long, env = "ELM_DEDUP_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub harness: HarnessArgs,

    /// Package index URL.
    #[arg(long, default_value = PACKAGE_INDEX_URL)]
    pub index_url: String,

    /// Clone URL with a `{name}` placeholder for `author/package`.
    #[arg(long, default_value = DEFAULT_CLONE_URL_TEMPLATE)]
    pub clone_url_template: String,
}

#[derive(Args, Debug)]
pub struct TestArgs {
    #[command(flatten)]
    pub harness: HarnessArgs,

    /// Seconds allowed per compiler run.
    #[arg(long, default_value_t = 120)]
    pub timeout: u64,

    /// Export suites that did not pass everywhere to this CSV file.
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = DEFAULT_EXPORT_PATH)]
    pub export: Option<PathBuf>,

    /// Seconds between progress summaries.
    #[arg(long, default_value_t = 10)]
    pub progress_interval: u64,

    /// Reference Elm compiler.
    #[arg(long, env = "ELM", default_value = "elm")]
    pub elm: String,

    /// Lamdera stable without wire codecs.
    #[arg(long, env = "LAMDERA_STABLE_NO_WIRE", default_value = "lamdera-stable-no-wire")]
    pub lamdera_stable_no_wire: String,

    /// Lamdera stable.
    #[arg(long, env = "LAMDERA_STABLE", default_value = "lamdera-stable")]
    pub lamdera_stable: String,

    /// Lamdera next without wire codecs.
    #[arg(long, env = "LAMDERA_NEXT_NO_WIRE", default_value = "lamdera-next-no-wire")]
    pub lamdera_next_no_wire: String,

    /// Lamdera next.
    #[arg(long, env = "LAMDERA_NEXT", default_value = "lamdera-next")]
    pub lamdera_next: String,

    /// elm-test-rs binary; `npx elm-test-rs` when unset.
    #[arg(long, env = "ELM_TEST_RS_PATH")]
    pub elm_test_rs: Option<String>,
}

#[derive(Args, Debug)]
pub struct ReviewArgs {
    #[command(flatten)]
    pub harness: HarnessArgs,

    /// elm-review configuration directory.
    #[arg(long, env = "ELM_DEDUP_REVIEW_CONFIG")]
    pub config: Option<PathBuf>,
}

impl HarnessArgs {
    /// Base configuration for the harness commands.
    #[must_use]
    pub fn config(&self) -> HarnessConfig {
        let mut config = HarnessConfig::new(self.repos.clone());
        config.concurrency = self.concurrency.max(1);
        config
    }
}

impl DownloadArgs {
    #[must_use]
    pub fn config(&self) -> HarnessConfig {
        let mut config = self.harness.config();
        config.index_url.clone_from(&self.index_url);
        config.clone_url_template.clone_from(&self.clone_url_template);
        config
    }
}

impl TestArgs {
    #[must_use]
    pub fn config(&self) -> HarnessConfig {
        let mut config = self.harness.config();
        config.suite_timeout = Duration::from_secs(self.timeout);
        config.compilers = Compilers::default()
            .with_executable(CompilerKind::Elm, &self.elm)
            .with_executable(CompilerKind::LamderaStableNoWire, &self.lamdera_stable_no_wire)
            .with_executable(CompilerKind::LamderaStable, &self.lamdera_stable)
            .with_executable(CompilerKind::LamderaNextNoWire, &self.lamdera_next_no_wire)
            .with_executable(CompilerKind::LamderaNext, &self.lamdera_next);
        config.elm_test_rs.clone_from(&self.elm_test_rs);
        config
    }
}

impl ReviewArgs {
    #[must_use]
    pub fn config(&self) -> HarnessConfig {
        let mut config = self.harness.config();
        if let Some(path) = &self.config {
            config.review_config.clone_from(path);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        match Cli::try_parse_from(std::iter::once("elm-dedup").chain(args.iter().copied())) {
            Ok(cli) => cli,
            Err(e) => panic!("parse failed: {e}"),
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_command_maps_compilers_and_timeout() {
        let cli = parse(&["test", "--timeout", "30", "--lamdera-next", "/opt/lamdera-next", "--repos", "r"]);
        let Command::Test(args) = cli.command else {
            panic!("expected test command");
        };
        let config = args.config();
        assert_eq!(config.suite_timeout, Duration::from_secs(30));
        assert_eq!(config.repos_root, PathBuf::from("r"));
        assert_eq!(config.compilers.executable(CompilerKind::LamderaNext), "/opt/lamdera-next");
        assert!(args.export.is_none());
    }

    #[test]
    fn bare_export_flag_uses_default_file() {
        let cli = parse(&["test", "--export"]);
        let Command::Test(args) = cli.command else {
            panic!("expected test command");
        };
        assert_eq!(args.export, Some(PathBuf::from("export.csv")));
    }

    #[test]
    fn sandbox_render_defaults_to_nix() {
        let cli = parse(&["sandbox", "render"]);
        assert!(matches!(
            cli.command,
            Command::Sandbox(SandboxCommand::Render(RenderArgs { format: Format::Nix, .. }))
        ));
    }

    #[test]
    fn download_overrides_clone_template() {
        let cli = parse(&["download", "--clone-url-template", "https://github.com/{name}.git"]);
        let Command::Download(args) = cli.command else {
            panic!("expected download command");
        };
        assert_eq!(args.config().clone_url("elm/core"), "https://github.com/elm/core.git");
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["elm-dedup", "-q", "-v", "review"]);
        assert!(result.is_err());
    }
}
