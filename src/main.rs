use clap::Parser;
use clap::builder::NonEmptyStringValueParser;
use std::path::PathBuf;
use std::process::ExitCode;
use upbase::config::Config;
use upbase::constants::{DEFAULT_CONFIG_PATH, REPO_ENV_VAR};
use upbase::manifest::Manifest;
use upbase::output::{self, ConsoleCallbacks};
use upbase::run;
use upbase::script::ShellScriptRunner;
use upbase::vcs::GitRepo;
use upbase::workdir::WorkingDirGuard;

#[derive(Debug, Parser)]
#[command(name = "upbase", version)]
#[command(about = "Rebase local branches on top of their remote counterparts", long_about = None)]
struct Cli {
    /// Repository to update (defaults to the current directory)
    #[arg(long, env = REPO_ENV_VAR)]
    repo: Option<PathBuf>,

    /// Configuration file (defaults to .upbase/.upbase.yaml inside the repository)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Remote to rebase onto and push to, overriding the configuration file
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    remote: Option<String>,

    /// Only print warnings, errors and a one-line summary
    #[arg(short, long)]
    quiet: bool,

    /// Print every step and git command
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::from_flags(cli.quiet, cli.verbose);

    let cwd = std::env::current_dir()?;
    let repo_path = cli.repo.map_or_else(|| cwd.clone(), |repo| cwd.join(repo));
    let config_path = cli.config.map(|path| cwd.join(path));

    let _guard = WorkingDirGuard::enter(&repo_path)?;
    let repo_path = std::env::current_dir()?;
    output::print_working_dir(&repo_path, &config);

    let manifest =
        Manifest::load(&config_path.unwrap_or_else(|| repo_path.join(DEFAULT_CONFIG_PATH)))?;
    let remote = cli.remote.unwrap_or(manifest.remote);

    let vcs = GitRepo::new(&repo_path, config.git_logger());
    let scripts = ShellScriptRunner::new(&repo_path, config.streams_post_script());
    let callbacks = ConsoleCallbacks::new(config);

    let report = run::run(&manifest.branches, &remote, &vcs, &scripts, &callbacks);
    callbacks.finish();
    output::print_summary(&report, &config);

    Ok(report.exit_code())
}
