use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for lightfield")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: fmt, clippy, tests, doc, headless smoke run
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Build rustdoc for the workspace
    Doc,
    /// Build the entire workspace
    Build,
    /// Drive the scene headlessly and check two runs agree
    Smoke {
        #[arg(long, default_value = "120")]
        frames: u64,
    },
    /// Run the field step benchmark
    Bench,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            fmt()?;
            clippy()?;
            test()?;
            doc()?;
            smoke(60)?;
        }
        Commands::Fmt => fmt()?,
        Commands::Clippy => clippy()?,
        Commands::Test => test()?,
        Commands::Doc => doc()?,
        Commands::Build => cargo(&["build", "--workspace"], "cargo build")?,
        Commands::Smoke { frames } => smoke(frames)?,
        Commands::Bench => cargo(
            &["bench", "-p", "lightfield-kernel", "--bench", "bench_field_step"],
            "field step benchmark",
        )?,
    }

    Ok(())
}

/// Run cargo with `args`, failing with `what` when it exits non-zero.
fn cargo(args: &[&str], what: &str) -> Result<()> {
    println!("==> Running {what}");
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("{what} failed");
    }
    Ok(())
}

fn fmt() -> Result<()> {
    cargo(&["fmt", "--all", "--", "--check"], "cargo fmt check")
}

fn clippy() -> Result<()> {
    cargo(
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        "cargo clippy",
    )
}

fn test() -> Result<()> {
    cargo(&["test", "--workspace"], "cargo test")
}

fn doc() -> Result<()> {
    cargo(&["doc", "--workspace", "--no-deps"], "cargo doc")
}

fn smoke(frames: u64) -> Result<()> {
    let frames = frames.to_string();
    cargo(
        &[
            "run", "-q", "-p", "lightfield-cli", "--", "simulate", "--frames", &frames,
            "--count", "500", "--orbit", "1.5", "--json",
        ],
        "headless simulate",
    )?;
    cargo(
        &[
            "run", "-q", "-p", "lightfield-cli", "--", "determinism", "--frames", &frames,
        ],
        "determinism check",
    )
}
