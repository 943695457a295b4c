use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for actorloop")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run fmt, clippy, tests and the headless smoke run
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Run the collision detector benchmark
    Bench,
    /// Run the demo scene headless and check every handle is released
    Smoke {
        /// Frames to run
        #[arg(short, long, default_value = "120")]
        frames: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            run_fmt()?;
            run_clippy()?;
            run_tests()?;
            run_smoke(120)?;
        }
        Commands::Fmt => run_fmt()?,
        Commands::Clippy => run_clippy()?,
        Commands::Test => run_tests()?,
        Commands::Bench => cargo("bench", &["bench", "-p", "actorloop-kernel"])?,
        Commands::Smoke { frames } => run_smoke(frames)?,
    }

    Ok(())
}

fn cargo(step: &str, args: &[&str]) -> Result<()> {
    println!("==> Running cargo {}", args.join(" "));
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("{step} failed");
    }
    Ok(())
}

fn run_fmt() -> Result<()> {
    cargo("cargo fmt check", &["fmt", "--all", "--", "--check"])
}

fn run_clippy() -> Result<()> {
    cargo(
        "cargo clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    )
}

fn run_tests() -> Result<()> {
    cargo("cargo test", &["test", "--workspace"])
}

fn run_smoke(frames: u64) -> Result<()> {
    let frames = frames.to_string();
    println!("==> Running actorloop-cli for {frames} frames");
    let output = Command::new("cargo")
        .args([
            "run", "-q", "-p", "actorloop-cli", "--", "run", "--frames", &frames, "--every", "0",
        ])
        .output()
        .context("failed to launch actorloop-cli")?;
    if !output.status.success() {
        anyhow::bail!(
            "smoke run failed:\n{}",
            String::from_utf8_lossy(&output.stderr)
        );
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    print!("{stdout}");
    let expected = format!("After {frames} frames");
    if !stdout.contains(&expected) {
        anyhow::bail!("smoke run stopped early: `{expected}` not found");
    }
    if !stdout.contains("0 still loaded") {
        anyhow::bail!("smoke run leaked asset handles");
    }
    Ok(())
}
