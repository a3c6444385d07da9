use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for wavegrid")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: fmt, clippy, tests, doc
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Run the backend conformance suite only
    Conformance,
    /// Run the tick benchmarks in release mode
    Bench,
    /// Run a short headless simulation through the CLI
    Smoke {
        /// Ticks to simulate
        #[arg(short, long, default_value = "30")]
        ticks: u64,
    },
    /// Build rustdoc for the workspace
    Doc,
    /// Build the entire workspace
    Build,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            cargo("fmt --check", &["fmt", "--all", "--", "--check"])?;
            clippy()?;
            cargo("test", &["test", "--workspace"])?;
            doc()?;
        }
        Commands::Fmt => cargo("fmt --check", &["fmt", "--all", "--", "--check"])?,
        Commands::Clippy => clippy()?,
        Commands::Test => cargo("test", &["test", "--workspace"])?,
        Commands::Conformance => cargo(
            "conformance",
            &["test", "-p", "wavegrid-kernel", "--test", "conformance"],
        )?,
        Commands::Bench => cargo(
            "bench",
            &["bench", "-p", "wavegrid-kernel", "--bench", "bench_tick"],
        )?,
        Commands::Smoke { ticks } => {
            let ticks = ticks.to_string();
            for backend in ["sequential", "parallel"] {
                cargo(
                    &format!("smoke run ({backend})"),
                    &[
                        "run",
                        "-p",
                        "wavegrid-cli",
                        "--",
                        "run",
                        "--backend",
                        backend,
                        "--ticks",
                        &ticks,
                    ],
                )?;
            }
        }
        Commands::Doc => doc()?,
        Commands::Build => cargo("build", &["build", "--workspace"])?,
    }

    Ok(())
}

fn clippy() -> Result<()> {
    cargo(
        "clippy",
        &[
            "clippy",
            "--workspace",
            "--all-targets",
            "--",
            "-D",
            "warnings",
        ],
    )
}

fn doc() -> Result<()> {
    cargo("doc", &["doc", "--workspace", "--no-deps"])
}

fn cargo(step: &str, args: &[&str]) -> Result<()> {
    println!("==> Running cargo {step}");
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("cargo {step} failed");
    }
    Ok(())
}
