use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use tinix::config::DISK_IMAGE_NAME;
use tinix::kernel::Kernel;
use tinix::shell::Shell;

/// A user-space teaching simulator of classic OS mechanisms.
#[derive(Parser)]
#[command(name = "tinix")]
#[command(about = "Tinix OS simulator")]
struct Cli {
    /// Backing disk image, created and zero-filled on first run.
    #[arg(long, default_value = DISK_IMAGE_NAME)]
    disk: PathBuf,

    /// Shell batch script to run before entering the REPL.
    #[arg(short, long)]
    script: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let kernel = Kernel::new(&cli.disk)
        .with_context(|| format!("failed to bring up disk image {}", cli.disk.display()))?;

    let mut shell = Shell::new(kernel);
    if let Some(script) = &cli.script {
        shell.execute_script(script);
    }
    shell.run();
    Ok(())
}
