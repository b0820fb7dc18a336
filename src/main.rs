use clap::Parser;
use ghostwright::build::build_site;
use ghostwright::config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Builds a static blog from markdown sources and a Ghost-style theme.
#[derive(Parser)]
#[command(name = "ghostwright", version, about)]
struct Args {
    /// Project directory; searched upward for `ghostwright.yaml`.
    #[arg(default_value = ".")]
    project: PathBuf,

    /// Output directory, overriding the project file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Render worker count; defaults to the number of CPUs.
    #[arg(short, long)]
    threads: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_directory(&args.project, args.output.as_deref(), args.threads)?;
    build_site(&config)?;
    Ok(())
}
