use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use blogroll::config::Config;
use blogroll::github::Fetcher;
use blogroll::{feed, syndicate};

/// Aggregates local and syndicated blog posts into a single post list.
#[derive(Parser, Debug)]
#[command(name = "blogroll", version, about)]
struct Cli {
    /// Path to the project file (otherwise discovered by walking up from
    /// the current directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the output path from the project file
    #[arg(long)]
    output: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `blogroll=trace`
    #[arg(long, env = "BLOGROLL_LOG", default_value = "info")]
    log: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cli.log))
        .try_init();

    let mut config = match &cli.config {
        Some(path) => Config::from_project_file(path)?,
        None => Config::from_directory(&std::env::current_dir()?)?,
    };
    if let Some(output) = cli.output {
        config.output = output;
    }

    let fetcher = Fetcher::new()?;
    let posts = syndicate::run(&config, &fetcher)?;

    println!("syndicated {} posts", posts.len());
    for post in posts.iter().take(10) {
        println!("  {}  {}", post.date.format("%Y-%m-%d"), post.title);
        if !post.categories.is_empty() {
            println!("        categories: {}", post.categories.join(", "));
        }
        println!("        source: {}", post.source);
    }
    if posts.len() > 10 {
        println!("  ... and {} more", posts.len() - 10);
    }

    syndicate::write_posts(&posts, &config.output)?;
    println!("post list written to {}", config.output.display());

    if let Some(feed_config) = &config.feed {
        let path = config.output.with_file_name("feed.atom");
        let file =
            File::create(&path).with_context(|| format!("creating `{}`", path.display()))?;
        feed::write_feed(feed_config, &posts, file)?;
        println!("feed written to {}", path.display());
    }

    Ok(())
}
