use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use my_pictures::config;
use my_pictures::repository::AppContainer;
use my_pictures::shell::{self, Handled, PicturesApp};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file (built-in defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the rendered screen.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(args.config.as_deref())?;
    cfg.ensure_dirs()
        .with_context(|| format!("failed to create {}", cfg.app.data_dir))?;

    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| cfg.database_url());
    let container = AppContainer::from_config(&cfg, &database_url).await?;

    info!("starting picture shell");
    let mut app = PicturesApp::new(container);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    draw(&app);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match shell::parse_command(&line) {
                    Ok(command) => match app.handle(command) {
                        Handled::Continue => {}
                        Handled::Notice(msg) => println!("! {msg}"),
                        Handled::Quit => break,
                    },
                    Err(err) => {
                        warn!(line = %line.trim(), "unrecognised command");
                        println!("{}", err.render());
                        continue;
                    }
                }
            }
            _ = app.updated() => {}
        }
        draw(&app);
    }

    app.shutdown().await;
    info!("bye");
    Ok(())
}

fn draw(app: &PicturesApp) {
    println!("\n{}\n> ", app.render());
}
