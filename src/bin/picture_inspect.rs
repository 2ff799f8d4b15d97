use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use my_pictures::api::{JsonPlaceholderClient, PicturesApi};
use my_pictures::config;

#[derive(Parser, Debug)]
#[command(about = "Fetch one picture and its album from the picture API")]
struct Args {
    /// Path to YAML config (built-in defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Picture ID to inspect
    #[arg(long)]
    id: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(args.config.as_deref())?;
    let client = JsonPlaceholderClient::from_config(&cfg)?;

    let picture = client.photo(args.id).await?;
    let album = client.album(picture.album_id).await?;
    println!("Picture ID: {}", picture.id);
    println!("  title:     {}", picture.title);
    println!("  url:       {}", picture.url);
    println!("  thumbnail: {}", picture.thumbnail_url);
    println!("Album ID: {}", album.id);
    println!("  title:     {}", album.title);
    println!("  user:      {}", album.user_id);
    Ok(())
}
