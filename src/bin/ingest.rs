//! Scan a directory of GPX logs and write the page payload (`scene.json`).

use clap::Parser;
use log::{info, warn};
use std::fs;
use std::path::PathBuf;
use track_replay::loader::{load_tracks, LoadError};
use track_replay::scene::PagePayload;

#[derive(Parser, Debug)]
#[command(author, version, about = "Prepare GPX tracks for the replay map")]
struct Args {
    /// Directory containing the .gpx files
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Where to write the scene payload
    #[arg(long, default_value = "dist/scene.json")]
    out: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let payload = match load_tracks(&args.dir) {
        Ok(report) => {
            for failure in &report.failures {
                warn!("Skipped {}", failure);
            }
            PagePayload::from_tracks(&report.tracks)
        }
        Err(err @ LoadError::NoTracksFound { .. }) => {
            warn!("{}", err);
            PagePayload::no_tracks()
        }
        Err(err) => return Err(err.into()),
    };

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&args.out, serde_json::to_string(&payload)?)?;

    match &payload {
        PagePayload::Ready { scene } => info!(
            "Wrote {} track(s) to {}",
            scene.tracks.len(),
            args.out.display()
        ),
        PagePayload::Empty { .. } => info!("Wrote empty map state to {}", args.out.display()),
    }
    Ok(())
}
