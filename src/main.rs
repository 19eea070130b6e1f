use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use tourmap::advisory::small_screen_advisory;
use tourmap::photos::scan_photos;
use tourmap::rides::load_rides;
use tourmap::{ClickOutcome, HttpImageFetcher, Settings, TourMap};

#[derive(Parser, Debug)]
#[command(name = "tourmap", about = "Build a tour map from GPX rides and geotagged photos")]
struct Args {
    /// Settings file (defaults to tourmap.ini next to the executable)
    config: Option<PathBuf>,

    /// Directory with one GPX file per ride
    #[arg(long)]
    gps_dir: Option<String>,

    /// Directory with geotagged JPEG photos
    #[arg(long)]
    image_dir: Option<String>,

    /// Base URL the popups load full images from; omit to embed images
    #[arg(long)]
    remote_image_url: Option<String>,

    /// Where to write the marker manifest
    #[arg(long)]
    output: Option<String>,

    /// Simulate a click on this marker (e.g. image_0) after building
    #[arg(long)]
    click: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    println!("🗺️  TourMap v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut settings = match &args.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    if let Some(dir) = args.gps_dir {
        settings.gps_dir = Some(dir);
    }
    if let Some(dir) = args.image_dir {
        settings.image_dir = Some(dir);
    }
    if let Some(url) = args.remote_image_url {
        settings.remote_image_url = Some(url);
    }
    if let Some(output) = args.output {
        settings.output_path = output;
    }

    small_screen_advisory(settings.viewport_width, |message| {
        println!("⚠️  {}", message);
    });

    if settings.gps_dir.is_none() && settings.image_dir.is_none() {
        anyhow::bail!(
            "Nothing to map: set gps_dir and/or image_dir (in tourmap.ini or on the command line)"
        );
    }

    let rides = match &settings.gps_dir {
        Some(gps_dir) => {
            println!("🚴 Loading rides from: {}", gps_dir);
            let rides = load_rides(Path::new(gps_dir))?;
            println!("✅ Loaded {} rides", rides.len());
            rides
        }
        None => Vec::new(),
    };

    let photos = match &settings.image_dir {
        Some(image_dir) => {
            println!("🔍 Scanning photos directory: {}", image_dir);
            let photos =
                scan_photos(Path::new(image_dir), settings.image_width, settings.image_height)?;
            println!("✅ Found {} geotagged photos", photos.len());
            photos
        }
        None => Vec::new(),
    };

    let fetcher = Arc::new(HttpImageFetcher::with_timeout(Duration::from_secs(
        settings.fetch_timeout_secs,
    )));
    let tour = TourMap::build(&settings, &rides, photos, fetcher)?;

    let manifest = serde_json::to_string_pretty(&tour.manifest())?;
    std::fs::write(&settings.output_path, manifest)
        .with_context(|| format!("Failed to write {}", settings.output_path))?;
    println!(
        "📝 Wrote {} stages and {} photo markers to '{}'",
        tour.rides().stages.len(),
        tour.len(),
        settings.output_path
    );

    if let Some(marker_id) = args.click {
        match tour.click(&marker_id) {
            Some(task) => match task.await? {
                ClickOutcome::Rendered {
                    geometry,
                    pan_target,
                } => {
                    println!(
                        "📸 {} enlarged to {:.0}x{:.0}px ({:?}-constrained), map panned to {:.5}, {:.5}",
                        marker_id,
                        geometry.width,
                        geometry.height,
                        geometry.axis,
                        pan_target.lat,
                        pan_target.lng
                    );
                }
                ClickOutcome::Failed => println!("❌ {} could not load its image", marker_id),
            },
            None => println!("ℹ️  {} has no remote image to load", marker_id),
        }
    }

    Ok(())
}
