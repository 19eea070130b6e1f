use anyhow::{Context, Result};
use ignore::WalkBuilder;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::constants::{
    DEFAULT_LINE_COLOUR, EARTH_RADIUS_M, STAGE_POPUP_MAX_WIDTH, STAGE_POPUP_MIN_WIDTH,
};
use crate::error::RideError;
use crate::map::LatLng;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackPoint {
    pub position: LatLng,
    pub elevation: Option<f64>,
}

/// One day's ride: every track point of one GPX file, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct Ride {
    pub name: String,
    /// Time stamp of the first track point
    pub start: Option<OffsetDateTime>,
    pub points: Vec<TrackPoint>,
}

impl Ride {
    /// Flattens all tracks and segments of `gpx`. A file without track points
    /// is an error.
    pub fn from_gpx(path: &Path, gpx: &gpx::Gpx) -> Result<Self, RideError> {
        let waypoints: Vec<&gpx::Waypoint> = gpx
            .tracks
            .iter()
            .flat_map(|track| &track.segments)
            .flat_map(|segment| &segment.points)
            .collect();

        let first = waypoints
            .first()
            .ok_or_else(|| RideError::NoTrackPoints(path.to_path_buf()))?;
        let start = first.time.clone().map(OffsetDateTime::from);

        let points = waypoints
            .iter()
            .map(|wp| {
                let point = wp.point();
                TrackPoint {
                    position: LatLng::new(point.y(), point.x()),
                    elevation: wp.elevation,
                }
            })
            .collect();

        Ok(Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            start,
            points,
        })
    }

    pub fn start_point(&self) -> Option<LatLng> {
        self.points.first().map(|p| p.position)
    }

    pub fn end_point(&self) -> Option<LatLng> {
        self.points.last().map(|p| p.position)
    }

    /// Great-circle length of the track in metres.
    pub fn distance_m(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| haversine_m(pair[0].position, pair[1].position))
            .sum()
    }

    /// Sum of the elevation gains between consecutive points; descents and
    /// points without elevation count as zero.
    pub fn climb_m(&self) -> f64 {
        self.points
            .windows(2)
            .filter_map(|pair| Some(pair[1].elevation? - pair[0].elevation?))
            .map(|delta| delta.max(0.0))
            .sum()
    }

    /// `Stage <n>: <km>km, <m>m ascent`, with `n` counted from 1
    pub fn stage_summary(&self, stage: usize) -> String {
        format!(
            "Stage {}: {:.0}km, {:.0}m ascent",
            stage,
            self.distance_m() / 1000.0,
            self.climb_m()
        )
    }
}

pub fn haversine_m(a: LatLng, b: LatLng) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = lat2 - lat1;
    let dlng = (b.lng - a.lng).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

fn is_gpx(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gpx"))
        .unwrap_or(false)
}

fn read_ride(path: &Path) -> Result<Ride> {
    debug!(path = %path.display(), "parsing ride");
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let gpx = gpx::read(BufReader::new(file))
        .with_context(|| format!("Failed to parse GPX file {}", path.display()))?;
    Ok(Ride::from_gpx(path, &gpx)?)
}

/// Parses every `.gpx` file directly inside `gps_dir`, ordered by start time.
/// Rides without time stamps go last, in file name order.
pub fn load_rides(gps_dir: &Path) -> Result<Vec<Ride>> {
    if !gps_dir.is_dir() {
        anyhow::bail!("GPS directory not found: {}", gps_dir.display());
    }

    let files: Vec<PathBuf> = WalkBuilder::new(gps_dir)
        .max_depth(Some(1))
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|e| e.file_type().map_or(false, |ft| ft.is_file()))
        .map(|e| e.into_path())
        .filter(|p| is_gpx(p))
        .collect();

    if files.is_empty() {
        return Err(RideError::NoRides(gps_dir.to_path_buf()).into());
    }

    let mut rides = files
        .par_iter()
        .map(|path| read_ride(path))
        .collect::<Result<Vec<_>>>()?;

    rides.sort_by(|a, b| match (a.start, b.start) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.name.cmp(&b.name)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.name.cmp(&b.name),
    });
    info!(count = rides.len(), dir = %gps_dir.display(), "loaded rides");
    Ok(rides)
}

/// Mean of the rides' first track points.
pub fn start_centre(rides: &[Ride]) -> Option<LatLng> {
    let starts: Vec<LatLng> = rides.iter().filter_map(Ride::start_point).collect();
    if starts.is_empty() {
        return None;
    }
    let n = starts.len() as f64;
    let (lat, lng) = starts
        .iter()
        .fold((0.0, 0.0), |(lat, lng), p| (lat + p.lat, lng + p.lng));
    Some(LatLng::new(lat / n, lng / n))
}

/// Chequered-flag marker at the end of a ride.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageMarker {
    pub id: String,
    pub position: LatLng,
    pub text: String,
    pub popup_min_width: f64,
    pub popup_max_width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RideLine {
    pub colour: String,
    pub points: Vec<LatLng>,
}

/// End-of-stage markers and track polylines, one of each per ride.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RideLayer {
    pub stages: Vec<StageMarker>,
    pub lines: Vec<RideLine>,
}

impl RideLayer {
    /// `ride_text` replaces the generated stage summaries and must have one
    /// entry per ride. `line_colours` is cycled over the rides.
    pub fn build(
        rides: &[Ride],
        ride_text: Option<&[String]>,
        line_colours: &[String],
    ) -> Result<Self, RideError> {
        let texts: Vec<String> = match ride_text {
            Some(texts) if texts.len() != rides.len() => {
                return Err(RideError::TextCount {
                    expected: rides.len(),
                    got: texts.len(),
                })
            }
            Some(texts) => texts.to_vec(),
            None => rides
                .iter()
                .enumerate()
                .map(|(idx, ride)| ride.stage_summary(idx + 1))
                .collect(),
        };

        let mut layer = RideLayer::default();
        for (idx, (ride, text)) in rides.iter().zip(texts).enumerate() {
            let Some(end) = ride.end_point() else {
                continue;
            };
            let colour = if line_colours.is_empty() {
                DEFAULT_LINE_COLOUR
            } else {
                line_colours[idx % line_colours.len()].as_str()
            };

            layer.stages.push(StageMarker {
                id: format!("stage_{}", idx),
                position: end,
                text,
                popup_min_width: STAGE_POPUP_MIN_WIDTH,
                popup_max_width: STAGE_POPUP_MAX_WIDTH,
            });
            layer.lines.push(RideLine {
                colour: colour.to_string(),
                points: ride.points.iter().map(|p| p.position).collect(),
            });
        }
        Ok(layer)
    }
}
