use anyhow::{Context, Result};
use exif::{In, Reader, Tag, Value};
use ignore::WalkBuilder;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::CatalogueError;
use crate::geometry::ImageSize;
use crate::map::LatLng;
use crate::style::InlineStyle;

/// A geotagged photo ready to become a map marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhotoEntry {
    pub filename: String,
    pub path: PathBuf,
    pub position: LatLng,
    /// Pixel size of the original file
    pub original: ImageSize,
    /// Size of the image shown in the popup before any click
    pub placeholder: ImageSize,
}

impl PhotoEntry {
    pub fn placeholder_style(&self) -> InlineStyle {
        InlineStyle::sized(self.placeholder.width, self.placeholder.height)
    }
}

/// Fits a photo into the popup box: landscape photos get the full box width,
/// everything else the full box height.
pub fn placeholder_size(original_width: u32, original_height: u32, box_width: u32, box_height: u32) -> ImageSize {
    let (w, h) = (f64::from(original_width), f64::from(original_height));
    if w > h {
        let height = (f64::from(box_width) / (w / h)).floor();
        ImageSize::new(f64::from(box_width), height)
    } else {
        let width = (f64::from(box_height) / (h / w)).floor();
        ImageSize::new(width, f64::from(box_height))
    }
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "jpg" | "jpeg"))
        .unwrap_or(false)
}

fn is_hidden(path: &Path, root: &Path) -> bool {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .any(|name| name.starts_with('.'))
}

/// Collects the geotagged JPEGs directly inside `image_dir`, sorted by file
/// name. Subdirectories are not searched, so file names stay unique.
pub fn scan_photos(image_dir: &Path, box_width: u32, box_height: u32) -> Result<Vec<PhotoEntry>> {
    if !image_dir.is_dir() {
        return Err(CatalogueError::MissingDirectory(image_dir.to_path_buf()).into());
    }

    let files: Vec<PathBuf> = WalkBuilder::new(image_dir)
        .max_depth(Some(1))
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|e| e.file_type().map_or(false, |ft| ft.is_file()))
        .map(|e| e.into_path())
        .filter(|p| !is_hidden(p, image_dir) && is_jpeg(p))
        .collect();

    if files.is_empty() {
        return Err(CatalogueError::NoImages(image_dir.to_path_buf()).into());
    }
    info!(count = files.len(), dir = %image_dir.display(), "found images");

    let mut photos: Vec<PhotoEntry> = files
        .par_iter()
        .filter_map(|path| match read_photo(path, box_width, box_height) {
            Ok(photo) => Some(photo),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping photo");
                None
            }
        })
        .collect();

    photos.sort_by(|a, b| a.filename.cmp(&b.filename).then_with(|| a.path.cmp(&b.path)));
    Ok(photos)
}

fn read_photo(path: &Path, box_width: u32, box_height: u32) -> Result<PhotoEntry> {
    let position = read_gps(path)?;
    let (width, height) = image::image_dimensions(path)
        .with_context(|| format!("Failed to read dimensions of {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .context("Invalid file name")?
        .to_string();

    Ok(PhotoEntry {
        filename,
        path: path.to_path_buf(),
        position,
        original: ImageSize::new(f64::from(width), f64::from(height)),
        placeholder: placeholder_size(width, height, box_width, box_height),
    })
}

fn read_gps(path: &Path) -> Result<LatLng> {
    let file = fs::File::open(path)?;
    let mut bufreader = std::io::BufReader::new(&file);
    let exif = Reader::new()
        .read_from_container(&mut bufreader)
        .context("No EXIF data")?;

    let lat = gps_coord(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef);
    let lng = gps_coord(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef);
    match (lat, lng) {
        (Some(lat), Some(lng)) => Ok(LatLng::new(lat, lng)),
        _ => anyhow::bail!("GPS data not found"),
    }
}

/// Degrees/minutes/seconds rationals to decimal degrees; S and W are negative.
fn gps_coord(exif: &exif::Exif, coord_tag: Tag, ref_tag: Tag) -> Option<f64> {
    let coord = exif.get_field(coord_tag, In::PRIMARY)?;
    let reference = exif.get_field(ref_tag, In::PRIMARY)?;

    let Value::Rational(ref dms) = coord.value else {
        return None;
    };
    if dms.len() != 3 {
        return None;
    }
    let decimal = dms[0].to_f64() + dms[1].to_f64() / 60.0 + dms[2].to_f64() / 3600.0;

    let hemisphere = match reference.value {
        Value::Ascii(ref parts) => parts
            .first()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default(),
        _ => reference.display_value().to_string(),
    };
    Some(dms_sign(&hemisphere) * decimal)
}

fn dms_sign(hemisphere: &str) -> f64 {
    match hemisphere.trim().chars().next() {
        Some('S') | Some('W') => -1.0,
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exif::experimental::Writer;
    use exif::{Field, Rational};
    use std::io::Cursor;

    fn dms(degrees: u32, minutes: u32, seconds: u32) -> Value {
        Value::Rational(vec![
            Rational::from((degrees, 1)),
            Rational::from((minutes, 1)),
            Rational::from((seconds, 1)),
        ])
    }

    /// Writes an 8x6 JPEG carrying GPS tags in an APP1 segment.
    fn write_geotagged_jpeg(path: &Path, lat: (Value, &str), lng: (Value, &str)) {
        let fields = [
            Field { tag: Tag::GPSLatitude, ifd_num: In::PRIMARY, value: lat.0 },
            Field {
                tag: Tag::GPSLatitudeRef,
                ifd_num: In::PRIMARY,
                value: Value::Ascii(vec![lat.1.as_bytes().to_vec()]),
            },
            Field { tag: Tag::GPSLongitude, ifd_num: In::PRIMARY, value: lng.0 },
            Field {
                tag: Tag::GPSLongitudeRef,
                ifd_num: In::PRIMARY,
                value: Value::Ascii(vec![lng.1.as_bytes().to_vec()]),
            },
        ];
        let mut writer = Writer::new();
        for field in &fields {
            writer.push_field(field);
        }
        let mut tiff = Cursor::new(Vec::new());
        writer.write(&mut tiff, false).unwrap();
        let tiff = tiff.into_inner();

        let mut jpeg = Cursor::new(Vec::new());
        image::RgbImage::from_pixel(8, 6, image::Rgb([30, 120, 200]))
            .write_to(&mut jpeg, image::ImageFormat::Jpeg)
            .unwrap();
        let jpeg = jpeg.into_inner();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let segment_len = u16::try_from(2 + 6 + tiff.len()).unwrap();
        let mut out = Vec::with_capacity(jpeg.len() + tiff.len() + 10);
        out.extend_from_slice(&jpeg[..2]);
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&segment_len.to_be_bytes());
        out.extend_from_slice(b"Exif\0\0");
        out.extend_from_slice(&tiff);
        out.extend_from_slice(&jpeg[2..]);
        fs::write(path, out).unwrap();
    }

    fn assert_close(actual: LatLng, lat: f64, lng: f64) {
        assert!((actual.lat - lat).abs() < 1e-9, "lat {} != {}", actual.lat, lat);
        assert!((actual.lng - lng).abs() < 1e-9, "lng {} != {}", actual.lng, lng);
    }

    #[test]
    fn landscape_fills_box_width() {
        assert_eq!(placeholder_size(4000, 3000, 500, 400), ImageSize::new(500.0, 375.0));
        assert_eq!(placeholder_size(1920, 1080, 500, 400), ImageSize::new(500.0, 281.0));
    }

    #[test]
    fn portrait_and_square_fill_box_height() {
        assert_eq!(placeholder_size(3000, 4000, 500, 400), ImageSize::new(300.0, 400.0));
        assert_eq!(placeholder_size(1000, 1000, 500, 400), ImageSize::new(400.0, 400.0));
    }

    #[test]
    fn southern_and_western_hemispheres_are_negative() {
        assert_eq!(dms_sign("S"), -1.0);
        assert_eq!(dms_sign("W"), -1.0);
        assert_eq!(dms_sign("N"), 1.0);
        assert_eq!(dms_sign("E"), 1.0);
    }

    #[test]
    fn filters_hidden_and_non_jpeg() {
        let root = Path::new("/trip");
        assert!(is_jpeg(Path::new("/trip/a.JPG")));
        assert!(is_jpeg(Path::new("/trip/b.jpeg")));
        assert!(!is_jpeg(Path::new("/trip/c.png")));
        assert!(is_hidden(Path::new("/trip/.cache/a.jpg"), root));
        assert!(!is_hidden(Path::new("/trip/day1/a.jpg"), root));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = scan_photos(&dir.path().join("nope"), 500, 400).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CatalogueError>(),
            Some(CatalogueError::MissingDirectory(_))
        ));
    }

    #[test]
    fn directory_without_jpegs_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hi").unwrap();
        let err = scan_photos(dir.path(), 500, 400).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CatalogueError>(),
            Some(CatalogueError::NoImages(_))
        ));
    }

    #[test]
    fn jpeg_without_gps_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let img = image::RgbImage::from_pixel(8, 6, image::Rgb([200, 100, 50]));
        img.save(dir.path().join("plain.jpg")).unwrap();

        let photos = scan_photos(dir.path(), 500, 400).unwrap();
        assert!(photos.is_empty());
    }

    #[test]
    fn reads_gps_position_from_exif() {
        let dir = tempfile::tempdir().unwrap();
        write_geotagged_jpeg(
            &dir.path().join("alps.jpg"),
            (dms(46, 30, 36), "N"),
            (dms(7, 15, 0), "E"),
        );
        write_geotagged_jpeg(
            &dir.path().join("rio.JPG"),
            (dms(22, 54, 0), "S"),
            (dms(43, 12, 0), "W"),
        );

        let photos = scan_photos(dir.path(), 500, 400).unwrap();
        assert_eq!(photos.len(), 2);

        assert_eq!(photos[0].filename, "alps.jpg");
        assert_close(photos[0].position, 46.51, 7.25);
        assert_eq!(photos[0].original, ImageSize::new(8.0, 6.0));
        assert_eq!(photos[0].placeholder, ImageSize::new(500.0, 375.0));

        assert_eq!(photos[1].filename, "rio.JPG");
        assert_close(photos[1].position, -22.9, -43.2);
    }

    #[test]
    fn subdirectories_are_not_scanned() {
        let dir = tempfile::tempdir().unwrap();
        for day in ["day1", "day2"] {
            fs::create_dir(dir.path().join(day)).unwrap();
            write_geotagged_jpeg(
                &dir.path().join(day).join("IMG_0001.jpg"),
                (dms(46, 0, 0), "N"),
                (dms(7, 0, 0), "E"),
            );
        }
        write_geotagged_jpeg(
            &dir.path().join("IMG_0002.jpg"),
            (dms(47, 0, 0), "N"),
            (dms(8, 0, 0), "E"),
        );

        let photos = scan_photos(dir.path(), 500, 400).unwrap();
        let names: Vec<&str> = photos.iter().map(|p| p.filename.as_str()).collect();
        assert_eq!(names, ["IMG_0002.jpg"]);
        assert_eq!(photos[0].path, dir.path().join("IMG_0002.jpg"));
    }

    #[test]
    fn nested_photos_alone_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("day1")).unwrap();
        write_geotagged_jpeg(
            &dir.path().join("day1").join("IMG_0001.jpg"),
            (dms(46, 0, 0), "N"),
            (dms(7, 0, 0), "E"),
        );

        let err = scan_photos(dir.path(), 500, 400).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CatalogueError>(),
            Some(CatalogueError::NoImages(_))
        ));
    }
}
