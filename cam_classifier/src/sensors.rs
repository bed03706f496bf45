//! Sensors module.
//!
use anyhow::{Context, Result};
use image::RgbImage;
use rscam::{Camera, Config};
use simple_error::simple_error;

/// Source of camera frames. `None` means the source can no longer deliver frames.
pub trait FrameSource {
    fn capture(&mut self) -> Option<RgbImage>;
}

/// V4L2 webcam delivering MJPG frames.
///
/// The device is released when the value is dropped.
pub struct Webcam {
    cam: Camera,
    device_name: String,
}

impl Webcam {
    /// Open and start a video device on a Linux machine.
    ///
    /// Resolution and frame rate default to the highest the device supports for MJPG.
    pub fn open(
        device_name: &str,
        resolution: Option<(u32, u32)>,
        frame_rate: Option<u32>,
    ) -> Result<Self> {
        let format = b"MJPG";
        let mut cam = Camera::new(device_name)
            .with_context(|| format!("failed to open camera {device_name}"))?;
        log_supported_formats(&cam, "MJPG");

        let resolution = match resolution {
            Some(resolution) => resolution,
            None => get_max_resolution(&cam, format)?,
        };

        let interval = match frame_rate {
            Some(fps) => (1, fps),
            None => get_max_frame_rate(&cam, format, resolution)?,
        };

        cam.start(&Config {
            interval,
            resolution,
            format,
            ..Default::default()
        })
        .with_context(|| format!("failed to start camera {device_name}"))?;

        log::info!(
            "Using camera {} at {}x{}, {}/{}s per frame",
            device_name,
            resolution.0,
            resolution.1,
            interval.0,
            interval.1
        );

        Ok(Self {
            cam,
            device_name: device_name.to_owned(),
        })
    }
}

impl FrameSource for Webcam {
    fn capture(&mut self) -> Option<RgbImage> {
        loop {
            let frame = match self.cam.capture() {
                Ok(frame) => frame,
                Err(e) => {
                    log::info!("Capture from {} failed: {}", &self.device_name, e);
                    return None;
                }
            };

            match turbojpeg::decompress_image(&frame[..]) {
                Ok(image) => return Some(image),
                Err(e) => log::warn!("Dropping undecodable frame ({} bytes): {}", frame.len(), e),
            }
        }
    }
}

impl Drop for Webcam {
    fn drop(&mut self) {
        log::info!("Releasing camera {}", &self.device_name);
    }
}

/// Parse a resolution given as `WIDTHxHEIGHT`.
pub fn parse_resolution(s: &str) -> Result<(u32, u32), String> {
    let (width, height) = s
        .split_once(|c: char| c == 'x' || c == 'X')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid dimension {v:?}: {e}"))
    };

    Ok((parse(width)?, parse(height)?))
}

/// Get the maximum supported resolution for the given format.
fn get_max_resolution(cam: &Camera, format: &[u8]) -> Result<(u32, u32)> {
    let resolution_info = cam.resolutions(format)?;
    log::debug!("Found resolutions: {:?}", &resolution_info);
    match resolution_info {
        rscam::ResolutionInfo::Discretes(resolutions) => resolutions
            .iter()
            // Highest resolution in terms of number of pixels
            .max_by_key(|res| res.0 * res.1)
            .copied(),
        rscam::ResolutionInfo::Stepwise { max, .. } => Some(max),
    }
    .ok_or_else(|| simple_error!("No resolution found").into())
}

/// Get the shortest supported frame interval for the given format and resolution.
fn get_max_frame_rate(
    cam: &Camera,
    format: &[u8],
    resolution: (u32, u32),
) -> Result<(u32, u32)> {
    let interval_info = cam.intervals(format, resolution)?;
    log::debug!("Found frame intervals: {:?}", &interval_info);
    match interval_info {
        rscam::IntervalInfo::Discretes(intervals) => intervals
            .iter()
            // An interval of (n, d) means n/d seconds per frame
            .filter(|(n, _)| *n > 0)
            .max_by(|a, b| (a.1 as f32 / a.0 as f32).total_cmp(&(b.1 as f32 / b.0 as f32)))
            .copied(),
        rscam::IntervalInfo::Stepwise { min, .. } => Some(min),
    }
    .ok_or_else(|| simple_error!("No frame rate found").into())
}

fn log_supported_formats(cam: &Camera, format: &str) {
    let formats: Vec<_> = cam.formats().filter_map(|fmt| fmt.ok()).collect();
    log::debug!(
        "Supported formats: {:?}, using format {:?}",
        formats,
        format
    );
}
