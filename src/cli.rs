//! Command-line argument parsing.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::params::{RenderConfig, ShadingParams, NODAL_BAND};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Chladni")]
#[command(about = "Live microphone input as a vibrating circular plate", long_about = None)]
pub struct Args {
    /// Window width (pixels)
    #[arg(long, value_name = "PIXELS", default_value = "800")]
    pub width: u32,

    /// Window height (pixels)
    #[arg(long, value_name = "PIXELS", default_value = "800")]
    pub height: u32,

    /// Width of the bright band around nodal lines
    #[arg(long, value_name = "AMPLITUDE", default_value_t = NODAL_BAND)]
    pub nodal_band: f32,

    /// Write one still of the plate to a PNG and exit (no window)
    #[arg(long, value_name = "PATH")]
    pub snapshot: Option<PathBuf>,

    /// Capture time before taking the snapshot
    #[arg(long, value_name = "MS", default_value = "500")]
    pub snapshot_delay_ms: u64,

    /// Snapshot image size (square, pixels)
    #[arg(long, value_name = "PIXELS", default_value = "512")]
    pub snapshot_size: u32,
}

impl Args {
    /// Window configuration from command-line arguments
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            window_width: self.width,
            window_height: self.height,
            ..Default::default()
        }
    }

    pub fn shading_params(&self) -> ShadingParams {
        ShadingParams {
            nodal_band: self.nodal_band,
        }
    }

    pub fn snapshot_delay(&self) -> Duration {
        Duration::from_millis(self.snapshot_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["chladni"]);

        assert_eq!(args.width, 800);
        assert_eq!(args.height, 800);
        assert!(args.snapshot.is_none());
        assert_eq!(args.snapshot_delay(), Duration::from_millis(500));
        assert_eq!(args.shading_params().nodal_band, NODAL_BAND);
        assert_eq!(args.render_config().title, RenderConfig::default().title);
    }

    #[test]
    fn test_snapshot_flags() {
        let args = Args::parse_from([
            "chladni",
            "--snapshot",
            "plate.png",
            "--snapshot-size",
            "256",
            "--width",
            "1024",
        ]);

        assert_eq!(args.snapshot, Some(PathBuf::from("plate.png")));
        assert_eq!(args.snapshot_size, 256);
        assert_eq!(args.render_config().window_width, 1024);
    }
}
