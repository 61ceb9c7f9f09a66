//! Preview sprite sheet generation.
//!
//! A sprite sheet is a single JPEG holding a grid of thumbnails sampled from
//! the input video at a fixed interval. The output lives next to the input
//! with the same stem and a `.jpg` extension, so repeated runs on the same
//! input always produce the same path.

use crate::tools::resolve_tool;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Extension of generated sprite sheets.
pub const SPRITE_EXTENSION: &str = "jpg";

/// Fixed sampling, scaling and tiling parameters for a sprite sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteSpec {
    /// Seconds of video between two sampled frames.
    pub sample_interval_secs: u32,
    /// Width of each thumbnail in pixels; height keeps the aspect ratio.
    pub thumb_width: u32,
    /// Thumbnails per row.
    pub columns: u32,
    /// Thumbnails per column.
    pub rows: u32,
}

impl Default for SpriteSpec {
    fn default() -> Self {
        Self {
            sample_interval_secs: 10,
            thumb_width: 160,
            columns: 5,
            rows: 5,
        }
    }
}

impl SpriteSpec {
    /// The ffmpeg video filter chain for these parameters.
    pub fn filter(&self) -> String {
        format!(
            "fps=1/{},scale={}:-1,tile={}x{}",
            self.sample_interval_secs, self.thumb_width, self.columns, self.rows
        )
    }
}

/// Deterministic output path for a given input: same directory and stem,
/// `.jpg` extension.
///
/// An input that already carries the sprite extension is rejected, since its
/// output path would be the input itself.
pub fn sprite_path(input: &Path) -> Result<PathBuf> {
    if input.file_stem().is_none() {
        return Err(Error::InvalidInput(format!(
            "input has no file name: {}",
            input.display()
        )));
    }
    let is_sprite = input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SPRITE_EXTENSION));
    if is_sprite {
        return Err(Error::InvalidInput(format!(
            "input would be overwritten by its own sprite: {}",
            input.display()
        )));
    }
    Ok(input.with_extension(SPRITE_EXTENSION))
}

/// Runs ffmpeg to turn a video into a sprite sheet.
#[derive(Debug, Clone)]
pub struct SpriteGenerator {
    ffmpeg: PathBuf,
    spec: SpriteSpec,
}

impl SpriteGenerator {
    /// Resolve ffmpeg from `ffmpeg_path` if it exists, otherwise from PATH.
    pub fn new(ffmpeg_path: Option<&Path>) -> Result<Self> {
        let ffmpeg = resolve_tool("ffmpeg", ffmpeg_path)?;
        Ok(Self {
            ffmpeg,
            spec: SpriteSpec::default(),
        })
    }

    pub fn with_spec(mut self, spec: SpriteSpec) -> Self {
        self.spec = spec;
        self
    }

    pub fn spec(&self) -> &SpriteSpec {
        &self.spec
    }

    /// Arguments passed to ffmpeg for `input` -> `output`.
    pub fn args(&self, input: &Path, output: &Path) -> Vec<std::ffi::OsString> {
        vec![
            "-y".into(),
            "-loglevel".into(),
            "error".into(),
            "-i".into(),
            input.as_os_str().to_owned(),
            "-vf".into(),
            self.spec.filter().into(),
            "-frames:v".into(),
            "1".into(),
            output.as_os_str().to_owned(),
        ]
    }

    /// Generate the sprite sheet for `input` and return its path.
    ///
    /// Fails without retrying when the input is missing, ffmpeg exits
    /// non-zero, or ffmpeg exits cleanly without writing the output.
    pub fn generate(&self, input: &Path) -> Result<PathBuf> {
        if !input.is_file() {
            return Err(Error::file_not_found(input));
        }

        let output = sprite_path(input)?;
        match std::fs::remove_file(&output) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::Io(e)),
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Generating sprite with {:?}: {:?} -> {:?} ({})",
            self.ffmpeg,
            input,
            output,
            self.spec.filter()
        );

        let result = Command::new(&self.ffmpeg)
            .args(self.args(input, &output))
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::tool_not_found("ffmpeg")
                } else {
                    Error::Io(e)
                }
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(Error::tool_failed(
                "ffmpeg",
                format!("exit code {:?}: {}", result.status.code(), stderr.trim()),
            ));
        }

        if !output.is_file() {
            return Err(Error::tool_failed(
                "ffmpeg",
                format!("no output written to {}", output.display()),
            ));
        }

        Ok(output)
    }
}

/// Generate a sprite sheet with default parameters and ffmpeg from PATH.
pub fn generate_sprite(input: &Path) -> Result<PathBuf> {
    SpriteGenerator::new(None)?.generate(input)
}
