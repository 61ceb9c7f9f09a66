//! # mediahub-av
//!
//! External media tool invocation for mediahub workers.
//!
//! The worker treats ffmpeg as a black box: given an input video it produces
//! a sprite sheet of preview thumbnails next to the input, or fails. Nothing
//! here retries; callers decide what a failure means for the job.
//!
//! ## Example
//!
//! ```no_run
//! use mediahub_av::generate_sprite;
//!
//! let sprite = generate_sprite(std::path::Path::new("/media/movie.mp4"))?;
//! assert_eq!(sprite.extension().unwrap(), "jpg");
//! # Ok::<(), mediahub_av::Error>(())
//! ```

mod error;
pub mod sprite;
pub mod tools;

// Re-exports
pub use error::{Error, Result};
pub use sprite::{generate_sprite, sprite_path, SpriteGenerator, SpriteSpec, SPRITE_EXTENSION};
pub use tools::{check_tools, probe_tool, resolve_tool, ToolInfo};
