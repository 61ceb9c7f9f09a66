use mediahub_av::SpriteGenerator;
use std::path::{Path, PathBuf};

/// Turns one input file into one local artifact.
#[async_trait::async_trait]
pub trait Transform: Send + Sync {
    async fn run(&self, input: &Path) -> mediahub_av::Result<PathBuf>;
}

#[async_trait::async_trait]
impl<T: Transform + ?Sized> Transform for std::sync::Arc<T> {
    async fn run(&self, input: &Path) -> mediahub_av::Result<PathBuf> {
        (**self).run(input).await
    }
}

/// Sprite sheet generation through ffmpeg, run on the blocking pool.
#[derive(Debug, Clone)]
pub struct SpriteTransform {
    generator: SpriteGenerator,
}

impl SpriteTransform {
    pub fn new(generator: SpriteGenerator) -> Self {
        Self { generator }
    }

    /// Resolve ffmpeg from an explicit path or PATH.
    pub fn locate(ffmpeg_path: Option<&Path>) -> mediahub_av::Result<Self> {
        Ok(Self::new(SpriteGenerator::new(ffmpeg_path)?))
    }
}

#[async_trait::async_trait]
impl Transform for SpriteTransform {
    async fn run(&self, input: &Path) -> mediahub_av::Result<PathBuf> {
        let generator = self.generator.clone();
        let input = input.to_path_buf();

        tokio::task::spawn_blocking(move || generator.generate(&input))
            .await
            .map_err(|e| {
                mediahub_av::Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e))
            })?
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn fake_ffmpeg(dir: &Path) -> PathBuf {
        let script = dir.join("ffmpeg");
        // The output path is the last argument.
        std::fs::write(
            &script,
            "#!/bin/sh\nfor last; do :; done\nprintf sprite > \"$last\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[tokio::test]
    async fn runs_generator_off_the_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.mp4");
        std::fs::write(&input, b"video").unwrap();

        let transform = SpriteTransform::locate(Some(&fake_ffmpeg(dir.path()))).unwrap();
        let output = transform.run(&input).await.unwrap();

        assert_eq!(output, dir.path().join("a.jpg"));
        assert_eq!(std::fs::read(&output).unwrap(), b"sprite");
    }

    #[tokio::test]
    async fn missing_input_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let transform = SpriteTransform::locate(Some(&fake_ffmpeg(dir.path()))).unwrap();

        let err = transform.run(&dir.path().join("missing.mp4")).await.unwrap_err();
        assert!(matches!(err, mediahub_av::Error::FileNotFound { .. }));
    }
}
