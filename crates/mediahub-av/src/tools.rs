//! Locating ffmpeg and checking that it runs.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// What `mediahub check-tools` prints for one tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    /// The binary was found and answered its version flag.
    pub available: bool,
    /// First line of the version banner.
    pub version: Option<String>,
    pub path: Option<PathBuf>,
}

/// Resolve `name` to an executable. A configured path is used when it
/// exists; otherwise PATH is searched.
pub fn resolve_tool(name: &str, configured: Option<&Path>) -> Result<PathBuf> {
    match configured {
        Some(path) if path.is_file() => return Ok(path.to_path_buf()),
        Some(_path) => {
            #[cfg(feature = "tracing")]
            tracing::warn!("Configured {} path {:?} does not exist, searching PATH", name, _path);
        }
        None => {}
    }

    which::which(name).map_err(|_| Error::tool_not_found(name))
}

/// Run `<tool> <version_arg>` and record whether it succeeded.
pub fn probe_tool(name: &str, configured: Option<&Path>, version_arg: &str) -> ToolInfo {
    let path = match resolve_tool(name, configured) {
        Ok(path) => path,
        Err(_) => {
            return ToolInfo {
                name: name.to_string(),
                available: false,
                version: None,
                path: None,
            }
        }
    };

    let version = Command::new(&path)
        .arg(version_arg)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| {
            String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string()
        });

    ToolInfo {
        name: name.to_string(),
        available: version.is_some(),
        version,
        path: Some(path),
    }
}

/// Tools a worker needs, resolved the same way the worker resolves them.
pub fn check_tools(ffmpeg: Option<&Path>) -> Vec<ToolInfo> {
    vec![probe_tool("ffmpeg", ffmpeg, "-version")]
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISSING: &str = "mediahub_no_such_tool";

    #[test]
    fn missing_tool_is_unavailable() {
        let info = probe_tool(MISSING, None, "--version");
        assert!(!info.available);
        assert!(info.version.is_none());
        assert!(info.path.is_none());

        assert!(matches!(
            resolve_tool(MISSING, None),
            Err(Error::ToolNotFound { .. })
        ));
    }

    #[test]
    fn stale_configured_path_falls_back_to_search() {
        let err = resolve_tool(MISSING, Some(Path::new("/nonexistent/ffmpeg"))).unwrap_err();
        assert!(matches!(err, Error::ToolNotFound { tool } if tool == MISSING));
    }

    #[cfg(unix)]
    #[test]
    fn configured_binary_is_probed() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("ffmpeg");
        std::fs::write(&fake, "#!/bin/sh\necho 'ffmpeg version 6.1'\necho 'built with gcc'\n").unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(resolve_tool(MISSING, Some(&fake)).unwrap(), fake);

        let info = check_tools(Some(&fake)).remove(0);
        assert!(info.available);
        assert_eq!(info.version.as_deref(), Some("ffmpeg version 6.1"));
        assert_eq!(info.path, Some(fake));
    }
}
