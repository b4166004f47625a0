use super::types::{ClientConfig, StudioError};

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};

/// Fetches artifacts and writes them into a download directory.
pub struct ArtifactSaver {
    client: reqwest::Client,
    dir: PathBuf,
}

impl ArtifactSaver {
    pub fn new(config: &ClientConfig) -> Result<Self, StudioError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            dir: config.download_dir(),
        })
    }

    /// Download `url` and store it as `filename` in the download directory.
    /// An existing file is never replaced; the first free `stem (N).ext`
    /// is used instead. Returns the final path.
    #[instrument(skip(self))]
    pub async fn save(&self, url: &str, filename: &str) -> Result<PathBuf, StudioError> {
        let name = safe_file_name(filename)?;

        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;

        tokio::fs::create_dir_all(&self.dir).await?;

        let (path, claimed) = self.claim(&name).await?;

        // Atomic write: write to tmp file, then rename over the claimed name
        let tmp = self.dir.join(format!("{claimed}.part"));
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;

        info!(path = %path.display(), bytes = bytes.len(), "artifact saved");
        Ok(path)
    }

    /// Reserve the first unused variant of `name` by creating it empty.
    async fn claim(&self, name: &str) -> Result<(PathBuf, String), StudioError> {
        for n in 0u32.. {
            let candidate = numbered_name(name, n);
            let path = self.dir.join(&candidate);
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(_) => return Ok((path, candidate)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(StudioError::InvalidFilename(name.to_string()))
    }
}

/// `segment_0.wav` -> `segment_0 (n).wav`; `n == 0` keeps the name.
fn numbered_name(name: &str, n: u32) -> String {
    if n == 0 {
        return name.to_string();
    }
    let path = Path::new(name);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(name);
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem} ({n}).{ext}"),
        None => format!("{stem} ({n})"),
    }
}

/// Last path component of a server-supplied name; never escapes the
/// download directory.
fn safe_file_name(filename: &str) -> Result<String, StudioError> {
    let normalized = filename.replace('\\', "/");
    Path::new(&normalized)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| StudioError::InvalidFilename(filename.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_reduced_to_their_last_component() {
        assert_eq!(safe_file_name("segment_0.wav").unwrap(), "segment_0.wav");
        assert_eq!(safe_file_name("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(safe_file_name("a\\b\\c.wav").unwrap(), "c.wav");
    }

    #[test]
    fn numbered_names_keep_the_extension() {
        assert_eq!(numbered_name("segment_0.wav", 0), "segment_0.wav");
        assert_eq!(numbered_name("segment_0.wav", 1), "segment_0 (1).wav");
        assert_eq!(numbered_name("take.final.wav", 2), "take.final (2).wav");
        assert_eq!(numbered_name("README", 3), "README (3)");
    }

    #[test]
    fn unusable_file_names_are_rejected() {
        for bad in ["", "   ", "..", "/", "out/.."] {
            assert!(
                matches!(safe_file_name(bad), Err(StudioError::InvalidFilename(_))),
                "{bad:?}"
            );
        }
    }
}
