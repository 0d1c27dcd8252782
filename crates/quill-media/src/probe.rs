use std::path::Path;
use std::process::Command;

use crate::store::MediaError;

/// External media-duration prober. Production shells out to ffprobe; tests
/// substitute a stub.
pub trait MediaProbe: Send + Sync {
    fn duration_secs(&self, path: &Path) -> Result<f64, MediaError>;
}

/// Probes duration by invoking `ffprobe` and reading its JSON output.
pub struct FfprobeProbe;

impl MediaProbe for FfprobeProbe {
    fn duration_secs(&self, path: &Path) -> Result<f64, MediaError> {
        let output = Command::new("ffprobe")
            .args(["-v", "error", "-show_entries", "format=duration", "-of", "json"])
            .arg(path)
            .output()
            .map_err(|e| MediaError::Probe(format!("ffprobe failed to start: {}", e)))?;

        if !output.status.success() {
            return Err(MediaError::Probe(format!(
                "ffprobe exited with {}",
                output.status
            )));
        }

        let parsed: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| MediaError::Probe(format!("unreadable ffprobe output: {}", e)))?;

        parsed["format"]["duration"]
            .as_str()
            .and_then(|d| d.parse::<f64>().ok())
            .ok_or_else(|| MediaError::Probe("no duration in ffprobe output".into()))
    }
}
