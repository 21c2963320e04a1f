use crate::ScrapeError;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Path of a playlist's artifact: `<outdir>/<title>.json`
pub fn artifact_path(outdir: &Path, title: &str) -> PathBuf {
    outdir.join(format!("{}.json", title))
}

/// Renders items as an indented JSON array with a trailing newline
///
/// Non-ASCII text is written as-is, not escaped.
pub fn render_artifact(items: &[Value]) -> Result<String, ScrapeError> {
    let mut rendered = serde_json::to_string_pretty(items)?;
    rendered.push('\n');
    Ok(rendered)
}

/// Writes one playlist's sorted items, creating `outdir` if needed
pub async fn write_playlist(
    outdir: &Path,
    title: &str,
    items: &[Value],
) -> Result<PathBuf, ScrapeError> {
    tokio::fs::create_dir_all(outdir).await?;

    let path = artifact_path(outdir, title);
    let rendered = render_artifact(items)?;
    tokio::fs::write(&path, rendered).await?;

    Ok(path)
}
