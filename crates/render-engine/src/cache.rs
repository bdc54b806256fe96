//! Removal of intermediate render and audio files.

use std::path::Path;

use narrator_common::error::NarratorResult;

/// Directory of per-animation segments the renderer leaves next to a video.
pub const PARTIAL_MOVIE_DIR: &str = "partial_movie_files";

/// Remove the renderer's partial movie files for `video`.
///
/// Returns whether anything was removed.
pub fn clean_render_cache(video: &Path) -> NarratorResult<bool> {
    let Some(dir) = video.parent() else {
        return Ok(false);
    };
    remove_dir_if_present(&dir.join(PARTIAL_MOVIE_DIR))
}

/// Remove the synthesized clip cache.
pub fn clean_audio_cache(cache_dir: &Path) -> NarratorResult<bool> {
    remove_dir_if_present(cache_dir)
}

fn remove_dir_if_present(dir: &Path) -> NarratorResult<bool> {
    if !dir.is_dir() {
        return Ok(false);
    }
    std::fs::remove_dir_all(dir)?;
    tracing::debug!(path = %dir.display(), "Removed cache directory");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_cache_removed_next_to_video() {
        let root = std::env::temp_dir().join("narrator_test_render_cache");
        let _ = std::fs::remove_dir_all(&root);
        let video_dir = root.join("videos/demo/480p15");
        let partial = video_dir.join(PARTIAL_MOVIE_DIR).join("Demo");
        std::fs::create_dir_all(&partial).unwrap();
        std::fs::write(partial.join("seg_0.mp4"), b"x").unwrap();
        let video = video_dir.join("Demo.mp4");
        std::fs::write(&video, b"v").unwrap();

        assert!(clean_render_cache(&video).unwrap());
        assert!(!video_dir.join(PARTIAL_MOVIE_DIR).exists());
        assert!(video.exists());
        assert!(!clean_render_cache(&video).unwrap());

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_missing_audio_cache_is_fine() {
        assert!(!clean_audio_cache(Path::new("/nonexistent/narrator/audio")).unwrap());
    }
}
