//! Validation of user-supplied video and playlist URLs

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::models::VideoRef;

static YOUTUBE_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"^(https?://)?(www\.)?youtube\.com/watch\?v=[\w-]+").unwrap(),
        Regex::new(r"^(https?://)?(www\.)?youtube\.com/playlist\?list=[\w-]+").unwrap(),
        Regex::new(r"^(https?://)?(www\.)?youtu\.be/[\w-]+").unwrap(),
    ]
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VideoInputError {
    #[error("Please enter at least one URL")]
    NoUrls,
    #[error("Some URLs are invalid: {}", .0.join(", "))]
    InvalidUrls(Vec<String>),
    #[error("Please enter a playlist URL")]
    EmptyPlaylistUrl,
    #[error("Please enter a valid YouTube playlist URL")]
    InvalidPlaylistUrl(String),
}

/// Whether `url` looks like a YouTube video, playlist or short link
pub fn is_valid_youtube_url(url: &str) -> bool {
    YOUTUBE_PATTERNS.iter().any(|pattern| pattern.is_match(url))
}

/// Validate the URL given for playlist extraction and return it trimmed
pub fn validate_playlist_url(url: &str) -> Result<&str, VideoInputError> {
    let url = url.trim();

    if url.is_empty() {
        return Err(VideoInputError::EmptyPlaylistUrl);
    }

    if !is_valid_youtube_url(url) {
        return Err(VideoInputError::InvalidPlaylistUrl(url.to_string()));
    }

    Ok(url)
}

/// Build the video list for manually entered URLs.
///
/// Blank lines are skipped. Every remaining URL must be valid, otherwise the
/// whole batch is rejected with the offending entries. Videos get ids
/// `manual-<n>` and titles `Video <n+1>` in input order.
pub fn manual_videos<I, S>(lines: I) -> Result<Vec<VideoRef>, VideoInputError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let urls: Vec<String> = lines
        .into_iter()
        .map(|line| line.as_ref().trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    if urls.is_empty() {
        return Err(VideoInputError::NoUrls);
    }

    let invalid: Vec<String> = urls
        .iter()
        .filter(|url| !is_valid_youtube_url(url))
        .cloned()
        .collect();

    if !invalid.is_empty() {
        return Err(VideoInputError::InvalidUrls(invalid));
    }

    Ok(urls
        .into_iter()
        .enumerate()
        .map(|(index, url)| {
            VideoRef::new(format!("manual-{index}"), url).with_title(format!("Video {}", index + 1))
        })
        .collect())
}
