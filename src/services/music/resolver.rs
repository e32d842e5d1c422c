use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tracing::debug;

use crate::bot::error::Error;
use crate::services::music::track::{QueuedTrack, TrackInfo};

/// Result of resolving a search string: a single playable track, or a
/// playlist expanded into lightweight unresolved references.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Track(TrackInfo),
    Playlist(Vec<QueuedTrack>),
}

/// Metadata lookup for playable sources. Network-bound; the player only ever
/// calls it from its own task so other guilds keep playing.
#[async_trait]
pub trait SourceResolver: Send + Sync {
    async fn resolve(&self, query: &str, requester: u64) -> Result<Resolution, Error>;

    /// Freshly resolve a known page URL. Stream URLs expire, so this is used
    /// both for lazy queue entries and for replaying under track-loop.
    async fn refresh(&self, webpage_url: &str, requester: u64) -> Result<TrackInfo, Error>;
}

/// Resolver backed by the `yt-dlp` CLI, parsing its single-JSON output.
pub struct YtDlpResolver {
    binary: String,
}

impl YtDlpResolver {
    pub fn new() -> Self {
        Self { binary: "yt-dlp".to_string() }
    }

    async fn dump_json(&self, args: &[&str]) -> Result<Value, Error> {
        debug!("Invoking {} {:?}", self.binary, args);

        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .await
            .map_err(|e| Error::Resolution(format!("failed to run {}: {}", self.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let line = stderr.lines().last().unwrap_or("unknown error");
            return Err(Error::Resolution(line.to_string()));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| Error::Resolution(format!("unreadable metadata: {}", e)))
    }
}

impl Default for YtDlpResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceResolver for YtDlpResolver {
    async fn resolve(&self, query: &str, requester: u64) -> Result<Resolution, Error> {
        let data = self
            .dump_json(&[
                "-J",
                "--no-warnings",
                "-f",
                "bestaudio/best",
                "--default-search",
                "ytsearch",
                query,
            ])
            .await?;

        parse_resolution(&data, requester)
    }

    async fn refresh(&self, webpage_url: &str, requester: u64) -> Result<TrackInfo, Error> {
        let data = self
            .dump_json(&["-J", "--no-warnings", "-f", "bestaudio/best", webpage_url])
            .await?;

        // A direct video URL never expands into multiple entries
        match parse_resolution(&data, requester)? {
            Resolution::Track(info) => Ok(info),
            Resolution::Playlist(_) => {
                Err(Error::Resolution("expected a single track".to_string()))
            }
        }
    }
}

/// Interpret a yt-dlp info dump. Multi-entry results become a playlist of
/// unresolved references; everything else must parse as one full track.
pub fn parse_resolution(data: &Value, requester: u64) -> Result<Resolution, Error> {
    if let Some(entries) = data.get("entries").and_then(Value::as_array) {
        if entries.len() > 1 {
            let tracks = entries
                .iter()
                .filter_map(|entry| {
                    Some(QueuedTrack::Unresolved {
                        webpage_url: str_field(entry, "webpage_url")
                            .or_else(|| str_field(entry, "url"))?,
                        title: str_field(entry, "title")?,
                        requester,
                    })
                })
                .collect::<Vec<_>>();

            if tracks.is_empty() {
                return Err(Error::Resolution("playlist has no playable entries".to_string()));
            }
            return Ok(Resolution::Playlist(tracks));
        }

        let entry = entries
            .first()
            .ok_or_else(|| Error::Resolution("no results for that search".to_string()))?;
        return Ok(Resolution::Track(parse_track(entry, requester)?));
    }

    Ok(Resolution::Track(parse_track(data, requester)?))
}

fn parse_track(data: &Value, requester: u64) -> Result<TrackInfo, Error> {
    let title = str_field(data, "title")
        .ok_or_else(|| Error::Resolution("metadata is missing a title".to_string()))?;
    let stream_url = str_field(data, "url")
        .ok_or_else(|| Error::Resolution("no playable stream found".to_string()))?;
    let webpage_url = str_field(data, "webpage_url").unwrap_or_else(|| stream_url.clone());

    Ok(TrackInfo {
        title,
        stream_url,
        webpage_url,
        duration_seconds: data.get("duration").and_then(Value::as_f64).map(|d| d as u64),
        uploader: str_field(data, "uploader"),
        thumbnail: str_field(data, "thumbnail"),
        requester,
    })
}

fn str_field(data: &Value, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_single_track() {
        let data = json!({
            "title": "Never Gonna Give You Up",
            "url": "https://cdn.example/stream.webm",
            "webpage_url": "https://youtube.example/watch?v=abc",
            "duration": 212.0,
            "uploader": "Rick Astley",
            "thumbnail": "https://img.example/abc.jpg",
        });

        let resolution = parse_resolution(&data, 42).unwrap();
        let Resolution::Track(info) = resolution else {
            panic!("expected a single track");
        };
        assert_eq!(info.title, "Never Gonna Give You Up");
        assert_eq!(info.stream_url, "https://cdn.example/stream.webm");
        assert_eq!(info.duration_seconds, Some(212));
        assert_eq!(info.requester, 42);
    }

    #[test]
    fn test_parse_search_with_one_entry() {
        let data = json!({
            "entries": [{
                "title": "Result",
                "url": "https://cdn.example/a",
                "webpage_url": "https://youtube.example/a",
            }]
        });

        assert!(matches!(parse_resolution(&data, 1).unwrap(), Resolution::Track(_)));
    }

    #[test]
    fn test_parse_playlist_stays_lazy() {
        let data = json!({
            "entries": [
                { "title": "One", "webpage_url": "https://youtube.example/1" },
                { "title": "Two", "webpage_url": "https://youtube.example/2" },
                { "title": "Three", "url": "https://youtube.example/3" },
            ]
        });

        let Resolution::Playlist(tracks) = parse_resolution(&data, 9).unwrap() else {
            panic!("expected a playlist");
        };
        assert_eq!(tracks.len(), 3);
        assert!(tracks
            .iter()
            .all(|t| matches!(t, QueuedTrack::Unresolved { requester: 9, .. })));
        assert_eq!(tracks[2].webpage_url(), "https://youtube.example/3");
    }

    #[test]
    fn test_parse_rejects_streamless_track() {
        let data = json!({ "title": "No stream here" });
        assert!(matches!(parse_resolution(&data, 1), Err(Error::Resolution(_))));
    }

    #[test]
    fn test_parse_rejects_empty_results() {
        let data = json!({ "entries": [] });
        assert!(matches!(parse_resolution(&data, 1), Err(Error::Resolution(_))));
    }
}
