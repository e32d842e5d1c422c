/// Fully resolved, playable track metadata. `stream_url` points at the raw
/// audio stream and expires after a while, so anything that sat in the queue
/// gets re-resolved just before playback.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackInfo {
    pub title: String,
    pub stream_url: String,
    pub webpage_url: String,
    pub duration_seconds: Option<u64>,
    pub uploader: Option<String>,
    pub thumbnail: Option<String>,
    /// User who requested the track
    pub requester: u64,
}

/// A queue entry: either fully resolved or a lightweight reference that is
/// resolved lazily when it reaches the front. Playlist expansion always
/// enqueues unresolved references so adding a 200-entry playlist doesn't
/// trigger 200 metadata lookups.
#[derive(Debug, Clone, PartialEq)]
pub enum QueuedTrack {
    Unresolved {
        webpage_url: String,
        title: String,
        requester: u64,
    },
    Resolved(TrackInfo),
}

impl QueuedTrack {
    pub fn title(&self) -> &str {
        match self {
            QueuedTrack::Unresolved { title, .. } => title,
            QueuedTrack::Resolved(info) => &info.title,
        }
    }

    pub fn webpage_url(&self) -> &str {
        match self {
            QueuedTrack::Unresolved { webpage_url, .. } => webpage_url,
            QueuedTrack::Resolved(info) => &info.webpage_url,
        }
    }

    pub fn requester(&self) -> u64 {
        match self {
            QueuedTrack::Unresolved { requester, .. } => *requester,
            QueuedTrack::Resolved(info) => info.requester,
        }
    }

    /// Lightweight reference to a resolved track, used when a finished track
    /// is sent to the back of the queue under queue-loop.
    pub fn reference(info: &TrackInfo) -> Self {
        QueuedTrack::Unresolved {
            webpage_url: info.webpage_url.clone(),
            title: info.title.clone(),
            requester: info.requester,
        }
    }
}

/// `3:05` / `1:02:03` style duration for embeds.
pub fn format_track_duration(seconds: Option<u64>) -> String {
    match seconds {
        None => "Live".to_string(),
        Some(s) => {
            let (h, m, sec) = (s / 3600, (s % 3600) / 60, s % 60);
            if h > 0 {
                format!("{}:{:02}:{:02}", h, m, sec)
            } else {
                format!("{}:{:02}", m, sec)
            }
        }
    }
}
