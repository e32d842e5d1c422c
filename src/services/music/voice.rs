use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use serenity::all::{Cache, ChannelId, CreateEmbed, CreateMessage, GuildId, Http, UserId};
use songbird::input::HttpRequest;
use songbird::tracks::TrackHandle;
use songbird::{Call, Event, EventContext, EventHandler, Songbird, TrackEvent};
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, warn};

use crate::bot::error::Error;
use crate::constants::embeds;
use crate::services::music::track::{format_track_duration, TrackInfo};

/// Fires exactly once when the active play finishes, including on forced
/// stop.
pub type PlaybackDone = oneshot::Receiver<()>;

/// A guild's live voice session, as the player loop sees it. The production
/// implementation wraps a songbird call; tests substitute their own.
#[async_trait]
pub trait VoiceSession: Send + Sync {
    /// Start playing a resolved track. The returned receiver completes when
    /// playback ends for any reason.
    async fn play(&self, track: &TrackInfo, volume: f32) -> Result<PlaybackDone, Error>;

    /// Force the current play to finish, firing its completion.
    async fn stop_current(&self);

    async fn pause(&self) -> Result<(), Error>;
    async fn resume(&self) -> Result<(), Error>;

    /// Adjust the gain of the track currently playing, if any. Queued
    /// tracks pick the new level up when they start.
    async fn set_volume(&self, volume: f32);

    /// Non-bot members currently in the bot's voice channel.
    fn listener_count(&self) -> usize;

    /// Best-effort user-visible messages in the invoking text channel.
    async fn announce_now_playing(&self, track: &TrackInfo);
    async fn announce_error(&self, message: &str);

    /// Tear down the voice connection.
    async fn disconnect(&self);
}

/// Songbird-backed session bound to one guild and the text channel the
/// player was summoned from.
pub struct SongbirdSession {
    manager: Arc<Songbird>,
    call: Arc<Mutex<Call>>,
    http: Arc<Http>,
    cache: Arc<Cache>,
    client: reqwest::Client,
    guild_id: GuildId,
    text_channel_id: ChannelId,
    bot_user_id: UserId,
    current: StdMutex<Option<TrackHandle>>,
}

impl SongbirdSession {
    pub fn new(
        manager: Arc<Songbird>,
        call: Arc<Mutex<Call>>,
        http: Arc<Http>,
        cache: Arc<Cache>,
        guild_id: GuildId,
        text_channel_id: ChannelId,
        bot_user_id: UserId,
    ) -> Self {
        Self {
            manager,
            call,
            http,
            cache,
            client: reqwest::Client::new(),
            guild_id,
            text_channel_id,
            bot_user_id,
            current: StdMutex::new(None),
        }
    }

    fn take_current(&self) -> Option<TrackHandle> {
        self.current.lock().ok().and_then(|mut guard| guard.take())
    }

    async fn send_embed(&self, embed: CreateEmbed) {
        let message = CreateMessage::new().embed(embed);
        if let Err(e) = self.text_channel_id.send_message(&self.http, message).await {
            debug!("Failed to send player message: {:?}", e);
        }
    }
}

/// Bridges songbird's track-end callback into a single-fire channel the
/// player loop awaits. Registered for both End and Error so the loop can
/// never hang on a broken stream.
struct PlaybackEndNotifier {
    tx: Arc<StdMutex<Option<oneshot::Sender<()>>>>,
}

#[async_trait]
impl EventHandler for PlaybackEndNotifier {
    async fn act(&self, _ctx: &EventContext<'_>) -> Option<Event> {
        if let Ok(mut guard) = self.tx.lock() {
            if let Some(tx) = guard.take() {
                let _ = tx.send(());
            }
        }
        None
    }
}

#[async_trait]
impl VoiceSession for SongbirdSession {
    async fn play(&self, track: &TrackInfo, volume: f32) -> Result<PlaybackDone, Error> {
        let input = HttpRequest::new(self.client.clone(), track.stream_url.clone());

        let handle = {
            let mut call = self.call.lock().await;
            call.play_input(input.into())
        };

        if let Err(e) = handle.set_volume(volume) {
            warn!("Failed to set volume: {:?}", e);
        }

        let (tx, rx) = oneshot::channel();
        let tx = Arc::new(StdMutex::new(Some(tx)));

        for event in [TrackEvent::End, TrackEvent::Error] {
            handle
                .add_event(
                    Event::Track(event),
                    PlaybackEndNotifier { tx: Arc::clone(&tx) },
                )
                .map_err(|e| Error::Voice(format!("failed to watch track: {:?}", e)))?;
        }

        if let Ok(mut guard) = self.current.lock() {
            *guard = Some(handle);
        }

        Ok(rx)
    }

    async fn stop_current(&self) {
        if let Some(handle) = self.take_current() {
            if let Err(e) = handle.stop() {
                debug!("Stop on finished track: {:?}", e);
            }
        }
    }

    async fn pause(&self) -> Result<(), Error> {
        let guard = self.current.lock().map_err(|_| Error::Voice("player state poisoned".into()))?;
        match guard.as_ref() {
            Some(handle) => handle.pause().map_err(|e| Error::Voice(e.to_string())),
            None => Err(Error::custom("I am not currently playing anything!")),
        }
    }

    async fn resume(&self) -> Result<(), Error> {
        let guard = self.current.lock().map_err(|_| Error::Voice("player state poisoned".into()))?;
        match guard.as_ref() {
            Some(handle) => handle.play().map_err(|e| Error::Voice(e.to_string())),
            None => Err(Error::custom("I am not currently playing anything!")),
        }
    }

    async fn set_volume(&self, volume: f32) {
        let handle = self.current.lock().ok().and_then(|guard| guard.clone());
        if let Some(handle) = handle {
            if let Err(e) = handle.set_volume(volume) {
                debug!("Volume change on finished track: {:?}", e);
            }
        }
    }

    fn listener_count(&self) -> usize {
        let Some(guild) = self.cache.guild(self.guild_id) else {
            return 0;
        };

        let Some(bot_channel) = guild
            .voice_states
            .get(&self.bot_user_id)
            .and_then(|vs| vs.channel_id)
        else {
            return 0;
        };

        guild
            .voice_states
            .values()
            .filter(|vs| vs.channel_id == Some(bot_channel))
            .filter(|vs| {
                guild
                    .members
                    .get(&vs.user_id)
                    .map(|m| !m.user.bot)
                    .unwrap_or(false)
            })
            .count()
    }

    async fn announce_now_playing(&self, track: &TrackInfo) {
        let mut embed = embeds::info_embed()
            .title("Now playing")
            .description(format!("```css\n{}\n```", track.title))
            .field("Duration", format_track_duration(track.duration_seconds), true)
            .field("Requested by", format!("<@{}>", track.requester), true)
            .field("URL", format!("[Click]({})", track.webpage_url), true);

        if let Some(uploader) = &track.uploader {
            embed = embed.field("Uploader", uploader.clone(), true);
        }
        if let Some(thumbnail) = &track.thumbnail {
            embed = embed.thumbnail(thumbnail.clone());
        }

        self.send_embed(embed).await;
    }

    async fn announce_error(&self, message: &str) {
        self.send_embed(embeds::error_embed().description(message.to_string())).await;
    }

    async fn disconnect(&self) {
        self.stop_current().await;
        if let Err(e) = self.manager.remove(self.guild_id).await {
            debug!("Voice disconnect for {}: {:?}", self.guild_id, e);
        }
    }
}
