//! Recording transports for engine tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use futures::future::BoxFuture;

use crate::{
    state::{
        ids::{ChannelId, MessageId, SurfaceId, UserId},
        track::Track,
    },
    transport::{
        TrackSource, TrackSourceError, TransportResult, UiTransport, VoiceTransport,
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum UiCall {
    Send {
        surface: SurfaceId,
        content: String,
        reactions: Vec<String>,
    },
    Edit {
        surface: SurfaceId,
        content: String,
    },
    DeleteSurface(SurfaceId),
    DeleteMessage(MessageId),
    RemoveReaction {
        surface: SurfaceId,
        emoji: String,
        user: UserId,
    },
}

#[derive(Debug, Default)]
pub(crate) struct RecordingUi {
    calls: Mutex<Vec<UiCall>>,
}

impl RecordingUi {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn calls(&self) -> Vec<UiCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Latest content shown on a surface, following edits.
    pub(crate) fn content_of(&self, surface: SurfaceId) -> Option<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                UiCall::Send {
                    surface: id,
                    content,
                    ..
                }
                | UiCall::Edit {
                    surface: id,
                    content,
                } if id == surface => Some(content),
                _ => None,
            })
            .last()
    }

    /// Surfaces created so far, in creation order.
    pub(crate) fn surfaces(&self) -> Vec<SurfaceId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                UiCall::Send { surface, .. } => Some(surface),
                _ => None,
            })
            .collect()
    }

    /// Content of reaction-less surfaces (notifications), oldest first.
    pub(crate) fn notices(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                UiCall::Send {
                    content, reactions, ..
                } if reactions.is_empty() => Some(content),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn last_notice(&self) -> Option<String> {
        self.notices().pop()
    }

    pub(crate) fn deleted_messages(&self) -> Vec<MessageId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                UiCall::DeleteMessage(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: UiCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl UiTransport for RecordingUi {
    fn send_surface(
        &self,
        content: String,
        reactions: Vec<String>,
    ) -> BoxFuture<'static, TransportResult<SurfaceId>> {
        let surface = SurfaceId::new();
        self.record(UiCall::Send {
            surface,
            content,
            reactions,
        });
        Box::pin(async move { Ok(surface) })
    }

    fn edit_surface(
        &self,
        surface: SurfaceId,
        content: String,
    ) -> BoxFuture<'static, TransportResult<()>> {
        self.record(UiCall::Edit { surface, content });
        Box::pin(async { Ok(()) })
    }

    fn delete_surface(&self, surface: SurfaceId) -> BoxFuture<'static, TransportResult<()>> {
        self.record(UiCall::DeleteSurface(surface));
        Box::pin(async { Ok(()) })
    }

    fn delete_message(&self, message: MessageId) -> BoxFuture<'static, TransportResult<()>> {
        self.record(UiCall::DeleteMessage(message));
        Box::pin(async { Ok(()) })
    }

    fn remove_reaction(
        &self,
        surface: SurfaceId,
        emoji: String,
        user: UserId,
    ) -> BoxFuture<'static, TransportResult<()>> {
        self.record(UiCall::RemoveReaction {
            surface,
            emoji,
            user,
        });
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum VoiceCall {
    Connect(ChannelId),
    Play(String),
    Pause,
    Resume,
    Stop,
    Disconnect,
}

#[derive(Debug, Default)]
pub(crate) struct RecordingVoice {
    calls: Mutex<Vec<VoiceCall>>,
}

impl RecordingVoice {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn calls(&self) -> Vec<VoiceCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Titles handed to `play`, in order.
    pub(crate) fn played(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                VoiceCall::Play(title) => Some(title),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: VoiceCall) -> BoxFuture<'static, TransportResult<()>> {
        self.calls.lock().unwrap().push(call);
        Box::pin(async { Ok(()) })
    }
}

impl VoiceTransport for RecordingVoice {
    fn connect(&self, channel: ChannelId) -> BoxFuture<'static, TransportResult<()>> {
        self.record(VoiceCall::Connect(channel))
    }

    fn play(&self, track: Track) -> BoxFuture<'static, TransportResult<()>> {
        self.record(VoiceCall::Play(track.title))
    }

    fn pause(&self) -> BoxFuture<'static, TransportResult<()>> {
        self.record(VoiceCall::Pause)
    }

    fn resume(&self) -> BoxFuture<'static, TransportResult<()>> {
        self.record(VoiceCall::Resume)
    }

    fn stop(&self) -> BoxFuture<'static, TransportResult<()>> {
        self.record(VoiceCall::Stop)
    }

    fn disconnect(&self) -> BoxFuture<'static, TransportResult<()>> {
        self.record(VoiceCall::Disconnect)
    }
}

/// Canned track resolver.
#[derive(Debug, Default)]
pub(crate) struct FakeTrackSource {
    searches: Mutex<HashMap<String, Vec<Track>>>,
    by_id: Mutex<HashMap<String, Track>>,
    failing: Mutex<bool>,
}

impl FakeTrackSource {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn with_search(&self, query: &str, tracks: Vec<Track>) {
        for track in &tracks {
            self.with_track(track.clone());
        }
        self.searches
            .lock()
            .unwrap()
            .insert(query.to_string(), tracks);
    }

    pub(crate) fn with_track(&self, track: Track) {
        self.by_id.lock().unwrap().insert(track.content_id(), track);
    }

    pub(crate) fn fail(&self) {
        *self.failing.lock().unwrap() = true;
    }

    fn check(&self, identifier: &str) -> Result<(), TrackSourceError> {
        if *self.failing.lock().unwrap() {
            return Err(TrackSourceError::LoadFailed {
                identifier: identifier.to_string(),
                message: "node offline".into(),
            });
        }
        Ok(())
    }
}

impl TrackSource for FakeTrackSource {
    fn search(&self, query: String) -> BoxFuture<'static, Result<Vec<Track>, TrackSourceError>> {
        let result = self.check(&query).map(|()| {
            self.searches
                .lock()
                .unwrap()
                .get(&query)
                .cloned()
                .unwrap_or_default()
        });
        Box::pin(async move { result })
    }

    fn resolve_by_id(
        &self,
        content_id: String,
    ) -> BoxFuture<'static, Result<Option<Track>, TrackSourceError>> {
        let result = self
            .check(&content_id)
            .map(|()| self.by_id.lock().unwrap().get(&content_id).cloned());
        Box::pin(async move { result })
    }
}
