//! Shared playback session state and the closed set of bus events the
//! tutorials react to. Kept free of any live pipeline handle so the
//! transition and seek logic is testable without a GStreamer runtime.

use gst::prelude::*;

/// Seconds of playback after which the one-shot seek fires.
pub const SEEK_TRIGGER_SECS: u64 = 10;
/// Seek destination, in seconds from the start of the stream.
pub const SEEK_TARGET_SECS: u64 = 30;

/// Bus messages of interest, decoded into a closed sum type. Anything the
/// tutorials do not handle decodes to `None` in [`PlaybackEvent::from_message`],
/// so every `match` on this enum is exhaustive with no unreachable arm.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// Stream-reported error with the human-readable message and the
    /// optional debug detail attached to the bus message.
    Error {
        source: Option<String>,
        message: String,
        debug: Option<String>,
    },
    EndOfStream,
    StateChanged {
        old: gst::State,
        current: gst::State,
        pending: gst::State,
        /// Whether the message originated from the top-level pipeline, as
        /// opposed to one of its children. Only pipeline-level transitions
        /// drive the session.
        from_pipeline: bool,
    },
    /// The stream duration changed; the cached value must be re-queried.
    DurationChanged,
}

impl PlaybackEvent {
    /// Decode a raw bus message. `pipeline` tells pipeline-level state
    /// changes apart from per-element ones.
    pub fn from_message(msg: &gst::Message, pipeline: &gst::Element) -> Option<Self> {
        use gst::MessageView;

        match msg.view() {
            MessageView::Error(err) => Some(Self::Error {
                source: err.src().map(|s| s.path_string().to_string()),
                message: err.error().to_string(),
                debug: err.debug().map(|d| d.to_string()),
            }),
            MessageView::Eos(..) => Some(Self::EndOfStream),
            MessageView::StateChanged(state_changed) => Some(Self::StateChanged {
                old: state_changed.old(),
                current: state_changed.current(),
                pending: state_changed.pending(),
                from_pipeline: state_changed
                    .src()
                    .map(|s| s == *pipeline)
                    .unwrap_or(false),
            }),
            MessageView::DurationChanged(..) => Some(Self::DurationChanged),
            _ => None,
        }
    }
}

/// Everything a tutorial session carries between bus events and periodic
/// ticks. There is exactly one writer at a time: the seeking tutorial wraps
/// it in `Arc<Mutex<..>>` because its bus-watch and timer closures run as
/// separate main-loop tasks.
#[derive(Debug, Default)]
pub struct SessionState {
    pub playing: bool,
    pub terminate: bool,
    pub seek_enabled: bool,
    pub seek_done: bool,
    /// Cached stream duration; `None` means "query again on the next tick".
    pub duration: Option<gst::ClockTime>,
    /// Range reported by the seeking query, if it succeeded.
    pub seek_range: Option<(gst::GenericFormattedValue, gst::GenericFormattedValue)>,
}

impl SessionState {
    /// Fold one bus event into the session. Returns `true` when the
    /// pipeline just entered PLAYING, which is the moment seek capability
    /// can be queried.
    pub fn apply(&mut self, event: &PlaybackEvent) -> bool {
        match event {
            PlaybackEvent::Error {
                source,
                message,
                debug,
            } => {
                log::error!("Error received from element {source:?}: {message} ({debug:?})");
                self.terminate = true;
                false
            }
            PlaybackEvent::EndOfStream => {
                log::info!("End-Of-Stream reached.");
                self.terminate = true;
                false
            }
            PlaybackEvent::DurationChanged => {
                self.duration = gst::ClockTime::NONE;
                false
            }
            PlaybackEvent::StateChanged {
                old,
                current,
                from_pipeline,
                ..
            } => {
                // State changes of child elements are not tracked.
                if !*from_pipeline {
                    return false;
                }
                log::info!("Pipeline state changed from {old:?} to {current:?}");
                let was_playing = self.playing;
                self.playing = *current == gst::State::Playing;
                self.playing && !was_playing
            }
        }
    }

    /// One-shot seek decision. Yields the fixed target at most once per
    /// session, and only while seeking is known to be enabled.
    pub fn seek_target(&mut self, position: gst::ClockTime) -> Option<gst::ClockTime> {
        if self.seek_enabled
            && !self.seek_done
            && position > SEEK_TRIGGER_SECS * gst::ClockTime::SECOND
        {
            self.seek_done = true;
            Some(SEEK_TARGET_SECS * gst::ClockTime::SECOND)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline_state_change(old: gst::State, current: gst::State) -> PlaybackEvent {
        PlaybackEvent::StateChanged {
            old,
            current,
            pending: gst::State::VoidPending,
            from_pipeline: true,
        }
    }

    #[test]
    fn error_marks_terminate() {
        let mut session = SessionState::default();
        let entered = session.apply(&PlaybackEvent::Error {
            source: Some("pipeline0/source".into()),
            message: "resource not found".into(),
            debug: None,
        });
        assert!(!entered);
        assert!(session.terminate);
    }

    #[test]
    fn end_of_stream_marks_terminate() {
        let mut session = SessionState::default();
        session.apply(&PlaybackEvent::EndOfStream);
        assert!(session.terminate);
    }

    #[test]
    fn entering_playing_is_reported_once() {
        let mut session = SessionState::default();
        assert!(session.apply(&pipeline_state_change(
            gst::State::Paused,
            gst::State::Playing
        )));
        assert!(session.playing);
        // A repeated PLAYING notification is not a fresh entry.
        assert!(!session.apply(&pipeline_state_change(
            gst::State::Playing,
            gst::State::Playing
        )));
    }

    #[test]
    fn leaving_playing_clears_the_flag() {
        let mut session = SessionState {
            playing: true,
            ..Default::default()
        };
        assert!(!session.apply(&pipeline_state_change(
            gst::State::Playing,
            gst::State::Paused
        )));
        assert!(!session.playing);
    }

    #[test]
    fn child_element_state_changes_are_ignored() {
        let mut session = SessionState::default();
        let entered = session.apply(&PlaybackEvent::StateChanged {
            old: gst::State::Paused,
            current: gst::State::Playing,
            pending: gst::State::VoidPending,
            from_pipeline: false,
        });
        assert!(!entered);
        assert!(!session.playing);
    }

    #[test]
    fn duration_change_invalidates_the_cache() {
        let mut session = SessionState {
            duration: Some(42 * gst::ClockTime::SECOND),
            ..Default::default()
        };
        session.apply(&PlaybackEvent::DurationChanged);
        assert!(session.duration.is_none());
    }

    #[test]
    fn seek_fires_exactly_once_past_the_threshold() {
        let mut session = SessionState {
            seek_enabled: true,
            ..Default::default()
        };
        assert_eq!(session.seek_target(9 * gst::ClockTime::SECOND), None);
        assert_eq!(
            session.seek_target(11 * gst::ClockTime::SECOND),
            Some(SEEK_TARGET_SECS * gst::ClockTime::SECOND)
        );
        // Still past the threshold on later ticks, but the seek is spent.
        assert_eq!(session.seek_target(31 * gst::ClockTime::SECOND), None);
        assert_eq!(session.seek_target(12 * gst::ClockTime::SECOND), None);
    }

    #[test]
    fn seek_never_fires_while_disabled() {
        let mut session = SessionState::default();
        assert_eq!(session.seek_target(11 * gst::ClockTime::SECOND), None);
        assert!(!session.seek_done);
    }
}
