//! Basic tutorial 3: dynamic pipelines.
//!
//! `uridecodebin` only exposes its source pads once the demuxer has seen
//! enough data, so the source is left unlinked at construction time and the
//! audio branch (`audioconvert -> audioresample -> autoaudiosink`) is
//! completed from a pad-added subscription at runtime.

use anyhow::Context;
use gst::prelude::*;

use crate::session::{PlaybackEvent, SessionState};
use crate::{make_element, MEDIA_URI};

/// Caps family the audio branch accepts.
const RAW_AUDIO_PREFIX: &str = "audio/x-raw";

/// What to do with a pad that just appeared on the decoding source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PadVerdict {
    /// The converter's sink pad already has a peer; every later pad is
    /// ignored, no matter its type.
    AlreadyLinked,
    /// Wrong media type, or caps not negotiated yet; leave the pad alone.
    Ignore { pad_type: Option<String> },
    /// Raw audio; attempt the link.
    Link { pad_type: String },
}

/// Decide whether a newly appeared source pad should be linked into the
/// audio branch. The idempotence guard comes first: the source may announce
/// any number of pads and only the first matching one may produce a link.
/// A pad without negotiated caps never links.
pub fn classify_new_pad(sink_already_linked: bool, pad_type: Option<&str>) -> PadVerdict {
    if sink_already_linked {
        return PadVerdict::AlreadyLinked;
    }
    match pad_type {
        Some(name) if name.starts_with(RAW_AUDIO_PREFIX) => PadVerdict::Link {
            pad_type: name.to_string(),
        },
        other => PadVerdict::Ignore {
            pad_type: other.map(str::to_string),
        },
    }
}

pub fn run() -> anyhow::Result<()> {
    gst::init().context("failed to init gstreamer")?;

    let source = make_element("uridecodebin", "source")?;
    let convert = make_element("audioconvert", "convert")?;
    let resample = make_element("audioresample", "resample")?;
    let sink = make_element("autoaudiosink", "sink")?;

    let pipeline = gst::Pipeline::new(Some("test-pipeline"));
    pipeline
        .add_many(&[&source, &convert, &resample, &sink])
        .context("could not add elements to the pipeline")?;

    // Only the audio branch can be linked up front; the source has no
    // source pads yet.
    gst::Element::link_many(&[&convert, &resample, &sink])
        .context("elements could not be linked")?;

    source.set_property("uri", MEDIA_URI);

    // Subscribed once, before playback starts; the framework delivers one
    // notification per discovered pad on its own thread.
    source.connect_pad_added(move |src, src_pad| {
        log::info!("Received new pad {} from {}", src_pad.name(), src.name());

        let sink_pad = match convert.static_pad("sink") {
            Some(pad) => pad,
            None => {
                log::error!("Converter has no sink pad.");
                return;
            }
        };

        let pad_type = src_pad
            .current_caps()
            .and_then(|caps| caps.structure(0).map(|s| s.name().to_string()));

        match classify_new_pad(sink_pad.is_linked(), pad_type.as_deref()) {
            PadVerdict::AlreadyLinked => log::info!("We are already linked. Ignoring."),
            PadVerdict::Ignore { pad_type } => {
                log::info!("It has type {pad_type:?} which is not raw audio. Ignoring.")
            }
            // A failed link is not fatal: the pipeline stays partially
            // connected and surfaces any stall as a bus error later.
            PadVerdict::Link { pad_type } => {
                if src_pad.link(&sink_pad).is_err() {
                    log::error!("Type is {pad_type} but link failed.");
                } else {
                    log::info!("Link succeeded (type {pad_type}).");
                }
            }
        }
    });

    pipeline
        .set_state(gst::State::Playing)
        .context("unable to set the pipeline to the `Playing` state")?;

    let bus = pipeline.bus().context("pipeline has no bus")?;
    let mut session = SessionState::default();
    for msg in bus.iter_timed(gst::ClockTime::NONE) {
        if let Some(event) = PlaybackEvent::from_message(&msg, pipeline.upcast_ref()) {
            session.apply(&event);
        }
        if session.terminate {
            break;
        }
    }

    pipeline
        .set_state(gst::State::Null)
        .context("unable to set the pipeline to the `Null` state")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_audio_pad_links() {
        assert_eq!(
            classify_new_pad(false, Some("audio/x-raw")),
            PadVerdict::Link {
                pad_type: "audio/x-raw".into()
            }
        );
    }

    #[test]
    fn video_pad_is_declined() {
        assert_eq!(
            classify_new_pad(false, Some("video/x-raw")),
            PadVerdict::Ignore {
                pad_type: Some("video/x-raw".into())
            }
        );
    }

    #[test]
    fn missing_caps_never_link() {
        assert_eq!(
            classify_new_pad(false, None),
            PadVerdict::Ignore { pad_type: None }
        );
    }

    #[test]
    fn linked_sink_ignores_everything() {
        assert_eq!(
            classify_new_pad(true, Some("audio/x-raw")),
            PadVerdict::AlreadyLinked
        );
        assert_eq!(classify_new_pad(true, None), PadVerdict::AlreadyLinked);
    }

    /// A decodebin announcing video first, then audio, then more pads: the
    /// video pad is declined, the audio pad links, and every pad after the
    /// link is ignored regardless of type.
    #[test]
    fn video_then_audio_sequence_links_once() {
        let mut linked = false;

        assert!(matches!(
            classify_new_pad(linked, Some("video/x-raw")),
            PadVerdict::Ignore { .. }
        ));

        match classify_new_pad(linked, Some("audio/x-raw")) {
            PadVerdict::Link { .. } => linked = true,
            other => panic!("expected a link, got {other:?}"),
        }

        for pad_type in [Some("audio/x-raw"), Some("video/x-raw"), None] {
            assert_eq!(classify_new_pad(linked, pad_type), PadVerdict::AlreadyLinked);
        }
    }
}
