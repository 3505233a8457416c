//! Basic tutorial 2: manual pipeline construction.
//!
//! Builds `videotestsrc -> autovideosink` by hand, links the chain
//! statically, starts playback and blocks on the bus until the stream
//! errors out or ends.

use anyhow::Context;
use gst::prelude::*;

use crate::make_element;
use crate::session::{PlaybackEvent, SessionState};

pub fn run() -> anyhow::Result<()> {
    gst::init().context("failed to init gstreamer")?;

    let source = make_element("videotestsrc", "source")?;
    let sink = make_element("autovideosink", "sink")?;

    let pipeline = gst::Pipeline::new(Some("test-pipeline"));

    // Elements must live in the same bin before they can be linked. The
    // link itself fails when the two pads share no common caps, which is a
    // construction error here.
    pipeline
        .add_many(&[&source, &sink])
        .context("could not add elements to the pipeline")?;
    source
        .link(&sink)
        .context("elements could not be linked")?;

    source.set_property_from_str("pattern", "smpte");

    pipeline
        .set_state(gst::State::Playing)
        .context("unable to set the pipeline to the `Playing` state")?;

    // Nothing periodic to do in this tutorial, so a fully blocking wait
    // filtered down to error/EOS is all the event loop there is.
    let bus = pipeline.bus().context("pipeline has no bus")?;
    let msg = bus.timed_pop_filtered(
        gst::ClockTime::NONE,
        &[gst::MessageType::Error, gst::MessageType::Eos],
    );

    if let Some(msg) = msg {
        let mut session = SessionState::default();
        if let Some(event) = PlaybackEvent::from_message(&msg, pipeline.upcast_ref()) {
            session.apply(&event);
        }
    }

    pipeline
        .set_state(gst::State::Null)
        .context("unable to set the pipeline to the `Null` state")?;

    Ok(())
}
