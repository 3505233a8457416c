//! Basic tutorial 4: time management and seeking.
//!
//! A single `playbin` does all the media work. Instead of a timed bus pop
//! that doubles as a timer, two tasks share a glib main loop: a bus watch
//! folds messages into the session and a 100 ms timer does the periodic
//! work (position/duration reporting and the one-shot seek). The session
//! sits behind a mutex because the two closures are separate main-loop
//! sources.

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use gst::prelude::*;

use crate::session::{PlaybackEvent, SessionState, SEEK_TRIGGER_SECS};
use crate::{make_element, MEDIA_URI};

/// How often the periodic task wakes up.
const TICK_INTERVAL: Duration = Duration::from_millis(100);

pub fn run() -> anyhow::Result<()> {
    gst::init().context("failed to init gstreamer")?;

    let playbin = make_element("playbin", "playbin")?;
    playbin.set_property("uri", MEDIA_URI);

    let session = Arc::new(Mutex::new(SessionState::default()));
    let main_loop = glib::MainLoop::new(None, false);
    let bus = playbin.bus().context("playbin has no bus")?;

    // Event-wait task: decode bus messages and fold them into the session;
    // quit the loop once an error or EOS came in.
    let watch_session = session.clone();
    let loop_clone = main_loop.clone();
    let playbin_weak = playbin.downgrade();
    bus.add_watch(move |_, msg| {
        let playbin = match playbin_weak.upgrade() {
            Some(playbin) => playbin,
            None => return glib::Continue(false),
        };

        if let Some(event) = PlaybackEvent::from_message(msg, &playbin) {
            let mut session = watch_session.lock().unwrap();
            let entered_playing = session.apply(&event);
            if entered_playing {
                // Seeks and time queries only get valid replies from PAUSED
                // onwards, so this is the earliest reliable moment to ask.
                query_seek_capability(&playbin, &mut session);
            }
            if session.terminate {
                loop_clone.quit();
            }
        }

        glib::Continue(true)
    })
    .context("failed to add bus watch")?;

    // Periodic-timer task.
    let tick_session = session.clone();
    let playbin_weak = playbin.downgrade();
    let timer = glib::timeout_add(TICK_INTERVAL, move || {
        let playbin = match playbin_weak.upgrade() {
            Some(playbin) => playbin,
            None => return glib::Continue(false),
        };
        let mut session = tick_session.lock().unwrap();
        monitor_tick(&playbin, &mut session);
        glib::Continue(true)
    });

    playbin
        .set_state(gst::State::Playing)
        .context("unable to set the pipeline to the `Playing` state")?;

    main_loop.run();

    timer.remove();
    bus.remove_watch().context("failed to remove bus watch")?;
    playbin
        .set_state(gst::State::Null)
        .context("unable to set the pipeline to the `Null` state")?;

    Ok(())
}

/// Ask the pipeline whether the stream supports seeking, and in what range.
/// A failed query leaves seeking disabled.
fn query_seek_capability(playbin: &gst::Element, session: &mut SessionState) {
    let mut seeking = gst::query::Seeking::new(gst::Format::Time);
    if playbin.query(&mut seeking) {
        let (seekable, start, end) = seeking.result();
        session.seek_enabled = seekable;
        session.seek_range = Some((start, end));
        if seekable {
            log::info!("Seeking is enabled from {start} to {end}");
        } else {
            log::info!("Seeking is disabled for this stream.");
        }
    } else {
        log::error!("Seeking query failed.");
    }
}

/// One periodic tick. Only does work in the PLAYING state, where position
/// and duration queries are meaningful. Query failures are logged and
/// retried naturally on the next tick.
fn monitor_tick(playbin: &gst::Element, session: &mut SessionState) {
    if !session.playing {
        return;
    }

    let position = playbin.query_position::<gst::ClockTime>();
    if position.is_none() {
        log::error!("Could not query current position.");
    }

    if session.duration.is_none() {
        session.duration = playbin.query_duration();
        if session.duration.is_none() {
            log::error!("Could not query current duration.");
        }
    }

    if let Some(position) = position {
        // Rewrite the same terminal line instead of scrolling.
        print!(
            "\r{}Position {} / {}",
            termion::clear::CurrentLine,
            position,
            session.duration.display()
        );
        let _ = std::io::stdout().flush();

        if let Some(target) = session.seek_target(position) {
            println!();
            log::info!("Reached {SEEK_TRIGGER_SECS}s, performing seek...");
            // FLUSH drops everything already buffered before the jump;
            // KEY_UNIT snaps to the nearest key frame so output resumes
            // straight away.
            if playbin
                .seek_simple(gst::SeekFlags::FLUSH | gst::SeekFlags::KEY_UNIT, target)
                .is_err()
            {
                log::error!("Seek to {target} failed.");
            }
        }
    }
}
