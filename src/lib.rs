use anyhow::Context;

pub mod concepts;
pub mod dynamic_pads;
pub mod seeking;
pub mod session;

/// Media clip used by every tutorial, compiled in just like in the C
/// originals. No command-line configuration on purpose.
pub const MEDIA_URI: &str =
    "https://www.freedesktop.org/software/gstreamer-sdk/data/media/sintel_trailer-480p.webm";

/// Instantiate an element by factory name. Naming each element keeps bus
/// messages and failure diagnostics readable.
pub fn make_element(factory: &str, name: &str) -> anyhow::Result<gst::Element> {
    gst::ElementFactory::make(factory, Some(name))
        .with_context(|| format!("could not create `{factory}` element `{name}`"))
}
