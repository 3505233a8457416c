use env_logger::Env;
use structopt::{clap::arg_enum, StructOpt};

#[derive(Debug, StructOpt)]
struct Opt {
    /// which tutorial to run. B?=Basic
    #[structopt(possible_values = &Tutorial::variants(), case_insensitive = true)]
    tid: Tutorial,
}

arg_enum! {
    #[derive(Debug)]
    enum Tutorial {
        // Basic tutorial 2: manual pipeline construction
        B2,
        // Basic tutorial 3: dynamic pad linking
        B3,
        // Basic tutorial 4: time management and seeking
        B4,
    }
}

fn main() {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let opt = Opt::from_args();

    let result = match opt.tid {
        Tutorial::B2 => gst_tutorials::concepts::run(),
        Tutorial::B3 => gst_tutorials::dynamic_pads::run(),
        Tutorial::B4 => gst_tutorials::seeking::run(),
    };

    // Setup failures abort with a non-zero status. Errors reported over the
    // bus have already terminated the event loop gracefully and exit with 0.
    if let Err(err) = result {
        log::error!("{err:#}");
        std::process::exit(-1);
    }
}
