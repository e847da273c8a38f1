use std::{
    env,
    io::{self, Write},
    process,
};

use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use ac_remux::{
    cli::{self, Action, ErrorReporter},
    Error, RemuxRequest, Remuxer,
};

/// Initialize the tracing subscriber. The verbosity can be overridden using
/// the `RUST_LOG` environment variable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Forward FFmpeg log messages into tracing.
fn init_ffmpeg_logging() {
    ac_remux::set_log_callback(|level, msg| {
        if level <= 16 {
            error!(target: "ffmpeg", "{}", msg);
        } else if level <= 24 {
            warn!(target: "ffmpeg", "{}", msg);
        } else if level <= 32 {
            info!(target: "ffmpeg", "{}", msg);
        } else {
            debug!(target: "ffmpeg", "{}", msg);
        }
    });
}

/// Run a given remux request.
fn remux(request: &RemuxRequest) -> Result<(), Error> {
    let report = Remuxer::new().run(request)?;

    info!(
        input = request.input(),
        output = request.output(),
        "remux finished: {}",
        report
    );

    Ok(())
}

fn main() {
    init_tracing();
    init_ffmpeg_logging();

    let args = env::args_os().collect::<Vec<_>>();

    let program = args
        .first()
        .map(|arg| arg.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("ac-remux"));

    let reporter = ErrorReporter::new(program);

    let res = cli::parse_args(args).and_then(|action| match action {
        Action::Print(text) => {
            print!("{}", text);
            Ok(())
        }
        Action::Remux(request) => remux(&request),
    });

    if let Err(err) = res {
        // verbose descriptions may precede the error
        let _ = io::stdout().flush();

        reporter.report(&err);

        process::exit(reporter.exit_code(&err));
    }
}
