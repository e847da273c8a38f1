//! Command line interface.

use std::ffi::OsString;

use clap::{error::ErrorKind as ClapErrorKind, ArgAction, Parser};

use crate::{remux::RemuxRequest, Error, ErrorKind};

/// Minimum number of arguments following the program name.
const MIN_ARGS: usize = 4;

/// Remux a media file into a different container format without
/// re-encoding.
#[derive(Debug, Parser)]
#[command(name = "ac-remux", version)]
struct Arguments {
    /// Input file
    #[arg(short = 'i', value_name = "input")]
    input: Option<String>,

    /// Output file (the container format is guessed from the extension)
    #[arg(short = 'o', value_name = "output")]
    output: Option<String>,

    /// Print the input and output container layout
    #[arg(short = 'v', action = ArgAction::Count)]
    verbose: u8,
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Remux a given input.
    Remux(RemuxRequest),
    /// Print a given text (help or version) and exit.
    Print(String),
}

/// Parse given command line arguments. The first argument is the program
/// name.
pub fn parse_args<I, T>(args: I) -> Result<Action, Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args = args.into_iter().map(|arg| arg.into()).collect::<Vec<OsString>>();

    let info = args
        .iter()
        .skip(1)
        .any(|arg| matches!(arg.to_str(), Some("-h" | "--help" | "-V" | "--version")));

    let count = args.len().saturating_sub(1);

    if !info && count < MIN_ARGS {
        return Err(Error::missing_arguments(format!(
            "not enough arguments ({} out of {} required)",
            count, MIN_ARGS
        )));
    }

    let arguments = match Arguments::try_parse_from(args) {
        Ok(arguments) => arguments,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => {
                return Ok(Action::Print(err.to_string()))
            }
            _ => return Err(Error::invalid_arguments(clap_error_message(&err))),
        },
    };

    let input = arguments
        .input
        .ok_or_else(|| Error::missing_arguments("missing input file (-i <input>)"))?;

    let output = arguments
        .output
        .ok_or_else(|| Error::missing_arguments("missing output file (-o <output>)"))?;

    let request = RemuxRequest::new(input, output, arguments.verbose > 0)?;

    Ok(Action::Remux(request))
}

/// Extract a one-line message from a given clap error.
fn clap_error_message(err: &clap::Error) -> String {
    let msg = err.to_string();

    let line = msg.lines().next().unwrap_or_default();

    line.trim_start_matches("error: ").trim().to_string()
}

/// Renders errors for the user.
pub struct ErrorReporter {
    program: String,
}

impl ErrorReporter {
    /// Create a new reporter. The program name is used in the usage hint.
    pub fn new<T>(program: T) -> Self
    where
        T: Into<String>,
    {
        Self {
            program: program.into(),
        }
    }

    /// Get the usage hint.
    pub fn usage(&self) -> String {
        format!("Usage:\n  {} -i <input> -o <output> [-v]\n", self.program)
    }

    /// Render a given error. Argument errors are followed by the usage hint.
    pub fn render(&self, err: &Error) -> String {
        let kind = err.kind();

        let mut res = format!("[Error {} ({})] {}\n", kind.code(), kind, err.message());

        if kind.is_argument_error() {
            res.push_str(&self.usage());
        }

        res
    }

    /// Print a given error to stderr.
    pub fn report(&self, err: &Error) {
        eprint!("{}", self.render(err));
    }

    /// Get the exit code for a given error.
    pub fn exit_code(&self, err: &Error) -> i32 {
        if err.kind() == ErrorKind::Success {
            0
        } else {
            1
        }
    }
}
