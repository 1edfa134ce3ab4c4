use buttonbox_link::DEFAULT_BAUD_RATE;

const HELP: &str = "\
Buttonbox - host processor for the illuminated pushbutton panel

Keeps the serial link to the panel alive, toggles button LEDs on every
press, and accepts raw LED command bytes over HTTP.

USAGE:
  buttonbox [OPTIONS] <PORT>

ARGS:
  <PORT>                Serial device of the panel (e.g. /dev/ttyUSB0)

OPTIONS:
  -h, --help            Prints help information
  --baud <rate>         Serial line rate (default: 9600)
  --http <addr>         Control API listen address (default: 0.0.0.0:8080)
  --no-http             Do not start the control API
  -v, --verbose         Show connection and worker events
  -vv, --trace          Show every byte on the link
  --log <file>          Write log output to file instead of stderr
";

pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";

/// Verbosity level for log output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Connection state changes and errors
    #[default]
    Quiet = 0,
    /// Worker start/stop, session events
    Verbose = 1,
    /// Individual link bytes
    Trace = 2,
}

#[derive(Debug)]
pub struct AppArgs {
    pub port: String,
    pub baud_rate: u32,
    pub http_addr: Option<String>,
    pub verbosity: Verbosity,
    pub log_file: Option<String>,
}

pub fn parse_args() -> Result<AppArgs, pico_args::Error> {
    let mut pargs = pico_args::Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{}", HELP);
        std::process::exit(0);
    }

    from_pargs(pargs)
}

fn from_pargs(mut pargs: pico_args::Arguments) -> Result<AppArgs, pico_args::Error> {
    let verbosity = if pargs.contains("--trace") || pargs.contains("-vv") {
        Verbosity::Trace
    } else if pargs.contains(["-v", "--verbose"]) {
        Verbosity::Verbose
    } else {
        Verbosity::Quiet
    };

    let no_http = pargs.contains("--no-http");
    let http_addr: Option<String> = pargs.opt_value_from_str("--http")?;

    let args = AppArgs {
        baud_rate: pargs
            .opt_value_from_str("--baud")?
            .unwrap_or(DEFAULT_BAUD_RATE),
        http_addr: if no_http {
            None
        } else {
            Some(http_addr.unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string()))
        },
        verbosity,
        log_file: pargs.opt_value_from_str("--log")?,
        port: pargs.free_from_str()?,
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        eprintln!("Warning: unused arguments left: {:?}.", remaining);
    }

    Ok(args)
}
