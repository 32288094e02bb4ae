use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::ffi::OsString;
use std::path::PathBuf;

const DEFAULT_SUBSCRIBE_PATH: &str = "/sse";
const DEFAULT_TRIGGER_PATH: &str = "/sse/reload";

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "0.0.0.0")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 3000)]
    pub port: u16,

    /// Directory served as static files at the root path
    #[arg(short, long, env, default_value = ".")]
    root_dir: PathBuf,

    /// Path browsers open an event stream on to wait for reload events
    #[arg(long, env, default_value = DEFAULT_SUBSCRIBE_PATH, value_parser = parse_route_path)]
    subscribe_path: String,

    /// Path that triggers a reload of every connected browser, on any method
    #[arg(long, env, default_value = DEFAULT_TRIGGER_PATH, value_parser = parse_route_path)]
    trigger_path: String,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    /// Parse from an explicit argument list instead of the process arguments.
    pub fn parse_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Config::parse_from(args)
    }

    pub fn interface(&self) -> &str {
        self.interface.as_deref().unwrap_or("0.0.0.0")
    }

    /// The `host:port` pair the listener binds to.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.interface(), self.port)
    }

    pub fn set_root_dir(mut self, root_dir: impl Into<PathBuf>) -> Self {
        self.root_dir = root_dir.into();
        self
    }

    pub fn root_dir(&self) -> &PathBuf {
        &self.root_dir
    }

    pub fn subscribe_path(&self) -> &str {
        &self.subscribe_path
    }

    pub fn trigger_path(&self) -> &str {
        &self.trigger_path
    }
}

/// Route paths must be absolute for the router to accept them.
fn parse_route_path(path: &str) -> Result<String, String> {
    if path.starts_with('/') {
        Ok(path.to_string())
    } else {
        Err(format!("route path must start with '/': {path}"))
    }
}
