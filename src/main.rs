use clap::Parser;
use log_tail::{DEFAULT_QUEUE_CAPACITY, SourceConfig, TailConfig, TailStream, default_start_options};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tokio_stream::StreamExt;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

/// Print lines appended to a file as they are written.
#[derive(Parser, Debug)]
#[command(name = "log-tail", version, about)]
struct Cli {
    /// File to follow
    path: PathBuf,

    /// Longest line that can be read, in bytes
    #[arg(long, default_value_t = 64 * 1024)]
    buffer_size: usize,

    /// Lines buffered ahead of the output
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// Grace period before the line source is killed on shutdown
    #[arg(long, default_value_t = 2000)]
    stop_timeout_ms: u64,

    /// Follow the file in-process instead of running `tail`
    #[arg(long)]
    native: bool,

    /// Byte offset to start from (with --native)
    #[arg(long, requires = "native")]
    offset: Option<u64>,

    /// Stop at the current end of file (with --native)
    #[arg(long, requires = "native")]
    no_follow: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Options passed to `tail` before the path
    #[arg(last = true)]
    tail_args: Vec<String>,
}

impl Cli {
    fn config(&self) -> TailConfig {
        let source = if self.native {
            SourceConfig::Native {
                start_offset: self.offset.unwrap_or(0),
                follow: !self.no_follow,
            }
        } else if self.tail_args.is_empty() {
            SourceConfig::process(default_start_options())
        } else {
            SourceConfig::process(self.tail_args.clone())
        };

        TailConfig::new(self.buffer_size)
            .with_queue_capacity(self.queue_capacity)
            .with_stop_timeout(Duration::from_millis(self.stop_timeout_ms))
            .with_source(source)
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    debug!(?cli, "starting");

    let mut tail = match TailStream::with_config(&cli.path, cli.config()).await {
        Ok(tail) => tail,
        Err(e) => {
            eprintln!("Error starting tail: {}", e);
            process::exit(1);
        }
    };

    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            line = tail.next() => match line {
                Some(line) => println!("{}", line),
                None => break,
            },
            _ = &mut interrupted => {
                debug!("interrupted, stopping");
                tail.stop().await;
                break;
            }
        }
    }

    // Lines decoded before the source went away.
    while let Some(line) = tail.next().await {
        println!("{}", line);
    }

    if !tail.is_stopped() {
        tail.stop().await;
    }

    if let Some(e) = tail.error() {
        error!(path = %tail.path().display(), error = %e, "tail ended with an error");
        eprintln!("Error reading file: {}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_use_tail_from_start() {
        let cli = Cli::try_parse_from(["log-tail", "app.log"]).unwrap();
        let config = cli.config();

        assert_eq!(config.buffer_capacity, 64 * 1024);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.stop_timeout, Duration::from_secs(2));
        assert_eq!(config.source, SourceConfig::process(default_start_options()));
    }

    #[test]
    fn test_trailing_args_go_to_tail() {
        let cli = Cli::try_parse_from(["log-tail", "app.log", "--", "-n", "0", "-F"]).unwrap();

        assert_eq!(
            cli.config().source,
            SourceConfig::process(vec!["-n".to_string(), "0".to_string(), "-F".to_string()])
        );
    }

    #[test]
    fn test_native_flags() {
        let cli = Cli::try_parse_from([
            "log-tail",
            "app.log",
            "--native",
            "--offset",
            "10",
            "--no-follow",
            "--queue-capacity",
            "5",
        ])
        .unwrap();
        let config = cli.config();

        assert_eq!(config.queue_capacity, 5);
        assert_eq!(
            config.source,
            SourceConfig::Native {
                start_offset: 10,
                follow: false
            }
        );
    }

    #[test]
    fn test_offset_requires_native() {
        assert!(Cli::try_parse_from(["log-tail", "app.log", "--offset", "3"]).is_err());
    }
}
