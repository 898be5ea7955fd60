use std::{
    fs::OpenOptions,
    io,
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};

use clap::Parser;
use crossterm::event::EventStream;
use met::{
    app::{self, App},
    config::{self, Config, Settings},
    reconcile::DeltaPolicy,
    render::Screen,
};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use tokio::runtime::Builder;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt::writer::BoxMakeWriter, util::SubscriberInitExt};

#[derive(thiserror::Error, Debug)]
enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("Failed to open log file {path:?}: {source}")]
    LogFile { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Config(#[from] config::Error),
    #[error("Viewer failed: {0}")]
    App(#[from] app::Error),
    #[error("Failed to install prometheus recorder: {0}")]
    Prometheus(#[from] BuildError),
}

#[derive(Parser, Debug)]
#[clap(version, about, long_about = None, disable_version_flag = true)]
struct Cli {
    /// print version
    #[clap(long, short = 'v', action = clap::ArgAction::Version)]
    #[allow(dead_code)]
    version: Option<bool>,
    /// metrics endpoint to poll, e.g. http://localhost:9090/metrics
    #[clap(long, short = 'x', env = "MET_ENDPOINT")]
    endpoint: Option<String>,
    /// poll interval, e.g. 2s or 500ms [default: 2s]
    #[clap(long, short = 's', env = "MET_INTERVAL", value_parser = humantime::parse_duration)]
    interval: Option<Duration>,
    /// show metrics whose name contains any of these substrings
    #[clap(long, short = 'i', value_delimiter = ',')]
    include: Vec<String>,
    /// hide metrics whose name contains any of these substrings
    #[clap(long, short = 'e', value_delimiter = ',')]
    exclude: Vec<String>,
    /// show only metrics with all of these name=value labels
    #[clap(long, short = 'l', value_delimiter = ',')]
    labels: Vec<String>,
    /// graph the history of the selected metric
    #[clap(long)]
    show_graph: bool,
    /// rows per page [default: 20]
    #[clap(long)]
    page_size: Option<usize>,
    /// abandon a scrape after this long [default: 5s]
    #[clap(long, value_parser = humantime::parse_duration)]
    scrape_timeout: Option<Duration>,
    /// keep showing a counter's last increment when it does not move
    #[clap(long)]
    hold_delta: bool,
    /// path on disk to an optional YAML configuration file
    #[clap(long)]
    config_path: Option<PathBuf>,
    /// path on disk to write logs, logs are discarded if unset
    #[clap(long)]
    log_path: Option<PathBuf>,
    /// address to expose met's own metrics in prometheus format
    #[clap(long)]
    prometheus_addr: Option<SocketAddr>,
}

impl Cli {
    fn overrides(&self) -> Config {
        Config {
            endpoint: self.endpoint.clone(),
            interval: self.interval,
            scrape_timeout: self.scrape_timeout,
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            labels: self.labels.clone(),
            show_graph: self.show_graph,
            page_size: self.page_size,
            delta_policy: self.hold_delta.then_some(DeltaPolicy::Hold),
        }
    }
}

fn get_settings(cli: &Cli) -> Result<Settings, Error> {
    let file = match &cli.config_path {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };
    Ok(Settings::try_from(file.merge(cli.overrides()))?)
}

// The terminal belongs to the viewer, so logs go to a file or nowhere.
fn init_tracing(log_path: Option<&Path>) -> Result<(), Error> {
    let writer = match log_path {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| Error::LogFile {
                    path: path.to_path_buf(),
                    source,
                })?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(io::sink),
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_ansi(false)
        .with_writer(writer)
        .finish()
        .init();
    Ok(())
}

async fn inner_main(settings: Settings, prometheus_addr: Option<SocketAddr>) -> Result<(), Error> {
    if let Some(addr) = prometheus_addr {
        PrometheusBuilder::new().with_http_listener(addr).install()?;
        info!("Serving met telemetry on {addr}.");
    }

    let mut app = App::new(settings);
    let mut screen = Screen::enter()?;
    app.run(screen.terminal(), EventStream::new()).await?;
    Ok(())
}

fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    init_tracing(cli.log_path.as_deref())?;

    let version = env!("CARGO_PKG_VERSION");
    info!("Starting met {version}.");

    // Bad configuration is fatal before anything is polled.
    let settings = get_settings(&cli).inspect_err(|err| error!("{err}"))?;

    let runtime = Builder::new_current_thread()
        .enable_io()
        .enable_time()
        .build()?;
    let res = runtime.block_on(inner_main(settings, cli.prometheus_addr));
    // An in-flight scrape may still be waiting on its timeout.
    runtime.shutdown_timeout(Duration::from_secs(1));
    if let Err(err) = &res {
        error!("{err}");
    }
    info!("Bye. :)");
    res
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use met::filter::{Filter, LabelFilter};

    use super::*;

    #[test]
    fn cli_flags() {
        let cli = Cli::parse_from([
            "met",
            "-x",
            "http://localhost:9090/metrics",
            "-s",
            "500ms",
            "-i",
            "http,grpc",
            "-e",
            "bucket",
            "-l",
            "code=200",
            "--show-graph",
            "--page-size",
            "7",
            "--scrape-timeout",
            "1s",
            "--hold-delta",
        ]);
        let settings = get_settings(&cli).expect("valid flags rejected");
        assert_eq!(settings.endpoint, "http://localhost:9090/metrics");
        assert_eq!(settings.interval, Duration::from_millis(500));
        assert_eq!(settings.scrape_timeout, Duration::from_secs(1));
        assert_eq!(
            settings.filter,
            Filter::new(
                vec!["http".to_string(), "grpc".to_string()],
                vec!["bucket".to_string()],
                vec![LabelFilter::new("code", "200")],
            )
        );
        assert!(settings.show_graph);
        assert_eq!(settings.page_size.get(), 7);
        assert_eq!(settings.delta_policy, DeltaPolicy::Hold);
    }

    #[test]
    fn bad_label_is_fatal() {
        let cli = Cli::parse_from(["met", "-x", "http://localhost/metrics", "-l", "code"]);
        assert!(matches!(
            get_settings(&cli),
            Err(Error::Config(config::Error::LabelFilter(_)))
        ));
    }

    #[test]
    fn bad_interval_is_rejected_by_parser() {
        assert!(Cli::try_parse_from(["met", "-x", "http://localhost/metrics", "-s", "soon"]).is_err());
    }

    #[test]
    fn short_v_prints_version() {
        let err = Cli::try_parse_from(["met", "-v"]).expect_err("-v should print the version");
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
        let err = Cli::try_parse_from(["met", "--version"]).expect_err("--version should print the version");
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn missing_config_file_is_fatal() {
        let cli = Cli::parse_from(["met", "--config-path", "/nonexistent/met.yaml"]);
        assert!(matches!(get_settings(&cli), Err(Error::Config(config::Error::ReadFile { .. }))));
    }

    #[test]
    fn config_file_with_cli_override() {
        let mut file = tempfile::NamedTempFile::new().expect("could not create temp file");
        write!(
            file,
            "endpoint: http://from-file/metrics\ninterval: 10s\npage_size: 3\n"
        )
        .expect("could not write config");
        let path = file.path().display().to_string();

        let cli = Cli::parse_from(["met", "--config-path", path.as_str(), "-s", "1s"]);
        let settings = get_settings(&cli).expect("valid config rejected");
        assert_eq!(settings.endpoint, "http://from-file/metrics");
        assert_eq!(settings.interval, Duration::from_secs(1));
        assert_eq!(settings.page_size.get(), 3);
        assert_eq!(settings.delta_policy, DeltaPolicy::Reset);
    }
}
