use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const LOG_FILE_PREFIX: &str = "parkmap.log";

/// Installs the global subscriber.
/// Console output goes to stderr so that stdout stays usable for command output.
/// When `log_dir` is given, a daily rolling file is written there too, the returned guard must be kept alive
/// until the end of the program or the last lines are lost.
pub fn install_tracing(log_dir: Option<&std::path::Path>) -> Option<WorkerGuard> {
    let filter = || {
        EnvFilter::builder()
            .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
            .from_env_lossy()
    };
    let console = fmt::layer().with_writer(std::io::stderr).with_filter(filter());

    let (file, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    if let Err(e) = tracing_subscriber::registry().with(console).with(file).try_init() {
        eprintln!("tracing subscriber was already installed: {e}");
    }
    guard
}
