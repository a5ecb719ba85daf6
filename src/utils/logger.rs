use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Installs the global fmt subscriber; logs go to stderr so command output stays clean on stdout
pub fn setup_logging(level: Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();

    // a subscriber may already be installed (e.g. when called twice)
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("Tracing subscriber already set");
    }
}
