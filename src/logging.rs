use std::path::Path;
use tracing::Level;
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{format::FmtSpan, layer, time::LocalTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Registry,
};

/// Logs to stderr and, if given, appends to `log_file`.
///
/// Stdout is never written to, since it carries the CGI response.
pub fn setup_logger(log_file: Option<&Path>, verbose: bool, ansi: bool) -> eyre::Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let builder = Registry::default().with(LevelFilter::from(level)).with(
        layer()
            .with_writer(std::io::stderr)
            .with_ansi(ansi)
            .with_target(false)
            .without_time(),
    );

    if let Some(log_file) = log_file {
        let time_format = time::macros::format_description!(
            "[year]-[month]-[day] [hour repr:24]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
        );

        let file = std::fs::File::options()
            .append(true)
            .create(true)
            .open(log_file)?;
        builder
            .with(
                layer()
                    .with_ansi(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_timer(LocalTime::new(time_format))
                    .with_writer(file),
            )
            .try_init()?;
    } else {
        builder.try_init()?;
    }

    Ok(())
}
