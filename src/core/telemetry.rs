use tracing_subscriber::{fmt, EnvFilter};

use crate::core::config::Settings;

/// Chatty dependencies are capped at `warn` unless `RUST_LOG` says otherwise.
const QUIET_DEPENDENCIES: &str = "sqlx=warn,aws_config=warn,aws_smithy_runtime=warn,hyper=warn";

pub(crate) fn init_tracing(settings: &Settings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},{QUIET_DEPENDENCIES}", settings.telemetry().log_level))
    });

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_span_events(fmt::format::FmtSpan::CLOSE);

    if settings.telemetry().json {
        builder
            .json()
            .with_current_span(true)
            .try_init()
            .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    } else {
        builder.try_init().map_err(|err| anyhow::anyhow!(err.to_string()))?;
    }

    tracing::info!(
        service = "question-bank-api",
        version = env!("CARGO_PKG_VERSION"),
        json = settings.telemetry().json,
        "Tracing initialised"
    );
    Ok(())
}
