use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber. `RUST_LOG` wins when set; otherwise the
/// service's own crate logs at debug and everything else at info.
/// `VIVAH_ENV=production` switches to JSON lines.
pub fn init_tracing(service_name: &str) {
    let crate_target = service_name.replace('-', "_");
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("info,{crate_target}=debug,tower_http=debug")));

    let production = std::env::var("VIVAH_ENV").is_ok_and(|v| v == "production");

    let installed = if production {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true).with_target(true))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()
    };

    match installed {
        Ok(()) => tracing::info!(service = service_name, production, "tracing initialized"),
        Err(e) => tracing::warn!(error = %e, "tracing subscriber already installed"),
    }
}
