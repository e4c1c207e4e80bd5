use anyhow::Result;
use indicator_report::{pipeline, Config};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) configure paths ──────────────────────────────────────────
    let config = Config::load()?;
    info!(
        input = %config.input.display(),
        sheet = %config.output_sheet.display(),
        report = %config.report.display(),
        "configured"
    );

    // ─── 3) run once ─────────────────────────────────────────────────
    match pipeline::run(&config) {
        Ok(summary) => {
            info!(?summary, "all done");
            Ok(())
        }
        Err(e) => {
            error!("run failed: {:#}", e);
            Err(e)
        }
    }
}
