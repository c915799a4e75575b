use clap::Parser;
use std::sync::Arc;
use tipster_core::config::Settings;
use tipster_core::domain::account::restrict_to;
use tipster_core::llm::huggingface::HuggingFaceClassifier;
use tipster_core::monitor::Monitor;
use tipster_core::notify::telegram::TelegramNotifier;
use tipster_core::notify::{LogNotifier, Notifier};
use tipster_core::scrape::StrategySourceFactory;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod schedule;

#[derive(Debug, Parser)]
#[command(name = "tipster_worker")]
struct Args {
    /// Run one monitoring cycle immediately, then exit.
    #[arg(long)]
    once: bool,

    /// Log alerts instead of sending them to the group chat.
    #[arg(long)]
    dry_run: bool,

    /// Only check this handle. Repeat to check several.
    #[arg(long = "account", value_name = "HANDLE")]
    accounts: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env();
    let _sentry_guard = settings.as_ref().ok().and_then(init_sentry);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let settings = match settings {
        Ok(settings) => settings,
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %format!("{err:#}"), "invalid configuration");
            return Ok(());
        }
    };

    let missing = settings.missing_required();
    if !missing.is_empty() {
        tracing::error!(missing = %missing.join(", "), "missing required configuration");
        return Ok(());
    }

    let monitor = match build_monitor(&settings, &args) {
        Ok(monitor) => monitor,
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %format!("{err:#}"), "startup failed");
            return Ok(());
        }
    };

    if args.once {
        monitor.run_cycle().await;
        return Ok(());
    }

    tracing::info!(
        accounts = monitor.accounts().len(),
        dry_run = args.dry_run,
        interval = ?settings.cycle_interval,
        first_run_in = ?settings.first_run_delay,
        "bot started"
    );

    let monitor = &monitor;
    schedule::run_every(
        settings.first_run_delay,
        settings.cycle_interval,
        shutdown_signal(),
        move || async move {
            monitor.run_cycle().await;
        },
    )
    .await;

    Ok(())
}

fn build_monitor(settings: &Settings, args: &Args) -> anyhow::Result<Monitor> {
    let accounts = restrict_to(&settings.accounts, &args.accounts)?;
    let destination = settings.require_group_chat_id()?;
    let classifier = HuggingFaceClassifier::from_settings(settings)?;

    let notifier: Arc<dyn Notifier> = if args.dry_run {
        Arc::new(LogNotifier)
    } else {
        Arc::new(TelegramNotifier::from_settings(settings)?)
    };

    Ok(Monitor::new(
        accounts,
        destination,
        Arc::new(StrategySourceFactory::from_settings(settings)),
        Arc::new(classifier),
        notifier,
    ))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
