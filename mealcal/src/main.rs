use std::sync::Arc;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mealcal::api::{create_router, AppState};
use mealcal::config::{Config, LogFormat};
use mealcal::db::{Database, LibSqlBackend, LibSqlPreferences, StoreBackend};
use mealcal::models::Slot;
use mealcal::period;
use mealcal::services::{CacheSweeper, CalendarService, PreferenceService};
use mealcal::view::{CalendarState, ViewState};

#[derive(Parser)]
#[command(name = "mealcal")]
#[command(about = "Two-week meal planning calendar")]
struct Args {
    /// Run against a throwaway in-memory store instead of MEALCAL_STORE_URL
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Print the period containing DATE (default: today)
    Period { date: Option<NaiveDate> },
    /// Print the meals and weekly memos of the period containing DATE
    Show { date: Option<NaiveDate> },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    let json_logs = LogFormat::from_env() == LogFormat::Json;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mealcal=info,tower_http=debug".into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    let today = Local::now().date_naive();

    match args.command.unwrap_or(Command::Serve) {
        Command::Period { date } => {
            print_period(date.unwrap_or(today), today);
            Ok(())
        }
        Command::Show { date } => {
            let config = load_config(args.ephemeral)?;
            show(config, date.unwrap_or(today), today).await
        }
        Command::Serve => {
            let config = load_config(args.ephemeral)?;
            serve(config).await
        }
    }
}

fn load_config(ephemeral: bool) -> anyhow::Result<Config> {
    if ephemeral {
        tracing::warn!("Using an in-memory store; nothing will be persisted");
        return Ok(Config::ephemeral());
    }

    match Config::from_env() {
        Ok(config) => Ok(config),
        Err(e) => {
            tracing::error!(error = %e, "Configuration is incomplete");
            Err(e.into())
        }
    }
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn StoreBackend>> {
    tracing::info!(remote = config.store.is_remote(), "Opening meal store...");
    let raw_db = Database::new(&config.store).await?;
    let store: Arc<dyn StoreBackend> = Arc::new(LibSqlBackend::new(raw_db, &config.store));
    Ok(store)
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let store = open_store(&config).await?;
    if let Err(e) = store.sync().await {
        tracing::warn!(error = %e, "Initial store sync failed");
    }
    let prefs = Arc::new(LibSqlPreferences::open(&config.preferences.path).await?);

    let state = AppState::new(config.clone(), store, prefs);
    let cancel_token = CancellationToken::new();

    let sweeper = CacheSweeper::new(state.calendar.clone(), config.cache.sweep_interval_secs);
    tracing::info!("Starting cache sweeper... (interval={}s)", sweeper.interval_secs());
    let interval = tokio::time::Duration::from_secs(sweeper.interval_secs());
    let token = cancel_token.child_token();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!("Cache sweeper shutting down...");
                    break;
                }
                _ = tokio::time::sleep(interval) => {
                    sweeper.run_once();
                }
            }
        }
    });

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("mealcal starting on http://{}", addr);
    tracing::info!("  Health check: http://{}/api/v1/health", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token))
        .await?;

    Ok(())
}

fn print_period(date: NaiveDate, today: NaiveDate) {
    let p = period::period_containing(date);
    println!("{} .. {}", p.start_date, p.end_date);
    println!("previous: {}", period::previous_period_start(p.start_date));
    println!("next:     {}", period::next_period_start(p.start_date));
    if p.contains(today) {
        println!("(current period)");
    }
}

async fn show(config: Config, date: NaiveDate, today: NaiveDate) -> anyhow::Result<()> {
    let store = open_store(&config).await?;
    let calendar = CalendarService::new(store, &config.cache);
    let prefs = Arc::new(LibSqlPreferences::open(&config.preferences.path).await?);
    let theme = PreferenceService::new(prefs).theme().await?;

    let mut state = CalendarState::new(today, theme);
    let start = state.go_to(date);
    let loaded = calendar.load(state.period()).await;
    state.apply_loaded(start, loaded);

    let view = match &state.view {
        ViewState::Ready(view) => view,
        ViewState::Failed { message } => anyhow::bail!("could not load calendar: {message}"),
        ViewState::Loading => anyhow::bail!("calendar did not load"),
    };

    println!("{} .. {}", view.period.start_date, view.period.end_date);
    for day in view.days() {
        if day.date == day.week_start {
            let memo = view
                .weekly_memo(day.week_start)
                .map(|m| m.memo.as_str())
                .unwrap_or("-");
            println!();
            println!("Week of {}: {}", day.week_start, memo);
        }

        let marker = if day.date == today {
            ">"
        } else if period::is_past_date(day.date, today) {
            "-"
        } else {
            " "
        };
        println!("{marker} {} {}", day.date, day.date.format("%a"));
        for (slot, meal) in Slot::ALL.iter().zip(day.meals) {
            if let Some(meal) = meal {
                println!("    {:<9} {}", slot.as_str(), meal.headline());
            }
        }
    }

    Ok(())
}

async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, cancelling background tasks...");
    cancel_token.cancel();
}
