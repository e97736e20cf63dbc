use std::{error::Error, path::PathBuf, sync::Arc};

use tracing::info;
use tracing_subscriber::EnvFilter;

use msh::{
    cli::{Cli, Commands, parse_args},
    client_version,
    clock::{CancellationToken, Clock, SystemClock},
    config::{Config, NotificationGate, load_config},
    constants::{UPDATE_PROTOCOL_VERSION, UPDATE_RESPONSE_HEADER},
    manager::{UpdateManager, UpdateSchedule, checked_signal, console_notice},
    server::ChildServer,
    shutdown::{ShutdownCoordinator, SystemShutdownSignal},
    update::UpdateClient,
};

fn main() -> Result<(), Box<dyn Error>> {
    let args = parse_args();
    init_logging(&args);

    let config = load_config(args.config.as_deref())?;

    match args.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config),
        Commands::CheckUpdate => check_update(&config),
    }
}

fn init_logging(args: &Cli) {
    let filter = if let Some(level) = args.log_level {
        EnvFilter::new(level.as_str())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn run(config: Config) -> Result<(), Box<dyn Error>> {
    // Handlers go in before the server starts so an early signal is not lost.
    let signal = SystemShutdownSignal::install()?;

    let base = PathBuf::from(config.project_dir.as_deref().unwrap_or("."));
    let server = Arc::new(ChildServer::new(
        config.server.clone(),
        config.server.working_dir(&base),
    ));
    server.start()?;

    let cancel = CancellationToken::new();
    let (checked, _checked_rx) = checked_signal();

    if config.update.enabled {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let schedule = UpdateSchedule {
            check_interval: config.update.check_interval()?,
            notify_interval: config.update.notify_interval()?,
        };

        UpdateManager::new(
            UpdateClient::new(config.update.endpoint())?,
            client_version(),
            Arc::clone(&server),
            NotificationGate::from(&config),
            checked,
            clock,
            cancel.clone(),
            schedule,
        )
        .spawn();
    } else {
        info!("Update checks disabled");
    }

    let coordinator = ShutdownCoordinator::new(server, cancel, config.shutdown.grace()?);
    match coordinator.run(&signal)? {}
}

fn check_update(config: &Config) -> Result<(), Box<dyn Error>> {
    let version = client_version();
    let client = UpdateClient::new(config.update.endpoint())?;
    let check =
        client.check_update(UPDATE_PROTOCOL_VERSION, &version, UPDATE_RESPONSE_HEADER)?;

    if let Some(notice) = console_notice(&check, &version) {
        println!("{notice}");
    }

    Ok(())
}
