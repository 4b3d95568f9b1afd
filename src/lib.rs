pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod models;
pub mod services;
pub mod session;

use std::sync::Arc;

use clap::Parser;

use cli::{Cli, Commands, commands};
use clients::HttpTransport;
pub use config::Config;
use services::{DashboardService, DeviceService};
use session::{SessionManager, SessionStore};
use tracing_subscriber::EnvFilter;

/// Composition root: owns the one session manager and the services that
/// depend on it. Everything takes its dependencies explicitly from here;
/// there is no ambient global session.
pub struct App {
    pub config: Config,
    pub session: Arc<SessionManager>,
    pub devices: DeviceService,
    pub dashboard: DashboardService,
}

impl App {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config.api.base_url)?);
        let store = SessionStore::new(config.session_file());
        let session = SessionManager::new(transport, store);
        let devices = DeviceService::new(session.clone());
        let dashboard = DashboardService::new(session.clone(), config.business_tz());

        Ok(Self {
            config,
            session,
            devices,
            dashboard,
        })
    }
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Init writes the config file and must not require a loadable one.
    if matches!(cli.command, Commands::Init) {
        return commands::cmd_init();
    }

    let config = Config::load()?;
    config.validate()?;

    init_tracing(&config);

    let app = App::new(config)?;
    if let Some(user) = app.session.restore().await {
        tracing::debug!(email = %user.email, "session restored");
    }
    let _store_watcher = app.session.spawn_store_watcher();

    match cli.command {
        Commands::Init => Ok(()),
        Commands::Login { email, password } => commands::cmd_login(&app, &email, password).await,
        Commands::Logout => commands::cmd_logout(&app).await,
        Commands::Whoami => commands::cmd_whoami(&app).await,
        Commands::Devices { command } => commands::cmd_devices(&app, command).await,
        Commands::Dashboard { from, to, watch } => {
            commands::cmd_dashboard(&app, from, to, watch).await
        }
    }
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    // Logs go to stderr so command output stays pipeable.
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
