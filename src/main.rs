//! TuneCircle Telegram Bot
//!
//! Main application entry point

use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{info, warn};

use TuneCircle::{
    config::Settings,
    database::{connection::create_pool, connection::run_migrations, DatabaseService},
    handlers::{create_handler, AppContext},
    provider::{HttpMusicProvider, MusicProvider},
    state::StateStorage,
    sync::{start_sweep_task, SyncEngine, SyncStore},
    utils::logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging; the guard must stay alive for the file appender
    let _guard = logging::init_logging(&settings.logging)?;

    info!("Starting TuneCircle bot...");

    // Database
    info!("Connecting to database...");
    let pool = create_pool(&settings.database).await?;
    run_migrations(&pool).await?;
    let db = Arc::new(DatabaseService::new(pool, settings.limits.clone()));

    // Music provider
    let provider = Arc::new(HttpMusicProvider::new(&settings.provider)?);

    // Conversation state lives in process memory only
    let storage = Arc::new(StateStorage::new());

    // Playlist synchronization
    let sync_store: Arc<dyn SyncStore> = db.clone();
    let provider_dyn: Arc<dyn MusicProvider> = provider.clone();
    let sync_engine = SyncEngine::new(sync_store, provider_dyn.clone());
    let sweep_task = start_sweep_task(sync_engine.clone(), &settings.sync);

    // Bot and dispatcher
    let bot = Bot::new(&settings.bot.token);
    let app = Arc::new(AppContext {
        db,
        provider: provider_dyn,
        storage,
        sync: sync_engine,
        settings: Arc::new(settings),
    });

    info!("Setting up bot handlers...");
    let mut dispatcher = Dispatcher::builder(bot, create_handler())
        .dependencies(dptree::deps![app])
        .default_handler(|update| async move {
            warn!("Unhandled update: {:?}", update);
        })
        .enable_ctrlc_handler()
        .build();

    info!("TuneCircle bot is ready, starting polling...");
    dispatcher.dispatch().await;

    if let Some(task) = sweep_task {
        task.abort();
    }

    info!("TuneCircle bot has been shut down.");
    Ok(())
}
