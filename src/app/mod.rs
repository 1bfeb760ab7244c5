//! Application setup and runtime.

use crate::{
  audio::{AudioDeliveryManager, ElevenLabsClient, SystemClock, TtsProvider},
  db,
  dispatch::Dispatcher,
  error::Result,
  http,
  intent::IntentResolver,
  nlu::{LocalDigest, NluProvider, OpenAiClient, Summarizer},
  store::{MailboxStore, SqliteMailboxStore},
};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tracing::{info, warn};

pub mod config;

pub use config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn MailboxStore>,
  pub resolver: Arc<IntentResolver>,
  pub dispatcher: Arc<Dispatcher>,
  pub audio: Arc<AudioDeliveryManager>,
}

impl AppState {
  /// Wire the components together. `None` providers downgrade the pipeline.
  pub fn new(
    store: Arc<dyn MailboxStore>,
    nlu: Option<Arc<dyn NluProvider>>,
    summarizer: Arc<dyn Summarizer>,
    tts: Option<Arc<dyn TtsProvider>>,
  ) -> Self {
    Self {
      dispatcher: Arc::new(Dispatcher::new(store.clone(), summarizer)),
      resolver: Arc::new(IntentResolver::new(nlu)),
      audio: Arc::new(AudioDeliveryManager::new(tts, Arc::new(SystemClock))),
      store,
    }
  }

  /// Build the state from configuration, constructing provider clients for
  /// whichever credentials are present.
  pub fn from_config(store: Arc<dyn MailboxStore>, config: &AppConfig) -> Result<Self> {
    let (nlu, summarizer): (Option<Arc<dyn NluProvider>>, Arc<dyn Summarizer>) =
      match &config.openai_api_key {
        Some(key) => {
          let client = Arc::new(OpenAiClient::new(
            key,
            &config.nlu_model,
            &config.nlu_base_url,
            config.provider_timeout,
          )?);
          let nlu: Arc<dyn NluProvider> = client.clone();
          let summarizer: Arc<dyn Summarizer> = client;
          (Some(nlu), summarizer)
        }
        None => {
          warn!("OPENAI_API_KEY not set: voice commands resolve to 'unknown', digests are local");
          let summarizer: Arc<dyn Summarizer> = Arc::new(LocalDigest);
          (None, summarizer)
        }
      };

    let tts = match &config.elevenlabs_api_key {
      Some(key) => {
        let client: Arc<dyn TtsProvider> = Arc::new(ElevenLabsClient::new(
          key,
          &config.elevenlabs_voice_id,
          &config.elevenlabs_model_id,
          config.provider_timeout,
        )?);
        Some(client)
      }
      None => {
        warn!("ELEVENLABS_API_KEY not set: speech always uses local synthesis");
        None
      }
    };

    Ok(Self::new(store, nlu, summarizer, tts))
  }
}

/// Start the HTTP server with configured environment.
pub async fn run() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
  crate::util::init_tracing();

  let config = AppConfig::from_env()?;
  let db_url = db::ensure_sqlite_path(&config.database_url);
  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(&db_url)
    .await?;
  db::run_migrations(&pool).await?;

  let store: Arc<dyn MailboxStore> = Arc::new(SqliteMailboxStore::new(pool));
  if config.seed_demo_data {
    db::seed_demo_emails(store.as_ref()).await?;
  }

  let state = AppState::from_config(store, &config)?;
  let app = http::build_router(state);

  info!("voxmail API:       http://{}/", config.addr);
  info!("voice commands:    POST http://{}/voice/command", config.addr);
  info!("inbound webhooks:  POST http://{}/webhooks/<provider>", config.addr);

  let listener = tokio::net::TcpListener::bind(config.addr).await?;
  axum::serve(listener, app).await?;
  Ok(())
}
