use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;

mod agents;
mod config;
mod controllers;
mod db;
mod events;
mod llm;
mod models;
mod scheduler;
mod tools;
mod util;

use agents::{ChatClient, ConversationLoop};
use config::Config;
use db::Database;
use events::{create_default_handlers, EventBus, ReactionDispatcher};
use llm::LlmClient;
use scheduler::{JobRunner, Scheduler, SchedulerConfig};

pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
    pub conversation: Arc<ConversationLoop>,
    pub dispatcher: Arc<ReactionDispatcher>,
    pub bus: Arc<EventBus>,
    pub runner: Arc<JobRunner>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = Arc::new(Database::new(&config.database_url).expect("Failed to initialize database"));

    log::info!("Initializing tool registry");
    let tool_registry = Arc::new(tools::create_default_registry());

    let llm = LlmClient::from_config(&config).expect("Failed to initialize LLM client");
    let conversation = Arc::new(ConversationLoop::new(
        llm,
        tool_registry.clone(),
        db.clone(),
    ));

    // Agent-to-agent traffic (reactions, scheduled jobs) goes through the
    // chat endpoint over HTTP, same path as user traffic.
    let chat_client = ChatClient::http(&config.chat_base_url);

    let dispatcher = Arc::new(ReactionDispatcher::new(
        chat_client.clone(),
        create_default_handlers(),
        db.clone(),
    ));
    let bus = Arc::new(EventBus::new(db.clone(), &config.chat_base_url));
    let runner = Arc::new(JobRunner::new(db.clone(), chat_client));

    log::info!("Initializing scheduler");
    let scheduler = Arc::new(Scheduler::new(
        db.clone(),
        runner.clone(),
        SchedulerConfig {
            enabled: config.scheduler_enabled,
            poll_interval_secs: config.scheduler_poll_secs,
        },
    ));

    let scheduler_handle = Arc::clone(&scheduler);
    let (_scheduler_shutdown_tx, scheduler_shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        scheduler_handle.start(scheduler_shutdown_rx).await;
    });

    log::info!("Starting Foreman server on port {}", port);

    let config_data = config.clone();
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                db: Arc::clone(&db),
                config: config_data.clone(),
                conversation: Arc::clone(&conversation),
                dispatcher: Arc::clone(&dispatcher),
                bus: Arc::clone(&bus),
                runner: Arc::clone(&runner),
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config)
            .configure(controllers::chat::config)
            .configure(controllers::react::config)
            .configure(controllers::events::config)
            .configure(controllers::scheduler::config)
            .configure(controllers::activity::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
