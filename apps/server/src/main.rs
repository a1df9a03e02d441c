use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;

use huddle_config::load as load_config;
use huddle_database::{ChannelRepository, ConversationRepository, MessageRepository, MessageType, UserRepository};
use huddle_gateway::{create_router, GatewayState};
use huddle_runtime::{telemetry, CoreServices};

#[derive(Parser)]
#[command(name = "huddle-server")]
#[command(about = "Huddle real-time delivery backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP and WebSocket server (default)
    Serve,
    /// Seed the database with demo users, a conversation, and a workspace
    SeedData,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server().await,
        Commands::SeedData => seed_data().await,
    }
}

async fn run_server() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("starting Huddle backend");

    let config = load_config().context("failed to load configuration")?;

    let services = CoreServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let state = GatewayState::new(services.db_pool.clone(), config.messaging.clone());
    let app = create_router(state);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(huddle_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}

async fn seed_data() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("seeding database with demo data");

    let config = load_config().context("failed to load configuration")?;

    let services = CoreServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;
    let pool = services.db_pool;

    let users = UserRepository::new(pool.clone());
    let alice = users.create("Alice").await.context("failed to create user")?;
    let bob = users.create("Bob").await.context("failed to create user")?;

    let conversations = ConversationRepository::new(pool.clone());
    let conversation = conversations
        .create_or_fetch(alice.id, bob.id)
        .await
        .context("failed to create conversation")?;

    let messages = MessageRepository::new(pool.clone());
    let greeting = messages
        .create_in_conversation(
            conversation.id,
            alice.id,
            "Welcome to Huddle!",
            MessageType::Text,
            None,
        )
        .await
        .context("failed to create seed message")?;
    conversations
        .set_last_message(conversation.id, greeting.id)
        .await
        .context("failed to set last message")?;

    let channels = ChannelRepository::new(pool);
    let general = channels
        .provision_workspace_defaults("demo-workspace", alice.id)
        .await
        .context("failed to provision workspace")?;
    channels
        .add_member(general.id, bob.id)
        .await
        .context("failed to add member")?;

    println!("Database seeded with demo data:");
    println!("- users: {} (Alice), {} (Bob)", alice.public_id, bob.public_id);
    println!("- conversation: {}", conversation.public_id);
    println!("- workspace 'demo-workspace' with channel #{}", general.name);
    println!("Pass one of the user IDs in the x-user-id header to act as that user");

    Ok(())
}
