use log::{error, info};
use poise::serenity_prelude as serenity;
use sqlx::sqlite::SqlitePoolOptions;

mod cases;
mod checks;
mod config;
mod help;
mod moderation;
mod tasks;
mod utils;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

// User data, which is stored and accessible in all command invocations
pub struct Data {
    pub pool: sqlx::SqlitePool,
}

#[poise::command(prefix_command)]
async fn register(ctx: Context<'_>) -> Result<(), Error> {
    poise::builtins::register_application_commands_buttons(ctx).await?;
    Ok(())
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    // This is our custom error handler
    // They are many errors that can occur, so we only handle the ones we want to customize
    // and forward the rest to the default handler
    match error {
        poise::FrameworkError::Setup { error, .. } => panic!("Failed to start bot: {:?}", error),
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {:?}", ctx.command().name, error);
            if let Err(e) = ctx
                .say(format!(
                    "{} There was an error running this command: {}",
                    config::CONFIG.glyphs.error,
                    error
                ))
                .await
            {
                error!("Error while sending error message: {:?}", e);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

async fn event_listener(event: &serenity::FullEvent, _user_data: &Data) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!("{} is ready", data_about_bot.user.name);
        }
        serenity::FullEvent::CacheReady { guilds } => {
            info!("Cache ready with {} guilds", guilds.len());
        }
        _ => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    const MAX_CONNECTIONS: u32 = 3; // max connections to the database, we don't need too many here

    std::env::set_var("RUST_LOG", "warden=debug");
    env_logger::init();
    info!("Starting Warden...");

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(&config::CONFIG.database_url)
        .await
        .expect("Could not initialize connection");

    cases::store::init(&pool)
        .await
        .expect("Could not create the cases schema");

    let options = poise::FrameworkOptions {
        prefix_options: poise::PrefixFrameworkOptions {
            prefix: Some(config::CONFIG.prefix.clone()),
            ..poise::PrefixFrameworkOptions::default()
        },
        commands: vec![
            register(),
            help::help(),
            moderation::warn(),
            moderation::kick(),
            moderation::ban(),
            moderation::timeout(),
            moderation::case(),
        ],
        // This code is run before every command
        pre_command: |ctx| {
            Box::pin(async move {
                info!(
                    "Executing command {} for user {} ({})...",
                    ctx.command().qualified_name,
                    ctx.author().name,
                    ctx.author().id
                );
            })
        },
        // This code is run after every command returns Ok
        post_command: |ctx| {
            Box::pin(async move {
                info!(
                    "Done executing command {} for user {} ({})...",
                    ctx.command().qualified_name,
                    ctx.author().name,
                    ctx.author().id
                );
            })
        },
        on_error: |error| Box::pin(on_error(error)),
        event_handler: |_ctx, event, _framework, user_data| {
            Box::pin(event_listener(event, user_data))
        },
        ..Default::default()
    };

    let framework = poise::Framework::builder()
        .options(options)
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                tokio::task::spawn(tasks::start(pool.clone()));

                Ok(Data { pool })
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let mut client = serenity::ClientBuilder::new(&config::CONFIG.token, intents)
        .framework(framework)
        .await
        .expect("Error creating client");

    client.start().await.expect("Error");
}
