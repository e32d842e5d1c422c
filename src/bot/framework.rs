use std::sync::Arc;

use poise::serenity_prelude::{self as serenity, ChannelId, CreateMessage, GatewayIntents, GuildId};
use songbird::SerenityInit;
use sqlx::SqlitePool;
use tracing::{error, info};

use crate::bot::data::Data;
use crate::bot::error::Error;
use crate::commands;
use crate::config::Settings;
use crate::constants::embeds;
use crate::handlers::event_handler::event_handler;
use crate::services::moderation::gateway::DiscordGateway;
use crate::services::moderation::scheduler;
use crate::services::music::resolver::YtDlpResolver;
use crate::services::tickets;

pub async fn run(settings: Settings, pool: SqlitePool) -> Result<(), Error> {
    let resolver = Arc::new(YtDlpResolver::new());
    let data = Arc::new(Data::new(pool, settings.clone(), resolver));

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::moderation::warn(),
                commands::moderation::mute(),
                commands::moderation::unmute(),
                commands::moderation::kick(),
                commands::moderation::ban(),
                commands::moderation::unban(),
                commands::moderation::limbo(),
                commands::moderation::unlimbo(),
                commands::moderation::actions(),
                commands::moderation::action(),
                commands::moderation::removeaction(),
                commands::moderation::reason(),
                commands::music::join(),
                commands::music::play(),
                commands::music::pause(),
                commands::music::resume(),
                commands::music::skip(),
                commands::music::queue(),
                commands::music::nowplaying(),
                commands::music::remove(),
                commands::music::r#loop(),
                commands::music::clear(),
                commands::music::volume(),
                commands::music::leave(),
                commands::suggestions::suggest(),
                commands::suggestions::approve(),
                commands::suggestions::deny(),
                commands::tickets::ticket(),
                commands::tickets::close(),
                commands::levels::rank(),
                commands::levels::levels(),
                commands::roles::selfrole(),
                commands::roles::roles(),
                commands::roles::role(),
                commands::applications::apply(),
            ],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: None, // Slash commands only
                ..Default::default()
            },
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            on_error: |err| Box::pin(on_error(err)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Bot connected as {}", ready.user.name);

                let gateway = Arc::new(DiscordGateway::new(ctx.http.clone(), &data.settings));
                scheduler::spawn_action_sweeper(data.pool.clone(), gateway);
                info!("Started moderation expiry sweeper");

                tickets::spawn_ticket_sweeper(ctx.http.clone(), data.pool.clone());
                info!("Started stale ticket sweeper");

                let guild_id = GuildId::new(data.settings.guild_id);
                poise::builtins::register_in_guild(ctx, &framework.options().commands, guild_id)
                    .await
                    .map_err(Error::Serenity)?;
                info!(
                    "Registered {} commands in guild {}",
                    framework.options().commands.len(),
                    guild_id
                );

                Ok(data)
            })
        })
        .build();

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = serenity::ClientBuilder::new(&settings.discord_token, intents)
        .framework(framework)
        .register_songbird()
        .await
        .map_err(Error::Serenity)?;

    info!("Starting Discord client...");
    client.start().await.map_err(Error::Serenity)
}

/// User-facing errors go back to the invoker; everything else is logged
/// under an opaque code and mirrored to the exceptions channel.
async fn on_error(err: poise::FrameworkError<'_, Arc<Data>, Error>) {
    match err {
        poise::FrameworkError::Command { error, ctx, .. } => {
            if error.is_user_facing() {
                let embed = embeds::error_embed().description(error.to_string());
                let _ = ctx
                    .send(poise::CreateReply::default().embed(embed).ephemeral(true))
                    .await;
                return;
            }

            let code = error.code();
            error!("Command /{} failed [{}]: {:?}", ctx.command().name, code, error);

            let embed = embeds::error_embed()
                .description(format!("Something went wrong. Reference code: `{}`", code));
            let _ = ctx
                .send(poise::CreateReply::default().embed(embed).ephemeral(true))
                .await;

            forward_exception(
                ctx.serenity_context(),
                &ctx.data().settings,
                &format!("`/{}` [{}]\n```\n{:?}\n```", ctx.command().name, code, error),
            )
            .await;
        }
        poise::FrameworkError::ArgumentParse { error, ctx, .. } => {
            let _ = ctx.say(format!("Invalid argument: {}", error)).await;
        }
        poise::FrameworkError::UnknownCommand { .. } => {
            // Slash commands only; pings and stray prefixes are not errors
        }
        err => {
            error!("Framework error: {:?}", err);
        }
    }
}

async fn forward_exception(ctx: &serenity::Context, settings: &Settings, text: &str) {
    let Some(channel_id) = settings.exceptions_channel_id else {
        return;
    };

    let embed = embeds::error_embed().title("Unhandled Error").description(text);
    if let Err(e) = ChannelId::new(channel_id)
        .send_message(&ctx.http, CreateMessage::new().embed(embed))
        .await
    {
        error!("Could not forward error to exceptions channel: {:?}", e);
    }
}
