use poise::serenity_prelude::{ChannelId, CreateMessage, MessageCollector};
use tracing::{info, warn};

use crate::bot::data::Context;
use crate::bot::error::Error;
use crate::constants::embeds;
use crate::constants::timeouts::APPLICATION_QUESTION_TIMEOUT;
use crate::services::applications::{Application, Position};

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum PositionChoice {
    Developer,
    Helper,
    #[name = "Hospitality Team"]
    Hospitality,
}

fn applications_channel(ctx: Context<'_>) -> Result<ChannelId, Error> {
    ctx.data()
        .settings
        .applications_channel_id
        .map(ChannelId::new)
        .ok_or_else(|| Error::custom("Applications are not open right now."))
}

async fn say_ephemeral(ctx: Context<'_>, text: &str) -> Result<(), Error> {
    let embed = embeds::info_embed().description(text.to_string());
    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true)).await?;
    Ok(())
}

/// Apply for a staff position.
#[poise::command(slash_command, guild_only)]
pub async fn apply(
    ctx: Context<'_>,
    #[description = "Position to apply for"] position: PositionChoice,
) -> Result<(), Error> {
    let review_channel = applications_channel(ctx)?;

    let position = match position {
        PositionChoice::Developer => {
            return say_ephemeral(ctx, "Please DM an administrator to apply for Developer.").await;
        }
        PositionChoice::Helper => Position::Helper,
        PositionChoice::Hospitality => Position::Hospitality,
    };

    let user_id = ctx.author().id.get();
    if !ctx.data().open_applications.insert(user_id) {
        return Err(Error::custom("You are already completing an application."));
    }

    // The guard must come off on every exit, including errors
    let outcome = interview(ctx, position, review_channel).await;
    ctx.data().open_applications.remove(&user_id);
    outcome
}

/// Run the whole questionnaire over DM and post the transcript for review.
async fn interview(
    ctx: Context<'_>,
    position: Position,
    review_channel: ChannelId,
) -> Result<(), Error> {
    let dm_closed = || Error::custom("I can't DM you. Please check your privacy settings.");
    let dm = ctx
        .author()
        .create_dm_channel(ctx.http())
        .await
        .map_err(|_| dm_closed())?
        .id;

    let intro = embeds::info_embed()
        .title(format!("{} Application", position.name()))
        .description(
            "Welcome to the application process! Please answer each question in this DM.\n\
             If you do not respond to a question within 10 minutes, the application is cancelled.",
        );
    dm.send_message(ctx.http(), CreateMessage::new().embed(intro))
        .await
        .map_err(|_| dm_closed())?;

    say_ephemeral(ctx, "Check your DMs!").await?;

    let mut application = Application::new(position);
    while let Some((number, question)) = application.next_question() {
        dm.say(ctx.http(), format!("**#{}:** {}", number, question)).await?;

        let Some(reply) = MessageCollector::new(ctx)
            .channel_id(dm)
            .author_id(ctx.author().id)
            .timeout(APPLICATION_QUESTION_TIMEOUT)
            .await
        else {
            dm.say(
                ctx.http(),
                "Sorry, you took too long to answer. The application has been cancelled.",
            )
            .await?;
            return Ok(());
        };

        // A rejected answer repeats the same question
        if let Err(e) = application.submit_answer(&reply.content) {
            dm.say(ctx.http(), e.message()).await?;
        }
    }

    let mut embed = embeds::info_embed().description(format!(
        "{} application submitted by {} ({})",
        position.name(),
        ctx.author().tag(),
        ctx.author().id
    ));
    for (number, (question, answer)) in application.transcript().enumerate() {
        embed = embed.field(format!("#{}: {}", number + 1, question), answer.to_string(), false);
    }

    match review_channel.send_message(ctx.http(), CreateMessage::new().embed(embed)).await {
        Ok(_) => {
            info!("{} submitted a {} application", ctx.author().id, position.name());
            dm.say(
                ctx.http(),
                "Your application has been submitted.\n\
                 An administrator will contact you if you have been accepted.\n\
                 **Please do not ask staff members about your application.**",
            )
            .await?;
        }
        Err(e) => {
            warn!("Could not post application for {}: {:?}", ctx.author().id, e);
            dm.say(
                ctx.http(),
                "Something went wrong while submitting your application. \
                 Please contact an administrator.",
            )
            .await?;
        }
    }

    Ok(())
}
