use std::time::Duration;

use log::{error, info};
use poise::serenity_prelude as serenity;
use poise::ChoiceParameter;
use poise::CreateReply;

use crate::cases::embeds::{self, CaseCreator, CASES_PER_PAGE};
use crate::cases::{CaseError, CaseManager, CaseType, ModCase};
use crate::checks;
use crate::config;
use crate::utils;

type Error = crate::Error;
type Context<'a> = crate::Context<'a>;

fn guild_id(ctx: Context<'_>) -> Result<serenity::GuildId, Error> {
    ctx.guild_id()
        .ok_or_else(|| "This command can only be used in a server".into())
}

/// Resolves a case creator to a full user where possible, falling back
/// to the stored id when the account can no longer be fetched
async fn resolve_creator(ctx: Context<'_>, creator_user_id: i64) -> CaseCreator {
    let id = serenity::UserId::new(creator_user_id as u64);

    match id.to_user(ctx.serenity_context()).await {
        Ok(user) => CaseCreator::Resolved(Box::new(user)),
        Err(_) => CaseCreator::Unresolved(id),
    }
}

/// Records a case for an action and mirrors it to the mod logs channel
async fn record_case(
    ctx: Context<'_>,
    kind: CaseType,
    user: &serenity::User,
    reason: Option<String>,
    duration: Option<chrono::Duration>,
) -> Result<ModCase, Error> {
    let guild_id = guild_id(ctx)?;
    let data = ctx.data();

    let manager = CaseManager::new(&data.pool, guild_id);
    let case = manager
        .create_case(user.id, ctx.author().id, kind, reason, duration)
        .await?;

    info!(
        "Created {} case #{} for user {} in guild {}",
        case.kind, case.id, case.user_id, case.guild_id
    );

    let embed = embeds::case_embed(&case, &CaseCreator::Resolved(Box::new(ctx.author().clone())));
    post_mod_log(ctx, embed).await;

    Ok(case)
}

/// Best-effort mirror of a case embed to the configured mod logs channel
async fn post_mod_log(ctx: Context<'_>, embed: serenity::CreateEmbed) {
    let Some(channel) = config::CONFIG.channels.mod_logs else {
        return;
    };

    let channel = serenity::ChannelId::new(channel.get());

    if let Err(e) = channel
        .send_message(ctx.http(), serenity::CreateMessage::new().embed(embed))
        .await
    {
        error!("Error while posting to mod logs: {:?}", e);
    }
}

async fn dm_user(ctx: Context<'_>, user: &serenity::User, content: String) {
    if let Err(e) = user
        .dm(ctx.http(), serenity::CreateMessage::new().content(content))
        .await
    {
        error!("Error while DMing user {}: {:?}", user.id, e);
    }
}

/// Confirmation line for an action command. Dry runs record the case
/// but skip the Discord-side action, and say so.
fn action_summary(action: &str, case_id: i64, dry_run: bool) -> String {
    if dry_run {
        format!(
            "{} (dry run, case #{} recorded, no action taken)",
            action, case_id
        )
    } else {
        format!("{} (case #{})", action, case_id)
    }
}

/// Warns a member and records a case
#[poise::command(
    category = "Moderation",
    guild_only,
    prefix_command,
    slash_command,
    check = "checks::is_moderator"
)]
pub async fn warn(
    ctx: Context<'_>,
    #[description = "The member to warn"] user: serenity::User,
    #[description = "Reason for the warning"] reason: Option<String>,
    #[description = "How long the warning stays active, e.g. 30m, 2h, 7d"] duration: Option<
        String,
    >,
) -> Result<(), Error> {
    let duration = match duration {
        Some(raw) => Some(utils::parse_duration(&raw)?),
        None => None,
    };

    let case = record_case(ctx, CaseType::Warn, &user, reason, duration).await?;

    dm_user(
        ctx,
        &user,
        format!("You have been warned: {}", case.reason()),
    )
    .await;

    ctx.say(format!(
        "{} {}",
        config::CONFIG.glyphs.success,
        action_summary(&format!("Warned {}", user.name), case.id, false)
    ))
    .await?;

    Ok(())
}

/// Kicks a member from the server and records a case
#[poise::command(
    category = "Moderation",
    guild_only,
    prefix_command,
    slash_command,
    check = "checks::is_moderator"
)]
pub async fn kick(
    ctx: Context<'_>,
    #[description = "The member to kick"] user: serenity::User,
    #[description = "Reason for the kick"] reason: Option<String>,
    #[description = "Record the case without kicking"] dry_run: Option<bool>,
) -> Result<(), Error> {
    let guild = guild_id(ctx)?;
    let dry_run = dry_run.unwrap_or(false);
    let reason_text = reason.clone().unwrap_or_else(|| "No reason provided".to_string());

    // Case first, so the audit trail survives a failed Discord call
    let case = record_case(ctx, CaseType::Kick, &user, reason, None).await?;

    if !dry_run {
        // DM before the kick, it is impossible afterwards
        dm_user(ctx, &user, format!("You have been kicked: {}", reason_text)).await;

        guild
            .kick_with_reason(ctx.http(), user.id, &reason_text)
            .await?;
    }

    ctx.say(format!(
        "{} {}",
        config::CONFIG.glyphs.success,
        action_summary(&format!("Kicked {}", user.name), case.id, dry_run)
    ))
    .await?;

    Ok(())
}

/// Bans a member and records a case
#[poise::command(
    category = "Moderation",
    guild_only,
    prefix_command,
    slash_command,
    check = "checks::is_moderator"
)]
pub async fn ban(
    ctx: Context<'_>,
    #[description = "The member to ban"] user: serenity::User,
    #[description = "Reason for the ban"] reason: Option<String>,
    #[description = "Ban duration, e.g. 7d. Omit for a permanent ban"] duration: Option<String>,
    #[description = "Record the case without banning"] dry_run: Option<bool>,
) -> Result<(), Error> {
    let guild = guild_id(ctx)?;
    let dry_run = dry_run.unwrap_or(false);

    let duration = match duration {
        Some(raw) => Some(utils::parse_duration(&raw)?),
        None => None,
    };

    let reason_text = reason.clone().unwrap_or_else(|| "No reason provided".to_string());

    // Case first, so the audit trail survives a failed Discord call
    let case = record_case(ctx, CaseType::Ban, &user, reason, duration).await?;

    if !dry_run {
        dm_user(ctx, &user, format!("You have been banned: {}", reason_text)).await;

        guild
            .ban_with_reason(ctx.http(), user.id, 0, &reason_text)
            .await?;
    }

    ctx.say(format!(
        "{} {}",
        config::CONFIG.glyphs.success,
        action_summary(&format!("Banned {}", user.name), case.id, dry_run)
    ))
    .await?;

    Ok(())
}

/// Times out a member and records a case
#[poise::command(
    category = "Moderation",
    guild_only,
    prefix_command,
    slash_command,
    check = "checks::is_moderator"
)]
pub async fn timeout(
    ctx: Context<'_>,
    #[description = "The member to time out"] user: serenity::User,
    #[description = "Timeout duration, e.g. 30m, 2h (max 28d)"] duration: String,
    #[description = "Reason for the timeout"] reason: Option<String>,
    #[description = "Record the case without timing out"] dry_run: Option<bool>,
) -> Result<(), Error> {
    let guild = guild_id(ctx)?;
    let dry_run = dry_run.unwrap_or(false);

    let duration = utils::parse_duration(&duration)?;

    // Discord rejects communication timeouts beyond 28 days
    if duration > chrono::Duration::days(28) {
        return Err("Timeouts cannot be longer than 28 days".into());
    }

    // Case first, so the audit trail survives a failed Discord call
    let case = record_case(ctx, CaseType::Timeout, &user, reason, Some(duration)).await?;

    if !dry_run {
        let until = chrono::Utc::now() + duration;

        let mut member = guild.member(ctx.http(), user.id).await?;
        member
            .disable_communication_until_datetime(
                ctx.http(),
                serenity::Timestamp::from_unix_timestamp(until.timestamp())?,
            )
            .await?;

        dm_user(
            ctx,
            &user,
            format!(
                "You have been timed out for {}: {}",
                embeds::format_duration(duration),
                case.reason()
            ),
        )
        .await;
    }

    ctx.say(format!(
        "{} {}",
        config::CONFIG.glyphs.success,
        action_summary(
            &format!("Timed out {} for {}", user.name, embeds::format_duration(duration)),
            case.id,
            dry_run
        )
    ))
    .await?;

    Ok(())
}

/// Moderation case management
#[poise::command(
    category = "Moderation",
    guild_only,
    prefix_command,
    slash_command,
    guild_cooldown = 10,
    subcommands("case_note", "case_view", "case_list", "case_delete")
)]
pub async fn case(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say("Some available options are ``case note``, ``case view``, ``case list``, ``case delete``")
        .await?;
    Ok(())
}

/// Records a note on a member without taking any action
#[poise::command(
    rename = "note",
    track_edits,
    prefix_command,
    slash_command,
    check = "checks::is_moderator"
)]
pub async fn case_note(
    ctx: Context<'_>,
    #[description = "The member the note is about"] user: serenity::User,
    #[description = "The note itself"] text: String,
) -> Result<(), Error> {
    let case = record_case(ctx, CaseType::Note, &user, Some(text), None).await?;

    ctx.say(format!(
        "{} Noted (case #{})",
        config::CONFIG.glyphs.success,
        case.id
    ))
    .await?;

    Ok(())
}

/// Shows a single case by id
#[poise::command(
    rename = "view",
    track_edits,
    prefix_command,
    slash_command,
    check = "checks::is_moderator"
)]
pub async fn case_view(
    ctx: Context<'_>,
    #[description = "The case id"] case_id: i64,
) -> Result<(), Error> {
    let guild = guild_id(ctx)?;
    let data = ctx.data();

    let manager = CaseManager::new(&data.pool, guild);

    match manager.get_case_by_id(case_id).await {
        Ok(case) => {
            let creator = resolve_creator(ctx, case.creator_user_id).await;
            ctx.send(CreateReply::default().embed(embeds::case_embed(&case, &creator)))
                .await?;
        }
        Err(CaseError::NotFound(_)) => {
            ctx.say(format!(
                "{} Case {} was not found in this server",
                config::CONFIG.glyphs.error,
                case_id
            ))
            .await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// Lists a member's case history, 5 cases per page
#[poise::command(
    rename = "list",
    track_edits,
    prefix_command,
    slash_command,
    check = "checks::is_moderator"
)]
pub async fn case_list(
    ctx: Context<'_>,
    #[description = "The member whose cases to list"] user: serenity::User,
) -> Result<(), Error> {
    let guild = guild_id(ctx)?;
    let data = ctx.data();

    let manager = CaseManager::new(&data.pool, guild);
    let cases = manager.get_cases_by_user(user.id).await?;

    if cases.is_empty() {
        ctx.say(format!(
            "{} {} has no cases in this server",
            config::CONFIG.glyphs.success,
            user.name
        ))
        .await?;
        return Ok(());
    }

    let pages = embeds::paginate(&cases, CASES_PER_PAGE);
    let page_count = pages.len();

    if page_count == 1 {
        ctx.send(CreateReply::default().embed(embeds::page_embed(&user, pages[0], 0, 1)))
            .await?;
        return Ok(());
    }

    // Interaction ids scoped to this invocation so concurrent lists
    // don't steal each other's button presses
    let ctx_id = ctx.id();
    let prev_id = format!("{}prev", ctx_id);
    let next_id = format!("{}next", ctx_id);

    let mut msg = ctx
        .send(
            CreateReply::default()
                .embed(embeds::page_embed(&user, pages[0], 0, page_count))
                .components(vec![serenity::CreateActionRow::Buttons(vec![
                    serenity::CreateButton::new(&prev_id).emoji('◀'),
                    serenity::CreateButton::new(&next_id).emoji('▶'),
                ])]),
        )
        .await?
        .into_message()
        .await?;

    let mut page = 0usize;

    while let Some(press) = serenity::ComponentInteractionCollector::new(ctx)
        .filter(move |press| press.data.custom_id.starts_with(&ctx_id.to_string()))
        .timeout(Duration::from_secs(600))
        .await
    {
        if press.data.custom_id == next_id {
            page = (page + 1) % page_count;
        } else if press.data.custom_id == prev_id {
            page = page.checked_sub(1).unwrap_or(page_count - 1);
        } else {
            continue;
        }

        press
            .create_response(
                ctx.serenity_context(),
                serenity::CreateInteractionResponse::UpdateMessage(
                    serenity::CreateInteractionResponseMessage::new()
                        .embed(embeds::page_embed(&user, pages[page], page, page_count)),
                ),
            )
            .await?;
    }

    // Remove the buttons once the collector stops listening
    msg.edit(
        ctx.serenity_context(),
        serenity::EditMessage::new().components(vec![]),
    )
    .await?;

    Ok(())
}

/// Permanently deletes a case after confirmation
#[poise::command(
    rename = "delete",
    prefix_command,
    slash_command,
    check = "checks::is_moderator"
)]
pub async fn case_delete(
    ctx: Context<'_>,
    #[description = "The case id"] case_id: i64,
) -> Result<(), Error> {
    let guild = guild_id(ctx)?;
    let data = ctx.data();

    let manager = CaseManager::new(&data.pool, guild);

    let pending = match manager.begin_delete(case_id).await {
        Ok(pending) => pending,
        Err(CaseError::NotFound(_)) => {
            ctx.say(format!(
                "{} Case {} was not found in this server",
                config::CONFIG.glyphs.error,
                case_id
            ))
            .await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let creator = resolve_creator(ctx, pending.case().creator_user_id).await;

    let builder = CreateReply::default()
        .content(format!(
            "Are you sure you wish to permanently delete this {} case? This cannot be undone.",
            pending.case().kind.name()
        ))
        .embed(embeds::case_embed(pending.case(), &creator))
        .components(vec![serenity::CreateActionRow::Buttons(vec![
            serenity::CreateButton::new("continue")
                .label("Continue")
                .style(serenity::ButtonStyle::Danger),
            serenity::CreateButton::new("cancel")
                .label("Cancel")
                .style(serenity::ButtonStyle::Secondary),
        ])]);

    let mut msg = ctx.send(builder).await?.into_message().await?;

    let interaction = msg
        .await_component_interaction(ctx.serenity_context())
        .author_id(ctx.author().id)
        .timeout(Duration::from_secs(60))
        .await;

    // Remove buttons after button press
    msg.edit(
        ctx.serenity_context(),
        serenity::EditMessage::new().components(vec![]),
    )
    .await?;

    let pressed_button_id = match &interaction {
        Some(m) => &m.data.custom_id,
        None => {
            // Dropping the pending delete leaves the case untouched
            ctx.say("You didn't interact in time").await?;
            return Ok(());
        }
    };

    if pressed_button_id == "cancel" {
        ctx.say("Cancelled").await?;
        return Ok(());
    }

    match pending.commit(&manager).await {
        Ok(removed) => {
            info!(
                "Deleted case #{} in guild {} on behalf of {}",
                removed.id,
                removed.guild_id,
                ctx.author().id
            );
            ctx.say(format!(
                "{} Case {} deleted",
                config::CONFIG.glyphs.success,
                removed.id
            ))
            .await?;
        }
        Err(CaseError::NotFound(_)) => {
            // Raced with another delete between confirmation and commit
            ctx.say(format!(
                "{} Case {} was already deleted",
                config::CONFIG.glyphs.error,
                case_id
            ))
            .await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
