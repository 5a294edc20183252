use poise::serenity_prelude as serenity;

use crate::config;

type Error = crate::Error;
type Context<'a> = crate::Context<'a>;

/// Check that the author is allowed to act on moderation cases
pub async fn is_moderator(ctx: Context<'_>) -> Result<bool, Error> {
    let member = match ctx.author_member().await {
        Some(member) => member,
        None => return Err("This command can only be used in a server".into()),
    };

    for role in &config::CONFIG.roles.moderator {
        if member.roles.contains(&serenity::RoleId::new(role.get())) {
            return Ok(true);
        }
    }

    // Slash invocations carry the member's resolved permissions
    if let Some(perms) = member.permissions {
        if perms.administrator() || perms.moderate_members() {
            return Ok(true);
        }
    }

    Err("You need moderator permissions to use this command".into())
}
