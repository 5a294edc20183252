use poise::serenity_prelude::{CreateEmbed, CreateEmbedFooter, User, UserId};
use poise::ChoiceParameter;

use super::{CaseType, ModCase};

/// How many cases a list page holds
pub const CASES_PER_PAGE: usize = 5;

/// The creator of a case at the presentation boundary. The user object
/// may not be fetchable anymore (account deleted, missing permissions),
/// in which case all we have is the stored id.
pub enum CaseCreator {
    Resolved(Box<User>),
    Unresolved(UserId),
}

impl CaseCreator {
    pub fn mention(&self) -> String {
        match self {
            CaseCreator::Resolved(user) => format!("<@{}> ({})", user.id, user.name),
            CaseCreator::Unresolved(id) => format!("<@{}>", id),
        }
    }
}

/// Splits an ordered case list into display pages. Empty input yields
/// zero pages.
pub fn paginate(cases: &[ModCase], per_page: usize) -> Vec<&[ModCase]> {
    if per_page == 0 || cases.is_empty() {
        return Vec::new();
    }

    cases.chunks(per_page).collect()
}

pub fn format_duration(duration: chrono::Duration) -> String {
    let days = duration.num_days();
    let hours = duration.num_hours() % 24;
    let minutes = duration.num_minutes() % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }

    if parts.is_empty() {
        return format!("{}s", duration.num_seconds());
    }

    parts.join(" ")
}

fn kind_color(kind: CaseType) -> u32 {
    match kind {
        CaseType::Warn => 0xF1C40F,
        CaseType::Kick => 0xE67E22,
        CaseType::Ban => 0xE74C3C,
        CaseType::Timeout => 0x3498DB,
        CaseType::Mute => 0x95A5A6,
        CaseType::Note => 0x2ECC71,
    }
}

fn status_label(case: &ModCase) -> &'static str {
    if case.resolved {
        "Resolved"
    } else {
        "Open"
    }
}

pub fn case_embed(case: &ModCase, creator: &CaseCreator) -> CreateEmbed {
    let duration = match case.duration() {
        Some(duration) => format_duration(duration),
        None => "Permanent".to_string(),
    };

    CreateEmbed::new()
        .title(format!("Case #{} | {}", case.id, case.kind.name()))
        .field("User", format!("<@{}>", case.user_id), true)
        .field("Moderator", creator.mention(), true)
        .field("Status", status_label(case), true)
        .field("Duration", duration, true)
        .field("Reason", case.reason(), false)
        .footer(CreateEmbedFooter::new(format!(
            "Created at {}",
            case.time_created.format("%Y-%m-%d %H:%M:%S")
        )))
        .color(kind_color(case.kind))
}

/// One page of a user's case history, 5 cases per page.
pub fn page_embed(user: &User, page: &[ModCase], page_index: usize, page_count: usize) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title(format!("Cases for {}", user.name))
        .color(0x3498DB)
        .footer(CreateEmbedFooter::new(format!(
            "Page {}/{}",
            page_index + 1,
            page_count
        )));

    for case in page {
        embed = embed.field(
            format!("Case #{} | {} | {}", case.id, case.kind.name(), status_label(case)),
            format!(
                "{} | {}",
                case.reason(),
                case.time_created.format("%Y-%m-%d %H:%M")
            ),
            false,
        );
    }

    embed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn dummy_case(id: i64) -> ModCase {
        ModCase {
            id,
            guild_id: 1,
            user_id: 42,
            creator_user_id: 7,
            kind: CaseType::Warn,
            description: None,
            resolved: false,
            time_created: Utc::now(),
            time_updated: None,
            time_expires: None,
        }
    }

    #[test]
    fn seven_cases_split_into_pages_of_five_and_two() {
        let cases: Vec<ModCase> = (1..=7).map(dummy_case).collect();

        let pages = paginate(&cases, CASES_PER_PAGE);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].len(), 5);
        assert_eq!(pages[1].len(), 2);
        assert_eq!(pages[1][1].id, 7);
    }

    #[test]
    fn empty_history_has_no_pages() {
        assert!(paginate(&[], CASES_PER_PAGE).is_empty());
    }

    #[test]
    fn zero_per_page_yields_no_pages() {
        let cases = vec![dummy_case(1)];
        assert!(paginate(&cases, 0).is_empty());
    }

    #[test]
    fn durations_format_compactly() {
        assert_eq!(format_duration(chrono::Duration::minutes(30)), "30m");
        assert_eq!(format_duration(chrono::Duration::hours(2)), "2h");
        assert_eq!(
            format_duration(chrono::Duration::days(1) + chrono::Duration::hours(4)),
            "1d 4h"
        );
        assert_eq!(format_duration(chrono::Duration::seconds(45)), "45s");
    }

    #[test]
    fn missing_reasons_render_a_placeholder() {
        assert_eq!(dummy_case(1).reason(), "No reason provided");
    }
}
