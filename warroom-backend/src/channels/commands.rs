//! Slash commands: /mission, /research and /memory.

use serenity::all::{
    CommandInteraction, CommandOptionType, Context, CreateCommand, CreateCommandOption,
    CreateInteractionResponse, CreateInteractionResponseMessage, ResolvedOption, ResolvedValue,
};
use std::collections::HashMap;
use strum::{EnumString, IntoEnumIterator};

use super::components::{confirm_clear_controls, mission_controls, research_controls};
use super::embeds::{
    memory_stats_card, memory_view_card, mission_header, no_officers_message, officer_card,
    research_card, research_header,
};
use super::{say, send_cards, Ack, FollowUpSession, Origin, WarRoom};
use crate::error::WarRoomError;
use crate::models::{CapabilityClass, MissionMetadata, MissionType};
use crate::roster::Roster;

pub const MISSION: &str = "mission";
pub const RESEARCH: &str = "research";
pub const MEMORY: &str = "memory";

/// Prefix marking research topics in mission history
pub const RESEARCH_BRIEF_PREFIX: &str = "[RESEARCH]";

fn class_choice_label(class: CapabilityClass) -> &'static str {
    match class {
        CapabilityClass::Strategic => "Strategic (O1-O4)",
        CapabilityClass::Operational => "Operational (O5-O8)",
        CapabilityClass::Tactical => "Tactical (O9-O12)",
        CapabilityClass::Support => "Support (O13-O16)",
    }
}

fn class_option(description: &str, required: bool) -> CreateCommandOption {
    CapabilityClass::iter().fold(
        CreateCommandOption::new(CommandOptionType::String, "capability_class", description)
            .required(required),
        |option, class| option.add_string_choice(class_choice_label(class), class.choice_value()),
    )
}

/// Definitions registered with Discord on ready
pub fn register_commands() -> Vec<CreateCommand> {
    let mission = CreateCommand::new(MISSION)
        .description("Submit a mission brief to the War Room council")
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::String,
                "brief",
                "The mission brief or question for the council",
            )
            .required(true),
        )
        .add_option(class_option("Filter by capability class (optional)", false));

    let research = CreateCommand::new(RESEARCH)
        .description("Conduct multi-perspective research on a topic")
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::String,
                "topic",
                "The research question or topic to investigate",
            )
            .required(true),
        )
        .add_option(class_option("Which officer class should research this (Required)", true))
        .add_option(CreateCommandOption::new(
            CommandOptionType::Boolean,
            "use_web_search",
            "Enable real-time web search and source citations (Default: False)",
        ));

    let memory = CreateCommand::new(MEMORY)
        .description("Manage officer memory for this channel")
        .add_option(
            CreateCommandOption::new(CommandOptionType::String, "action", "What to do")
                .required(true)
                .add_string_choice("📊 View Stats", "stats")
                .add_string_choice("🔍 View Officer", "view")
                .add_string_choice("➕ Add Note", "add")
                .add_string_choice("🗑️ Clear Officer", "clear"),
        )
        .add_option(CreateCommandOption::new(
            CommandOptionType::String,
            "officer_id",
            "Officer ID (O1-O16)",
        ))
        .add_option(CreateCommandOption::new(
            CommandOptionType::String,
            "note",
            "Note content (for 'add' action)",
        ))
        .add_option(CreateCommandOption::new(
            CommandOptionType::Boolean,
            "pinned",
            "Pin the note so it is always recalled first (for 'add' action)",
        ));

    vec![mission, research, memory]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgValue<'a> {
    Text(&'a str),
    Flag(bool),
}

/// Resolved slash-command options by name
#[derive(Debug, Default)]
pub struct CommandArgs<'a> {
    values: HashMap<&'a str, ArgValue<'a>>,
}

impl<'a> FromIterator<(&'a str, ArgValue<'a>)> for CommandArgs<'a> {
    fn from_iter<I: IntoIterator<Item = (&'a str, ArgValue<'a>)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl<'a> CommandArgs<'a> {
    pub fn from_resolved(options: &[ResolvedOption<'a>]) -> Self {
        options
            .iter()
            .filter_map(|option| match option.value {
                ResolvedValue::String(text) => Some((option.name, ArgValue::Text(text))),
                ResolvedValue::Boolean(flag) => Some((option.name, ArgValue::Flag(flag))),
                _ => None,
            })
            .collect()
    }

    /// Trimmed text option; blank counts as absent
    pub fn text(&self, name: &str) -> Option<&'a str> {
        match self.values.get(name) {
            Some(ArgValue::Text(text)) => Some(text.trim()).filter(|t| !t.is_empty()),
            _ => None,
        }
    }

    pub fn flag(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(ArgValue::Flag(true)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MemoryAction {
    Stats,
    View,
    Add,
    Clear,
}

/// A validated /memory invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryRequest {
    Stats,
    View { officer_id: String },
    Add { officer_id: String, note: String, pinned: bool },
    Clear { officer_id: String },
}

/// Validate /memory options against the roster. `Err` carries the reply to show.
pub fn parse_memory_request(args: &CommandArgs<'_>, roster: &Roster) -> Result<MemoryRequest, String> {
    let action = args
        .text("action")
        .and_then(|a| a.parse::<MemoryAction>().ok())
        .ok_or_else(|| "❌ Unknown memory action".to_string())?;

    if action == MemoryAction::Stats {
        return Ok(MemoryRequest::Stats);
    }

    let officer_id = args.text("officer_id");
    let note = args.text("note");
    if action == MemoryAction::Add && (officer_id.is_none() || note.is_none()) {
        return Err("❌ Please specify officer_id and note".to_string());
    }
    let raw_id = officer_id.ok_or_else(|| "❌ Please specify an officer_id".to_string())?;
    let officer_id = resolve_officer_id(raw_id, roster)
        .ok_or_else(|| format!("❌ Invalid officer_id: {}", raw_id))?;

    Ok(match action {
        MemoryAction::Stats => MemoryRequest::Stats,
        MemoryAction::View => MemoryRequest::View { officer_id },
        MemoryAction::Add => MemoryRequest::Add {
            officer_id,
            note: note.unwrap_or_default().to_string(),
            pinned: args.flag("pinned"),
        },
        MemoryAction::Clear => MemoryRequest::Clear { officer_id },
    })
}

// "o3" is accepted for "O3"
fn resolve_officer_id(raw: &str, roster: &Roster) -> Option<String> {
    [raw.to_string(), raw.to_uppercase()]
        .into_iter()
        .find(|id| roster.contains(id))
}

pub fn research_brief(topic: &str) -> String {
    format!("{} {}", RESEARCH_BRIEF_PREFIX, topic)
}

pub async fn handle_mission(
    war_room: &WarRoom,
    ctx: &Context,
    command: &CommandInteraction,
    ack: &Ack,
) -> Result<(), WarRoomError> {
    let args = CommandArgs::from_resolved(&command.data.options());
    let Some(brief) = args.text("brief") else {
        return respond_text(ctx, command, ack, "❌ Please provide a mission brief").await;
    };
    let filter = args.text("capability_class");
    let origin = Origin::of_command(command);

    ack.defer(ctx, command).await?;
    log::info!(
        "Discord: /mission from {} in {} (filter: {})",
        origin.user_name,
        origin.channel_name,
        filter.unwrap_or("all")
    );

    war_room
        .db
        .ensure_channel(origin.channel_id, &origin.channel_name, origin.guild_id)?;
    let results = war_room
        .council
        .query_all(brief, filter, Some(origin.channel_id))
        .await;
    war_room.record_mission(
        &origin,
        brief,
        filter,
        MissionMetadata::new(MissionType::Mission),
        &results,
    )?;

    if results.is_empty() {
        say(ctx, command, no_officers_message(filter)).await;
        return Ok(());
    }

    let mut cards = vec![mission_header(brief, filter, &origin.user_name, results.len())];
    cards.extend(results.iter().map(officer_card));
    let session_id = war_room.sessions.insert(FollowUpSession::Mission {
        brief: brief.to_string(),
        results,
        filter: filter.map(str::to_string),
    });
    send_cards(ctx, command, cards, mission_controls(&session_id)).await
}

pub async fn handle_research(
    war_room: &WarRoom,
    ctx: &Context,
    command: &CommandInteraction,
    ack: &Ack,
) -> Result<(), WarRoomError> {
    let args = CommandArgs::from_resolved(&command.data.options());
    let (Some(topic), Some(class)) = (args.text("topic"), args.text("capability_class")) else {
        return respond_text(ctx, command, ack, "❌ Please specify a topic and capability_class").await;
    };
    let web_search = args.flag("use_web_search");
    let origin = Origin::of_command(command);

    ack.defer(ctx, command).await?;
    log::info!(
        "Discord: /research from {} in {} (class: {}, web search: {})",
        origin.user_name,
        origin.channel_name,
        class,
        web_search
    );

    war_room
        .db
        .ensure_channel(origin.channel_id, &origin.channel_name, origin.guild_id)?;
    let results = match war_room
        .council
        .query_research(topic, class, Some(origin.channel_id), web_search)
        .await
    {
        Ok(results) => results,
        Err(e @ WarRoomError::ResearchCouncilSize { .. }) => {
            say(ctx, command, format!("❌ {}", e)).await;
            return Ok(());
        }
        Err(e) => return Err(e),
    };
    war_room.record_mission(
        &origin,
        &research_brief(topic),
        Some(class),
        MissionMetadata::research(MissionType::Research, &results, web_search),
        &results,
    )?;

    let mut cards = vec![research_header(topic, class, web_search, &origin.user_name)];
    cards.extend(results.iter().map(research_card));
    let session_id = war_room.sessions.insert(FollowUpSession::Research {
        topic: topic.to_string(),
        results,
        class: class.to_string(),
        web_search,
    });
    send_cards(ctx, command, cards, research_controls(&session_id)).await
}

pub async fn handle_memory(
    war_room: &WarRoom,
    ctx: &Context,
    command: &CommandInteraction,
    ack: &Ack,
) -> Result<(), WarRoomError> {
    let args = CommandArgs::from_resolved(&command.data.options());
    let roster = war_room.council.roster();
    let request = match parse_memory_request(&args, roster) {
        Ok(request) => request,
        Err(reply) => return respond_text(ctx, command, ack, reply).await,
    };
    let origin = Origin::of_command(command);

    let message = match request {
        MemoryRequest::Stats => {
            let stats = war_room.db.channel_stats(origin.channel_id, roster.active_ids())?;
            let card = memory_stats_card(&origin.channel_name, &stats, |id| roster.get(id));
            CreateInteractionResponseMessage::new().embed(card.to_embed())
        }
        MemoryRequest::View { officer_id } => {
            let officer = roster
                .get(&officer_id)
                .ok_or_else(|| WarRoomError::UnknownOfficer(officer_id.clone()))?;
            let memory = war_room.db.load_officer_memory(
                origin.channel_id,
                &officer_id,
                war_room.memory_max_tokens,
            )?;
            CreateInteractionResponseMessage::new().embed(memory_view_card(officer, &memory).to_embed())
        }
        MemoryRequest::Add {
            officer_id,
            note,
            pinned,
        } => {
            war_room
                .db
                .ensure_channel(origin.channel_id, &origin.channel_name, origin.guild_id)?;
            war_room
                .db
                .add_manual_note(origin.channel_id, &officer_id, &note, origin.user_id, pinned)?;
            log::info!(
                "Discord: {} added a note for {} in {}",
                origin.user_name,
                officer_id,
                origin.channel_name
            );
            CreateInteractionResponseMessage::new().content(added_note_reply(&officer_id, pinned))
        }
        MemoryRequest::Clear { officer_id } => CreateInteractionResponseMessage::new()
            .content(format!(
                "⚠️ Clear all manual notes for {} in this channel?",
                officer_id
            ))
            .components(confirm_clear_controls(&officer_id)),
    };

    ack.respond(ctx, command, CreateInteractionResponse::Message(message)).await
}

fn added_note_reply(officer_id: &str, pinned: bool) -> String {
    let pin = if pinned { " (pinned)" } else { "" };
    format!("✅ Added note to {}'s memory in this channel{}", officer_id, pin)
}

async fn respond_text(
    ctx: &Context,
    command: &CommandInteraction,
    ack: &Ack,
    content: impl Into<String>,
) -> Result<(), WarRoomError> {
    let message = CreateInteractionResponseMessage::new().content(content);
    ack.respond(ctx, command, CreateInteractionResponse::Message(message)).await
}
