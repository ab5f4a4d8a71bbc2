//! Embed cards and message batching.
//!
//! Discord rejects a message whose embeds total more than 6000 characters,
//! so council output is packed greedily, in order, under a safer ceiling.
//! Follow-up buttons ride on the last message only.

use serenity::all::{CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter};

use crate::models::{CapabilityClass, Officer, OfficerMemoryStats, OfficerResult};
use crate::text::{truncate_chars, truncate_with_suffix};

/// Aggregate embed characters per outgoing message
pub const MAX_BATCH_CHARS: usize = 5500;
/// Discord allows at most ten embeds on one message
pub const MAX_EMBEDS_PER_MESSAGE: usize = 10;
/// Embed description limit
pub const MAX_DESCRIPTION_CHARS: usize = 4096;
/// Research cards carry an officer line above the response
pub const MAX_RESEARCH_RESPONSE_CHARS: usize = 3900;
const MAX_TITLE_CHARS: usize = 256;

const PIVOT_COLOR: u32 = 0xE67E22;
const CONTINUE_COLOR: u32 = 0x27AE60;
const REPORT_COLOR: u32 = 0x2ECC71;
const STATS_COLOR: u32 = 0x3498DB;
const PERSPECTIVES: &str =
    "**Perspectives:** State-of-the-Art, Critical Analysis, Visionary, Historical Context";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Renderable embed, kept as plain data so its size can be measured
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmbedCard {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
    pub author: Option<String>,
}

impl EmbedCard {
    pub fn new(title: impl Into<String>, description: &str, color: u32) -> Self {
        let title: String = title.into();
        Self {
            title: truncate_chars(&title, MAX_TITLE_CHARS).to_string(),
            description: truncate_chars(description, MAX_DESCRIPTION_CHARS).to_string(),
            color,
            ..Default::default()
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(text.into());
        self
    }

    pub fn author(mut self, name: impl Into<String>) -> Self {
        self.author = Some(name.into());
        self
    }

    /// Characters Discord counts toward the per-message total
    pub fn size(&self) -> usize {
        let count = |s: &str| s.chars().count();
        count(&self.title)
            + count(&self.description)
            + self.footer.as_deref().map_or(0, count)
            + self.author.as_deref().map_or(0, count)
            + self
                .fields
                .iter()
                .map(|f| count(&f.name) + count(&f.value))
                .sum::<usize>()
    }

    pub fn to_embed(&self) -> CreateEmbed {
        let mut embed = CreateEmbed::new()
            .title(&self.title)
            .description(&self.description)
            .colour(self.color);
        for field in &self.fields {
            embed = embed.field(&field.name, &field.value, field.inline);
        }
        if let Some(footer) = &self.footer {
            embed = embed.footer(CreateEmbedFooter::new(footer));
        }
        if let Some(author) = &self.author {
            embed = embed.author(CreateEmbedAuthor::new(author));
        }
        embed
    }
}

/// One outgoing message worth of cards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch<T> {
    pub cards: Vec<T>,
    pub with_controls: bool,
}

/// Greedy in-order packing. A card that would push the running total past
/// `ceiling`, or the batch past `max_cards`, closes the current batch first;
/// an oversized card travels alone. Only the final batch carries the
/// controls. No cards, no batches.
pub fn plan_batches<T>(
    cards: Vec<T>,
    size_of: impl Fn(&T) -> usize,
    ceiling: usize,
    max_cards: usize,
) -> Vec<Batch<T>> {
    let mut batches = Vec::new();
    let mut current = Vec::new();
    let mut current_size = 0;

    for card in cards {
        let size = size_of(&card);
        let full = current_size + size > ceiling || current.len() >= max_cards;
        if full && !current.is_empty() {
            batches.push(Batch {
                cards: std::mem::take(&mut current),
                with_controls: false,
            });
            current_size = 0;
        }
        current.push(card);
        current_size += size;
    }

    if !current.is_empty() {
        batches.push(Batch {
            cards: current,
            with_controls: false,
        });
    }
    if let Some(last) = batches.last_mut() {
        last.with_controls = true;
    }
    batches
}

pub fn batch_cards(cards: Vec<EmbedCard>) -> Vec<Batch<EmbedCard>> {
    plan_batches(cards, EmbedCard::size, MAX_BATCH_CHARS, MAX_EMBEDS_PER_MESSAGE)
}

/// "strategic" -> "Strategic"; unknown filters are capitalized as typed
pub fn class_title(filter: &str) -> String {
    if let Ok(class) = filter.parse::<CapabilityClass>() {
        return class.to_string();
    }
    let mut chars = filter.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn with_status_fields(card: EmbedCard, result: &OfficerResult) -> EmbedCard {
    card.field("Class", result.capability_class.to_string(), true)
        .field("Specialty", &result.specialty, true)
        .field("Status", result.status_label(), true)
}

pub fn officer_card(result: &OfficerResult) -> EmbedCard {
    let card = EmbedCard::new(
        format!("**[{}]** • {}", result.label(), result.model),
        &result.response,
        result.color,
    );
    with_status_fields(card, result)
}

pub fn research_card(result: &OfficerResult) -> EmbedCard {
    let role = result.research_role.as_deref().unwrap_or("Perspective");
    let description = format!(
        "**[{}]** • {}\n\n{}",
        result.label(),
        result.model,
        truncate_chars(&result.response, MAX_RESEARCH_RESPONSE_CHARS)
    );
    with_status_fields(EmbedCard::new(format!("**{}**", role), &description, result.color), result)
}

pub fn mission_header(brief: &str, filter: Option<&str>, requested_by: &str, officers: usize) -> EmbedCard {
    let title = match filter {
        Some(f) => format!("🎯 War Room Mission Brief - {} Class", class_title(f)),
        None => "🎯 War Room Mission Brief".to_string(),
    };
    EmbedCard::new(title, brief, CapabilityClass::color_for_filter(filter))
        .footer(format!("Requested by {} • Officers: {}", requested_by, officers))
}

pub fn pivot_header(brief: &str, pivoted_by: &str) -> EmbedCard {
    EmbedCard::new("🔄 Pivoted Mission Brief", brief, PIVOT_COLOR).footer(format!("Pivoted by {}", pivoted_by))
}

pub fn continue_header(brief: &str, continued_by: &str) -> EmbedCard {
    EmbedCard::new("🔁 Continued Analysis — Cross-Referenced", brief, CONTINUE_COLOR)
        .footer(format!("Continued by {}", continued_by))
}

pub fn research_header(topic: &str, class: &str, web_search: bool, requested_by: &str) -> EmbedCard {
    let mode = if web_search { "🌐 Web Search Enabled" } else { "📚 Pretraining Only" };
    EmbedCard::new(
        format!("🔬 Research Mission - {} Class", class_title(class)),
        &format!("**Topic:** {}\n**Mode:** {}\n\n{}", topic, mode, PERSPECTIVES),
        CapabilityClass::color_for_filter(Some(class)),
    )
    .footer(format!("Requested by {}", requested_by))
}

pub fn research_pivot_header(topic: &str, class: &str, pivoted_by: &str) -> EmbedCard {
    EmbedCard::new(
        format!("🔄 Pivoted Research - {} Class", class_title(class)),
        &format!("**Topic:** {}\n\n{}", topic, PERSPECTIVES),
        CapabilityClass::color_for_filter(Some(class)),
    )
    .footer(format!("Pivoted by {}", pivoted_by))
}

/// Single-officer follow-up output (rebuttal, plan, synthesis)
pub fn follow_up_card(title: &str, result: &OfficerResult, footer: Option<String>) -> EmbedCard {
    let card = EmbedCard::new(title, &result.response, result.color).author(result.label());
    match footer {
        Some(text) => card.footer(text),
        None => card,
    }
}

pub fn report_card(topic: &str, preview: &str, generated_by: &str) -> EmbedCard {
    EmbedCard::new(
        "📊 Research Report Generated",
        &format!("**Topic:** {}\n\n**Preview:**\n```\n{}\n```", topic, preview),
        REPORT_COLOR,
    )
    .footer(format!("Generated by {}", generated_by))
}

pub fn memory_stats_card<'a>(
    channel_name: &str,
    stats: &[OfficerMemoryStats],
    officer: impl Fn(&str) -> Option<&'a Officer>,
) -> EmbedCard {
    let mut card = EmbedCard::new(
        "📊 Channel Memory Statistics",
        &format!("Memory status for {}", channel_name),
        STATS_COLOR,
    );
    for entry in stats {
        if let Some(o) = officer(&entry.officer_id) {
            card = card.field(
                o.label(),
                format!("Notes: {} | Missions: {}", entry.notes, entry.missions),
                false,
            );
        }
    }
    card
}

pub fn memory_view_card(officer: &Officer, memory: &str) -> EmbedCard {
    let body = if memory.is_empty() { "No memory yet" } else { memory };
    EmbedCard::new(
        format!("🧠 Memory: {}", officer.label()),
        &truncate_with_suffix(body, MAX_DESCRIPTION_CHARS, "…"),
        officer.display_color(),
    )
}

pub fn no_officers_message(filter: Option<&str>) -> String {
    format!(
        "❌ No officers found for capability class: **{}**\nAvailable classes: Strategic, Operational, Tactical, Support",
        filter.unwrap_or("all")
    )
}
