pub mod commands;
pub mod components;
pub mod discord;
pub mod embeds;
pub mod followups;
pub mod sessions;

pub use discord::start_discord_listener;
pub use sessions::{FollowUpSession, SessionStore};

use serenity::all::{
    ChannelId, CommandInteraction, ComponentInteraction, Context, CreateActionRow,
    CreateInteractionResponse, CreateInteractionResponseFollowup, CreateInteractionResponseMessage,
    GuildId, Message, ModalInteraction, PartialChannel, User,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::council::Council;
use crate::db::Database;
use crate::error::WarRoomError;
use crate::models::{MissionMetadata, NewMission, OfficerResult};
use embeds::{batch_cards, EmbedCard};

/// Everything an interaction handler needs, shared across the gateway tasks
pub struct WarRoom {
    pub council: Council,
    pub db: Arc<Database>,
    pub sessions: SessionStore,
    pub memory_max_tokens: usize,
}

impl WarRoom {
    pub fn new(council: Council, db: Arc<Database>, memory_max_tokens: usize) -> Self {
        Self {
            council,
            db,
            sessions: SessionStore::default(),
            memory_max_tokens,
        }
    }

    /// Register the channel if needed, then persist the mission with its responses
    pub(crate) fn record_mission(
        &self,
        origin: &Origin,
        brief: &str,
        filter: Option<&str>,
        metadata: MissionMetadata,
        results: &[OfficerResult],
    ) -> Result<i64, WarRoomError> {
        self.db
            .ensure_channel(origin.channel_id, &origin.channel_name, origin.guild_id)?;
        self.db.save_mission(&NewMission {
            channel_id: origin.channel_id,
            brief,
            user_id: origin.user_id,
            capability_class_filter: filter,
            metadata,
            results,
        })
    }
}

/// Who asked, and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub channel_id: i64,
    pub channel_name: String,
    pub guild_id: i64,
    pub user_id: i64,
    pub user_name: String,
}

impl Origin {
    fn build(
        channel_id: ChannelId,
        channel: Option<&PartialChannel>,
        guild_id: Option<GuildId>,
        user: &User,
    ) -> Self {
        Self {
            channel_id: channel_id.get() as i64,
            channel_name: channel
                .and_then(|c| c.name.clone())
                .unwrap_or_else(|| "DM".to_string()),
            guild_id: guild_id.map(|g| g.get() as i64).unwrap_or(0),
            user_id: user.id.get() as i64,
            user_name: user.display_name().to_string(),
        }
    }

    pub fn of_command(command: &CommandInteraction) -> Self {
        Self::build(command.channel_id, command.channel.as_ref(), command.guild_id, &command.user)
    }

    pub fn of_component(component: &ComponentInteraction) -> Self {
        Self::build(component.channel_id, component.channel.as_ref(), component.guild_id, &component.user)
    }

    pub fn of_modal(modal: &ModalInteraction) -> Self {
        Self::build(modal.channel_id, modal.channel.as_ref(), modal.guild_id, &modal.user)
    }
}

/// The three interaction kinds the bot answers: an initial response
/// (deferred or immediate), then any number of follow-ups
pub(crate) trait Reply {
    async fn acknowledge(&self, ctx: &Context) -> Result<(), serenity::Error>;

    async fn respond(&self, ctx: &Context, response: CreateInteractionResponse) -> Result<(), serenity::Error>;

    async fn follow_up(
        &self,
        ctx: &Context,
        message: CreateInteractionResponseFollowup,
    ) -> Result<Message, serenity::Error>;
}

macro_rules! impl_reply {
    ($($interaction:ty),*) => {$(
        impl Reply for $interaction {
            async fn acknowledge(&self, ctx: &Context) -> Result<(), serenity::Error> {
                self.defer(&ctx.http).await
            }

            async fn respond(&self, ctx: &Context, response: CreateInteractionResponse) -> Result<(), serenity::Error> {
                self.create_response(&ctx.http, response).await
            }

            async fn follow_up(
                &self,
                ctx: &Context,
                message: CreateInteractionResponseFollowup,
            ) -> Result<Message, serenity::Error> {
                self.create_followup(&ctx.http, message).await
            }
        }
    )*};
}

impl_reply!(CommandInteraction, ComponentInteraction, ModalInteraction);

/// Whether an interaction has had its initial response. Discord refuses
/// follow-ups until it has, so failures are reported differently before and after.
#[derive(Debug, Default)]
pub(crate) struct Ack(AtomicBool);

impl Ack {
    pub fn is_done(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn mark(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Defer: the user sees "thinking" until the first follow-up
    pub async fn defer(&self, ctx: &Context, target: &impl Reply) -> Result<(), WarRoomError> {
        target.acknowledge(ctx).await?;
        self.mark();
        Ok(())
    }

    pub async fn respond(
        &self,
        ctx: &Context,
        target: &impl Reply,
        response: CreateInteractionResponse,
    ) -> Result<(), WarRoomError> {
        target.respond(ctx, response).await?;
        self.mark();
        Ok(())
    }
}

/// Message visible only to the user who clicked or typed
pub(crate) fn ephemeral(content: impl Into<String>) -> CreateInteractionResponse {
    CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(content)
            .ephemeral(true),
    )
}

#[derive(Debug)]
pub(crate) enum ErrorReply {
    Response(CreateInteractionResponse),
    FollowUp(CreateInteractionResponseFollowup),
}

/// How to tell the user a handler failed, given whether it was acknowledged
pub(crate) fn error_reply(acknowledged: bool, content: impl Into<String>) -> ErrorReply {
    if acknowledged {
        ErrorReply::FollowUp(CreateInteractionResponseFollowup::new().content(content))
    } else {
        ErrorReply::Response(ephemeral(content))
    }
}

pub(crate) async fn report_error(ctx: &Context, target: &impl Reply, ack: &Ack, content: impl Into<String>) {
    let sent = match error_reply(ack.is_done(), content) {
        ErrorReply::Response(response) => target.respond(ctx, response).await,
        ErrorReply::FollowUp(message) => target.follow_up(ctx, message).await.map(|_| ()),
    };
    if let Err(e) = sent {
        log::error!("Discord: Failed to report error to user: {}", e);
    }
}

/// Send cards as few messages as the size ceiling allows; controls ride on the last one
pub(crate) async fn send_cards(
    ctx: &Context,
    target: &impl Reply,
    cards: Vec<EmbedCard>,
    controls: Vec<CreateActionRow>,
) -> Result<(), WarRoomError> {
    let mut controls = Some(controls).filter(|rows| !rows.is_empty());
    for batch in batch_cards(cards) {
        let mut message = CreateInteractionResponseFollowup::new()
            .embeds(batch.cards.iter().map(EmbedCard::to_embed).collect());
        if batch.with_controls {
            if let Some(rows) = controls.take() {
                message = message.components(rows);
            }
        }
        target.follow_up(ctx, message).await?;
    }
    Ok(())
}

/// Plain-text follow-up, logged rather than propagated on failure
pub(crate) async fn say(ctx: &Context, target: &impl Reply, content: impl Into<String>) {
    let message = CreateInteractionResponseFollowup::new().content(content);
    if let Err(e) = target.follow_up(ctx, message).await {
        log::error!("Discord: Failed to send follow-up message: {}", e);
    }
}
