use crate::channels::commands::{self, register_commands};
use crate::channels::followups::{handle_component, handle_modal};
use crate::channels::{report_error, Ack, WarRoom};
use crate::error::WarRoomError;
use serenity::all::{
    Client, Command, CommandInteraction, Context, EventHandler, GatewayIntents, Interaction, Ready,
};
use std::sync::Arc;
use tokio::sync::oneshot;

fn failure_message(error: &WarRoomError) -> String {
    format!("❌ The War Room hit an error: {}", error)
}

struct WarRoomHandler {
    war_room: Arc<WarRoom>,
}

impl WarRoomHandler {
    async fn dispatch_command(&self, ctx: &Context, command: &CommandInteraction) {
        let war_room = self.war_room.as_ref();
        let ack = Ack::default();
        let name = command.data.name.as_str();
        let result = match name {
            commands::MISSION => commands::handle_mission(war_room, ctx, command, &ack).await,
            commands::RESEARCH => commands::handle_research(war_room, ctx, command, &ack).await,
            commands::MEMORY => commands::handle_memory(war_room, ctx, command, &ack).await,
            other => {
                log::warn!("Discord: Unknown command /{}", other);
                return;
            }
        };

        if let Err(e) = result {
            log::error!("Discord: /{} failed: {}", name, e);
            report_error(ctx, command, &ack, failure_message(&e)).await;
        }
    }
}

#[serenity::async_trait]
impl EventHandler for WarRoomHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        log::info!("Discord: Bot connected as {}", ready.user.name);

        match Command::set_global_commands(&ctx.http, register_commands()).await {
            Ok(registered) => log::info!("Discord: Registered {} slash commands", registered.len()),
            Err(e) => log::error!("Discord: Failed to register slash commands: {}", e),
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => self.dispatch_command(&ctx, &command).await,
            Interaction::Component(component) => {
                let ack = Ack::default();
                if let Err(e) = handle_component(&self.war_room, &ctx, &component, &ack).await {
                    log::error!("Discord: Button {} failed: {}", component.data.custom_id, e);
                    report_error(&ctx, &component, &ack, failure_message(&e)).await;
                }
            }
            Interaction::Modal(modal) => {
                let ack = Ack::default();
                if let Err(e) = handle_modal(&self.war_room, &ctx, &modal, &ack).await {
                    log::error!("Discord: Modal {} failed: {}", modal.data.custom_id, e);
                    report_error(&ctx, &modal, &ack, failure_message(&e)).await;
                }
            }
            _ => {}
        }
    }
}

/// Start the Discord gateway client and serve interactions until shutdown
pub async fn start_discord_listener(
    bot_token: &str,
    war_room: Arc<WarRoom>,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> Result<(), String> {
    log::info!("Starting Discord listener");
    log::info!("Discord: Token length = {}", bot_token.len());

    // Slash commands arrive as interactions; no message content needed
    let intents = GatewayIntents::GUILDS;

    let handler = WarRoomHandler { war_room };

    let mut client = Client::builder(bot_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| format!("Failed to create Discord client: {}", e))?;

    log::info!("Discord: Client created successfully");

    // Get shard manager for shutdown
    let shard_manager = client.shard_manager.clone();

    tokio::select! {
        _ = &mut shutdown_rx => {
            log::info!("Discord listener received shutdown signal");
            shard_manager.shutdown_all().await;
        }
        result = client.start() => {
            match result {
                Ok(()) => log::info!("Discord listener stopped"),
                Err(e) => {
                    let error = format!("Discord client error: {}", e);
                    log::error!("{}", error);
                    return Err(error);
                }
            }
        }
    }

    Ok(())
}
