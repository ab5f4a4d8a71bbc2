//! Button and modal handlers for the controls under council replies.
//!
//! Each handler looks its session up before acknowledging, so an expired
//! session gets an immediate reply instead of a dangling "thinking" state.

use chrono::Utc;
use serenity::all::{
    ComponentInteraction, Context, CreateAttachment, CreateInteractionResponse,
    CreateInteractionResponseFollowup, CreateInteractionResponseMessage, ModalInteraction,
};
use std::sync::Arc;

use super::commands::research_brief;
use super::components::{
    mission_controls, pivot_instruction, pivot_modal, research_controls, research_pivot_modal,
    ComponentAction,
};
use super::embeds::{
    class_title, continue_header, follow_up_card, officer_card, pivot_header, report_card,
    research_card, research_pivot_header,
};
use super::{ephemeral, say, send_cards, Ack, FollowUpSession, Origin, WarRoom};
use crate::council::prompt::{pivot_brief, research_pivot_topic};
use crate::council::report::{render_research_report, report_filename, report_preview};
use crate::error::WarRoomError;
use crate::models::{MissionMetadata, MissionType, OfficerResult};

pub const SESSION_EXPIRED: &str = "⌛ This session has expired. Run the command again to get fresh controls.";

/// Which single-officer follow-up a button asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SingleFollowUp {
    Rebuttal,
    Plan,
    Synthesis,
}

impl SingleFollowUp {
    fn title(&self) -> &'static str {
        match self {
            SingleFollowUp::Rebuttal => "🔴 Red Team Rebuttal",
            SingleFollowUp::Plan => "📄 Strategic Plan",
            SingleFollowUp::Synthesis => "🤖 AI Research Synthesis",
        }
    }

    fn footer(&self, user_name: &str) -> Option<String> {
        match self {
            SingleFollowUp::Rebuttal => Some(format!("Requested by {}", user_name)),
            SingleFollowUp::Plan => Some(format!("Generated by {}", user_name)),
            SingleFollowUp::Synthesis => None,
        }
    }

    fn mission_type(&self) -> MissionType {
        match self {
            SingleFollowUp::Rebuttal => MissionType::Rebuttal,
            SingleFollowUp::Plan => MissionType::Plan,
            SingleFollowUp::Synthesis => MissionType::Synthesis,
        }
    }
}

pub async fn handle_component(
    war_room: &WarRoom,
    ctx: &Context,
    component: &ComponentInteraction,
    ack: &Ack,
) -> Result<(), WarRoomError> {
    let Some(action) = ComponentAction::parse(&component.data.custom_id) else {
        log::debug!("Discord: Ignoring unknown component {}", component.data.custom_id);
        return Ok(());
    };

    match action {
        ComponentAction::RedTeam(id) => single_follow_up(war_room, ctx, component, ack, &id, SingleFollowUp::Rebuttal).await,
        ComponentAction::Plan(id) => single_follow_up(war_room, ctx, component, ack, &id, SingleFollowUp::Plan).await,
        ComponentAction::Synthesis(id) => {
            single_follow_up(war_room, ctx, component, ack, &id, SingleFollowUp::Synthesis).await
        }
        ComponentAction::Continue(id) => continue_mission(war_room, ctx, component, ack, &id).await,
        ComponentAction::Report(id) => research_report(war_room, ctx, component, ack, &id).await,
        ComponentAction::Pivot(id) => open_modal(war_room, ctx, component, ack, &id, false).await,
        ComponentAction::ResearchPivot(id) => open_modal(war_room, ctx, component, ack, &id, true).await,
        ComponentAction::ConfirmClear(officer_id) => {
            let origin = Origin::of_component(component);
            let cleared = war_room.db.clear_officer_memory(origin.channel_id, &officer_id)?;
            log::info!(
                "Discord: {} cleared {} notes for {} in {}",
                origin.user_name,
                cleared,
                officer_id,
                origin.channel_name
            );
            update_message(ctx, component, ack, format!("✅ Cleared {}'s memory", officer_id)).await
        }
        ComponentAction::CancelClear(_) => update_message(ctx, component, ack, "❌ Cancelled").await,
        ComponentAction::PivotSubmit(_) | ComponentAction::ResearchPivotSubmit(_) => {
            log::warn!("Discord: Modal id {} arrived as a component", component.data.custom_id);
            Ok(())
        }
    }
}

pub async fn handle_modal(
    war_room: &WarRoom,
    ctx: &Context,
    modal: &ModalInteraction,
    ack: &Ack,
) -> Result<(), WarRoomError> {
    let (session_id, research) = match ComponentAction::parse(&modal.data.custom_id) {
        Some(ComponentAction::PivotSubmit(id)) => (id, false),
        Some(ComponentAction::ResearchPivotSubmit(id)) => (id, true),
        _ => {
            log::debug!("Discord: Ignoring unknown modal {}", modal.data.custom_id);
            return Ok(());
        }
    };

    let Some(instruction) = pivot_instruction(&modal.data.components) else {
        return ack.respond(ctx, modal, ephemeral("❌ Please describe the pivot")).await;
    };
    let Some(session) = war_room.sessions.get(&session_id) else {
        return ack.respond(ctx, modal, ephemeral(SESSION_EXPIRED)).await;
    };
    let origin = Origin::of_modal(modal);

    match (session.as_ref(), research) {
        (FollowUpSession::Mission { brief, filter, .. }, false) => {
            ack.defer(ctx, modal).await?;
            let new_brief = pivot_brief(brief, &instruction);
            let filter = filter.as_deref();
            let results = war_room
                .council
                .query_all(&new_brief, filter, Some(origin.channel_id))
                .await;
            war_room.record_mission(&origin, &new_brief, filter, MissionMetadata::new(MissionType::Pivot), &results)?;

            let mut cards = vec![pivot_header(&new_brief, &origin.user_name)];
            cards.extend(results.iter().map(officer_card));
            let next = war_room.sessions.insert(FollowUpSession::Mission {
                brief: new_brief,
                results,
                filter: filter.map(str::to_string),
            });
            send_cards(ctx, modal, cards, mission_controls(&next)).await
        }
        (FollowUpSession::Research { topic, class, web_search, .. }, true) => {
            ack.defer(ctx, modal).await?;
            let new_topic = research_pivot_topic(topic, &instruction);
            let results = match war_room
                .council
                .query_research(&new_topic, class, Some(origin.channel_id), *web_search)
                .await
            {
                Ok(results) => results,
                Err(e @ WarRoomError::ResearchCouncilSize { .. }) => {
                    say(ctx, modal, format!("❌ {}", e)).await;
                    return Ok(());
                }
                Err(e) => return Err(e),
            };
            war_room.record_mission(
                &origin,
                &research_brief(&new_topic),
                Some(class.as_str()),
                MissionMetadata::research(MissionType::ResearchPivot, &results, *web_search),
                &results,
            )?;

            let mut cards = vec![research_pivot_header(&new_topic, class, &origin.user_name)];
            cards.extend(results.iter().map(research_card));
            let next = war_room.sessions.insert(FollowUpSession::Research {
                topic: new_topic,
                results,
                class: class.clone(),
                web_search: *web_search,
            });
            send_cards(ctx, modal, cards, research_controls(&next)).await
        }
        _ => ack.respond(ctx, modal, ephemeral(SESSION_EXPIRED)).await,
    }
}

/// Brief or topic plus the results the follow-up should work from
fn session_subject(session: &FollowUpSession) -> (&str, &[OfficerResult], Option<&str>) {
    match session {
        FollowUpSession::Mission { brief, results, filter } => (brief.as_str(), results.as_slice(), filter.as_deref()),
        FollowUpSession::Research { topic, results, class, .. } => {
            (topic.as_str(), results.as_slice(), Some(class.as_str()))
        }
    }
}

async fn single_follow_up(
    war_room: &WarRoom,
    ctx: &Context,
    component: &ComponentInteraction,
    ack: &Ack,
    session_id: &str,
    kind: SingleFollowUp,
) -> Result<(), WarRoomError> {
    let Some(session) = live_session(war_room, ctx, component, ack, session_id).await? else {
        return Ok(());
    };
    let origin = Origin::of_component(component);
    let (subject, results, filter) = session_subject(&session);
    ack.defer(ctx, component).await?;

    let channel = Some(origin.channel_id);
    let outcome = match kind {
        SingleFollowUp::Rebuttal => war_room.council.red_team_rebuttal(subject, results, channel).await,
        SingleFollowUp::Plan => war_room.council.generate_plan(subject, results, channel).await,
        SingleFollowUp::Synthesis => war_room.council.synthesize_research(subject, results, channel).await,
    };
    let result = match outcome {
        Ok(result) => result,
        Err(e @ WarRoomError::UnknownOfficer(_)) => {
            say(ctx, component, format!("❌ {}", e)).await;
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let brief = match session.as_ref() {
        FollowUpSession::Research { topic, .. } => research_brief(topic),
        FollowUpSession::Mission { brief, .. } => brief.clone(),
    };
    war_room.record_mission(
        &origin,
        &brief,
        filter,
        MissionMetadata::new(kind.mission_type()),
        std::slice::from_ref(&result),
    )?;

    let card = follow_up_card(kind.title(), &result, kind.footer(&origin.user_name));
    send_cards(ctx, component, vec![card], Vec::new()).await
}

async fn continue_mission(
    war_room: &WarRoom,
    ctx: &Context,
    component: &ComponentInteraction,
    ack: &Ack,
    session_id: &str,
) -> Result<(), WarRoomError> {
    let Some(session) = live_session(war_room, ctx, component, ack, session_id).await? else {
        return Ok(());
    };
    let FollowUpSession::Mission { brief, results, filter } = session.as_ref() else {
        return ack.respond(ctx, component, ephemeral(SESSION_EXPIRED)).await;
    };
    let origin = Origin::of_component(component);
    ack.defer(ctx, component).await?;

    let filter = filter.as_deref();
    let fresh = war_room
        .council
        .continue_mission(brief, results, filter, Some(origin.channel_id))
        .await;
    war_room.record_mission(&origin, brief, filter, MissionMetadata::new(MissionType::Continue), &fresh)?;

    let mut cards = vec![continue_header(brief, &origin.user_name)];
    cards.extend(fresh.iter().map(officer_card));
    let next = war_room.sessions.insert(FollowUpSession::Mission {
        brief: brief.clone(),
        results: fresh,
        filter: filter.map(str::to_string),
    });
    send_cards(ctx, component, cards, mission_controls(&next)).await
}

async fn research_report(
    war_room: &WarRoom,
    ctx: &Context,
    component: &ComponentInteraction,
    ack: &Ack,
    session_id: &str,
) -> Result<(), WarRoomError> {
    let Some(session) = live_session(war_room, ctx, component, ack, session_id).await? else {
        return Ok(());
    };
    let FollowUpSession::Research { topic, results, class, web_search } = session.as_ref() else {
        return ack.respond(ctx, component, ephemeral(SESSION_EXPIRED)).await;
    };
    let origin = Origin::of_component(component);
    ack.defer(ctx, component).await?;

    let now = Utc::now();
    let markdown = render_research_report(topic, results, &class_title(class), *web_search, now);
    let card = report_card(topic, &report_preview(&markdown), &origin.user_name);
    let message = CreateInteractionResponseFollowup::new()
        .embed(card.to_embed())
        .add_file(CreateAttachment::bytes(markdown.into_bytes(), report_filename(now)));
    component.create_followup(&ctx.http, message).await?;
    Ok(())
}

async fn open_modal(
    war_room: &WarRoom,
    ctx: &Context,
    component: &ComponentInteraction,
    ack: &Ack,
    session_id: &str,
    research: bool,
) -> Result<(), WarRoomError> {
    if live_session(war_room, ctx, component, ack, session_id).await?.is_none() {
        return Ok(());
    }
    let modal = if research {
        research_pivot_modal(session_id)
    } else {
        pivot_modal(session_id)
    };
    ack.respond(ctx, component, CreateInteractionResponse::Modal(modal)).await
}

/// The session behind a button, or None after telling the user it expired
async fn live_session(
    war_room: &WarRoom,
    ctx: &Context,
    component: &ComponentInteraction,
    ack: &Ack,
    session_id: &str,
) -> Result<Option<Arc<FollowUpSession>>, WarRoomError> {
    match war_room.sessions.get(session_id) {
        Some(session) => Ok(Some(session)),
        None => {
            ack.respond(ctx, component, ephemeral(SESSION_EXPIRED)).await?;
            Ok(None)
        }
    }
}

// Replaces the confirmation prompt and drops its buttons
async fn update_message(
    ctx: &Context,
    component: &ComponentInteraction,
    ack: &Ack,
    content: impl Into<String>,
) -> Result<(), WarRoomError> {
    let message = CreateInteractionResponseMessage::new()
        .content(content)
        .components(Vec::new());
    ack.respond(ctx, component, CreateInteractionResponse::UpdateMessage(message)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_follow_up_cards() {
        assert_eq!(SingleFollowUp::Rebuttal.footer("Rex").as_deref(), Some("Requested by Rex"));
        assert_eq!(SingleFollowUp::Plan.footer("Rex").as_deref(), Some("Generated by Rex"));
        assert_eq!(SingleFollowUp::Synthesis.footer("Rex"), None);
        assert_eq!(SingleFollowUp::Plan.title(), "📄 Strategic Plan");
        assert_eq!(SingleFollowUp::Synthesis.mission_type(), MissionType::Synthesis);
    }

    #[test]
    fn test_session_subject() {
        let mission = FollowUpSession::Mission {
            brief: "Hold".to_string(),
            results: Vec::new(),
            filter: None,
        };
        assert_eq!(session_subject(&mission).0, "Hold");
        assert_eq!(session_subject(&mission).2, None);

        let research = FollowUpSession::Research {
            topic: "Fusion".to_string(),
            results: Vec::new(),
            class: "tactical".to_string(),
            web_search: true,
        };
        assert_eq!(session_subject(&research).0, "Fusion");
        assert_eq!(session_subject(&research).2, Some("tactical"));
    }
}
