//! Buttons, modals and the custom_id scheme that routes them back.

use serenity::all::{
    ActionRow, ActionRowComponent, ButtonStyle, CreateActionRow, CreateButton, CreateInputText,
    CreateModal, InputTextStyle,
};

const PREFIX: &str = "warroom";
pub const PIVOT_INPUT_ID: &str = "pivot_instruction";
const MAX_PIVOT_CHARS: u16 = 2000;

/// Every interactive component the bot emits, keyed by session id or officer id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentAction {
    RedTeam(String),
    Plan(String),
    Continue(String),
    Pivot(String),
    Report(String),
    Synthesis(String),
    ResearchPivot(String),
    PivotSubmit(String),
    ResearchPivotSubmit(String),
    ConfirmClear(String),
    CancelClear(String),
}

impl ComponentAction {
    fn parts(&self) -> (&'static str, &str) {
        match self {
            ComponentAction::RedTeam(id) => ("rebuttal", id),
            ComponentAction::Plan(id) => ("plan", id),
            ComponentAction::Continue(id) => ("continue", id),
            ComponentAction::Pivot(id) => ("pivot", id),
            ComponentAction::Report(id) => ("report", id),
            ComponentAction::Synthesis(id) => ("synthesis", id),
            ComponentAction::ResearchPivot(id) => ("research_pivot", id),
            ComponentAction::PivotSubmit(id) => ("pivot_modal", id),
            ComponentAction::ResearchPivotSubmit(id) => ("research_pivot_modal", id),
            ComponentAction::ConfirmClear(id) => ("memclear", id),
            ComponentAction::CancelClear(id) => ("memcancel", id),
        }
    }

    pub fn custom_id(&self) -> String {
        let (kind, id) = self.parts();
        format!("{}:{}:{}", PREFIX, kind, id)
    }

    pub fn parse(custom_id: &str) -> Option<Self> {
        let rest = custom_id.strip_prefix(PREFIX)?.strip_prefix(':')?;
        let (kind, id) = rest.split_once(':')?;
        if id.is_empty() {
            return None;
        }
        let id = id.to_string();
        Some(match kind {
            "rebuttal" => ComponentAction::RedTeam(id),
            "plan" => ComponentAction::Plan(id),
            "continue" => ComponentAction::Continue(id),
            "pivot" => ComponentAction::Pivot(id),
            "report" => ComponentAction::Report(id),
            "synthesis" => ComponentAction::Synthesis(id),
            "research_pivot" => ComponentAction::ResearchPivot(id),
            "pivot_modal" => ComponentAction::PivotSubmit(id),
            "research_pivot_modal" => ComponentAction::ResearchPivotSubmit(id),
            "memclear" => ComponentAction::ConfirmClear(id),
            "memcancel" => ComponentAction::CancelClear(id),
            _ => return None,
        })
    }
}

fn button(action: ComponentAction, label: &str, style: ButtonStyle, emoji: Option<char>) -> CreateButton {
    let button = CreateButton::new(action.custom_id()).label(label).style(style);
    match emoji {
        Some(emoji) => button.emoji(emoji),
        None => button,
    }
}

/// Red Team, Plan, Continue, Pivot
pub fn mission_controls(session_id: &str) -> Vec<CreateActionRow> {
    let id = session_id.to_string();
    vec![CreateActionRow::Buttons(vec![
        button(ComponentAction::RedTeam(id.clone()), "Red Team Rebuttal", ButtonStyle::Danger, Some('🔴')),
        button(ComponentAction::Plan(id.clone()), "Generate Plan", ButtonStyle::Primary, Some('📄')),
        button(ComponentAction::Continue(id.clone()), "Continue & Cross-Reference", ButtonStyle::Success, Some('🔁')),
        button(ComponentAction::Pivot(id), "Pivot", ButtonStyle::Secondary, Some('🔄')),
    ])]
}

/// Report, Synthesis, Pivot
pub fn research_controls(session_id: &str) -> Vec<CreateActionRow> {
    let id = session_id.to_string();
    vec![CreateActionRow::Buttons(vec![
        button(ComponentAction::Report(id.clone()), "Generate Report", ButtonStyle::Primary, Some('📊')),
        button(ComponentAction::Synthesis(id.clone()), "AI Synthesis", ButtonStyle::Secondary, Some('🤖')),
        button(ComponentAction::ResearchPivot(id), "Pivot", ButtonStyle::Secondary, Some('🔄')),
    ])]
}

pub fn confirm_clear_controls(officer_id: &str) -> Vec<CreateActionRow> {
    vec![CreateActionRow::Buttons(vec![
        button(ComponentAction::ConfirmClear(officer_id.to_string()), "Yes, Clear", ButtonStyle::Danger, None),
        button(ComponentAction::CancelClear(officer_id.to_string()), "Cancel", ButtonStyle::Secondary, None),
    ])]
}

fn pivot_input(label: &str, placeholder: &str) -> CreateActionRow {
    CreateActionRow::InputText(
        CreateInputText::new(InputTextStyle::Paragraph, label, PIVOT_INPUT_ID)
            .placeholder(placeholder)
            .required(true)
            .max_length(MAX_PIVOT_CHARS),
    )
}

pub fn pivot_modal(session_id: &str) -> CreateModal {
    CreateModal::new(ComponentAction::PivotSubmit(session_id.to_string()).custom_id(), "🔄 Mission Pivot")
        .components(vec![pivot_input("Course Correction", "Describe the new direction or focus...")])
}

pub fn research_pivot_modal(session_id: &str) -> CreateModal {
    CreateModal::new(
        ComponentAction::ResearchPivotSubmit(session_id.to_string()).custom_id(),
        "🔄 Research Pivot",
    )
    .components(vec![pivot_input(
        "Research Direction Change",
        "Refine or redirect the research focus...",
    )])
}

/// Trimmed pivot instruction from a submitted modal; None when blank or absent
pub fn pivot_instruction(rows: &[ActionRow]) -> Option<String> {
    rows.iter()
        .flat_map(|row| row.components.iter())
        .find_map(|component| match component {
            ActionRowComponent::InputText(input) if input.custom_id == PIVOT_INPUT_ID => input.value.clone(),
            _ => None,
        })
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
