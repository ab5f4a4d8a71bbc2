//! Prompt assembly for officer queries and follow-up actions.

use crate::models::OfficerResult;

use super::roles::ResearchRole;

pub const WEB_SEARCH_NOTE: &str = "\n\n**IMPORTANT: You have access to real-time web search. \
Search for current information, cite specific sources with URLs, and include publication dates \
when available. Always verify facts through multiple sources.**";

pub const WEB_SEARCH_USER_NOTE: &str =
    "\n\n**Use web search to find current information and cite all sources with URLs.**";

pub const EMPTY_REPLY_PLACEHOLDER: &str = "⚠️ Model returned empty response. This may indicate \
the model doesn't support the requested operation or encountered an internal error.";

const REBUTTAL_TASK: &str = "**Task:** Provide a Red Team rebuttal. Identify weaknesses, risks, \
and failure modes in the council's responses.";

const PLAN_TASK: &str = "**Task:** Synthesize the council's responses into a structured PLAN.md \
document. Include: Executive Summary, Key Objectives, Implementation Steps, Risk Mitigation, and \
Success Criteria.";

const CONTINUE_TASK: &str = "**Task:** Having reviewed your fellow officers' perspectives, continue \
your analysis. Build upon points of agreement, address any gaps or contradictions you see, and \
refine your position based on the collective intelligence above.";

const SYNTHESIS_TASK: &str = "**Task:** Synthesize these perspectives into cohesive insights. \
Identify patterns and reconcile contradictions.";

/// Models with native web search: Perplexity, and Google's Gemini family.
pub fn model_supports_web_search(model: &str) -> bool {
    let model = model.to_lowercase();
    model.contains("perplexity") || (model.contains("google") && model.contains("gemini"))
}

/// Base prompt, then role, then memory, then the web-search note
pub fn build_system_prompt(
    base: &str,
    role: Option<ResearchRole>,
    memory: Option<&str>,
    web_search_active: bool,
) -> String {
    let mut prompt = base.to_string();
    if let Some(role) = role {
        prompt.push_str(&format!("\n\n## RESEARCH ROLE: {}\n{}", role.name(), role.instruction()));
    }
    if let Some(memory) = memory.filter(|m| !m.is_empty()) {
        prompt.push_str(&format!("\n\n## Your Memory for This Channel:\n{}", memory));
    }
    if web_search_active {
        prompt.push_str(WEB_SEARCH_NOTE);
    }
    prompt
}

pub fn research_user_prompt(topic: &str, role: ResearchRole, web_search_active: bool) -> String {
    let mut prompt = format!(
        "Research Topic: {}\n\nProvide a comprehensive analysis from your assigned perspective as the {}.",
        topic,
        role.name()
    );
    if web_search_active {
        prompt.push_str(WEB_SEARCH_USER_NOTE);
    }
    prompt
}

pub fn tool_call_placeholder(arguments: &str) -> String {
    format!(
        "⚠️ Model attempted to call search tool but function execution is not yet implemented. Query: {}",
        arguments
    )
}

pub fn web_search_disclaimer(model: &str, content: &str) -> String {
    format!(
        "📚 **Note: Web search not available for this model ({}). Response based on pretraining knowledge only.**\n\n{}",
        model, content
    )
}

fn compile_council_output(brief: &str, results: &[OfficerResult]) -> String {
    let mut output = format!("**Original Mission:** {}\n\n", brief);
    for result in results {
        output.push_str(&format!("**[{}]:**\n{}\n\n", result.label(), result.response));
    }
    output
}

pub fn rebuttal_prompt(brief: &str, results: &[OfficerResult]) -> String {
    format!("{}\n\n{}", compile_council_output(brief, results), REBUTTAL_TASK)
}

pub fn plan_prompt(brief: &str, results: &[OfficerResult]) -> String {
    format!("{}\n\n{}", compile_council_output(brief, results), PLAN_TASK)
}

pub fn continuation_prompt(brief: &str, results: &[OfficerResult]) -> String {
    let mut context = format!("**Original Mission:** {}\n\n**Council Responses:**\n", brief);
    for result in results {
        context.push_str(&format!("\n**[{}]:**\n{}\n", result.label(), result.response));
    }
    format!("{}\n\n{}", context, CONTINUE_TASK)
}

pub fn synthesis_prompt(topic: &str, results: &[OfficerResult]) -> String {
    let mut output = format!("**Research Topic:** {}\n\n", topic);
    for result in results {
        let role = result.research_role.as_deref().unwrap_or(result.title.as_str());
        output.push_str(&format!("**{}:**\n{}\n\n", role, result.response));
    }
    format!("{}\n\n{}", output, SYNTHESIS_TASK)
}

pub fn pivot_brief(brief: &str, instruction: &str) -> String {
    format!("{}\n\n**PIVOT:** {}", brief, instruction)
}

pub fn research_pivot_topic(topic: &str, instruction: &str) -> String {
    format!("{} [PIVOT: {}]", topic, instruction)
}
