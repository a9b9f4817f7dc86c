//! Prompt text for both model passes
//!
//! The system prompt is the fixed assistant instructions followed by a
//! catalog of the registered actions and the fields each one needs, so the
//! model knows what to collect before requesting an action.

use crate::actions::ActionRegistry;
use crate::auth::CallerIdentity;
use std::fmt::Write;

/// Base instructions establishing the assistant's role
const BASE_PROMPT: &str = r"You are a helpful assistant that manages vendor contracts.
You have access to tools to help users create vendor contracts.
When a user wants to add a contract, use the add_contract_tool with the provided information.
Always ask for missing required information before proceeding.

Be conversational and helpful. If the user provides contract information,
extract the relevant details and use the add_contract_tool to create the contract.
Never invent values the user has not given you.";

/// Instruction appended to the finalizing pass input
pub const FINALIZE_INSTRUCTION: &str = "Provide a helpful response based on the tool results.";

/// Build the system prompt for a registry
pub fn build_system_prompt(registry: &ActionRegistry) -> String {
    let mut prompt = BASE_PROMPT.to_string();

    if registry.schemas().is_empty() {
        return prompt;
    }

    prompt.push_str("\n\n# Available actions\n");
    for schema in registry.schemas() {
        let _ = writeln!(prompt, "\n## {}\n{}\nFields:", schema.name, schema.description);
        for param in &schema.params {
            let marker = if param.is_required() {
                "required"
            } else {
                "optional"
            };
            let _ = writeln!(
                prompt,
                "- {} ({}, {marker}): {}",
                param.name, param.ty, param.description
            );
        }
    }

    prompt
}

/// The user turn as the model sees it: the query tagged with the caller's ids
pub fn user_input(query: &str, caller: &CallerIdentity) -> String {
    format!(
        "{query}\nStore ID: {}, Org ID: {}",
        caller.store_id, caller.org_id
    )
}

/// Input for the finalizing pass
pub fn finalizing_input(user_input: &str, tool_context: &str) -> String {
    format!("{user_input}\n\n{tool_context}\n\n{FINALIZE_INSTRUCTION}")
}
