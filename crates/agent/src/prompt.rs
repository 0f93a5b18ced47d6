//! Role-configurable prompt composition.
//!
//! A [`Role`] selects a fixed system instruction and greeting from a static
//! table. [`RolePromptBuilder`] glues the instruction, an optional block of
//! earlier conversation, and the new user input into the single prompt
//! string the engine receives. Composition is pure: no I/O, no clock.

use std::fmt;
use std::str::FromStr;

use aurion_core::error::RoleError;
use serde::{Deserialize, Serialize};

/// Default number of recent turns callers feed into `memory_context`.
pub const DEFAULT_CONTEXT_TURNS: usize = 10;

/// Header placed above the rendered history inside a prompt.
pub const CONTEXT_HEADER: &str = "Previous conversation context:";

/// The assistant personas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    General,
    Tutor,
    Coder,
    Mentor,
}

/// The fixed text behind a role.
struct RoleProfile {
    id: &'static str,
    name: &'static str,
    instruction: &'static str,
    greeting: &'static str,
}

/// Indexed by `Role as usize`; order is also the listing order.
const PROFILES: [RoleProfile; 4] = [
    RoleProfile {
        id: "general",
        name: "General Assistant",
        instruction: "You are Aurion, a helpful and intelligent AI assistant. \
                      Answer questions clearly and concisely.",
        greeting: "Hello! I'm Aurion, your AI assistant. How can I help you today?",
    },
    RoleProfile {
        id: "tutor",
        name: "Tutor",
        instruction: "You are Aurion, a friendly and patient tutor. \
                      Explain concepts step-by-step with simple examples.",
        greeting: "Hi there! I'm Aurion, your tutor. What would you like to learn today?",
    },
    RoleProfile {
        id: "coder",
        name: "Coding Assistant",
        instruction: "You are Aurion, an expert software developer. \
                      Provide clean, efficient, and well-commented code.",
        greeting: "Hey! I'm Aurion, your coding assistant. What are we building today?",
    },
    RoleProfile {
        id: "mentor",
        name: "Career Mentor",
        instruction: "You are Aurion, a professional career mentor. \
                      Give practical advice, roadmaps, and motivation.",
        greeting: "Welcome! I'm Aurion, your career mentor. Where do you want to go next?",
    },
];

impl Role {
    pub const ALL: [Role; 4] = [Role::General, Role::Tutor, Role::Coder, Role::Mentor];

    fn profile(self) -> &'static RoleProfile {
        &PROFILES[self as usize]
    }

    /// Case-insensitive lookup by id.
    pub fn parse(input: &str) -> Option<Self> {
        let wanted = input.trim();
        Self::ALL
            .into_iter()
            .find(|role| role.id().eq_ignore_ascii_case(wanted))
    }

    /// Like [`Role::parse`], but unknown input becomes [`Role::General`].
    pub fn from_str_or_default(input: &str) -> Self {
        Self::parse(input).unwrap_or_default()
    }

    pub fn id(self) -> &'static str {
        self.profile().id
    }

    pub fn display_name(self) -> &'static str {
        self.profile().name
    }

    pub fn system_instruction(self) -> &'static str {
        self.profile().instruction
    }

    pub fn greeting(self) -> &'static str {
        self.profile().greeting
    }
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| RoleError::Unknown(s.to_string()))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Holds the active role and composes prompts for it.
#[derive(Debug, Clone, Default)]
pub struct RolePromptBuilder {
    role: Role,
}

impl RolePromptBuilder {
    pub fn new(role: Role) -> Self {
        Self { role }
    }

    /// Switch roles. Unknown input returns false and keeps the current role.
    pub fn set_role(&mut self, role: &str) -> bool {
        match role.parse::<Role>() {
            Ok(role) => {
                self.role = role;
                true
            }
            Err(_) => false,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn role_name(&self) -> &'static str {
        self.role.display_name()
    }

    pub fn greeting(&self) -> &'static str {
        self.role.greeting()
    }

    pub fn system_instruction(&self) -> &'static str {
        self.role.system_instruction()
    }

    /// Compose the provider prompt.
    ///
    /// Layout: instruction, blank line, optional context block, the user
    /// line, then the `Assistant:` cue. `_max_context_turns` documents how
    /// much history the caller was asked to include; nothing is truncated here.
    pub fn build_prompt(
        &self,
        user_input: &str,
        memory_context: Option<&str>,
        _max_context_turns: usize,
    ) -> String {
        let context_len = memory_context.map_or(0, str::len);
        let mut prompt = String::with_capacity(
            self.system_instruction().len() + user_input.len() + context_len + 64,
        );

        prompt.push_str(self.system_instruction());
        prompt.push_str("\n\n");

        if let Some(context) = memory_context.filter(|c| !c.is_empty()) {
            prompt.push_str(CONTEXT_HEADER);
            prompt.push('\n');
            prompt.push_str(context);
            prompt.push_str("\n\n");
        }

        prompt.push_str("User: ");
        prompt.push_str(user_input);
        prompt.push_str("\n\nAssistant:");
        prompt
    }

    /// `(id, display name)` for every role, in a fixed order.
    pub fn available_roles() -> Vec<(&'static str, &'static str)> {
        Role::ALL
            .iter()
            .map(|role| (role.id(), role.display_name()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coder_prompt_without_context() {
        let mut builder = RolePromptBuilder::default();
        assert!(builder.set_role("coder"));

        let prompt = builder.build_prompt("Write a loop", None, DEFAULT_CONTEXT_TURNS);
        assert!(prompt.starts_with(Role::Coder.system_instruction()));
        assert!(prompt.ends_with("User: Write a loop\n\nAssistant:"));
        assert!(!prompt.contains(CONTEXT_HEADER));
    }

    #[test]
    fn prompt_layout_with_context() {
        let builder = RolePromptBuilder::new(Role::Tutor);
        let prompt = builder.build_prompt(
            "And after that?",
            Some("User: What is 2+2?\nAssistant: 4"),
            DEFAULT_CONTEXT_TURNS,
        );

        let expected = format!(
            "{}\n\nPrevious conversation context:\nUser: What is 2+2?\nAssistant: 4\n\nUser: And after that?\n\nAssistant:",
            Role::Tutor.system_instruction()
        );
        assert_eq!(prompt, expected);
    }

    #[test]
    fn empty_context_is_omitted() {
        let builder = RolePromptBuilder::default();
        let with_empty = builder.build_prompt("hi", Some(""), 5);
        let without = builder.build_prompt("hi", None, 5);
        assert_eq!(with_empty, without);

        let whitespace = builder.build_prompt("hi", Some(" "), 5);
        assert!(whitespace.contains(CONTEXT_HEADER));
    }

    #[test]
    fn build_prompt_is_deterministic() {
        let builder = RolePromptBuilder::new(Role::Mentor);
        let a = builder.build_prompt("next steps?", Some("User: hi"), 10);
        let b = builder.build_prompt("next steps?", Some("User: hi"), 3);
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_role_is_rejected_without_change() {
        let mut builder = RolePromptBuilder::new(Role::Tutor);
        assert!(!builder.set_role("nonsense"));
        assert_eq!(builder.role(), Role::Tutor);
        assert_eq!(builder.role_name(), "Tutor");
    }

    #[test]
    fn role_names_are_case_insensitive() {
        let mut builder = RolePromptBuilder::default();
        assert!(builder.set_role("  MENTOR "));
        assert_eq!(builder.role(), Role::Mentor);
        assert_eq!(builder.greeting(), Role::Mentor.greeting());
    }

    #[test]
    fn unknown_initial_role_falls_back_to_general() {
        assert_eq!(Role::from_str_or_default("assistant"), Role::General);
        assert_eq!(Role::from_str_or_default("coder"), Role::Coder);
    }

    #[test]
    fn from_str_reports_unknown_role() {
        assert_eq!("tutor".parse::<Role>(), Ok(Role::Tutor));
        assert_eq!(
            "pirate".parse::<Role>(),
            Err(RoleError::Unknown("pirate".into()))
        );
    }

    #[test]
    fn available_roles_are_ordered() {
        let roles = RolePromptBuilder::available_roles();
        let ids: Vec<_> = roles.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec!["general", "tutor", "coder", "mentor"]);
        assert_eq!(roles[3].1, "Career Mentor");
    }

    #[test]
    fn every_role_has_distinct_text() {
        for (i, a) in Role::ALL.iter().enumerate() {
            assert_eq!(Role::parse(a.id()), Some(*a));
            for b in &Role::ALL[i + 1..] {
                assert_ne!(a.system_instruction(), b.system_instruction());
                assert_ne!(a.greeting(), b.greeting());
            }
        }
    }

    #[test]
    fn role_serializes_as_id() {
        assert_eq!(serde_json::to_string(&Role::Coder).unwrap(), r#""coder""#);
        assert_eq!(Role::General.to_string(), "general");
    }
}
