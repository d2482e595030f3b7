//! Agent crew abstractions.
//!
//! This module defines:
//! - `AgentProfile`: who an agent is (role, goal, backstory)
//! - `CrewObserver`: lifecycle hooks invoked while a crew runs
//! - `Crew`: a blocking "run the agents and return their text" call
//!
//! Concrete roles and prompts live in [`roles`]; [`sequential`] provides a
//! crew that runs the SQL expert and then the data detective.

pub mod roles;
pub mod sequential;

pub use roles::{AgentRole, TaskSpec};
pub use sequential::SequentialCrew;

use crate::Result;

/// Identity of an agent as seen by observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentProfile {
    /// Display role, e.g. "Data Detective"
    pub role: String,
    pub goal: String,
    pub backstory: String,
}

/// Hooks invoked synchronously, in order, during [`Crew::kickoff`].
///
/// Every hook defaults to doing nothing.
pub trait CrewObserver {
    /// An agent is about to start its task.
    fn on_agent_start(&mut self, _agent: &AgentProfile) {}

    /// An agent finished its task with `output`.
    fn on_agent_end(&mut self, _agent: &AgentProfile, _output: &str) {}

    /// An agent called `tool` with `input`.
    fn on_tool_use(&mut self, _agent: &AgentProfile, _tool: &str, _input: &str, _success: bool) {}
}

/// A group of agents that produces free text for one investigation.
pub trait Crew {
    /// Run every agent to completion and return the final answer.
    fn kickoff(&mut self, observer: &mut dyn CrewObserver) -> Result<String>;
}
