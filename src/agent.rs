//! Assistant persona selection

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Agent {
    #[default]
    Professor,
    Hacker,
}

impl Agent {
    pub fn display_name(&self) -> &'static str {
        match self {
            Agent::Professor => "Professor Cedrik",
            Agent::Hacker => "H4ck3r Man Pancho",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Agent::Professor => Agent::Hacker,
            Agent::Hacker => Agent::Professor,
        }
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Agent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "professor" | "prof" => Ok(Agent::Professor),
            "hacker" => Ok(Agent::Hacker),
            other => Err(format!("unknown agent '{}' (expected professor or hacker)", other)),
        }
    }
}

/// Currently selected persona. Not persisted.
#[derive(Debug, Default)]
pub struct AgentContext {
    agent: Agent,
}

impl AgentContext {
    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }

    pub fn agent(&self) -> Agent {
        self.agent
    }

    pub fn set_agent(&mut self, agent: Agent) {
        if agent != self.agent {
            tracing::debug!("Agent switched to {}", agent.display_name());
        }
        self.agent = agent;
    }

    pub fn toggle(&mut self) -> Agent {
        self.set_agent(self.agent.toggled());
        self.agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_professor() {
        assert_eq!(AgentContext::default().agent(), Agent::Professor);
    }

    #[test]
    fn test_set_and_toggle() {
        let mut ctx = AgentContext::default();
        ctx.set_agent(Agent::Hacker);
        assert_eq!(ctx.agent(), Agent::Hacker);
        assert_eq!(ctx.toggle(), Agent::Professor);
        assert_eq!(ctx.toggle(), Agent::Hacker);
    }

    #[test]
    fn test_parse() {
        assert_eq!("Hacker".parse::<Agent>(), Ok(Agent::Hacker));
        assert_eq!(" professor ".parse::<Agent>(), Ok(Agent::Professor));
        assert!("wizard".parse::<Agent>().is_err());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Agent::Professor.to_string(), "Professor Cedrik");
        assert_eq!(Agent::Hacker.to_string(), "H4ck3r Man Pancho");
    }
}
