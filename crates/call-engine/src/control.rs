//! Switch-side agent control used by operator commands

use ccpanel_ami_core::{AmiClient, AmiError};

/// Pauses and unpauses agents at the switch
pub trait AgentControl {
    fn pause_agent(&mut self, agent_id: &str) -> Result<(), AmiError>;
    fn unpause_agent(&mut self, agent_id: &str) -> Result<(), AmiError>;
}

impl AgentControl for AmiClient {
    fn pause_agent(&mut self, agent_id: &str) -> Result<(), AmiError> {
        AmiClient::pause_agent(self, agent_id).map(|_| ())
    }

    fn unpause_agent(&mut self, agent_id: &str) -> Result<(), AmiError> {
        AmiClient::unpause_agent(self, agent_id).map(|_| ())
    }
}
