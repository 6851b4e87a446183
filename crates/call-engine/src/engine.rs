//! # Call-Center State Engine
//!
//! Owns the agent, caller and bridge tables and applies the notifications
//! produced by the manager client. Every change is pushed to the dashboard as
//! one of these lines:
//!
//! ```text
//! AGENT:<agent>
//! CALLER:<caller>
//! CALLERHANGUP:<caller>
//! CALLERJOIN:<caller>|<queue>
//! CONNECT:<agent>:<caller>
//! ```
//!
//! where `<agent>` renders as `id:STATUS` and `<caller>` as
//! `callerid:STATUS:uid`.
//!
//! ## Lifecycle
//!
//! ```text
//!  caller.new ──> NEW ──caller.queued──> QUEUED ──queue.connect──> INCALL
//!                  │                       │                         │
//!                  └───────────────────────┴──────caller.hangup──────┴──> (removed)
//! ```
//!
//! Agents are created on first reference and kept for the life of the
//! process. A bridge exists exactly while its caller is `INCALL`; when the
//! caller hangs up the bridged agent goes back to `AVAIL`.
//!
//! The engine is not thread-safe by itself. It is meant to be owned by the
//! single task that also owns the manager client, so notifications are
//! applied in the order the switch sent them.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{debug, info};

use ccpanel_ami_core::CallCenterEvent;

use crate::agent::{Agent, AgentStatus, ToggleForce};
use crate::broadcaster::Broadcaster;
use crate::caller::{Bridge, Caller, CallerStatus};
use crate::control::AgentControl;
use crate::error::Result;

/// Counts shown in the dashboard header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CallCenterStats {
    pub agents: usize,
    pub available_agents: usize,
    pub callers: usize,
    pub queued_callers: usize,
    pub bridges: usize,
}

/// Agent, caller and bridge state for the dashboard
pub struct CallCenter {
    broadcaster: Arc<dyn Broadcaster>,
    agents: BTreeMap<String, Agent>,
    /// Live callers keyed by uid
    callers: HashMap<String, Caller>,
    /// Bridges keyed by caller uid
    bridges: HashMap<String, Bridge>,
}

impl CallCenter {
    pub fn new(broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self {
            broadcaster,
            agents: BTreeMap::new(),
            callers: HashMap::new(),
            bridges: HashMap::new(),
        }
    }

    /// Apply one notification from the manager client
    pub fn apply(&mut self, event: CallCenterEvent) {
        debug!("Applying {}", event);
        match event {
            CallCenterEvent::CallerNew { caller_id, uid } => self.caller_new(&caller_id, &uid),
            CallCenterEvent::CallerHangup { caller_id, uid } => self.caller_hangup(&caller_id, &uid),
            CallCenterEvent::CallerQueued { caller_id, uid, queue } => {
                self.caller_queued(&caller_id, &uid, &queue)
            }
            CallCenterEvent::AgentLoggedIn { agent_id } => self.agent_logged_in(&agent_id),
            CallCenterEvent::AgentLoggedOut { agent_id } => self.agent_logged_out(&agent_id),
            CallCenterEvent::AgentPaused { agent_id } => self.agent_paused(&agent_id),
            CallCenterEvent::AgentAvail { agent_id } => self.agent_avail(&agent_id),
            CallCenterEvent::QueueConnect { agent_id, caller_id, uid } => {
                self.queue_connect(&agent_id, &caller_id, &uid)
            }
        }
    }

    /// A caller entered the IVR
    pub fn caller_new(&mut self, caller_id: &str, uid: &str) {
        let caller = self.get_or_create_caller(caller_id, uid).clone();
        self.broadcaster.send_to_all(&format!("CALLER:{}", caller));
        info!("Caller {} is in the IVR", caller);
    }

    /// A caller hung up. Frees the bridged agent, if any.
    pub fn caller_hangup(&mut self, caller_id: &str, uid: &str) {
        let mut caller = self.get_or_create_caller(caller_id, uid).clone();
        caller.status = CallerStatus::Hangup;
        self.callers.remove(uid);

        if let Some(bridge) = self.bridges.remove(uid) {
            self.set_agent_status(&bridge.agent_id, AgentStatus::Avail);
        }

        self.broadcaster.send_to_all(&format!("CALLERHANGUP:{}", caller));
        info!("Caller {} hung up", caller);
    }

    /// A caller joined a queue
    pub fn caller_queued(&mut self, caller_id: &str, uid: &str, queue: &str) {
        let caller = self.get_or_create_caller(caller_id, uid);
        caller.queue = Some(queue.to_string());
        // A bridged caller stays INCALL
        if matches!(caller.status, CallerStatus::New | CallerStatus::Queued) {
            caller.status = CallerStatus::Queued;
        }
        let caller = caller.clone();

        self.broadcaster.send_to_all(&format!("CALLERJOIN:{}|{}", caller, queue));
        info!("Caller {} was queued in queue {}", caller, queue);
    }

    pub fn agent_logged_in(&mut self, agent_id: &str) {
        self.set_agent_status(agent_id, AgentStatus::LoggedIn);
    }

    pub fn agent_logged_out(&mut self, agent_id: &str) {
        self.set_agent_status(agent_id, AgentStatus::LoggedOut);
    }

    pub fn agent_paused(&mut self, agent_id: &str) {
        self.set_agent_status(agent_id, AgentStatus::Paused);
    }

    pub fn agent_avail(&mut self, agent_id: &str) {
        self.set_agent_status(agent_id, AgentStatus::Avail);
    }

    /// An agent picked up a caller. Both must already be known; a second
    /// connect for the same call is ignored.
    pub fn queue_connect(&mut self, agent_id: &str, caller_id: &str, uid: &str) {
        if !self.agents.contains_key(agent_id) || !self.callers.contains_key(uid) {
            debug!("Ignoring connect of {} to {} ({}): party unknown", agent_id, caller_id, uid);
            return;
        }
        if self.bridges.contains_key(uid) {
            return;
        }

        let agent = self.set_agent_status(agent_id, AgentStatus::InCall);
        let Some(caller) = self.callers.get_mut(uid) else {
            return;
        };
        caller.status = CallerStatus::InCall;
        let caller = caller.clone();

        self.bridges.insert(uid.to_string(), Bridge::new(uid, agent_id));
        self.broadcaster.send_to_all(&format!("CONNECT:{}:{}", agent, caller));
        info!("Caller {} was connected to agent {}", caller, agent);
    }

    /// Operator toggle between AVAIL and PAUSED.
    ///
    /// A paused agent (or `force = AVAIL`) is unpaused at the switch and set
    /// AVAIL; an available agent (or `force = PAUSED`) is paused and set
    /// PAUSED. Any other status is left alone, as are unknown agents.
    /// Returns the new status when something changed.
    pub fn toggle_avail(
        &mut self,
        control: &mut dyn AgentControl,
        agent_id: &str,
        force: Option<ToggleForce>,
    ) -> Result<Option<AgentStatus>> {
        let Some(current) = self.agents.get(agent_id).map(|agent| agent.status) else {
            debug!("Toggle for unknown agent {}", agent_id);
            return Ok(None);
        };

        if current == AgentStatus::Paused || force == Some(ToggleForce::Avail) {
            control.unpause_agent(agent_id)?;
            self.set_agent_status(agent_id, AgentStatus::Avail);
            Ok(Some(AgentStatus::Avail))
        } else if current == AgentStatus::Avail || force == Some(ToggleForce::Paused) {
            control.pause_agent(agent_id)?;
            self.set_agent_status(agent_id, AgentStatus::Paused);
            Ok(Some(AgentStatus::Paused))
        } else {
            Ok(None)
        }
    }

    /// Operator command making an agent available, creating it if needed
    pub fn set_agent_avail(&mut self, control: &mut dyn AgentControl, agent_id: &str) -> Result<()> {
        self.get_or_create_agent(agent_id);
        control.unpause_agent(agent_id)?;
        self.set_agent_status(agent_id, AgentStatus::Avail);
        Ok(())
    }

    /// Lines sent to a viewer when it connects
    pub fn hello(&self) -> Vec<String> {
        self.agents.values().map(|agent| format!("AGENT:{}", agent)).collect()
    }

    pub fn agent(&self, agent_id: &str) -> Option<&Agent> {
        self.agents.get(agent_id)
    }

    /// All agents ordered by id
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn caller(&self, uid: &str) -> Option<&Caller> {
        self.callers.get(uid)
    }

    pub fn callers(&self) -> impl Iterator<Item = &Caller> {
        self.callers.values()
    }

    pub fn bridge(&self, uid: &str) -> Option<&Bridge> {
        self.bridges.get(uid)
    }

    pub fn stats(&self) -> CallCenterStats {
        CallCenterStats {
            agents: self.agents.len(),
            available_agents: self
                .agents
                .values()
                .filter(|agent| agent.status == AgentStatus::Avail)
                .count(),
            callers: self.callers.len(),
            queued_callers: self
                .callers
                .values()
                .filter(|caller| caller.status == CallerStatus::Queued)
                .count(),
            bridges: self.bridges.len(),
        }
    }

    fn get_or_create_agent(&mut self, agent_id: &str) -> &mut Agent {
        self.agents
            .entry(agent_id.to_string())
            .or_insert_with(|| Agent::new(agent_id))
    }

    fn get_or_create_caller(&mut self, caller_id: &str, uid: &str) -> &mut Caller {
        self.callers
            .entry(uid.to_string())
            .or_insert_with(|| Caller::new(caller_id, uid))
    }

    /// The only place agent status changes. Always broadcasts and logs, even
    /// when the status is unchanged.
    fn set_agent_status(&mut self, agent_id: &str, status: AgentStatus) -> Agent {
        let agent = self.get_or_create_agent(agent_id);
        agent.set_status(status);
        let agent = agent.clone();

        self.broadcaster.send_to_all(&format!("AGENT:{}", agent));
        info!("Agent {}", agent);
        agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccpanel_ami_core::AmiError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Lines(Mutex<Vec<String>>);

    impl Broadcaster for Lines {
        fn send_to_all(&self, line: &str) {
            self.0.lock().unwrap().push(line.to_string());
        }
    }

    impl Lines {
        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    #[derive(Default)]
    struct Control {
        calls: Vec<String>,
        fail: bool,
    }

    impl AgentControl for Control {
        fn pause_agent(&mut self, agent_id: &str) -> std::result::Result<(), AmiError> {
            if self.fail {
                return Err(AmiError::OutboxClosed);
            }
            self.calls.push(format!("pause {}", agent_id));
            Ok(())
        }

        fn unpause_agent(&mut self, agent_id: &str) -> std::result::Result<(), AmiError> {
            if self.fail {
                return Err(AmiError::OutboxClosed);
            }
            self.calls.push(format!("unpause {}", agent_id));
            Ok(())
        }
    }

    fn engine() -> (CallCenter, Arc<Lines>) {
        let lines = Arc::new(Lines::default());
        (CallCenter::new(lines.clone()), lines)
    }

    #[test]
    fn test_caller_queued_sets_queue_and_status() {
        let (mut cc, lines) = engine();
        cc.caller_queued("555", "u1", "support");

        let caller = cc.caller("u1").unwrap();
        assert_eq!(caller.queue.as_deref(), Some("support"));
        assert_eq!(caller.status, CallerStatus::Queued);
        assert_eq!(lines.take(), vec!["CALLERJOIN:555:QUEUED:u1|support"]);
    }

    #[test]
    fn test_connect_requires_known_parties() {
        let (mut cc, lines) = engine();
        cc.queue_connect("100", "555", "u1");
        assert!(cc.bridge("u1").is_none());
        assert!(cc.agent("100").is_none());
        assert!(lines.take().is_empty());

        cc.agent_avail("100");
        cc.queue_connect("100", "555", "u1");
        assert!(cc.bridge("u1").is_none());
    }

    #[test]
    fn test_connect_bridges_once() {
        let (mut cc, lines) = engine();
        cc.agent_avail("100");
        cc.caller_queued("555", "u1", "support");
        lines.take();

        cc.queue_connect("100", "555", "u1");
        assert_eq!(
            lines.take(),
            vec!["AGENT:100:INCALL", "CONNECT:100:INCALL:555:INCALL:u1"]
        );
        assert_eq!(cc.caller("u1").unwrap().status, CallerStatus::InCall);
        assert_eq!(cc.bridge("u1").unwrap().agent_id, "100");

        cc.queue_connect("100", "555", "u1");
        assert!(lines.take().is_empty());
    }

    #[test]
    fn test_queued_after_connect_keeps_incall() {
        let (mut cc, _lines) = engine();
        cc.agent_avail("100");
        cc.caller_new("555", "u1");
        cc.queue_connect("100", "555", "u1");
        cc.caller_queued("555", "u1", "overflow");
        assert_eq!(cc.caller("u1").unwrap().status, CallerStatus::InCall);
        assert!(cc.bridge("u1").is_some());
    }

    #[test]
    fn test_hangup_of_unknown_caller_still_broadcasts() {
        let (mut cc, lines) = engine();
        cc.caller_hangup("555", "u9");
        assert!(cc.caller("u9").is_none());
        assert_eq!(lines.take(), vec!["CALLERHANGUP:555:HANGUP:u9"]);
    }

    #[test]
    fn test_toggle_paused_agent_unpauses_first() {
        let (mut cc, lines) = engine();
        let mut control = Control::default();
        cc.agent_paused("100");
        lines.take();

        let result = cc.toggle_avail(&mut control, "100", None).unwrap();
        assert_eq!(result, Some(AgentStatus::Avail));
        assert_eq!(control.calls, vec!["unpause 100"]);
        assert_eq!(lines.take(), vec!["AGENT:100:AVAIL"]);

        let result = cc.toggle_avail(&mut control, "100", None).unwrap();
        assert_eq!(result, Some(AgentStatus::Paused));
        assert_eq!(control.calls, vec!["unpause 100", "pause 100"]);
    }

    #[test]
    fn test_toggle_force_overrides_other_statuses() {
        let (mut cc, _lines) = engine();
        let mut control = Control::default();
        cc.agent_logged_in("100");

        assert_eq!(cc.toggle_avail(&mut control, "100", None).unwrap(), None);
        assert!(control.calls.is_empty());

        assert_eq!(
            cc.toggle_avail(&mut control, "100", Some(ToggleForce::Paused)).unwrap(),
            Some(AgentStatus::Paused)
        );
        assert_eq!(
            cc.toggle_avail(&mut control, "100", Some(ToggleForce::Avail)).unwrap(),
            Some(AgentStatus::Avail)
        );
        assert_eq!(control.calls, vec!["pause 100", "unpause 100"]);
    }

    #[test]
    fn test_toggle_unknown_agent_is_noop() {
        let (mut cc, lines) = engine();
        let mut control = Control::default();
        assert_eq!(cc.toggle_avail(&mut control, "404", Some(ToggleForce::Avail)).unwrap(), None);
        assert!(control.calls.is_empty());
        assert!(lines.take().is_empty());
        assert!(cc.agent("404").is_none());
    }

    #[test]
    fn test_failed_control_leaves_status_unchanged() {
        let (mut cc, lines) = engine();
        let mut control = Control { fail: true, ..Default::default() };
        cc.agent_avail("100");
        lines.take();

        assert!(cc.toggle_avail(&mut control, "100", None).is_err());
        assert_eq!(cc.agent("100").unwrap().status, AgentStatus::Avail);
        assert!(lines.take().is_empty());
    }

    #[test]
    fn test_set_agent_avail_creates_agent() {
        let (mut cc, lines) = engine();
        let mut control = Control::default();
        cc.set_agent_avail(&mut control, "300").unwrap();
        assert_eq!(cc.agent("300").unwrap().status, AgentStatus::Avail);
        assert_eq!(control.calls, vec!["unpause 300"]);
        assert_eq!(lines.take(), vec!["AGENT:300:AVAIL"]);
    }

    #[test]
    fn test_hello_lists_agents_without_broadcasting() {
        let (mut cc, lines) = engine();
        cc.agent_avail("200");
        cc.agent_paused("100");
        lines.take();

        assert_eq!(cc.hello(), vec!["AGENT:100:PAUSED", "AGENT:200:AVAIL"]);
        assert!(lines.take().is_empty());
    }

    #[test]
    fn test_stats() {
        let (mut cc, _lines) = engine();
        cc.agent_avail("100");
        cc.agent_paused("200");
        cc.caller_new("555", "u1");
        cc.caller_queued("556", "u2", "support");
        cc.queue_connect("100", "555", "u1");

        assert_eq!(
            cc.stats(),
            CallCenterStats {
                agents: 2,
                available_agents: 0,
                callers: 2,
                queued_callers: 1,
                bridges: 1,
            }
        );
    }
}
