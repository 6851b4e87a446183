//! The task that owns the manager client and the call-center state
//!
//! Everything that touches [`AmiClient`] or [`CallCenter`] happens on this
//! task: socket reads are fed to the client, the notifications they produce
//! are applied to the engine before the next read, and dashboard requests
//! arrive as [`DashboardCommand`]s over a channel. Nothing here is shared
//! behind a lock.
//!
//! Responses are drained after every read. A rejected login ends the run;
//! any other failed action is logged.

use std::future::Future;
use std::sync::Arc;

use anyhow::{bail, Context};
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use ccpanel_ami_core::{AmiClient, AmiError, CallCenterEvent, DomainEventMapper, FeedSummary, Response};
use ccpanel_call_engine::{
    Agent, AgentStatus, Broadcaster, CallCenter, CallCenterError, CallCenterStats, ToggleForce,
};
use ccpanel_infra_common::ManagerConfig;

const READ_BUFFER_SIZE: usize = 8192;

/// Request from the dashboard to the runner, answered on `reply`
#[derive(Debug)]
pub enum DashboardCommand {
    /// Snapshot lines for a newly connected viewer
    Hello { reply: oneshot::Sender<Vec<String>> },
    /// All agents ordered by id
    Agents { reply: oneshot::Sender<Vec<Agent>> },
    Stats { reply: oneshot::Sender<CallCenterStats> },
    Toggle {
        agent_id: String,
        force: Option<ToggleForce>,
        reply: oneshot::Sender<Result<Option<AgentStatus>, CallCenterError>>,
    },
    SetAvail {
        agent_id: String,
        reply: oneshot::Sender<Result<(), CallCenterError>>,
    },
}

/// Where the session's login stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    NotSent,
    /// Waiting for the reply to this action id
    Pending(String),
    Accepted,
    /// Rejected with the switch's message
    Rejected(String),
}

/// Owner of the manager client and the call-center state
pub struct Runner {
    client: AmiClient,
    notifications: mpsc::UnboundedReceiver<CallCenterEvent>,
    center: CallCenter,
    login: LoginState,
}

impl Runner {
    /// Create a runner and the receiver of blocks to write to the switch
    pub fn new(broadcaster: Arc<dyn Broadcaster>) -> (Self, mpsc::UnboundedReceiver<Bytes>) {
        let (mut client, outbound) = AmiClient::new();
        let (mapper, notifications) = DomainEventMapper::new();
        client.register_listener(Arc::new(mapper), Some(DomainEventMapper::predicate()));

        let runner = Self {
            client,
            notifications,
            center: CallCenter::new(broadcaster),
            login: LoginState::NotSent,
        };
        (runner, outbound)
    }

    /// Queue the login action for the configured account
    pub fn login(&mut self, manager: &ManagerConfig) -> Result<String, AmiError> {
        let action_id = self
            .client
            .login(&manager.username, &manager.password, manager.event_mask.clone())?;
        self.login = LoginState::Pending(action_id.clone());
        Ok(action_id)
    }

    /// Feed bytes read from the switch, apply the resulting notifications
    /// and settle every complete response
    pub fn handle_bytes(&mut self, bytes: &[u8]) -> FeedSummary {
        let summary = self.client.feed(bytes);
        while let Ok(notification) = self.notifications.try_recv() {
            self.center.apply(notification);
        }
        for response in self.client.drain_complete() {
            self.settle(&response);
        }
        summary
    }

    fn settle(&mut self, response: &Response) {
        let action_id = response.action_id().unwrap_or_default();
        let reason = response.message().unwrap_or(response.status()).to_string();

        if matches!(&self.login, LoginState::Pending(id) if id == action_id) {
            if response.is_success() {
                info!("Logged in to manager");
                self.login = LoginState::Accepted;
            } else {
                error!("Manager rejected login: {}", reason);
                self.login = LoginState::Rejected(reason);
            }
        } else if !response.is_success() {
            warn!("Action {} failed: {}", action_id, reason);
        }
    }

    pub fn login_state(&self) -> &LoginState {
        &self.login
    }

    pub fn handle_command(&mut self, command: DashboardCommand) {
        // A dropped reply means the HTTP request went away
        match command {
            DashboardCommand::Hello { reply } => {
                let _ = reply.send(self.center.hello());
            }
            DashboardCommand::Agents { reply } => {
                let _ = reply.send(self.center.agents().cloned().collect());
            }
            DashboardCommand::Stats { reply } => {
                let _ = reply.send(self.center.stats());
            }
            DashboardCommand::Toggle { agent_id, force, reply } => {
                let result = self.center.toggle_avail(&mut self.client, &agent_id, force);
                if let Err(e) = &result {
                    warn!("Toggle of agent {} failed: {}", agent_id, e);
                }
                let _ = reply.send(result);
            }
            DashboardCommand::SetAvail { agent_id, reply } => {
                let result = self.center.set_agent_avail(&mut self.client, &agent_id);
                if let Err(e) = &result {
                    warn!("Making agent {} available failed: {}", agent_id, e);
                }
                let _ = reply.send(result);
            }
        }
    }

    pub fn center(&self) -> &CallCenter {
        &self.center
    }

    pub fn client(&self) -> &AmiClient {
        &self.client
    }

    /// Drive the connection until `shutdown` resolves, the switch
    /// disconnects, the login is rejected or the write side fails.
    ///
    /// On shutdown a `Logoff` is written before returning `Ok`. Every other
    /// exit is an error; reconnecting is up to the caller.
    pub async fn run<S>(
        mut self,
        stream: S,
        outbound: mpsc::UnboundedReceiver<Bytes>,
        mut commands: mpsc::Receiver<DashboardCommand>,
        shutdown: impl Future<Output = ()>,
    ) -> anyhow::Result<()>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (mut reader, writer) = tokio::io::split(stream);
        let mut writer_task = tokio::spawn(write_blocks(writer, outbound));
        let mut buf = vec![0u8; READ_BUFFER_SIZE];
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                read = reader.read(&mut buf) => {
                    let n = read.context("Failed to read from manager connection")?;
                    if n == 0 {
                        bail!("Manager closed the connection");
                    }
                    let summary = self.handle_bytes(&buf[..n]);
                    debug!("Read {} bytes: {:?}", n, summary);
                    if let LoginState::Rejected(reason) = &self.login {
                        bail!("Manager rejected login: {}", reason);
                    }
                }
                Some(command) = commands.recv() => self.handle_command(command),
                written = &mut writer_task => {
                    written.context("Writer task panicked")??;
                    bail!("Outbound channel closed");
                }
                _ = &mut shutdown => break,
            }
        }

        info!("Logging off");
        self.client.logoff()?;
        // Closing the outbound channel lets the writer flush the logoff and stop
        drop(self);
        writer_task.await.context("Writer task panicked")??;
        Ok(())
    }
}

/// Write every outbound block to the switch, in order
async fn write_blocks<W>(mut writer: W, mut outbound: mpsc::UnboundedReceiver<Bytes>) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(block) = outbound.recv().await {
        writer
            .write_all(&block)
            .await
            .context("Failed to write action to manager connection")?;
        writer.flush().await?;
    }
    info!("Outbound channel closed, writer stopping");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccpanel_call_engine::ChannelBroadcaster;

    fn runner() -> (Runner, mpsc::UnboundedReceiver<Bytes>) {
        Runner::new(Arc::new(ChannelBroadcaster::new(16)))
    }

    #[test]
    fn test_login_uses_configured_account() {
        let (mut runner, mut outbound) = runner();
        let manager = ManagerConfig {
            username: "panel".to_string(),
            password: "s3cret".to_string(),
            event_mask: Some("on".to_string()),
            ..Default::default()
        };
        runner.login(&manager).unwrap();

        let block = outbound.try_recv().unwrap();
        let text = std::str::from_utf8(&block).unwrap();
        assert!(text.starts_with("Action: Login\r\n"));
        assert!(text.contains("Username: panel\r\n"));
        assert!(text.contains("Secret: s3cret\r\n"));
        assert!(text.contains("Events: on\r\n"));
    }

    #[test]
    fn test_bytes_update_state_before_returning() {
        let (mut runner, _outbound) = runner();
        let summary = runner.handle_bytes(b"Event: QueueMemberPause\r\nCallerIDNum: 100\r\nPaused: 1\r\n\r\n");
        assert_eq!(summary.dispatched, 1);
        assert_eq!(runner.center().agent("100").unwrap().status, AgentStatus::Paused);
    }

    #[test]
    fn test_toggle_command_replies_with_new_status() {
        let (mut runner, mut outbound) = runner();
        runner.handle_bytes(b"Event: QueueMemberPause\r\nCallerIDNum: 100\r\nPaused: 0\r\n\r\n");

        let (reply, mut rx) = oneshot::channel();
        runner.handle_command(DashboardCommand::Toggle {
            agent_id: "100".to_string(),
            force: None,
            reply,
        });

        assert_eq!(rx.try_recv().unwrap(), Ok(Some(AgentStatus::Paused)));
        let block = outbound.try_recv().unwrap();
        assert!(std::str::from_utf8(&block).unwrap().contains("Paused: true\r\n"));
    }

    /// Toggle agent 100 once and answer the resulting action
    fn toggle_and_answer(runner: &mut Runner, outbound: &mut mpsc::UnboundedReceiver<Bytes>, answer: &str) {
        let (reply, _rx) = oneshot::channel();
        runner.handle_command(DashboardCommand::Toggle {
            agent_id: "100".to_string(),
            force: None,
            reply,
        });
        let block = outbound.try_recv().unwrap();
        let text = std::str::from_utf8(&block).unwrap();
        let action_id = text
            .lines()
            .find_map(|line| line.strip_prefix("ActionID: "))
            .unwrap();
        runner.handle_bytes(format!("Response: {}\r\nActionID: {}\r\n\r\n", answer, action_id).as_bytes());
    }

    #[test]
    fn test_answered_actions_are_not_retained() {
        let (mut runner, mut outbound) = runner();
        runner.handle_bytes(b"Event: QueueMemberPause\r\nCallerIDNum: 100\r\nPaused: 0\r\n\r\n");

        for _ in 0..1000 {
            toggle_and_answer(&mut runner, &mut outbound, "Success");
        }

        assert_eq!(runner.client().retained_responses(), 0);
        assert_eq!(runner.client().in_flight_actions(), 0);
        assert_eq!(runner.center().agent("100").unwrap().status, AgentStatus::Avail);
    }

    #[test]
    fn test_failed_action_is_not_retained() {
        let (mut runner, mut outbound) = runner();
        runner.handle_bytes(b"Event: QueueMemberPause\r\nCallerIDNum: 100\r\nPaused: 0\r\n\r\n");
        toggle_and_answer(&mut runner, &mut outbound, "Error");

        assert_eq!(runner.client().retained_responses(), 0);
        assert_eq!(runner.login_state(), &LoginState::NotSent);
    }

    #[test]
    fn test_login_reply_settles_login_state() {
        let (mut runner, _outbound) = runner();
        let action_id = runner.login(&ManagerConfig::default()).unwrap();
        assert_eq!(runner.login_state(), &LoginState::Pending(action_id));

        runner.handle_bytes(b"Response: Success\r\nMessage: Authentication accepted\r\n\r\n");
        assert_eq!(runner.login_state(), &LoginState::Accepted);
        assert_eq!(runner.client().retained_responses(), 0);
    }

    #[test]
    fn test_rejected_login_is_recorded() {
        let (mut runner, _outbound) = runner();
        runner.login(&ManagerConfig::default()).unwrap();

        runner.handle_bytes(b"Response: Error\r\nMessage: Authentication failed\r\n\r\n");
        assert_eq!(
            runner.login_state(),
            &LoginState::Rejected("Authentication failed".to_string())
        );
    }

    #[test]
    fn test_toggle_fails_when_transport_is_gone() {
        let (mut runner, outbound) = runner();
        runner.handle_bytes(b"Event: QueueMemberPause\r\nCallerIDNum: 100\r\nPaused: 0\r\n\r\n");
        drop(outbound);

        let (reply, mut rx) = oneshot::channel();
        runner.handle_command(DashboardCommand::Toggle {
            agent_id: "100".to_string(),
            force: None,
            reply,
        });

        assert_eq!(
            rx.try_recv().unwrap(),
            Err(CallCenterError::Control(AmiError::OutboxClosed))
        );
        assert_eq!(runner.center().agent("100").unwrap().status, AgentStatus::Avail);
    }
}
