//! # Call-center state engine
//!
//! Keeps the live picture of a call center (agents, callers and the bridges
//! between them) from the notifications produced by
//! [`ccpanel_ami_core::DomainEventMapper`], and pushes every change to
//! dashboard viewers through a [`Broadcaster`].
//!
//! ```rust
//! use std::sync::Arc;
//! use ccpanel_ami_core::CallCenterEvent;
//! use ccpanel_call_engine::{AgentStatus, CallCenter, ChannelBroadcaster};
//!
//! let broadcaster = ChannelBroadcaster::new(16);
//! let mut viewer = broadcaster.subscribe();
//! let mut center = CallCenter::new(Arc::new(broadcaster));
//!
//! center.apply(CallCenterEvent::AgentAvail { agent_id: "100".into() });
//!
//! assert_eq!(center.agent("100").unwrap().status, AgentStatus::Avail);
//! assert_eq!(viewer.try_recv().unwrap(), "AGENT:100:AVAIL");
//! ```

pub mod agent;
pub mod broadcaster;
pub mod caller;
pub mod control;
pub mod engine;
pub mod error;

pub use agent::{Agent, AgentStatus, ToggleForce};
pub use broadcaster::{Broadcaster, ChannelBroadcaster};
pub use caller::{Bridge, Caller, CallerStatus};
pub use control::AgentControl;
pub use engine::{CallCenter, CallCenterStats};
pub use error::{CallCenterError, Result};
