//! # Manager interface client
//!
//! Client side of the Asterisk manager interface (AMI), a line-oriented
//! `Key: Value` protocol where each message ends with an empty line.
//!
//! ## Pipeline
//!
//! ```text
//! transport bytes
//!   -> StreamFramer        (complete blocks only)
//!   -> classify            (Response / Event / headerless continuation)
//!   -> ResponseCorrelator  (attach list events to pending responses)
//!   -> EventBus::dispatch  (listeners in registration order)
//!   -> DomainEventMapper   (caller.* / agent.* / queue.connect notifications)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use ccpanel_ami_core::{AmiClient, CallCenterEvent, DomainEventMapper};
//!
//! let (mut client, _outbound) = AmiClient::new();
//! let (mapper, mut notifications) = DomainEventMapper::new();
//! client.register_listener(Arc::new(mapper), Some(DomainEventMapper::predicate()));
//!
//! client.feed(b"Event: UserEvent\r\nUserEvent: LOGGEDIN\r\nCallerIDNum: 100\r\n\r\n");
//!
//! assert_eq!(
//!     notifications.try_recv().unwrap(),
//!     CallCenterEvent::AgentLoggedIn { agent_id: "100".to_string() }
//! );
//! ```

pub mod action;
pub mod bus;
pub mod client;
pub mod correlator;
pub mod error;
pub mod framer;
pub mod mapper;
pub mod message;
pub mod notification;
pub mod parser;

pub use action::Action;
pub use bus::{EventBus, Listener, ListenerId, Predicate};
pub use client::{AmiClient, FeedSummary};
pub use correlator::{
    CompletionPolicy, Correlation, EventListCompletion, ImmediateCompletion, ResponseCorrelator,
};
pub use error::{AmiError, Result};
pub use framer::{RawBlock, StreamFramer};
pub use mapper::{map_event, DomainEventMapper};
pub use message::{Event, HeaderTable, IncomingMessage, MessageKind, Response};
pub use notification::CallCenterEvent;
pub use parser::{classify, Classified};
