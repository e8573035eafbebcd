//! The wallet-connection peer boundary.
//!
//! [`WalletPeer`] is the seam between the session manager and the
//! wallet-connection stack (pairing, relay transport, session lifecycle
//! primitives). Implementations translate these calls onto their SDK;
//! the session manager stays agnostic of the wire protocol.

use std::fmt;

use serde_json::Value;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from peer calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerError {
    /// The peer call failed (relay unreachable, session expired, etc.).
    Unavailable(String),
}

impl fmt::Display for PeerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(reason) => write!(f, "wallet-connection peer call failed: {reason}"),
        }
    }
}

impl std::error::Error for PeerError {}

// ---------------------------------------------------------------------------
// Session types
// ---------------------------------------------------------------------------

/// Metadata a peer publishes about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerMetadata {
    pub name: String,
    pub description: String,
    pub url: String,
}

/// An established session, as reported by the wallet-connection layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerSession {
    /// Opaque unique session identifier.
    pub topic: String,
    /// The connected dapp's metadata.
    pub peer: PeerMetadata,
}

/// The namespaces a session is approved with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovedNamespaces {
    /// CAIP-2 chain identifiers (`eip155:42161`).
    pub chains: Vec<String>,
    /// JSON-RPC methods the wallet will accept.
    pub methods: Vec<String>,
    /// Events the wallet will emit.
    pub events: Vec<String>,
    /// CAIP-10 accounts (`eip155:42161:0x…`).
    pub accounts: Vec<String>,
}

/// Reason attached to a wallet-side disconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectReason {
    pub code: i64,
    pub message: String,
}

impl DisconnectReason {
    /// The standard user-initiated disconnect reason.
    pub fn user_disconnected() -> Self {
        Self {
            code: 6000,
            message: "User disconnected.".into(),
        }
    }
}

/// A JSON-RPC response delivered back to the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePayload {
    /// Successful result (a signature, a transaction hash, or null).
    Result(Value),
    /// JSON-RPC error object.
    Error { code: i64, message: String },
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A dapp proposes a new session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProposal {
    /// Proposal id, echoed back on approval.
    pub id: u64,
    pub proposer: PeerMetadata,
    /// CAIP-2 chains the dapp wants.
    pub chains: Vec<String>,
    /// Methods the dapp wants.
    pub methods: Vec<String>,
    /// Events the dapp wants.
    pub events: Vec<String>,
}

/// The peer ended a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDelete {
    pub topic: String,
}

/// One inbound method call on an established session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub topic: String,
    /// JSON-RPC request id; responses must echo it.
    pub request_id: u64,
    /// CAIP-2 chain the request targets, if given.
    pub chain_id: Option<String>,
    pub method: String,
    pub params: Value,
    /// UNIX expiry timestamp, if the peer set one.
    pub expiry: Option<u64>,
}

/// Events delivered by the wallet-connection layer, one at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    Proposal(SessionProposal),
    Delete(SessionDelete),
    Request(SessionRequest),
}

// ---------------------------------------------------------------------------
// WalletPeer
// ---------------------------------------------------------------------------

/// Outbound calls onto the wallet-connection stack.
pub trait WalletPeer: Send + Sync {
    /// Approves a session proposal with the given namespaces, returning the
    /// established session.
    fn approve_session(
        &self,
        proposal_id: u64,
        namespaces: ApprovedNamespaces,
    ) -> impl std::future::Future<Output = Result<PeerSession, PeerError>> + Send;

    /// Disconnects a session from the wallet side.
    fn disconnect_session(
        &self,
        topic: &str,
        reason: DisconnectReason,
    ) -> impl std::future::Future<Output = Result<(), PeerError>> + Send;

    /// Delivers a response for a session request to the peer.
    fn respond_session_request(
        &self,
        topic: &str,
        request_id: u64,
        response: ResponsePayload,
    ) -> impl std::future::Future<Output = Result<(), PeerError>> + Send;

    /// Sessions already established with this peer (e.g. restored after a
    /// restart).
    fn active_sessions(&self) -> Vec<PeerSession>;
}
