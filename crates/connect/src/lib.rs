//! Wallet-connection session management for Potato identities.
//!
//! A Potato can act as the wallet side of a wallet-connection pairing: a
//! dapp proposes a session, the Potato approves it, and signing requests
//! arrive as session requests. This crate provides:
//!
//! - [`WalletPeer`] -- the wallet-connection boundary. Implementations wrap
//!   the pairing/relay/session stack; tests use a scripted fake.
//! - [`PotatoConnect`] -- the session manager: approves proposals, tracks
//!   live sessions, classifies inbound requests, and queues signable ones
//!   for the observer (the UI) to drive through the signing flow.
//!
//! # Event model
//!
//! All state lives in the [`PotatoConnect`] instance and is mutated only by
//! [`PotatoConnect::handle_event`], which the wallet-connection layer calls
//! one event at a time, in arrival order. No ordering is assumed between
//! events on *different* sessions.

mod peer;
mod session;

pub use peer::{
    ApprovedNamespaces, DisconnectReason, PeerError, PeerEvent, PeerMetadata, PeerSession,
    ResponsePayload, SessionDelete, SessionProposal, SessionRequest, WalletPeer,
};
pub use session::{
    ConnectError, PendingRequest, PotatoConnect, RequestMethod, RequestState, Session,
    personal_sign_message,
};
