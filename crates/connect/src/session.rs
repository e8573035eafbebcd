//! The session manager: proposal approval, request queues, responses.

use std::collections::HashMap;
use std::fmt;

use alloy_primitives::Address;
use config::Identity;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::peer::{
    ApprovedNamespaces, DisconnectReason, PeerError, PeerEvent, PeerMetadata, ResponsePayload,
    SessionDelete, SessionProposal, SessionRequest, WalletPeer,
};

/// Methods a Potato wallet accepts for signing.
pub const SUPPORTED_METHODS: [&str; 2] = ["personal_sign", "eth_sendTransaction"];

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from session-manager operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// An outbound peer call failed.
    Peer(PeerError),
    /// No live session with the given topic.
    SessionNotFound,
    /// No request with the given id on that session.
    RequestNotFound,
    /// The request has already been responded to.
    AlreadyResponded,
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Peer(e) => write!(f, "{e}"),
            Self::SessionNotFound => write!(f, "session not found"),
            Self::RequestNotFound => write!(f, "request not found"),
            Self::AlreadyResponded => write!(f, "request already responded to"),
        }
    }
}

impl std::error::Error for ConnectError {}

impl From<PeerError> for ConnectError {
    fn from(e: PeerError) -> Self {
        Self::Peer(e)
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// A signable method call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    /// `personal_sign`
    PersonalSign,
    /// `eth_sendTransaction`
    SendTransaction,
}

impl RequestMethod {
    /// The JSON-RPC method name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PersonalSign => "personal_sign",
            Self::SendTransaction => "eth_sendTransaction",
        }
    }
}

/// How an inbound method is handled.
enum MethodKind {
    /// Queued for the observer to authorize and sign.
    Signable(RequestMethod),
    /// Acknowledged with a null result, never queued.
    Acknowledge,
    /// Logged and ignored.
    Unknown,
}

fn classify(method: &str) -> MethodKind {
    match method {
        "personal_sign" => MethodKind::Signable(RequestMethod::PersonalSign),
        "eth_sendTransaction" => MethodKind::Signable(RequestMethod::SendTransaction),
        // Chain selection is per-request, so a switch is always satisfied.
        "wallet_switchEthereumChain" => MethodKind::Acknowledge,
        _ => MethodKind::Unknown,
    }
}

/// Response lifecycle of a queued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// Waiting for the observer to respond.
    Pending,
    /// A response has been delivered to the peer.
    Responded,
}

/// One queued signable request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    /// JSON-RPC request id.
    pub request_id: u64,
    pub method: RequestMethod,
    pub params: Value,
    /// Chain the request targets, when the peer scoped it (`eip155:…`).
    pub chain_id: Option<u64>,
    /// UNIX expiry timestamp, if the peer set one.
    pub expiry: Option<u64>,
    state: RequestState,
}

impl PendingRequest {
    /// Whether this request still awaits a response.
    pub fn state(&self) -> RequestState {
        self.state
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A live wallet-connection session and its request queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub topic: String,
    pub peer: PeerMetadata,
    requests: Vec<PendingRequest>,
}

impl Session {
    fn new(topic: String, peer: PeerMetadata) -> Self {
        Self {
            topic,
            peer,
            requests: Vec::new(),
        }
    }

    /// The append-only request queue, in arrival order.
    pub fn requests(&self) -> &[PendingRequest] {
        &self.requests
    }
}

// ---------------------------------------------------------------------------
// PotatoConnect
// ---------------------------------------------------------------------------

/// Wallet-connection peer acting as the wallet of a Potato.
///
/// Owns every live [`Session`] keyed by topic. The observer (the UI) watches
/// session request queues, drives the authorization and signing flow per
/// request, and delivers the result through [`respond_request`]
/// (at most once per request).
///
/// [`respond_request`]: Self::respond_request
pub struct PotatoConnect<P> {
    peer: P,
    identity: Identity,
    /// The Potato's derived Ethereum address, announced in approved
    /// namespaces.
    address: Address,
    sessions: HashMap<String, Session>,
}

impl<P: WalletPeer> PotatoConnect<P> {
    /// Creates a manager for `identity`, adopting any sessions the peer
    /// already holds (e.g. restored after a restart).
    pub fn new(peer: P, identity: Identity, address: Address) -> Self {
        let sessions = peer
            .active_sessions()
            .into_iter()
            .map(|s| (s.topic.clone(), Session::new(s.topic, s.peer)))
            .collect();
        Self {
            peer,
            identity,
            address,
            sessions,
        }
    }

    /// The identity this manager signs for.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The announced wallet address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Live sessions, in no particular order.
    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    /// Looks up a live session by topic.
    pub fn session(&self, topic: &str) -> Option<&Session> {
        self.sessions.get(topic)
    }

    /// Handles one inbound wallet-connection event.
    ///
    /// Events must be delivered one at a time, in arrival order per session.
    pub async fn handle_event(&mut self, event: PeerEvent) -> Result<(), ConnectError> {
        match event {
            PeerEvent::Proposal(proposal) => self.on_proposal(proposal).await,
            PeerEvent::Delete(delete) => {
                self.on_delete(delete);
                Ok(())
            }
            PeerEvent::Request(request) => self.on_request(request).await,
        }
    }

    /// Approves a session proposal with the supported subset of what the
    /// dapp asked for.
    async fn on_proposal(&mut self, proposal: SessionProposal) -> Result<(), ConnectError> {
        let chains: Vec<String> = proposal
            .chains
            .iter()
            .filter(|chain| chain.starts_with("eip155:"))
            .cloned()
            .collect();
        let methods: Vec<String> = proposal
            .methods
            .iter()
            .filter(|method| SUPPORTED_METHODS.contains(&method.as_str()))
            .cloned()
            .collect();
        let accounts: Vec<String> = chains
            .iter()
            .map(|chain| format!("{chain}:{}", self.address))
            .collect();

        let namespaces = ApprovedNamespaces {
            chains,
            methods,
            events: Vec::new(),
            accounts,
        };

        let session = self.peer.approve_session(proposal.id, namespaces).await?;
        info!(
            topic = %session.topic,
            dapp = %session.peer.name,
            token_id = %self.identity.token_id(),
            "session approved"
        );
        self.sessions
            .insert(session.topic.clone(), Session::new(session.topic, session.peer));
        Ok(())
    }

    /// Drops a session the peer ended. Idempotent.
    fn on_delete(&mut self, delete: SessionDelete) {
        if self.sessions.remove(&delete.topic).is_some() {
            info!(topic = %delete.topic, "session deleted by peer");
        }
    }

    /// Classifies an inbound method call and queues or acknowledges it.
    async fn on_request(&mut self, request: SessionRequest) -> Result<(), ConnectError> {
        if !self.sessions.contains_key(&request.topic) {
            warn!(
                topic = %request.topic,
                method = %request.method,
                "request for unknown session"
            );
            return Ok(());
        }

        match classify(&request.method) {
            MethodKind::Signable(method) => {
                debug!(
                    topic = %request.topic,
                    request_id = request.request_id,
                    method = method.as_str(),
                    "queueing signable request"
                );
                let chain_id = request.chain_id.as_deref().and_then(eip155_chain_id);
                let session = self
                    .sessions
                    .get_mut(&request.topic)
                    .expect("session presence checked above");
                session.requests.push(PendingRequest {
                    request_id: request.request_id,
                    method,
                    params: request.params,
                    chain_id,
                    expiry: request.expiry,
                    state: RequestState::Pending,
                });
            }
            MethodKind::Acknowledge => {
                debug!(
                    topic = %request.topic,
                    method = %request.method,
                    "acknowledging request"
                );
                self.peer
                    .respond_session_request(
                        &request.topic,
                        request.request_id,
                        ResponsePayload::Result(Value::Null),
                    )
                    .await?;
            }
            MethodKind::Unknown => {
                warn!(
                    topic = %request.topic,
                    method = %request.method,
                    "unsupported wallet-connection request"
                );
            }
        }
        Ok(())
    }

    /// Delivers the final response for a queued request to the peer.
    ///
    /// A request may be responded to at most once; the request stays in the
    /// queue with state [`RequestState::Responded`] for observability. If
    /// the peer call fails the request stays pending and may be retried.
    pub async fn respond_request(
        &mut self,
        topic: &str,
        request_id: u64,
        response: ResponsePayload,
    ) -> Result<(), ConnectError> {
        let session = self
            .sessions
            .get_mut(topic)
            .ok_or(ConnectError::SessionNotFound)?;
        let request = session
            .requests
            .iter_mut()
            .find(|r| r.request_id == request_id)
            .ok_or(ConnectError::RequestNotFound)?;
        if request.state == RequestState::Responded {
            return Err(ConnectError::AlreadyResponded);
        }

        self.peer
            .respond_session_request(topic, request_id, response)
            .await?;
        request.state = RequestState::Responded;
        Ok(())
    }

    /// Disconnects a session from the wallet side and drops its state.
    pub async fn disconnect(&mut self, topic: &str) -> Result<(), ConnectError> {
        if self.sessions.remove(topic).is_none() {
            return Err(ConnectError::SessionNotFound);
        }
        self.peer
            .disconnect_session(topic, DisconnectReason::user_disconnected())
            .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Decodes the UTF-8 message of a `personal_sign` request.
///
/// The first parameter is the hex-encoded message. Returns `None` for
/// malformed params or non-UTF-8 payloads; the raw hex stays available to
/// the observer either way.
pub fn personal_sign_message(params: &Value) -> Option<String> {
    let hex = params.get(0)?.as_str()?;
    let bytes = alloy_primitives::hex::decode(hex).ok()?;
    String::from_utf8(bytes).ok()
}

/// Parses the chain id out of a CAIP-2 `eip155:<id>` identifier.
fn eip155_chain_id(caip2: &str) -> Option<u64> {
    caip2.strip_prefix("eip155:")?.parse().ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peer::PeerSession;
    use alloy_primitives::address;
    use std::sync::Mutex;

    const ADDRESS: Address = address!("76511DE1e763213f9fBc4d735d3364CB8609DBD2");

    /// Records peer calls and approves everything.
    #[derive(Default)]
    struct FakePeer {
        restored: Vec<PeerSession>,
        approvals: Mutex<Vec<(u64, ApprovedNamespaces)>>,
        responses: Mutex<Vec<(String, u64, ResponsePayload)>>,
        disconnects: Mutex<Vec<String>>,
    }

    impl WalletPeer for FakePeer {
        async fn approve_session(
            &self,
            proposal_id: u64,
            namespaces: ApprovedNamespaces,
        ) -> Result<PeerSession, PeerError> {
            self.approvals
                .lock()
                .unwrap()
                .push((proposal_id, namespaces));
            Ok(PeerSession {
                topic: format!("topic-{proposal_id}"),
                peer: PeerMetadata {
                    name: "dapp".into(),
                    ..Default::default()
                },
            })
        }

        async fn disconnect_session(
            &self,
            topic: &str,
            _reason: DisconnectReason,
        ) -> Result<(), PeerError> {
            self.disconnects.lock().unwrap().push(topic.to_owned());
            Ok(())
        }

        async fn respond_session_request(
            &self,
            topic: &str,
            request_id: u64,
            response: ResponsePayload,
        ) -> Result<(), PeerError> {
            self.responses
                .lock()
                .unwrap()
                .push((topic.to_owned(), request_id, response));
            Ok(())
        }

        fn active_sessions(&self) -> Vec<PeerSession> {
            self.restored.clone()
        }
    }

    fn manager(peer: FakePeer) -> PotatoConnect<FakePeer> {
        PotatoConnect::new(peer, Identity::hot_potato(1), ADDRESS)
    }

    fn proposal() -> PeerEvent {
        PeerEvent::Proposal(SessionProposal {
            id: 1,
            proposer: PeerMetadata::default(),
            chains: vec![
                "eip155:1".into(),
                "eip155:42161".into(),
                "solana:mainnet".into(),
            ],
            methods: vec![
                "personal_sign".into(),
                "eth_sendTransaction".into(),
                "eth_signTypedData_v4".into(),
            ],
            events: vec!["accountsChanged".into()],
        })
    }

    fn request(topic: &str, request_id: u64, method: &str) -> PeerEvent {
        PeerEvent::Request(SessionRequest {
            topic: topic.into(),
            request_id,
            chain_id: Some("eip155:42161".into()),
            method: method.into(),
            params: serde_json::json!(["0x506f7461746f21", ADDRESS.to_string()]),
            expiry: None,
        })
    }

    #[tokio::test]
    async fn proposal_approved_with_intersection() {
        let mut connect = manager(FakePeer::default());
        connect.handle_event(proposal()).await.expect("approved");

        let approvals = connect.peer.approvals.lock().unwrap();
        let (id, namespaces) = &approvals[0];
        assert_eq!(*id, 1);
        // All EVM chains pass; foreign namespaces are dropped.
        assert_eq!(namespaces.chains, vec!["eip155:1", "eip155:42161"]);
        // Only the supported signing methods survive.
        assert_eq!(
            namespaces.methods,
            vec!["personal_sign", "eth_sendTransaction"]
        );
        assert!(namespaces.events.is_empty());
        assert_eq!(
            namespaces.accounts,
            vec![
                format!("eip155:1:{ADDRESS}"),
                format!("eip155:42161:{ADDRESS}"),
            ]
        );

        assert!(connect.session("topic-1").is_some());
    }

    #[tokio::test]
    async fn restored_sessions_are_adopted() {
        let peer = FakePeer {
            restored: vec![PeerSession {
                topic: "old-topic".into(),
                peer: PeerMetadata::default(),
            }],
            ..Default::default()
        };
        let connect = manager(peer);
        assert!(connect.session("old-topic").is_some());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let mut connect = manager(FakePeer::default());
        connect.handle_event(proposal()).await.unwrap();

        let delete = PeerEvent::Delete(SessionDelete {
            topic: "topic-1".into(),
        });
        connect.handle_event(delete.clone()).await.unwrap();
        assert!(connect.session("topic-1").is_none());

        // Dropping an already-absent topic is a no-op.
        connect.handle_event(delete).await.unwrap();
    }

    #[tokio::test]
    async fn signable_requests_are_queued_in_order() {
        let mut connect = manager(FakePeer::default());
        connect.handle_event(proposal()).await.unwrap();

        connect
            .handle_event(request("topic-1", 10, "personal_sign"))
            .await
            .unwrap();
        connect
            .handle_event(request("topic-1", 11, "eth_sendTransaction"))
            .await
            .unwrap();

        let session = connect.session("topic-1").unwrap();
        let requests = session.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].request_id, 10);
        assert_eq!(requests[0].method, RequestMethod::PersonalSign);
        assert_eq!(requests[0].chain_id, Some(42161));
        assert_eq!(requests[0].state(), RequestState::Pending);
        assert_eq!(requests[1].method, RequestMethod::SendTransaction);
        // Nothing was auto-responded.
        assert!(connect.peer.responses.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn chain_switch_is_acknowledged_not_queued() {
        let mut connect = manager(FakePeer::default());
        connect.handle_event(proposal()).await.unwrap();

        connect
            .handle_event(request("topic-1", 20, "wallet_switchEthereumChain"))
            .await
            .unwrap();

        assert!(connect.session("topic-1").unwrap().requests().is_empty());
        let responses = connect.peer.responses.lock().unwrap();
        assert_eq!(
            responses[0],
            (
                "topic-1".into(),
                20,
                ResponsePayload::Result(Value::Null)
            )
        );
    }

    #[tokio::test]
    async fn unknown_method_is_ignored() {
        let mut connect = manager(FakePeer::default());
        connect.handle_event(proposal()).await.unwrap();

        connect
            .handle_event(request("topic-1", 30, "eth_signTypedData_v4"))
            .await
            .unwrap();

        assert!(connect.session("topic-1").unwrap().requests().is_empty());
        assert!(connect.peer.responses.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn request_on_unknown_session_is_ignored() {
        let mut connect = manager(FakePeer::default());
        connect
            .handle_event(request("no-such-topic", 1, "personal_sign"))
            .await
            .unwrap();
        assert!(connect.peer.responses.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn respond_request_is_single_use() {
        let mut connect = manager(FakePeer::default());
        connect.handle_event(proposal()).await.unwrap();
        connect
            .handle_event(request("topic-1", 10, "personal_sign"))
            .await
            .unwrap();

        let payload = ResponsePayload::Result(Value::String("0xsigned".into()));
        connect
            .respond_request("topic-1", 10, payload.clone())
            .await
            .expect("first response delivered");
        assert_eq!(
            connect.session("topic-1").unwrap().requests()[0].state(),
            RequestState::Responded
        );

        assert_eq!(
            connect.respond_request("topic-1", 10, payload).await,
            Err(ConnectError::AlreadyResponded)
        );
        assert_eq!(connect.peer.responses.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn respond_request_unknown_ids() {
        let mut connect = manager(FakePeer::default());
        connect.handle_event(proposal()).await.unwrap();

        let payload = ResponsePayload::Result(Value::Null);
        assert_eq!(
            connect.respond_request("nope", 1, payload.clone()).await,
            Err(ConnectError::SessionNotFound)
        );
        assert_eq!(
            connect.respond_request("topic-1", 99, payload).await,
            Err(ConnectError::RequestNotFound)
        );
    }

    #[tokio::test]
    async fn disconnect_drops_state_and_notifies_peer() {
        let mut connect = manager(FakePeer::default());
        connect.handle_event(proposal()).await.unwrap();

        connect.disconnect("topic-1").await.expect("disconnected");
        assert!(connect.session("topic-1").is_none());
        assert_eq!(
            connect.peer.disconnects.lock().unwrap().as_slice(),
            ["topic-1"]
        );

        assert_eq!(
            connect.disconnect("topic-1").await,
            Err(ConnectError::SessionNotFound)
        );
    }

    #[test]
    fn personal_sign_message_decodes_utf8() {
        let params = serde_json::json!(["0x506f7461746f21", "0xabc"]);
        assert_eq!(personal_sign_message(&params).as_deref(), Some("Potato!"));
    }

    #[test]
    fn personal_sign_message_rejects_garbage() {
        assert_eq!(personal_sign_message(&serde_json::json!([])), None);
        assert_eq!(personal_sign_message(&serde_json::json!(["0xzz"])), None);
        // Valid hex, invalid UTF-8.
        assert_eq!(personal_sign_message(&serde_json::json!(["0xff00"])), None);
    }

    #[test]
    fn eip155_parsing() {
        assert_eq!(eip155_chain_id("eip155:42161"), Some(42161));
        assert_eq!(eip155_chain_id("eip155:"), None);
        assert_eq!(eip155_chain_id("cosmos:hub"), None);
    }
}
