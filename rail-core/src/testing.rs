//! Recording doubles shared by the unit tests.

use std::sync::{Arc, Mutex};

use crate::channel::{ChannelContext, RailEvents, RailTransport};
use crate::error::RailError;
use crate::pdu::{
    ClientStatusOrder, ExecOrder, ExecResultOrder, HandshakeExOrder, HandshakeOrder, OrderType,
    SysParamOrder,
};
use crate::session::{AbortStatus, SessionClient, SessionContext, SessionSettings};

/// A record handed to one of the transport's send primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Handshake(HandshakeOrder),
    ClientStatus(ClientStatusOrder),
    SysParam(SysParamOrder),
    Exec(ExecOrder),
}

impl Sent {
    pub fn order_type(&self) -> OrderType {
        match self {
            Sent::Handshake(_) => OrderType::Handshake,
            Sent::ClientStatus(_) => OrderType::ClientStatus,
            Sent::SysParam(_) => OrderType::SysParam,
            Sent::Exec(_) => OrderType::Exec,
        }
    }
}

/// Records every send attempt; optionally fails one order type.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Sent>>,
    fail_on: Option<(OrderType, u32)>,
}

impl RecordingTransport {
    pub fn failing(order: OrderType, code: u32) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_on: Some((order, code)),
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn order_types(&self) -> Vec<OrderType> {
        self.sent().iter().map(Sent::order_type).collect()
    }

    fn record(&self, sent: Sent) -> Result<(), RailError> {
        let order = sent.order_type();
        self.sent.lock().unwrap().push(sent);
        match self.fail_on {
            Some((fail, code)) if fail == order => Err(RailError::Transport { order, code }),
            _ => Ok(()),
        }
    }
}

impl RailTransport for RecordingTransport {
    fn client_handshake(&self, order: &HandshakeOrder) -> Result<(), RailError> {
        self.record(Sent::Handshake(*order))
    }

    fn client_information(&self, order: &ClientStatusOrder) -> Result<(), RailError> {
        self.record(Sent::ClientStatus(*order))
    }

    fn client_system_param(&self, order: &SysParamOrder) -> Result<(), RailError> {
        self.record(Sent::SysParam(order.clone()))
    }

    fn client_execute(&self, order: &ExecOrder) -> Result<(), RailError> {
        self.record(Sent::Exec(order.clone()))
    }
}

/// Records which callback fired.
#[derive(Default)]
pub struct RecordingEvents {
    calls: Mutex<Vec<&'static str>>,
}

impl RecordingEvents {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

impl RailEvents for RecordingEvents {
    fn server_handshake(&self, _: &ChannelContext, _: &HandshakeOrder) -> Result<(), RailError> {
        self.calls.lock().unwrap().push("handshake");
        Ok(())
    }

    fn server_handshake_ex(
        &self,
        _: &ChannelContext,
        _: &HandshakeExOrder,
    ) -> Result<(), RailError> {
        self.calls.lock().unwrap().push("handshake_ex");
        Ok(())
    }

    fn server_execute_result(
        &self,
        _: &ChannelContext,
        _: &ExecResultOrder,
    ) -> Result<(), RailError> {
        self.calls.lock().unwrap().push("execute_result");
        Ok(())
    }
}

/// Records abort calls.
#[derive(Default)]
pub struct RecordingClient {
    aborts: Mutex<Vec<(AbortStatus, String)>>,
}

impl RecordingClient {
    pub fn aborts(&self) -> Vec<(AbortStatus, String)> {
        self.aborts.lock().unwrap().clone()
    }
}

impl SessionClient for RecordingClient {
    fn abort(&self, status: AbortStatus, message: &str) {
        self.aborts.lock().unwrap().push((status, message.to_string()));
    }
}

pub fn session_with(settings: SessionSettings) -> (Arc<SessionContext>, Arc<RecordingClient>) {
    let client = Arc::new(RecordingClient::default());
    let session = Arc::new(SessionContext::new(client.clone(), settings));
    (session, client)
}
