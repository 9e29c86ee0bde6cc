//! Tool protocol server - exposes the mapping tools to external clients
//! over JSON-RPC.

mod json_rpc;
mod session;
mod stdio;

pub use json_rpc::{
    validate_request, JsonRpcError, JsonRpcId, JsonRpcRequest, JsonRpcResponse, ProtocolError,
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR,
    SERVER_NOT_INITIALIZED, SESSION_CLOSED,
};
pub use session::{ProtocolSession, SessionState, PROTOCOL_VERSION, SERVER_NAME};
pub use stdio::{serve, serve_stdio};
