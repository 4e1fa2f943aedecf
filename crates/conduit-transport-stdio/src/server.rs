//! MCP server loop over stdio transport.
//!
//! Reads JSON-RPC messages line by line, dispatches requests via
//! `McpHandler`, and writes responses back in arrival order. JSON-RPC
//! notifications (which have no `id` field) are handled silently
//! without a response.
//!
//! When a handler suspends for sampling, the loop writes the outbound
//! `sampling/createMessage` request and keeps reading until the
//! matching reply arrives or the request deadline passes. Requests
//! received in the meantime are queued and served afterwards, so at
//! most one request is in flight.

use std::collections::VecDeque;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use conduit_mcp::{JsonRpcOutput, McpHandler, SamplingReply, Step};
use conduit_protocol::{error_codes, JsonRpcErrorResponse, JsonRpcMessage, JsonRpcRequest, RequestId};

use crate::error::TransportError;
use crate::transport::StdioTransport;

/// MCP server that reads from a transport and dispatches to a handler.
pub struct McpServer<R, W> {
    transport: StdioTransport<R, W>,
    handler: McpHandler,
    deferred: VecDeque<JsonRpcRequest>,
}

impl<R, W> McpServer<R, W>
where
    R: tokio::io::AsyncRead + Unpin,
    W: tokio::io::AsyncWrite + Unpin,
{
    /// Creates a new server with the given transport and handler.
    pub fn new(transport: StdioTransport<R, W>, handler: McpHandler) -> Self {
        Self {
            transport,
            handler,
            deferred: VecDeque::new(),
        }
    }

    /// The handler being served.
    pub fn handler(&self) -> &McpHandler {
        &self.handler
    }

    /// Runs the server loop until the transport is closed.
    ///
    /// Malformed lines are answered with a parse or invalid-request
    /// error and skipped.
    /// Read and write failures, and a failed handshake, end the loop
    /// with an error.
    pub async fn run(&mut self) -> Result<(), TransportError> {
        let server = self.handler.server_info().name.clone();
        info!(%server, "MCP server starting on stdio");

        loop {
            let message = match self.deferred.pop_front() {
                Some(request) => JsonRpcMessage::Request(request),
                None => match self.next_message().await? {
                    Some(message) => message,
                    None => {
                        info!("stdin closed, shutting down");
                        return Ok(());
                    }
                },
            };

            match message {
                JsonRpcMessage::Request(request) => self.serve(request).await?,
                JsonRpcMessage::Notification(notif) => {
                    debug!(method = %notif.method, "received notification");
                    self.handler.handle_notification(&notif);
                }
                JsonRpcMessage::Response(resp) => {
                    warn!(id = %resp.id, "ignoring response with no outstanding request");
                }
                JsonRpcMessage::Error(err) => {
                    warn!(id = %err.id, code = err.error.code, "ignoring error with no outstanding request");
                }
            }
        }
    }

    /// Serves one request to completion, including any sampling
    /// round-trips it needs.
    async fn serve(&mut self, request: JsonRpcRequest) -> Result<(), TransportError> {
        debug!(method = %request.method, id = %request.id, "received request");
        let mut step = self.handler.dispatch(&request).await;

        loop {
            match step {
                Step::Respond(output) => return self.write_output(&output).await,
                Step::Abort { output, reason } => {
                    error!(%reason, "handshake failed");
                    self.write_output(&output).await?;
                    return Err(TransportError::Handshake(reason));
                }
                Step::Sample(pending) => {
                    self.transport.write_message(pending.outbound()).await?;
                    let sampling_id = pending.sampling_id().clone();
                    let waited = match self.handler.request_timeout() {
                        Some(after) => {
                            tokio::time::timeout(after, self.await_reply(&sampling_id))
                                .await
                                .map_err(|_| after)
                        }
                        None => Ok(self.await_reply(&sampling_id).await),
                    };
                    match waited {
                        Ok(reply) => match reply? {
                            Some(reply) => step = self.handler.resume(pending, reply).await,
                            None => {
                                warn!(id = %request.id, "stdin closed while waiting for sampling reply");
                                return Ok(());
                            }
                        },
                        Err(after) => {
                            warn!(id = %request.id, %sampling_id, ?after, "no sampling reply before deadline");
                            step = self.handler.expire(pending, after);
                        }
                    }
                }
            }
        }
    }

    /// Reads until the reply to `sampling_id` arrives. Requests that
    /// arrive first are deferred; `None` means EOF.
    async fn await_reply(
        &mut self,
        sampling_id: &RequestId,
    ) -> Result<Option<SamplingReply>, TransportError> {
        loop {
            let Some(message) = self.next_message().await? else {
                return Ok(None);
            };
            match message {
                JsonRpcMessage::Response(resp) if &resp.id == sampling_id => {
                    return Ok(Some(Ok(resp.result)))
                }
                JsonRpcMessage::Error(err) if &err.id == sampling_id => {
                    return Ok(Some(Err(err.error)))
                }
                JsonRpcMessage::Response(resp) => {
                    warn!(id = %resp.id, expected = %sampling_id, "ignoring unexpected response");
                }
                JsonRpcMessage::Error(err) => {
                    warn!(id = %err.id, expected = %sampling_id, "ignoring unexpected error");
                }
                JsonRpcMessage::Request(request) => {
                    debug!(id = %request.id, "deferring request until sampling completes");
                    self.deferred.push_back(request);
                }
                JsonRpcMessage::Notification(notif) => self.handler.handle_notification(&notif),
            }
        }
    }

    /// Next parseable message, answering garbage lines with errors.
    async fn next_message(&mut self) -> Result<Option<JsonRpcMessage>, TransportError> {
        loop {
            let line = match self.transport.read_line().await? {
                Some(line) if line.is_empty() => continue,
                Some(line) => line,
                None => return Ok(None),
            };

            match JsonRpcMessage::parse(&line) {
                Ok(message) => return Ok(Some(message)),
                Err(e) => {
                    warn!(error = %e, "failed to parse JSON-RPC message");
                    let err = reject(&line, &e);
                    self.write_output(&JsonRpcOutput::Error(err)).await?;
                }
            }
        }
    }

    /// Serializes and writes a JSON-RPC output to the transport.
    async fn write_output(&mut self, output: &JsonRpcOutput) -> Result<(), TransportError> {
        match output.to_json() {
            Ok(json) => self.transport.write_line(&json).await,
            Err(e) => {
                error!(error = %e, "failed to serialize response");
                Err(TransportError::Serialize(e.to_string()))
            }
        }
    }
}

/// Reply for a line that is not a JSON-RPC message. Well-formed JSON
/// is an invalid request and keeps its `id` when one can be read.
fn reject(line: &str, e: &serde_json::Error) -> JsonRpcErrorResponse {
    match serde_json::from_str::<Value>(line) {
        Ok(value) => {
            let id = value
                .get("id")
                .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok())
                .unwrap_or(RequestId::Number(0));
            JsonRpcErrorResponse::error(
                id,
                error_codes::INVALID_REQUEST,
                format!("invalid request: {e}"),
            )
        }
        Err(_) => JsonRpcErrorResponse::error(
            RequestId::Number(0),
            error_codes::PARSE_ERROR,
            format!("parse error: {e}"),
        ),
    }
}
