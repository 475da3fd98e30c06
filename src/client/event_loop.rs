//! Inbound message loop for one control-socket connection.
//!
//! # Event Loop
//!
//! One task per connection selects, in priority order, over:
//!
//! - Outbound commands (subscribe/unsubscribe messages, shutdown)
//! - The connection's cancellation token
//! - Socket reads
//!
//! Each complete text or binary message is parsed as a
//! `[kind, eventName, payload]` frame. Event frames are decoded and handed
//! to derived state, then to the endpoint's callbacks in registration order.
//! A process-exit event reporting `Stopping` ends the loop before anything
//! else is dispatched.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::protocol::{ControlMessage, InboundFrame, MessageBuffer};

use super::registry::SubscriptionRegistry;
use super::state::DerivedState;

// ============================================================================
// Constants
// ============================================================================

/// Reason sent with the normal close frame.
const CLOSE_REASON: &str = "Disconnecting";

/// Status the client reports on the process-exit endpoint before quitting.
const STOPPING_STATUS: &str = "Stopping";

// ============================================================================
// Types
// ============================================================================

/// Commands for the event loop.
#[derive(Debug)]
pub(crate) enum LoopCommand {
    /// Write a control message.
    Send(ControlMessage),
    /// Close the socket and exit.
    Shutdown,
}

/// Why the event loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopExit {
    /// A shutdown command was received.
    Shutdown,
    /// The cancellation token fired.
    Cancelled,
    /// The client reported that its process is stopping.
    ProcessStopping,
    /// The socket closed, failed, or ended.
    Closed,
}

impl LoopExit {
    /// Returns `true` if the connection ended without the owner asking.
    #[inline]
    #[must_use]
    pub(crate) const fn is_unsolicited(self) -> bool {
        matches!(self, Self::ProcessStopping | Self::Closed)
    }
}

/// Outcome of handling one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Routes decoded events to derived state and endpoint callbacks.
#[derive(Debug, Clone)]
pub(crate) struct Dispatcher {
    registry: Arc<SubscriptionRegistry>,
    state: Option<Arc<DerivedState>>,
}

impl Dispatcher {
    /// Creates a dispatcher. `state` is `None` when tracking is disabled.
    pub(crate) fn new(registry: Arc<SubscriptionRegistry>, state: Option<Arc<DerivedState>>) -> Self {
        Self { registry, state }
    }

    /// Handles one complete text message.
    fn handle_text(&self, text: &str) -> Flow {
        let frame = match InboundFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Skipping unparseable frame");
                return Flow::Continue;
            }
        };

        if !frame.is_event() {
            debug!(kind = frame.kind, event_name = %frame.event_name, "Protocol acknowledgement");
            return Flow::Continue;
        }

        let message = match frame.into_message() {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Skipping unparseable event");
                return Flow::Continue;
            }
        };

        if message.endpoint.is_process_exit()
            && message.data.get("status").and_then(Value::as_str) == Some(STOPPING_STATUS)
        {
            info!("Client process is stopping");
            return Flow::Stop;
        }

        if let Some(state) = &self.state {
            state.apply(&message);
        }

        let count = self.registry.dispatch(&message);
        trace!(
            endpoint = %message.endpoint,
            event_type = %message.event_type,
            count,
            "Dispatched event"
        );

        Flow::Continue
    }
}

// ============================================================================
// Event Loop
// ============================================================================

/// Runs until shutdown, cancellation, process exit, or socket loss.
pub(crate) async fn run<R, W>(
    mut read: R,
    mut write: W,
    mut commands: mpsc::UnboundedReceiver<LoopCommand>,
    cancel: CancellationToken,
    dispatcher: Dispatcher,
) -> LoopExit
where
    R: Stream<Item = Result<Message, WsError>> + Unpin,
    W: Sink<Message, Error = WsError> + Unpin,
{
    let mut buffer = MessageBuffer::new();

    let exit = loop {
        tokio::select! {
            biased;

            command = commands.recv() => {
                match command {
                    Some(LoopCommand::Send(message)) => {
                        let json = message.to_json();
                        if let Err(e) = write.send(Message::Text(json.into())).await {
                            error!(error = %e, "Failed to send control message");
                            break LoopExit::Closed;
                        }
                        trace!(opcode = message.opcode.code(), event_name = %message.event_name, "Control message sent");
                    }

                    Some(LoopCommand::Shutdown) | None => {
                        debug!("Shutdown command received");
                        close(&mut write).await;
                        break LoopExit::Shutdown;
                    }
                }
            }

            () = cancel.cancelled() => {
                debug!("Event loop cancelled");
                break LoopExit::Cancelled;
            }

            message = read.next() => {
                let complete = match message {
                    Some(Ok(Message::Text(text))) => buffer.push(text.as_bytes(), true),
                    Some(Ok(Message::Binary(data))) => buffer.push(&data, true),

                    Some(Ok(Message::Close(frame))) => {
                        debug!(?frame, "Socket closed by remote");
                        break LoopExit::Closed;
                    }

                    Some(Err(e)) => {
                        error!(error = %e, "Socket error");
                        break LoopExit::Closed;
                    }

                    None => {
                        debug!("Socket stream ended");
                        break LoopExit::Closed;
                    }

                    // Ping, Pong, raw frames
                    Some(Ok(_)) => continue,
                };

                match complete {
                    Ok(Some(text)) => {
                        if dispatcher.handle_text(&text) == Flow::Stop {
                            close(&mut write).await;
                            break LoopExit::ProcessStopping;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "Discarding message"),
                }
            }
        }
    };

    debug!(?exit, "Event loop terminated");
    exit
}

/// Sends a normal close frame, ignoring failures.
async fn close<W>(write: &mut W)
where
    W: Sink<Message, Error = WsError> + Unpin,
{
    let frame = CloseFrame {
        code: CloseCode::Normal,
        reason: String::from(CLOSE_REASON).into(),
    };

    if let Err(e) = write.send(Message::Close(Some(frame))).await {
        trace!(error = %e, "Close frame not sent");
    }
    let _ = write.close().await;
}

// ============================================================================
// Tests
// ============================================================================
