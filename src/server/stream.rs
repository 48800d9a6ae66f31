//! Handler for a single incoming connection
// (c) 2026 fxp authors

use crate::config::Configuration;
use crate::error::{FramingError, ProtocolError, TransportError};
use crate::protocol::common::{ReceivingStream, SendReceivePair, SendingStream};
use crate::protocol::Message;
use crate::session::{self, receive_message, send_deny, MALFORMED_REQUEST};

use tracing::{debug, info, trace, trace_span, warn, Instrument as _};

/// Did the peer send a frame we could not make sense of?
fn is_malformed_frame(e: &anyhow::Error) -> bool {
    matches!(
        e.downcast_ref::<FramingError>(),
        Some(FramingError::Decode(_) | FramingError::Empty | FramingError::TooLarge { .. })
    )
}

/// Reads exactly one request from the connection and hands it to the matching command handler.
///
/// A refused request is not an error. A malformed or out-of-sequence first message is.
pub(super) async fn handle_stream<W, R>(
    mut sp: SendReceivePair<W, R>,
    config: &Configuration,
) -> anyhow::Result<()>
where
    R: ReceivingStream + 'static,
    W: SendingStream + 'static,
{
    trace!("reading request");
    let packet = match receive_message(&mut sp.recv, config.read_timeout()).await {
        Ok(p) => p,
        Err(e) => {
            if matches!(
                e.downcast_ref::<FramingError>(),
                Some(FramingError::PeerClosed)
            ) {
                debug!("peer closed the connection without sending a request");
                return Ok(());
            }
            if matches!(
                e.downcast_ref::<TransportError>(),
                Some(TransportError::TimedOut)
            ) {
                info!("no request from peer within the time limit; closing");
                return Ok(());
            }
            if e.is::<ProtocolError>() || is_malformed_frame(&e) {
                let _ = send_deny(&mut sp.send, MALFORMED_REQUEST).await;
            }
            return Err(e);
        }
    };

    let (span, mut handler) = match packet {
        Message::Get(args) => (
            trace_span!("SERVER:GET", filename = %args.filename),
            session::Get::boxed(sp, Some(args)),
        ),
        Message::Put(args) => (
            trace_span!(
                "SERVER:PUT",
                filename = %args.filename,
                size = args.content_length
            ),
            session::Put::boxed(sp, Some(args)),
        ),
        Message::List => (trace_span!("SERVER:LIST"), session::List::boxed(sp)),
        other @ (Message::Allow(_) | Message::Deny(_)) => {
            warn!("first message was a response: {other}");
            let _ = send_deny(&mut sp.send, MALFORMED_REQUEST).await;
            return Err(ProtocolError::Unexpected {
                expected: "a request",
                got: other.to_string(),
            }
            .into());
        }
    };

    handler.handle(config).instrument(span).await
}
