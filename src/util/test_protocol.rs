//! Test helpers for functions dealing with on-wire protocols
// (c) 2026 fxp authors

use crate::protocol::common::{ReceivingStream, SendReceivePair, SendingStream};

use tokio::io::{duplex, DuplexStream};

pub(crate) type TestStreamPair = SendReceivePair<DuplexStream, DuplexStream>;

impl SendingStream for DuplexStream {}
impl ReceivingStream for DuplexStream {}

const STREAM_BUFFER_SIZE: usize = 4_096;

/// Two cross-connected stream pairs, one for the Initiator and one for the Responder.
///
/// Each side reads from one pipe and writes to the other.
/// Dropping a pair closes both of its pipes, as a TCP peer hanging up would.
pub(crate) fn test_plumbing() -> (TestStreamPair, TestStreamPair) {
    let (a_write, b_read) = duplex(STREAM_BUFFER_SIZE);
    let (b_write, a_read) = duplex(STREAM_BUFFER_SIZE);
    let initiator = (a_write, a_read).into();
    let responder = (b_write, b_read).into();
    (initiator, responder)
}
