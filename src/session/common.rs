//! Common functions within the session protocol
// (c) 2026 fxp authors

use std::path::{Component, Path};
use std::time::Duration;

use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar};
use tracing::trace;

use crate::client::progress::style_for;
use crate::client::JobSpec;
use crate::error::{ProtocolError, Rejected};
use crate::protocol::{Allow, Message, PutRequest};
use crate::protocol::common::{ReceivingStream, SendingStream};
use crate::util::io::with_timeout;

// Response texts. Those which are shown to users on refusal are lower case.
pub(crate) const UPLOAD_APPROVED: &str = "File upload approved";
pub(crate) const APPROVAL_ACKNOWLEDGED: &str = "File approval acknowledged. Sending file...";
pub(crate) const INFO_RECEIVED: &str = "File info received. Continue to send file.";
pub(crate) const TRANSFER_COMPLETE: &str = "File transfer complete";
pub(crate) const FILE_LISTING: &str = "File listing";

pub(crate) const CANNOT_OVERWRITE: &str = "cannot overwrite remote file";
pub(crate) const DOES_NOT_EXIST: &str = "remote file does not exist";
pub(crate) const IS_A_DIRECTORY: &str = "remote file is a directory";
pub(crate) const UPLOAD_IN_PROGRESS: &str = "remote file is still being uploaded";
pub(crate) const INVALID_CONTENT_LENGTH: &str = "invalid content length";
pub(crate) const FILENAME_TOO_LONG: &str = "filename too long";
pub(crate) const INVALID_FILENAME: &str = "invalid filename";
pub(crate) const MALFORMED_REQUEST: &str = "malformed request";

/// Sends a single message
pub(crate) async fn send_message<W: SendingStream>(send: &mut W, msg: Message) -> Result<()> {
    trace!("send {msg}");
    msg.send(send).await?;
    Ok(())
}

/// Helper function for sending an ALLOW
pub(crate) async fn send_allow<W: SendingStream>(send: &mut W, message: &str) -> Result<()> {
    send_message(send, Message::allow(message)).await
}

/// Helper function for sending a DENY
pub(crate) async fn send_deny<W: SendingStream>(send: &mut W, reason: &str) -> Result<()> {
    send_message(send, Message::deny(reason)).await
}

/// Receives a single message, within the time limit if there is one
pub(crate) async fn receive_message<R: ReceivingStream>(
    recv: &mut R,
    timeout: Option<Duration>,
) -> Result<Message> {
    let msg = with_timeout(timeout, Message::receive(recv)).await?;
    trace!("received {msg}");
    Ok(msg)
}

/// Awaits an ALLOW.
///
/// A DENY becomes a [`Rejected`] error; anything else is a [`ProtocolError`].
pub(crate) async fn expect_allow<R: ReceivingStream>(
    recv: &mut R,
    timeout: Option<Duration>,
) -> Result<Allow> {
    match receive_message(recv, timeout).await? {
        Message::Allow(a) => Ok(a),
        Message::Deny(d) => Err(Rejected::new(d.message).into()),
        other => Err(ProtocolError::Unexpected {
            expected: "ALLOW or DENY",
            got: other.to_string(),
        }
        .into()),
    }
}

/// Awaits a description of a file the peer is about to push.
///
/// A DENY becomes a [`Rejected`] error; anything else is a [`ProtocolError`].
pub(crate) async fn expect_offer<R: ReceivingStream>(
    recv: &mut R,
    timeout: Option<Duration>,
) -> Result<PutRequest> {
    match receive_message(recv, timeout).await? {
        Message::Put(p) => Ok(p),
        Message::Deny(d) => Err(Rejected::new(d.message).into()),
        other => Err(ProtocolError::Unexpected {
            expected: "file information or DENY",
            got: other.to_string(),
        }
        .into()),
    }
}

/// Checks a requested file name against the server's naming policy.
///
/// Acceptable names are a single, plain path component no longer than `max_length` bytes.
///
/// # Returns
/// The refusal reason, if the name is not acceptable.
pub(crate) fn check_filename(name: &str, max_length: usize) -> Option<&'static str> {
    if name.len() > max_length {
        return Some(FILENAME_TOO_LONG);
    }
    if name.is_empty() || name.contains(['/', '\\', '\0']) {
        return Some(INVALID_FILENAME);
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(c)), None) if c == name => None,
        _ => Some(INVALID_FILENAME),
    }
}

/// Validates an announced content length for an upload
pub(crate) fn check_content_length(length: i64) -> Result<u64, &'static str> {
    match u64::try_from(length) {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(INVALID_CONTENT_LENGTH),
    }
}

/// Creates a progress bar for a transfer, attached to the display
pub(crate) fn progress_bar_for(
    display: &MultiProgress,
    job: &JobSpec,
    steps: u64,
    quiet: bool,
) -> Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }
    let name = job.display_filename();
    Ok(display.add(
        ProgressBar::new(steps)
            .with_style(indicatif::ProgressStyle::with_template(style_for(
                name.len(),
            ))?)
            .with_message(name)
            .with_finish(indicatif::ProgressFinish::AndClear),
    ))
}

#[cfg(test)]
mod tests {
    use super::{check_content_length, check_filename, expect_allow, expect_offer};
    use super::{FILENAME_TOO_LONG, INVALID_CONTENT_LENGTH, INVALID_FILENAME};
    use crate::error::{ProtocolError, Rejected};
    use crate::protocol::common::ProtocolMessage as _;
    use crate::protocol::{Message, RawMessage};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn framed(msg: Message) -> Vec<u8> {
        RawMessage::from(msg).to_framed_vec().unwrap()
    }

    #[rstest]
    #[case("x.txt", None)]
    #[case("..hidden", None)]
    #[case("with space", None)]
    #[case("", Some(INVALID_FILENAME))]
    #[case(".", Some(INVALID_FILENAME))]
    #[case("..", Some(INVALID_FILENAME))]
    #[case("../etc/passwd", Some(INVALID_FILENAME))]
    #[case("/etc/passwd", Some(INVALID_FILENAME))]
    #[case("sub/file", Some(INVALID_FILENAME))]
    #[case("back\\slash", Some(INVALID_FILENAME))]
    #[case("abcdefghijk", Some(FILENAME_TOO_LONG))]
    fn filename_policy(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(check_filename(name, 10), expected);
    }

    #[rstest]
    #[case(5, Ok(5))]
    #[case(1, Ok(1))]
    #[case(0, Err(INVALID_CONTENT_LENGTH))]
    #[case(-1, Err(INVALID_CONTENT_LENGTH))]
    #[case(i64::MIN, Err(INVALID_CONTENT_LENGTH))]
    fn content_length_policy(#[case] length: i64, #[case] expected: Result<u64, &str>) {
        assert_eq!(check_content_length(length), expected);
    }

    #[tokio::test]
    async fn deny_is_rejection() {
        let mut mock = tokio_test::io::Builder::new()
            .read(&framed(Message::deny("cannot overwrite remote file")))
            .build();
        let e = expect_allow(&mut mock, None).await.unwrap_err();
        assert_eq!(e.to_string(), "cannot overwrite remote file");
        assert!(e.downcast_ref::<Rejected>().is_some());
    }

    #[tokio::test]
    async fn request_instead_of_response() {
        let mut mock = tokio_test::io::Builder::new()
            .read(&framed(Message::List))
            .build();
        let e = expect_allow(&mut mock, None).await.unwrap_err();
        assert!(matches!(
            e.downcast_ref::<ProtocolError>(),
            Some(ProtocolError::Unexpected { .. })
        ));
    }

    #[tokio::test]
    async fn offer_accepted() {
        let mut mock = tokio_test::io::Builder::new()
            .read(&framed(Message::put("f", 3)))
            .build();
        let p = expect_offer(&mut mock, None).await.unwrap();
        assert_eq!(p.filename, "f");
        assert_eq!(p.content_length, 3);
    }

    #[tokio::test]
    async fn allow_where_offer_expected() {
        let mut mock = tokio_test::io::Builder::new()
            .read(&framed(Message::allow("hi")))
            .build();
        let e = expect_offer(&mut mock, None).await.unwrap_err();
        assert!(e.downcast_ref::<ProtocolError>().is_some());
    }
}
