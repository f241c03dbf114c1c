//! Drives a [`HandshakeClient`] over an ordered message channel.
//!
//! 在有序消息通道上驱动 [`HandshakeClient`]。

use super::client::{Authenticated, HandshakeClient, Outcome};
use crate::error::{HandshakeError, Result};
use crate::protocol::message::HandshakeMessage;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("channel closed")]
    Closed,

    #[error("channel I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of waiting for the next inbound message.
#[derive(Debug)]
pub enum Received {
    Message(HandshakeMessage),
    /// The deadline passed without a message.
    TimedOut,
    /// The peer or transport closed the channel.
    Closed,
}

/// An ordered, reliable, message-at-a-time channel to the host.
pub trait MessageChannel {
    /// Waits for the next message, giving up at `deadline` if one is set.
    fn recv(&mut self, deadline: Option<Instant>) -> Received;

    fn send(&mut self, message: HandshakeMessage) -> std::result::Result<(), ChannelError>;

    fn close(&mut self);
}

/// Runs `client` to completion over `channel`.
///
/// Messages are processed strictly one at a time. On any failure the channel
/// is closed before the error is returned; on success the ready request has
/// already been sent and the channel is left open for the next layer.
///
/// 在 `channel` 上运行 `client` 直至完成。消息严格逐条处理。
/// 任何失败都会在返回错误前关闭通道；成功时已发送就绪请求，通道保持打开供下一层使用。
pub fn run_client<C>(channel: &mut C, mut client: HandshakeClient<'_>) -> Result<Authenticated>
where
    C: MessageChannel + ?Sized,
{
    info!(activity = client.current_activity());
    loop {
        let message = match channel.recv(client.deadline()) {
            Received::Message(message) => message,
            Received::TimedOut => {
                if let Err(error) = client.poll_timeout(Instant::now()) {
                    channel.close();
                    return Err(error);
                }
                continue;
            }
            Received::Closed => {
                client.channel_closed();
                return Err(HandshakeError::ChannelClosed);
            }
        };

        match client.handle(message) {
            Ok(Outcome::Send(reply)) => send(channel, &mut client, reply)?,
            Ok(Outcome::Authenticated(authenticated)) => {
                send(channel, &mut client, authenticated.ready_request.clone())?;
                info!(activity = client.current_activity());
                return Ok(authenticated);
            }
            Err(error) => {
                channel.close();
                return Err(error);
            }
        }
    }
}

fn send<C>(channel: &mut C, client: &mut HandshakeClient<'_>, message: HandshakeMessage) -> Result<()>
where
    C: MessageChannel + ?Sized,
{
    let kind = message.kind();
    channel.send(message).map_err(|error| {
        warn!(%error, kind, "failed to send handshake message");
        client.channel_closed();
        channel.close();
        HandshakeError::ChannelClosed
    })
}
