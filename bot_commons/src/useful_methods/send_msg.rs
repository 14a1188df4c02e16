use std::{future::Future, time::Duration};

use teloxide::{
    payloads::SendMessageSetters,
    requests::Requester,
    sugar::request::RequestReplyExt,
    types::{Message, MessageId, ParseMode, Recipient},
    Bot, RequestError,
};

/// Maximum length of a single Telegram text message, in characters.
pub const TELEGRAM_MAX_MESSAGE_LEN: usize = 4096;

/// How many times a single message is attempted before giving up.
const SEND_ATTEMPTS: u8 = 3;

pub trait BotArchSendMsg {
    /// Opinionated method to send a message, with HTML markup,
    /// and retries due to flood waiting or any other issues.
    fn archsendmsg(
        &self,
        to_where: impl Into<Recipient> + Send,
        text: &str,
        reply_to: impl Into<Option<MessageId>> + Send,
    ) -> impl Future<Output = Result<Message, RequestError>> + Send;

    /// Same as [`BotArchSendMsg::archsendmsg`], but sends each of the
    /// pre-split `chunks` as its own message, in order. Only the first
    /// one is sent as a reply.
    ///
    /// Stops at the first chunk that fails to send.
    fn archsendchunks(
        &self,
        to_where: impl Into<Recipient> + Send,
        chunks: &[String],
        reply_to: impl Into<Option<MessageId>> + Send,
    ) -> impl Future<Output = Result<Vec<Message>, RequestError>> + Send;
}

impl BotArchSendMsg for Bot {
    async fn archsendmsg(
        &self,
        to_where: impl Into<Recipient> + Send,
        text: &str,
        reply_to: impl Into<Option<MessageId>> + Send,
    ) -> Result<Message, RequestError> {
        let to_where: Recipient = to_where.into();
        let reply_to = reply_to.into();

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let mut request = self
                .send_message(to_where.clone(), text)
                .parse_mode(ParseMode::Html);
            if let Some(reply_to) = reply_to {
                request = request.reply_to(reply_to);
            }

            let error = match request.await {
                Ok(message) => return Ok(message),
                Err(e) => e,
            };

            if attempt >= SEND_ATTEMPTS {
                return Err(error);
            }

            match &error {
                RequestError::RetryAfter(seconds) => {
                    log::debug!("Flood wait for {} seconds", seconds.seconds());
                    tokio::time::sleep(seconds.duration()).await;
                }
                // No point in retrying these, Telegram will say the same thing again.
                RequestError::Api(_) => return Err(error),
                _ => {
                    log::debug!("Failed to send a message, retrying: {error}");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    async fn archsendchunks(
        &self,
        to_where: impl Into<Recipient> + Send,
        chunks: &[String],
        reply_to: impl Into<Option<MessageId>> + Send,
    ) -> Result<Vec<Message>, RequestError> {
        let to_where: Recipient = to_where.into();
        let mut reply_to = reply_to.into();
        let mut sent_messages = Vec::with_capacity(chunks.len());

        for (i, chunk) in chunks.iter().enumerate() {
            if i > 0 {
                // Be nice to the flood limits.
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
            let message = self
                .archsendmsg(to_where.clone(), chunk.as_str(), reply_to.take())
                .await?;
            sent_messages.push(message);
        }

        Ok(sent_messages)
    }
}
