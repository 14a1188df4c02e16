use html_escape::encode_text;
use teloxide::types::UserId;

use crate::{error::IdeaError, ideas::IdeaStore};

/// How much of the original idea is quoted in a reply.
const QUOTE_PREVIEW_LEN: usize = 200;

/// Where a reply to an idea should go, and what it should say.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyTarget {
    pub idea_id: i64,
    /// The idea's author. Their private chat with the bot has the same ID.
    pub recipient: UserId,
    /// HTML-formatted message to send them.
    pub body: String,
}

/// Find out who to deliver a reply to idea `idea_id` to, and compose the message.
///
/// Does not send anything.
pub async fn route_reply(
    store: &IdeaStore,
    idea_id: i64,
    text: &str,
) -> Result<ReplyTarget, IdeaError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(IdeaError::EmptyReply);
    }

    let idea = store
        .get(idea_id)
        .await?
        .ok_or(IdeaError::NotFound(idea_id))?;

    let recipient = idea.author_id.ok_or(IdeaError::NoAuthor(idea_id))?;

    let body = format!(
        "<b>A reply to your idea:</b>\n<i>{}</i>\n\n{}",
        encode_text(&idea.preview(QUOTE_PREVIEW_LEN)),
        encode_text(text)
    );

    Ok(ReplyTarget {
        idea_id,
        recipient,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ideas::database::tests::temp_store;

    #[tokio::test]
    async fn resolves_to_author() {
        let (_dir, store) = temp_store(None).await;
        store.append(Some(UserId(1)), "", "unrelated").await.unwrap();
        let id = store
            .append(Some(UserId(77)), "@ira", "water fountain <near> gym")
            .await
            .unwrap();

        let target = route_reply(&store, id, "Done, thanks!").await.unwrap();
        assert_eq!(target.idea_id, id);
        assert_eq!(target.recipient, UserId(77));
        assert!(target.body.contains("water fountain &lt;near&gt; gym"));
        assert!(target.body.ends_with("Done, thanks!"));
    }

    #[tokio::test]
    async fn missing_idea() {
        let (_dir, store) = temp_store(None).await;
        assert!(matches!(
            route_reply(&store, 5, "hello").await,
            Err(IdeaError::NotFound(5))
        ));
    }

    #[tokio::test]
    async fn anonymous_idea() {
        let (_dir, store) = temp_store(None).await;
        let id = store.append(None, "A channel", "idea").await.unwrap();
        assert!(matches!(
            route_reply(&store, id, "hello").await,
            Err(IdeaError::NoAuthor(x)) if x == id
        ));
    }

    #[tokio::test]
    async fn blank_reply() {
        let (_dir, store) = temp_store(None).await;
        let id = store.append(Some(UserId(1)), "", "idea").await.unwrap();
        assert!(matches!(
            route_reply(&store, id, "  ").await,
            Err(IdeaError::EmptyReply)
        ));
    }
}
