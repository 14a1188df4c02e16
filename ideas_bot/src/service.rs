use teloxide::types::UserId;

use crate::{
    admins::Admins,
    error::IdeaError,
    ideas::{Idea, IdeaStore},
    listing::Listing,
    reply::{route_reply, ReplyTarget},
};

/// Everything the bot can do with ideas, minus talking to Telegram.
///
/// Admin-only operations check the caller first and leave the store
/// untouched if they aren't an admin.
pub struct IdeasBot {
    pub store: IdeaStore,
    pub admins: Admins,
    /// Default and maximum listing size.
    pub list_limit: usize,
}

impl IdeasBot {
    #[must_use]
    pub fn new(store: IdeaStore, admins: Admins, list_limit: usize) -> IdeasBot {
        IdeasBot {
            store,
            admins,
            list_limit,
        }
    }

    /// Anyone can submit an idea.
    pub async fn submit(
        &self,
        author_id: Option<UserId>,
        author_name: &str,
        text: &str,
    ) -> Result<i64, IdeaError> {
        let id = self.store.append(author_id, author_name, text).await?;
        log::debug!("Got idea #{id} from {author_name}");
        Ok(id)
    }

    /// The most recent ideas, up to `limit` of them or the configured maximum.
    pub async fn list(&self, caller: UserId, limit: Option<usize>) -> Result<Listing, IdeaError> {
        self.admins.check(caller)?;

        // Asking for 0 ideas would look just like there being none.
        let limit = limit
            .unwrap_or(self.list_limit)
            .min(self.list_limit)
            .max(1);
        let ideas = self.store.list(limit).await?;
        let total = self.store.count().await?;

        Ok(Listing { ideas, total })
    }

    pub async fn delete(&self, caller: UserId, id: i64) -> Result<Idea, IdeaError> {
        self.admins.check(caller)?;

        let idea = self.store.delete(id).await?;
        log::info!("Admin {caller} deleted idea #{id}");
        Ok(idea)
    }

    /// Resolve where a reply from an admin should go. Sending it is up to the caller.
    pub async fn reply(
        &self,
        caller: UserId,
        idea_id: i64,
        text: &str,
    ) -> Result<ReplyTarget, IdeaError> {
        self.admins.check(caller)?;

        route_reply(&self.store, idea_id, text).await
    }

    pub async fn count(&self, caller: UserId) -> Result<u64, IdeaError> {
        self.admins.check(caller)?;

        Ok(self.store.count().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ideas::database::tests::temp_store;
    use tempfile::TempDir;

    const ADMIN: UserId = UserId(1407696674);
    const STUDENT: UserId = UserId(123);

    async fn bot(list_limit: usize) -> (TempDir, IdeasBot) {
        let (dir, store) = temp_store(None).await;
        (
            dir,
            IdeasBot::new(store, Admins::new([ADMIN.0]), list_limit),
        )
    }

    #[tokio::test]
    async fn submit_and_review() {
        let (_dir, bot) = bot(50).await;
        let first = bot.submit(Some(STUDENT), "@student", "first").await.unwrap();
        let second = bot.submit(Some(STUDENT), "@student", "second").await.unwrap();

        let listing = bot.list(ADMIN, None).await.unwrap();
        assert_eq!(listing.total, 2);
        let ids: Vec<i64> = listing.ideas.iter().map(|x| x.id).collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[tokio::test]
    async fn blank_submission() {
        let (_dir, bot) = bot(50).await;
        assert!(matches!(
            bot.submit(Some(STUDENT), "", " ").await,
            Err(IdeaError::EmptyIdea)
        ));
        assert_eq!(bot.count(ADMIN).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn listing_limit_is_capped() {
        let (_dir, bot) = bot(3).await;
        for i in 0..5 {
            bot.submit(Some(STUDENT), "", &format!("idea {i}"))
                .await
                .unwrap();
        }

        assert_eq!(bot.list(ADMIN, None).await.unwrap().ideas.len(), 3);
        assert_eq!(bot.list(ADMIN, Some(2)).await.unwrap().ideas.len(), 2);
        assert_eq!(bot.list(ADMIN, Some(100)).await.unwrap().ideas.len(), 3);
        assert_eq!(bot.list(ADMIN, Some(100)).await.unwrap().total, 5);
    }

    #[tokio::test]
    async fn listing_zero_shows_at_least_one() {
        let (_dir, bot) = bot(50).await;
        bot.submit(Some(STUDENT), "", "only idea").await.unwrap();

        let listing = bot.list(ADMIN, Some(0)).await.unwrap();
        assert_eq!(listing.ideas.len(), 1);
        assert_ne!(listing.render(), vec!["There are no ideas yet.".to_string()]);
    }

    #[tokio::test]
    async fn non_admins_are_turned_away() {
        let (_dir, bot) = bot(50).await;
        let id = bot.submit(Some(STUDENT), "", "idea").await.unwrap();

        assert!(matches!(
            bot.list(STUDENT, None).await,
            Err(IdeaError::PermissionDenied)
        ));
        assert!(matches!(
            bot.delete(STUDENT, id).await,
            Err(IdeaError::PermissionDenied)
        ));
        assert!(matches!(
            bot.reply(STUDENT, id, "hi").await,
            Err(IdeaError::PermissionDenied)
        ));
        assert!(matches!(
            bot.count(STUDENT).await,
            Err(IdeaError::PermissionDenied)
        ));

        // Nothing was touched.
        assert_eq!(bot.count(ADMIN).await.unwrap(), 1);
        assert!(bot.store.get(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_addresses_by_id_not_by_position() {
        let (_dir, bot) = bot(50).await;
        let ids: Vec<i64> = {
            let mut ids = Vec::new();
            for text in ["one", "two", "three"] {
                ids.push(bot.submit(Some(STUDENT), "", text).await.unwrap());
            }
            ids
        };
        // Make the ids and the positions in the listing disagree.
        bot.delete(ADMIN, ids[0]).await.unwrap();

        // The listing now shows "three" in position 1 and "two" in position 2.
        let listing = bot.list(ADMIN, None).await.unwrap();
        let texts: Vec<&str> = listing.ideas.iter().map(|x| x.text.as_str()).collect();
        assert_eq!(texts, vec!["three", "two"]);

        // Deleting `2` means the idea with ID 2 ("two"), not the second one listed.
        assert_eq!(ids[1], 2);
        let removed = bot.delete(ADMIN, 2).await.unwrap();
        assert_eq!(removed.text, "two");

        let listing = bot.list(ADMIN, None).await.unwrap();
        let texts: Vec<&str> = listing.ideas.iter().map(|x| x.text.as_str()).collect();
        assert_eq!(texts, vec!["three"]);

        // And `1` doesn't resolve to whatever is listed first.
        assert!(matches!(
            bot.delete(ADMIN, 1).await,
            Err(IdeaError::NotFound(1))
        ));
    }

    #[tokio::test]
    async fn reply_goes_to_author() {
        let (_dir, bot) = bot(50).await;
        let id = bot.submit(Some(STUDENT), "@student", "idea").await.unwrap();

        let target = bot.reply(ADMIN, id, "Thanks!").await.unwrap();
        assert_eq!(target.recipient, STUDENT);

        assert!(matches!(
            bot.reply(ADMIN, id + 1, "Thanks!").await,
            Err(IdeaError::NotFound(_))
        ));
    }
}
