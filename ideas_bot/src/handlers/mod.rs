pub mod commands;

use std::sync::Arc;

use bot_commons::useful_methods::BotArchSendMsg;
use html_escape::encode_text;
use teloxide::{
    types::{Me, Message},
    Bot, RequestError,
};

use self::commands::{parse_command, run_command, ParsedCommand};
use crate::{error::IdeaError, ideas::types::author_name_of, service::IdeasBot};

const THANKS_MESSAGE: &str = "Thank you! Your idea was received, we'll look into it. 🙏";
const NOT_TEXT_MESSAGE: &str = "Please send your idea as a text message.";

/// Hint for a command we don't know, naming it back.
fn unknown_command_message(callname: &str) -> String {
    format!(
        "I don't know the command {}. \
        Just write your idea as a message and we'll save it. See /help for commands.",
        encode_text(callname)
    )
}

pub async fn handle_message(
    bot: Bot,
    me: Me,
    message: Message,
    ideas: Arc<IdeasBot>,
) -> Result<(), RequestError> {
    // Ideas are only taken in private, so that nobody's group chat gets harvested.
    if !message.chat.is_private() {
        return Ok(());
    }

    // Bot ignores messages made by itself.
    if message.from.as_ref().map(|from| from.id) == Some(me.id) {
        return Ok(());
    }

    let Some(text) = message.text() else {
        bot.archsendmsg(message.chat.id, NOT_TEXT_MESSAGE, message.id)
            .await?;
        return Ok(());
    };

    match parse_command(text, me.username()) {
        ParsedCommand::Known { command, params } => {
            run_command(&bot, &message, &ideas, command, params).await
        }
        ParsedCommand::Unknown(callname) => {
            bot.archsendmsg(message.chat.id, &unknown_command_message(callname), message.id)
                .await?;
            Ok(())
        }
        ParsedCommand::NotForUs => Ok(()),
        ParsedCommand::NotACommand => receive_idea(&bot, &message, &ideas, text).await,
    }
}

/// A plain text message in private is an idea.
async fn receive_idea(
    bot: &Bot,
    message: &Message,
    ideas: &IdeasBot,
    text: &str,
) -> Result<(), RequestError> {
    let author = message.from.as_ref();
    let author_id = author.map(|user| user.id);
    let author_name = author.map(author_name_of).unwrap_or_default();

    match ideas.submit(author_id, &author_name, text).await {
        Ok(_) => {
            bot.archsendmsg(message.chat.id, THANKS_MESSAGE, message.id)
                .await?;
        }
        Err(e) => report_error(bot, message, &e).await?,
    }
    Ok(())
}

/// Tell the user that their request didn't work out.
pub(crate) async fn report_error(
    bot: &Bot,
    message: &Message,
    error: &IdeaError,
) -> Result<(), RequestError> {
    if let IdeaError::Database(e) = error {
        log::error!("Database error while handling a message: {e}");
    }

    bot.archsendmsg(
        message.chat.id,
        &encode_text(&error.user_message()),
        message.id,
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_command_is_named_back() {
        let hint = unknown_command_message("/frobnicate");
        assert!(hint.starts_with("I don't know the command /frobnicate. Just write"));
        assert!(hint.contains("/help"));

        assert!(unknown_command_message("/<b>").contains("/&lt;b&gt;"));
    }
}
