use html_escape::encode_text;
use teloxide::{
    types::{BotCommand, Message, UserId},
    Bot, RequestError,
};

use bot_commons::useful_methods::BotArchSendMsg;

use super::report_error;
use crate::{listing::render_idea, reply::ReplyTarget, service::IdeasBot};

pub const START_MESSAGE: &str = concat!(
    "💬 Hi! Share an idea on how to make our school better, ",
    "and the student council will see it 😉\n\n",
    "Just send it here as a message."
);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandKind {
    Start,
    Help,
    Review,
    Delete,
    Reply,
    Count,
}

#[derive(Debug)]
pub struct Command {
    /// Name with a parameter hint, like `/delete &lt;id&gt;`.
    pub callname: &'static str,
    pub description: &'static str,
    pub kind: CommandKind,
    pub admin_only: bool,
    hidden: bool,
}

pub const COMMANDS: &[Command] = &[START, HELP, REVIEW, LIST, DELETE, REPLY, COUNT];

const START: Command = Command {
    callname: "/start",
    description: "greeting",
    kind: CommandKind::Start,
    admin_only: false,
    hidden: false,
};

const HELP: Command = Command {
    callname: "/help",
    description: "this help",
    kind: CommandKind::Help,
    admin_only: false,
    hidden: false,
};

const REVIEW: Command = Command {
    callname: "/review [amount]",
    description: "(admins only) look through the latest ideas",
    kind: CommandKind::Review,
    admin_only: true,
    hidden: false,
};

const LIST: Command = Command {
    callname: "/list [amount]",
    description: "",
    kind: CommandKind::Review,
    admin_only: true,
    hidden: true,
};

const DELETE: Command = Command {
    callname: "/delete &lt;id&gt;",
    description: "(admins only) delete an idea by its ID",
    kind: CommandKind::Delete,
    admin_only: true,
    hidden: false,
};

const REPLY: Command = Command {
    callname: "/reply &lt;id&gt; &lt;text&gt;",
    description: "(admins only) reply to the author of an idea",
    kind: CommandKind::Reply,
    admin_only: true,
    hidden: false,
};

const COUNT: Command = Command {
    callname: "/count",
    description: "(admins only) how many ideas are stored",
    kind: CommandKind::Count,
    admin_only: true,
    hidden: false,
};

impl Command {
    /// The bare command, like `/delete`.
    pub fn name(&self) -> &'static str {
        self.callname
            .split_ascii_whitespace()
            .next()
            .unwrap_or(self.callname)
    }

    pub fn is_matching_callname(&self, command: &str) -> bool {
        self.name().eq_ignore_ascii_case(command)
    }

    pub fn get_help(&self, mut output: impl std::fmt::Write) -> Result<(), std::fmt::Error> {
        output.write_str(self.callname)?;
        if !self.description.is_empty() {
            output.write_str(" - ")?;
            output.write_str(self.description)?;
        }
        Ok(())
    }

    /// Help text in HTML. Admin commands are only listed for admins.
    pub fn generate_help(for_admin: bool) -> String {
        let mut response = String::from("<b>Commands:</b>\n");
        for command in COMMANDS {
            if command.hidden || (command.admin_only && !for_admin) {
                continue;
            }
            let _ = command.get_help(&mut response);
            response.push('\n');
        }
        response.push_str("\nJust send your message here and it will be saved as an idea.");
        response
    }

    /// Commands for the Telegram command menu.
    pub fn generate_bot_commands(for_admin: bool) -> Vec<BotCommand> {
        COMMANDS
            .iter()
            .filter(|command| !command.hidden && (for_admin || !command.admin_only))
            .map(|command| {
                // Cut off the /
                let callname = command.name()[1..].to_string();
                let description = command
                    .description
                    .replace("&lt;", "<")
                    .replace("&gt;", ">");
                BotCommand::new(callname, description)
            })
            .collect()
    }
}

/// What a message turned out to be, command-wise.
#[derive(Debug)]
pub enum ParsedCommand<'a> {
    /// Doesn't start with a `/`.
    NotACommand,
    /// A command like `/review@SomeOtherBot`.
    NotForUs,
    /// Looks like a command, but we don't know it.
    Unknown(&'a str),
    Known {
        command: &'static Command,
        /// Everything after the command itself, trimmed.
        params: &'a str,
    },
}

/// Parse `text` as a command for the bot with the given username.
pub fn parse_command<'a>(text: &'a str, bot_username: &str) -> ParsedCommand<'a> {
    if !text.starts_with('/') {
        return ParsedCommand::NotACommand;
    }

    let Some(command) = text.split_whitespace().next() else {
        return ParsedCommand::NotACommand;
    };
    let params = text[command.len()..].trim();

    // If the command is "/review@Ideas_Bot", trim the "@" and everything after it,
    // while checking that it's actually our username.
    let callname = if let Some(username_start) = command.find('@') {
        // Bot names are guaranteed ASCII, so ignore ASCII case specifically.
        if !command[username_start + '@'.len_utf8()..].eq_ignore_ascii_case(bot_username) {
            return ParsedCommand::NotForUs;
        }
        &command[..username_start]
    } else {
        command
    };

    for command in COMMANDS {
        if command.is_matching_callname(callname) {
            return ParsedCommand::Known { command, params };
        }
    }

    ParsedCommand::Unknown(callname)
}

/// Parse an idea ID as shown in listings, with or without the `#`.
pub fn parse_idea_id(text: &str) -> Option<i64> {
    let text = text.trim();
    text.strip_prefix('#').unwrap_or(text).parse().ok()
}

/// Split `/reply` parameters into the idea ID and the reply text.
pub fn parse_reply_params(params: &str) -> Option<(i64, &str)> {
    let params = params.trim_start();
    let id_end = params
        .find(char::is_whitespace)
        .unwrap_or(params.len());
    let id = parse_idea_id(&params[..id_end])?;
    Some((id, params[id_end..].trim()))
}

/// Run an already parsed command.
pub async fn run_command(
    bot: &Bot,
    message: &Message,
    ideas: &IdeasBot,
    command: &Command,
    params: &str,
) -> Result<(), RequestError> {
    // Commands are only accepted in private chats, where the sender is always known.
    let caller = message.from.as_ref().map_or(UserId(0), |user| user.id);
    let chat = message.chat.id;

    let response = match command.kind {
        CommandKind::Start => Ok(START_MESSAGE.to_string()),
        CommandKind::Help => Ok(Command::generate_help(ideas.admins.is_admin(caller))),
        CommandKind::Review => {
            let limit = if params.is_empty() {
                None
            } else if let Ok(limit) = params.parse::<usize>() {
                Some(limit)
            } else {
                bot.archsendmsg(chat, "Usage: /review [amount]", message.id)
                    .await?;
                return Ok(());
            };

            match ideas.list(caller, limit).await {
                Ok(listing) => {
                    bot.archsendchunks(chat, &listing.render(), message.id)
                        .await?;
                    return Ok(());
                }
                Err(e) => Err(e),
            }
        }
        CommandKind::Delete => {
            let Some(id) = parse_idea_id(params) else {
                bot.archsendmsg(chat, "Usage: /delete &lt;id&gt;", message.id)
                    .await?;
                return Ok(());
            };
            ideas
                .delete(caller, id)
                .await
                .map(|idea| format!("Deleted this idea:\n\n{}", render_idea(&idea)))
        }
        CommandKind::Reply => {
            let Some((id, text)) = parse_reply_params(params) else {
                bot.archsendmsg(chat, "Usage: /reply &lt;id&gt; &lt;text&gt;", message.id)
                    .await?;
                return Ok(());
            };
            match ideas.reply(caller, id, text).await {
                Ok(target) => Ok(deliver_reply(bot, &target).await),
                Err(e) => Err(e),
            }
        }
        CommandKind::Count => ideas
            .count(caller)
            .await
            .map(|count| format!("There are {count} ideas stored.")),
    };

    match response {
        Ok(text) => {
            bot.archsendmsg(chat, &text, message.id).await?;
        }
        Err(e) => report_error(bot, message, &e).await?,
    }
    Ok(())
}

/// Send a reply to an idea's author. Returns what to tell the admin.
async fn deliver_reply(bot: &Bot, target: &ReplyTarget) -> String {
    match bot.archsendmsg(target.recipient, &target.body, None).await {
        Ok(_) => format!("Reply to idea #{} delivered.", target.idea_id),
        Err(e) => {
            log::warn!(
                "Failed to deliver a reply to idea #{} to user {}: {e}",
                target.idea_id,
                target.recipient
            );
            format!(
                "Couldn't deliver the reply to idea #{}: {}",
                target.idea_id,
                encode_text(&e.to_string())
            )
        }
    }
}
