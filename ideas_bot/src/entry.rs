use std::sync::Arc;

use teloxide::{
    dptree::deps,
    prelude::*,
    types::{BotCommandScope, Recipient},
    update_listeners::webhooks,
};

use crate::{
    admins::Admins,
    config::Config,
    error::StartupError,
    handlers::{self, commands::Command},
    ideas::{sink, IdeaStore},
    service::IdeasBot,
};

/// Start the bot. Exits the process if it can't.
pub async fn entry() {
    if let Err(e) = run().await {
        log::error!("Failed to start: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let config = Config::load()?;
    let key = config.read_key()?;

    let admins = Admins::new(config.admin_ids.iter().copied());
    if admins.is_empty() {
        log::warn!("No admins are configured, nobody will be able to review ideas!");
    }

    // The mirror is optional, so failing to set it up is not a reason to not start.
    let sink = config.sink.as_ref().and_then(|sink_config| {
        sink::from_config(sink_config)
            .inspect_err(|e| {
                log::warn!("Failed to set up the idea mirror, continuing without it: {e}");
            })
            .ok()
    });

    let store = IdeaStore::new(&config.database_path, sink).await?;
    let ideas = Arc::new(IdeasBot::new(store, admins, config.list_limit));

    let bot = Bot::new(key);

    bot.set_my_commands(Command::generate_bot_commands(false))
        .await?;
    for admin in &config.admin_ids {
        // Fails if that admin never talked to the bot. Not a big deal.
        if let Err(e) = bot
            .set_my_commands(Command::generate_bot_commands(true))
            .scope(BotCommandScope::Chat {
                chat_id: Recipient::Id(ChatId::from(UserId(*admin))),
            })
            .await
        {
            log::warn!("Failed to set admin commands for {admin}: {e}");
        }
    }

    log::info!("Creating the handler...");

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    let mut dispatcher = Dispatcher::builder(bot.clone(), handler)
        .default_handler(|_| async {})
        .dependencies(deps![ideas])
        .enable_ctrlc_handler()
        .build();

    match config.webhook {
        Some(webhook) => {
            log::info!(
                "Dispatching the dispatcher with a webhook at {} listening on {}",
                webhook.url,
                webhook.listen_addr
            );
            let listener = webhooks::axum(
                bot,
                webhooks::Options::new(webhook.listen_addr, webhook.url),
            )
            .await?;
            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await;
        }
        None => {
            log::info!("Dispatching the dispatcher!");
            dispatcher.dispatch().await;
        }
    }

    log::info!("it appears we have been bonked.");
    Ok(())
}
