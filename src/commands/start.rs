use teloxide::prelude::*;

use crate::errors::HandlerResult;

pub async fn start(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(
        msg.chat.id,
        "Send me a YouTube link to get download options!",
    )
    .await?;
    Ok(())
}
