use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup},
};

use crate::{
    app::App,
    errors::{BotError, HandlerResult},
    extractor::fetch_metadata,
    formats::{FormatChoice, resolve_choices},
    selection::{CALLBACK_PREFIX, ShortId},
};

pub async fn link_received(bot: Bot, msg: Message, app: Arc<App>) -> HandlerResult {
    let url = msg
        .text()
        .ok_or_else(|| BotError::general("Text should be here. It's invalid state"))?
        .trim()
        .to_string();

    // Immediate feedback; extraction can take a while
    let status_msg = bot
        .send_message(msg.chat.id, "Fetching download options...")
        .await?;

    let metadata = match fetch_metadata(&url, app.config.upstream_timeout).await {
        Ok(metadata) => metadata,
        Err(e) => {
            log::warn!("Metadata fetch failed for {}: {}", url, e);
            bot.edit_message_text(msg.chat.id, status_msg.id, e.user_message())
                .await?;
            return Ok(());
        }
    };

    let choices = match resolve_choices(&metadata) {
        Ok(choices) => choices,
        Err(e) => {
            // Includes NoFormatsAvailable: the user never sees an empty keyboard
            bot.edit_message_text(msg.chat.id, status_msg.id, e.user_message())
                .await?;
            return Ok(());
        }
    };

    let short_ids = app.selections.insert_choices(
        msg.chat.id,
        &url,
        metadata.title.as_deref(),
        choices.iter().map(|c| c.format_id.clone()),
    );

    bot.edit_message_text(msg.chat.id, status_msg.id, "Choose a quality:")
        .reply_markup(quality_keyboard(&choices, &short_ids))
        .await?;

    Ok(())
}

/// Any other text: usage hint, no external calls.
pub async fn hint_received(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, "Please send a valid YouTube link!")
        .await?;
    Ok(())
}

/// One button per row, labeled with quality and approximate size.
fn quality_keyboard(choices: &[FormatChoice], short_ids: &[ShortId]) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = choices
        .iter()
        .zip(short_ids)
        .map(|(choice, id)| {
            vec![InlineKeyboardButton::callback(
                choice.button_label(),
                format!("{}{}", CALLBACK_PREFIX, id),
            )]
        })
        .collect();

    InlineKeyboardMarkup::new(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_has_one_row_per_choice() {
        let choices = vec![
            FormatChoice {
                quality_label: "720p".to_string(),
                format_id: "22".to_string(),
                approx_size_bytes: Some(12_939_428),
            },
            FormatChoice {
                quality_label: "360p".to_string(),
                format_id: "18".to_string(),
                approx_size_bytes: None,
            },
        ];
        let ids = vec![ShortId("aaaa1111".to_string()), ShortId("bbbb2222".to_string())];

        let keyboard = quality_keyboard(&choices, &ids);
        assert_eq!(keyboard.inline_keyboard.len(), 2);
        assert_eq!(keyboard.inline_keyboard[0].len(), 1);
        assert_eq!(keyboard.inline_keyboard[0][0].text, "720p (12.34 MB)");
        assert_eq!(keyboard.inline_keyboard[1][0].text, "360p (Size Unknown)");
    }
}
