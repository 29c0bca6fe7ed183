use std::sync::Arc;

use chrono::Utc;
use teloxide::{prelude::*, types::MaybeInaccessibleMessage};

use crate::{
    app::App,
    config::SweepPolicy,
    errors::{BotError, BotResult, HandlerResult},
    extractor::{ResolvedMedia, resolve_direct_media},
    selection::{CALLBACK_PREFIX, PendingSelection, ShortId},
    shortener::UrlShortener,
    store::{LinkRecord, LinkStore, RecordId, UNKNOWN_TITLE},
    sweeper,
};

/// Handle a quality-button press. Callback data: `q:<short_id>`.
pub async fn choice_received(bot: Bot, query: CallbackQuery, app: Arc<App>) -> HandlerResult {
    let data = query
        .data
        .as_ref()
        .ok_or_else(|| BotError::general("No callback data"))?;

    let message = query
        .message
        .ok_or_else(|| BotError::general("Couldn't find message"))?;

    let chat_id = match &message {
        MaybeInaccessibleMessage::Inaccessible(m) => m.chat.id,
        MaybeInaccessibleMessage::Regular(m) => m.chat.id,
    };

    bot.answer_callback_query(&query.id).await?;

    let short_id = data
        .strip_prefix(CALLBACK_PREFIX)
        .map(|id| ShortId(id.to_string()))
        .ok_or_else(|| BotError::general(format!("Invalid quality callback: {}", data)))?;

    // Unknown, expired, or superseded token
    let Some(selection) = app.selections.take(&short_id) else {
        reply(&bot, chat_id, &message, "⌛ This selection has expired. Send the link again.").await?;
        return Ok(());
    };

    log::info!(
        "Quality selected: format={} url={}",
        selection.format_id,
        selection.source_url
    );

    reply(&bot, chat_id, &message, "Generating smart download link...").await?;

    let media = match resolve_direct_media(
        &selection.source_url,
        &selection.format_id,
        app.config.upstream_timeout,
    )
    .await
    {
        Ok(media) => media,
        Err(e) => {
            log::warn!("Direct URL resolution failed: {}", e);
            reply(&bot, chat_id, &message, &e.user_message()).await?;
            return Ok(());
        }
    };

    let outcome = match persist_short_link(
        app.store.as_ref(),
        app.shortener.as_ref(),
        &selection,
        &media,
        Utc::now().timestamp(),
        app.config.shorten_fallback,
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("Link creation failed: {}", e);
            reply(&bot, chat_id, &message, &e.user_message()).await?;
            return Ok(());
        }
    };

    if app.config.sweep_policy == SweepPolicy::AfterCreate {
        sweeper::spawn_sweep(app.store.clone(), app.config.retention_secs);
    }

    let text = reply_text(
        &outcome.record.short_url,
        app.store.public_record_url(&outcome.record_id).as_deref(),
    );
    reply(&bot, chat_id, &message, &text).await?;

    Ok(())
}

#[derive(Debug)]
pub(crate) struct LinkOutcome {
    pub record_id: RecordId,
    pub record: LinkRecord,
}

/// Shorten the resolved URL and persist the link record. On shortener
/// failure the configured policy decides between surfacing the error and
/// falling back to the raw direct URL.
async fn persist_short_link(
    store: &dyn LinkStore,
    shortener: &dyn UrlShortener,
    selection: &PendingSelection,
    media: &ResolvedMedia,
    now: i64,
    shorten_fallback: bool,
) -> BotResult<LinkOutcome> {
    let short_url = match shortener.shorten(media.primary_url()).await {
        Ok(short_url) => short_url,
        Err(BotError::ShorteningFailed { status, body }) if shorten_fallback => {
            log::warn!("Shortening failed ({}): {}; using the direct URL", status, body);
            media.primary_url().to_string()
        }
        Err(e) => return Err(e),
    };

    let record = LinkRecord {
        source_url: selection.source_url.clone(),
        direct_url: media.storage_url(),
        short_url,
        title: selection
            .title
            .clone()
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        format_id: selection.format_id.clone(),
        created_at: now,
    };

    let record_id = store.create(&record).await?;
    Ok(LinkOutcome { record_id, record })
}

fn reply_text(short_url: &str, metadata_url: Option<&str>) -> String {
    let mut text = format!(
        "✅ Download ready: {}\n\n\
         ⚠️ Note: This link may expire soon (usually within 24 hours). Download quickly!",
        short_url
    );
    if let Some(url) = metadata_url {
        text.push_str(&format!("\n\nStored metadata: {}", url));
    }
    text
}

async fn reply(
    bot: &Bot,
    chat_id: ChatId,
    message: &MaybeInaccessibleMessage,
    text: &str,
) -> HandlerResult {
    match message {
        MaybeInaccessibleMessage::Regular(m) => {
            bot.edit_message_text(chat_id, m.id, text).await?;
        }
        MaybeInaccessibleMessage::Inaccessible(_) => {
            bot.send_message(chat_id, text).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::PendingSelections;
    use crate::shortener::testing::FakeShortener;
    use crate::store::testing::MemoryLinkStore;

    fn selection_for(format_id: &str, title: Option<&str>) -> PendingSelection {
        let registry = PendingSelections::new();
        let ids = registry.insert_choices(
            ChatId(7),
            "https://youtu.be/abc123",
            title,
            vec![format_id.to_string()],
        );
        registry.take(&ids[0]).unwrap()
    }

    #[tokio::test]
    async fn full_flow_writes_exactly_one_record() {
        let store = MemoryLinkStore::new();
        let shortener = FakeShortener::succeeding();
        let selection = selection_for("22", Some("A Video"));
        let media = ResolvedMedia::Muxed("https://cdn/video".to_string());
        let now = Utc::now().timestamp();

        let outcome = persist_short_link(&store, &shortener, &selection, &media, now, false)
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(outcome.record.short_url, "https://rebrand.ly/fake");
        assert_eq!(outcome.record.source_url, "https://youtu.be/abc123");
        assert_eq!(outcome.record.title, "A Video");
        assert_eq!(outcome.record.format_id, "22");
        assert_eq!(outcome.record.created_at, now);

        let text = reply_text(&outcome.record.short_url, None);
        assert!(text.contains("https://rebrand.ly/fake"));
        assert!(text.contains("24 hours"));
    }

    #[tokio::test]
    async fn split_media_is_stored_as_a_composite() {
        let store = MemoryLinkStore::new();
        let shortener = FakeShortener::succeeding();
        let selection = selection_for("137", None);
        let media = ResolvedMedia::Split {
            video: "https://cdn/video".to_string(),
            audio: "https://cdn/audio".to_string(),
        };

        let outcome = persist_short_link(&store, &shortener, &selection, &media, 0, false)
            .await
            .unwrap();

        assert_eq!(outcome.record.direct_url, "https://cdn/video|https://cdn/audio");
        assert_eq!(outcome.record.title, UNKNOWN_TITLE);
        // Only the playable video stream goes to the shortener
        assert_eq!(
            shortener.requests.lock().unwrap().as_slice(),
            ["https://cdn/video"]
        );
    }

    #[tokio::test]
    async fn hard_policy_surfaces_shortening_failure_without_a_write() {
        let store = MemoryLinkStore::new();
        let shortener = FakeShortener::failing();
        let selection = selection_for("22", None);
        let media = ResolvedMedia::Muxed("https://cdn/video".to_string());

        let err = persist_short_link(&store, &shortener, &selection, &media, 0, false)
            .await
            .unwrap_err();

        assert!(matches!(err, BotError::ShorteningFailed { status: 403, .. }));
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn fallback_policy_stores_the_direct_url() {
        let store = MemoryLinkStore::new();
        let shortener = FakeShortener::failing();
        let selection = selection_for("22", None);
        let media = ResolvedMedia::Muxed("https://cdn/video".to_string());

        let outcome = persist_short_link(&store, &shortener, &selection, &media, 0, true)
            .await
            .unwrap();

        assert_eq!(outcome.record.short_url, "https://cdn/video");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn reply_includes_the_metadata_link_when_present() {
        let text = reply_text(
            "https://rebrand.ly/abc",
            Some("https://db.example/downloads/x.json"),
        );
        assert!(text.contains("Stored metadata: https://db.example/downloads/x.json"));
    }
}
