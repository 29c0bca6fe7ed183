use teloxide::{dispatching::UpdateHandler, prelude::*, utils::command::BotCommands};

use crate::{
    commands::*,
    errors::BotError,
    handlers::{choice_received, hint_received, link_received},
    utils::is_youtube_video_link,
};

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
enum Command {
    /// Show start menu
    Start,
}

pub fn schema() -> UpdateHandler<BotError> {
    use dptree::case;

    dptree::entry()
        .branch(
            // Filter for messages
            Update::filter_message()
                .branch(
                    teloxide::filter_command::<Command, _>()
                        .branch(case![Command::Start].endpoint(start)),
                )
                // Recognized video links start the quality flow
                .branch(
                    Message::filter_text()
                        .filter(|text: String| is_youtube_video_link(&text))
                        .endpoint(link_received),
                )
                // Anything else gets the usage hint
                .branch(Message::filter_text().endpoint(hint_received)),
        )
        .branch(Update::filter_callback_query().endpoint(choice_received))
}
