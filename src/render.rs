//! View rendering
//!
//! Handlers build a [`View`] (text, optional cover photo, optional inline
//! keyboard) and hand it to a [`RenderTarget`]. The target decides whether
//! the view replaces the message the user pressed a button on or arrives as
//! a fresh message; handlers never branch on that.

use teloxide::payloads::{
    EditMessageMediaSetters, EditMessageTextSetters, SendMessageSetters, SendPhotoSetters,
};
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardMarkup, InputFile, InputMedia, InputMediaPhoto, MaybeInaccessibleMessage,
    Message, MessageId,
};

use crate::utils::errors::TuneCircleError;

/// What to show the user
#[derive(Debug, Clone)]
pub struct View {
    text: String,
    photo_url: Option<String>,
    keyboard: Option<InlineKeyboardMarkup>,
}

impl View {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            photo_url: None,
            keyboard: None,
        }
    }

    pub fn photo(url: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            text: caption.into(),
            photo_url: Some(url.into()),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: InlineKeyboardMarkup) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct EditableMessage {
    id: MessageId,
    has_photo: bool,
}

/// Where a view lands: a chat, optionally with a message we may edit in place
#[derive(Clone)]
pub struct RenderTarget {
    bot: Bot,
    chat_id: ChatId,
    editable: Option<EditableMessage>,
}

impl RenderTarget {
    /// Target for replying to a plain message; always sends fresh
    pub fn from_message(bot: Bot, message: &Message) -> Self {
        Self {
            bot,
            chat_id: message.chat.id,
            editable: None,
        }
    }

    /// Target for messaging a chat directly, e.g. share broadcasts
    pub fn to_chat(bot: Bot, chat_id: ChatId) -> Self {
        Self {
            bot,
            chat_id,
            editable: None,
        }
    }

    /// Target for answering a button press; edits the pressed message in
    /// place when Telegram still lets us reach it
    pub fn from_callback(bot: Bot, query: &CallbackQuery) -> Option<Self> {
        let message = query.message.as_ref()?;
        let target = match message {
            MaybeInaccessibleMessage::Regular(msg) => Self {
                bot,
                chat_id: msg.chat.id,
                editable: Some(EditableMessage {
                    id: msg.id,
                    has_photo: msg.photo().is_some(),
                }),
            },
            MaybeInaccessibleMessage::Inaccessible(msg) => Self {
                bot,
                chat_id: msg.chat.id,
                editable: None,
            },
        };
        Some(target)
    }

    /// Render the view, editing in place where the message shapes match and
    /// falling back to a fresh message otherwise
    pub async fn render(&self, view: View) -> Result<(), TuneCircleError> {
        if let Some(editable) = self.editable {
            match (&view.photo_url, editable.has_photo) {
                (Some(url), true) => {
                    if self.edit_media(editable.id, url, &view).await.is_ok() {
                        return Ok(());
                    }
                    tracing::warn!(chat_id = %self.chat_id, "media edit failed, sending fresh message");
                }
                (None, false) => {
                    if self.edit_text(editable.id, &view).await.is_ok() {
                        return Ok(());
                    }
                    tracing::warn!(chat_id = %self.chat_id, "text edit failed, sending fresh message");
                }
                // Telegram cannot turn a text message into a photo or back,
                // so replace the old message instead.
                _ => {
                    let _ = self.bot.delete_message(self.chat_id, editable.id).await;
                }
            }
        }

        self.send(view).await
    }

    async fn edit_text(&self, id: MessageId, view: &View) -> Result<(), TuneCircleError> {
        let mut request = self.bot.edit_message_text(self.chat_id, id, &view.text);
        if let Some(keyboard) = &view.keyboard {
            request = request.reply_markup(keyboard.clone());
        }
        request.await?;
        Ok(())
    }

    async fn edit_media(
        &self,
        id: MessageId,
        url: &str,
        view: &View,
    ) -> Result<(), TuneCircleError> {
        let photo = InputMediaPhoto::new(InputFile::url(url::Url::parse(url)?))
            .caption(&view.text);
        let mut request = self
            .bot
            .edit_message_media(self.chat_id, id, InputMedia::Photo(photo));
        if let Some(keyboard) = &view.keyboard {
            request = request.reply_markup(keyboard.clone());
        }
        request.await?;
        Ok(())
    }

    async fn send(&self, view: View) -> Result<(), TuneCircleError> {
        match view.photo_url {
            Some(url) => {
                let mut request = self
                    .bot
                    .send_photo(self.chat_id, InputFile::url(url::Url::parse(&url)?))
                    .caption(view.text);
                if let Some(keyboard) = view.keyboard {
                    request = request.reply_markup(keyboard);
                }
                request.await?;
            }
            None => {
                let mut request = self.bot.send_message(self.chat_id, view.text);
                if let Some(keyboard) = view.keyboard {
                    request = request.reply_markup(keyboard);
                }
                request.await?;
            }
        }
        Ok(())
    }
}
