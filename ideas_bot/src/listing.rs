use std::fmt::Write;

use bot_commons::useful_methods::paginate;
use html_escape::encode_text;

use crate::ideas::Idea;

/// Longest a single listing message may get, leaving some room
/// under Telegram's limit for the header.
pub const LISTING_MAX_LEN: usize = 3900;
/// Goes between ideas in a listing message.
pub const LISTING_SEPARATOR: &str = "\n\n---\n\n";
/// Idea texts longer than this are cut short in listings.
pub const LISTING_PREVIEW_LEN: usize = 250;

/// A page of ideas for an admin to look at.
#[derive(Clone, Debug)]
pub struct Listing {
    /// Newest first.
    pub ideas: Vec<Idea>,
    /// How many ideas are stored in total.
    pub total: u64,
}

impl Listing {
    /// Render every idea into its own block of HTML text.
    #[must_use]
    pub fn blocks(&self) -> Vec<String> {
        self.ideas.iter().map(render_idea).collect()
    }

    /// Render into messages that each fit into a single Telegram message.
    ///
    /// Returns a single "no ideas" message if there is nothing to show.
    #[must_use]
    pub fn render(&self) -> Vec<String> {
        if self.ideas.is_empty() {
            return vec!["There are no ideas yet.".to_string()];
        }

        let mut messages = paginate(&self.blocks(), LISTING_MAX_LEN, LISTING_SEPARATOR);

        let header = format!(
            "<b>Showing {} of {} ideas, newest first.</b>\n\n",
            self.ideas.len(),
            self.total
        );
        if let Some(first) = messages.first_mut() {
            first.insert_str(0, &header);
        }

        messages
    }
}

/// One idea as a listing block:
///
/// ```text
/// #12 @username (123456789)
/// text of the idea
/// 2025-09-01 08:30:00
/// ```
#[must_use]
pub fn render_idea(idea: &Idea) -> String {
    let mut block = format!("<b>#{}</b> {}", idea.id, encode_text(idea.author_label()));
    if let Some(author_id) = idea.author_id {
        let _ = write!(block, " ({author_id})");
    }
    let _ = write!(
        block,
        "\n{}\n{}",
        encode_text(&idea.preview(LISTING_PREVIEW_LEN)),
        idea.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    block
}
