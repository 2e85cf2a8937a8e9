//! Plain-text rendering of the session header and conversation list.

#[cfg(test)]
#[path = "view_test.rs"]
mod view_test;

use std::fmt::Write;

use time::OffsetDateTime;
use time::macros::format_description;

use crate::net::repository::ConversationRepository;
use crate::net::types::{Conversation, User};
use crate::state::conversations::ConversationViewModel;

const BACKEND_DOWN_BANNER: &str = "! Backend API is not available. Please ensure the server is running.";

pub fn format_timestamp(timestamp: Option<OffsetDateTime>) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC");
    timestamp
        .and_then(|ts| ts.to_offset(time::UtcOffset::UTC).format(format).ok())
        .unwrap_or_else(|| "unknown time".to_owned())
}

/// Greeting line with the role badge.
pub fn render_header(user: &User) -> String {
    format!("Welcome, {}! [{}]", user.username, user.role.label())
}

pub fn render_conversation(conversation: &Conversation) -> String {
    format!(
        "#{id}  [{category}]  {time}\n  Q: {prompt}\n  A: {response}",
        id = conversation.id,
        category = conversation.category,
        time = format_timestamp(conversation.timestamp),
        prompt = conversation.prompt,
        response = conversation.response,
    )
}

/// Page buttons as `1 [2] 3`, current page bracketed, one-based.
pub fn render_page_buttons(buttons: std::ops::Range<usize>, current: usize) -> String {
    buttons
        .map(|page| if page == current { format!("[{}]", page + 1) } else { (page + 1).to_string() })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Full list view: banners, cards, position summary and page buttons.
pub fn render_list<R: ConversationRepository>(vm: &ConversationViewModel<R>) -> String {
    let mut out = String::new();
    if vm.backend_unreachable() {
        let _ = writeln!(out, "{BACKEND_DOWN_BANNER}");
    }
    if let Some(error) = vm.error() {
        let _ = writeln!(out, "x {error}");
    }
    let _ = writeln!(out, "Filter: {}  |  Items per page: {}", vm.filter().label(), vm.page_size());
    let _ = writeln!(out);

    if vm.conversations().is_empty() {
        let _ = writeln!(out, "No conversations found");
    } else {
        for conversation in vm.conversations() {
            let _ = writeln!(out, "{}\n", render_conversation(conversation));
        }
    }

    let _ = writeln!(out, "{}", vm.summary());
    let buttons = render_page_buttons(vm.page_buttons(), vm.page());
    if !buttons.is_empty() {
        let _ = writeln!(out, "Pages: {buttons}");
    }
    out
}
