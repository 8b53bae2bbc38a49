//! Inbound SMS handling: classify a message, pick a title, render TwiML.

use marquee::TitleRecord;
use quick_xml::escape::escape;
use rand::seq::SliceRandom;
use regex::Regex;
use std::sync::OnceLock;

/// What an inbound message asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// `DELETE ME`: forget the sender.
    DeleteUser,
    /// `DELETE <list>`
    DeleteList,
    /// `ADD <list>`
    AddList,
    /// `UPDATE <list>`
    UpdateList,
    /// Message carries a list URL: reply with one title from it.
    RandomPick,
    /// Anything else.
    Recommendation,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::DeleteUser => "delete_user",
            MessageKind::DeleteList => "delete_list",
            MessageKind::AddList => "add_list",
            MessageKind::UpdateList => "update_list",
            MessageKind::RandomPick => "random_pick",
            MessageKind::Recommendation => "recommendation",
        }
    }
}

fn absolute_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bhttps?://\S+").expect("valid regex"))
}

fn bare_site_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:[a-z0-9-]+\.)*imdb\.com/\S+").expect("valid regex")
    })
}

fn command_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(DELETE|ADD|UPDATE)\s").expect("valid regex"))
}

/// Classify a message body. `DELETE ME` must be the whole (trimmed) body;
/// other commands are a keyword followed by whitespace, in any case.
pub fn classify_message(body: &str) -> MessageKind {
    let body = body.trim();
    if body.eq_ignore_ascii_case("DELETE ME") {
        return MessageKind::DeleteUser;
    }
    let command = command_regex()
        .captures(body)
        .map(|c| c[1].to_ascii_uppercase());
    match command.as_deref() {
        Some("DELETE") => MessageKind::DeleteList,
        Some("ADD") => MessageKind::AddList,
        Some("UPDATE") => MessageKind::UpdateList,
        _ if extract_list_url(body).is_some() => MessageKind::RandomPick,
        _ => MessageKind::Recommendation,
    }
}

/// First list URL in `body`. Links pasted without a scheme get `https://`.
pub fn extract_list_url(body: &str) -> Option<String> {
    let trim = |s: &str| s.trim_end_matches(['.', ',', ';', ')', '!', '?']).to_string();

    if let Some(m) = absolute_url_regex().find(body) {
        return Some(trim(m.as_str()));
    }
    bare_site_url_regex()
        .find(body)
        .map(|m| format!("https://{}", trim(m.as_str())))
}

/// Choose one record at random.
pub fn pick_random(records: &[TitleRecord]) -> Option<&TitleRecord> {
    records.choose(&mut rand::thread_rng())
}

/// Plain-text reply describing one title.
pub fn format_title(record: &TitleRecord, site_url: &str) -> String {
    format!(
        "{} - ({})\nrating: {}\nruntime: {}\ngenre: {}\n{}{}",
        record.name,
        record.year,
        record.rating,
        record.runtime,
        record.genre,
        site_url.trim_end_matches('/'),
        record.link
    )
}

/// TwiML response document, with a single `<Message>` when `message` is set.
pub fn twiml(message: Option<&str>) -> String {
    let mut out = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    match message {
        Some(text) => {
            out.push_str("<Response><Message>");
            out.push_str(&escape(text));
            out.push_str("</Message></Response>");
        }
        None => out.push_str("<Response/>"),
    }
    out
}
