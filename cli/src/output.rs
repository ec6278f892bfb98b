//! Rendering of page data as plain text or JSON.
//!
//! Text renderers are pure functions returning the whole block so they can
//! be tested without capturing stdout. Toasts and notices go to stderr so
//! `--json` output stays machine-readable.

#[cfg(test)]
#[path = "output_test.rs"]
mod output_test;

use std::fmt::Write as _;

use eventnest::net::types::{Certificate, Event, EventRegistration, Registration, User};
use eventnest::pages::admin::{AdminCard, EventDraft};
use eventnest::state::session::SessionState;
use eventnest::state::toast::Toasts;
use serde::Serialize;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// Print `value` as pretty JSON in `--json` mode, else the text block.
    pub fn emit<T: Serialize + ?Sized>(self, value: &T, text: impl FnOnce() -> String) -> Result<(), serde_json::Error> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            print!("{}", text());
        }
        Ok(())
    }

    /// Flush pending toasts to stderr, oldest first.
    pub fn toasts(self, toasts: &Toasts) {
        for toast in toasts.drain() {
            eprintln!("» {}", toast.message);
        }
    }

    pub fn notice(self, text: &str) {
        eprintln!("{text}");
    }
}

// =============================================================================
// TEXT BLOCKS
// =============================================================================

pub fn date(value: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute] UTC");
    let utc = value.to_offset(UtcOffset::UTC);
    utc.format(format).unwrap_or_else(|_| utc.to_string())
}

pub fn title_text(title: &str) -> String {
    format!("{title}\n")
}

pub fn events_text(heading: &str, events: &[Event]) -> String {
    let mut out = title_text(heading);
    if events.is_empty() {
        out.push_str("  No events found.\n");
    }
    for event in events {
        let _ = writeln!(
            out,
            "  [{}] {} | {} | {} ({})",
            event.id,
            event.title,
            date(event.date),
            event.location,
            event.category
        );
    }
    out
}

pub fn event_text(event: &Event, can_register: bool) -> String {
    let mut out = title_text(&event.title);
    let _ = writeln!(out, "  When:     {}", date(event.date));
    let _ = writeln!(out, "  Where:    {}", event.location);
    let _ = writeln!(out, "  Category: {}", event.category);
    if let Some(url) = event.image_url.as_deref().filter(|url| !url.is_empty()) {
        let _ = writeln!(out, "  Image:    {url}");
    }
    let _ = writeln!(out, "\n  {}", event.description);
    if can_register {
        let _ = writeln!(out, "\n  Register with `eventnest events register {}`", event.id);
    }
    out
}

pub fn session_text(state: &SessionState) -> String {
    match state.profile() {
        Some(user) => format!("{} <{}> ({})\n", user.name, user.email, user.role),
        None if state.is_authenticated() => "Signed in (profile not confirmed)\n".to_owned(),
        None => "Not signed in\n".to_owned(),
    }
}

pub fn dashboard_text(user: Option<&User>, registrations: &[Registration], certificates: &[Certificate]) -> String {
    let mut out = title_text("My Dashboard");
    if let Some(user) = user {
        let _ = writeln!(out, "  Welcome, {}.", user.name);
    }

    out.push_str("\nMy Registered Events\n");
    if registrations.is_empty() {
        out.push_str("  You haven't registered for any events yet.\n");
    }
    for registration in registrations {
        let when = registration.event.date.map(date).unwrap_or_default();
        let status = if registration.attended { "attended" } else { "registered" };
        let _ = writeln!(out, "  [{}] {} {} ({status})", registration.event.id, registration.event.title, when);
    }

    out.push_str("\nMy Certificates\n");
    if certificates.is_empty() {
        out.push_str("  No certificates yet.\n");
    }
    for certificate in certificates {
        let _ = writeln!(
            out,
            "  {} | issued {} | {}",
            certificate.event.title,
            date(certificate.issued_at),
            certificate.certificate_url
        );
    }
    out
}

pub fn cards_text(user: Option<&User>, cards: &[AdminCard]) -> String {
    let mut out = title_text("Admin Panel");
    if let Some(user) = user {
        let _ = writeln!(out, "  Welcome, {}. Manage campus events and users.", user.name);
    }
    for card in cards {
        let _ = writeln!(out, "  {:<18} {}", card.title, card.route);
    }
    out
}

pub fn draft_text(heading: &str, draft: &EventDraft) -> String {
    let mut out = title_text(heading);
    let _ = writeln!(out, "  Title:       {}", draft.title);
    let _ = writeln!(out, "  Description: {}", draft.description);
    let _ = writeln!(out, "  Date:        {}", draft.date);
    let _ = writeln!(out, "  Location:    {}", draft.location);
    let _ = writeln!(out, "  Category:    {}", draft.category.as_str());
    if !draft.image_url.is_empty() {
        let _ = writeln!(out, "  Image:       {}", draft.image_url);
    }
    out
}

pub fn attendance_text(event: Option<&Event>, rows: &[EventRegistration]) -> String {
    let mut out = title_text("Manage Attendance");
    if let Some(event) = event {
        let _ = writeln!(out, "  For: {}", event.title);
    }
    if rows.is_empty() {
        out.push_str("  No one has registered for this event yet.\n");
    }
    for row in rows {
        let mark = if row.attended { "x" } else { " " };
        let _ = writeln!(out, "  [{mark}] {} {} <{}>", row.id, row.user.name, row.user.email);
    }
    out
}

pub fn users_text(users: &[User]) -> String {
    let mut out = title_text("Manage Users");
    for user in users {
        let _ = writeln!(out, "  [{}] {} <{}> {}", user.id, user.name, user.email, user.role);
    }
    out
}
