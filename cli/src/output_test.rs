use eventnest::net::types::{Attendee, EventRef, Id, Role};
use eventnest::router::Route;
use time::macros::datetime;

use super::*;

fn event() -> Event {
    Event {
        id: Id::from(1),
        title: "Rust Workshop".to_owned(),
        description: "Ownership in practice".to_owned(),
        date: datetime!(2025-03-01 12:00 +02:00),
        location: "Lab 3".to_owned(),
        category: "tech".to_owned(),
        image_url: Some(String::new()),
    }
}

fn user(role: Role) -> User {
    User { id: Id::from(2), name: "Sam".to_owned(), email: "sam@campus.edu".to_owned(), role }
}

#[test]
fn dates_render_in_utc() {
    assert_eq!(date(datetime!(2025-03-01 12:00 +02:00)), "2025-03-01 10:00 UTC");
}

#[test]
fn event_list_has_one_line_per_event() {
    let text = events_text("All Events", &[event()]);
    assert_eq!(text, "All Events\n  [1] Rust Workshop | 2025-03-01 10:00 UTC | Lab 3 (tech)\n");
    assert!(events_text("All Events", &[]).contains("No events found."));
}

#[test]
fn event_detail_offers_register_hint_only_when_allowed() {
    let text = event_text(&event(), true);
    assert!(text.contains("eventnest events register 1"));
    assert!(!text.contains("Image:"));
    assert!(!event_text(&event(), false).contains("register"));
}

#[test]
fn session_text_by_phase() {
    assert_eq!(session_text(&SessionState::anonymous()), "Not signed in\n");
    assert_eq!(session_text(&SessionState::optimistic("t")), "Signed in (profile not confirmed)\n");
    assert_eq!(
        session_text(&SessionState::authenticated("t", user(Role::Student))),
        "Sam <sam@campus.edu> (STUDENT)\n"
    );
}

#[test]
fn dashboard_lists_both_sections() {
    let registration = Registration {
        id: Id::from(11),
        event: EventRef { id: Id::from(1), title: "Rust Workshop".to_owned(), date: None },
        attended: true,
    };
    let text = dashboard_text(Some(&user(Role::Student)), &[registration], &[]);
    assert!(text.contains("Welcome, Sam."));
    assert!(text.contains("[1] Rust Workshop  (attended)"));
    assert!(text.contains("No certificates yet."));
}

#[test]
fn attendance_marks_attended_rows() {
    let rows = [EventRegistration {
        id: Id::from(12),
        user: Attendee { id: None, name: "Guest".to_owned(), email: "g@campus.edu".to_owned() },
        attended: true,
    }];
    let text = attendance_text(Some(&event()), &rows);
    assert!(text.contains("For: Rust Workshop"));
    assert!(text.contains("[x] 12 Guest <g@campus.edu>"));
}

#[test]
fn cards_show_paths() {
    let cards = [AdminCard { title: "Manage Users", route: Route::ManageUsers }];
    assert!(cards_text(None, &cards).contains("/admin/users"));
}
