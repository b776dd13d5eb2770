//! Email notification content.
//!
//! Builds subject and bodies only; delivery is the api crate's job.

use crate::models::{Event, EventStatus, RegistrationStatus};

/// A rendered notification ready to hand to a mail provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationContent {
    pub subject: String,
    pub body_text: String,
    pub body_html: String,
}

/// Announcement sent to every user once an event is approved.
pub fn event_announcement(event: &Event, recipient_name: &str, base_url: &str) -> NotificationContent {
    let when = event.starts_at.format("%Y-%m-%d %H:%M UTC");
    let link = event_link(base_url, event);
    let description = event.description.as_deref().unwrap_or("");

    let body_text = format!(
        "Hi {name},\n\nA new event has been published: {title}\n\nWhen: {when}\nWhere: {location}\nCategory: {category}\n\n{description}\n\n{link}\n",
        name = recipient_name,
        title = event.title,
        location = event.location,
        category = event.category.display_name(),
    );

    let body_html = format!(
        "<p>Hi {name},</p><p>A new event has been published: <strong>{title}</strong></p>\
         <ul><li>When: {when}</li><li>Where: {location}</li><li>Category: {category}</li></ul>\
         <p>{description}</p><p><a href=\"{link}\">View event</a></p>",
        name = escape_html(recipient_name),
        title = escape_html(&event.title),
        location = escape_html(&event.location),
        category = event.category.display_name(),
        description = escape_html(description),
        link = escape_html(&link),
    );

    NotificationContent {
        subject: format!("New event: {}", event.title),
        body_text,
        body_html,
    }
}

/// Tells the organizer how their event was moderated.
pub fn moderation_decision(event: &Event, organizer_name: &str) -> NotificationContent {
    let verdict = match event.status {
        EventStatus::Approved => "approved and is now visible to everyone",
        EventStatus::Rejected => "rejected",
        EventStatus::Pending => "moved back to pending review",
    };

    NotificationContent {
        subject: format!("Your event \"{}\" was {}", event.title, event.status),
        body_text: format!(
            "Hi {},\n\nYour event \"{}\" has been {}.\n",
            organizer_name, event.title, verdict
        ),
        body_html: format!(
            "<p>Hi {},</p><p>Your event <strong>{}</strong> has been {}.</p>",
            escape_html(organizer_name),
            escape_html(&event.title),
            verdict
        ),
    }
}

/// Tells a registrant their registration changed.
///
/// Returns `None` for transitions the registrant is not notified about.
pub fn registration_status_changed(
    event: &Event,
    status: RegistrationStatus,
    registrant_name: &str,
) -> Option<NotificationContent> {
    let (subject, sentence) = match status {
        RegistrationStatus::Confirmed => (
            format!("Registration confirmed: {}", event.title),
            "is confirmed. See you there!",
        ),
        RegistrationStatus::Cancelled => (
            format!("Registration cancelled: {}", event.title),
            "has been cancelled.",
        ),
        RegistrationStatus::Pending => return None,
    };
    let when = event.starts_at.format("%Y-%m-%d %H:%M UTC");

    Some(NotificationContent {
        subject,
        body_text: format!(
            "Hi {},\n\nYour registration for \"{}\" ({}, {}) {}\n",
            registrant_name, event.title, when, event.location, sentence
        ),
        body_html: format!(
            "<p>Hi {},</p><p>Your registration for <strong>{}</strong> ({}, {}) {}</p>",
            escape_html(registrant_name),
            escape_html(&event.title),
            when,
            escape_html(&event.location),
            sentence
        ),
    })
}

fn event_link(base_url: &str, event: &Event) -> String {
    format!("{}/events/{}", base_url.trim_end_matches('/'), event.id)
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventCategory;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn event(status: EventStatus) -> Event {
        Event {
            id: Uuid::new_v4(),
            title: "AI <Night>".to_string(),
            description: Some("Talks & demos".to_string()),
            starts_at: Utc.with_ymd_and_hms(2030, 3, 14, 18, 0, 0).unwrap(),
            organizer_id: Uuid::new_v4(),
            location: "Amfiteatri".to_string(),
            capacity: Some(80),
            category: EventCategory::ComputerEngineering,
            image_url: None,
            status,
            registration_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_announcement_content() {
        let ev = event(EventStatus::Approved);
        let content = event_announcement(&ev, "Blerta", "https://events.umib.net/");

        assert_eq!(content.subject, "New event: AI <Night>");
        assert!(content.body_text.contains("2030-03-14 18:00 UTC"));
        assert!(content.body_text.contains("Computer Engineering"));
        assert!(content
            .body_text
            .contains(&format!("https://events.umib.net/events/{}", ev.id)));
    }

    #[test]
    fn test_announcement_html_is_escaped() {
        let content = event_announcement(&event(EventStatus::Approved), "<b>x</b>", "");
        assert!(content.body_html.contains("AI &lt;Night&gt;"));
        assert!(content.body_html.contains("Talks &amp; demos"));
        assert!(content.body_html.contains("&lt;b&gt;x&lt;/b&gt;"));
        assert!(!content.body_html.contains("<Night>"));
    }

    #[test]
    fn test_moderation_decision() {
        let approved = moderation_decision(&event(EventStatus::Approved), "Org");
        assert!(approved.subject.ends_with("was approved"));
        assert!(approved.body_text.contains("visible to everyone"));

        let rejected = moderation_decision(&event(EventStatus::Rejected), "Org");
        assert!(rejected.subject.ends_with("was rejected"));
    }

    #[test]
    fn test_registration_notifications() {
        let ev = event(EventStatus::Approved);
        let confirmed =
            registration_status_changed(&ev, RegistrationStatus::Confirmed, "Dren").unwrap();
        assert!(confirmed.subject.starts_with("Registration confirmed"));

        let cancelled =
            registration_status_changed(&ev, RegistrationStatus::Cancelled, "Dren").unwrap();
        assert!(cancelled.body_text.contains("has been cancelled"));

        assert!(registration_status_changed(&ev, RegistrationStatus::Pending, "Dren").is_none());
    }
}
