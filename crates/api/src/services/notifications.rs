//! Background email notifications.
//!
//! Every function here spawns a task and returns immediately; delivery
//! failures are logged and counted, never surfaced to the request.

use domain::models::{Event, RegistrationStatus};
use domain::services::{event_announcement, moderation_decision, registration_status_changed};
use persistence::repositories::UserRepository;
use sqlx::PgPool;
use tracing::{info, warn};

use super::email::{EmailMessage, EmailService};

/// Announce a newly approved event to every non-admin user.
pub fn announce_event(email: &EmailService, pool: &PgPool, event: Event) {
    if !email.is_enabled() {
        return;
    }
    let email = email.clone();
    let users = UserRepository::new(pool.clone());

    tokio::spawn(async move {
        let recipients = match users.list_announcement_recipients().await {
            Ok(recipients) => recipients,
            Err(e) => {
                warn!(event_id = %event.id, error = %e, "Failed to load announcement recipients");
                return;
            }
        };

        info!(
            event_id = %event.id,
            recipients = recipients.len(),
            "Sending event announcement"
        );

        for recipient in recipients {
            let content = event_announcement(&event, &recipient.name, email.base_url());
            let message = EmailMessage::from_notification(&recipient.email, &recipient.name, content);
            email.deliver("event_announcement", message).await;
        }
    });
}

/// Tell the organizer how their event was moderated.
pub fn notify_moderation(
    email: &EmailService,
    event: Event,
    organizer_email: String,
    organizer_name: String,
) {
    let email = email.clone();
    tokio::spawn(async move {
        let content = moderation_decision(&event, &organizer_name);
        let message = EmailMessage::from_notification(&organizer_email, &organizer_name, content);
        email.deliver("moderation_decision", message).await;
    });
}

/// Tell a registrant their registration was confirmed or cancelled.
pub fn notify_registration_status(
    email: &EmailService,
    event: Event,
    status: RegistrationStatus,
    registrant_email: String,
    registrant_name: String,
) {
    let Some(content) = registration_status_changed(&event, status, &registrant_name) else {
        return;
    };
    let email = email.clone();
    tokio::spawn(async move {
        let message =
            EmailMessage::from_notification(&registrant_email, &registrant_name, content);
        email.deliver("registration_status", message).await;
    });
}
