//! Who may see and change what.

use uuid::Uuid;

use crate::models::{Event, Registration, UserRole};

/// The authenticated caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl Actor {
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    fn organizes(&self, event: &Event) -> bool {
        event.organizer_id == self.user_id
    }

    /// Edit or delete the event, list its registrations.
    pub fn can_manage_event(&self, event: &Event) -> bool {
        self.is_admin() || self.organizes(event)
    }

    /// Confirm or cancel registrations for the event.
    pub fn can_manage_registrations_of(&self, event: &Event) -> bool {
        self.can_manage_event(event)
    }

    pub fn can_view_registration(&self, registration: &Registration, event: &Event) -> bool {
        registration.user_id == self.user_id || self.can_manage_event(event)
    }

    /// Withdraw (delete) the registration.
    pub fn can_withdraw(&self, registration: &Registration) -> bool {
        self.is_admin() || registration.user_id == self.user_id
    }

    /// Read another user's account.
    pub fn can_view_user(&self, user_id: Uuid) -> bool {
        self.is_admin() || self.user_id == user_id
    }
}

/// Approved events are visible to everyone; others only to the organizer and admins.
pub fn can_view_event(actor: Option<&Actor>, event: &Event) -> bool {
    event.status.is_public() || actor.is_some_and(|a| a.can_manage_event(event))
}
