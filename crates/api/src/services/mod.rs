//! Application services and external integrations.

pub mod admin_bootstrap;
pub mod auth;
pub mod email;
pub mod image_upload;
pub mod notifications;

pub use auth::{AuthError, AuthService};
pub use email::{EmailMessage, EmailService};
pub use image_upload::{ImageUpload, ImageUploadError, ImageUploadService};
