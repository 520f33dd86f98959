//! The site's forms.
//!
//! Each form is a [`FormHandler`](crate::controller::FormHandler): a schema,
//! an initial draft, and the persistence call it makes once the draft is
//! valid. The services a form needs are passed to its constructor.

pub mod ad_request;
pub mod admin_notification;
pub mod login;
pub mod profile;
pub mod service_request;
pub mod signup;

pub use ad_request::AdRequestForm;
pub use admin_notification::{AdminNotificationForm, Recipients};
pub use login::LoginForm;
pub use profile::ProfileForm;
pub use service_request::ServiceRequestForm;
pub use signup::SignupForm;

use crate::validation::{FieldRule, RuleKind};

const VALID_EMAIL: &str = "Please enter a valid email address";
const VALID_PHONE: &str = "Please enter a valid phone number";

fn contact_email() -> FieldRule {
    FieldRule::new()
        .required()
        .email()
        .error_message(RuleKind::Email, VALID_EMAIL)
}

fn contact_phone() -> FieldRule {
    FieldRule::new()
        .phone()
        .error_message(RuleKind::Phone, VALID_PHONE)
}

fn institution_name() -> FieldRule {
    FieldRule::new()
        .required()
        .error_message(RuleKind::Required, "Institution name is required")
}

fn full_name() -> FieldRule {
    FieldRule::new()
        .required()
        .min_length(2)
        .error_message(RuleKind::Required, "Full name is required")
        .error_message(RuleKind::MinLength, "Name must be at least 2 characters")
}
