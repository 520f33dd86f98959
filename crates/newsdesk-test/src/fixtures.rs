//! Valid drafts for each form, as rows keyed by form field name.
//!
//! Tests start from one of these and break the field under test.

use newsdesk_db::Row;

pub fn ad_request() -> Row {
    Row::new()
        .with("institutionName", "Acme Media Group")
        .with("sector", "media")
        .with("adTypes", vec!["job".to_string(), "sponsored".to_string()])
        .with("adDetails", "Hiring two field reporters for the autumn season")
        .with("email", "ads@acme.test")
        .with("phone", "+33 1 23 45 67 89")
        .with("boostAd", false)
        .with("agreeTerms", true)
}

pub fn service_request() -> Row {
    Row::new()
        .with("institutionName", "Acme Media Group")
        .with("sector", "economic")
        .with("serviceType", "dashboard")
        .with("description", "Monthly dashboard of regional market indicators")
        .with("email", "data@acme.test")
        .with("phone", "")
}

pub fn signup() -> Row {
    Row::new()
        .with("fullName", "Sam Reporter")
        .with("email", "sam@newsdesk.test")
        .with("password", "longenough1")
        .with("confirmPassword", "longenough1")
        .with("agreeTerms", true)
}

pub fn login(email: &str, password: &str) -> Row {
    Row::new().with("email", email).with("password", password)
}

pub fn admin_notification() -> Row {
    Row::new()
        .with("targetUsers", "all")
        .with("selectedUsers", Vec::<String>::new())
        .with("title", "Scheduled maintenance")
        .with("titleAr", "")
        .with("titleFr", "Maintenance programmée")
        .with("message", "The site will be offline Sunday from 02:00 to 03:00")
        .with("messageAr", "")
        .with("messageFr", "Le site sera hors ligne dimanche de 2h à 3h")
        .with("type", "warning")
}

pub fn profile() -> Row {
    Row::new()
        .with("fullName", "Sam Reporter")
        .with("phone", "+212 600 000 000")
}

/// Profile rows with the `user` role, ready to seed.
pub fn profiles(ids: &[&str]) -> Vec<Row> {
    ids
        .iter()
        .map(|id| {
            Row::new()
                .with("id", *id)
                .with("email", format!("{id}@newsdesk.test"))
                .with("full_name", format!("User {id}"))
                .with("role", "user")
        })
        .collect()
}
