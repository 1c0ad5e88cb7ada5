//! Subjects and bodies of lifecycle emails.

use hirely_core::status::RequestStatus;
use hirely_db::models::user::User;
use hirely_events::Notification;

pub const OTP_SUBJECT: &str = "Your OTP for Account Verification";
pub const NEW_REQUEST_SUBJECT: &str = "New Service Request";
pub const STATUS_UPDATE_SUBJECT: &str = "Service Request Update";
pub const COMPLETED_SUBJECT: &str = "Service Completed - Confirm Now";

pub fn otp_code(user: &User, code: &str) -> Notification {
    Notification::new(
        &user.email,
        OTP_SUBJECT,
        format!(
            "Hello {},\n\nYour OTP for verifying your account is: {code}\n\nUse this OTP to activate your account.",
            user.first_name
        ),
    )
}

pub fn new_request(expert: &User) -> Notification {
    Notification::new(
        &expert.email,
        NEW_REQUEST_SUBJECT,
        format!(
            "Hi {},\n\nYou have received a new service request. Log in to check details.",
            expert.first_name
        ),
    )
}

pub fn status_update_for_expert(expert: &User, status: RequestStatus) -> Notification {
    Notification::new(
        &expert.email,
        STATUS_UPDATE_SUBJECT,
        format!(
            "Hi {},\n\nThe status of a service request has been updated to {status}. Log in to check details.",
            expert.first_name
        ),
    )
}

pub fn status_update_for_client(client: &User, status: RequestStatus) -> Notification {
    Notification::new(
        &client.email,
        STATUS_UPDATE_SUBJECT,
        format!(
            "Hi {},\n\nYour service request status has been updated to {status}. Log in to check details.",
            client.first_name
        ),
    )
}

pub fn completed_confirm_now(client: &User) -> Notification {
    Notification::new(
        &client.email,
        COMPLETED_SUBJECT,
        format!(
            "Hi {},\n\nThe service has been completed. Log in to confirm.",
            client.first_name
        ),
    )
}
