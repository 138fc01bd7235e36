// src/session/auth.rs
use tracing::info;

use super::Session;
use crate::config::{Credentials, TimingConfig};
use crate::error::ScrapeError;

pub const LOGIN_URL: &str = "https://www.linkedin.com/login";
const USERNAME_FIELD: &str = "#username";
const PASSWORD_FIELD: &str = "#password";

/// Log the session in. Missing credentials or an unusable login form are
/// reported as [`ScrapeError::Authentication`]; navigation failures as
/// [`ScrapeError::Driver`].
pub async fn authenticate(
    session: &dyn Session,
    credentials: Option<&Credentials>,
    timing: &TimingConfig,
) -> Result<(), ScrapeError> {
    let credentials = credentials.ok_or_else(|| {
        ScrapeError::Authentication("LINKEDIN_EMAIL or LINKEDIN_PASSWORD is not set".to_string())
    })?;

    session.navigate(LOGIN_URL).map_err(ScrapeError::Driver)?;
    timing.login_page.wait().await;

    for (selector, value) in [
        (USERNAME_FIELD, credentials.email.as_str()),
        (PASSWORD_FIELD, credentials.password.as_str()),
    ] {
        let filled = session.fill(selector, value).map_err(ScrapeError::Driver)?;
        if !filled {
            return Err(ScrapeError::Authentication(format!(
                "login form field {} not found",
                selector
            )));
        }
    }

    if !session.submit(PASSWORD_FIELD).map_err(ScrapeError::Driver)? {
        return Err(ScrapeError::Authentication(
            "login form could not be submitted".to_string(),
        ));
    }
    timing.after_login.wait().await;

    info!("Logged in as {}", credentials.email);
    Ok(())
}
