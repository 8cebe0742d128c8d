pub mod oauth_access_token;
pub mod oauth_refresh_token;
pub mod schedule_job;
pub mod user_account;
