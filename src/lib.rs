//! Squeezer: schedule job records, an AMQP producer that forwards them to a
//! broker, and an OAuth2 authorization server issuing password-grant tokens
//! for a single trusted client.

#![allow(missing_docs)]

pub mod amqp;
pub mod api;
pub mod app;
pub mod app_info;
pub mod auth;
pub mod boot;
pub mod cli;
pub mod commands;
pub mod config;
pub mod database;
pub mod environment;
pub mod oauth2;
pub mod password;
pub mod router;
pub mod setup_tracing;
