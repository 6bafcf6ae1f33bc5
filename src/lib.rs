// ABOUTME: Root library module exposing all public modules
// ABOUTME: Provides access to config, transport seams, Twitch client, and the alert engine

pub mod alerter;
pub mod botlog;
pub mod commands;
pub mod config;
pub mod discord;
pub mod traits;
pub mod twitch;
