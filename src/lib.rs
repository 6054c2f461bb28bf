//! Session, permission, data-source and route-guard model for the SchoolDesk
//! dashboard, served to the shell over a JSON-lines IPC channel.

pub mod api;
pub mod auth;
pub mod config;
pub mod datasource;
pub mod db;
pub mod entities;
pub mod error;
pub mod events;
pub mod fixtures;
pub mod guard;
pub mod ipc;
pub mod list;
pub mod permission;
pub mod preferences;
pub mod repository;
pub mod roles;
pub mod routes;
pub mod session;
pub mod storage;
