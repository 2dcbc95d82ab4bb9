//! MonFlix client core.
//!
//! IPTV/VOD client building blocks: M3U playlist parsing, an in-memory
//! EPG store, channel aggregation, a remote catalog client with stream URL
//! resolution, playback descriptor assembly and a single-flight refresh
//! service.

pub mod aggregate;
pub mod api;
pub mod catalog;
pub mod config;
pub mod epg;
pub mod errors;
pub mod fetch;
pub mod models;
pub mod playback;
pub mod playlist;
pub mod refresh;
pub mod session;
