//! Liked-songs mirror: keeps a local audio tree in step with a remote liked
//! playlist and fills in lyrics from the catalog and LRCLIB.

pub mod catalog;
pub mod config;
pub mod diff;
pub mod download;
pub mod error;
pub mod failures;
pub mod identity;
pub mod index_store;
pub mod lyrics;
pub mod merge;
pub mod models;
pub mod progress;
pub mod scan;
pub mod sync;
pub mod tags;
