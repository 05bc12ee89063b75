//! FilmDeck: a film simulation recipe catalog with multi-device sync.
//!
//! The library is split into the local catalog ([`store`]), disk
//! persistence ([`persist`]), remote mirror clients ([`remote`]), the
//! sync coordinator ([`sync`]), import/share codecs ([`import`],
//! [`share`]) and the sync server's building blocks ([`server`]).

pub mod commands;
pub mod config;
pub mod import;
pub mod models;
pub mod persist;
pub mod remote;
pub mod server;
pub mod share;
pub mod store;
pub mod sync;
