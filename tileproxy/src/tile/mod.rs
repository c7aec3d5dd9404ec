//! Tile request types.
//!
//! A [`TileRequest`] captures what a web map client asked for, in the
//! client's own (TMS) row convention. Translation into storage keys and
//! cache paths happens in [`crate::resolver`].

mod request;

pub use request::{TileRequest, STATIC_TIMESTAMP};
