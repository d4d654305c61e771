//! Frontleaf integration — maps identify, group and track messages onto the
//! Frontleaf data collection API and delivers them.
//!
//! # Modules
//!
//! - [`cleaner`] — Flattening and null/array normalisation of trait data
//! - [`mapper`] — Per-variant payload mapping
//! - [`adaptor`] — Destination adaptor trait and the Frontleaf adaptor
//! - [`dispatcher`] — HTTP delivery with retries
//! - [`forwarder`] — Validate, map and deliver in one call

pub mod adaptor;
pub mod cleaner;
pub mod dispatcher;
pub mod forwarder;
pub mod mapper;

pub use adaptor::{EventAdaptor, FrontleafAdaptor};
pub use cleaner::clean;
pub use dispatcher::{Delivery, Dispatcher};
pub use forwarder::Forwarder;
pub use mapper::{map_group, map_identify, map_message, map_track};
