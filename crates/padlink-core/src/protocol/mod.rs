//! Event model and the line-delimited wire codec.

pub mod codec;
pub mod event;

pub use codec::{decode, encode, encode_batch, encode_into, DELIMITER};
pub use event::{DeliveryClass, Event};
