//! Network I/O façade.
//!
//! [`Socket`] wraps a non-blocking descriptor registered with the reactor
//! and exposes read, write, and accept as suspendable operations;
//! [`listen`] builds a listening socket. These types must be used inside a
//! running runtime.

mod socket;

pub use socket::{Socket, listen};
