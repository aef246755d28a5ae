//! A minimal user-space network stack.
//!
//! The stack takes raw Ethernet frames from a [`nic::Device`], validates and demultiplexes them
//! through ARP and IPv4 up to UDP port handlers, and performs the symmetric path back down when
//! sending. All state (neighbor cache, pending packets, dispatch tables) is owned by one
//! [`iface::Interface`], there are no globals.
//!
//! ## Structure
//!
//! * [`wire`] contains typed views on packet bytes. Every header is accessed through a byte
//!   wrapper that was checked for its length first, and converted to a plain `Repr` for
//!   processing.
//! * [`layer`] contains the per-protocol processing: `eth`, `arp`, `ip`, `udp` and `icmp`. Each
//!   layer has an `Endpoint` holding its state and a `Sender` that chains onto the layer below.
//! * [`nic`] contains the device boundary and devices: an in-memory one for tests and a tap
//!   interface on Linux.
//!
//! [`nic::Device`]: nic/trait.Device.html
//! [`iface::Interface`]: iface/struct.Interface.html
//! [`wire`]: wire/index.html
//! [`layer`]: layer/index.html
//! [`nic`]: nic/index.html
#![cfg_attr(not(any(feature = "std", test)), no_std)]
#![warn(missing_debug_implementations)]

extern crate alloc;

#[macro_use]
mod macros;

pub mod config;
pub mod iface;
pub mod layer;
pub mod managed;
pub mod nic;
pub mod storage;
pub mod time;
pub mod wire;

pub use config::Config;
pub use iface::Interface;
