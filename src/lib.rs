//! Bit-banged protocols for a two-node thermometer board.
//!
//! - [`onewire`] and [`ds18b20`] talk to a single DS18B20 over one GPIO line.
//! - [`ir`] runs the beat-clocked infrared link that carries a button state between two peers.
//!
//! Nothing here touches board peripherals directly; pins, timers and interrupt enables reach the
//! protocol code through `embedded-hal` traits and the small traits defined next to each protocol.

#![cfg_attr(not(test), no_std)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod delay;
pub mod ds18b20;
pub mod ir;
pub mod onewire;
pub mod thermometer;
