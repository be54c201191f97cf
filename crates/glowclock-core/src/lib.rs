#![cfg_attr(not(test), no_std)]

//! Board-independent core of the glowclock LED matrix appliance.
//!
//! Everything here is synchronous and driven by the caller's clock: the firmware
//! feeds link events, inbound messages and timestamps into [`app::App`] and
//! forwards whatever it asks for (reconnects, publishes, frames) to the board.

pub mod app;
pub mod clock;
pub mod command;
pub mod config;
pub mod connectivity;
pub mod display;
pub mod error;
pub mod event;
pub mod outbox;
pub mod pomodoro;
pub mod render;
pub mod router;
pub mod timer;
