#![cfg_attr(not(test), no_std)]

//! Board glue for the ESP32-S3 glowclock: link worker bus, matrix panel and
//! frame rendering.

pub mod network;
pub mod platform;
pub mod render;
