#![no_std]

// Portable scheduling core for the countdown power switch.
//
// Everything here stays free of the Rust standard library so the same state
// machines drive the STM32 firmware and the host-side emulator.

pub mod config;
pub mod console;
pub mod controller;
pub mod countdown;
pub mod display;
pub mod indicator;
pub mod level;
pub mod selector;
pub mod telemetry;
pub mod time;
