#![cfg(test)]

mod helpers;

mod addressing_modes;
mod arithmetic;
mod conditional;
mod interrupts;
mod io;
mod memory;
mod misc;
