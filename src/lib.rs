//! Emulator for the LS-8, a tiny 8-bit stored-program computer
//!
//! 256 bytes of memory, eight byte-wide registers (the last of which doubles
//! as the stack pointer), a program counter and a flags register. Programs are
//! loaded from a text file of binary literals, one byte per line.

pub mod alu;
pub mod flags;
pub mod loader;
pub mod opcode;
pub mod region;
pub mod vm;
