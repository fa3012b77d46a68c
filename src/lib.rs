// Decoding
pub mod isa;
pub use isa::Opcode;

// Loading
mod image;
pub use image::Image;

// Running
mod runtime;
pub use runtime::{Flow, Halted, RunState, MEMORY_SIZE, SP, STACK_START};
pub mod output;

mod error;
pub use error::{ImageError, RunError};

/// Exit status for a usage error or a runtime fault.
pub const EXIT_FAULT: u8 = 1;
/// Exit status when the program image cannot be read.
pub const EXIT_FILE_NOT_FOUND: u8 = 2;
