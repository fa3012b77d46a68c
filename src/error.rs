use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

// Loader errors

#[derive(Error, Diagnostic, Debug)]
pub enum ImageError {
    #[error("File not found")]
    #[diagnostic(code(image::not_found))]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Encountered an invalid binary literal on line {line}")]
    #[diagnostic(
        code(image::bad_lit),
        help("each line holds one byte as `0`/`1` digits, optionally followed by a `#` comment")
    )]
    InvalidLiteral {
        line: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("not an 8-bit binary literal")]
        span: SourceSpan,
    },

    #[error("Program image holds {len} bytes, which cannot fit in memory")]
    #[diagnostic(code(image::too_large), help("LS-8 memory holds at most 256 bytes"))]
    TooLarge { len: usize },
}

// Runtime errors

#[derive(Error, Diagnostic, Debug)]
pub enum RunError {
    #[error("Unknown opcode {opcode:#010b} (0x{opcode:02X}) at PC 0x{pc:02X}")]
    #[diagnostic(
        code(run::unknown_opcode),
        help("the program may have run past its last instruction or jumped into data")
    )]
    UnknownOpcode { opcode: u8, pc: u8 },

    #[error("Division by zero at PC 0x{pc:02X}")]
    #[diagnostic(code(run::div_zero))]
    DivisionByZero { pc: u8 },

    #[error("Unsupported ALU operation {opcode:#010b}")]
    #[diagnostic(code(run::unsupported_alu))]
    UnsupportedAluOperation { opcode: u8 },

    #[error("Program of {len} bytes cannot fit in memory")]
    #[diagnostic(code(run::too_large))]
    ProgramTooLarge { len: usize },

    #[error("Could not write program output")]
    #[diagnostic(code(run::output))]
    Output(#[from] std::io::Error),
}
