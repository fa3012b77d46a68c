use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use miette::{Diagnostic, Report};

use ls8::output::{MsgColor, Output};
use ls8::{Image, ImageError, RunState, EXIT_FAULT, EXIT_FILE_NOT_FOUND};

/// ls8 is an emulator for the LS-8 eight-bit virtual CPU.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Program image to run
    path: Option<PathBuf>,

    /// Print PC, upcoming bytes and registers before every instruction
    #[arg(short, long, global = true, env = "LS8_TRACE")]
    trace: bool,

    /// Produce minimal output, suited for blackbox tests
    #[arg(short, long, global = true, env = "LS8_MINIMAL")]
    minimal: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Load a program image and run it until it halts
    Run {
        /// `.ls8` image to run
        name: PathBuf,
    },
    /// Check that a program image loads, without running it
    Check {
        /// `.ls8` image to check
        name: PathBuf,
    },
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(EXIT_FAULT);
        }
    };

    let _ = miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(2)
                .build(),
        )
    }));

    Output::set_minimal(args.minimal);
    let trace = args.trace;

    match (args.command, args.path) {
        (Some(Command::Run { name }), _) | (None, Some(name)) => run(&name, trace),
        (Some(Command::Check { name }), _) => check(&name),
        (None, None) => {
            eprintln!("Error: Must have file name\n");
            eprintln!("{}", Args::command().render_usage());
            ExitCode::from(EXIT_FAULT)
        }
    }
}

fn run(name: &Path, trace: bool) -> ExitCode {
    Output::Status(MsgColor::Green).file_message("Loading", name);
    let image = match load(name) {
        Ok(image) => image,
        Err(code) => return code,
    };

    let mut state = match RunState::from_bytes(image.bytes()) {
        Ok(state) => state,
        Err(e) => return fail(e, ExitCode::from(EXIT_FAULT)),
    };
    state.set_trace(trace);

    Output::Status(MsgColor::Green).message("Running", &format!("{} bytes", image.len()));
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let res = state.run(&mut out);
    // Keep program output ahead of any report
    let _ = out.flush();

    match res {
        Ok(halted) => {
            Output::Status(MsgColor::Cyan).message(
                "Halted",
                &format!("at 0x{:02X} after {} cycles", halted.pc, halted.cycles),
            );
            ExitCode::SUCCESS
        }
        Err(e) => fail(e, ExitCode::from(EXIT_FAULT)),
    }
}

fn check(name: &Path) -> ExitCode {
    Output::Status(MsgColor::Green).file_message("Checking", name);
    match load(name) {
        Ok(image) => {
            Output::Status(MsgColor::Green)
                .message("Success", &format!("{} bytes, no errors found!", image.len()));
            ExitCode::SUCCESS
        }
        Err(code) => code,
    }
}

/// Read the image, reporting failure and choosing the exit status.
fn load(name: &Path) -> Result<Image, ExitCode> {
    Image::read(name).map_err(|e| {
        let code = match e {
            ImageError::FileNotFound { .. } => EXIT_FILE_NOT_FOUND,
            _ => EXIT_FAULT,
        };
        fail(e, ExitCode::from(code))
    })
}

fn fail<E>(e: E, code: ExitCode) -> ExitCode
where
    E: Diagnostic + Send + Sync + 'static,
{
    Output::Status(MsgColor::Red).message("Failed", "see report below");
    eprintln!("{:?}", Report::new(e));
    code
}
