use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;

use ls8::loader;
use ls8::vm::{Config, Vm, DEFAULT_STACK_TOP};

/// Run an LS-8 program
#[derive(Parser, Debug)]
#[command(name = "ls8", version)]
struct Args {
  /// Program file, one 8-bit binary literal per line
  program: PathBuf,

  /// Initial stack pointer (R7)
  #[arg(long, default_value_t = DEFAULT_STACK_TOP)]
  stack_top: u8,

  /// Stop with an error after this many instructions
  #[arg(long)]
  max_steps: Option<u64>,

  /// Log machine state before every instruction
  #[arg(long)]
  trace: bool,
}

const EXIT_FAULT: u8 = 1;
const EXIT_LOAD: u8 = 2;

fn main() -> ExitCode {
  let args = Args::parse();
  let mut logger = env_logger::builder();
  logger.format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()));
  if args.trace {
    logger.filter_level(LevelFilter::Trace);
  }
  logger.init();

  let chunk = match loader::load_file(&args.program) {
    Ok(chunk) => chunk,
    Err(err) => {
      eprintln!("error: {err}");
      return ExitCode::from(EXIT_LOAD);
    }
  };

  let mut vm = Vm::new(Config {
    stack_top: args.stack_top,
    step_limit: args.max_steps,
  });
  if let Err(err) = vm.load(&chunk) {
    eprintln!("error: {err}");
    return ExitCode::from(EXIT_LOAD);
  }

  let stdout = io::stdout();
  let mut out = stdout.lock();
  match vm.run(&mut out) {
    Ok(steps) => {
      log::info!("halted after {steps} instructions");
      ExitCode::SUCCESS
    }
    Err(err) => {
      let _ = out.flush();
      eprintln!("error: {err}");
      log::debug!("{}", vm.trace());
      ExitCode::from(EXIT_FAULT)
    }
  }
}
