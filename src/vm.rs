use std::fmt;
use std::io::{self, Write};

use crate::alu::{self, AluOp};
use crate::flags::Flags;
use crate::opcode::{Opcode, UnknownOpcode};
use crate::region::Region;

/// Bytes of addressable memory
pub const MEMORY_SIZE: usize = 256;

/// General-purpose registers, the last of which is the stack pointer
pub const REGISTER_COUNT: usize = 8;

/// Index of the register used as the stack pointer
pub const SP: usize = 7;

/// Where the stack starts out. The 12 bytes above it are left free.
pub const DEFAULT_STACK_TOP: u8 = 0xF4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
  Running,
  Halted,
  Faulted,
}

/// Knobs fixed at construction time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
  /// Initial value of the stack pointer. The first push lands one below it.
  pub stack_top: u8,
  /// Give up after this many instructions without reaching `HLT`
  pub step_limit: Option<u64>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      stack_top: DEFAULT_STACK_TOP,
      step_limit: None,
    }
  }
}

/// The location an out-of-bounds access tried to reach
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
  /// Can be negative or past the end when the stack pointer under/overflows
  Memory(isize),
  Register(u8),
}

impl fmt::Display for Access {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Memory(address) => write!(f, "memory address {address}"),
      Self::Register(index) => write!(f, "register R{index}"),
    }
  }
}

/// A fault raised while executing, or a misuse of the machine
#[derive(thiserror::Error, Debug)]
pub enum Error {
  #[error("unknown opcode {opcode:#010b} at pc {pc:#04x}")]
  UnknownOpcode { pc: usize, opcode: u8 },

  #[error("unsupported ALU operation for {opcode} at pc {pc:#04x}")]
  UnsupportedAlu { pc: usize, opcode: Opcode },

  #[error("out-of-bounds access to {access} at pc {pc:#04x}")]
  OutOfBounds { pc: usize, access: Access },

  #[error("program is {len} bytes, memory only holds {}", MEMORY_SIZE)]
  ProgramTooLarge { len: usize },

  #[error("no HLT after {limit} instructions")]
  StepLimit { limit: u64 },

  #[error("could not write to output")]
  Output(#[from] io::Error),

  #[error("machine is halted")]
  MachineHalted,

  #[error("machine has faulted")]
  MachineFaulted,
}

/// An LS-8 machine.
///
/// All state is private. Memory can only be populated through [`Vm::load`];
/// after that it changes only as a result of executing instructions.
#[derive(Debug, Clone)]
pub struct Vm {
  // address of the next instruction to fetch
  pc: usize,
  memory: [u8; MEMORY_SIZE],
  registers: [u8; REGISTER_COUNT],
  fl: Flags,
  state: State,
  steps: u64,
  config: Config,
}

impl Vm {
  /// Create a zeroed machine with the stack pointer at `config.stack_top`
  pub fn new(config: Config) -> Self {
    let mut registers = [0; REGISTER_COUNT];
    registers[SP] = config.stack_top;
    Self {
      pc: 0,
      memory: [0; MEMORY_SIZE],
      registers,
      fl: Flags::Clear,
      state: State::Running,
      steps: 0,
      config,
    }
  }

  /// Put the machine back the way [`Vm::new`] left it
  pub fn reset(&mut self) {
    *self = Self::new(self.config);
  }

  /// Copy a program image into memory starting at address 0
  pub fn load<R>(&mut self, region: &R) -> Result<(), Error>
  where
    R: Region + ?Sized,
  {
    let bytes = region.bytes();
    if bytes.len() > MEMORY_SIZE {
      return Err(Error::ProgramTooLarge { len: bytes.len() });
    }
    self.memory[..bytes.len()].copy_from_slice(bytes);
    log::debug!("loaded {} bytes", bytes.len());
    Ok(())
  }

  /// Execute a single instruction, writing anything it prints to `out`
  pub fn step<W>(&mut self, out: &mut W) -> Result<State, Error>
  where
    W: Write,
  {
    match self.state {
      State::Halted => return Err(Error::MachineHalted),
      State::Faulted => return Err(Error::MachineFaulted),
      State::Running => {}
    }
    let mut task = Task::new(self, out);
    let result = task.run();
    match result {
      Ok(()) => {
        self.steps += 1;
        Ok(self.state)
      }
      Err(err) => {
        log::error!("{err}");
        self.state = State::Faulted;
        Err(err)
      }
    }
  }

  /// Run until `HLT`, returning how many instructions were executed in total
  pub fn run<W>(&mut self, out: &mut W) -> Result<u64, Error>
  where
    W: Write,
  {
    loop {
      if let Some(limit) = self.config.step_limit {
        if self.steps >= limit {
          log::error!("no HLT after {limit} instructions");
          self.state = State::Faulted;
          return Err(Error::StepLimit { limit });
        }
      }
      log::trace!("{}", self.trace());
      if self.step(out)? == State::Halted {
        return Ok(self.steps);
      }
    }
  }

  /// One line of machine state: `TRACE: PC | IR A B | R0 .. R7`
  pub fn trace(&self) -> String {
    let byte = |address: usize| match self.ram_read(address) {
      Some(value) => format!("{value:02X}"),
      None => "--".to_owned(),
    };
    let mut line = format!(
      "TRACE: {:02X} | {} {} {} |",
      self.pc,
      byte(self.pc),
      byte(self.pc + 1),
      byte(self.pc + 2)
    );
    for register in self.registers {
      line.push_str(&format!(" {register:02X}"));
    }
    line
  }

  pub fn pc(&self) -> usize {
    self.pc
  }

  pub fn register(&self, index: usize) -> Option<u8> {
    self.registers.get(index).copied()
  }

  pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
    &self.registers
  }

  pub fn flags(&self) -> Flags {
    self.fl
  }

  pub fn state(&self) -> State {
    self.state
  }

  /// Instructions executed since construction or the last reset
  pub fn steps(&self) -> u64 {
    self.steps
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn memory(&self) -> &[u8; MEMORY_SIZE] {
    &self.memory
  }

  pub fn ram_read(&self, address: usize) -> Option<u8> {
    self.memory.get(address).copied()
  }

  fn ram_write(&mut self, address: usize, value: u8) -> Result<(), Access> {
    let cell = self
      .memory
      .get_mut(address)
      .ok_or(Access::Memory(address as isize))?;
    *cell = value;
    Ok(())
  }

  // r7 ← r7 − 1; m[r7] ← value
  fn push(&mut self, value: u8) -> Result<(), Access> {
    let sp = self.registers[SP]
      .checked_sub(1)
      .ok_or(Access::Memory(-1))?;
    self.registers[SP] = sp;
    self.ram_write(sp as usize, value)
  }

  // value ← m[r7]; r7 ← r7 + 1
  fn pop(&mut self) -> Result<u8, Access> {
    let sp = self.registers[SP];
    let value = self.memory[sp as usize];
    self.registers[SP] = sp
      .checked_add(1)
      .ok_or(Access::Memory(MEMORY_SIZE as isize))?;
    Ok(value)
  }
}

impl Default for Vm {
  fn default() -> Self {
    Self::new(Config::default())
  }
}

/// How PC moves once an instruction has executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
  /// Fall through by the instruction's width
  Advance,
  Jump(u8),
  /// Fall through, then stop
  Halt,
}

struct Task<'vm, 'out, W> {
  vm: &'vm mut Vm,
  out: &'out mut W,
  pc: usize,
  // fetched unconditionally; `None` past the end of memory
  operands: [Option<u8>; 2],
}

impl<'vm, 'out, W> Task<'vm, 'out, W>
where
  W: Write,
{
  fn new(vm: &'vm mut Vm, out: &'out mut W) -> Self {
    let pc = vm.pc;
    let operands = [vm.ram_read(pc + 1), vm.ram_read(pc + 2)];
    Self {
      vm,
      out,
      pc,
      operands,
    }
  }

  fn fault(&self, access: Access) -> Error {
    Error::OutOfBounds {
      pc: self.pc,
      access,
    }
  }

  fn operand(&self, n: usize) -> Result<u8, Error> {
    self.operands[n].ok_or_else(|| self.fault(Access::Memory((self.pc + 1 + n) as isize)))
  }

  fn register(&self, n: usize) -> Result<usize, Error> {
    let index = self.operand(n)?;
    if index as usize >= REGISTER_COUNT {
      return Err(self.fault(Access::Register(index)));
    }
    Ok(index as usize)
  }

  fn run(&mut self) -> Result<(), Error> {
    let pc = self.pc;
    let ir = self
      .vm
      .ram_read(pc)
      .ok_or_else(|| self.fault(Access::Memory(pc as isize)))?;
    let op = Opcode::try_from(ir)
      .map_err(|UnknownOpcode(opcode)| Error::UnknownOpcode { pc, opcode })?;
    let control = match op {
      Opcode::Hlt => Control::Halt,
      Opcode::Ldi => load_immediate(self)?,
      Opcode::Prn => print(self)?,
      Opcode::Mul | Opcode::Cmp => arithmetic(self, op)?,
      Opcode::Push => push(self)?,
      Opcode::Pop => pop(self)?,
      Opcode::Call => call(self)?,
      Opcode::Ret => ret(self)?,
      Opcode::Jmp => jump(self)?,
      Opcode::Jeq => jump_if(self, true)?,
      Opcode::Jne => jump_if(self, false)?,
    };
    match control {
      Control::Advance => self.vm.pc = pc + op.width(),
      Control::Jump(target) => self.vm.pc = target as usize,
      Control::Halt => {
        self.vm.pc = pc + op.width();
        self.vm.state = State::Halted;
        log::debug!("halted at pc {pc:#04x}");
      }
    }
    Ok(())
  }
}

// r[a] ← b
fn load_immediate<W>(task: &mut Task<'_, '_, W>) -> Result<Control, Error>
where
  W: Write,
{
  let a = task.register(0)?;
  let value = task.operand(1)?;
  task.vm.registers[a] = value;
  Ok(Control::Advance)
}

// out ← r[a]
fn print<W>(task: &mut Task<'_, '_, W>) -> Result<Control, Error>
where
  W: Write,
{
  let a = task.register(0)?;
  writeln!(task.out, "{}", task.vm.registers[a])?;
  Ok(Control::Advance)
}

// r[a] ← alu(r[a], r[b]) or fl ← alu(r[a], r[b])
fn arithmetic<W>(task: &mut Task<'_, '_, W>, op: Opcode) -> Result<Control, Error>
where
  W: Write,
{
  let alu_op = AluOp::try_from(op).map_err(|_| Error::UnsupportedAlu {
    pc: task.pc,
    opcode: op,
  })?;
  let a = task.register(0)?;
  let b = task.register(1)?;
  match alu::execute(alu_op, task.vm.registers[a], task.vm.registers[b]) {
    alu::Output::Value(value) => task.vm.registers[a] = value,
    alu::Output::Flags(flags) => task.vm.fl = flags,
  }
  Ok(Control::Advance)
}

// r7 ← r7 − 1; m[r7] ← r[a]
fn push<W>(task: &mut Task<'_, '_, W>) -> Result<Control, Error>
where
  W: Write,
{
  let a = task.register(0)?;
  let value = task.vm.registers[a];
  task.vm.push(value).map_err(|access| task.fault(access))?;
  Ok(Control::Advance)
}

// r[a] ← m[r7]; r7 ← r7 + 1
fn pop<W>(task: &mut Task<'_, '_, W>) -> Result<Control, Error>
where
  W: Write,
{
  let a = task.register(0)?;
  let value = task.vm.pop().map_err(|access| task.fault(access))?;
  task.vm.registers[a] = value;
  Ok(Control::Advance)
}

// r7 ← r7 − 1; m[r7] ← pc + 2; pc ← r[a]
fn call<W>(task: &mut Task<'_, '_, W>) -> Result<Control, Error>
where
  W: Write,
{
  let a = task.register(0)?;
  let target = task.vm.registers[a];
  let next = task.pc + 2;
  let return_address =
    u8::try_from(next).map_err(|_| task.fault(Access::Memory(next as isize)))?;
  task.vm.push(return_address).map_err(|access| task.fault(access))?;
  Ok(Control::Jump(target))
}

// pc ← m[r7]; r7 ← r7 + 1
fn ret<W>(task: &mut Task<'_, '_, W>) -> Result<Control, Error>
where
  W: Write,
{
  let target = task.vm.pop().map_err(|access| task.fault(access))?;
  Ok(Control::Jump(target))
}

// pc ← r[a]
fn jump<W>(task: &mut Task<'_, '_, W>) -> Result<Control, Error>
where
  W: Write,
{
  let a = task.register(0)?;
  Ok(Control::Jump(task.vm.registers[a]))
}

// if (fl = equal) = when_equal : pc ← r[a]
fn jump_if<W>(task: &mut Task<'_, '_, W>, when_equal: bool) -> Result<Control, Error>
where
  W: Write,
{
  let a = task.register(0)?;
  if task.vm.fl.is_equal() == when_equal {
    Ok(Control::Jump(task.vm.registers[a]))
  } else {
    Ok(Control::Advance)
  }
}
