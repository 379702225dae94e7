use std::fmt;

/// Every instruction the LS-8 understands, keyed by its literal byte.
///
/// The two high bits of each byte give the operand count, which is why the
/// fixed-width instructions are `1 + (byte >> 6)` bytes long.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
  /// Stops the machine.
  ///
  /// | Operation | Semantics/RTL      | Encoding   |
  /// |-----------|--------------------|------------|
  /// | Halt      | `(stop execution)` | `00000001` |
  Hlt = 0b0000_0001,

  /// Loads an immediate byte into a register.
  ///
  /// | Operation      | Semantics/RTL | Encoding                     |
  /// |----------------|---------------|------------------------------|
  /// | Load Immediate | `r[a] ← b`    | `10000010 00000aaa bbbbbbbb` |
  Ldi = 0b1000_0010,

  /// Writes the decimal value of a register to the output sink.
  ///
  /// | Operation | Semantics/RTL  | Encoding              |
  /// |-----------|----------------|-----------------------|
  /// | Print     | `out ← r[a]`   | `01000111 00000aaa`   |
  Prn = 0b0100_0111,

  /// | Operation | Semantics/RTL                | Encoding                     |
  /// |-----------|------------------------------|------------------------------|
  /// | Multiply  | `r[a] ← r[a] × r[b] mod 256` | `10100010 00000aaa 00000bbb` |
  Mul = 0b1010_0010,

  /// | Operation | Semantics/RTL                   | Encoding            |
  /// |-----------|---------------------------------|---------------------|
  /// | Pop       | `r[a] ← m[r7]; r7 ← r7 + 1`     | `01000110 00000aaa` |
  Pop = 0b0100_0110,

  /// | Operation | Semantics/RTL                   | Encoding            |
  /// |-----------|---------------------------------|---------------------|
  /// | Push      | `r7 ← r7 − 1; m[r7] ← r[a]`     | `01000101 00000aaa` |
  Push = 0b0100_0101,

  /// | Operation | Semantics/RTL                 | Encoding   |
  /// |-----------|-------------------------------|------------|
  /// | Return    | `pc ← m[r7]; r7 ← r7 + 1`     | `00010001` |
  Ret = 0b0001_0001,

  /// | Operation | Semantics/RTL                              | Encoding            |
  /// |-----------|--------------------------------------------|---------------------|
  /// | Call      | `r7 ← r7 − 1; m[r7] ← pc + 2; pc ← r[a]`   | `01010000 00000aaa` |
  Call = 0b0101_0000,

  /// | Operation | Semantics/RTL | Encoding            |
  /// |-----------|---------------|---------------------|
  /// | Jump      | `pc ← r[a]`   | `01010100 00000aaa` |
  Jmp = 0b0101_0100,

  /// | Operation     | Semantics/RTL                          | Encoding            |
  /// |---------------|----------------------------------------|---------------------|
  /// | Jump if Equal | `if fl = 1 : pc ← r[a] else pc ← pc + 2` | `01010101 00000aaa` |
  Jeq = 0b0101_0101,

  /// | Operation         | Semantics/RTL                           | Encoding            |
  /// |-------------------|-----------------------------------------|---------------------|
  /// | Jump if Not Equal | `if fl ≠ 1 : pc ← r[a] else pc ← pc + 2` | `01010110 00000aaa` |
  Jne = 0b0101_0110,

  /// Compares two registers and records the outcome in the flags.
  ///
  /// | Operation | Semantics/RTL                | Encoding                     |
  /// |-----------|------------------------------|------------------------------|
  /// | Compare   | `fl ← (=:1, >:2, <:4)`       | `10100111 00000aaa 00000bbb` |
  Cmp = 0b1010_0111,
}

/// A byte that matches no entry in the instruction table
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unknown opcode {0:#010b}")]
pub struct UnknownOpcode(pub u8);

impl Opcode {
  /// Number of bytes the instruction occupies, operands included.
  pub fn width(self) -> usize {
    1 + (self as u8 >> 6) as usize
  }

  /// Whether the instruction assigns PC itself rather than falling through.
  pub fn sets_pc(self) -> bool {
    matches!(
      self,
      Self::Call | Self::Ret | Self::Jmp | Self::Jeq | Self::Jne
    )
  }

  pub fn mnemonic(self) -> &'static str {
    match self {
      Self::Hlt => "HLT",
      Self::Ldi => "LDI",
      Self::Prn => "PRN",
      Self::Mul => "MUL",
      Self::Pop => "POP",
      Self::Push => "PUSH",
      Self::Ret => "RET",
      Self::Call => "CALL",
      Self::Jmp => "JMP",
      Self::Jeq => "JEQ",
      Self::Jne => "JNE",
      Self::Cmp => "CMP",
    }
  }
}

impl fmt::Display for Opcode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.mnemonic())
  }
}

impl TryFrom<u8> for Opcode {
  type Error = UnknownOpcode;

  fn try_from(byte: u8) -> Result<Self, Self::Error> {
    match byte {
      0b0000_0001 => Ok(Self::Hlt),
      0b1000_0010 => Ok(Self::Ldi),
      0b0100_0111 => Ok(Self::Prn),
      0b1010_0010 => Ok(Self::Mul),
      0b0100_0110 => Ok(Self::Pop),
      0b0100_0101 => Ok(Self::Push),
      0b0001_0001 => Ok(Self::Ret),
      0b0101_0000 => Ok(Self::Call),
      0b0101_0100 => Ok(Self::Jmp),
      0b0101_0101 => Ok(Self::Jeq),
      0b0101_0110 => Ok(Self::Jne),
      0b1010_0111 => Ok(Self::Cmp),
      other => Err(UnknownOpcode(other)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const ALL: [Opcode; 12] = [
    Opcode::Hlt,
    Opcode::Ldi,
    Opcode::Prn,
    Opcode::Mul,
    Opcode::Pop,
    Opcode::Push,
    Opcode::Ret,
    Opcode::Call,
    Opcode::Jmp,
    Opcode::Jeq,
    Opcode::Jne,
    Opcode::Cmp,
  ];

  #[test]
  fn decode_matches_discriminant() {
    for op in ALL {
      assert_eq!(Opcode::try_from(op as u8), Ok(op));
    }
  }

  #[test]
  fn decode_unknown() {
    assert_eq!(Opcode::try_from(0xFF), Err(UnknownOpcode(0xFF)));
    assert_eq!(Opcode::try_from(0x00), Err(UnknownOpcode(0x00)));
    // ADD exists on the ALU but has no opcode
    assert_eq!(Opcode::try_from(0b1010_0000), Err(UnknownOpcode(0b1010_0000)));
  }

  #[test]
  fn widths() {
    assert_eq!(Opcode::Hlt.width(), 1);
    assert_eq!(Opcode::Ret.width(), 1);
    assert_eq!(Opcode::Prn.width(), 2);
    assert_eq!(Opcode::Push.width(), 2);
    assert_eq!(Opcode::Pop.width(), 2);
    assert_eq!(Opcode::Jeq.width(), 2);
    assert_eq!(Opcode::Ldi.width(), 3);
    assert_eq!(Opcode::Mul.width(), 3);
    assert_eq!(Opcode::Cmp.width(), 3);
  }

  #[test]
  fn only_control_flow_sets_pc() {
    let setters: Vec<_> = ALL.into_iter().filter(|op| op.sets_pc()).collect();
    assert_eq!(
      setters,
      vec![Opcode::Ret, Opcode::Call, Opcode::Jmp, Opcode::Jeq, Opcode::Jne]
    );
  }

  #[test]
  fn display() {
    assert_eq!(Opcode::Push.to_string(), "PUSH");
    assert_eq!(UnknownOpcode(0xFF).to_string(), "unknown opcode 0b11111111");
  }
}
