//! Register-to-register arithmetic and comparison.
//!
//! The ALU only ever sees two register values and hands back a result; it
//! never touches memory or the program counter.

use crate::flags::Flags;
use crate::opcode::Opcode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
  /// `r[a] ← r[a] + r[b]`, wrapping. No opcode decodes to this.
  Add,
  /// `r[a] ← r[a] × r[b]`, wrapping
  Mul,
  /// `fl ← compare(r[a], r[b])`
  Cmp,
}

/// What an ALU operation produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
  /// Goes back into the first operand register
  Value(u8),
  /// Goes into FL
  Flags(Flags),
}

/// An instruction was routed to the ALU that it has no operation for
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unsupported ALU operation for {0}")]
pub struct UnsupportedAlu(pub Opcode);

impl TryFrom<Opcode> for AluOp {
  type Error = UnsupportedAlu;

  fn try_from(op: Opcode) -> Result<Self, Self::Error> {
    match op {
      Opcode::Mul => Ok(Self::Mul),
      Opcode::Cmp => Ok(Self::Cmp),
      other => Err(UnsupportedAlu(other)),
    }
  }
}

pub fn execute(op: AluOp, a: u8, b: u8) -> Output {
  match op {
    AluOp::Add => Output::Value(a.wrapping_add(b)),
    AluOp::Mul => Output::Value(a.wrapping_mul(b)),
    AluOp::Cmp => Output::Flags(Flags::compare(a, b)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mul_wraps() {
    assert_eq!(execute(AluOp::Mul, 8, 9), Output::Value(72));
    assert_eq!(execute(AluOp::Mul, 16, 16), Output::Value(0));
    assert_eq!(execute(AluOp::Mul, 255, 2), Output::Value(254));
  }

  #[test]
  fn add_wraps() {
    assert_eq!(execute(AluOp::Add, 200, 100), Output::Value(44));
  }

  #[test]
  fn cmp_sets_flags() {
    assert_eq!(execute(AluOp::Cmp, 1, 1), Output::Flags(Flags::Equal));
    assert_eq!(execute(AluOp::Cmp, 2, 1), Output::Flags(Flags::Greater));
    assert_eq!(execute(AluOp::Cmp, 1, 2), Output::Flags(Flags::Less));
  }

  #[test]
  fn only_mul_and_cmp_route_to_alu() {
    assert_eq!(AluOp::try_from(Opcode::Mul), Ok(AluOp::Mul));
    assert_eq!(AluOp::try_from(Opcode::Cmp), Ok(AluOp::Cmp));
    assert_eq!(
      AluOp::try_from(Opcode::Ldi),
      Err(UnsupportedAlu(Opcode::Ldi))
    );
    assert_eq!(
      AluOp::try_from(Opcode::Jmp).unwrap_err().to_string(),
      "unsupported ALU operation for JMP"
    );
  }
}
