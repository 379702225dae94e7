use std::cmp::Ordering;
use std::fmt;

/// The FL register.
///
/// Holds the outcome of the most recent `CMP` as one discrete value. The
/// encodings are powers of two but they are never combined; JEQ/JNE compare
/// the whole value against [`Flags::Equal`].
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flags {
  /// Nothing has been compared yet
  #[default]
  Clear = 0b000,
  Equal = 0b001,
  Greater = 0b010,
  Less = 0b100,
}

impl Flags {
  /// Checked in priority order: equal, then greater, then less.
  pub fn compare(a: u8, b: u8) -> Self {
    match a.cmp(&b) {
      Ordering::Equal => Self::Equal,
      Ordering::Greater => Self::Greater,
      Ordering::Less => Self::Less,
    }
  }

  pub fn bits(self) -> u8 {
    self as u8
  }

  pub fn is_equal(self) -> bool {
    self == Self::Equal
  }
}

impl fmt::Display for Flags {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:08b}", self.bits())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn literal_encoding() {
    assert_eq!(Flags::Clear.bits(), 0);
    assert_eq!(Flags::Equal.bits(), 1);
    assert_eq!(Flags::Greater.bits(), 2);
    assert_eq!(Flags::Less.bits(), 4);
  }

  #[test]
  fn compare() {
    assert_eq!(Flags::compare(3, 3), Flags::Equal);
    assert_eq!(Flags::compare(4, 3), Flags::Greater);
    assert_eq!(Flags::compare(3, 4), Flags::Less);
    // unsigned, no sign extension
    assert_eq!(Flags::compare(0x80, 0x7F), Flags::Greater);
  }

  #[test]
  fn clear_is_not_equal() {
    assert!(!Flags::default().is_equal());
    assert!(Flags::Equal.is_equal());
    assert!(!Flags::Greater.is_equal());
    assert!(!Flags::Less.is_equal());
  }
}
