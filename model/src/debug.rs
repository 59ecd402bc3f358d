use std::fmt::{self, Debug};

/// Renders raw column bytes as an escaped byte string literal, e.g. `b"\x89PNG\r\n"`.
pub struct DebugBytesRef<'a>(pub &'a [u8]);

impl Debug for DebugBytesRef<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("b\"")?;
    for &b in self.0 {
      match b {
        b'\n' => f.write_str("\\n")?,
        b'\r' => f.write_str("\\r")?,
        b'\t' => f.write_str("\\t")?,
        b'\0' => f.write_str("\\0")?,
        b'\\' | b'"' => write!(f, "\\{}", b as char)?,
        0x20..=0x7e => write!(f, "{}", b as char)?,
        _ => write!(f, "\\x{:02x}", b)?,
      }
    }
    f.write_str("\"")
  }
}
