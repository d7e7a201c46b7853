//! Permission flags of a mapping as printed in `/proc/<pid>/maps`

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// The `rwxp`/`rwxs` column of a maps line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Permissions {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
    /// Copy-on-write private mapping (`p`) as opposed to shared (`s`)
    pub private: bool,
}

impl Permissions {
    /// `rw-p`: the kind of mapping heap, stack and data segments use
    pub const READ_WRITE_PRIVATE: Self = Permissions {
        read: true,
        write: true,
        execute: false,
        private: true,
    };

    pub fn is_readable(&self) -> bool {
        self.read
    }

    pub fn is_writable(&self) -> bool {
        self.write
    }

    pub fn is_executable(&self) -> bool {
        self.execute
    }

    pub fn is_private(&self) -> bool {
        self.private
    }
}

impl FromStr for Permissions {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let b = s.as_bytes();
        if b.len() != 4 {
            return Err(format!("expected 4 permission flags, got {:?}", s));
        }

        let flag = |actual: u8, set: u8| -> Result<bool, String> {
            match actual {
                c if c == set => Ok(true),
                b'-' => Ok(false),
                _ => Err(format!("unexpected permission flag {:?} in {:?}", actual as char, s)),
            }
        };

        let private = match b[3] {
            b'p' => true,
            b's' => false,
            other => return Err(format!("unexpected sharing flag {:?} in {:?}", other as char, s)),
        };

        Ok(Permissions {
            read: flag(b[0], b'r')?,
            write: flag(b[1], b'w')?,
            execute: flag(b[2], b'x')?,
            private,
        })
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            if self.read { 'r' } else { '-' },
            if self.write { 'w' } else { '-' },
            if self.execute { 'x' } else { '-' },
            if self.private { 'p' } else { 's' },
        )
    }
}
