use core::str::FromStr;

use serde::{Deserialize, Serialize};

use rolegate_core::{DomainError, ValueObject};

/// One of the four actions a user may be granted on a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Read,
    Write,
    Delete,
    Share,
}

impl Capability {
    /// All capabilities, in matrix column order.
    pub const ALL: [Capability; 4] = [
        Capability::Read,
        Capability::Write,
        Capability::Delete,
        Capability::Share,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Read => "read",
            Capability::Write => "write",
            Capability::Delete => "delete",
            Capability::Share => "share",
        }
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Capability::Read),
            "write" => Ok(Capability::Write),
            "delete" => Ok(Capability::Delete),
            "share" => Ok(Capability::Share),
            other => Err(DomainError::validation(format!("unknown capability '{other}'"))),
        }
    }
}

/// Capability set for a single module.
///
/// The four bits are stored independently; which combinations are legal is
/// decided by [`crate::rules`], not by this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Permission {
    pub read: bool,
    pub write: bool,
    pub delete: bool,
    pub share: bool,
}

impl ValueObject for Permission {}

impl Permission {
    pub const NONE: Permission = Permission {
        read: false,
        write: false,
        delete: false,
        share: false,
    };

    pub const ALL: Permission = Permission {
        read: true,
        write: true,
        delete: true,
        share: true,
    };

    pub fn get(&self, capability: Capability) -> bool {
        match capability {
            Capability::Read => self.read,
            Capability::Write => self.write,
            Capability::Delete => self.delete,
            Capability::Share => self.share,
        }
    }

    /// Set a single bit with no cascade.
    pub fn set(&mut self, capability: Capability, value: bool) {
        let bit = match capability {
            Capability::Read => &mut self.read,
            Capability::Write => &mut self.write,
            Capability::Delete => &mut self.delete,
            Capability::Share => &mut self.share,
        };
        *bit = value;
    }

    /// Builder form of [`Permission::set`].
    pub fn with(mut self, capability: Capability, value: bool) -> Self {
        self.set(capability, value);
        self
    }

    /// Set a bit, then clear whatever depended on it.
    ///
    /// Cascades only run when a bit is cleared: clearing `read` clears
    /// `write`, `delete` and `share`; clearing `write` clears `delete`.
    /// Setting a bit never touches the others.
    pub fn set_with_cascade(&mut self, capability: Capability, value: bool) {
        self.set(capability, value);
        if value {
            return;
        }

        match capability {
            Capability::Read => {
                self.write = false;
                self.delete = false;
                self.share = false;
            }
            Capability::Write => self.delete = false,
            Capability::Delete | Capability::Share => {}
        }
    }

    /// Granted capabilities, in column order.
    pub fn granted(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| self.get(*c))
            .collect()
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let granted = self.granted();
        if granted.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<&str> = granted.iter().map(|c| c.as_str()).collect();
        f.write_str(&names.join(", "))
    }
}
