use crate::validation::ValidationError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// IBM i system object name: up to 10 characters, uppercase, first character
/// alphabetic or one of `$#@`.
const SYSTEM_NAME_PATTERN: &str = r"^[A-Z$#@][A-Z0-9$#@_.]{0,9}$";

macro_rules! newtype {
    ($name:ident, $doc:expr, $pattern:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new instance without validation; values decoded from host
            /// buffers go through here after trimming.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Parses a validated name from a string.
            pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
                let s = value.into();
                if !Regex::new($pattern).expect("invalid regex").is_match(&s) {
                    return Err(ValidationError::PatternMismatch {
                        field: stringify!($name),
                        value: s,
                    });
                }
                Ok(Self(s))
            }

            /// Returns true when the name is blank (the host sent spaces only).
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

newtype!(
    ObjectName,
    "IBM i system object name (file, library, member, journal or receiver).",
    SYSTEM_NAME_PATTERN
);

/// Splits `LIBRARY/NAME` into its two parts.
fn split_qualified(value: &str) -> Result<(&str, &str), ValidationError> {
    value
        .split_once('/')
        .ok_or_else(|| ValidationError::PatternMismatch {
            field: "qualified name",
            value: value.to_string(),
        })
}

/// Identity of a journal receiver: `(name, library)`.
///
/// This is the key for all receiver bookkeeping. Two receivers with the same
/// name in different libraries are different receivers.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JournalReceiver {
    /// Receiver object name.
    pub name: ObjectName,
    /// Library holding the receiver.
    pub library: ObjectName,
}

impl JournalReceiver {
    /// Creates a receiver identity without validation.
    pub fn new(name: impl Into<String>, library: impl Into<String>) -> Self {
        Self {
            name: ObjectName::new(name),
            library: ObjectName::new(library),
        }
    }

    /// Parses a validated receiver identity.
    pub fn parse(
        name: impl Into<String>,
        library: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            name: ObjectName::parse(name)?,
            library: ObjectName::parse(library)?,
        })
    }

    /// Parses `LIBRARY/RECEIVER` notation.
    pub fn parse_qualified(value: &str) -> Result<Self, ValidationError> {
        let (library, name) = split_qualified(value)?;
        Self::parse(name, library)
    }

    /// Returns true when neither name nor library is set.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.library.is_empty()
    }
}

impl fmt::Display for JournalReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.library, self.name)
    }
}

/// Identity of a journal: `(name, library)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JournalId {
    /// Journal object name.
    pub name: ObjectName,
    /// Library holding the journal.
    pub library: ObjectName,
}

impl JournalId {
    /// Creates a journal identity without validation.
    pub fn new(name: impl Into<String>, library: impl Into<String>) -> Self {
        Self {
            name: ObjectName::new(name),
            library: ObjectName::new(library),
        }
    }

    /// Parses a validated journal identity.
    pub fn parse(
        name: impl Into<String>,
        library: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            name: ObjectName::parse(name)?,
            library: ObjectName::parse(library)?,
        })
    }

    /// Parses `LIBRARY/JOURNAL` notation.
    pub fn parse_qualified(value: &str) -> Result<Self, ValidationError> {
        let (library, name) = split_qualified(value)?;
        Self::parse(name, library)
    }
}

impl fmt::Display for JournalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.library, self.name)
    }
}
