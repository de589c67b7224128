use crate::wifi::{Encryption, WifiMode};

/// Reasons an invocation is refused, either locally or by the module.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// The command string was empty, nothing was sent
    Empty,
    /// The module answered with `ERROR`
    Rejected,
}

/// A command that was understood but could not be carried out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Failure {
    /// The module answered with `FAIL`
    Module,
    /// The operation requires an access point mode
    WrongMode(WifiMode),
    /// Access point passwords must be 8 to 64 characters long
    InvalidPassword(usize),
    /// Wi-Fi channels range from 1 to 14
    InvalidChannel(u8),
    /// WEP cannot be used for the soft access point
    InvalidEncryption(Encryption),
    EmptyPayload,
    PayloadTooLarge(usize),
}

/// Errors returned by the crate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Serial read error
    Read,
    /// Serial write error
    Write,
    /// A bounded buffer ran out of space
    Overflow,
    /// Malformed invocation or an `ERROR` reply
    Command(CommandError),
    /// `FAIL` reply or a violated precondition
    Failure(Failure),
    /// Wi-Fi mode outside of station, access point or both
    UnknownMode(i32),
    /// The reply did not contain the line the caller needs
    ResponseTooShort { expected: usize, received: usize },
    /// Failed to parse received response
    Parse,
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

impl From<Failure> for Error {
    fn from(f: Failure) -> Self {
        Self::Failure(f)
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Read => f.write_str("serial read error"),
            Error::Write => f.write_str("serial write error"),
            Error::Overflow => f.write_str("response buffer overflow"),
            Error::Command(CommandError::Empty) => f.write_str("empty command"),
            Error::Command(CommandError::Rejected) => f.write_str("command error"),
            Error::Failure(Failure::Module) => f.write_str("command failed"),
            Error::Failure(Failure::WrongMode(mode)) => {
                write!(f, "wifi not set to an access point mode ({})", mode.name())
            }
            Error::Failure(Failure::InvalidPassword(len)) => {
                write!(f, "wrong password length {} (8..64)", len)
            }
            Error::Failure(Failure::InvalidChannel(ch)) => write!(f, "invalid wifi channel {}", ch),
            Error::Failure(Failure::InvalidEncryption(enc)) => {
                write!(f, "invalid encryption protocol {}", enc.name())
            }
            Error::Failure(Failure::EmptyPayload) => f.write_str("nothing to send"),
            Error::Failure(Failure::PayloadTooLarge(len)) => {
                write!(f, "payload of {} bytes exceeds 2048", len)
            }
            Error::UnknownMode(mode) => write!(f, "mode '{}' not known", mode),
            Error::ResponseTooShort { expected, received } => write!(
                f,
                "response too short: expected at least {} lines, received {}",
                expected, received
            ),
            Error::Parse => f.write_str("unexpected response format"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
