use std::fmt;

/// A single instruction for the RFID reader firmware.
///
/// Each command travels as one ASCII byte, optionally followed by an argument
/// string. The reader needs no terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderCommand {
    /// Read the barcode (item identifier) stored on the tag
    ReadTag,
    /// Read the security flag of the tag
    GetSecurity,
    /// Turn the security flag on or off
    SetSecurity { on: bool },
    /// Write a new barcode to the tag
    WriteBarcode(String),
    /// Stop scanning for tags
    StopScanning,
}

impl ReaderCommand {
    pub fn command_byte(&self) -> u8 {
        match self {
            Self::ReadTag => b'1',
            Self::GetSecurity => b'2',
            Self::SetSecurity { on: true } => b'3',
            Self::SetSecurity { on: false } => b'4',
            Self::WriteBarcode(_) => b'5',
            Self::StopScanning => b'9',
        }
    }

    pub fn argument(&self) -> Option<&str> {
        match self {
            Self::WriteBarcode(barcode) => Some(barcode),
            _ => None,
        }
    }
}

impl fmt::Display for ReaderCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadTag => write!(f, "ReadTag"),
            Self::GetSecurity => write!(f, "GetSecurity"),
            Self::SetSecurity { on } => write!(f, "SetSecurity({})", on),
            Self::WriteBarcode(barcode) => write!(f, "WriteBarcode({})", barcode),
            Self::StopScanning => write!(f, "StopScanning"),
        }
    }
}
