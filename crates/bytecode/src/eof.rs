//! EVM Object Format container: decoding, encoding and validation.
mod analysis;
mod body;
mod config;
mod decode_helpers;
mod header;
pub mod printer;
mod types_section;
pub mod verification;

pub use analysis::{analyze_code, CallReference, CodeAnalysis, Instruction, JumpTable, RelativeJump};
pub use body::EofBody;
pub use config::EofConfig;
pub use header::{
    EofHeader, RawHeader, SectionDescriptor, SectionKind, KIND_CODE, KIND_DATA, KIND_TERMINAL,
    KIND_TYPES,
};
pub use types_section::TypesSection;
pub use verification::{EofError, EofValidationError, ValidatedEof};

use core::cmp::min;
use primitives::{bytes, Bytes};
use std::{fmt, vec, vec::Vec};

/// EOF Magic in u16 form.
pub const EOF_MAGIC: u16 = 0xEF00;

/// EOF magic number in array form.
pub static EOF_MAGIC_BYTES: Bytes = bytes!("ef00");

/// Version of the containers built by [`Eof::default`].
pub const EOF_VERSION: u8 = 1;

/// Returns `true` if the bytes start with the EOF magic.
///
/// Says nothing about validity, bytes without the magic are legacy code.
#[inline]
pub fn is_container_formatted(bytes: &[u8]) -> bool {
    bytes.starts_with(&EOF_MAGIC.to_be_bytes())
}

/// EVM Object Format (EOF) container.
///
/// It consists of a header, body and the raw original bytes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Eof {
    /// Decoded header.
    pub header: EofHeader,
    /// Sections of the container.
    pub body: EofBody,
    /// Bytes the container was decoded from.
    pub raw: Bytes,
}

impl Default for Eof {
    fn default() -> Self {
        let body = EofBody {
            version: EOF_VERSION,
            // Implicit (0, 0) signature of the only code section.
            types_section: vec![TypesSection::default()],
            // One code section with a STOP byte.
            code_section: vec![1],
            code: Bytes::from_static(&[0x00]),
            data_section: Bytes::new(),
            is_types_implicit: true,
        };
        body.into_eof()
    }
}

impl Eof {
    /// Creates a new EOF container from the given body.
    pub fn new(body: EofBody) -> Self {
        body.into_eof()
    }

    /// Returns len of the header and body in bytes.
    pub fn size(&self) -> usize {
        self.header.size() + self.header.body_size()
    }

    /// Return raw EOF bytes.
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// Returns the container version.
    pub fn version(&self) -> u8 {
        self.header.version
    }

    /// Returns a slice of the data section.
    ///
    /// If offset is greater than the length of the data section, an empty slice is returned.
    /// If len is greater than the remaining bytes, the slice is truncated.
    pub fn data_slice(&self, offset: usize, len: usize) -> &[u8] {
        self.body
            .data_section
            .get(offset..)
            .and_then(|bytes| bytes.get(..min(len, bytes.len())))
            .unwrap_or(&[])
    }

    /// Returns a slice of the data section.
    pub fn data(&self) -> &[u8] {
        &self.body.data_section
    }

    /// Returns the signature of the code section at `idx`.
    pub fn types(&self, idx: usize) -> Option<&TypesSection> {
        self.body.types_section.get(idx)
    }

    /// Slow encode EOF bytes.
    pub fn encode_slow(&self) -> Bytes {
        let mut buffer: Vec<u8> = Vec::with_capacity(self.size());
        self.header.encode(&mut buffer);
        self.body.encode(&mut buffer);
        buffer.into()
    }

    /// Decode EOF from raw bytes.
    ///
    /// Runs the header parser and the section assembler, code is not inspected.
    pub fn decode(raw: Bytes) -> Result<Self, EofDecodeError> {
        let (header, _) = EofHeader::decode(&raw)?;
        let body = EofBody::decode(&raw, &header)?;
        Ok(Self { header, body, raw })
    }
}

/// EOF decode errors.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EofDecodeError {
    /// Input does not start with `0xEF00`.
    InvalidMagic,
    /// Input ends right after the magic.
    MissingVersion,
    /// Version is zero or not the configured one.
    InvalidVersion,
    /// Input ended while a section kind was expected.
    MissingTerminator,
    /// Input ended inside a section size.
    ShortInputForSize,
    /// Section declared with size zero.
    ZeroSectionSize,
    /// Container is bigger than the configured limit.
    ContainerTooLarge,
    /// Unknown section kind in the header.
    UnknownSectionKind,
    /// Data section declared before any code section.
    DataBeforeCode,
    /// Types section declared after a code or data section.
    CodeOrDataBeforeType,
    /// More than one types section.
    MultipleTypeSections,
    /// More than one data section.
    MultipleDataSections,
    /// Code section declared after the data section.
    CodeAfterData,
    /// There should be at least one code section.
    NoCodeSection,
    /// More than 1024 code sections.
    TooManyCodeSections,
    /// Types section size is not two bytes per code section.
    InvalidTypeSectionSize,
    /// Types section is required when there is more than one code section.
    MissingTypeSection,
    /// Short body while processing EOF.
    MissingBody,
    /// Body size is more than specified in the header.
    DanglingData,
    /// First types entry is not `(0, 0)`.
    InvalidFirstTypeEntry,
}

impl EofDecodeError {
    /// Returns `true` if the error was raised while reading magic, version or section descriptors.
    pub const fn is_header_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidMagic
                | Self::MissingVersion
                | Self::InvalidVersion
                | Self::MissingTerminator
                | Self::ShortInputForSize
                | Self::ZeroSectionSize
                | Self::ContainerTooLarge
        )
    }

    /// Returns `true` if the header was readable but the section layout is wrong.
    pub const fn is_structural_error(&self) -> bool {
        !self.is_header_error()
    }
}

impl fmt::Display for EofDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidMagic => "Invalid EOF magic number",
            Self::MissingVersion => "Missing EOF version",
            Self::InvalidVersion => "Invalid EOF version",
            Self::MissingTerminator => "Missing header terminator",
            Self::ShortInputForSize => "Short input for section size",
            Self::ZeroSectionSize => "Section size cant be zero",
            Self::ContainerTooLarge => "Container size is over the limit",
            Self::UnknownSectionKind => "Unknown section kind",
            Self::DataBeforeCode => "Data section before code section",
            Self::CodeOrDataBeforeType => "Code or data section before types section",
            Self::MultipleTypeSections => "Multiple types sections",
            Self::MultipleDataSections => "Multiple data sections",
            Self::CodeAfterData => "Code section after data section",
            Self::NoCodeSection => "No code section",
            Self::TooManyCodeSections => "Too many code sections",
            Self::InvalidTypeSectionSize => "Invalid types section size",
            Self::MissingTypeSection => "Missing types section",
            Self::MissingBody => "Short body while processing EOF",
            Self::DanglingData => "Body size is more than specified in the header",
            Self::InvalidFirstTypeEntry => "First types entry must be (0, 0)",
        };
        f.write_str(s)
    }
}

impl core::error::Error for EofDecodeError {}
