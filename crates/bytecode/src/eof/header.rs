use super::{
    decode_helpers::{consume_u16, consume_u8},
    EofDecodeError, EOF_MAGIC,
};
use core::fmt;
use primitives::MAX_CODE_SECTIONS;
use std::vec::Vec;

/// Kind byte that terminates the list of section descriptors.
pub const KIND_TERMINAL: u8 = 0;
/// Kind byte of a code section.
pub const KIND_CODE: u8 = 1;
/// Kind byte of the data section.
pub const KIND_DATA: u8 = 2;
/// Kind byte of the types section.
pub const KIND_TYPES: u8 = 3;

/// Known kinds of EOF sections.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SectionKind {
    /// Function signatures, one entry per code section.
    Type,
    /// Executable code of one function.
    Code,
    /// Raw bytes, never executed.
    Data,
}

impl SectionKind {
    /// Maps a header kind byte to a section kind.
    ///
    /// Returns `None` for the terminator and for unknown kinds.
    #[inline]
    pub const fn from_u8(kind: u8) -> Option<Self> {
        match kind {
            KIND_TYPES => Some(Self::Type),
            KIND_CODE => Some(Self::Code),
            KIND_DATA => Some(Self::Data),
            _ => None,
        }
    }

    /// Returns the kind byte used in the header.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Type => KIND_TYPES,
            Self::Code => KIND_CODE,
            Self::Data => KIND_DATA,
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Type => "type",
            Self::Code => "code",
            Self::Data => "data",
        })
    }
}

/// A `(kind, size)` pair as read from the header, before any structural check.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SectionDescriptor {
    /// Raw kind byte.
    pub kind: u8,
    /// Section size in bytes, never zero.
    pub size: u16,
}

impl SectionDescriptor {
    /// Creates a new descriptor.
    pub const fn new(kind: u8, size: u16) -> Self {
        Self { kind, size }
    }
}

/// Raw header as read by [`EofHeader::decode_descriptors`].
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct RawHeader {
    /// Container version, never zero.
    pub version: u8,
    /// Descriptors in encounter order.
    pub descriptors: Vec<SectionDescriptor>,
    /// Number of header bytes including the terminator.
    pub size: usize,
}

/// EOF header structure that contains section sizes and metadata.
///
/// Absent optional sections are stored with size zero, a size that can't be declared.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EofHeader {
    /// Container version.
    pub version: u8,
    /// Size of the types section, `0` if it is absent.
    pub types_size: u16,
    /// Sizes of the code sections.
    pub code_sizes: Vec<u16>,
    /// Size of the data section, `0` if it is absent.
    pub data_size: u16,
    /// Sum of the code sizes.
    pub sum_code_sizes: usize,
}

impl EofHeader {
    /// Length of the header in bytes.
    ///
    /// It is minimum 7 bytes: magic, version, one code descriptor and the terminator.
    pub fn size(&self) -> usize {
        let optional = usize::from(self.has_types_section()) + usize::from(self.has_data_section());
        // magic + version
        3 +
        // one (kind, size) triple per section
        3 * (self.code_sizes.len() + optional) +
        // terminator
        1
    }

    /// Returns the size of the body in bytes.
    pub fn body_size(&self) -> usize {
        self.types_size as usize + self.sum_code_sizes + self.data_size as usize
    }

    /// Returns `true` if the header declares a types section.
    #[inline]
    pub const fn has_types_section(&self) -> bool {
        self.types_size != 0
    }

    /// Returns `true` if the header declares a data section.
    #[inline]
    pub const fn has_data_section(&self) -> bool {
        self.data_size != 0
    }

    /// Returns number of encoded types section entries.
    pub fn types_count(&self) -> usize {
        self.types_size as usize / 2
    }

    /// Encodes the header into the buffer.
    pub fn encode(&self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(&EOF_MAGIC.to_be_bytes());
        buffer.push(self.version);
        if self.has_types_section() {
            buffer.push(KIND_TYPES);
            buffer.extend_from_slice(&self.types_size.to_be_bytes());
        }
        for size in &self.code_sizes {
            buffer.push(KIND_CODE);
            buffer.extend_from_slice(&size.to_be_bytes());
        }
        if self.has_data_section() {
            buffer.push(KIND_DATA);
            buffer.extend_from_slice(&self.data_size.to_be_bytes());
        }
        buffer.push(KIND_TERMINAL);
    }

    /// Reads magic, version and the `(kind, size)` descriptors up to the terminator.
    ///
    /// Unknown kinds are accepted here, ordering is checked by [`EofHeader::from_descriptors`].
    pub fn decode_descriptors(input: &[u8]) -> Result<RawHeader, EofDecodeError> {
        let total = input.len();

        let Some((magic, input)) = input.split_first_chunk::<2>() else {
            return Err(EofDecodeError::InvalidMagic);
        };
        if u16::from_be_bytes(*magic) != EOF_MAGIC {
            return Err(EofDecodeError::InvalidMagic);
        }

        let (mut input, version) = consume_u8(input).ok_or(EofDecodeError::MissingVersion)?;
        if version == 0 {
            return Err(EofDecodeError::InvalidVersion);
        }

        let mut descriptors = Vec::new();
        loop {
            let (rest, kind) = consume_u8(input).ok_or(EofDecodeError::MissingTerminator)?;
            input = rest;
            if kind == KIND_TERMINAL {
                break;
            }
            let (rest, size) = consume_u16(input).ok_or(EofDecodeError::ShortInputForSize)?;
            input = rest;
            if size == 0 {
                return Err(EofDecodeError::ZeroSectionSize);
            }
            descriptors.push(SectionDescriptor::new(kind, size));
        }

        Ok(RawHeader {
            version,
            descriptors,
            size: total - input.len(),
        })
    }

    /// Checks the kind ordering and counts of the descriptors and builds the header.
    ///
    /// Errors are reported in rule order: unknown kind, data before code, code or data
    /// before types, duplicated sections, then the counts once all descriptors are seen.
    pub fn from_descriptors(
        version: u8,
        descriptors: &[SectionDescriptor],
    ) -> Result<Self, EofDecodeError> {
        let mut header = EofHeader {
            version,
            ..Default::default()
        };

        for descriptor in descriptors {
            let Some(kind) = SectionKind::from_u8(descriptor.kind) else {
                return Err(EofDecodeError::UnknownSectionKind);
            };
            match kind {
                SectionKind::Type => {
                    if !header.code_sizes.is_empty() || header.has_data_section() {
                        return Err(EofDecodeError::CodeOrDataBeforeType);
                    }
                    if header.has_types_section() {
                        return Err(EofDecodeError::MultipleTypeSections);
                    }
                    header.types_size = descriptor.size;
                }
                SectionKind::Code => {
                    if header.has_data_section() {
                        return Err(EofDecodeError::CodeAfterData);
                    }
                    header.code_sizes.push(descriptor.size);
                    header.sum_code_sizes += descriptor.size as usize;
                }
                SectionKind::Data => {
                    if header.code_sizes.is_empty() {
                        return Err(EofDecodeError::DataBeforeCode);
                    }
                    if header.has_data_section() {
                        return Err(EofDecodeError::MultipleDataSections);
                    }
                    header.data_size = descriptor.size;
                }
            }
        }

        let code_count = header.code_sizes.len();
        if code_count == 0 {
            return Err(EofDecodeError::NoCodeSection);
        }
        if code_count > MAX_CODE_SECTIONS {
            return Err(EofDecodeError::TooManyCodeSections);
        }
        if header.has_types_section() {
            if header.types_size as usize != 2 * code_count {
                return Err(EofDecodeError::InvalidTypeSectionSize);
            }
        } else if code_count != 1 {
            return Err(EofDecodeError::MissingTypeSection);
        }

        Ok(header)
    }

    /// Decodes EOF header from binary form.
    ///
    /// Returns the header and its size in bytes.
    pub fn decode(input: &[u8]) -> Result<(Self, usize), EofDecodeError> {
        let raw = Self::decode_descriptors(input)?;
        let header = Self::from_descriptors(raw.version, &raw.descriptors)?;
        Ok((header, raw.size))
    }
}
