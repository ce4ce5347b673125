use super::{Eof, EofDecodeError, EofHeader, TypesSection};
use primitives::Bytes;
use std::vec::Vec;

/// EOF container body.
///
/// Contains types, code and data sections.
///
/// Can be used to create a new EOF container using the [`into_eof`](EofBody::into_eof) method.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EofBody {
    /// Container version written into the header.
    pub version: u8,
    /// One signature per code section.
    ///
    /// If [`EofBody::is_types_implicit`] is set it holds the synthesized `(0, 0)` entry.
    pub types_section: Vec<TypesSection>,
    /// Index of the end of each code section, exclusive.
    pub code_section: Vec<usize>,
    /// Concatenated code sections.
    pub code: Bytes,
    /// Data section, empty if it is absent.
    pub data_section: Bytes,
    /// Types section is not encoded in the container.
    pub is_types_implicit: bool,
}

impl EofBody {
    /// Returns the code section at the given index.
    pub fn code(&self, index: usize) -> Option<Bytes> {
        let end = *self.code_section.get(index)?;
        let start = self.eof_code_section_start(index)?;
        Some(self.code.slice(start..end))
    }

    /// Returns the code section at the given index as a slice.
    pub fn code_slice(&self, index: usize) -> Option<&[u8]> {
        let end = *self.code_section.get(index)?;
        let start = self.eof_code_section_start(index)?;
        self.code.get(start..end)
    }

    /// Returns the number of code sections.
    #[inline]
    pub fn code_count(&self) -> usize {
        self.code_section.len()
    }

    /// Returns offset of the start of indexed code section.
    ///
    /// First code section starts at 0.
    pub fn eof_code_section_start(&self, idx: usize) -> Option<usize> {
        if idx == 0 {
            return Some(0);
        }
        self.code_section.get(idx - 1).cloned()
    }

    /// Creates an EOF container from this body.
    ///
    /// Sizes are truncated to `u16`, the result should be validated if the body
    /// was not built from a decoded container.
    pub fn into_eof(self) -> Eof {
        let mut prev_value = 0;
        let header = EofHeader {
            version: self.version,
            types_size: if self.is_types_implicit {
                0
            } else {
                (self.types_section.len() * TypesSection::SIZE) as u16
            },
            code_sizes: self
                .code_section
                .iter()
                .map(|x| {
                    let ret = (x - prev_value) as u16;
                    prev_value = *x;
                    ret
                })
                .collect(),
            data_size: self.data_section.len() as u16,
            sum_code_sizes: self.code.len(),
        };
        let mut buffer = Vec::with_capacity(header.size() + header.body_size());
        header.encode(&mut buffer);
        self.encode(&mut buffer);
        Eof {
            header,
            body: self,
            raw: buffer.into(),
        }
    }

    /// Encodes this body into the given buffer.
    pub fn encode(&self, buffer: &mut Vec<u8>) {
        if !self.is_types_implicit {
            for types_section in &self.types_section {
                types_section.encode(buffer);
            }
        }

        buffer.extend_from_slice(&self.code);
        buffer.extend_from_slice(&self.data_section);
    }

    /// Decodes an EOF container body from the given buffer and header.
    ///
    /// The declared sections must tile the rest of the buffer exactly.
    pub fn decode(input: &Bytes, header: &EofHeader) -> Result<Self, EofDecodeError> {
        let header_len = header.size();
        let full_len = header_len + header.body_size();

        if input.len() < full_len {
            return Err(EofDecodeError::MissingBody);
        }

        if input.len() > full_len {
            return Err(EofDecodeError::DanglingData);
        }

        let mut body = EofBody {
            version: header.version,
            is_types_implicit: !header.has_types_section(),
            ..Default::default()
        };

        let mut types_input = &input[header_len..];
        for _ in 0..header.types_count() {
            let (types_section, local_input) = TypesSection::decode(types_input)?;
            types_input = local_input;
            body.types_section.push(types_section);
        }

        if body.is_types_implicit {
            body.types_section.push(TypesSection::default());
        } else if !body.types_section[0].is_entry_signature() {
            return Err(EofDecodeError::InvalidFirstTypeEntry);
        }

        // extract code section
        let start = header_len + header.types_size as usize;
        let mut code_end = 0;
        for size in header.code_sizes.iter().map(|x| *x as usize) {
            code_end += size;
            body.code_section.push(code_end);
        }
        body.code = input.slice(start..start + header.sum_code_sizes);

        body.data_section = input.slice(start + header.sum_code_sizes..);

        Ok(body)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use primitives::{bytes, hex};

    #[test]
    fn code_sections_are_sliced() {
        let raw = bytes!("ef00010300060100010100020100030000000000000000e3e3e4e4e4");
        let (header, _) = EofHeader::decode(&raw).unwrap();
        let body = EofBody::decode(&raw, &header).unwrap();
        assert_eq!(body.code_count(), 3);
        assert_eq!(body.code_section, vec![1, 3, 6]);
        assert_eq!(body.code(0).unwrap(), bytes!("00"));
        assert_eq!(body.code(1).unwrap(), bytes!("e3e3"));
        assert_eq!(body.code(2).unwrap(), bytes!("e4e4e4"));
        assert_eq!(body.code(3), None);
        assert_eq!(body.code_slice(1), Some(&[0xe3, 0xe3][..]));
        assert_eq!(body.code_slice(3), None);
        assert_eq!(body.eof_code_section_start(2), Some(3));
        assert!(body.data_section.is_empty());
    }

    #[test]
    fn implicit_types_entry_is_synthesized() {
        let raw = bytes!("ef00010100010200020000aabb");
        let (header, _) = EofHeader::decode(&raw).unwrap();
        let body = EofBody::decode(&raw, &header).unwrap();
        assert!(body.is_types_implicit);
        assert_eq!(body.types_section, vec![TypesSection::new(0, 0)]);
        assert_eq!(body.data_section, bytes!("aabb"));
        assert_eq!(body.into_eof().raw, raw);
    }

    #[test]
    fn body_must_tile_the_input() {
        let raw = hex!("ef000103000201000100000000");
        let (header, _) = EofHeader::decode(&raw).unwrap();

        let short = Bytes::copy_from_slice(&raw[..raw.len() - 1]);
        assert_eq!(
            EofBody::decode(&short, &header),
            Err(EofDecodeError::MissingBody)
        );

        let mut long = raw.to_vec();
        long.push(0x00);
        assert_eq!(
            EofBody::decode(&long.into(), &header),
            Err(EofDecodeError::DanglingData)
        );

        assert!(EofBody::decode(&Bytes::copy_from_slice(&raw), &header).is_ok());
    }

    #[test]
    fn first_entry_must_be_zero_zero() {
        let raw = bytes!("ef0001030002010001000100fe");
        let (header, _) = EofHeader::decode(&raw).unwrap();
        assert_eq!(
            EofBody::decode(&raw, &header),
            Err(EofDecodeError::InvalidFirstTypeEntry)
        );
    }
}
