//! Module that contains the verification logic for the EOF bytecode.

use crate::eof::{
    analyze_code, CodeAnalysis, Eof, EofBody, EofConfig, EofDecodeError, EofHeader, JumpTable,
    RawHeader, TypesSection,
};
use log::debug;
use primitives::Bytes;
use std::{fmt, vec::Vec};

/// Decodes `raw` into an [`Eof`] container and validates it with the default [`EofConfig`].
pub fn validate(raw: Bytes) -> Result<ValidatedEof, EofError> {
    validate_with_config(raw, &EofConfig::default())
}

/// Decodes `raw` into an [`Eof`] container and validates it.
///
/// Validation is all-or-nothing, the first error found is returned.
pub fn validate_with_config(raw: Bytes, config: &EofConfig) -> Result<ValidatedEof, EofError> {
    if !config.is_size_allowed(raw.len()) {
        debug!("container of {} bytes is over the size limit", raw.len());
        return Err(EofDecodeError::ContainerTooLarge.into());
    }

    let RawHeader {
        version,
        descriptors,
        size,
    } = EofHeader::decode_descriptors(&raw).inspect_err(|e| debug!("invalid header: {e}"))?;

    if !config.is_version_allowed(version) {
        debug!("version {version} is not accepted");
        return Err(EofDecodeError::InvalidVersion.into());
    }

    let header = EofHeader::from_descriptors(version, &descriptors)
        .inspect_err(|e| debug!("invalid section layout: {e}"))?;
    debug_assert_eq!(size, header.size());

    let body =
        EofBody::decode(&raw, &header).inspect_err(|e| debug!("invalid body: {e}"))?;

    let eof = Eof { header, body, raw };
    let code_analysis = validate_eof_codes(&eof)?;
    Ok(ValidatedEof { eof, code_analysis })
}

/// Analyzes every code section, then checks the references between them.
///
/// Returns one [`CodeAnalysis`] per code section.
pub fn validate_eof_codes(eof: &Eof) -> Result<Vec<CodeAnalysis>, EofValidationError> {
    let code_count = eof.body.code_count();
    let mut analyses = Vec::with_capacity(code_count);

    for index in 0..code_count {
        let Some(code) = eof.body.code(index) else {
            return Err(EofValidationError::InvalidSectionId);
        };
        let analysis = analyze_code(&code)
            .inspect_err(|e| debug!("code section {index} is invalid: {e}"))?;
        analyses.push(analysis);
    }

    check_code_references(&analyses)?;
    Ok(analyses)
}

/// Checks references that cross instruction or section boundaries.
///
/// * Every `CALLF` targets an existing code section.
/// * No relative jump lands on immediate bytes or on a `CALLF` operand.
pub fn check_code_references(analyses: &[CodeAnalysis]) -> Result<(), EofValidationError> {
    for (index, analysis) in analyses.iter().enumerate() {
        for call in &analysis.calls {
            if call.section as usize >= analyses.len() {
                debug!(
                    "CALLF at {} of section {index} calls missing section {}",
                    call.pc, call.section
                );
                return Err(EofValidationError::InvalidSectionId);
            }
        }

        for jump in &analysis.relative_jumps {
            if analysis.jump_table.is_valid(jump.target) {
                continue;
            }
            debug!(
                "jump at {} of section {index} lands inside an instruction at {}",
                jump.pc, jump.target
            );
            if analysis.call_operand_at(jump.target).is_some() {
                return Err(EofValidationError::JumpToCallOperand);
            }
            return Err(EofValidationError::JumpToImmediateBytes);
        }
    }
    Ok(())
}

/// EOF container that passed every validation step.
///
/// Can only be created by the validation functions of this module.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ValidatedEof {
    eof: Eof,
    code_analysis: Vec<CodeAnalysis>,
}

impl ValidatedEof {
    /// Returns the validated container.
    #[inline]
    pub fn eof(&self) -> &Eof {
        &self.eof
    }

    /// Consumes self and returns the container.
    #[inline]
    pub fn into_eof(self) -> Eof {
        self.eof
    }

    /// Returns the raw bytes of the container.
    #[inline]
    pub fn raw(&self) -> &Bytes {
        &self.eof.raw
    }

    /// Returns number of code sections.
    #[inline]
    pub fn code_count(&self) -> usize {
        self.code_analysis.len()
    }

    /// Returns the code section at `idx`.
    #[inline]
    pub fn code(&self, idx: usize) -> Option<Bytes> {
        self.eof.body.code(idx)
    }

    /// Returns the code section at `idx` as a slice.
    #[inline]
    pub fn code_slice(&self, idx: usize) -> Option<&[u8]> {
        self.eof.body.code_slice(idx)
    }

    /// Returns the signature of the code section at `idx`.
    #[inline]
    pub fn types(&self, idx: usize) -> Option<&TypesSection> {
        self.eof.types(idx)
    }

    /// Returns the analysis of the code section at `idx`.
    #[inline]
    pub fn code_analysis(&self, idx: usize) -> Option<&CodeAnalysis> {
        self.code_analysis.get(idx)
    }

    /// Returns the jump table of the code section at `idx`.
    #[inline]
    pub fn jump_table(&self, idx: usize) -> Option<&JumpTable> {
        self.code_analysis(idx).map(|analysis| &analysis.jump_table)
    }
}

/// EOF Error
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EofError {
    /// Decoding error.
    Decode(EofDecodeError),
    /// Validation Error.
    Validation(EofValidationError),
}

impl EofError {
    /// Returns `true` if the header could not be read.
    pub const fn is_header_error(&self) -> bool {
        matches!(self, Self::Decode(e) if e.is_header_error())
    }

    /// Returns `true` if the section layout is wrong.
    pub const fn is_structural_error(&self) -> bool {
        matches!(self, Self::Decode(e) if e.is_structural_error())
    }

    /// Returns `true` if a code section is invalid.
    pub const fn is_code_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<EofDecodeError> for EofError {
    fn from(err: EofDecodeError) -> Self {
        EofError::Decode(err)
    }
}

impl From<EofValidationError> for EofError {
    fn from(err: EofValidationError) -> Self {
        EofError::Validation(err)
    }
}

impl fmt::Display for EofError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EofError::Decode(e) => write!(f, "Bytecode decode error: {e}"),
            EofError::Validation(e) => write!(f, "Bytecode validation error: {e}"),
        }
    }
}

impl core::error::Error for EofError {}

/// EOF Validation Error
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EofValidationError {
    /// Opcode is not defined in EOF code. Includes legacy-only opcodes like JUMP.
    UndefinedInstruction,
    /// Bytecode is too small and is missing immediate bytes for instruction
    TruncatedImmediate,
    /// Last instruction should be terminating
    MissingTerminatingInstruction,
    /// Jump destination is before the section start.
    JumpUnderflow,
    /// Jump destination is at or after the section end.
    JumpOverflow,
    /// Invalid jump into immediate bytes
    JumpToImmediateBytes,
    /// Invalid jump into the operand of a CALLF
    JumpToCallOperand,
    /// CALLF section out of bounds
    InvalidSectionId,
}

impl fmt::Display for EofValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UndefinedInstruction => "Opcode is not defined",
            Self::TruncatedImmediate => "Bytecode is missing immediate bytes",
            Self::MissingTerminatingInstruction => {
                "Last instruction of bytecode is not terminating"
            }
            Self::JumpUnderflow => "Jump destination is too low",
            Self::JumpOverflow => "Jump destination is too high",
            Self::JumpToImmediateBytes => "Jump into immediate bytes",
            Self::JumpToCallOperand => "Jump into CALLF operand",
            Self::InvalidSectionId => "CALLF index is out of bounds",
        };
        f.write_str(s)
    }
}

impl core::error::Error for EofValidationError {}

#[cfg(test)]
mod test {
    use super::*;
    use primitives::{bytes, hex, MAX_CODE_SECTIONS};
    use rstest::rstest;

    fn container(types: &[(u8, u8)], codes: &[&[u8]], data: &[u8]) -> Bytes {
        let mut body = EofBody {
            version: 1,
            types_section: types.iter().map(|(i, o)| TypesSection::new(*i, *o)).collect(),
            data_section: Bytes::copy_from_slice(data),
            is_types_implicit: types.is_empty(),
            ..Default::default()
        };
        if body.is_types_implicit {
            body.types_section.push(TypesSection::default());
        }
        let mut code = Vec::new();
        for section in codes {
            code.extend_from_slice(section);
            body.code_section.push(code.len());
        }
        body.code = code.into();
        body.into_eof().raw
    }

    #[test]
    fn hand_built_bodies_go_through_structural_checks() {
        let body = EofBody {
            version: 1,
            types_section: vec![TypesSection::new(1, 0)],
            code_section: vec![1],
            code: bytes!("00"),
            ..Default::default()
        };
        let eof = body.into_eof();
        assert_eq!(
            validate(eof.raw),
            Err(EofError::Decode(EofDecodeError::InvalidFirstTypeEntry))
        );

        let body = EofBody {
            version: 1,
            code_section: vec![1, 2],
            code: bytes!("0000"),
            ..Default::default()
        };
        let eof = body.into_eof();
        assert_eq!(
            validate(eof.raw),
            Err(EofError::Decode(EofDecodeError::MissingTypeSection))
        );
    }

    #[test]
    fn scenario_a_single_code_section() {
        // PUSH1 0x01, STOP
        let raw = bytes!("ef000101000300600100");
        let validated = validate(raw.clone()).unwrap();
        assert_eq!(validated.code_count(), 1);
        assert_eq!(validated.code(0).unwrap(), bytes!("600100"));
        assert_eq!(validated.types(0), Some(&TypesSection::new(0, 0)));
        assert_eq!(validated.raw(), &raw);
    }

    #[test]
    fn scenario_b_not_terminating() {
        // PUSH1 0x01, PUSH0
        let raw = bytes!("ef00010100030060015f");
        assert_eq!(
            validate(raw),
            Err(EofError::Validation(
                EofValidationError::MissingTerminatingInstruction
            ))
        );
    }

    #[test]
    fn scenario_c_truncated_body() {
        let err = validate(bytes!("ef0001010003006001")).unwrap_err();
        assert_eq!(err, EofError::Decode(EofDecodeError::MissingBody));
        assert!(err.is_structural_error());
    }

    #[test]
    fn scenario_d_data_before_code() {
        let err = validate(bytes!("ef000102000101000100aa00")).unwrap_err();
        assert_eq!(err, EofError::Decode(EofDecodeError::DataBeforeCode));
    }

    #[test]
    fn scenario_e_call_past_last_section() {
        // Section 0 calls section 2 while only two sections exist.
        let raw = container(&[(0, 0), (0, 0)], &[&hex!("b0000200"), &hex!("b1")], &[]);
        assert_eq!(
            validate(raw),
            Err(EofError::Validation(EofValidationError::InvalidSectionId))
        );

        let raw = container(&[(0, 0), (0, 0)], &[&hex!("b0000100"), &hex!("b1")], &[]);
        assert!(validate(raw).is_ok());
    }

    #[rstest]
    #[case::into_push_immediate(&hex!("5c0001600000"), EofValidationError::JumpToImmediateBytes)]
    #[case::into_rjumpi_immediate(&hex!("60005d00005cfffc"), EofValidationError::JumpToImmediateBytes)]
    #[case::into_callf_operand(&hex!("5c0001b0000000"), EofValidationError::JumpToCallOperand)]
    #[case::into_second_callf_byte(&hex!("5c0002b0000000"), EofValidationError::JumpToCallOperand)]
    fn jumps_inside_instructions(#[case] code: &[u8], #[case] expected: EofValidationError) {
        let raw = container(&[], &[code], &[]);
        assert_eq!(validate(raw), Err(EofError::Validation(expected)));
    }

    #[test]
    fn round_trip_and_idempotence() {
        let raw = container(
            &[(0, 0), (2, 1), (1, 0)],
            &[
                &hex!("6001600260035fb0000150b0000200"),
                &hex!("01b1"),
                &hex!("50b1"),
            ],
            &hex!("deadbeef"),
        );
        let first = validate(raw.clone()).unwrap();
        let second = validate(raw.clone()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.eof().encode_slow(), raw);
        assert_eq!(first.eof().data(), &hex!("deadbeef"));
        assert_eq!(
            first.code_analysis(0).unwrap().calls.len(),
            2
        );
    }

    #[test]
    fn every_section_ends_with_a_terminating_instruction() {
        let raw = container(
            &[(0, 0), (0, 0)],
            &[&hex!("b000015cfffa"), &hex!("b1")],
            &[],
        );
        let validated = validate(raw).unwrap();
        for idx in 0..validated.code_count() {
            let analysis = validated.code_analysis(idx).unwrap();
            let last = analysis.last_instruction().unwrap();
            let info = crate::opcode::OpCode::info_by_op(last.opcode).unwrap();
            assert!(info.is_terminating());
        }
    }

    #[test]
    fn code_section_limit() {
        let types = vec![(0u8, 0u8); MAX_CODE_SECTIONS];
        let codes = vec![&[0x00u8][..]; MAX_CODE_SECTIONS];
        let validated = validate(container(&types, &codes, &[])).unwrap();
        assert_eq!(validated.code_count(), MAX_CODE_SECTIONS);

        let types = vec![(0u8, 0u8); MAX_CODE_SECTIONS + 1];
        let codes = vec![&[0x00u8][..]; MAX_CODE_SECTIONS + 1];
        assert_eq!(
            validate(container(&types, &codes, &[])),
            Err(EofError::Decode(EofDecodeError::TooManyCodeSections))
        );
    }

    #[rstest]
    #[case::types_for_two(bytes!("ef000103000401000100000000"), EofDecodeError::InvalidTypeSectionSize)]
    #[case::two_code_no_types(bytes!("ef0001010001010001000000"), EofDecodeError::MissingTypeSection)]
    #[case::dangling(bytes!("ef0001010001000000"), EofDecodeError::DanglingData)]
    #[case::first_entry(bytes!("ef000103000201000100010000"), EofDecodeError::InvalidFirstTypeEntry)]
    #[case::legacy(bytes!("6001600055"), EofDecodeError::InvalidMagic)]
    fn decode_errors(#[case] raw: Bytes, #[case] expected: EofDecodeError) {
        assert_eq!(validate(raw), Err(EofError::Decode(expected)));
    }

    #[test]
    fn config_limits() {
        let raw = container(&[], &[&hex!("00")], &[0u8; 64]);

        let config = EofConfig::default().with_limit_container_size(raw.len() - 1);
        assert_eq!(
            validate_with_config(raw.clone(), &config),
            Err(EofError::Decode(EofDecodeError::ContainerTooLarge))
        );
        let config = EofConfig::default().with_limit_container_size(raw.len());
        assert!(validate_with_config(raw.clone(), &config).is_ok());

        let config = EofConfig::default().with_version(2);
        let err = validate_with_config(raw.clone(), &config).unwrap_err();
        assert_eq!(err, EofError::Decode(EofDecodeError::InvalidVersion));
        assert!(err.is_header_error());

        assert!(validate_with_config(raw, &EofConfig::with_initcode_limit()).is_ok());
    }

    #[test]
    fn max_size_code_section() {
        let code = vec![0x00u8; u16::MAX as usize];
        let raw = container(&[], &[&code], &[]);
        assert_eq!(&raw[..8], &hex!("ef000101ffff0000"));
        let validated = validate(raw).unwrap();
        assert_eq!(validated.code_slice(0).map(<[u8]>::len), Some(0xffff));
        assert!(validated.jump_table(0).unwrap().is_valid(0xfffe));
    }

    #[test]
    fn any_non_zero_version_is_accepted() {
        let validated = validate(bytes!("ef00070100010000")).unwrap();
        assert_eq!(validated.eof().version(), 7);
    }
}
