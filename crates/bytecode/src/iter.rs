use crate::opcode::OpCode;

/// One decoded instruction as seen by [`EofCodeIterator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawInstruction<'a> {
    /// Offset of the opcode byte in the code section.
    pub pc: usize,
    /// Opcode byte, may be undefined.
    pub opcode: u8,
    /// Immediate bytes that follow the opcode.
    ///
    /// Shorter than declared if the section ends early.
    pub immediate: &'a [u8],
}

impl RawInstruction<'_> {
    /// Returns the opcode if it is defined in EOF code.
    #[inline]
    pub fn op(&self) -> Option<OpCode> {
        OpCode::new_eof(self.opcode)
    }

    /// Immediate size declared by the opcode table, `0` for undefined opcodes.
    #[inline]
    pub fn declared_immediate_size(&self) -> usize {
        self.op().map(|op| op.info().immediate_size() as usize).unwrap_or_default()
    }

    /// Returns `true` if the code section ends inside the immediate.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.immediate.len() < self.declared_immediate_size()
    }

    /// Offset of the byte after this instruction.
    #[inline]
    pub fn next_pc(&self) -> usize {
        self.pc + 1 + self.immediate.len()
    }
}

/// Iterator over the instructions of an EOF code section, skipping immediates.
///
/// Undefined opcodes are yielded with an empty immediate so the caller decides
/// whether to stop.
#[derive(Debug, Clone)]
pub struct EofCodeIterator<'a> {
    code: &'a [u8],
    pc: usize,
}

impl<'a> EofCodeIterator<'a> {
    /// Creates a new iterator over one code section.
    #[inline]
    pub fn new(code: &'a [u8]) -> Self {
        Self { code, pc: 0 }
    }

    /// Returns the current position in the code section.
    #[inline]
    pub fn position(&self) -> usize {
        self.pc
    }

    /// Returns the remaining bytes as a slice.
    #[inline]
    pub fn as_slice(&self) -> &'a [u8] {
        self.code.get(self.pc..).unwrap_or_default()
    }
}

impl<'a> Iterator for EofCodeIterator<'a> {
    type Item = RawInstruction<'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let (&opcode, rest) = self.as_slice().split_first()?;
        let size = OpCode::new_eof(opcode)
            .map(|op| op.info().immediate_size() as usize)
            .unwrap_or_default();
        let immediate = &rest[..size.min(rest.len())];
        let instruction = RawInstruction {
            pc: self.pc,
            opcode,
            immediate,
        };
        self.pc = instruction.next_pc();
        Some(instruction)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let byte_len = self.code.len().saturating_sub(self.pc);
        (byte_len.min(1), Some(byte_len))
    }
}

impl core::iter::FusedIterator for EofCodeIterator<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode;
    use primitives::hex;

    #[test]
    fn skips_immediates() {
        // PUSH1 0x01, RJUMPI +0, PUSH2 0x0203, STOP
        let code = hex!("60015d000061020300");
        let items: Vec<_> = EofCodeIterator::new(&code).collect();
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].opcode, opcode::PUSH1);
        assert_eq!(items[0].immediate, &[0x01]);
        assert_eq!(items[1].pc, 2);
        assert_eq!(items[1].immediate, &[0x00, 0x00]);
        assert_eq!(items[2].pc, 5);
        assert_eq!(items[2].immediate, &[0x02, 0x03]);
        assert_eq!(items[3].pc, 8);
        assert_eq!(items[3].next_pc(), code.len());
    }

    #[test]
    fn truncated_immediate_is_reported() {
        let code = hex!("0062ffff");
        let mut iter = EofCodeIterator::new(&code);
        assert!(!iter.next().unwrap().is_truncated());
        let push3 = iter.next().unwrap();
        assert!(push3.is_truncated());
        assert_eq!(push3.immediate, &[0xff, 0xff]);
        assert_eq!(iter.next(), None);
        assert_eq!(iter.position(), code.len());
    }

    #[test]
    fn undefined_opcodes_have_no_immediate() {
        // JUMP is disabled in EOF, 0x0C is undefined.
        let code = hex!("560c00");
        let items: Vec<_> = EofCodeIterator::new(&code).collect();
        assert_eq!(items.len(), 3);
        assert!(items[0].op().is_none());
        assert!(items[1].op().is_none());
        assert_eq!(items[2].op(), Some(OpCode::STOP));
    }
}
