use crate::ExecutionFault;
use primitives::RETURN_STACK_LIMIT;
use std::vec::Vec;

/// Function return frame.
///
/// Needed information for returning from a function.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReturnFrame {
    /// Code section to continue in.
    pub section: usize,
    /// The program counter where execution should continue.
    pub pc: usize,
    /// Data stack height below the arguments of the called function.
    ///
    /// The called function can't read below it.
    pub stack_height: usize,
}

impl ReturnFrame {
    /// Return new function frame.
    pub const fn new(section: usize, pc: usize, stack_height: usize) -> Self {
        Self {
            section,
            pc,
            stack_height,
        }
    }
}

/// Return stack, bounded at [`RETURN_STACK_LIMIT`] frames.
///
/// A new stack holds the bottom frame `{0, 0, 0}` of the entry function.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReturnStack {
    frames: Vec<ReturnFrame>,
}

impl Default for ReturnStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ReturnStack {
    /// Returns new return stack with the bottom frame.
    pub fn new() -> Self {
        let mut frames = Vec::with_capacity(8);
        frames.push(ReturnFrame::default());
        Self { frames }
    }

    /// Number of frames, including the bottom frame.
    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` once the bottom frame was popped.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Returns the frame of the running function.
    #[inline]
    pub fn top(&self) -> Option<&ReturnFrame> {
        self.frames.last()
    }

    /// Stack height the running function can't read below.
    #[inline]
    pub fn stack_height(&self) -> usize {
        self.top().map_or(0, |frame| frame.stack_height)
    }

    /// Pushes a frame, failing with `ReturnStackOverflow` if the stack is full.
    #[inline]
    pub fn push(&mut self, frame: ReturnFrame) -> Result<(), ExecutionFault> {
        if self.frames.len() >= RETURN_STACK_LIMIT {
            return Err(ExecutionFault::ReturnStackOverflow);
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Pops the frame of the running function.
    #[inline]
    pub fn pop(&mut self) -> Option<ReturnFrame> {
        self.frames.pop()
    }

    /// Drops every frame.
    #[inline]
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Returns the frames, bottom first.
    #[inline]
    pub fn frames(&self) -> &[ReturnFrame] {
        &self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_bottom_frame() {
        let stack = ReturnStack::new();
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.top(), Some(&ReturnFrame::new(0, 0, 0)));
        assert_eq!(stack.stack_height(), 0);
    }

    #[test]
    fn bounded_at_limit() {
        let mut stack = ReturnStack::new();
        for i in 1..RETURN_STACK_LIMIT {
            stack.push(ReturnFrame::new(0, i, i)).unwrap();
        }
        assert_eq!(stack.len(), RETURN_STACK_LIMIT);
        assert_eq!(
            stack.push(ReturnFrame::new(0, 0, 0)),
            Err(ExecutionFault::ReturnStackOverflow)
        );
        assert_eq!(stack.len(), RETURN_STACK_LIMIT);
        assert_eq!(stack.stack_height(), RETURN_STACK_LIMIT - 1);
    }

    #[test]
    fn pop_until_empty() {
        let mut stack = ReturnStack::new();
        stack.push(ReturnFrame::new(2, 5, 1)).unwrap();
        assert_eq!(stack.pop(), Some(ReturnFrame::new(2, 5, 1)));
        assert_eq!(stack.pop(), Some(ReturnFrame::default()));
        assert!(stack.is_empty());
        assert_eq!(stack.stack_height(), 0);
    }
}
