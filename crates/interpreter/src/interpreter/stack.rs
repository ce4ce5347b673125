use crate::ExecutionFault;
use core::fmt;
use primitives::{STACK_LIMIT, U256};
use std::vec::Vec;

/// EVM stack.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stack {
    data: Vec<U256>,
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, x) in self.data.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{x}")?;
        }
        f.write_str("]")
    }
}

impl Default for Stack {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Stack {
    /// Instantiate a new stack with the [default stack limit][STACK_LIMIT].
    #[inline]
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(STACK_LIMIT),
        }
    }

    /// Returns the length of the stack in words.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns whether the stack is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the underlying data of the stack.
    #[inline]
    pub fn data(&self) -> &[U256] {
        &self.data
    }

    /// Returns `true` if `n` more items fit on the stack.
    #[inline]
    pub fn has_space(&self, n: usize) -> bool {
        self.data.len() + n <= STACK_LIMIT
    }

    /// Removes the topmost element from the stack and returns it, or `StackUnderflow` if it is
    /// empty.
    #[inline]
    pub fn pop(&mut self) -> Result<U256, ExecutionFault> {
        self.data.pop().ok_or(ExecutionFault::StackUnderflow)
    }

    /// Pops `N` values from the stack, topmost first.
    ///
    /// The stack is left untouched if it holds less than `N` items.
    #[inline]
    pub fn popn<const N: usize>(&mut self) -> Result<[U256; N], ExecutionFault> {
        if self.data.len() < N {
            return Err(ExecutionFault::StackUnderflow);
        }
        let mut out = [U256::ZERO; N];
        for slot in out.iter_mut() {
            *slot = self.pop()?;
        }
        Ok(out)
    }

    /// Push a new value onto the stack.
    ///
    /// If it will exceed the stack limit, returns `StackOverflow` error and leaves the stack
    /// unchanged.
    #[inline]
    pub fn push(&mut self, value: U256) -> Result<(), ExecutionFault> {
        if self.data.len() == STACK_LIMIT {
            return Err(ExecutionFault::StackOverflow);
        }
        self.data.push(value);
        Ok(())
    }

    /// Pushes big-endian `slice` as one word. Empty slice pushes zero.
    #[inline]
    pub fn push_slice(&mut self, slice: &[u8]) -> Result<(), ExecutionFault> {
        self.push(U256::from_be_slice(slice))
    }

    /// Peek a value at given index for the stack, where the top of
    /// the stack is at index `0`. If the index is too large,
    /// `StackUnderflow` is returned.
    #[inline]
    pub fn peek(&self, no_from_top: usize) -> Result<U256, ExecutionFault> {
        if self.data.len() > no_from_top {
            Ok(self.data[self.data.len() - no_from_top - 1])
        } else {
            Err(ExecutionFault::StackUnderflow)
        }
    }

    /// Duplicates the `N`th value from the top of the stack.
    ///
    /// `N` starts at 1, `dup(1)` duplicates the top value.
    #[inline]
    pub fn dup(&mut self, n: usize) -> Result<(), ExecutionFault> {
        if n == 0 {
            return Err(ExecutionFault::StackUnderflow);
        }
        let value = self.peek(n - 1)?;
        self.push(value)
    }

    /// Swaps the topmost value with the `N`th value from the top.
    #[inline]
    pub fn swap(&mut self, n: usize) -> Result<(), ExecutionFault> {
        let len = self.data.len();
        if n == 0 || len <= n {
            return Err(ExecutionFault::StackUnderflow);
        }
        self.data.swap(len - 1, len - 1 - n);
        Ok(())
    }

    /// Removes every item above `height`.
    #[inline]
    pub fn truncate(&mut self, height: usize) {
        self.data.truncate(height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_peek() {
        let mut stack = Stack::new();
        stack.push(U256::from(1)).unwrap();
        stack.push_slice(&[0x01, 0x00]).unwrap();
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.peek(0), Ok(U256::from(256)));
        assert_eq!(stack.peek(1), Ok(U256::from(1)));
        assert_eq!(stack.peek(2), Err(ExecutionFault::StackUnderflow));
        assert_eq!(stack.popn::<2>(), Ok([U256::from(256), U256::from(1)]));
        assert!(stack.is_empty());
        assert_eq!(stack.pop(), Err(ExecutionFault::StackUnderflow));
    }

    #[test]
    fn popn_leaves_stack_on_underflow() {
        let mut stack = Stack::new();
        stack.push(U256::from(7)).unwrap();
        assert_eq!(stack.popn::<2>(), Err(ExecutionFault::StackUnderflow));
        assert_eq!(stack.data(), &[U256::from(7)]);
    }

    #[test]
    fn dup_and_swap() {
        let mut stack = Stack::new();
        for i in 1..=3u64 {
            stack.push(U256::from(i)).unwrap();
        }
        stack.dup(3).unwrap();
        assert_eq!(stack.peek(0), Ok(U256::from(1)));
        stack.swap(1).unwrap();
        assert_eq!(
            stack.data(),
            &[U256::from(1), U256::from(2), U256::from(1), U256::from(3)]
        );
        assert_eq!(stack.swap(4), Err(ExecutionFault::StackUnderflow));
        assert_eq!(stack.dup(5), Err(ExecutionFault::StackUnderflow));
    }

    #[test]
    fn overflow_leaves_stack_unchanged() {
        let mut stack = Stack::new();
        for _ in 0..STACK_LIMIT {
            stack.push(U256::ZERO).unwrap();
        }
        assert!(!stack.has_space(1));
        assert_eq!(stack.push(U256::ZERO), Err(ExecutionFault::StackOverflow));
        assert_eq!(stack.dup(1), Err(ExecutionFault::StackOverflow));
        assert_eq!(stack.len(), STACK_LIMIT);
    }
}
