//! Protocol constants used by EOF validation and execution.

/// EVM interpreter stack limit.
pub const STACK_LIMIT: usize = 1024;

/// Maximum number of frames on the return stack of one execution context.
///
/// The bottom frame of the top level call counts towards this limit.
pub const RETURN_STACK_LIMIT: usize = 1024;

/// Maximum number of code sections in one container.
pub const MAX_CODE_SECTIONS: usize = 1024;

/// EIP-170: Contract code size limit
///
/// By default the limit is `0x6000` (~25kb)
pub const MAX_CODE_SIZE: usize = 0x6000;

/// EIP-3860: Limit and meter initcode
///
/// Limit of maximum initcode size is `2 * MAX_CODE_SIZE`.
pub const MAX_INITCODE_SIZE: usize = 2 * MAX_CODE_SIZE;
