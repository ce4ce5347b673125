//! Command line tool to validate, print and run EOF containers.
pub mod cmd;
pub mod dir_utils;
