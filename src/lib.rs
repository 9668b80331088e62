//! Reversible masking of sensitive text in front of an external language model.
//!
//! [`mask::MaskingPipeline::mask`] replaces recognized entities and pattern
//! matches with `#TOKEN_<n>#` placeholders and returns the [`token::TokenMap`]
//! that reverses them; [`unmask::unmask`] puts the original values back into
//! whatever text comes back.

pub mod cli;
pub mod config;
pub mod error;
pub mod ipc;
pub mod llm;
pub mod mask;
pub mod proxy;
pub mod recognizer;
pub mod token;
pub mod unmask;

pub use error::{MaskgateError, Result};
pub use mask::MaskingPipeline;
pub use token::{Masked, Token, TokenMap};
pub use unmask::unmask;
