//! Shared protocol definitions for the envlink server and CLI.
//!
//! Both sides of the CLI login handoff speak the same small wire protocol:
//! the query parameters carried through the browser redirect and the JSON
//! body of the exchange endpoint. Keeping them in one place prevents the
//! two halves from drifting apart.

pub mod protocol;
pub mod token;

pub use protocol::{TokenExchangeRequest, TokenExchangeResponse};
pub use token::secure_hex_token;
