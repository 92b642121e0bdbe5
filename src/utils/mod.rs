pub mod identifier_validator;

pub use identifier_validator::{is_valid_chain_id, is_valid_owner, IdentifierValidator};
