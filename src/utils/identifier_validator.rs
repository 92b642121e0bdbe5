//! 标识符校验
//!
//! 调用方接受用户输入前使用的可复用谓词：
//! - 链 ID：恰好 64 个十六进制字符（大小写均可）
//! - Owner：同上，可带 `0x` 前缀

use crate::error::AppError;

/// 链 ID 长度（十六进制字符数）
pub const CHAIN_ID_HEX_LEN: usize = 64;

pub fn is_valid_chain_id(value: &str) -> bool {
    value.len() == CHAIN_ID_HEX_LEN && value.chars().all(|c| c.is_ascii_hexdigit())
}

pub fn is_valid_owner(value: &str) -> bool {
    let hex_part = value.strip_prefix("0x").unwrap_or(value);
    is_valid_chain_id(hex_part)
}

/// 标识符校验器
pub struct IdentifierValidator;

impl IdentifierValidator {
    pub fn validate_chain_id(value: &str) -> Result<(), AppError> {
        if is_valid_chain_id(value) {
            Ok(())
        } else {
            Err(AppError::invalid_chain_id(value))
        }
    }

    pub fn validate_owner(value: &str) -> Result<(), AppError> {
        if is_valid_owner(value) {
            Ok(())
        } else {
            Err(AppError::invalid_owner(value))
        }
    }
}
