use crate::utils::error::{PortalError, Result};
use regex::Regex;
use std::sync::OnceLock;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// 四組 1-3 位 ASCII 數字，以單一點號分隔 (不檢查每組 <= 255)
fn dotted_quad_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([0-9]{1,3}\.){3}[0-9]{1,3}$").expect("static regex"))
}

pub fn is_dotted_quad(value: &str) -> bool {
    dotted_quad_regex().is_match(value)
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// 去除前後空白後解析為十進位整數並檢查範圍；無法解析與超出範圍一律回傳 false
pub fn is_integer_in_range(value: &str, min: i64, max: i64) -> bool {
    value
        .trim()
        .parse::<i64>()
        .map(|v| v >= min && v <= max)
        .unwrap_or(false)
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if is_blank(value) {
        return Err(PortalError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(PortalError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}
