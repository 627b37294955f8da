use crate::utils::error::{EtlError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(EtlError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

/// Validates a catalog endpoint template such as `https://host/products/{id}`.
pub fn validate_endpoint_template(field_name: &str, template: &str) -> Result<()> {
    validate_url(field_name, template)?;
    // 用樣本 ID 展開後再檢查一次
    let expanded = template.replace("{id}", "1");
    if expanded.contains('{') || expanded.contains('}') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: template.to_string(),
            reason: "Only the {id} placeholder is supported".to_string(),
        });
    }
    validate_url(field_name, &expanded)
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// `min_amount` must not exceed `max_amount` when both are given.
pub fn validate_amount_bounds(min_amount: Option<f64>, max_amount: Option<f64>) -> Result<()> {
    for (field, value) in [("min_amount", min_amount), ("max_amount", max_amount)] {
        if let Some(v) = value {
            if !v.is_finite() {
                return Err(EtlError::InvalidConfigValueError {
                    field: field.to_string(),
                    value: v.to_string(),
                    reason: "Amount must be a finite number".to_string(),
                });
            }
        }
    }

    if let (Some(min), Some(max)) = (min_amount, max_amount) {
        if min > max {
            return Err(EtlError::InvalidConfigValueError {
                field: "min_amount".to_string(),
                value: min.to_string(),
                reason: format!("Minimum amount is greater than maximum amount {}", max),
            });
        }
    }
    Ok(())
}
