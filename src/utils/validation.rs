use crate::utils::error::{LauncherError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(LauncherError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(LauncherError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LauncherError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_non_empty_list<T>(field_name: &str, values: &[T]) -> Result<()> {
    if values.is_empty() {
        return Err(LauncherError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: "[]".to_string(),
            reason: "At least one entry is required".to_string(),
        });
    }
    Ok(())
}

/// Module names end up inside `import a, b, c`, so only dotted identifiers are accepted.
pub fn validate_module_name(field_name: &str, module: &str) -> Result<()> {
    validate_non_empty_string(field_name, module)?;

    let valid = module.split('.').all(|part| {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
            && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
    });

    if !valid {
        return Err(LauncherError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: module.to_string(),
            reason: "Not a valid importable module name".to_string(),
        });
    }
    Ok(())
}

/// Package names are handed to the installer as positional arguments and must not read as options.
pub fn validate_package_name(field_name: &str, package: &str) -> Result<()> {
    validate_non_empty_string(field_name, package)?;

    if package.trim_start().starts_with('-') {
        return Err(LauncherError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: package.to_string(),
            reason: "Package names cannot start with '-'".to_string(),
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
        return Err(LauncherError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}
