//
// Copyright (c) 2024 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use crate::error::{ia_err, DriverError};
use std::path::PathBuf;

/// Expand a leading `~/` (or `~\`) to the current user's home directory.
pub(crate) fn expand_user_home(file_path: &str) -> Result<String, DriverError> {
    if file_path.starts_with("~/") || file_path.starts_with("~\\") {
        if let Some(home_dir) = dirs::home_dir() {
            let full_path = home_dir.join(PathBuf::from(correct_path(&file_path[2..])));
            return Ok(format!("{}", full_path.display()));
        }
        return ia_err!("cannot expand '{}': home directory unknown", file_path);
    }
    Ok(file_path.to_string())
}

pub(crate) fn file_to_string(file_path: &str) -> Result<String, DriverError> {
    let path = expand_user_home(file_path)?;
    match std::fs::read_to_string(&path) {
        Ok(s) => Ok(s),
        Err(e) => ia_err!("error reading file {}: {}", path, e),
    }
}

fn correct_path(file_path: &str) -> String {
    if cfg!(target_os = "windows") {
        file_path.replace('/', "\\")
    } else {
        file_path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_user_home() -> Result<(), DriverError> {
        assert_eq!(expand_user_home("/etc/hosts")?, "/etc/hosts");
        assert_eq!(expand_user_home("relative/file")?, "relative/file");
        if let Some(home) = dirs::home_dir() {
            let p = expand_user_home("~/nosql.properties")?;
            assert!(p.starts_with(&format!("{}", home.display())));
            assert!(p.ends_with("nosql.properties"));
        }
        Ok(())
    }

    #[test]
    fn test_file_to_string_missing() {
        let r = file_to_string("/this/file/does/not/exist.properties");
        assert!(r.unwrap_err().is_illegal_argument());
    }
}
