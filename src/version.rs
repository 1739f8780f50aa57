//! SDK version lookup.
//!
//! The version lives in a C header as a preprocessor define such as
//! `#define DII_MEDIA_KIT_VERSION "1.2.3"`. Only the last token of the first
//! matching line is used, with quotes and whitespace removed.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{PublishError, PublishResult};

/// Extract the version from header contents. Returns `None` when no line
/// mentions `macro_name` or the value is empty.
pub fn parse_sdk_version(contents: &str, macro_name: &str) -> Option<String> {
    let line = contents.lines().find(|line| line.contains(macro_name))?;
    let token = line.split_whitespace().last()?;
    let version = token.trim().trim_matches('"').trim();
    if version.is_empty() {
        None
    } else {
        Some(version.to_string())
    }
}

/// Read `header` from disk and extract the version defined by `macro_name`.
/// The file is re-read on every call.
pub fn read_sdk_version(header: &Path, macro_name: &str) -> PublishResult<String> {
    let contents = fs::read_to_string(header).map_err(|source| PublishError::Read {
        path: header.to_path_buf(),
        source,
    })?;
    let version = parse_sdk_version(&contents, macro_name).ok_or_else(|| {
        PublishError::VersionNotFound {
            macro_name: macro_name.to_string(),
            path: header.to_path_buf(),
        }
    })?;
    debug!(%version, header = %header.display(), "parsed sdk version");
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MACRO: &str = "DII_MEDIA_KIT_VERSION";

    #[test]
    fn extracts_quoted_version() {
        let header = "#pragma once\n#define DII_MEDIA_KIT_VERSION \"1.2.3\"\n";
        assert_eq!(parse_sdk_version(header, MACRO).as_deref(), Some("1.2.3"));
    }

    #[test]
    fn handles_crlf_and_trailing_spaces() {
        let header = "#define DII_MEDIA_KIT_VERSION   \"4.5.6\"  \r\n";
        assert_eq!(parse_sdk_version(header, MACRO).as_deref(), Some("4.5.6"));
    }

    #[test]
    fn keeps_only_last_token_of_multiword_literal() {
        let header = "#define DII_MEDIA_KIT_VERSION \"dii_media_version v0.1.7.1\"\n";
        assert_eq!(parse_sdk_version(header, MACRO).as_deref(), Some("v0.1.7.1"));
    }

    #[test]
    fn first_matching_line_wins() {
        let header = "#define DII_MEDIA_KIT_VERSION \"1.0.0\"\n#define DII_MEDIA_KIT_VERSION \"2.0.0\"\n";
        assert_eq!(parse_sdk_version(header, MACRO).as_deref(), Some("1.0.0"));
    }

    #[test]
    fn missing_macro_is_none() {
        let header = "#define OTHER_VERSION \"1.2.3\"\n";
        assert_eq!(parse_sdk_version(header, MACRO), None);
    }

    #[test]
    fn empty_literal_is_none() {
        assert_eq!(parse_sdk_version("#define DII_MEDIA_KIT_VERSION \"\"", MACRO), None);
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let header = dir.path().join("dii_common.h");
        fs::write(&header, "#define DII_MEDIA_KIT_VERSION \"1.2.3\"\n").unwrap();
        assert_eq!(read_sdk_version(&header, MACRO).unwrap(), "1.2.3");
    }

    #[test]
    fn unreadable_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_sdk_version(&dir.path().join("missing.h"), MACRO).unwrap_err();
        assert!(matches!(err, PublishError::Read { .. }));
    }

    #[test]
    fn no_match_is_version_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let header = dir.path().join("dii_common.h");
        fs::write(&header, "// nothing here\n").unwrap();
        let err = read_sdk_version(&header, MACRO).unwrap_err();
        assert!(matches!(err, PublishError::VersionNotFound { .. }));
    }
}
