// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier validation shared by the tool invoker (spec §4.1) and every
//! HTTP/socket handler that accepts a rig or agent name from a client.

use crate::error::Error;

/// Validate a rig or agent name against `^[A-Za-z0-9_-]+$`.
///
/// The tool invoker must reject any identifier outside this set *before* it
/// is placed into an argument vector, never by escaping it (invariant 6,
/// spec §8).
pub fn validate_name(name: &str) -> Result<(), Error> {
    if name.is_empty() {
        return Err(Error::InvalidName("empty identifier".into()));
    }
    if name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-') {
        Ok(())
    } else {
        Err(Error::InvalidName(name.to_owned()))
    }
}

/// Validate a bead id, which may additionally contain `/` (spec §6.1
/// `bd show <beadId>` and `peek` paths use slash-qualified ids).
pub fn validate_bead_id(id: &str) -> Result<(), Error> {
    if id.is_empty() {
        return Err(Error::InvalidName("empty bead id".into()));
    }
    if id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'/') {
        Ok(())
    } else {
        Err(Error::InvalidName(id.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_alnum_dash_underscore() {
        assert!(validate_name("rig-1_A").is_ok());
    }

    #[test]
    fn rejects_shell_metacharacters() {
        assert!(validate_name("rig; rm -rf /").is_err());
        assert!(validate_name("$(whoami)").is_err());
        assert!(validate_name("").is_err());
    }

    #[test]
    fn bead_id_allows_slash() {
        assert!(validate_bead_id("rig1/B-42").is_ok());
        assert!(validate_bead_id("rig1 B-42").is_err());
    }
}
