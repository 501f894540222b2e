//! The top-level value a parser hands to the assembler: a header plus the
//! ordered body of commands that make up the program.
//!
//! Grounded in `original_source/ic4/assembly/srcfile.py`. Plain
//! aggregates, never mutated after construction — the parser builds one,
//! the assembler consumes it.

use crate::command::Command;
use crate::version::Version;

/// The mandatory first line of a source file.
///
/// Only [`Header::Executable`] is accepted by [`crate::assembler::assemble`];
/// [`Header::Objects`] exists because the grammar defines an `OBJECTS`
/// header with `EXPORT`/`EXTERN`/`ENTRY` sections for a linker, but no
/// linker is part of this workspace (see `SPEC_FULL.md` §1, §9). Handing one
/// to `assemble` fails with `AssembleError::UnsupportedFormat`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Header {
    Executable {
        version: Version,
    },
    Objects {
        version: Version,
        export: Vec<String>,
        extern_: Vec<String>,
        entry: Option<String>,
    },
}

impl Header {
    pub fn version(&self) -> &Version {
        match self {
            Header::Executable { version } => version,
            Header::Objects { version, .. } => version,
        }
    }
}

/// A complete parsed assembly source: header plus ordered body.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SourceFile {
    pub header: Header,
    pub body: Vec<Command>,
}

impl SourceFile {
    pub fn new(header: Header, body: Vec<Command>) -> SourceFile {
        SourceFile { header, body }
    }

    /// Convenience constructor for the only header shape the assembler
    /// actually accepts.
    pub fn executable(version: Version, body: Vec<Command>) -> SourceFile {
        SourceFile { header: Header::Executable { version }, body }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_reaches_through_either_header_shape() {
        let exe = SourceFile::executable(Version::new(0, 1, 0), vec![]);
        assert_eq!(exe.header.version(), &Version::new(0, 1, 0));

        let obj = SourceFile::new(
            Header::Objects {
                version: Version::new(0, 1, 0),
                export: vec![],
                extern_: vec![],
                entry: None,
            },
            vec![],
        );
        assert_eq!(obj.header.version(), &Version::new(0, 1, 0));
    }
}
