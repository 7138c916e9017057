/// Tagged JSON artifact.
pub mod document;
