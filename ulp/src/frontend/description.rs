/*
A description is line oriented:

    libfoo_livepatch1.so          <- livepatch shared object
    *libfoo_livepatch0.ulp        <- zero or more dependencies
    @libfoo.so.6                  <- the object to patch
    foo:foo_v2                    <- units, OLD:NEW
    bar:bar_v2
*/

use std::path::Path;

use crate::{
    frontend::{
        dependency::resolve_dependency,
        error::DescriptionError,
    },
    logger::Logger,
    metadata::{
        PatchMetadata,
        PatchUnit,
        PatchedObject,
    },
};

struct LineReader<'a> {
    text: &'a str,
    cursor: usize,
    line: usize,
}

impl<'a> LineReader<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            cursor: 0,
            line: 0,
        }
    }

    /// Return the next line without its trailing newline
    fn next_line(&mut self) -> Option<&'a str> {
        if self.cursor >= self.text.len() {
            return None;
        }

        let rest = &self.text[self.cursor..];
        let (line, consumed) = match rest.find('\n') {
            Some(pos) => (&rest[..pos], pos + 1),
            None => (rest, rest.len()),
        };

        self.cursor += consumed;
        self.line += 1;
        Some(line)
    }

    fn line(&self) -> usize {
        self.line
    }
}

/// Split a unit line at the last colon
fn parse_unit(line: &str, lineno: usize) -> Result<PatchUnit, DescriptionError> {
    let pos = line.rfind(':').ok_or(DescriptionError::MissingSeparator(lineno))?;
    let old_name = &line[..pos];
    let new_name = &line[pos + 1..];

    if old_name.is_empty() || new_name.is_empty() {
        return Err(DescriptionError::EmptyFunctionName(lineno));
    }

    Ok(PatchUnit::new(old_name, new_name))
}

/// Parses patch descriptions into [`PatchMetadata`].
///
/// Dependency lines are resolved while parsing, every other field that depends on
/// the target library is left at its default until the ELF introspection runs.
///
/// Descriptions must be UTF-8. Paths and symbol names with other bytes are rejected
/// with [`DescriptionError::InvalidUtf8`] naming the first offending line.
pub struct DescriptionParser;

impl DescriptionParser {
    pub fn parse_file<P: AsRef<Path>>(path: P, logger: &Logger) -> Result<PatchMetadata, DescriptionError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|err| DescriptionError::IOError(path.display().to_string(), err))?;
        let text = Self::decode(&bytes)?;
        Self::parse(text, logger)
    }

    fn decode(bytes: &[u8]) -> Result<&str, DescriptionError> {
        std::str::from_utf8(bytes).map_err(|err| {
            let valid = &bytes[..err.valid_up_to()];
            DescriptionError::InvalidUtf8(valid.iter().filter(|byte| **byte == b'\n').count() + 1)
        })
    }

    pub fn parse(text: &str, logger: &Logger) -> Result<PatchMetadata, DescriptionError> {
        let mut reader = LineReader::new(text);

        let so_path = reader.next_line().ok_or(DescriptionError::Empty)?;

        if so_path.is_empty() {
            return Err(DescriptionError::MissingSoPath);
        }

        let mut dependencies = Vec::new();
        let mut object: Option<PatchedObject> = None;
        let mut in_dependencies = true;

        while let Some(line) = reader.next_line() {
            let lineno = reader.line();

            if let Some(dep_path) = line.strip_prefix('*') {
                if !in_dependencies {
                    return Err(DescriptionError::MisplacedDependency(lineno));
                }

                logger.debug(format!("Linking dependency {}", dep_path));
                let dependency = resolve_dependency(dep_path).map_err(|source| DescriptionError::Dependency {
                    line: lineno,
                    source,
                })?;
                dependencies.push(dependency);
                continue;
            }

            in_dependencies = false;

            if let Some(name) = line.strip_prefix('@') {
                if object.is_some() {
                    return Err(DescriptionError::DuplicateObject(lineno));
                }

                logger.debug(format!("Patched object: {}", name));
                object = Some(PatchedObject::new(name));
            } else {
                let object = object.as_mut().ok_or(DescriptionError::UnitBeforeObject(lineno))?;
                object.push_unit(parse_unit(line, lineno)?);
            }
        }

        let object = object.ok_or(DescriptionError::MissingObject)?;
        let mut metadata = PatchMetadata::new(so_path, object);

        for dependency in dependencies {
            metadata.add_dependency(dependency);
        }

        Ok(metadata)
    }
}
