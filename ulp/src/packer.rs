use std::path::{
    Path,
    PathBuf,
};

use rand::{
    rngs::OsRng,
    RngCore,
};
use thiserror::Error;

use crate::{
    frontend::{
        DescriptionError,
        DescriptionParser,
        ElfError,
        ElfIntrospector,
    },
    logger::Logger,
    metadata::{
        write_to,
        Destination,
        MetadataError,
        PatchId,
        PatchMetadata,
        PATCH_ID_LEN,
    },
};

#[derive(Error, Debug)]
pub enum PackError {
    #[error("Unable to parse description file: {0}")]
    DescriptionError(#[from] DescriptionError),

    #[error("Unable to introspect {0}: {1}")]
    ElfError(String, ElfError),

    #[error("Error generating patch id: {0}")]
    PatchIdError(rand::Error),

    #[error("Unable to write metadata: {0}")]
    MetadataError(#[from] MetadataError),
}

/// Settings that override what the description says
#[derive(Clone, Debug, Default)]
pub struct PackOptions {
    /// Introspect this library instead of the object named in the description.
    /// The declared name is still the one stored in the record.
    pub library: Option<PathBuf>,

    /// Store this livepatch path instead of the first line of the description
    pub livepatch: Option<String>,

    /// Treat symbols missing from the target library as errors
    pub require_symbols: bool,
}

/// Mint a new patch id from the operating system's randomness source
pub fn generate_patch_id() -> Result<PatchId, rand::Error> {
    let mut id = [0; PATCH_ID_LEN];
    OsRng.try_fill_bytes(&mut id)?;
    Ok(id)
}

/// The Packer runs the whole pipeline from a description file to a finished record
#[derive(Debug)]
pub struct Packer {
    metadata: PatchMetadata,
}

impl Packer {
    pub fn build<P: AsRef<Path>>(description: P, options: &PackOptions, logger: &mut Logger) -> Result<Self, PackError> {
        let description = description.as_ref();

        logger.set_title("Parsing description");
        logger.debug(format!("Parsing the description file ({})", description.display()));
        let mut metadata = DescriptionParser::parse_file(description, logger)?;

        if let Some(livepatch) = &options.livepatch {
            logger.debug(format!("Using command-line provided livepatch path: {}", livepatch));
            metadata.set_target_so_path(livepatch.clone());
        }

        let library = match &options.library {
            Some(library) => {
                logger.debug("Using command-line provided target library path");
                library.clone()
            },
            None => {
                logger.debug("Using target library path from description file");
                PathBuf::from(metadata.object().name())
            },
        };
        logger.debug(format!("Target library set to {}", library.display()));

        logger.set_title("Introspecting target library");
        logger.set_prefix(metadata.object().name().to_string());
        let introspection = ElfIntrospector::new().require_symbols(options.require_symbols).introspect(&library, metadata.object_mut(), logger);
        logger.clear_prefix();
        introspection.map_err(|err| PackError::ElfError(library.display().to_string(), err))?;

        let patch_id = generate_patch_id().map_err(PackError::PatchIdError)?;
        metadata.set_patch_id(patch_id);

        Ok(Self {
            metadata,
        })
    }

    /// Write the record. See [`write_to`] for what happens when writing fails halfway.
    pub fn write(&self, destination: &Destination, logger: &mut Logger) -> Result<(), PackError> {
        logger.set_title("Writing metadata");
        write_to(&self.metadata, destination)?;
        Ok(())
    }

    pub fn metadata(&self) -> &PatchMetadata {
        &self.metadata
    }

    pub fn into_metadata(self) -> PatchMetadata {
        self.metadata
    }
}
