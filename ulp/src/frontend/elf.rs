use std::path::Path;

use goblin::{
    container::{
        Container,
        Ctx,
        Endian,
    },
    elf::{
        note::NT_GNU_BUILD_ID,
        section_header::{
            SHT_DYNSYM,
            SHT_NOTE,
        },
        Sym,
        Symtab,
    },
    strtab::Strtab,
};
use memmap2::{
    Mmap,
    MmapOptions,
};

use crate::{
    frontend::error::ElfError,
    logger::Logger,
    metadata::{
        PatchedObject,
        VAddr,
    },
};

/// The name of the section that holds the GNU build id note
pub const BUILD_ID_SECTION: &str = ".note.gnu.build-id";

fn mmap_file(path: &Path) -> std::io::Result<Mmap> {
    let file = std::fs::File::open(path)?;
    let map = unsafe { MmapOptions::new().map(&file) }?;
    Ok(map)
}

fn parse_elf(content: &[u8]) -> Result<goblin::elf::Elf<'_>, ElfError> {
    goblin::elf::Elf::parse(content).map_err(|err| ElfError::InvalidELF(err.to_string()))
}

fn elf_ctx(elf: &goblin::elf::Elf) -> Ctx {
    let container = if elf.is_64 { Container::Big } else { Container::Little };
    let endian = if elf.little_endian { Endian::Little } else { Endian::Big };
    Ctx::new(container, endian)
}

/// The dynamic symbol table as described by the section header table
struct DynamicSymbols<'a> {
    symbols: Symtab<'a>,
    names: Strtab<'a>,
}

impl<'a> DynamicSymbols<'a> {
    fn parse(elf: &goblin::elf::Elf, content: &'a [u8]) -> Result<Self, ElfError> {
        let ctx = elf_ctx(elf);
        let shdr = elf.section_headers.iter().find(|shdr| shdr.sh_type == SHT_DYNSYM).ok_or(ElfError::MissingDynsym)?;

        let entsize = if shdr.sh_entsize == 0 { Sym::size(ctx.container) as u64 } else { shdr.sh_entsize };
        let count = (shdr.sh_size / entsize) as usize;
        let symbols = Symtab::parse(content, shdr.sh_offset as usize, count, ctx).map_err(|err| ElfError::InvalidELF(format!("Malformed .dynsym: {}", err)))?;

        let strtab = elf
            .section_headers
            .get(shdr.sh_link as usize)
            .ok_or_else(|| ElfError::InvalidELF(format!(".dynsym links to missing section {}", shdr.sh_link)))?;
        let names = Strtab::parse(content, strtab.sh_offset as usize, strtab.sh_size as usize, 0x0).map_err(|err| ElfError::InvalidELF(format!("Malformed .dynstr: {}", err)))?;

        Ok(Self {
            symbols,
            names,
        })
    }

    /// Linear scan, the first symbol with a matching name wins
    fn lookup(&self, name: &str) -> Option<VAddr> {
        self.symbols.iter().find(|sym| self.names.get_at(sym.st_name) == Some(name)).map(|sym| sym.st_value as VAddr)
    }
}

fn find_build_id(elf: &goblin::elf::Elf, content: &[u8]) -> Result<Vec<u8>, ElfError> {
    let has_section = elf.section_headers.iter().any(|shdr| shdr.sh_type == SHT_NOTE && elf.shdr_strtab.get_at(shdr.sh_name) == Some(BUILD_ID_SECTION));

    if !has_section {
        return Err(ElfError::MissingBuildIdSection);
    }

    let notes = elf.iter_note_sections(content, Some(BUILD_ID_SECTION)).ok_or(ElfError::MissingBuildIdSection)?;

    for note in notes {
        let note = note.map_err(|err| ElfError::InvalidELF(format!("Malformed build id note: {}", err)))?;

        if note.n_type == NT_GNU_BUILD_ID {
            if note.desc.is_empty() {
                return Err(ElfError::EmptyBuildId);
            }

            return Ok(note.desc.to_vec());
        }
    }

    Err(ElfError::MissingBuildIdNote)
}

/// Read only the build id of the shared object at `path`
pub fn read_build_id<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, ElfError> {
    let path = path.as_ref();
    let file = mmap_file(path).map_err(|err| ElfError::IOError(path.display().to_string(), err))?;
    let elf = parse_elf(&file[..])?;
    find_build_id(&elf, &file[..])
}

/// Fills a [`PatchedObject`] with the build id and the symbol addresses of the library it targets
pub struct ElfIntrospector {
    require_symbols: bool,
}

impl ElfIntrospector {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            require_symbols: false,
        }
    }

    /// Fail with [`ElfError::UnresolvedSymbol`] instead of recording a zero address
    pub fn require_symbols(mut self, flag: bool) -> Self {
        self.require_symbols = flag;
        self
    }

    pub fn introspect<P: AsRef<Path>>(&self, library: P, object: &mut PatchedObject, logger: &Logger) -> Result<(), ElfError> {
        let library = library.as_ref();
        let file = mmap_file(library).map_err(|err| ElfError::IOError(library.display().to_string(), err))?;
        let elf = parse_elf(&file[..])?;

        let dynsym = DynamicSymbols::parse(&elf, &file[..])?;
        let build_id = find_build_id(&elf, &file[..])?;
        logger.debug(format!("Build id of {}: {}", library.display(), hex(&build_id)));
        object.set_build_id(build_id);

        for unit in object.units_mut() {
            match dynsym.lookup(unit.old_name()) {
                Some(vaddr) => {
                    logger.debug(format!("{} -> {:#x}", unit.old_name(), vaddr));
                    unit.set_old_address(vaddr);
                },
                None if self.require_symbols => return Err(ElfError::UnresolvedSymbol(unit.old_name().to_string())),
                None => {
                    logger.warning(format!("Symbol '{}' not found in {}, recording address 0", unit.old_name(), library.display()));
                    unit.set_old_address(0);
                },
            }
        }

        Ok(())
    }
}

/// Lowercase hex rendering of a byte string
pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{:02x}", byte)).collect()
}
