//! Builds minimal ELF64 shared objects with a dynamic symbol table and a GNU build id note
#![allow(dead_code)]

use std::path::Path;

use byteorder::{
    LittleEndian,
    WriteBytesExt,
};

pub const NT_GNU_BUILD_ID: u32 = 3;

const EHDR_SIZE: usize = 64;
const SHDR_SIZE: usize = 64;
const SYM_SIZE: usize = 24;

const SHT_PROGBITS: u32 = 1;
const SHT_STRTAB: u32 = 3;
const SHT_NOTE: u32 = 7;
const SHT_DYNSYM: u32 = 11;

struct Section {
    name: &'static str,
    kind: u32,
    data: Vec<u8>,
    link: u32,
    align: u64,
    entsize: u64,
}

pub struct SharedObject {
    symbols: Vec<(String, u64)>,
    build_id: Option<Vec<u8>>,
    note_type: u32,
    dynsym: bool,
}

impl SharedObject {
    pub fn new() -> Self {
        Self {
            symbols: Vec::new(),
            build_id: Some(vec![0xaa, 0xbb, 0xcc, 0xdd]),
            note_type: NT_GNU_BUILD_ID,
            dynsym: true,
        }
    }

    pub fn symbol(mut self, name: &str, value: u64) -> Self {
        self.symbols.push((name.to_string(), value));
        self
    }

    pub fn build_id(mut self, build_id: &[u8]) -> Self {
        self.build_id = Some(build_id.to_vec());
        self
    }

    pub fn without_build_id(mut self) -> Self {
        self.build_id = None;
        self
    }

    pub fn note_type(mut self, note_type: u32) -> Self {
        self.note_type = note_type;
        self
    }

    pub fn without_dynsym(mut self) -> Self {
        self.dynsym = false;
        self
    }

    fn sections(&self) -> Vec<Section> {
        let mut sections = Vec::new();

        /* .text so that symbols have a section to point into */
        sections.push(Section {
            name: ".text",
            kind: SHT_PROGBITS,
            data: vec![0xc3; 16],
            link: 0,
            align: 16,
            entsize: 0,
        });

        if self.dynsym {
            let mut dynstr = vec![0u8];
            let mut dynsym = vec![0u8; SYM_SIZE];

            for (name, value) in &self.symbols {
                let st_name = dynstr.len() as u32;
                dynstr.extend_from_slice(name.as_bytes());
                dynstr.push(0);

                dynsym.write_u32::<LittleEndian>(st_name).unwrap();
                dynsym.write_u8(0x12).unwrap();
                dynsym.write_u8(0).unwrap();
                dynsym.write_u16::<LittleEndian>(1).unwrap();
                dynsym.write_u64::<LittleEndian>(*value).unwrap();
                dynsym.write_u64::<LittleEndian>(16).unwrap();
            }

            /* .dynstr is the section after .dynsym */
            let link = sections.len() as u32 + 2;
            sections.push(Section {
                name: ".dynsym",
                kind: SHT_DYNSYM,
                data: dynsym,
                link,
                align: 8,
                entsize: SYM_SIZE as u64,
            });
            sections.push(Section {
                name: ".dynstr",
                kind: SHT_STRTAB,
                data: dynstr,
                link: 0,
                align: 1,
                entsize: 0,
            });
        }

        if let Some(build_id) = &self.build_id {
            let mut note = Vec::new();
            note.write_u32::<LittleEndian>(4).unwrap();
            note.write_u32::<LittleEndian>(build_id.len() as u32).unwrap();
            note.write_u32::<LittleEndian>(self.note_type).unwrap();
            note.extend_from_slice(b"GNU\0");
            note.extend_from_slice(build_id);
            while note.len() % 4 != 0 {
                note.push(0);
            }

            sections.push(Section {
                name: ".note.gnu.build-id",
                kind: SHT_NOTE,
                data: note,
                link: 0,
                align: 4,
                entsize: 0,
            });
        }

        sections
    }

    pub fn bytes(&self) -> Vec<u8> {
        let mut sections = self.sections();

        let mut shstrtab = vec![0u8];
        let mut names = Vec::new();
        for section in &sections {
            names.push(shstrtab.len() as u32);
            shstrtab.extend_from_slice(section.name.as_bytes());
            shstrtab.push(0);
        }
        names.push(shstrtab.len() as u32);
        shstrtab.extend_from_slice(b".shstrtab\0");
        sections.push(Section {
            name: ".shstrtab",
            kind: SHT_STRTAB,
            data: shstrtab,
            link: 0,
            align: 1,
            entsize: 0,
        });

        let mut data = vec![0u8; EHDR_SIZE];
        let mut offsets = Vec::new();
        for section in &sections {
            while data.len() % 8 != 0 {
                data.push(0);
            }
            offsets.push(data.len() as u64);
            data.extend_from_slice(&section.data);
        }
        while data.len() % 8 != 0 {
            data.push(0);
        }

        let shoff = data.len() as u64;
        let shnum = sections.len() as u16 + 1;

        /* null section header */
        data.extend_from_slice(&[0u8; SHDR_SIZE]);

        for (i, section) in sections.iter().enumerate() {
            data.write_u32::<LittleEndian>(names[i]).unwrap();
            data.write_u32::<LittleEndian>(section.kind).unwrap();
            data.write_u64::<LittleEndian>(if section.kind == SHT_PROGBITS { 0x6 } else { 0x2 }).unwrap();
            data.write_u64::<LittleEndian>(0).unwrap();
            data.write_u64::<LittleEndian>(offsets[i]).unwrap();
            data.write_u64::<LittleEndian>(section.data.len() as u64).unwrap();
            data.write_u32::<LittleEndian>(section.link).unwrap();
            data.write_u32::<LittleEndian>(if section.kind == SHT_DYNSYM { 1 } else { 0 }).unwrap();
            data.write_u64::<LittleEndian>(section.align).unwrap();
            data.write_u64::<LittleEndian>(section.entsize).unwrap();
        }

        let mut header = Vec::with_capacity(EHDR_SIZE);
        header.extend_from_slice(&[0x7f, b'E', b'L', b'F', 2, 1, 1, 0]);
        header.extend_from_slice(&[0u8; 8]);
        header.write_u16::<LittleEndian>(3).unwrap();
        header.write_u16::<LittleEndian>(62).unwrap();
        header.write_u32::<LittleEndian>(1).unwrap();
        header.write_u64::<LittleEndian>(0).unwrap();
        header.write_u64::<LittleEndian>(0).unwrap();
        header.write_u64::<LittleEndian>(shoff).unwrap();
        header.write_u32::<LittleEndian>(0).unwrap();
        header.write_u16::<LittleEndian>(EHDR_SIZE as u16).unwrap();
        header.write_u16::<LittleEndian>(56).unwrap();
        header.write_u16::<LittleEndian>(0).unwrap();
        header.write_u16::<LittleEndian>(SHDR_SIZE as u16).unwrap();
        header.write_u16::<LittleEndian>(shnum).unwrap();
        header.write_u16::<LittleEndian>(shnum - 1).unwrap();
        assert_eq!(header.len(), EHDR_SIZE);

        data[..EHDR_SIZE].copy_from_slice(&header);
        data
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) {
        std::fs::write(path, self.bytes()).unwrap();
    }
}
