//! On-disk records and layout constants of the Tinix file system.
//!
//! Everything is little-endian and lives in the non-swap prefix of the
//! block device. One block holds the SuperBlock, one each the inode and
//! data bitmaps, then the inode table, then data blocks.

use crate::config::{DISK_BLOCK_SIZE, SWAP_START_BLOCK};

// ══════════════════════════════════════════════════════════════
//  Layout constants
// ══════════════════════════════════════════════════════════════

pub const BLOCK_SIZE: usize = DISK_BLOCK_SIZE;

/// Blocks available to the file system: [0, SWAP_START_BLOCK).
pub const TOTAL_BLOCKS: u32 = SWAP_START_BLOCK as u32;

pub const SUPERBLOCK_BLOCK: u32 = 0;
pub const INODE_BITMAP_BLOCK: u32 = 1;
pub const DATA_BITMAP_BLOCK: u32 = 2;
pub const INODE_TABLE_START: u32 = 3;
pub const INODE_TABLE_BLOCKS: u32 =
    ((MAX_INODES as usize * INODE_SIZE + BLOCK_SIZE - 1) / BLOCK_SIZE) as u32;
pub const DATA_BLOCKS_START: u32 = INODE_TABLE_START + INODE_TABLE_BLOCKS;

pub const MAX_INODES: u32 = 128;
pub const MAX_DATA_BLOCKS: u32 = TOTAL_BLOCKS - DATA_BLOCKS_START;

pub const INODE_SIZE: usize = 128;
pub const INODES_PER_BLOCK: usize = BLOCK_SIZE / INODE_SIZE;

/// Direct block pointers per inode; there is no indirection, so this
/// bounds the file size.
pub const DIRECT_BLOCKS: usize = 10;
pub const MAX_FILE_SIZE: u32 = DIRECT_BLOCKS as u32 * BLOCK_SIZE as u32;

pub const MAX_FILENAME_LEN: usize = 28;
pub const DIRENT_SIZE: usize = 32;
pub const DIRENTS_PER_BLOCK: usize = BLOCK_SIZE / DIRENT_SIZE;

pub const ROOT_INODE: u32 = 0;
pub const INVALID_INODE: u32 = 0xFFFF_FFFF;
pub const INVALID_BLOCK: u32 = 0xFFFF_FFFF;

/// "TINX" as a little-endian u32.
pub const FS_MAGIC: u32 = 0x5449_4E58;

const _: () = assert!(INODE_TABLE_BLOCKS == 4);
const _: () = assert!(DATA_BLOCKS_START == 7);
const _: () = assert!(TOTAL_BLOCKS > DATA_BLOCKS_START);
const _: () = assert!(MAX_FILENAME_LEN + 4 == DIRENT_SIZE);

// ══════════════════════════════════════════════════════════════
//  SuperBlock
// ══════════════════════════════════════════════════════════════

/// Fixed in block 0, padded to exactly one block on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuperBlock {
    pub magic: u32,
    pub total_blocks: u32,
    pub total_inodes: u32,
    pub free_blocks: u32,
    pub free_inodes: u32,

    pub inode_bitmap_block: u32,
    pub data_bitmap_block: u32,
    pub inode_table_start: u32,
    pub inode_table_blocks: u32,
    pub data_blocks_start: u32,
}

impl SuperBlock {
    pub fn from_block(block: &[u8; BLOCK_SIZE]) -> SuperBlock {
        let word = |i: usize| u32::from_le_bytes([block[i], block[i + 1], block[i + 2], block[i + 3]]);
        SuperBlock {
            magic: word(0),
            total_blocks: word(4),
            total_inodes: word(8),
            free_blocks: word(12),
            free_inodes: word(16),
            inode_bitmap_block: word(20),
            data_bitmap_block: word(24),
            inode_table_start: word(28),
            inode_table_blocks: word(32),
            data_blocks_start: word(36),
        }
    }

    pub fn to_block(&self) -> [u8; BLOCK_SIZE] {
        let mut block = [0u8; BLOCK_SIZE];
        let words = [
            self.magic,
            self.total_blocks,
            self.total_inodes,
            self.free_blocks,
            self.free_inodes,
            self.inode_bitmap_block,
            self.data_bitmap_block,
            self.inode_table_start,
            self.inode_table_blocks,
            self.data_blocks_start,
        ];
        for (i, word) in words.iter().enumerate() {
            block[i * 4..i * 4 + 4].copy_from_slice(&word.to_le_bytes());
        }
        block
    }
}

// ══════════════════════════════════════════════════════════════
//  Inode
// ══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Regular,
    Directory,
}

impl FileKind {
    fn from_u8(v: u8) -> FileKind {
        // Anything that is not a directory behaves as a regular file.
        if v == 2 { FileKind::Directory } else { FileKind::Regular }
    }

    fn as_u8(self) -> u8 {
        match self {
            FileKind::Regular => 1,
            FileKind::Directory => 2,
        }
    }
}

/// 128-byte fixed record: type, size, used blocks, direct pointers.
/// Unused direct slots hold INVALID_BLOCK.
#[derive(Debug, Clone, Copy)]
pub struct Inode {
    pub kind: FileKind,
    pub size: u32,
    pub blocks_used: u32,
    pub direct_blocks: [u32; DIRECT_BLOCKS],
}

impl Inode {
    pub fn new(kind: FileKind) -> Inode {
        Inode {
            kind,
            size: 0,
            blocks_used: 0,
            direct_blocks: [INVALID_BLOCK; DIRECT_BLOCKS],
        }
    }

    pub fn from_bytes(raw: &[u8]) -> Inode {
        let word = |i: usize| u32::from_le_bytes([raw[i], raw[i + 1], raw[i + 2], raw[i + 3]]);
        let mut direct_blocks = [INVALID_BLOCK; DIRECT_BLOCKS];
        for (i, slot) in direct_blocks.iter_mut().enumerate() {
            *slot = word(12 + i * 4);
        }
        Inode {
            kind: FileKind::from_u8(raw[0]),
            size: word(4),
            blocks_used: word(8),
            direct_blocks,
        }
    }

    pub fn to_bytes(&self) -> [u8; INODE_SIZE] {
        let mut raw = [0u8; INODE_SIZE];
        raw[0] = self.kind.as_u8();
        raw[4..8].copy_from_slice(&self.size.to_le_bytes());
        raw[8..12].copy_from_slice(&self.blocks_used.to_le_bytes());
        for (i, block) in self.direct_blocks.iter().enumerate() {
            raw[12 + i * 4..16 + i * 4].copy_from_slice(&block.to_le_bytes());
        }
        raw
    }
}

// ══════════════════════════════════════════════════════════════
//  Directory entry
// ══════════════════════════════════════════════════════════════

/// 32 bytes: a NUL-padded name and an inode number.
/// `inode_num == INVALID_INODE` marks a free slot.
#[derive(Debug, Clone, Copy)]
pub struct DirEntry {
    pub name: [u8; MAX_FILENAME_LEN],
    pub inode_num: u32,
}

impl DirEntry {
    pub fn new(name: &str, inode_num: u32) -> DirEntry {
        let mut entry = DirEntry::free();
        let bytes = name.as_bytes();
        let len = bytes.len().min(MAX_FILENAME_LEN);
        entry.name[..len].copy_from_slice(&bytes[..len]);
        entry.inode_num = inode_num;
        entry
    }

    pub fn free() -> DirEntry {
        DirEntry { name: [0u8; MAX_FILENAME_LEN], inode_num: INVALID_INODE }
    }

    pub fn is_valid(&self) -> bool {
        self.inode_num != INVALID_INODE
    }

    pub fn name(&self) -> &str {
        let len = self.name.iter().position(|&b| b == 0).unwrap_or(MAX_FILENAME_LEN);
        core::str::from_utf8(&self.name[..len]).unwrap_or("")
    }

    pub fn from_bytes(raw: &[u8]) -> DirEntry {
        let mut name = [0u8; MAX_FILENAME_LEN];
        name.copy_from_slice(&raw[..MAX_FILENAME_LEN]);
        let inode_num = u32::from_le_bytes([raw[28], raw[29], raw[30], raw[31]]);
        DirEntry { name, inode_num }
    }

    pub fn to_bytes(&self) -> [u8; DIRENT_SIZE] {
        let mut raw = [0u8; DIRENT_SIZE];
        raw[..MAX_FILENAME_LEN].copy_from_slice(&self.name);
        raw[28..32].copy_from_slice(&self.inode_num.to_le_bytes());
        raw
    }
}
