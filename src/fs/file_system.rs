use std::sync::Arc;

use spin::Mutex;

use crate::dev::disk::BlockDevice;
use crate::{log_error, log_info};

use super::bitmap::Bitmap;
use super::defs::*;
use super::error::{FsError, FsResult};
use super::fd::OpenFileTable;
use super::path::{normalize_path, split_path};

/// An entry of a directory listing, resolved for display.
pub struct ListEntry {
    pub name: String,
    pub inode_num: u32,
    pub inode: Inode,
}

/// The single-volume on-disk file system.
///
/// The SuperBlock and both bitmaps are cached in memory and written
/// through on every mutating operation; an unmount (drop) flushes any
/// remaining dirty state.
pub struct FileSystem {
    disk: Arc<Mutex<BlockDevice>>,
    superblock: SuperBlock,
    inode_bitmap: Bitmap,
    data_bitmap: Bitmap,
    bitmap_dirty: bool,
    mounted: bool,
    current_dir: String,
    open_files: OpenFileTable,
}

impl FileSystem {
    pub fn new(disk: Arc<Mutex<BlockDevice>>) -> FileSystem {
        FileSystem {
            disk,
            superblock: SuperBlock::default(),
            inode_bitmap: Bitmap::new(),
            data_bitmap: Bitmap::new(),
            bitmap_dirty: false,
            mounted: false,
            current_dir: String::from("/"),
            open_files: OpenFileTable::new(),
        }
    }

    // ══════════════════════════════════════════════════════════
    //  Format / mount
    // ══════════════════════════════════════════════════════════

    /// Write a fresh SuperBlock, bitmaps, inode table and root
    /// directory, then mark the volume mounted.
    pub fn format(&mut self) -> FsResult<()> {
        log_info!("[FS] Formatting file system...");

        self.superblock = SuperBlock {
            magic: FS_MAGIC,
            total_blocks: TOTAL_BLOCKS,
            total_inodes: MAX_INODES,
            free_blocks: MAX_DATA_BLOCKS,
            free_inodes: MAX_INODES - 1, // root takes one
            inode_bitmap_block: INODE_BITMAP_BLOCK,
            data_bitmap_block: DATA_BITMAP_BLOCK,
            inode_table_start: INODE_TABLE_START,
            inode_table_blocks: INODE_TABLE_BLOCKS,
            data_blocks_start: DATA_BLOCKS_START,
        };
        self.save_superblock()?;

        self.inode_bitmap = Bitmap::new();
        self.inode_bitmap.set(ROOT_INODE);
        self.data_bitmap = Bitmap::new();
        self.save_bitmaps()?;

        let zero_block = [0u8; BLOCK_SIZE];
        for i in 0..INODE_TABLE_BLOCKS {
            self.disk.lock().write_block((INODE_TABLE_START + i) as usize, &zero_block)?;
        }

        self.init_root_directory()?;

        self.mounted = true;
        self.current_dir = String::from("/");
        self.save_superblock()?;
        self.save_bitmaps()?;

        log_info!("[FS] Format complete!");
        log_info!(
            "[FS] Total blocks: {}, Total inodes: {}",
            self.superblock.total_blocks, self.superblock.total_inodes
        );
        Ok(())
    }

    /// Load the SuperBlock, validate magic and layout, cache the bitmaps.
    pub fn mount(&mut self) -> FsResult<()> {
        log_info!("[FS] Mounting file system...");

        let mut block = [0u8; BLOCK_SIZE];
        self.disk.lock().read_block(SUPERBLOCK_BLOCK as usize, &mut block)?;
        let superblock = SuperBlock::from_block(&block);

        if superblock.magic != FS_MAGIC {
            log_error!(
                "[FS] Mount failed: magic number mismatch (expected: {:#x}, actual: {:#x})",
                FS_MAGIC, superblock.magic
            );
            return Err(FsError::InvalidMagic { expected: FS_MAGIC, actual: superblock.magic });
        }
        if superblock.total_blocks != TOTAL_BLOCKS || superblock.total_inodes != MAX_INODES {
            log_error!("[FS] Mount failed: layout mismatch, please re-format");
            return Err(FsError::LayoutMismatch);
        }

        self.superblock = superblock;
        self.disk.lock().read_block(INODE_BITMAP_BLOCK as usize, &mut block)?;
        self.inode_bitmap = Bitmap::from_block(&block);
        self.disk.lock().read_block(DATA_BITMAP_BLOCK as usize, &mut block)?;
        self.data_bitmap = Bitmap::from_block(&block);

        self.mounted = true;
        self.bitmap_dirty = false;
        self.current_dir = String::from("/");

        log_info!("[FS] Mount successful!");
        log_info!(
            "[FS] Free blocks: {}, Free inodes: {}",
            self.superblock.free_blocks, self.superblock.free_inodes
        );
        Ok(())
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    fn require_mounted(&self) -> FsResult<()> {
        if self.mounted {
            Ok(())
        } else {
            log_error!("[FS] File system not mounted");
            Err(FsError::NotMounted)
        }
    }

    fn init_root_directory(&mut self) -> FsResult<()> {
        let root_block = self.alloc_block().ok_or(FsError::BlockExhausted)?;

        let mut root = Inode::new(FileKind::Directory);
        root.size = 2 * DIRENT_SIZE as u32;
        root.blocks_used = 1;
        root.direct_blocks[0] = root_block;
        self.write_inode(ROOT_INODE, &root)?;

        let mut entries = empty_dir_entries();
        entries[0] = DirEntry::new(".", ROOT_INODE);
        entries[1] = DirEntry::new("..", ROOT_INODE);
        self.write_dir_block(root_block, &entries)?;

        log_info!("[FS] Root directory created (inode={}, block={})", ROOT_INODE, root_block);
        Ok(())
    }

    // ══════════════════════════════════════════════════════════
    //  SuperBlock / bitmap / inode-table persistence
    // ══════════════════════════════════════════════════════════

    fn save_superblock(&mut self) -> FsResult<()> {
        let block = self.superblock.to_block();
        self.disk.lock().write_block(SUPERBLOCK_BLOCK as usize, &block)?;
        Ok(())
    }

    fn save_bitmaps(&mut self) -> FsResult<()> {
        self.disk.lock().write_block(INODE_BITMAP_BLOCK as usize, self.inode_bitmap.as_block())?;
        self.disk.lock().write_block(DATA_BITMAP_BLOCK as usize, self.data_bitmap.as_block())?;
        self.bitmap_dirty = false;
        Ok(())
    }

    /// Persist accounting after a mutating operation (write-through).
    fn sync_metadata(&mut self) -> FsResult<()> {
        self.save_superblock()?;
        self.save_bitmaps()
    }

    fn alloc_inode(&mut self) -> Option<u32> {
        let inode_num = self.inode_bitmap.allocate(MAX_INODES)?;
        self.superblock.free_inodes -= 1;
        self.bitmap_dirty = true;
        Some(inode_num)
    }

    fn free_inode(&mut self, inode_num: u32) {
        self.inode_bitmap.clear(inode_num);
        self.superblock.free_inodes += 1;
        self.bitmap_dirty = true;
    }

    /// Allocate a data block, returning its absolute block id.
    fn alloc_block(&mut self) -> Option<u32> {
        let index = self.data_bitmap.allocate(MAX_DATA_BLOCKS)?;
        self.superblock.free_blocks -= 1;
        self.bitmap_dirty = true;
        Some(DATA_BLOCKS_START + index)
    }

    fn free_block(&mut self, block: u32) {
        self.data_bitmap.clear(block - DATA_BLOCKS_START);
        self.superblock.free_blocks += 1;
        self.bitmap_dirty = true;
    }

    fn read_inode(&mut self, inode_num: u32) -> FsResult<Inode> {
        let block_id = INODE_TABLE_START as usize + inode_num as usize / INODES_PER_BLOCK;
        let offset = (inode_num as usize % INODES_PER_BLOCK) * INODE_SIZE;

        let mut block = [0u8; BLOCK_SIZE];
        self.disk.lock().read_block(block_id, &mut block)?;
        Ok(Inode::from_bytes(&block[offset..offset + INODE_SIZE]))
    }

    fn write_inode(&mut self, inode_num: u32, inode: &Inode) -> FsResult<()> {
        let block_id = INODE_TABLE_START as usize + inode_num as usize / INODES_PER_BLOCK;
        let offset = (inode_num as usize % INODES_PER_BLOCK) * INODE_SIZE;

        let mut block = [0u8; BLOCK_SIZE];
        self.disk.lock().read_block(block_id, &mut block)?;
        block[offset..offset + INODE_SIZE].copy_from_slice(&inode.to_bytes());
        self.disk.lock().write_block(block_id, &block)?;
        Ok(())
    }

    // ══════════════════════════════════════════════════════════
    //  Directory plumbing
    // ══════════════════════════════════════════════════════════

    fn read_dir_block(&mut self, block_id: u32) -> FsResult<Vec<DirEntry>> {
        let mut block = [0u8; BLOCK_SIZE];
        self.disk.lock().read_block(block_id as usize, &mut block)?;
        Ok(block
            .chunks_exact(DIRENT_SIZE)
            .map(DirEntry::from_bytes)
            .collect())
    }

    fn write_dir_block(&mut self, block_id: u32, entries: &[DirEntry]) -> FsResult<()> {
        let mut block = [0u8; BLOCK_SIZE];
        for (i, entry) in entries.iter().enumerate() {
            block[i * DIRENT_SIZE..(i + 1) * DIRENT_SIZE].copy_from_slice(&entry.to_bytes());
        }
        self.disk.lock().write_block(block_id as usize, &block)?;
        Ok(())
    }

    /// Scan one directory for an exact name match.
    fn lookup_in_directory(&mut self, dir_inode: u32, name: &str) -> FsResult<Option<u32>> {
        let inode = self.read_inode(dir_inode)?;
        if inode.kind != FileKind::Directory {
            return Err(FsError::NotADirectory);
        }

        for i in 0..inode.blocks_used as usize {
            let entries = self.read_dir_block(inode.direct_blocks[i])?;
            for entry in entries {
                if entry.is_valid() && entry.name() == name {
                    return Ok(Some(entry.inode_num));
                }
            }
        }
        Ok(None)
    }

    /// Resolve a path (relative paths resolve against the current
    /// directory) to an inode number.
    pub fn lookup_path(&mut self, path: &str) -> FsResult<u32> {
        let normalized = normalize_path(path, &self.current_dir);
        if normalized == "/" {
            return Ok(ROOT_INODE);
        }

        let mut current = ROOT_INODE;
        for component in normalized.trim_start_matches('/').split('/') {
            if component.is_empty() || component == "." {
                continue;
            }
            current = self
                .lookup_in_directory(current, component)?
                .ok_or(FsError::NoSuchPath)?;
        }
        Ok(current)
    }

    /// Insert an entry into a directory, appending a data block when
    /// every existing slot is taken.
    fn add_directory_entry(&mut self, dir_inode: u32, name: &str, inode_num: u32) -> FsResult<()> {
        let mut inode = self.read_inode(dir_inode)?;

        for i in 0..inode.blocks_used as usize {
            let block_id = inode.direct_blocks[i];
            let mut entries = self.read_dir_block(block_id)?;
            if let Some(slot) = entries.iter().position(|e| !e.is_valid()) {
                entries[slot] = DirEntry::new(name, inode_num);
                self.write_dir_block(block_id, &entries)?;
                inode.size += DIRENT_SIZE as u32;
                self.write_inode(dir_inode, &inode)?;
                return Ok(());
            }
        }

        if inode.blocks_used as usize >= DIRECT_BLOCKS {
            log_error!("[FS] Directory full");
            return Err(FsError::DirectoryFull);
        }

        let new_block = self.alloc_block().ok_or(FsError::BlockExhausted)?;
        let mut entries = empty_dir_entries();
        entries[0] = DirEntry::new(name, inode_num);
        self.write_dir_block(new_block, &entries)?;

        inode.direct_blocks[inode.blocks_used as usize] = new_block;
        inode.blocks_used += 1;
        inode.size += DIRENT_SIZE as u32;
        self.write_inode(dir_inode, &inode)?;
        Ok(())
    }

    fn remove_directory_entry(&mut self, dir_inode: u32, name: &str) -> FsResult<()> {
        let mut inode = self.read_inode(dir_inode)?;

        for i in 0..inode.blocks_used as usize {
            let block_id = inode.direct_blocks[i];
            let mut entries = self.read_dir_block(block_id)?;
            if let Some(slot) = entries.iter().position(|e| e.is_valid() && e.name() == name) {
                entries[slot] = DirEntry::free();
                self.write_dir_block(block_id, &entries)?;
                inode.size -= DIRENT_SIZE as u32;
                self.write_inode(dir_inode, &inode)?;
                return Ok(());
            }
        }
        Err(FsError::NoSuchPath)
    }

    // ══════════════════════════════════════════════════════════
    //  Files and directories
    // ══════════════════════════════════════════════════════════

    /// Create an empty regular file.
    pub fn create_file(&mut self, path: &str) -> FsResult<u32> {
        self.require_mounted()?;

        let normalized = normalize_path(path, &self.current_dir);
        let (parent_path, name) = split_path(&normalized);

        let parent_inode = self.lookup_path(&parent_path).map_err(|e| {
            log_error!("[FS] Parent directory not found: {}", parent_path);
            e
        })?;
        if self.lookup_in_directory(parent_inode, &name)?.is_some() {
            log_error!("[FS] File already exists: {}", path);
            return Err(FsError::AlreadyExists);
        }

        let new_inode = self.alloc_inode().ok_or(FsError::InodeExhausted)?;
        let inode = Inode::new(FileKind::Regular);
        self.write_inode(new_inode, &inode)?;

        if let Err(e) = self.add_directory_entry(parent_inode, &name, new_inode) {
            self.free_inode(new_inode);
            return Err(e);
        }

        self.sync_metadata()?;
        log_info!("[FS] Created file: {} (inode={})", path, new_inode);
        Ok(new_inode)
    }

    /// Remove a file, returning its blocks and inode to the bitmaps.
    pub fn remove_file(&mut self, path: &str) -> FsResult<()> {
        self.require_mounted()?;

        let normalized = normalize_path(path, &self.current_dir);
        let (parent_path, name) = split_path(&normalized);

        let parent_inode = self.lookup_path(&parent_path)?;
        let file_inode = self
            .lookup_in_directory(parent_inode, &name)?
            .ok_or_else(|| {
                log_error!("[FS] File not found: {}", path);
                FsError::NoSuchPath
            })?;

        let inode = self.read_inode(file_inode)?;
        for i in 0..inode.blocks_used as usize {
            self.free_block(inode.direct_blocks[i]);
        }
        self.free_inode(file_inode);
        self.remove_directory_entry(parent_inode, &name)?;

        self.sync_metadata()?;
        log_info!("[FS] Removed file: {}", path);
        Ok(())
    }

    /// Create a directory populated with `.` and `..`.
    pub fn create_directory(&mut self, path: &str) -> FsResult<u32> {
        self.require_mounted()?;

        let normalized = normalize_path(path, &self.current_dir);
        let (parent_path, name) = split_path(&normalized);

        let parent_inode = self.lookup_path(&parent_path).map_err(|e| {
            log_error!("[FS] Parent directory not found: {}", parent_path);
            e
        })?;
        if self.lookup_in_directory(parent_inode, &name)?.is_some() {
            log_error!("[FS] Directory already exists: {}", path);
            return Err(FsError::AlreadyExists);
        }

        let new_inode = self.alloc_inode().ok_or(FsError::InodeExhausted)?;
        let data_block = match self.alloc_block() {
            Some(block) => block,
            None => {
                self.free_inode(new_inode);
                return Err(FsError::BlockExhausted);
            }
        };

        let mut inode = Inode::new(FileKind::Directory);
        inode.size = 2 * DIRENT_SIZE as u32;
        inode.blocks_used = 1;
        inode.direct_blocks[0] = data_block;

        let mut entries = empty_dir_entries();
        entries[0] = DirEntry::new(".", new_inode);
        entries[1] = DirEntry::new("..", parent_inode);
        self.write_dir_block(data_block, &entries)?;
        self.write_inode(new_inode, &inode)?;

        if let Err(e) = self.add_directory_entry(parent_inode, &name, new_inode) {
            self.free_block(data_block);
            self.free_inode(new_inode);
            return Err(e);
        }

        self.sync_metadata()?;
        log_info!("[FS] Created directory: {} (inode={})", path, new_inode);
        Ok(new_inode)
    }

    /// Change the working directory.
    pub fn change_directory(&mut self, path: &str) -> FsResult<()> {
        self.require_mounted()?;

        let inode_num = self.lookup_path(path).map_err(|e| {
            log_error!("[FS] Directory not found: {}", path);
            e
        })?;
        let inode = self.read_inode(inode_num)?;
        if inode.kind != FileKind::Directory {
            log_error!("[FS] Not a directory: {}", path);
            return Err(FsError::NotADirectory);
        }

        self.current_dir = normalize_path(path, &self.current_dir);
        log_info!("[FS] Changed directory to: {}", self.current_dir);
        Ok(())
    }

    pub fn current_dir(&self) -> &str {
        &self.current_dir
    }

    /// Collect the valid entries of a directory for display.
    pub fn list_directory(&mut self, path: &str) -> FsResult<Vec<ListEntry>> {
        self.require_mounted()?;

        let dir_inode = self.lookup_path(path).map_err(|e| {
            log_error!("[FS] Directory not found: {}", path);
            e
        })?;
        let inode = self.read_inode(dir_inode)?;
        if inode.kind != FileKind::Directory {
            log_error!("[FS] Not a directory: {}", path);
            return Err(FsError::NotADirectory);
        }

        let mut listing = Vec::new();
        for i in 0..inode.blocks_used as usize {
            let entries = self.read_dir_block(inode.direct_blocks[i])?;
            for entry in entries {
                if entry.is_valid() {
                    let entry_inode = self.read_inode(entry.inode_num)?;
                    listing.push(ListEntry {
                        name: entry.name().to_string(),
                        inode_num: entry.inode_num,
                        inode: entry_inode,
                    });
                }
            }
        }
        Ok(listing)
    }

    /// Stat a path.
    pub fn stat(&mut self, path: &str) -> FsResult<Inode> {
        self.require_mounted()?;
        let inode_num = self.lookup_path(path)?;
        self.read_inode(inode_num)
    }

    // ══════════════════════════════════════════════════════════
    //  Open / close / read / write
    // ══════════════════════════════════════════════════════════

    /// Open a regular file; the descriptor starts at offset 0.
    pub fn open_file(&mut self, path: &str) -> FsResult<i32> {
        self.require_mounted()?;

        let inode_num = self.lookup_path(path).map_err(|e| {
            log_error!("[FS] File not found: {}", path);
            e
        })?;
        let inode = self.read_inode(inode_num)?;
        if inode.kind != FileKind::Regular {
            log_error!("[FS] Not a regular file: {}", path);
            return Err(FsError::NotARegularFile);
        }

        let fd = self.open_files.alloc(inode_num);
        log_info!("[FS] Opened file: {} (fd={})", path, fd);
        Ok(fd)
    }

    pub fn close_file(&mut self, fd: i32) -> FsResult<()> {
        if self.open_files.release(fd) {
            log_info!("[FS] Closed file (fd={})", fd);
            Ok(())
        } else {
            Err(FsError::BadDescriptor(fd))
        }
    }

    /// Read up to `buf.len()` bytes at the descriptor's offset.
    pub fn read_file(&mut self, fd: i32, buf: &mut [u8]) -> FsResult<usize> {
        let file = *self
            .open_files
            .get_mut(fd)
            .ok_or_else(|| {
                log_error!("[FS] Invalid file descriptor: {}", fd);
                FsError::BadDescriptor(fd)
            })?;

        let inode = self.read_inode(file.inode_num)?;
        let available = inode.size.saturating_sub(file.offset) as usize;
        let to_read = buf.len().min(available);

        let mut bytes_read = 0;
        let mut offset = file.offset as usize;
        while bytes_read < to_read {
            let block_idx = offset / BLOCK_SIZE;
            let block_offset = offset % BLOCK_SIZE;
            if block_idx >= inode.blocks_used as usize {
                break;
            }

            let mut block = [0u8; BLOCK_SIZE];
            self.disk.lock().read_block(inode.direct_blocks[block_idx] as usize, &mut block)?;

            let chunk = (to_read - bytes_read).min(BLOCK_SIZE - block_offset);
            buf[bytes_read..bytes_read + chunk]
                .copy_from_slice(&block[block_offset..block_offset + chunk]);
            bytes_read += chunk;
            offset += chunk;
        }

        self.open_files.get_mut(fd).expect("descriptor vanished").offset = offset as u32;
        Ok(bytes_read)
    }

    /// Write at the descriptor's offset, allocating data blocks as
    /// needed. Returns a short count when the direct-block limit or the
    /// free-block pool is hit.
    pub fn write_file(&mut self, fd: i32, data: &[u8]) -> FsResult<usize> {
        let file = *self
            .open_files
            .get_mut(fd)
            .ok_or_else(|| {
                log_error!("[FS] Invalid file descriptor: {}", fd);
                FsError::BadDescriptor(fd)
            })?;

        let mut inode = self.read_inode(file.inode_num)?;
        let mut bytes_written = 0;
        let mut offset = file.offset as usize;

        while bytes_written < data.len() {
            let block_idx = offset / BLOCK_SIZE;
            let block_offset = offset % BLOCK_SIZE;

            if block_idx >= inode.blocks_used as usize {
                if block_idx >= DIRECT_BLOCKS {
                    log_error!("[FS] File size limit reached");
                    break;
                }
                let new_block = match self.alloc_block() {
                    Some(block) => block,
                    None => {
                        log_error!("[FS] No free blocks");
                        break;
                    }
                };
                inode.direct_blocks[block_idx] = new_block;
                inode.blocks_used += 1;
            }

            let block_id = inode.direct_blocks[block_idx] as usize;
            let mut block = [0u8; BLOCK_SIZE];
            let remaining = data.len() - bytes_written;
            // Partial block writes must preserve the bytes around them.
            if block_offset != 0 || remaining < BLOCK_SIZE {
                self.disk.lock().read_block(block_id, &mut block)?;
            }

            let chunk = remaining.min(BLOCK_SIZE - block_offset);
            block[block_offset..block_offset + chunk]
                .copy_from_slice(&data[bytes_written..bytes_written + chunk]);
            self.disk.lock().write_block(block_id, &block)?;

            bytes_written += chunk;
            offset += chunk;
            if offset as u32 > inode.size {
                inode.size = offset as u32;
            }
        }

        self.write_inode(file.inode_num, &inode)?;
        self.open_files.get_mut(fd).expect("descriptor vanished").offset = offset as u32;
        self.sync_metadata()?;
        Ok(bytes_written)
    }

    pub fn open_count(&self) -> usize {
        self.open_files.len()
    }

    pub fn superblock(&self) -> &SuperBlock {
        &self.superblock
    }

    /// Print the cached SuperBlock. Command output, so standard out.
    pub fn print_superblock(&self) {
        println!("========== SuperBlock ==========");
        println!("Magic: {:#x}", self.superblock.magic);
        println!("Total blocks: {}", self.superblock.total_blocks);
        println!("Total inodes: {}", self.superblock.total_inodes);
        println!("Free blocks: {}", self.superblock.free_blocks);
        println!("Free inodes: {}", self.superblock.free_inodes);
        println!("Data blocks start: {}", self.superblock.data_blocks_start);
        println!("===============================");
    }
}

impl Drop for FileSystem {
    fn drop(&mut self) {
        if self.mounted && self.bitmap_dirty {
            let _ = self.save_bitmaps();
            let _ = self.save_superblock();
        }
    }
}

fn empty_dir_entries() -> Vec<DirEntry> {
    vec![DirEntry::free(); DIRENTS_PER_BLOCK]
}
