use core::fmt;
use std::collections::BTreeMap;
use std::sync::Arc;

use spin::Mutex;

use crate::config::{DISK_BLOCK_SIZE, PAGE_SIZE};
use crate::dev::disk::{BlockDevice, DiskError};
use crate::proc::process::Pid;
use crate::{log_error, log_info};

use super::frames::PhysicalFrames;
use super::page_table::PageTable;
use super::swap::SwapAllocator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessType {
    Read,
    Write,
}

// ──────────────────────────────────────────────────────────────
//  Error type
// ──────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum MemError {
    NoSuchProcess(Pid),
    InvalidAddress { pid: Pid, vpage: usize },
    SwapExhausted,
    Disk(DiskError),
}

impl fmt::Display for MemError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MemError::NoSuchProcess(pid) => write!(f, "no page table for PID {}", pid),
            MemError::InvalidAddress { pid, vpage } => {
                write!(f, "PID {}: page {} out of range", pid, vpage)
            }
            MemError::SwapExhausted => write!(f, "out of swap blocks"),
            MemError::Disk(e) => write!(f, "disk error: {}", e),
        }
    }
}

impl From<DiskError> for MemError {
    fn from(e: DiskError) -> Self {
        MemError::Disk(e)
    }
}

impl std::error::Error for MemError {}

pub type MemResult<T> = Result<T, MemError>;

// ──────────────────────────────────────────────────────────────
//  Statistics
// ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryStats {
    pub memory_accesses: u64,
    pub page_faults: u64,
}

// ──────────────────────────────────────────────────────────────
//  Memory manager
// ──────────────────────────────────────────────────────────────

/// Owns every page table, the frame pool, the swap allocator and the
/// Clock hand. Services address translation and page faults.
pub struct MemoryManager {
    frames: PhysicalFrames,
    page_tables: BTreeMap<Pid, PageTable>,
    process_stats: BTreeMap<Pid, MemoryStats>,
    stats: MemoryStats,
    swap: SwapAllocator,
    clock_hand: usize,
    disk: Arc<Mutex<BlockDevice>>,
}

impl MemoryManager {
    pub fn new(disk: Arc<Mutex<BlockDevice>>, num_frames: usize) -> MemoryManager {
        MemoryManager {
            frames: PhysicalFrames::new(num_frames),
            page_tables: BTreeMap::new(),
            process_stats: BTreeMap::new(),
            stats: MemoryStats::default(),
            swap: SwapAllocator::new(),
            clock_hand: 0,
            disk,
        }
    }

    /// Build an all-absent page table for a fresh process.
    pub fn create_process_memory(&mut self, pid: Pid, num_pages: usize) {
        self.page_tables.insert(pid, PageTable::new(num_pages));
        self.process_stats.insert(pid, MemoryStats::default());
        log_info!("[Memory] Created page table for PID {} ({} pages)", pid, num_pages);
    }

    /// Free every frame a process holds and drop its page table.
    /// Swap blocks are not reclaimed.
    pub fn free_process_memory(&mut self, pid: Pid) -> MemResult<()> {
        let table = self.page_tables.get(&pid).ok_or(MemError::NoSuchProcess(pid))?;

        for entry in table.iter() {
            if entry.present {
                self.frames.free(entry.frame_number);
            }
        }

        self.page_tables.remove(&pid);
        self.process_stats.remove(&pid);
        log_info!("[Memory] Freed memory for PID {}", pid);
        Ok(())
    }

    /// Translate one simulated access, faulting the page in if needed.
    pub fn access_memory(&mut self, pid: Pid, virtual_addr: u64, access: AccessType) -> MemResult<()> {
        let vpage = (virtual_addr as usize) / PAGE_SIZE;
        let offset = (virtual_addr as usize) % PAGE_SIZE;

        let table = self.page_tables.get(&pid).ok_or(MemError::NoSuchProcess(pid))?;
        if vpage >= table.len() {
            log_error!("[Memory] Invalid address: page {} out of range", vpage);
            return Err(MemError::InvalidAddress { pid, vpage });
        }

        self.stats.memory_accesses += 1;
        if let Some(stats) = self.process_stats.get_mut(&pid) {
            stats.memory_accesses += 1;
        }

        if !self.page_tables[&pid][vpage].present {
            self.stats.page_faults += 1;
            if let Some(stats) = self.process_stats.get_mut(&pid) {
                stats.page_faults += 1;
            }
            log_info!(
                "[PageFault] PID={}, VPage={}, VAddr={:#x}",
                pid, vpage, virtual_addr
            );
            self.handle_page_fault(pid, vpage, access)?;
        }

        let entry = &mut self.page_tables.get_mut(&pid).expect("page table vanished")[vpage];
        entry.referenced = true;
        if access == AccessType::Write {
            entry.dirty = true;
        }

        let physical_addr = entry.frame_number * PAGE_SIZE + offset;
        log_info!(
            "[Memory] PID={}, VAddr={:#x} -> PAddr={:#x}, Frame={}",
            pid, virtual_addr, physical_addr, entry.frame_number
        );

        Ok(())
    }

    /// Bring a page into a frame: reuse a free frame if one exists,
    /// otherwise run Clock replacement.
    fn handle_page_fault(&mut self, pid: Pid, vpage: usize, access: AccessType) -> MemResult<()> {
        let entry = self.page_tables[&pid][vpage];
        if entry.on_disk {
            log_info!(
                "[Swap] Reading PID={} VPage={} from Disk Block {}",
                pid, vpage, entry.swap_block
            );
            // The payload is not modelled; the read only validates the I/O.
            let mut scratch = [0u8; DISK_BLOCK_SIZE];
            self.disk.lock().read_block(entry.swap_block, &mut scratch)?;
        }

        let frame_number = match self.frames.allocate(pid, vpage) {
            Some(frame) => frame,
            None => self.evict_with_clock(pid, vpage)?,
        };

        let entry = &mut self.page_tables.get_mut(&pid).expect("page table vanished")[vpage];
        entry.present = true;
        entry.frame_number = frame_number;
        entry.referenced = true;
        entry.dirty = access == AccessType::Write;

        log_info!("[PageFault] Allocated Frame {} for PID={}, VPage={}", frame_number, pid, vpage);
        Ok(())
    }

    /// Clock (second-chance) replacement: sweep from the hand, clearing
    /// referenced bits, and evict the first unreferenced page. Dirty
    /// victims are written through to swap before the frame moves.
    fn evict_with_clock(&mut self, pid: Pid, vpage: usize) -> MemResult<usize> {
        let total_frames = self.frames.total_frames();

        loop {
            let label = self
                .frames
                .get(self.clock_hand)
                .unwrap_or_else(|| panic!("clock hand points at free frame {}", self.clock_hand));

            let victim_table = self
                .page_tables
                .get_mut(&label.pid)
                .unwrap_or_else(|| panic!("no page table for victim PID {}", label.pid));
            let victim = &mut victim_table[label.vpage];

            if victim.referenced {
                // second chance
                victim.referenced = false;
                self.clock_hand = (self.clock_hand + 1) % total_frames;
                continue;
            }

            log_info!(
                "[Evict] Replacing Frame {} from PID={}, VPage={}",
                self.clock_hand, label.pid, label.vpage
            );

            if victim.dirty {
                if !victim.on_disk {
                    let swap_block = match self.swap.allocate() {
                        Some(block) => block,
                        None => {
                            log_error!("[Swap] Out of swap blocks");
                            return Err(MemError::SwapExhausted);
                        }
                    };
                    victim.swap_block = swap_block;
                    victim.on_disk = true;
                }

                log_info!(
                    "[Swap] Writing PID={} VPage={} to Disk Block {}",
                    label.pid, label.vpage, victim.swap_block
                );
                let page = [0xAAu8; DISK_BLOCK_SIZE];
                self.disk.lock().write_block(victim.swap_block, &page)?;
            }

            victim.clear();
            self.frames.assign(self.clock_hand, pid, vpage);
            let frame_number = self.clock_hand;
            self.clock_hand = (self.clock_hand + 1) % total_frames;
            return Ok(frame_number);
        }
    }

    // ── Inspection ───────────────────────────────────────────

    pub fn page_table(&self, pid: Pid) -> Option<&PageTable> {
        self.page_tables.get(&pid)
    }

    pub fn frames(&self) -> &PhysicalFrames {
        &self.frames
    }

    pub fn stats(&self) -> MemoryStats {
        self.stats
    }

    pub fn process_stats(&self, pid: Pid) -> MemoryStats {
        self.process_stats.get(&pid).copied().unwrap_or_default()
    }

    /// Print one process's page table. Command output, so standard out.
    pub fn dump_page_table(&self, pid: Pid) {
        let table = match self.page_tables.get(&pid) {
            Some(table) => table,
            None => {
                println!("PID {} has no page table", pid);
                return;
            }
        };

        println!("=== Page Table for PID {} ===", pid);
        println!("VPage | Present | Frame | Dirty | Ref | Swap");
        println!("------|---------|-------|-------|-----|-----");
        for (i, entry) in table.iter().enumerate() {
            let frame = if entry.present {
                format!("{:5}", entry.frame_number)
            } else {
                "  -  ".to_string()
            };
            let swap = if entry.on_disk {
                format!("{:4}", entry.swap_block)
            } else {
                "  - ".to_string()
            };
            println!(
                "{:5} |    {}    | {} |   {}   |  {}  | {}",
                i,
                entry.present as u8,
                frame,
                entry.dirty as u8,
                entry.referenced as u8,
                swap
            );
        }

        let stats = self.process_stats(pid);
        println!();
        println!("Stats: {} page faults, {} accesses", stats.page_faults, stats.memory_accesses);
    }

    pub fn dump_frames(&self) {
        self.frames.dump();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SWAP_START_BLOCK;
    use std::path::PathBuf;

    fn temp_disk(tag: &str) -> (Arc<Mutex<BlockDevice>>, PathBuf) {
        let path = std::env::temp_dir().join(format!("tinix-mem-{}-{}.img", std::process::id(), tag));
        let _ = std::fs::remove_file(&path);
        let dev = BlockDevice::open(&path).unwrap();
        (Arc::new(Mutex::new(dev)), path)
    }

    /// Frame labels must mirror the present entries of every table.
    fn assert_labels_consistent(mm: &MemoryManager) {
        let mut seen = std::collections::BTreeSet::new();
        for (&pid, table) in &mm.page_tables {
            for (vpage, entry) in table.iter().enumerate() {
                if entry.present {
                    let label = mm.frames.get(entry.frame_number).expect("present page in free frame");
                    assert_eq!(label.pid, pid);
                    assert_eq!(label.vpage, vpage);
                    assert!(seen.insert(entry.frame_number), "two entries share a frame");
                }
            }
        }
    }

    #[test]
    fn clean_eviction_runs_clock_without_swap() {
        let (disk, path) = temp_disk("clean-evict");
        let mut mm = MemoryManager::new(disk, 2);
        mm.create_process_memory(Pid(1), 3);

        mm.access_memory(Pid(1), 0x0, AccessType::Read).unwrap();
        mm.access_memory(Pid(1), 0x1000, AccessType::Read).unwrap();
        mm.access_memory(Pid(1), 0x2000, AccessType::Read).unwrap();

        let table = mm.page_table(Pid(1)).unwrap();
        // The sweep clears both referenced bits, evicts vpage 0 from
        // frame 0 and loads vpage 2 there.
        assert!(!table[0].present);
        assert!(!table[0].on_disk);
        assert!(table[1].present);
        assert_eq!(table[1].frame_number, 1);
        assert!(table[2].present);
        assert_eq!(table[2].frame_number, 0);

        assert_eq!(mm.stats().page_faults, 3);
        assert_eq!(mm.stats().memory_accesses, 3);
        assert_labels_consistent(&mm);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn dirty_eviction_writes_first_swap_block() {
        let (disk, path) = temp_disk("dirty-evict");
        let mut mm = MemoryManager::new(disk.clone(), 2);
        mm.create_process_memory(Pid(1), 3);

        mm.access_memory(Pid(1), 0x0, AccessType::Write).unwrap();
        mm.access_memory(Pid(1), 0x1000, AccessType::Read).unwrap();
        mm.access_memory(Pid(1), 0x2000, AccessType::Read).unwrap();

        let table = mm.page_table(Pid(1)).unwrap();
        assert!(!table[0].present);
        assert!(table[0].on_disk);
        assert_eq!(table[0].swap_block, SWAP_START_BLOCK);

        let mut block = [0u8; DISK_BLOCK_SIZE];
        disk.lock().read_block(SWAP_START_BLOCK, &mut block).unwrap();
        assert!(block.iter().all(|&b| b == 0xAA));

        assert_labels_consistent(&mm);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn faulting_swapped_page_back_in_reuses_its_block() {
        let (disk, path) = temp_disk("swap-in");
        let mut mm = MemoryManager::new(disk, 2);
        mm.create_process_memory(Pid(1), 3);

        mm.access_memory(Pid(1), 0x0, AccessType::Write).unwrap();
        mm.access_memory(Pid(1), 0x1000, AccessType::Read).unwrap();
        mm.access_memory(Pid(1), 0x2000, AccessType::Read).unwrap();

        // Touch vpage 0 again: it pages back in from its swap block and
        // keeps the residency for later evictions.
        mm.access_memory(Pid(1), 0x0, AccessType::Read).unwrap();
        let table = mm.page_table(Pid(1)).unwrap();
        assert!(table[0].present);
        assert!(table[0].on_disk);
        assert_eq!(table[0].swap_block, SWAP_START_BLOCK);
        assert_eq!(mm.stats().page_faults, 4);

        assert_labels_consistent(&mm);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn full_sweep_clears_all_referenced_bits_before_evicting() {
        let (disk, path) = temp_disk("sweep");
        let mut mm = MemoryManager::new(disk, 4);
        mm.create_process_memory(Pid(1), 8);

        for vpage in 0..4 {
            mm.access_memory(Pid(1), (vpage * PAGE_SIZE) as u64, AccessType::Read).unwrap();
        }
        // All four frames used, all referenced. The next fault sweeps the
        // whole pool once, then evicts at the hand (frame 0).
        mm.access_memory(Pid(1), (4 * PAGE_SIZE) as u64, AccessType::Read).unwrap();

        let table = mm.page_table(Pid(1)).unwrap();
        assert!(!table[0].present);
        assert!(table[4].present);
        assert_eq!(table[4].frame_number, 0);
        for vpage in 1..4 {
            assert!(table[vpage].present);
            assert!(!table[vpage].referenced, "sweep must clear vpage {}", vpage);
        }

        assert_labels_consistent(&mm);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn out_of_range_page_fails_without_counting_a_fault() {
        let (disk, path) = temp_disk("range");
        let mut mm = MemoryManager::new(disk, 2);
        mm.create_process_memory(Pid(1), 4);

        let far = (4 * PAGE_SIZE) as u64;
        assert!(matches!(
            mm.access_memory(Pid(1), far, AccessType::Read),
            Err(MemError::InvalidAddress { .. })
        ));
        assert_eq!(mm.stats().memory_accesses, 0);
        assert_eq!(mm.stats().page_faults, 0);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn free_process_memory_releases_frames() {
        let (disk, path) = temp_disk("free");
        let mut mm = MemoryManager::new(disk, 4);
        mm.create_process_memory(Pid(1), 4);
        mm.create_process_memory(Pid(2), 4);

        mm.access_memory(Pid(1), 0x0, AccessType::Read).unwrap();
        mm.access_memory(Pid(1), 0x1000, AccessType::Read).unwrap();
        mm.access_memory(Pid(2), 0x0, AccessType::Read).unwrap();

        mm.free_process_memory(Pid(1)).unwrap();
        assert_eq!(mm.frames().used_frames(), 1);
        for frame in 0..mm.frames().total_frames() {
            if let Some(label) = mm.frames().get(frame) {
                assert_ne!(label.pid, Pid(1));
            }
        }
        assert!(mm.page_table(Pid(1)).is_none());
        assert!(matches!(mm.free_process_memory(Pid(1)), Err(MemError::NoSuchProcess(_))));

        std::fs::remove_file(&path).unwrap();
    }
}
