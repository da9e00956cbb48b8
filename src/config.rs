//! Global simulator tunables shared by every subsystem.

// ──────────────────────────────────────────────────────────────
//  Memory
// ──────────────────────────────────────────────────────────────

/// Number of physical page frames in the shared pool.
pub const PAGE_FRAMES: usize = 8;

/// Page size in bytes (4 KiB).
pub const PAGE_SIZE: usize = 0x1000;

/// Default virtual address-space size of a process, in pages.
pub const DEFAULT_VIRTUAL_PAGES: usize = 256;

// ──────────────────────────────────────────────────────────────
//  Disk
// ──────────────────────────────────────────────────────────────

/// Backing image created in the working directory on first run.
pub const DISK_IMAGE_NAME: &str = "disk.img";

/// Block size in bytes. Equals the page size so a swapped page fits
/// exactly one block.
pub const DISK_BLOCK_SIZE: usize = 0x1000;

/// Total number of blocks on the device.
pub const DISK_NUM_BLOCKS: usize = 1024;

// ──────────────────────────────────────────────────────────────
//  Swap
// ──────────────────────────────────────────────────────────────

/// Blocks reserved at the tail of the device for swapped-out pages.
pub const SWAP_RESERVED_BLOCKS: usize = 128;

/// First block of the swap region. The file system owns
/// `[0, SWAP_START_BLOCK)`, swap owns `[SWAP_START_BLOCK, DISK_NUM_BLOCKS)`.
pub const SWAP_START_BLOCK: usize = DISK_NUM_BLOCKS - SWAP_RESERVED_BLOCKS;

// ──────────────────────────────────────────────────────────────
//  Processes
// ──────────────────────────────────────────────────────────────

/// Round-robin quantum, in ticks.
pub const DEFAULT_TIME_SLICE: i32 = 3;
