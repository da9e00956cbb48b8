use core::fmt;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{DEFAULT_TIME_SLICE, DEFAULT_VIRTUAL_PAGES};
use super::program::Program;

/// Unique process identifier (PID).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pid(pub u32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Process state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    New,
    Ready,
    Running,
    Blocked,
    Terminated,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            ProcessState::New => "New",
            ProcessState::Ready => "Ready",
            ProcessState::Running => "Running",
            ProcessState::Blocked => "Blocked",
            ProcessState::Terminated => "Terminated",
        };
        write!(f, "{}", s)
    }
}

/// Why a Blocked process is blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    None,
    Sleep,
    Device,
}

/// Process Control Block — the per-process record.
pub struct Pcb {
    pub pid: Pid,
    pub state: ProcessState,

    /// Round-robin quantum and how much of it remains.
    pub time_slice: i32,
    pub time_slice_left: i32,

    pub cpu_time: i32,
    pub total_time: i32,

    /// Ticks remaining for a Sleep block.
    pub blocked_time: u64,
    pub blocked_reason: BlockReason,
    /// Device id this process is queued on, if blocked on a device.
    pub waiting_device: Option<u32>,

    pub program: Arc<Program>,
    /// Index of the next instruction to execute.
    pub pc: usize,

    /// Size of the virtual address space, in pages.
    pub virtual_pages: usize,

    /// Script-local logical fds (>= 3) mapped to global FS descriptors.
    pub fd_map: BTreeMap<i32, i32>,
    pub next_script_fd: i32,
}

impl Pcb {
    /// Pick the lowest unused logical fd at or above the script cursor.
    pub fn allocate_script_fd(&mut self) -> i32 {
        let mut fd = self.next_script_fd;
        while self.fd_map.contains_key(&fd) {
            fd += 1;
        }
        self.next_script_fd = fd + 1;
        fd
    }

    pub fn new(pid: Pid, program: Arc<Program>) -> Pcb {
        let total_time = program.len() as i32;
        Pcb {
            pid,
            state: ProcessState::New,
            time_slice: DEFAULT_TIME_SLICE,
            time_slice_left: DEFAULT_TIME_SLICE,
            cpu_time: 0,
            total_time,
            blocked_time: 0,
            blocked_reason: BlockReason::None,
            waiting_device: None,
            program,
            pc: 0,
            virtual_pages: DEFAULT_VIRTUAL_PAGES,
            fd_map: BTreeMap::new(),
            next_script_fd: 3,
        }
    }
}
