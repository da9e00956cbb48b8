use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use std::sync::Arc;

use spin::Mutex;

use crate::dev::device_manager::DeviceManager;
use crate::fs::file_system::FileSystem;
use crate::mem::manager::{AccessType, MemoryManager};
use crate::{log_error, log_info, log_warn};

use super::process::{BlockReason, Pcb, Pid, ProcessState};
use super::program::{Instruction, Program, ProgramError};

/// Per-instruction ceiling for simulated file I/O sizes (1 MiB).
const MAX_IO_BYTES: u64 = 1 << 20;

/// Owns the process table, the ready queue and the current-running pid.
/// Drives the tick loop: scheduling, instruction execution and sleep
/// timers.
pub struct ProcessManager {
    processes: BTreeMap<Pid, Pcb>,
    ready_queue: VecDeque<Pid>,
    next_pid: u32,
    next_tick: u64,
    current: Option<Pid>,

    memory: Arc<Mutex<MemoryManager>>,
    devices: Arc<Mutex<DeviceManager>>,
    fs: Arc<Mutex<FileSystem>>,
}

impl ProcessManager {
    pub fn new(
        memory: Arc<Mutex<MemoryManager>>,
        devices: Arc<Mutex<DeviceManager>>,
        fs: Arc<Mutex<FileSystem>>,
    ) -> ProcessManager {
        ProcessManager {
            processes: BTreeMap::new(),
            ready_queue: VecDeque::new(),
            next_pid: 1,
            next_tick: 0,
            current: None,
            memory,
            devices,
            fs,
        }
    }

    // ══════════════════════════════════════════════════════════
    //  Process creation / termination
    // ══════════════════════════════════════════════════════════

    /// Create a compute-only process of the given length.
    pub fn create_process(&mut self, total_time: usize) -> Pid {
        self.create_process_with_program(Arc::new(Program::compute_only(total_time)))
    }

    /// Create a process from a `.pc` script file.
    pub fn create_process_from_file(&mut self, path: &Path) -> Result<Pid, ProgramError> {
        let program = Program::load_from_file(path).map_err(|e| {
            log_error!("Failed to load program from {}: {}", path.display(), e);
            e
        })?;
        Ok(self.create_process_with_program(Arc::new(program)))
    }

    /// Install a program: fresh pid, Ready PCB, ready-queue slot and a
    /// virtual address space.
    pub fn create_process_with_program(&mut self, program: Arc<Program>) -> Pid {
        let pid = Pid(self.next_pid);
        self.next_pid += 1;

        let mut pcb = Pcb::new(pid, program);
        pcb.state = ProcessState::Ready;
        let virtual_pages = pcb.virtual_pages;
        let length = pcb.program.len();

        self.processes.insert(pid, pcb);
        self.ready_queue.push_back(pid);
        self.memory.lock().create_process_memory(pid, virtual_pages);

        println!("Process {} created with {} instructions", pid, length);
        pid
    }

    /// Force-terminate a process, releasing everything it holds.
    pub fn terminate_process(&mut self, pid: Pid) -> bool {
        if !self.processes.contains_key(&pid) {
            println!("Process {} not found.", pid);
            return false;
        }

        self.release_process_resources(pid);
        self.processes.remove(&pid);
        if self.current == Some(pid) {
            self.current = None;
        }
        println!("Process {} terminated.", pid);
        true
    }

    /// Hand back devices (waking successors), close every open fd and
    /// free the address space. Shared by kill and natural completion.
    fn release_process_resources(&mut self, pid: Pid) {
        let released = self.devices.lock().release_all(pid);
        for (dev, next) in released {
            self.wake_device_successor(dev, next);
        }

        let fd_map = self
            .processes
            .get_mut(&pid)
            .map(|pcb| std::mem::take(&mut pcb.fd_map))
            .unwrap_or_default();
        for (_, global_fd) in fd_map {
            if let Err(e) = self.fs.lock().close_file(global_fd) {
                log_error!("[FS] close of fd {} during teardown failed: {}", global_fd, e);
            }
        }

        if let Err(e) = self.memory.lock().free_process_memory(pid) {
            log_error!("[Memory] {}", e);
        }
    }

    // ══════════════════════════════════════════════════════════
    //  Scheduler
    // ══════════════════════════════════════════════════════════

    /// Pop ready-queue entries until one still names a Ready process.
    /// Stale pids (terminated or re-blocked) are skipped.
    fn schedule(&mut self) {
        while let Some(pid) = self.ready_queue.pop_front() {
            match self.processes.get_mut(&pid) {
                Some(pcb) if pcb.state == ProcessState::Ready => {
                    pcb.state = ProcessState::Running;
                    self.current = Some(pid);
                    log_info!("[Schedule] Process {} is now running", pid);
                    return;
                }
                _ => continue,
            }
        }
        log_info!("[Schedule] CPU idle - no ready processes");
    }

    /// One simulation step: dispatch, execute one instruction, update
    /// timing, apply state transitions, then age sleep timers.
    pub fn tick(&mut self) {
        log_info!("=== Tick {} ===", self.next_tick);
        self.next_tick += 1;

        if self.current.is_none() {
            self.schedule();
        }

        if let Some(pid) = self.current {
            let instruction = {
                let pcb = self
                    .processes
                    .get(&pid)
                    .unwrap_or_else(|| panic!("current PID {} not in process table", pid));
                pcb.program.get(pcb.pc).cloned()
            };
            if let Some(instruction) = instruction {
                self.execute_instruction(pid, &instruction);
            }

            let pcb = self.processes.get_mut(&pid).expect("running process vanished");
            pcb.pc += 1;
            pcb.time_slice_left -= 1;
            pcb.cpu_time += 1;
            log_info!(
                "[Tick] Process {} executing (PC={}/{}, slice remaining: {})",
                pid, pcb.pc, pcb.program.len(), pcb.time_slice_left
            );

            let finished = pcb.pc >= pcb.program.len();
            let blocked = pcb.state == ProcessState::Blocked;
            let quantum_out = pcb.time_slice_left <= 0;

            if finished {
                log_info!("[Tick] Process {} completed", pid);
                let pcb = self.processes.get_mut(&pid).expect("running process vanished");
                pcb.state = ProcessState::Terminated;
                self.release_process_resources(pid);
                self.processes.remove(&pid);
                self.current = None;
            } else if blocked {
                log_info!("[Tick] Process {} blocked during execution", pid);
                self.current = None;
            } else if quantum_out {
                log_info!("[Tick] Process {} time slice exhausted", pid);
                let pcb = self.processes.get_mut(&pid).expect("running process vanished");
                pcb.state = ProcessState::Ready;
                pcb.time_slice_left = pcb.time_slice;
                self.ready_queue.push_back(pid);
                self.current = None;
            }
        }

        self.check_blocked_processes();
    }

    /// Age the sleep timers of Blocked processes; wake the expired
    /// ones. Device waits are untouched here (release wakes those).
    fn check_blocked_processes(&mut self) {
        let mut woken = Vec::new();
        for (&pid, pcb) in self.processes.iter_mut() {
            if pcb.state == ProcessState::Blocked
                && pcb.blocked_reason == BlockReason::Sleep
                && pcb.blocked_time > 0
            {
                pcb.blocked_time -= 1;
                if pcb.blocked_time == 0 {
                    pcb.state = ProcessState::Ready;
                    pcb.blocked_reason = BlockReason::None;
                    woken.push(pid);
                }
            }
        }
        for pid in woken {
            self.ready_queue.push_back(pid);
            log_info!("[Tick] Process {} auto-woken up", pid);
        }
    }

    // ══════════════════════════════════════════════════════════
    //  Manual operations
    // ══════════════════════════════════════════════════════════

    /// Schedule a specific Ready process now, preempting the current one.
    pub fn run_process(&mut self, pid: Pid) {
        match self.processes.get(&pid) {
            None => {
                println!("Process {} not found.", pid);
                return;
            }
            Some(pcb) if pcb.state != ProcessState::Ready => {
                println!("Process {} is not in Ready state", pid);
                return;
            }
            Some(_) => {}
        }

        if let Some(running) = self.current {
            if let Some(pcb) = self.processes.get_mut(&running) {
                pcb.state = ProcessState::Ready;
                self.ready_queue.push_back(running);
                println!("Process {} preempted", running);
            }
        }

        let pcb = self.processes.get_mut(&pid).expect("checked above");
        pcb.state = ProcessState::Running;
        self.current = Some(pid);
        println!("Process {} is now running", pid);
    }

    /// Put a Running or Ready process to sleep for `duration` ticks.
    pub fn block_process(&mut self, pid: Pid, duration: u64) {
        let pcb = match self.processes.get_mut(&pid) {
            None => {
                println!("Process {} not found.", pid);
                return;
            }
            Some(pcb) => pcb,
        };
        if pcb.state != ProcessState::Running && pcb.state != ProcessState::Ready {
            println!("Process {} cannot be blocked in its current state", pid);
            return;
        }

        pcb.state = ProcessState::Blocked;
        pcb.blocked_reason = BlockReason::Sleep;
        pcb.blocked_time = duration;
        println!("Process {} is blocked for {} ticks", pid, duration);

        if self.current == Some(pid) {
            self.current = None;
            self.schedule();
        }
    }

    /// Wake a Blocked process regardless of what it waits on.
    pub fn wakeup_process(&mut self, pid: Pid) {
        let pcb = match self.processes.get_mut(&pid) {
            None => {
                println!("Process {} not found.", pid);
                return;
            }
            Some(pcb) => pcb,
        };
        if pcb.state != ProcessState::Blocked {
            println!("Process {} is not blocked", pid);
            return;
        }

        let was_device_wait = pcb.blocked_reason == BlockReason::Device;
        pcb.state = ProcessState::Ready;
        pcb.blocked_reason = BlockReason::None;
        pcb.blocked_time = 0;
        pcb.waiting_device = None;

        if was_device_wait {
            self.devices.lock().cancel_wait(pid);
        }
        self.ready_queue.push_back(pid);
        println!("Process {} woken up and added to ready queue", pid);
    }

    // ══════════════════════════════════════════════════════════
    //  Executor
    // ══════════════════════════════════════════════════════════

    /// Execute one instruction for the running process. Opcode-level
    /// failures are logged and never terminate the process; only a
    /// missed DevRequest changes its state.
    fn execute_instruction(&mut self, pid: Pid, instruction: &Instruction) {
        log_info!("[Exec: {}] {}", pid, instruction);

        match instruction {
            Instruction::Compute => {}

            Instruction::MemRead { addr } => {
                if let Err(e) = self.memory.lock().access_memory(pid, *addr, AccessType::Read) {
                    log_error!("[Exec] memory read failed: {}", e);
                }
            }

            Instruction::MemWrite { addr } => {
                if let Err(e) = self.memory.lock().access_memory(pid, *addr, AccessType::Write) {
                    log_error!("[Exec] memory write failed: {}", e);
                }
            }

            Instruction::FileOpen { fd, name } => {
                if let Some(requested) = fd {
                    let pcb = self.processes.get(&pid).expect("no PCB for running process");
                    if *requested < 3 || pcb.fd_map.contains_key(requested) {
                        log_error!("[Exec] logical fd {} unusable for open of {}", requested, name);
                        return;
                    }
                }

                // An open failure leaves the fd map unchanged.
                let global_fd = match self.fs.lock().open_file(name) {
                    Ok(fd) => fd,
                    Err(e) => {
                        log_error!("[Exec] open of {} failed: {}", name, e);
                        return;
                    }
                };

                let pcb = self.processes.get_mut(&pid).expect("no PCB for running process");
                let logical = match fd {
                    Some(requested) => *requested,
                    None => pcb.allocate_script_fd(),
                };
                pcb.fd_map.insert(logical, global_fd);
                log_info!("[Exec] {} opened as fd {} (global {})", name, logical, global_fd);
            }

            Instruction::FileClose { fd } => {
                let pcb = self.processes.get_mut(&pid).expect("no PCB for running process");
                match pcb.fd_map.remove(fd) {
                    Some(global_fd) => {
                        if let Err(e) = self.fs.lock().close_file(global_fd) {
                            log_error!("[Exec] close of fd {} failed: {}", fd, e);
                        }
                    }
                    None => { log_warn!("[Exec] close of unknown fd {}, ignored", fd); }
                }
            }

            Instruction::FileRead { fd, size } => {
                let global_fd = {
                    let pcb = self.processes.get(&pid).expect("no PCB for running process");
                    match pcb.fd_map.get(fd) {
                        Some(&g) => g,
                        None => {
                            log_warn!("[Exec] read on unknown fd {}, ignored", fd);
                            return;
                        }
                    }
                };
                let size = (*size).min(MAX_IO_BYTES) as usize;
                let mut buf = vec![0u8; size];
                match self.fs.lock().read_file(global_fd, &mut buf) {
                    Ok(n) => { log_info!("[Exec] read {} bytes (fd={})", n, fd); }
                    Err(e) => { log_error!("[Exec] read on fd {} failed: {}", fd, e); }
                }
            }

            Instruction::FileWrite { fd, size } => {
                let global_fd = {
                    let pcb = self.processes.get(&pid).expect("no PCB for running process");
                    match pcb.fd_map.get(fd) {
                        Some(&g) => g,
                        None => {
                            log_warn!("[Exec] write on unknown fd {}, ignored", fd);
                            return;
                        }
                    }
                };
                let size = (*size).min(MAX_IO_BYTES) as usize;
                let buf = vec![b'x'; size];
                match self.fs.lock().write_file(global_fd, &buf) {
                    Ok(n) => { log_info!("[Exec] wrote {} bytes (fd={})", n, fd); }
                    Err(e) => { log_error!("[Exec] write on fd {} failed: {}", fd, e); }
                }
            }

            Instruction::DevRequest { dev } => {
                let acquired = self.devices.lock().request(pid, *dev);
                if !acquired {
                    let pcb = self.processes.get_mut(&pid).expect("no PCB for running process");
                    pcb.state = ProcessState::Blocked;
                    pcb.blocked_reason = BlockReason::Device;
                    pcb.waiting_device = Some(*dev);
                }
            }

            Instruction::DevRelease { dev } => {
                let next = self.devices.lock().release(pid, *dev);
                self.wake_device_successor(*dev, next);
            }

            Instruction::Sleep { ticks } => {
                let pcb = self.processes.get_mut(&pid).expect("no PCB for running process");
                pcb.state = ProcessState::Blocked;
                pcb.blocked_reason = BlockReason::Sleep;
                pcb.blocked_time = *ticks;
            }
        }
    }

    /// The DeviceManager made `next` the holder of `dev`; wake it if it
    /// is genuinely blocked on that device, otherwise pass the device
    /// along until a live waiter is found or none remain.
    fn wake_device_successor(&mut self, dev: u32, mut next: Option<Pid>) {
        while let Some(candidate) = next {
            let valid = self.processes.get(&candidate).map_or(false, |pcb| {
                pcb.state == ProcessState::Blocked
                    && pcb.blocked_reason == BlockReason::Device
                    && pcb.waiting_device == Some(dev)
            });

            if valid {
                let pcb = self.processes.get_mut(&candidate).expect("checked above");
                pcb.state = ProcessState::Ready;
                pcb.blocked_reason = BlockReason::None;
                pcb.waiting_device = None;
                self.ready_queue.push_back(candidate);
                log_info!("[Dev] Process {} granted device {} and woken", candidate, dev);
                return;
            }

            log_warn!("[Dev] stale waiter {} on device {}, skipping", candidate, dev);
            next = self.devices.lock().release(candidate, dev);
        }
    }

    // ══════════════════════════════════════════════════════════
    //  Inspection
    // ══════════════════════════════════════════════════════════

    pub fn current(&self) -> Option<Pid> {
        self.current
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.processes.contains_key(&pid)
    }

    pub fn state_of(&self, pid: Pid) -> Option<ProcessState> {
        self.processes.get(&pid).map(|pcb| pcb.state)
    }

    pub fn pcb(&self, pid: Pid) -> Option<&Pcb> {
        self.processes.get(&pid)
    }

    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    /// Print the process table. Command output, so standard out.
    pub fn dump_processes(&self) {
        println!("PID\tState\t\tRemain\tCPU/Total\tBlocked");
        for (pid, pcb) in &self.processes {
            println!(
                "{}\t{}\t\t{}\t{}/{}\t\t{}",
                pid, pcb.state, pcb.time_slice_left, pcb.cpu_time, pcb.total_time, pcb.blocked_time
            );
        }
        match self.current {
            Some(pid) => println!("Currently running: {}", pid),
            None => println!("CPU idle"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PAGE_FRAMES;
    use crate::dev::disk::BlockDevice;
    use std::path::PathBuf;

    struct Rig {
        pm: ProcessManager,
        memory: Arc<Mutex<MemoryManager>>,
        devices: Arc<Mutex<DeviceManager>>,
        fs: Arc<Mutex<FileSystem>>,
        image: PathBuf,
    }

    impl Rig {
        fn new(tag: &str) -> Rig {
            let image = std::env::temp_dir()
                .join(format!("tinix-pm-{}-{}.img", std::process::id(), tag));
            let _ = std::fs::remove_file(&image);
            let disk = Arc::new(Mutex::new(BlockDevice::open(&image).unwrap()));

            let memory = Arc::new(Mutex::new(MemoryManager::new(disk.clone(), PAGE_FRAMES)));
            let devices = Arc::new(Mutex::new(DeviceManager::new()));
            let fs = Arc::new(Mutex::new(FileSystem::new(disk)));
            fs.lock().format().unwrap();

            let pm = ProcessManager::new(memory.clone(), devices.clone(), fs.clone());
            Rig { pm, memory, devices, fs, image }
        }

        fn spawn_script(&mut self, source: &str) -> Pid {
            let program = Program::from_source(source).unwrap();
            self.pm.create_process_with_program(Arc::new(program))
        }

        fn ticks(&mut self, n: usize) {
            for _ in 0..n {
                self.pm.tick();
            }
        }
    }

    impl Drop for Rig {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.image);
        }
    }

    #[test]
    fn quantum_rotation_between_two_processes() {
        let mut rig = Rig::new("quantum");
        let p1 = rig.pm.create_process(6);
        let p2 = rig.pm.create_process(6);

        rig.ticks(7);
        // p1 ran ticks 1..3, p2 ticks 4..6, p1 again at tick 7.
        assert_eq!(rig.pm.pcb(p1).unwrap().cpu_time, 4);
        assert_eq!(rig.pm.pcb(p2).unwrap().cpu_time, 3);
        assert_eq!(rig.pm.current(), Some(p1));

        rig.ticks(5);
        assert_eq!(rig.pm.process_count(), 0);
        assert_eq!(rig.pm.current(), None);
    }

    #[test]
    fn manual_block_expires_after_duration() {
        let mut rig = Rig::new("sleep");
        let pid = rig.pm.create_process(10);

        rig.pm.block_process(pid, 3);
        assert_eq!(rig.pm.state_of(pid), Some(ProcessState::Blocked));

        rig.ticks(2);
        assert_eq!(rig.pm.state_of(pid), Some(ProcessState::Blocked));
        rig.ticks(1);
        assert_eq!(rig.pm.state_of(pid), Some(ProcessState::Ready));

        // The next tick's schedule call picks it up again.
        rig.ticks(1);
        assert_eq!(rig.pm.current(), Some(pid));
    }

    #[test]
    fn sleep_instruction_blocks_and_wakes() {
        let mut rig = Rig::new("sleep-op");
        let pid = rig.spawn_script("S 2\nC\nC\n");

        rig.ticks(1);
        assert_eq!(rig.pm.state_of(pid), Some(ProcessState::Blocked));
        assert_eq!(rig.pm.pcb(pid).unwrap().blocked_reason, BlockReason::Sleep);

        // Timer already aged once by the blocking tick itself.
        rig.ticks(1);
        assert_eq!(rig.pm.state_of(pid), Some(ProcessState::Ready));

        rig.ticks(2);
        assert_eq!(rig.pm.process_count(), 0);
    }

    #[test]
    fn device_contention_blocks_then_hands_off() {
        let mut rig = Rig::new("devices");
        let p1 = rig.spawn_script("DR 0\nC\nC\nDD 0\n");
        let p2 = rig.spawn_script("DR 0\nC\n");

        rig.ticks(3); // p1: request + 2 computes, then rotates
        assert_eq!(rig.devices.lock().holder(0), Some(p1));

        rig.ticks(1); // p2 misses the device
        assert_eq!(rig.pm.state_of(p2), Some(ProcessState::Blocked));
        assert_eq!(rig.pm.pcb(p2).unwrap().blocked_reason, BlockReason::Device);
        assert_eq!(rig.pm.pcb(p2).unwrap().waiting_device, Some(0));

        rig.ticks(1); // p1 releases and completes
        assert!(!rig.pm.contains(p1));
        assert_eq!(rig.pm.state_of(p2), Some(ProcessState::Ready));
        assert_eq!(rig.pm.pcb(p2).unwrap().waiting_device, None);
        assert_eq!(rig.devices.lock().holder(0), Some(p2));

        rig.ticks(2);
        assert_eq!(rig.pm.process_count(), 0);
    }

    #[test]
    fn kill_releases_devices_files_and_memory() {
        let mut rig = Rig::new("teardown");
        rig.fs.lock().create_file("/data").unwrap();

        let p1 = rig.spawn_script("DR 0\nFO /data\nS 10\nC\n");
        let p2 = rig.spawn_script("DR 0\nC\n");

        rig.ticks(3); // p1 holds dev 0, opened /data, now asleep
        assert_eq!(rig.fs.lock().open_count(), 1);
        rig.ticks(1); // p2 queues on dev 0
        assert_eq!(rig.pm.state_of(p2), Some(ProcessState::Blocked));

        assert!(rig.pm.terminate_process(p1));
        assert!(!rig.pm.contains(p1));
        assert_eq!(rig.fs.lock().open_count(), 0);
        assert!(rig.memory.lock().page_table(p1).is_none());

        // The queued waiter inherits the device and wakes.
        assert_eq!(rig.devices.lock().holder(0), Some(p2));
        assert_eq!(rig.pm.state_of(p2), Some(ProcessState::Ready));

        rig.ticks(2);
        assert_eq!(rig.pm.process_count(), 0);
        assert_eq!(rig.devices.lock().holder(0), None);
    }

    #[test]
    fn file_opcodes_touch_the_file_system() {
        let mut rig = Rig::new("file-ops");
        rig.fs.lock().create_file("/scratch").unwrap();

        let pid = rig.spawn_script("FO /scratch\nFW 3 100\nFR 3 50\nFC 3\n");
        rig.ticks(2);
        assert_eq!(rig.pm.pcb(pid).unwrap().fd_map.len(), 1);
        rig.ticks(2);

        assert_eq!(rig.pm.process_count(), 0);
        assert_eq!(rig.fs.lock().open_count(), 0);
        assert_eq!(rig.fs.lock().stat("/scratch").unwrap().size, 100);
    }

    #[test]
    fn scripted_fd_choice_is_honored() {
        let mut rig = Rig::new("fd-choice");
        rig.fs.lock().create_file("/a").unwrap();
        rig.fs.lock().create_file("/b").unwrap();

        let pid = rig.spawn_script("FO 7 /a\nFO /b\nFW 7 10\nFC 7\nFC 3\n");
        rig.ticks(2);
        let pcb = rig.pm.pcb(pid).unwrap();
        assert!(pcb.fd_map.contains_key(&7));
        assert!(pcb.fd_map.contains_key(&3));

        rig.ticks(3);
        assert_eq!(rig.fs.lock().stat("/a").unwrap().size, 10);
        assert_eq!(rig.fs.lock().open_count(), 0);
    }

    #[test]
    fn bad_instructions_do_not_kill_the_process() {
        let mut rig = Rig::new("bad-ops");
        // Out-of-range address, unknown fds, missing file: all logged
        // and skipped.
        let pid = rig.spawn_script("R 0xFFFFFFFF\nFR 9 10\nFO /missing\nFC 9\nC\n");

        rig.ticks(5);
        assert!(!rig.pm.contains(pid));
        assert_eq!(rig.pm.process_count(), 0);
    }

    #[test]
    fn run_process_preempts_the_current_one() {
        let mut rig = Rig::new("preempt");
        let p1 = rig.pm.create_process(10);
        let p2 = rig.pm.create_process(10);

        rig.ticks(1);
        assert_eq!(rig.pm.current(), Some(p1));

        rig.pm.run_process(p2);
        assert_eq!(rig.pm.current(), Some(p2));
        assert_eq!(rig.pm.state_of(p1), Some(ProcessState::Ready));

        rig.ticks(1);
        assert_eq!(rig.pm.pcb(p2).unwrap().cpu_time, 1);
    }

    #[test]
    fn wakeup_cancels_a_device_wait() {
        let mut rig = Rig::new("wakeup");
        let p1 = rig.spawn_script("DR 3\nS 50\nC\n");
        let p2 = rig.spawn_script("DR 3\nC\n");

        rig.ticks(3); // p1 holds dev 3 and sleeps; p2 queued on dev 3
        assert_eq!(rig.pm.pcb(p2).unwrap().blocked_reason, BlockReason::Device);

        rig.pm.wakeup_process(p2);
        assert_eq!(rig.pm.state_of(p2), Some(ProcessState::Ready));
        assert!(!rig.devices.lock().is_waiting(p2, 3));

        // A later release finds no waiters left.
        assert_eq!(rig.devices.lock().release(p1, 3), None);
    }
}
