use super::parse_pid;
use crate::kernel::Kernel;
use crate::mem::manager::MemoryStats;

/// memstats [pid] — system-wide or per-process paging statistics.
pub fn run(kernel: &mut Kernel, args: &[&str]) {
    match args.first() {
        Some(arg) => {
            if let Some(pid) = parse_pid(arg) {
                let stats = kernel.memory.lock().process_stats(pid);
                println!("=== Memory Stats for PID {} ===", pid);
                print_stats(&stats);
            }
        }
        None => {
            let stats = kernel.memory.lock().stats();
            println!("=== System Memory Stats ===");
            print_stats(&stats);
        }
    }
}

fn print_stats(stats: &MemoryStats) {
    println!("Memory Accesses: {}", stats.memory_accesses);
    println!("Page Faults: {}", stats.page_faults);
    if stats.memory_accesses > 0 {
        let fault_rate = stats.page_faults as f64 / stats.memory_accesses as f64 * 100.0;
        println!("Page Fault Rate: {:.2}%", fault_rate);
    }
}
