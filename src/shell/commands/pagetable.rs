use super::parse_pid;
use crate::kernel::Kernel;

/// pagetable <pid> — dump one process's page table.
pub fn run(kernel: &mut Kernel, args: &[&str]) {
    match args.first() {
        Some(arg) => {
            if let Some(pid) = parse_pid(arg) {
                kernel.memory.lock().dump_page_table(pid);
            }
        }
        None => eprintln!("Usage: pagetable <pid>"),
    }
}
