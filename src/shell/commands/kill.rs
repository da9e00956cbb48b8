use super::parse_pid;
use crate::kernel::Kernel;

/// kill <pid> — force terminate a process.
pub fn run(kernel: &mut Kernel, args: &[&str]) {
    match args.first() {
        Some(arg) => {
            if let Some(pid) = parse_pid(arg) {
                kernel.processes.terminate_process(pid);
            }
        }
        None => eprintln!("Usage: kill <pid>"),
    }
}
