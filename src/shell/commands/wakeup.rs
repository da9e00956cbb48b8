use super::parse_pid;
use crate::kernel::Kernel;

/// wakeup <pid> — wake a blocked process.
pub fn run(kernel: &mut Kernel, args: &[&str]) {
    match args.first() {
        Some(arg) => {
            if let Some(pid) = parse_pid(arg) {
                kernel.processes.wakeup_process(pid);
            }
        }
        None => eprintln!("Usage: wakeup <pid>"),
    }
}
