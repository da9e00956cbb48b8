use super::parse_pid;
use crate::kernel::Kernel;

/// run <pid> — manually schedule a Ready process, preempting the
/// current one.
pub fn run(kernel: &mut Kernel, args: &[&str]) {
    match args.first() {
        Some(arg) => {
            if let Some(pid) = parse_pid(arg) {
                kernel.processes.run_process(pid);
            }
        }
        None => eprintln!("Usage: run <pid>"),
    }
}
