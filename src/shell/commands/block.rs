use super::parse_pid;
use crate::kernel::Kernel;

/// block <pid> [t] — put a process to sleep for t ticks (default 5).
pub fn run(kernel: &mut Kernel, args: &[&str]) {
    let pid = match args.first().and_then(|arg| parse_pid(arg)) {
        Some(pid) => pid,
        None => {
            eprintln!("Usage: block <pid> [duration]");
            return;
        }
    };
    let duration = match args.get(1) {
        Some(arg) => match arg.parse::<u64>() {
            Ok(t) => t,
            Err(_) => {
                eprintln!("Invalid duration: {}", arg);
                return;
            }
        },
        None => 5,
    };
    kernel.processes.block_process(pid, duration);
}
