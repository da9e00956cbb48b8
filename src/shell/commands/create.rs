use std::path::Path;

use crate::kernel::Kernel;
use crate::log_info;

/// create [time] | create -f <file> — install a new process.
pub fn run(kernel: &mut Kernel, args: &[&str]) {
    if args.first() == Some(&"-f") {
        let file = match args.get(1) {
            Some(file) => file,
            None => {
                eprintln!("Usage: create -f <file>");
                return;
            }
        };
        if let Ok(pid) = kernel.processes.create_process_from_file(Path::new(file)) {
            log_info!("Created process PID: {} from {}", pid, file);
        }
        return;
    }

    let total_time = match args.first() {
        Some(arg) => match arg.parse::<usize>() {
            Ok(n) => n,
            Err(_) => {
                eprintln!("Invalid process length: {}", arg);
                return;
            }
        },
        None => 10,
    };
    let pid = kernel.processes.create_process(total_time);
    log_info!("Created process PID: {}", pid);
}
