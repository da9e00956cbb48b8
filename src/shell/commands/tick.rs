use crate::kernel::Kernel;

/// tick [n] — advance the simulation n steps (default 1).
pub fn run(kernel: &mut Kernel, args: &[&str]) {
    let n = match args.first() {
        Some(arg) => match arg.parse::<usize>() {
            Ok(n) => n,
            Err(_) => {
                eprintln!("Invalid tick count: {}", arg);
                return;
            }
        },
        None => 1,
    };
    for _ in 0..n {
        kernel.processes.tick();
    }
}
