use crate::kernel::Kernel;

/// mkdir <dir> — create a directory.
pub fn run(kernel: &mut Kernel, args: &[&str]) {
    match args.first() {
        Some(path) => {
            let _ = kernel.fs.lock().create_directory(path);
        }
        None => eprintln!("Usage: mkdir <dirname>"),
    }
}
