use crate::kernel::Kernel;

/// touch <file> — create an empty file.
pub fn run(kernel: &mut Kernel, args: &[&str]) {
    match args.first() {
        Some(path) => {
            let _ = kernel.fs.lock().create_file(path);
        }
        None => eprintln!("Usage: touch <filename>"),
    }
}
