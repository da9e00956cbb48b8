use crate::kernel::Kernel;

/// rm <file> — remove a file.
pub fn run(kernel: &mut Kernel, args: &[&str]) {
    match args.first() {
        Some(path) => {
            let _ = kernel.fs.lock().remove_file(path);
        }
        None => eprintln!("Usage: rm <filename>"),
    }
}
