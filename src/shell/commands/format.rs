use crate::kernel::Kernel;

/// format — write a fresh file system onto the disk image.
pub fn run(kernel: &mut Kernel, _args: &[&str]) {
    match kernel.fs.lock().format() {
        Ok(()) => eprintln!("File system formatted successfully."),
        Err(e) => eprintln!("Failed to format file system: {}", e),
    }
}
