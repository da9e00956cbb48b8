use crate::kernel::Kernel;

/// mount — load and validate the on-disk file system.
pub fn run(kernel: &mut Kernel, _args: &[&str]) {
    match kernel.fs.lock().mount() {
        Ok(()) => eprintln!("File system mounted successfully."),
        Err(e) => eprintln!("Failed to mount file system: {}", e),
    }
}
