use crate::kernel::Kernel;

/// fsinfo — print the cached SuperBlock.
pub fn run(kernel: &mut Kernel, _args: &[&str]) {
    kernel.fs.lock().print_superblock();
}
