use crate::kernel::Kernel;

/// mem — dump the physical frame pool.
pub fn run(kernel: &mut Kernel, _args: &[&str]) {
    kernel.memory.lock().dump_frames();
}
