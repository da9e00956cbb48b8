use std::path::Path;
use std::sync::Arc;

use spin::Mutex;

use crate::config::PAGE_FRAMES;
use crate::dev::device_manager::DeviceManager;
use crate::dev::disk::{BlockDevice, DiskResult};
use crate::fs::file_system::FileSystem;
use crate::mem::manager::MemoryManager;
use crate::proc::manager::ProcessManager;
use crate::{log_error, log_info};

/// The composition root. The Kernel owns every subsystem; collaborators
/// hold shared references, never owning copies.
pub struct Kernel {
    pub disk: Arc<Mutex<BlockDevice>>,
    pub memory: Arc<Mutex<MemoryManager>>,
    pub devices: Arc<Mutex<DeviceManager>>,
    pub fs: Arc<Mutex<FileSystem>>,
    pub processes: ProcessManager,
}

impl Kernel {
    /// Open the backing image, wire the subsystems together and mount
    /// the file system, formatting a fresh image when the mount fails.
    pub fn new(disk_path: &Path) -> DiskResult<Kernel> {
        let disk = Arc::new(Mutex::new(BlockDevice::open(disk_path)?));
        let memory = Arc::new(Mutex::new(MemoryManager::new(disk.clone(), PAGE_FRAMES)));
        let devices = Arc::new(Mutex::new(DeviceManager::new()));
        let fs = Arc::new(Mutex::new(FileSystem::new(disk.clone())));

        {
            let mut fs = fs.lock();
            if fs.mount().is_err() {
                log_info!("[Kernel] File system not found, formatting...");
                if let Err(e) = fs.format() {
                    log_error!("[Kernel] Format failed: {}", e);
                }
            }
        }

        let processes = ProcessManager::new(memory.clone(), devices.clone(), fs.clone());

        Ok(Kernel { disk, memory, devices, fs, processes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_formats_a_blank_image_and_remounts_it() {
        let path = std::env::temp_dir()
            .join(format!("tinix-kernel-{}.img", std::process::id()));
        let _ = std::fs::remove_file(&path);

        {
            let kernel = Kernel::new(&path).unwrap();
            assert!(kernel.fs.lock().is_mounted());
            kernel.fs.lock().create_file("/boot-marker").unwrap();
        }

        // Second boot mounts the already-formatted volume.
        let kernel = Kernel::new(&path).unwrap();
        assert!(kernel.fs.lock().is_mounted());
        assert!(kernel.fs.lock().lookup_path("/boot-marker").is_ok());

        std::fs::remove_file(&path).unwrap();
    }
}
