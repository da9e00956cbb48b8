//! Cross-subsystem scenarios driven through the Kernel and the Shell.

use std::path::PathBuf;

use tinix::kernel::Kernel;
use tinix::proc::process::ProcessState;
use tinix::shell::Shell;

fn temp_image(tag: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("tinix-sim-{}-{}.img", std::process::id(), tag));
    let _ = std::fs::remove_file(&path);
    path
}

#[test]
fn script_process_touches_memory_and_files() {
    let image = temp_image("script");
    let script = std::env::temp_dir()
        .join(format!("tinix-sim-script-{}.pc", std::process::id()));
    std::fs::write(
        &script,
        "# exercise paging and file I/O\nFO 4 /data\nFW 4 6000\nFC 4\nR 0x0\nW 0x1000\nR 0x2000\nC\n",
    )
    .unwrap();

    {
        let mut kernel = Kernel::new(&image).unwrap();
        kernel.fs.lock().create_file("/data").unwrap();

        let pid = kernel.processes.create_process_from_file(&script).unwrap();
        for _ in 0..7 {
            kernel.processes.tick();
        }

        assert!(!kernel.processes.contains(pid));
        assert_eq!(kernel.fs.lock().open_count(), 0);
        assert_eq!(kernel.fs.lock().stat("/data").unwrap().size, 6000);

        let stats = kernel.memory.lock().stats();
        assert_eq!(stats.memory_accesses, 3);
        assert_eq!(stats.page_faults, 3);
        assert_eq!(kernel.memory.lock().frames().used_frames(), 0);
    }

    // The file survives a full shutdown and reboot.
    let kernel = Kernel::new(&image).unwrap();
    assert_eq!(kernel.fs.lock().stat("/data").unwrap().size, 6000);

    std::fs::remove_file(&script).unwrap();
    std::fs::remove_file(&image).unwrap();
}

#[test]
fn shell_session_builds_a_durable_tree() {
    let image = temp_image("shell");

    {
        let kernel = Kernel::new(&image).unwrap();
        let mut shell = Shell::new(kernel);
        shell.execute_line("mkdir /a");
        shell.execute_line("cd /a");
        shell.execute_line("touch f");
        shell.execute_line("echo hi > f");
        shell.execute_line("create 4");
        shell.execute_line("tick 5");

        assert_eq!(shell.kernel().processes.process_count(), 0);
        assert_eq!(shell.kernel().fs.lock().current_dir(), "/a");
    }

    let kernel = Kernel::new(&image).unwrap();
    let mut fs = kernel.fs.lock();

    let names: Vec<String> =
        fs.list_directory("/a").unwrap().into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec![".", "..", "f"]);
    assert_eq!(fs.stat("/a/f").unwrap().size, 3);

    let fd = fs.open_file("/a/f").unwrap();
    let mut buf = [0u8; 16];
    let n = fs.read_file(fd, &mut buf).unwrap();
    assert_eq!(&buf[..n], b"hi\n");
    fs.close_file(fd).unwrap();
    drop(fs);

    std::fs::remove_file(&image).unwrap();
}

#[test]
fn frame_pool_is_shared_between_processes() {
    let image = temp_image("shared-frames");
    let script = std::env::temp_dir()
        .join(format!("tinix-sim-frames-{}.pc", std::process::id()));
    std::fs::write(&script, "R 0x0\nW 0x1000\nR 0x2000\nS 20\nC\n").unwrap();

    let mut kernel = Kernel::new(&image).unwrap();
    let p1 = kernel.processes.create_process_from_file(&script).unwrap();
    let p2 = kernel.processes.create_process_from_file(&script).unwrap();

    // Both processes fault their pages in, then sleep.
    for _ in 0..8 {
        kernel.processes.tick();
    }
    assert_eq!(kernel.memory.lock().frames().used_frames(), 6);
    assert_eq!(kernel.memory.lock().process_stats(p1).page_faults, 3);
    assert_eq!(kernel.memory.lock().process_stats(p2).page_faults, 3);

    // Killing one process frees exactly its frames.
    assert!(kernel.processes.terminate_process(p1));
    let memory = kernel.memory.lock();
    assert_eq!(memory.frames().used_frames(), 3);
    for frame in 0..memory.frames().total_frames() {
        if let Some(label) = memory.frames().get(frame) {
            assert_eq!(label.pid, p2);
        }
    }
    drop(memory);

    assert_eq!(kernel.processes.state_of(p2), Some(ProcessState::Blocked));

    std::fs::remove_file(&script).unwrap();
    std::fs::remove_file(&image).unwrap();
}
