use crate::fs::defs::FileKind;
use crate::kernel::Kernel;

/// ls [path] — list directory contents.
pub fn run(kernel: &mut Kernel, args: &[&str]) {
    let path = args.first().copied().unwrap_or(".");

    let listing = match kernel.fs.lock().list_directory(path) {
        Ok(listing) => listing,
        Err(_) => return,
    };

    println!("Contents of {}:", path);
    for entry in listing {
        let kind = if entry.inode.kind == FileKind::Directory { 'd' } else { '-' };
        println!(
            "  {} {} (inode={}, size={})",
            kind, entry.name, entry.inode_num, entry.inode.size
        );
    }
}
