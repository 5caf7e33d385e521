mod cli;

use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::sync::Arc;

use block_dev::BlockDevice;
use clap::Parser;
use simple_fs::{SimpleFileSystem, BLOCK_SIZE};
use simple_fs_fuse::BlockFile;
use typed_bytesize::ByteSizeIec;

use cli::Cli;

fn main() -> io::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let blocks = ByteSizeIec::mib(cli.mib).0 as usize / BLOCK_SIZE;
    let fd = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(&cli.image)?;
    fd.set_len((blocks * BLOCK_SIZE) as u64)?;

    let device: Arc<dyn BlockDevice> = Arc::new(BlockFile::new(fd, blocks));
    SimpleFileSystem::format(&device).expect("format failed");
    let fs = SimpleFileSystem::mount(device).expect("mount failed");

    for source in &cli.sources {
        let mut data = Vec::new();
        File::open(source)?.read_to_end(&mut data)?;

        let inode = SimpleFileSystem::create_inode(&fs).expect("inode table full");
        let written = inode.write_at(0, &data).expect("write failed");
        assert_eq!(written, data.len(), "volume too small for {:?}", source);
        log::info!("{}: inumber={} bytes={written}", source.display(), inode.inumber());
    }

    let report = fs.lock().report();
    println!("SuperBlock:");
    println!("    {} blocks", report.super_block.blocks);
    println!("    {} inode blocks", report.super_block.inode_blocks);
    println!("    {} inodes", report.super_block.inodes);
    for inode in &report.inodes {
        println!("Inode {}:", inode.inumber);
        println!("    size: {} bytes", inode.size);
        println!("    direct blocks: {:?}", inode.direct);
        if let Some(indirect) = inode.indirect {
            println!("    indirect block: {indirect}");
            println!("    indirect data blocks: {:?}", inode.indirect_blocks);
        }
    }

    Ok(())
}
