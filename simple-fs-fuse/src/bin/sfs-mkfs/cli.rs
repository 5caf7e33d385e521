use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
pub struct Cli {
    /// Image file to create
    #[arg(long, short)]
    pub image: PathBuf,

    /// Volume size in MiB
    #[arg(long, short, default_value_t = 16)]
    pub mib: u64,

    /// Host files to copy into the fresh volume
    pub sources: Vec<PathBuf>,
}
