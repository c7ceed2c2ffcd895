use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "runres")]
#[command(version)]
#[command(about = "A Rust .res/.hex resource directory lister and extractor", long_about = None)]
#[command(after_help = "Examples:\n  \
  runres types.hex -l                          list directory entries\n  \
  runres types.hex -D types.res -d out         unpack every resource into out/\n  \
  runres types.hex -D types.res 'art\\*.dds'    unpack matching resources\n  \
  runres -l https://example.com/types.hex      list entries of a remote directory")]
pub struct Cli {
    /// Directory file (.hex/.res) path or HTTP URL
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Entries to extract (default: all)
    #[arg(value_name = "ENTRIES")]
    pub entries: Vec<String>,

    /// Payload data file path or HTTP URL the directory indexes into
    #[arg(short = 'D', long = "data", value_name = "FILE")]
    pub data: Option<String>,

    /// List entries (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely (offsets, sizes, totals)
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Extract payloads to pipe, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Extract payloads into exdir
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Exclude entries that follow
    #[arg(short = 'x', value_name = "ENTRY", num_args = 1..)]
    pub exclude: Vec<String>,

    /// Never overwrite existing files
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Junk paths (do not make directories)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Reject malformed integer tags instead of decoding leniently
    #[arg(long)]
    pub strict: bool,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }
}

/// Whether a FILE argument names a remote source.
pub fn is_http_url(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://")
}
