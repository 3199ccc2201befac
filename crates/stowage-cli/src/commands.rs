//! Subcommands.

use std::path::PathBuf;

use clap::Subcommand;

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Show the resolved store and transfer directories
    Paths,

    /// Download a URL into the store
    Download {
        /// Source URL
        url: String,
        /// File name in the store (defaults to the URL's last path segment)
        #[arg(short, long)]
        name: Option<String>,
        /// Hand the transfer to the journal and exit; finish it later with `resume`
        #[arg(long)]
        detach: bool,
    },

    /// Resume transfers left over from a previous run and wait for them
    Resume,

    /// Print the store path for a downloaded file
    Path {
        /// File name in the store
        name: String,
    },

    /// Delete a downloaded file from the store
    #[command(alias = "rm")]
    Remove {
        /// File name in the store
        name: String,
    },

    /// Manage stored images
    #[command(subcommand)]
    Image(ImageCommand),
}

/// Image store subcommands.
#[derive(Subcommand)]
pub enum ImageCommand {
    /// Compress an image file into the store
    Save {
        /// Image file to import
        file: PathBuf,
        /// Stored name (defaults to a timestamp name)
        #[arg(short, long)]
        name: Option<String>,
        /// Maximum width of the stored image (0 = unconstrained)
        #[arg(long, default_value_t = 0)]
        max_width: u32,
        /// Maximum height of the stored image (0 = unconstrained)
        #[arg(long, default_value_t = 0)]
        max_height: u32,
        /// Also write a thumbnail bounded by WIDTHxHEIGHT
        #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
        thumbnail: Option<(u32, u32)>,
        /// JPEG quality in [0, 1]
        #[arg(short, long, default_value_t = 1.0)]
        quality: f32,
    },

    /// Print the path of a stored image
    Path {
        name: String,
        /// Address the thumbnail instead of the original
        #[arg(long)]
        thumbnail: bool,
    },

    /// Rename a stored image and its thumbnail
    Rename { old: String, new: String },

    /// Delete a stored image and its thumbnail
    #[command(alias = "rm")]
    Remove { name: String },
}

fn parse_size(raw: &str) -> Result<(u32, u32), String> {
    let (w, h) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{raw}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid dimension '{v}': {e}"))
    };
    Ok((parse(w)?, parse(h)?))
}
