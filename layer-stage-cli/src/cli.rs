use std::path::PathBuf;

#[derive(clap::Parser)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Print the decoded layer tree of a document
    Info {
        #[arg(short, long)]
        document: PathBuf,
    },
    /// Composite one configured frame to a PNG
    Render {
        #[arg(short, long)]
        document: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Overlay-style query string (mouth0..mouth4, eye0..eye4,
        /// layerVisibility, flipX, flipY, ...)
        #[arg(short, long, default_value = "")]
        config: String,
        /// Mouth level to draw, 0..4
        #[arg(long)]
        mouth_level: Option<u8>,
        /// Eye level to draw, 0..4
        #[arg(long)]
        eye_level: Option<u8>,
    },
}
