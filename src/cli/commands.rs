use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "newsflow")]
#[command(about = "RSS/Atom reader backend with full-text article ingestion")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a feed URL as a custom source
    Add {
        /// Feed URL to add
        url: String,

        /// Source name (defaults to the feed's own title)
        #[arg(long)]
        name: Option<String>,
    },

    /// Remove a custom source by name
    Remove {
        /// Name of the source to remove
        name: String,
    },

    /// List all configured sources
    Sources,

    /// Check whether a URL serves a valid RSS or Atom feed
    Validate {
        /// URL to probe
        url: String,
    },

    /// Fetch every source once and store new articles
    Fetch {
        /// Print the stored articles as JSON afterwards
        #[arg(long)]
        json: bool,
    },

    /// Import sources from an OPML file
    Import {
        /// Path to OPML file
        path: String,
    },

    /// Export sources to OPML format
    Export {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Run the HTTP API with periodic background fetching
    Serve,
}
