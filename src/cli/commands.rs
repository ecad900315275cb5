use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "navigator", version, about = "Compliance Navigator chat service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the config file path globally
    #[arg(short, long, global = true, default_value = "config.yaml")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve,

    /// Interactive chat against a running server
    Chat {
        /// Open an existing chat instead of starting a new one
        #[arg(long)]
        chat: Option<String>,
    },

    /// Inspect or delete chats on a running server
    Chats {
        #[command(subcommand)]
        action: ChatAction,
    },

    /// Account management against a running server
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Manage stored PDF documents in the configured database
    Pdf {
        #[command(subcommand)]
        action: PdfAction,
    },
}

#[derive(Subcommand)]
pub enum ChatAction {
    /// List chats with their first query
    List,

    /// Print the full history of a chat
    Show {
        chat_id: String,
    },

    /// Delete every record of a chat
    Delete {
        chat_id: String,
    },
}

#[derive(Subcommand)]
pub enum UserAction {
    /// Create an account
    Signup {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },

    /// Check credentials and print a session token
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
}

#[derive(Subcommand)]
pub enum PdfAction {
    /// Store a PDF file under a name
    Import {
        #[arg(short, long)]
        path: String,
        /// Defaults to the file stem
        #[arg(short, long)]
        name: Option<String>,
    },
}
