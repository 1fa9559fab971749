//! Command-line interface definition for SecurePass
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for authentication, vault management and
//! import/export.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::transfer::Format;

/// SecurePass - password vault client
///
/// Signs in to a SecurePass server and manages the credentials stored
/// there.
#[derive(Parser, Debug, Clone)]
#[command(name = "securepass")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Keep the session in memory only (nothing written to the keyring)
    #[arg(long)]
    pub ephemeral: bool,

    /// Override the server base URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for SecurePass
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Sign in
    Login {
        /// Account name
        #[arg(short, long)]
        username: Option<String>,

        /// Account password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Create an account and sign in
    Register {
        /// Account name (at least 3 characters)
        #[arg(short, long)]
        username: Option<String>,

        /// Account password, at least 8 characters (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show who is signed in and when the session expires
    Status,

    /// List stored credentials
    List {
        /// Only show entries whose site or username contains this text
        #[arg(short, long)]
        search: Option<String>,

        /// Only show entries with weak passwords
        #[arg(long)]
        weak: bool,

        /// Print passwords instead of masking them
        #[arg(long)]
        show_passwords: bool,
    },

    /// Store a new credential
    Add {
        /// Site or service name
        #[arg(long)]
        site: String,

        /// Account name on the site
        #[arg(long, default_value = "")]
        username: String,

        /// Password to store
        #[arg(long, conflicts_with = "generate")]
        password: Option<String>,

        /// Generate a random password
        #[arg(long)]
        generate: bool,
    },

    /// Change the password of a stored credential
    Update {
        /// Credential id
        id: i64,

        /// New password
        #[arg(long, conflicts_with = "generate")]
        password: Option<String>,

        /// Generate a random password
        #[arg(long)]
        generate: bool,
    },

    /// Delete a credential
    Delete {
        /// Credential id
        id: i64,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Reload the credential list from the server
    Refresh,

    /// Remove credentials that repeat a site and username
    Dedupe {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Import credentials from a file
    Import {
        /// JSON or CSV file
        file: PathBuf,

        /// File format (inferred from the extension when omitted)
        #[arg(short, long, value_enum)]
        format: Option<Format>,
    },

    /// Export credentials to a file
    Export {
        /// Destination file
        file: PathBuf,

        /// File format (inferred from the extension when omitted)
        #[arg(short, long, value_enum)]
        format: Option<Format>,
    },

    /// Print a random password
    Generate {
        /// Password length
        #[arg(short, long, default_value_t = crate::password::DEFAULT_LENGTH)]
        length: usize,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            json_logs: false,
            ephemeral: false,
            api_url: None,
            command: Commands::Status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::Status));
    }

    #[test]
    fn test_cli_parse_login() {
        let cli = Cli::try_parse_from(["securepass", "login", "-u", "alice"]).unwrap();
        match cli.command {
            Commands::Login { username, password } => {
                assert_eq!(username.as_deref(), Some("alice"));
                assert!(password.is_none());
            }
            other => panic!("Expected Login, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_list_filters() {
        let cli =
            Cli::try_parse_from(["securepass", "list", "--search", "git", "--weak"]).unwrap();
        match cli.command {
            Commands::List {
                search,
                weak,
                show_passwords,
            } => {
                assert_eq!(search.as_deref(), Some("git"));
                assert!(weak);
                assert!(!show_passwords);
            }
            other => panic!("Expected List, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_add_password_conflicts_with_generate() {
        let cli = Cli::try_parse_from([
            "securepass",
            "add",
            "--site",
            "github.com",
            "--password",
            "x",
            "--generate",
        ]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_cli_parse_delete_requires_id() {
        assert!(Cli::try_parse_from(["securepass", "delete"]).is_err());
        let cli = Cli::try_parse_from(["securepass", "delete", "7", "--yes"]).unwrap();
        assert!(matches!(cli.command, Commands::Delete { id: 7, yes: true }));
    }

    #[test]
    fn test_cli_parse_import_format() {
        let cli =
            Cli::try_parse_from(["securepass", "import", "vault.txt", "--format", "csv"]).unwrap();
        match cli.command {
            Commands::Import { file, format } => {
                assert_eq!(file, PathBuf::from("vault.txt"));
                assert_eq!(format, Some(Format::Csv));
            }
            other => panic!("Expected Import, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_generate_default_length() {
        let cli = Cli::try_parse_from(["securepass", "generate"]).unwrap();
        assert!(matches!(cli.command, Commands::Generate { length: 16 }));
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::try_parse_from([
            "securepass",
            "--ephemeral",
            "--api-url",
            "http://example.test",
            "status",
        ])
        .unwrap();
        assert!(cli.ephemeral);
        assert_eq!(cli.api_url.as_deref(), Some("http://example.test"));
    }
}
