//! CLI argument parsing using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use quaero::Dialect;

/// quaero - translate filter expressions into LDAP, SCIM and Graph filters
#[derive(Parser, Debug)]
#[command(name = "quaero")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (show debug information)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read filters line by line and print every translation (default)
    Repl,

    /// Translate one filter expression
    #[command(alias = "r")]
    Render {
        /// Filter expression, e.g. 'age gt 18 and name sw "J"'
        expression: String,

        /// Target dialect (repeatable; default: from config, else all)
        #[arg(short, long, value_enum, action = clap::ArgAction::Append)]
        dialect: Vec<DialectArg>,

        /// Render the tree exactly as parsed
        #[arg(long)]
        no_optimize: bool,
    },

    /// Parse an expression and print its tree
    #[command(alias = "p")]
    Parse {
        /// Filter expression
        expression: String,

        /// Optimize the tree before printing
        #[arg(long)]
        optimize: bool,
    },

    /// Print the JSON records a filter matches
    #[command(alias = "m")]
    Match {
        /// Filter expression
        expression: String,

        /// JSON file holding an array of objects (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// View and edit configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Output dialects selectable on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialectArg {
    Graph,
    Ldap,
    Scim,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Graph => Dialect::Graph,
            DialectArg::Ldap => Dialect::Ldap,
            DialectArg::Scim => Dialect::Scim,
        }
    }
}

/// Shell types for completions
#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Write a commented default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,

        /// Configuration value
        value: String,
    },

    /// Print config file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_means_repl() {
        let cli = Cli::parse_from(["quaero"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["quaero", "--json", "--no-color", "parse", "a pr"]);
        assert!(cli.json);
        assert!(cli.no_color);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["quaero", "-v", "-q", "repl"]).is_err());
    }

    #[test]
    fn test_render_with_dialects() {
        let cli = Cli::parse_from([
            "quaero",
            "render",
            "age gt 18",
            "-d",
            "ldap",
            "--dialect",
            "scim",
            "--no-optimize",
        ]);
        if let Some(Commands::Render {
            expression,
            dialect,
            no_optimize,
        }) = cli.command
        {
            assert_eq!(expression, "age gt 18");
            assert_eq!(dialect, vec![DialectArg::Ldap, DialectArg::Scim]);
            assert!(no_optimize);
        } else {
            panic!("Expected Render command");
        }
    }

    #[test]
    fn test_unknown_dialect_is_rejected() {
        assert!(Cli::try_parse_from(["quaero", "render", "a pr", "-d", "sql"]).is_err());
    }

    #[test]
    fn test_match_with_input_file() {
        let cli = Cli::parse_from(["quaero", "m", "age gt 18", "-i", "people.json"]);
        if let Some(Commands::Match { expression, input }) = cli.command {
            assert_eq!(expression, "age gt 18");
            assert_eq!(input, Some(PathBuf::from("people.json")));
        } else {
            panic!("Expected Match command");
        }
    }

    #[test]
    fn test_config_subcommands() {
        let cli = Cli::parse_from(["quaero", "config", "set", "render.optimize", "false"]);
        if let Some(Commands::Config {
            command: Some(ConfigCommands::Set { key, value }),
        }) = cli.command
        {
            assert_eq!(key, "render.optimize");
            assert_eq!(value, "false");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn test_completions() {
        let cli = Cli::parse_from(["quaero", "completions", "zsh"]);
        if let Some(Commands::Completions { shell }) = cli.command {
            assert!(matches!(shell, Shell::Zsh));
        } else {
            panic!("Expected Completions command");
        }
    }

    #[test]
    fn test_dialect_arg_conversion() {
        assert_eq!(Dialect::from(DialectArg::Graph), Dialect::Graph);
        assert_eq!(Dialect::from(DialectArg::Ldap), Dialect::Ldap);
        assert_eq!(Dialect::from(DialectArg::Scim), Dialect::Scim);
    }
}
