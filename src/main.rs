// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use polysub::app_config::{self, Config, TranslationProvider};
use polysub::app_controller::Controller;
use polysub::file_utils::PostAction;
use polysub::language_utils;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Google,
    #[value(name = "libretranslate")]
    LibreTranslate,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Google => TranslationProvider::Google,
            CliTranslationProvider::LibreTranslate => TranslationProvider::LibreTranslate,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for PostAction to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliPostAction {
    Move,
    Copy,
    Leave,
}

impl From<CliPostAction> for PostAction {
    fn from(action: CliPostAction) -> Self {
        match action {
            CliPostAction::Move => PostAction::Move,
            CliPostAction::Copy => PostAction::Copy,
            CliPostAction::Leave => PostAction::Leave,
        }
    }
}

/// Options that override values from the configuration file
#[derive(Args, Debug, Clone, Default)]
struct ConfigOverrides {
    /// Source language code, or 'auto'
    #[arg(short, long)]
    source_language: Option<String>,

    /// Comma-separated target language codes (e.g. 'fr,de,zh-CN')
    #[arg(short, long, value_delimiter = ',')]
    target_languages: Option<Vec<String>>,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// What to do with each source file once all languages were attempted
    #[arg(long, value_enum)]
    post_action: Option<CliPostAction>,

    /// Write output folders under this directory instead of next to the sources
    #[arg(long, value_name = "DIR")]
    output_root: Option<PathBuf>,

    /// Do not read or write the translation cache
    #[arg(long)]
    no_cache: bool,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut Config) {
        if let Some(source) = &self.source_language {
            config.source_language = source.clone();
        }
        if let Some(targets) = &self.target_languages {
            config.target_languages = targets.iter().map(|t| t.trim().to_string()).collect();
        }
        if let Some(provider) = &self.provider {
            config.translation.provider = provider.clone().into();
        }
        if self.force_overwrite {
            config.output.overwrite = true;
        }
        if let Some(action) = &self.post_action {
            config.output.post_action = action.clone().into();
        }
        if let Some(root) = &self.output_root {
            config.output.output_root = Some(root.clone());
        }
        if self.no_cache {
            config.cache.enabled = false;
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate subtitle or text files (folders: every matching file inside)
    Translate {
        /// Files or folders to translate
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        overrides: ConfigOverrides,
    },

    /// Watch folders and translate every new file, one at a time
    Watch {
        /// Folders to watch (defaults to watch.directories from the config)
        #[arg(value_name = "DIR")]
        directories: Vec<PathBuf>,

        #[command(flatten)]
        overrides: ConfigOverrides,
    },

    /// List the default target languages
    Languages,

    /// Generate shell completions for polysub
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// polysub - translate subtitles into many languages at once
///
/// Reads .srt, .ass and .txt files and writes one SRT per target language,
/// caching every translation so repeated lines are never sent twice.
#[derive(Parser, Debug)]
#[command(name = "polysub")]
#[command(version)]
#[command(about = "Multi-language subtitle translation tool")]
#[command(long_about = "polysub translates subtitle and text files into many languages at once.

EXAMPLES:
    polysub translate movie.srt                  # Translate into the default languages
    polysub translate -t fr,de episode.ass       # Translate into French and German
    polysub translate -f /subs/                  # Whole folder, overwrite existing outputs
    polysub watch /incoming /dropbox             # Translate new files as they arrive
    polysub languages                            # Show the default language table
    polysub completions bash > polysub.bash      # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI color for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let _ = writeln!(
                std::io::stderr(),
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(record.level()),
                now,
                Self::get_emoji_for_level(record.level()),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the max level does the filtering
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Some(level) = &cli.log_level {
        log::set_max_level(level_filter(&level.clone().into()));
    }

    match &cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(*shell, &mut cmd, "polysub", &mut std::io::stdout());
            Ok(())
        }
        Commands::Languages => {
            for (name, code) in language_utils::DEFAULT_TARGET_LANGUAGES {
                println!("{:<6} {}", code, name);
            }
            Ok(())
        }
        Commands::Translate { paths, overrides } => {
            let controller = build_controller(&cli, overrides)?;
            controller.run_files(paths).await.map(|_| ())
        }
        Commands::Watch { directories, overrides } => {
            let controller = build_controller(&cli, overrides)?;
            controller.run_watch(directories).await
        }
    }
}

/// Load the configuration, apply CLI overrides and build the controller
fn build_controller(cli: &CommandLineOptions, overrides: &ConfigOverrides) -> Result<Controller> {
    let mut config = Config::load_or_create(&cli.config_path)?;
    overrides.apply(&mut config);

    if let Some(level) = &cli.log_level {
        config.log_level = level.clone().into();
    } else {
        log::set_max_level(level_filter(&config.log_level));
    }

    config.validate().context("Configuration validation failed")?;
    Controller::with_config(config)
}
