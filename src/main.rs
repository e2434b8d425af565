use std::time::Duration;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};

use vocab::commands::learn;
use vocab::llm::{self, LlmConfig};
use vocab::logging;
use vocab::palette::Palette;
use vocab::settings::{
    DEFAULT_INTERESTS, DEFAULT_TEMPERATURE, DEFAULT_WORDS, Level, MAX_WORDS, MIN_WORDS, Settings,
    Tone, parse_temperature,
};

#[derive(Parser, Debug)]
#[command(
    name = "vocab",
    version,
    about = "Personalized English vocabulary practice in the terminal.",
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true,
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a vocabulary session
    Learn {
        /// English level the words are chosen for
        #[arg(long, value_enum, default_value_t = Level::Beginner)]
        level: Level,
        /// Topics the learner likes, comma separated
        #[arg(long, value_name = "TEXT", default_value = DEFAULT_INTERESTS)]
        interests: String,
        /// Number of words per generated set
        #[arg(
            long = "words",
            value_name = "COUNT",
            default_value_t = DEFAULT_WORDS,
            value_parser = clap::value_parser!(u8).range(i64::from(MIN_WORDS)..=i64::from(MAX_WORDS))
        )]
        word_count: u8,
        /// Explanation style of the generated words
        #[arg(long, value_enum, default_value_t = Tone::FriendlyCoach)]
        tone: Tone,
        /// Sampling temperature between 0.0 and 1.0
        #[arg(long, value_name = "VALUE", default_value_t = DEFAULT_TEMPERATURE, value_parser = parse_temperature)]
        temperature: f32,
        /// Model id to request
        #[arg(long, value_name = "NAME")]
        model: Option<String>,
        /// Skip the SDK client and call the REST endpoint directly
        #[arg(long, default_value_t = false)]
        rest: bool,
        /// Seconds to wait for each generation call
        #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
        timeout_secs: Option<u64>,
    },
    /// Manage the Gemini API key
    Llm {
        /// Store an API key in the local auth file. Prompts when no key is given
        #[arg(long, value_name = "KEY", num_args = 0..=1, conflicts_with = "clear")]
        set: Option<Option<String>>,
        /// Remove the stored API key from the local auth file
        #[arg(long, conflicts_with = "test")]
        clear: bool,
        /// Verify the configured API key with a tiny generation call
        #[arg(long, conflicts_with = "clear")]
        test: bool,
        /// Use the REST endpoint for --test
        #[arg(long, requires = "test")]
        rest: bool,
    },
}

#[tokio::main]
async fn main() {
    logging::init_tracing();
    if let Err(err) = run_cli().await {
        eprintln!("{:?}", err);
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Learn {
            level,
            interests,
            word_count,
            tone,
            temperature,
            model,
            rest,
            timeout_secs,
        } => {
            let settings = Settings::new(level, interests, word_count, tone, temperature);
            let (mut config, _source) = LlmConfig::from_environment()?;
            if let Some(model) = model {
                config.model = model;
            }
            if let Some(secs) = timeout_secs {
                config.timeout = Duration::from_secs(secs);
            }
            config.force_rest = rest;
            learn::run(settings, config).await?;
        }
        Command::Llm {
            set,
            clear,
            test,
            rest,
        } => handle_llm_command(set, clear, test, rest).await?,
    }

    Ok(())
}

async fn handle_llm_command(
    set: Option<Option<String>>,
    clear: bool,
    test: bool,
    force_rest: bool,
) -> Result<()> {
    let mut action_taken = false;

    if let Some(key) = set {
        let key = match key {
            Some(key) => key,
            None => llm::prompt_for_api_key()?,
        };
        llm::store_api_key(&key)?;
        println!("Stored Gemini API key in the local auth file.");
        action_taken = true;
    }

    if clear {
        let removed = llm::clear_api_key()?;
        if removed {
            println!("Removed the stored Gemini API key.");
        } else {
            println!("No Gemini API key found in the auth file.");
        }
        action_taken = true;
    }

    if test {
        let (source, strategy) = llm::test_configured_api_key(force_rest).await?;
        println!(
            "{} {} {}",
            Palette::paint(Palette::SUCCESS, "Gemini API key works."),
            Palette::dim("Source:"),
            Palette::paint(Palette::INFO, source.description())
        );
        println!(
            "{} {}",
            Palette::dim("Strategy:"),
            Palette::paint(Palette::INFO, strategy)
        );
        action_taken = true;
    }

    if !action_taken {
        bail!("No action provided. Use --set, --clear, or --test.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn learn_defaults() {
        let cli = Cli::try_parse_from(["vocab", "learn"]).unwrap();
        let Command::Learn {
            level,
            interests,
            word_count,
            tone,
            temperature,
            rest,
            ..
        } = cli.command
        else {
            panic!("expected learn");
        };
        assert_eq!(level, Level::Beginner);
        assert_eq!(interests, "technology, science");
        assert_eq!(word_count, 5);
        assert_eq!(tone, Tone::FriendlyCoach);
        assert_eq!(temperature, 0.6);
        assert!(!rest);
    }

    #[test]
    fn learn_rejects_out_of_range_values() {
        assert!(Cli::try_parse_from(["vocab", "learn", "--words", "11"]).is_err());
        assert!(Cli::try_parse_from(["vocab", "learn", "--words", "2"]).is_err());
        assert!(Cli::try_parse_from(["vocab", "learn", "--temperature", "1.5"]).is_err());
        assert!(Cli::try_parse_from(["vocab", "learn", "--temperature", "0.55"]).is_err());
    }

    #[test]
    fn llm_set_accepts_optional_value() {
        let cli = Cli::try_parse_from(["vocab", "llm", "--set"]).unwrap();
        assert!(matches!(cli.command, Command::Llm { set: Some(None), .. }));

        let cli = Cli::try_parse_from(["vocab", "llm", "--set", "abc"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Llm { set: Some(Some(ref key)), .. } if key == "abc"
        ));
    }

    #[tokio::test]
    async fn llm_without_flags_is_an_error() {
        let err = handle_llm_command(None, false, false, false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No action provided"));
    }
}
