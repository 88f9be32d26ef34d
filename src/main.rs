use anyhow::{Context, Result};
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    cursor::MoveToColumn,
    execute,
    style::Print,
    terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType},
    tty::IsTty,
};
use std::io::{self, stdin, Stdout};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use typerush::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    corpus::{CorpusGenerator, Difficulty, Language, Mode},
    notify::BellNotifier,
    persistence::{MemoryStore, Persistence},
    runtime::{dispatch, Runner, TerminalKeys},
    store::SqliteStore,
    telemetry::weakest_keys,
    time_series::peak_wpm,
    TypingTest,
};

const TICK_RATE_MS: u64 = 100;

/// timed typing practice with live metrics, keystroke telemetry and personal bests
#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// difficulty tier of generated text
    #[clap(short = 'd', long, value_enum, global = true)]
    difficulty: Option<Difficulty>,

    /// kind of content to type
    #[clap(short = 'm', long, value_enum, global = true)]
    mode: Option<Mode>,

    /// language to pull content from
    #[clap(short = 'l', long, value_enum, global = true)]
    language: Option<Language>,

    /// number of seconds to run the test
    #[clap(short = 's', long, global = true)]
    duration: Option<u32>,

    /// type this text instead of generated content
    #[clap(short = 'p', long, global = true)]
    custom_text: Option<String>,

    /// seed for reproducible prompts
    #[clap(long, global = true)]
    seed: Option<u64>,

    /// stats database location
    #[clap(long, global = true)]
    db: Option<PathBuf>,

    /// settings file location
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// keep results in memory only
    #[clap(long, global = true)]
    no_save: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum Command {
    /// run a typing test in the terminal (default)
    Practice {
        /// store the effective settings as the new defaults
        #[clap(long)]
        remember: bool,
    },
    /// print a prompt and exit
    Generate,
    /// show recent results
    Stats {
        #[clap(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
    /// show personal bests per mode and duration
    Bests,
    /// show the keys most in need of practice
    WeakKeys {
        #[clap(short = 'n', long, default_value_t = 5)]
        count: usize,
    },
}

impl Cli {
    /// Stored settings with command line overrides applied
    fn settings(&self, stored: Config) -> Result<Config> {
        let mut cfg = stored;
        if let Some(difficulty) = self.difficulty {
            cfg.difficulty = difficulty;
        }
        if let Some(mode) = self.mode {
            cfg.mode = mode;
        }
        if let Some(language) = self.language {
            cfg.language = language;
        }
        if let Some(duration) = self.duration {
            cfg.duration_secs = duration;
        }
        if let Some(text) = &self.custom_text {
            cfg.custom_text = Some(text.clone());
            if self.difficulty.is_none() {
                cfg.difficulty = Difficulty::Custom;
            }
        }
        cfg.validate().context("invalid settings")
    }

    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }

    fn generator(&self) -> CorpusGenerator {
        match self.seed {
            Some(seed) => CorpusGenerator::seeded(seed),
            None => CorpusGenerator::new(),
        }
    }

    fn db_path(&self) -> PathBuf {
        self.db
            .clone()
            .or_else(AppDirs::db_path)
            .unwrap_or_else(|| PathBuf::from("typerush_stats.db"))
    }

    fn open_store(&self) -> Result<SqliteStore> {
        let path = self.db_path();
        SqliteStore::open(&path).with_context(|| format!("cannot open stats database {}", path.display()))
    }

    fn persistence(&self) -> Result<Box<dyn Persistence>> {
        if self.no_save {
            Ok(Box::new(MemoryStore::new()))
        } else {
            Ok(Box::new(self.open_store()?))
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("typerush=warn,warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let store = cli.config_store();
    let settings = cli.settings(store.load())?;

    match cli.command.clone().unwrap_or(Command::Practice { remember: false }) {
        Command::Practice { remember } => {
            if !stdin().is_tty() {
                let mut cmd = Cli::command();
                cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
            }
            if remember {
                store.save(&settings).context("cannot save settings")?;
            }
            practice(&cli, &settings)
        }
        Command::Generate => {
            println!("{}", cli.generator().generate(&settings.request()));
            Ok(())
        }
        Command::Stats { limit } => {
            for record in cli.open_store()?.recent_results(limit)? {
                let r = &record.result;
                println!(
                    "{}  {:>4} wpm  {:>4} net  {:>3}%  {:>6.1}s  {}/{}/{}",
                    r.timestamp.format("%Y-%m-%d %H:%M"),
                    r.wpm,
                    r.net_wpm,
                    r.accuracy,
                    r.time_taken,
                    record.mode,
                    record.difficulty,
                    record.language,
                );
            }
            Ok(())
        }
        Command::Bests => {
            for best in cli.open_store()?.personal_bests()? {
                println!(
                    "{:<12} {:>4}s  {:>4} wpm  {:>3}%",
                    best.mode, best.duration_secs, best.wpm, best.accuracy
                );
            }
            Ok(())
        }
        Command::WeakKeys { count } => {
            let summaries = cli.open_store()?.key_summaries()?;
            for key in weakest_keys(&summaries, count) {
                println!(
                    "{:?}  {:>6.0} ms avg  {:>5.1}% miss  {} presses",
                    key.character, key.mean_latency_ms, key.miss_rate, key.attempts
                );
            }
            Ok(())
        }
    }
}

fn practice(cli: &Cli, settings: &Config) -> Result<()> {
    let mut test = TypingTest::new(settings.request())
        .with_generator(cli.generator())
        .with_persistence(cli.persistence()?)
        .with_notifier(BellNotifier);
    test.start();

    let runner = Runner::new(TerminalKeys::spawn(), Duration::from_millis(TICK_RATE_MS));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    let outcome = run_loop(&mut stdout, &runner, &mut test);
    disable_raw_mode()?;
    outcome?;

    if let Some(result) = test.result() {
        println!(
            "{} wpm ({} net, peak {}), {}% accuracy, {} errors, {} cpm over {:.1}s",
            result.wpm,
            result.net_wpm,
            peak_wpm(test.wpm_history()),
            result.accuracy,
            result.errors,
            result.cpm,
            result.time_taken
        );
        for achievement in test.new_achievements() {
            println!("unlocked: {} - {}", achievement.title, achievement.description);
        }
    }
    Ok(())
}

fn run_loop(
    stdout: &mut Stdout,
    runner: &Runner<TerminalKeys>,
    test: &mut TypingTest,
) -> Result<()> {
    // reference text already printed; prompts only ever grow at the end
    let mut shown = String::new();
    loop {
        let reference = test.reference();
        if !reference.starts_with(shown.as_str()) {
            shown.clear();
        }
        if reference.len() > shown.len() {
            let text = &reference[shown.len()..];
            execute!(stdout, Print("\r\n"), Print(text.trim()), Print("\r\n"))?;
            shown = reference.to_string();
        }

        let live = test.live_stats();
        execute!(
            stdout,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(format!(
                "[{:>3.0}s] {:>4} wpm {:>3}% | {}",
                test.remaining_secs(),
                live.wpm,
                live.accuracy,
                tail(test.typed(), 50)
            ))
        )?;

        if test.is_completed() {
            execute!(stdout, Print("\r\n"))?;
            return Ok(());
        }
        if !dispatch(test, runner.step()) {
            execute!(stdout, Print("\r\n"))?;
            return Ok(());
        }
    }
}

/// Last `n` characters of `text`
fn tail(text: &str, n: usize) -> &str {
    let skip = text.chars().count().saturating_sub(n);
    text.char_indices().nth(skip).map_or("", |(i, _)| &text[i..])
}
