use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};

use lexiscope::{
    ColorTheme, StageConfig, Trace,
    regex::RegexForest,
    scenes::{DfaTour, RegexWalkthrough},
};

/// Animated explainers for compiler front-end traces
#[derive(Parser, Debug)]
#[command(name = "lexiscope", version, about)]
struct Cli {
    /// Color theme
    #[arg(long, value_enum, default_value_t = Theme::Dark)]
    theme: Theme,

    /// Playback rate (2.0 plays twice as fast)
    #[arg(long, default_value_t = 1.0)]
    speed: f32,

    /// Do not tessellate node labels
    #[arg(long)]
    no_labels: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Theme {
    Dark,
    Light,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Walk a compiled regex tree node by node
    Regex {
        /// Trace file (JSON array or compiler log)
        trace: PathBuf,

        /// Which compiled pattern to walk, in trace order
        #[arg(long, default_value_t = 0)]
        pattern: usize,

        /// Seconds per highlight step
        #[arg(long, default_value_t = 1.0)]
        step: f32,

        /// Comma-separated group of paths or ids; repeat for more groups
        #[arg(long = "group", value_name = "TARGETS")]
        groups: Vec<String>,
    },

    /// Tour the lexicon DFA and replay the scanner
    Lexicon {
        /// Trace file (JSON array or compiler log)
        trace: PathBuf,

        /// Seconds per tour step
        #[arg(long, default_value_t = 0.4)]
        step: f32,
    },

    /// Print what a trace contains
    Inspect {
        /// Trace file (JSON array or compiler log)
        trace: PathBuf,
    },
}

fn parse_groups(groups: &[String]) -> Vec<Vec<String>> {
    groups
        .iter()
        .map(|g| {
            g.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .filter(|g| !g.is_empty())
        .collect()
}

fn inspect(trace: &Trace) {
    println!("{} events", trace.events.len());
    for (kind, count) in trace.summary() {
        println!("  {kind:<20} {count}");
    }

    let forest = RegexForest::from_trace(trace);
    for (i, (pattern, root)) in forest.patterns().iter().enumerate() {
        let nodes = forest.preorder(*root).len();
        let leaves = forest.leaf_paths(*root);
        println!("pattern {i}: {pattern:?} ({nodes} nodes)");
        println!("  leaves: {}", leaves.join(" "));
    }
}

fn main() -> Result<()> {
    // Logging is the binary's choice; the library only uses the `log` facade.
    env_logger::init();

    let cli = Cli::parse();
    let theme = match cli.theme {
        Theme::Dark => ColorTheme::dark(),
        Theme::Light => ColorTheme::light(),
    };
    let mut stage = StageConfig {
        speed: cli.speed,
        ..StageConfig::default()
    }
    .with_theme(&theme);
    if cli.no_labels {
        stage.font = None;
    }

    let load = |path: &PathBuf| {
        Trace::load(path).with_context(|| format!("failed to read trace {}", path.display()))
    };

    match cli.command {
        Commands::Regex {
            trace,
            pattern,
            step,
            groups,
        } => {
            let trace = load(&trace)?;
            let mut walk = RegexWalkthrough::from_trace(&trace, pattern, theme)
                .with_context(|| format!("no compiled pattern #{pattern} in trace"))?
                .with_step_duration(step);
            let groups = parse_groups(&groups);
            if !groups.is_empty() {
                walk = walk.with_groups(groups);
            }
            lexiscope::play(walk, stage)
        }
        Commands::Lexicon { trace, step } => {
            let trace = load(&trace)?;
            let tour = DfaTour::from_trace(&trace, theme)
                .context("trace has no lexicon")?
                .with_step_duration(step);
            lexiscope::play(tour, stage)
        }
        Commands::Inspect { trace } => {
            inspect(&load(&trace)?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_split_on_commas() {
        let groups = parse_groups(&["/0, /1".to_string(), ",".to_string(), "a".to_string()]);
        assert_eq!(groups, vec![vec!["/0", "/1"], vec!["a"]]);
    }

    #[test]
    fn cli_parses_regex_command() {
        let cli = Cli::try_parse_from([
            "lexiscope", "--theme", "light", "regex", "t.json", "--group", "/0,/1",
        ])
        .unwrap();
        assert!(matches!(cli.theme, Theme::Light));
        let Commands::Regex { groups, step, .. } = cli.command else {
            panic!("expected regex command");
        };
        assert_eq!(groups, vec!["/0,/1"]);
        assert_eq!(step, 1.0);
    }
}
