//! The regex principle scene: a compiled tree lit up leaf to root, one group at a time.
//!
//! Run:
//! - `RUST_LOG=info cargo run --example regex_principle`
//! - `cargo run --example regex_principle -- trace.json` to walk the first pattern of a
//!   recorded trace instead of the built-in `a(b|c)*`.

use anyhow::Context as _;

use lexiscope::{ColorTheme, StageConfig, Trace, scenes::RegexWalkthrough};

const BUILTIN: &str = r#"[
  {"$": "RegexCompile", "pattern": "a(b|c)*", "regex": {
    "type": "concat", "id": "r0",
    "lhs": {"type": "char", "id": "r1", "char": "a"},
    "rhs": {"type": "kleene", "id": "r2", "sub": {
      "type": "union", "id": "r3",
      "lhs": {"type": "char", "id": "r4", "char": "b"},
      "rhs": {"type": "char", "id": "r5", "char": "c"}
    }}
  }}
]"#;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let path = std::env::args_os().nth(1);
    let trace = match &path {
        Some(path) => Trace::load(path)
            .with_context(|| format!("failed to read trace {}", path.to_string_lossy()))?,
        None => Trace::parse(BUILTIN).context("built-in trace")?,
    };

    let theme = ColorTheme::dark();
    let mut walk = RegexWalkthrough::from_trace(&trace, 0, theme)?;
    if path.is_none() {
        // Climb the left spine first, then sweep the starred alternatives.
        walk = walk.with_groups(vec![
            vec!["/0".into(), "/1".into()],
            vec!["/100".into(), "/101".into(), "/10".into()],
        ]);
    }

    lexiscope::play(walk, StageConfig::default().with_theme(&theme))
        .context("failed to run regex_principle demo")
}
