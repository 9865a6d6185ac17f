use std::path::PathBuf;

use lexiscope::anim::Player;
use lexiscope::font::Labeler;
use lexiscope::regex::{RegexForest, RegexView, RegexViewConfig};
use lexiscope::scene::Scene2D;
use lexiscope::scenes::{DfaTour, RegexWalkthrough, SceneScript};
use lexiscope::{ColorTheme, Trace};

fn trace() -> Trace {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/ab.json");
    Trace::load(path).unwrap()
}

fn near(p: [f32; 2], q: [f32; 2]) -> bool {
    (p[0] - q[0]).abs() < 1e-3 && (p[1] - q[1]).abs() < 1e-3
}

#[test]
fn walk_groups_restart_and_follow() {
    let theme = ColorTheme::dark();
    let mut walk = RegexWalkthrough::from_trace(&trace(), 0, theme)
        .unwrap()
        .with_groups(vec![
            vec!["/1".into(), "/0".into()],
            vec!["n2".into()],
        ])
        .with_step_duration(1.0);
    assert_eq!(walk.title(), "lexiscope: ab");

    let mut scene = Scene2D::new();
    walk.setup(&mut scene, &mut Labeler::disabled());
    let mut player = Player::new(walk);

    // Step 1 (0..1s) lights /1; step 2 (1..2s) adds /0 and follows it.
    player.update(&mut scene, 2.0);
    assert!(near(scene.world_position("n1").unwrap(), [0.0, 0.0]));
    assert_eq!(scene.get("n1.ring").unwrap().fill, theme.accent);

    // The second group starts over with only n2.
    player.update(&mut scene, 3.0);
    assert_eq!(scene.get("n1.ring").unwrap().fill, theme.dimmed);
    assert_eq!(scene.get("n2.ring").unwrap().fill, theme.accent);
    assert!(near(scene.world_position("n2").unwrap(), [0.0, 0.0]));

    player.update(&mut scene, 60.0);
    assert!(player.is_finished());
    assert_eq!(scene.get("n1.ring").unwrap().fill, theme.accent);
    let tree = scene.get("n0.tree").unwrap();
    assert!(near([tree.motion.tx, tree.motion.ty], [0.0, 0.0]));
}

#[test]
fn unresolved_groups_still_finish() {
    let mut walk = RegexWalkthrough::from_trace(&trace(), 1, ColorTheme::light())
        .unwrap()
        .with_groups(vec![vec!["/missing".into(), "nope".into()]]);
    let mut scene = Scene2D::new();
    walk.setup(&mut scene, &mut Labeler::disabled());
    let mut player = Player::new(walk);
    player.update(&mut scene, 60.0);
    assert!(player.is_finished());
}

#[test]
fn forest_draws_accepts_below_trees() {
    let forest = RegexForest::from_trace(&trace());
    let mut view = RegexView::new(RegexViewConfig::default(), ColorTheme::dark());
    let mut scene = Scene2D::new();
    view.add_forest(&mut scene, &forest, &mut Labeler::disabled());

    for name in ["u0.tree", "u0->n0", "acc0", "acc1->n3", "regex.accepts"] {
        assert!(scene.contains(name), "missing {name}");
    }
    let n0 = scene.world_position("n0").unwrap();
    let acc0 = scene.world_position("acc0").unwrap();
    assert!((acc0[0] - n0[0]).abs() < 1e-3);
    assert!(acc0[1] < scene.world_position("n1").unwrap()[1]);
}

#[test]
fn dfa_tour_replays_scanner() {
    let theme = ColorTheme::dark();
    let mut tour = DfaTour::from_trace(&trace(), theme)
        .unwrap()
        .with_step_duration(0.1);
    // Five tour sections of three steps, two per scanner move, one closing wait.
    assert_eq!(tour.remaining(), 15 + 4 * 2 + 1);

    let mut scene = Scene2D::new();
    tour.setup(&mut scene, &mut Labeler::disabled());
    assert!(scene.contains("transfer:2->2.head"));
    assert!(scene.contains("state:3.outline"));

    let mut player = Player::new(tour);
    player.update(&mut scene, 60.0);
    assert!(player.is_finished());
    assert_eq!(scene.get("state:3.ring").unwrap().fill, theme.accent);
    assert_eq!(scene.get("state:1.ring").unwrap().fill, theme.dimmed);
    assert_eq!(scene.get("transfer:2->3.line").unwrap().fill, theme.dimmed);
}
