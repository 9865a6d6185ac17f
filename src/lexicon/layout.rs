use std::collections::{BTreeMap, BTreeSet, VecDeque};

use super::{Lexicon, StateId};

/// Distances between state centers, in pt.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LayoutSpacing {
    /// Between columns (ranks).
    pub rank_sep: f32,
    /// Between states in one column.
    pub node_sep: f32,
}

impl Default for LayoutSpacing {
    fn default() -> Self {
        Self {
            rank_sep: 256.0,
            node_sep: 192.0,
        }
    }
}

/// Left-to-right layered layout of a lexicon.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LexiconLayout {
    layers: Vec<Vec<StateId>>,
    positions: BTreeMap<StateId, [f32; 2]>,
}

impl LexiconLayout {
    pub fn layers(&self) -> &[Vec<StateId>] {
        &self.layers
    }

    /// State center relative to the center of the drawing, y-up.
    pub fn position(&self, state: StateId) -> Option<[f32; 2]> {
        self.positions.get(&state).copied()
    }

    pub fn rank_of(&self, state: StateId) -> Option<usize> {
        self.layers.iter().position(|layer| layer.contains(&state))
    }
}

fn bfs_ranks(
    start: StateId,
    outgoing: &BTreeMap<StateId, BTreeSet<StateId>>,
) -> BTreeMap<StateId, usize> {
    let mut ranks = BTreeMap::new();
    let mut queue = VecDeque::new();
    ranks.insert(start, 0usize);
    queue.push_back(start);
    while let Some(state) = queue.pop_front() {
        let rank = ranks[&state];
        for &next in outgoing.get(&state).into_iter().flatten() {
            if !ranks.contains_key(&next) {
                ranks.insert(next, rank + 1);
                queue.push_back(next);
            }
        }
    }
    ranks
}

fn sort_layer_by_barycenter(
    layer: &mut [StateId],
    prev_positions: &BTreeMap<StateId, usize>,
    predecessors: &BTreeMap<StateId, BTreeSet<StateId>>,
) {
    let barycenter = |state: &StateId| {
        predecessors
            .get(state)
            .map(|preds| {
                preds
                    .iter()
                    .filter_map(|p| prev_positions.get(p).copied())
                    .fold((0usize, 0usize), |(sum, count), pos| (sum + pos, count + 1))
            })
            .and_then(|(sum, count)| (count > 0).then_some((sum, count)))
    };

    layer.sort_by(|a, b| match (barycenter(a), barycenter(b)) {
        (None, None) => a.cmp(b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (Some((sum_a, count_a)), Some((sum_b, count_b))) => {
            // sum_a/count_a vs sum_b/count_b without floats.
            let left = (sum_a as u128) * (count_b as u128);
            let right = (sum_b as u128) * (count_a as u128);
            left.cmp(&right).then_with(|| a.cmp(b))
        }
    });
}

/// Rank states by BFS distance from the start state, then order each rank with one
/// barycenter sweep against the previous rank.
///
/// States not reachable from the start share one extra rank after the deepest.
/// Self loops do not affect ranking.
pub fn layout_lexicon(lexicon: &Lexicon, spacing: LayoutSpacing) -> LexiconLayout {
    let Some(start) = lexicon.start_state() else {
        return LexiconLayout::default();
    };

    let mut outgoing = BTreeMap::<StateId, BTreeSet<StateId>>::new();
    let mut predecessors = BTreeMap::<StateId, BTreeSet<StateId>>::new();
    for t in lexicon.transfers() {
        if t.from == t.to {
            continue;
        }
        outgoing.entry(t.from).or_default().insert(t.to);
        predecessors.entry(t.to).or_default().insert(t.from);
    }

    let ranks = bfs_ranks(start, &outgoing);
    let deepest = ranks.values().copied().max().unwrap_or(0);
    let has_unreachable = lexicon.states().any(|s| !ranks.contains_key(&s));
    let mut layers = vec![Vec::new(); deepest + 1 + usize::from(has_unreachable)];
    for state in lexicon.states() {
        let rank = ranks.get(&state).copied().unwrap_or(deepest + 1);
        layers[rank].push(state);
    }

    for idx in 1..layers.len() {
        let prev_positions = layers[idx - 1]
            .iter()
            .enumerate()
            .map(|(i, s)| (*s, i))
            .collect::<BTreeMap<_, _>>();
        sort_layer_by_barycenter(&mut layers[idx], &prev_positions, &predecessors);
    }

    let mid_x = (layers.len().saturating_sub(1)) as f32 * 0.5;
    let mut positions = BTreeMap::new();
    for (rank, layer) in layers.iter().enumerate() {
        let mid_y = (layer.len().saturating_sub(1)) as f32 * 0.5;
        for (i, state) in layer.iter().enumerate() {
            positions.insert(
                *state,
                [
                    (rank as f32 - mid_x) * spacing.rank_sep,
                    (mid_y - i as f32) * spacing.node_sep,
                ],
            );
        }
    }

    LexiconLayout { layers, positions }
}
