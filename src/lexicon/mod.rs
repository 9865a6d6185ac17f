//! Lexicon DFA: the state graph built by the compiler's lexer generator.
//!
//! [`Lexicon`] is the plain model read from the trace. [`layout`] ranks the states into
//! columns and [`view`] draws and animates them.

pub mod layout;
pub mod view;

use std::collections::BTreeMap;

use crate::trace::{Notify, Trace};

pub use layout::{LayoutSpacing, LexiconLayout, layout_lexicon};
pub use view::{LexiconView, LexiconViewConfig};

pub type StateId = u32;

/// One DFA transition on a single input character.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Transfer {
    pub from: StateId,
    pub to: StateId,
    /// Unicode scalar value of the input character.
    pub input: u32,
}

impl Transfer {
    /// Printable form of the input character.
    pub fn label(&self) -> String {
        match char::from_u32(self.input) {
            Some(ch) => ch.escape_default().to_string(),
            None => format!("\\u{{{:x}}}", self.input),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lexicon {
    tokens: BTreeMap<i64, String>,
    states: BTreeMap<StateId, Vec<String>>,
    transfers: Vec<Transfer>,
    accepts: BTreeMap<StateId, i64>,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the lexicon from trace events.
    ///
    /// State 0 is the generator's dead state; it and every transfer leaving it are
    /// skipped.
    pub fn from_trace(trace: &Trace) -> Self {
        let mut lexicon = Self::new();
        for notify in &trace.events {
            match notify {
                Notify::LexiconAddToken { id, name } => lexicon.add_token(*id, name.clone()),
                Notify::LexiconAddState { id, poses } => {
                    if *id != 0 {
                        lexicon.add_state(*id, poses.clone());
                    }
                }
                Notify::LexiconAddTransfer { from, to, input } => {
                    if *from != 0 {
                        lexicon.add_transfer(*from, *to, *input);
                    }
                }
                Notify::LexiconSetAccept { id, token } => lexicon.set_accept(*id, *token),
                _ => {}
            }
        }
        log::debug!(
            "lexicon: {} states, {} transfers, {} accepting",
            lexicon.states.len(),
            lexicon.transfers.len(),
            lexicon.accepts.len()
        );
        lexicon
    }

    pub fn add_token(&mut self, id: i64, name: String) {
        self.tokens.insert(id, name);
    }

    pub fn add_state(&mut self, id: StateId, poses: Vec<String>) {
        self.states.insert(id, poses);
    }

    /// Add a transfer. Transfers touching unknown states are dropped.
    pub fn add_transfer(&mut self, from: StateId, to: StateId, input: u32) -> bool {
        if !self.states.contains_key(&from) || !self.states.contains_key(&to) {
            log::debug!("lexicon: dropping transfer {from}->{to}; unknown state");
            return false;
        }
        self.transfers.push(Transfer { from, to, input });
        true
    }

    pub fn set_accept(&mut self, state: StateId, token: i64) {
        if !self.states.contains_key(&state) {
            log::debug!("lexicon: accept on unknown state {state}");
            return;
        }
        self.accepts.insert(state, token);
    }

    #[inline]
    pub fn contains(&self, state: StateId) -> bool {
        self.states.contains_key(&state)
    }

    /// State ids in ascending order.
    pub fn states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.states.keys().copied()
    }

    pub fn poses(&self, state: StateId) -> Option<&[String]> {
        self.states.get(&state).map(Vec::as_slice)
    }

    #[inline]
    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    /// Distinct `(from, to)` pairs with the inputs of every transfer between them.
    pub fn edges(&self) -> BTreeMap<(StateId, StateId), Vec<u32>> {
        let mut out: BTreeMap<(StateId, StateId), Vec<u32>> = BTreeMap::new();
        for t in &self.transfers {
            out.entry((t.from, t.to)).or_default().push(t.input);
        }
        out
    }

    /// The lowest state id, which the generator always uses for the start state.
    pub fn start_state(&self) -> Option<StateId> {
        self.states.keys().next().copied()
    }

    pub fn accept_states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.accepts.keys().copied()
    }

    pub fn accept_token(&self, state: StateId) -> Option<i64> {
        self.accepts.get(&state).copied()
    }

    pub fn token_name(&self, token: i64) -> Option<&str> {
        self.tokens.get(&token).map(String::as_str)
    }

    /// Name of the token `state` accepts, or its numeric id when the trace never named it.
    pub fn accept_name(&self, state: StateId) -> Option<String> {
        let token = self.accept_token(state)?;
        Some(
            self.token_name(token)
                .map(str::to_string)
                .unwrap_or_else(|| token.to_string()),
        )
    }

    /// Text drawn in a state: its id, plus the accepted token's name on a second line.
    pub fn state_label(&self, state: StateId) -> String {
        match self.accept_name(state) {
            Some(name) => format!("{state}\n{name}"),
            None => state.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace() -> Trace {
        Trace::parse(
            r#"[
                {"$":"LexiconAddToken","id":1,"name":"AB"},
                {"$":"LexiconAddState","id":0,"poses":[]},
                {"$":"LexiconAddState","id":1,"poses":["a"]},
                {"$":"LexiconAddState","id":2,"poses":["b"]},
                {"$":"LexiconAddTransfer","from":0,"to":0,"input":97},
                {"$":"LexiconAddTransfer","from":1,"to":2,"input":97},
                {"$":"LexiconAddTransfer","from":2,"to":2,"input":98},
                {"$":"LexiconAddTransfer","from":2,"to":2,"input":99},
                {"$":"LexiconSetAccept","id":2,"token":1}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn dead_state_is_skipped() {
        let lexicon = Lexicon::from_trace(&trace());
        assert_eq!(lexicon.states().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(lexicon.transfers().len(), 3);
        assert_eq!(lexicon.start_state(), Some(1));
    }

    #[test]
    fn parallel_transfers_share_an_edge() {
        let lexicon = Lexicon::from_trace(&trace());
        let edges = lexicon.edges();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[&(2, 2)], vec![98, 99]);
    }

    #[test]
    fn accept_label_names_token() {
        let lexicon = Lexicon::from_trace(&trace());
        assert_eq!(lexicon.state_label(1), "1");
        assert_eq!(lexicon.state_label(2), "2\nAB");
        assert_eq!(lexicon.accept_states().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn transfer_labels_escape_controls() {
        let t = |input| Transfer { from: 1, to: 2, input }.label();
        assert_eq!(t(97), "a");
        assert_eq!(t(10), "\\n");
    }
}
