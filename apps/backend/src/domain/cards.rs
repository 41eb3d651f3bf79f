//! Card decks: shared per-language templates and the private, shrinking
//! copies each game draws from.

use lazy_regex::regex;
use rand::seq::SliceRandom;
use rand::Rng;

/// The two card pools a deck holds.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CardKind {
    /// Card with one or more blanks (`_`), read out by the judge.
    Prompt,
    /// Single-use card held in hands and submitted to fill blanks.
    Answer,
}

/// Immutable card set for one language.
///
/// Templates are loaded once and shared between games; every game works on
/// its own [`Deck`] produced by [`DeckTemplate::clone_and_shuffle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckTemplate {
    language: String,
    name: String,
    extends: Option<String>,
    prompts: Vec<String>,
    answers: Vec<String>,
}

impl DeckTemplate {
    pub fn new(
        language: impl Into<String>,
        name: impl Into<String>,
        extends: Option<String>,
        prompts: Vec<String>,
        answers: Vec<String>,
    ) -> Self {
        Self {
            language: language.into(),
            name: name.into(),
            extends,
            prompts,
            answers,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent language whose cards this template inherits.
    pub fn extends(&self) -> Option<&str> {
        self.extends.as_deref()
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    /// Merge a parent's cards into this template.
    ///
    /// Parent cards are prepended and nothing is removed, so the result is a
    /// strict superset of both.
    pub fn extend(&self, parent: &DeckTemplate) -> DeckTemplate {
        let mut prompts = Vec::with_capacity(parent.prompts.len() + self.prompts.len());
        prompts.extend(parent.prompts.iter().cloned());
        prompts.extend(self.prompts.iter().cloned());

        let mut answers = Vec::with_capacity(parent.answers.len() + self.answers.len());
        answers.extend(parent.answers.iter().cloned());
        answers.extend(self.answers.iter().cloned());

        DeckTemplate {
            language: self.language.clone(),
            name: self.name.clone(),
            extends: self.extends.clone(),
            prompts,
            answers,
        }
    }

    /// Independent, shuffled copy for one game.
    pub fn clone_and_shuffle<R: Rng + ?Sized>(&self, rng: &mut R) -> Deck {
        Deck {
            language: self.language.clone(),
            prompts: shuffle(self.prompts.clone(), rng),
            answers: shuffle(self.answers.clone(), rng),
        }
    }
}

/// A game's private deck. Cards leave it for good when drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    language: String,
    prompts: Vec<String>,
    answers: Vec<String>,
}

impl Deck {
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Remove and return one uniformly random card of `kind`.
    ///
    /// Returns `None` once the pool is empty; never panics.
    pub fn draw<R: Rng + ?Sized>(&mut self, kind: CardKind, rng: &mut R) -> Option<String> {
        let pool = self.pool_mut(kind);
        let index = pick_index(pool.len(), rng)?;
        Some(pool.swap_remove(index))
    }

    pub fn draw_prompt<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<String> {
        self.draw(CardKind::Prompt, rng)
    }

    pub fn draw_answer<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<String> {
        self.draw(CardKind::Answer, rng)
    }

    pub fn remaining(&self, kind: CardKind) -> usize {
        match kind {
            CardKind::Prompt => self.prompts.len(),
            CardKind::Answer => self.answers.len(),
        }
    }

    /// Whether at least one card of each kind is left.
    pub fn is_playable(&self) -> bool {
        !self.prompts.is_empty() && !self.answers.is_empty()
    }

    fn pool_mut(&mut self, kind: CardKind) -> &mut Vec<String> {
        match kind {
            CardKind::Prompt => &mut self.prompts,
            CardKind::Answer => &mut self.answers,
        }
    }
}

/// Fisher-Yates shuffle returning the reordered sequence.
pub fn shuffle<T, R: Rng + ?Sized>(mut items: Vec<T>, rng: &mut R) -> Vec<T> {
    items.shuffle(rng);
    items
}

/// Uniform index into a sequence of `len` items; `None` when empty.
pub fn pick_index<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Option<usize> {
    if len == 0 {
        None
    } else {
        Some(rng.random_range(0..len))
    }
}

/// Number of answer cards a prompt asks for: one per run of underscores.
///
/// A prompt without any blank still takes a single answer.
pub fn count_blanks(prompt: &str) -> usize {
    regex!("_+").find_iter(prompt).count().max(1)
}
