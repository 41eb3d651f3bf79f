//! Card pack loading: one `<lang>.json` file per language.
//!
//! Templates are resolved once at load time (parent chain merged in) and
//! shared immutably between all sessions of that language.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::cards::DeckTemplate;
use crate::error::AppError;
use crate::errors::domain::{DomainError, NotFoundKind};
use crate::protocol::game_state::LanguageInfo;

/// On-disk pack format. Black cards are prompts, white cards are answers.
#[derive(Debug, Deserialize)]
struct PackFile {
    name: String,
    #[serde(default)]
    extends: Option<String>,
    #[serde(default)]
    black: Vec<String>,
    #[serde(default)]
    white: Vec<String>,
}

#[derive(Debug, Default)]
pub struct CardPacks {
    templates: BTreeMap<String, Arc<DeckTemplate>>,
}

impl CardPacks {
    /// Build from unresolved templates, merging each parent chain.
    pub fn from_templates(raw: impl IntoIterator<Item = DeckTemplate>) -> Self {
        let raw: BTreeMap<String, DeckTemplate> = raw
            .into_iter()
            .map(|t| (t.language().to_string(), t))
            .collect();

        let templates = raw
            .keys()
            .map(|lang| {
                let mut visiting = BTreeSet::new();
                let resolved = resolve(&raw, lang, &mut visiting);
                (lang.clone(), Arc::new(resolved))
            })
            .collect();

        Self { templates }
    }

    /// Load every `*.json` file in `dir`.
    ///
    /// A broken file is logged and skipped; only an unreadable directory is
    /// an error.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, AppError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| {
            AppError::io(format!("cannot read card directory {}", dir.display()), e)
        })?;

        let mut raw = Vec::new();
        let mut failed = 0usize;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(lang) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match load_file(&path, lang) {
                Ok(template) => raw.push(template),
                Err(err) => {
                    failed += 1;
                    warn!(path = %path.display(), error = %err, "[CARDS] failed to load card pack");
                }
            }
        }

        let packs = Self::from_templates(raw);
        info!(
            loaded = packs.templates.len(),
            failed,
            languages = ?packs.templates.keys().collect::<Vec<_>>(),
            "[CARDS] card packs loaded"
        );
        Ok(packs)
    }

    pub fn template(&self, lang: &str) -> Result<Arc<DeckTemplate>, DomainError> {
        self.templates.get(lang).cloned().ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Language, format!("no cards for language {lang}"))
        })
    }

    pub fn contains(&self, lang: &str) -> bool {
        self.templates.contains_key(lang)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Summaries for the connection greeting, sorted by language key.
    pub fn languages(&self) -> Vec<LanguageInfo> {
        self.templates
            .iter()
            .map(|(lang, t)| LanguageInfo {
                lang: lang.clone(),
                name: t.name().to_string(),
                prompts: t.prompts().len(),
                answers: t.answers().len(),
            })
            .collect()
    }
}

fn load_file(path: &Path, lang: &str) -> Result<DeckTemplate, AppError> {
    let bytes = std::fs::read(path)
        .map_err(|e| AppError::io(format!("cannot read {}", path.display()), e))?;
    let pack: PackFile = serde_json::from_slice(&bytes)?;
    Ok(DeckTemplate::new(
        lang,
        pack.name,
        pack.extends,
        pack.black,
        pack.white,
    ))
}

/// Merge `lang` with its ancestors. Missing parents and cycles end the chain.
fn resolve(
    raw: &BTreeMap<String, DeckTemplate>,
    lang: &str,
    visiting: &mut BTreeSet<String>,
) -> DeckTemplate {
    let own = &raw[lang];
    visiting.insert(lang.to_string());

    let Some(parent) = own.extends() else {
        return own.clone();
    };
    if visiting.contains(parent) {
        warn!(lang, parent, "[CARDS] extends cycle; ignoring parent");
        return own.clone();
    }
    if !raw.contains_key(parent) {
        warn!(lang, parent, "[CARDS] extends unknown language; ignoring parent");
        return own.clone();
    }
    let parent = resolve(raw, parent, visiting);
    own.extend(&parent)
}
