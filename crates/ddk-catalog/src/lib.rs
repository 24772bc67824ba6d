//! Base deal catalog, blogger seeds, and the selection list.
//!
//! The catalog is read-only input: it supplies the immutable identity of
//! every deal and the blogger roster the selection list points into. The
//! core never writes any of it — progress lives in the overlay.
//!
//! Loaders are tolerant the same way the overlay is: a missing or broken
//! seed file degrades to a built-in demo catalog instead of failing, so a
//! fresh checkout works with zero setup. `load_*` variants returning
//! `Result` exist for callers that want the error.

use std::path::Path;

use anyhow::{Context, Result};
use ddk_schemas::DealRecord;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Blogger
// ---------------------------------------------------------------------------

/// One influencer roster entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blogger {
    pub id: String,
    pub name: String,
    pub platform: String,
    #[serde(default)]
    pub niche: String,
    #[serde(default)]
    pub subscribers: u64,
    /// Engagement rate, percent.
    #[serde(default)]
    pub er: f64,
    #[serde(default)]
    pub price: u64,
    #[serde(default)]
    pub email: String,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Immutable seed data: candidate deals plus the blogger roster.
#[derive(Debug, Clone)]
pub struct Catalog {
    deals: Vec<DealRecord>,
    bloggers: Vec<Blogger>,
}

impl Catalog {
    /// Built-in demo seeds, used whenever the seed files are absent or
    /// unreadable.
    pub fn demo() -> Self {
        Self {
            deals: vec![DealRecord::base(
                "deal_demo",
                "Integration campaign",
                "Demo Brand",
                "YouTube",
                "2025-12-31",
            )],
            bloggers: vec![
                Blogger {
                    id: "1".to_string(),
                    name: "Ivan Petrov".to_string(),
                    platform: "YouTube".to_string(),
                    niche: "tech".to_string(),
                    subscribers: 125_000,
                    er: 4.5,
                    price: 2_500,
                    email: "ivan@example.com".to_string(),
                },
                Blogger {
                    id: "2".to_string(),
                    name: "Anna Sidorova".to_string(),
                    platform: "Instagram".to_string(),
                    niche: "beauty".to_string(),
                    subscribers: 87_000,
                    er: 7.2,
                    price: 1_800,
                    email: "anna@example.com".to_string(),
                },
                Blogger {
                    id: "3".to_string(),
                    name: "Sergey Kozlov".to_string(),
                    platform: "YouTube".to_string(),
                    niche: "gaming".to_string(),
                    subscribers: 356_000,
                    er: 3.8,
                    price: 4_200,
                    email: "sergey@example.com".to_string(),
                },
            ],
        }
    }

    /// Strict loader: both seed files must parse.
    pub fn load(deals_path: &Path, bloggers_path: &Path) -> Result<Self> {
        let deals = load_json_list::<DealRecord>(deals_path)?;
        let bloggers = load_json_list::<Blogger>(bloggers_path)?;
        Ok(Self { deals, bloggers })
    }

    /// Tolerant loader: any failure yields [`Catalog::demo`].
    pub fn load_or_demo(deals_path: &Path, bloggers_path: &Path) -> Self {
        Self::load(deals_path, bloggers_path).unwrap_or_else(|_| Self::demo())
    }

    /// The working deal's base: the first catalog entry. The demo catalog
    /// guarantees at least one, so an empty list also maps to the demo
    /// seed.
    pub fn primary_deal(&self) -> DealRecord {
        self.deals
            .first()
            .cloned()
            .unwrap_or_else(|| Self::demo().deals[0].clone())
    }

    pub fn deal(&self, id: &str) -> Option<&DealRecord> {
        self.deals.iter().find(|d| d.id == id)
    }

    pub fn deals(&self) -> &[DealRecord] {
        &self.deals
    }

    pub fn blogger(&self, id: &str) -> Option<&Blogger> {
        self.bloggers.iter().find(|b| b.id == id)
    }

    pub fn bloggers(&self) -> &[Blogger] {
        &self.bloggers
    }

    /// Display line for a selected blogger; unknown ids degrade to the raw
    /// id rather than failing.
    pub fn blogger_summary(&self, id: &str) -> String {
        match self.blogger(id) {
            Some(b) => format!("{} · {} · {}", b.name, b.platform, b.niche),
            None => format!("ID: {id}"),
        }
    }
}

fn load_json_list<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read seed file failed: {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse seed file failed: {}", path.display()))
}

// ---------------------------------------------------------------------------
// Selection list
// ---------------------------------------------------------------------------

/// Ordered list of picked blogger ids.
///
/// The gate only ever consumes `count() > 0`; the outreach preview lists
/// the ids themselves.
pub trait SelectionProvider {
    fn picked(&self) -> Vec<String>;

    fn count(&self) -> usize {
        self.picked().len()
    }
}

/// Fixed list, for tests and for wiring a single chosen blogger.
#[derive(Debug, Clone, Default)]
pub struct StaticSelection {
    ids: Vec<String>,
}

impl StaticSelection {
    pub fn new(ids: Vec<String>) -> Self {
        Self { ids }
    }
}

impl SelectionProvider for StaticSelection {
    fn picked(&self) -> Vec<String> {
        self.ids.clone()
    }
}

/// Selection persisted as a JSON string array; damage degrades to empty.
pub struct FileSelection {
    path: std::path::PathBuf,
}

impl FileSelection {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SelectionProvider for FileSelection {
    fn picked(&self) -> Vec<String> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return Vec::new(),
        };
        serde_json::from_str(&raw).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
