//! Brief analysis boundary.
//!
//! The analyzer is strictly advisory: its output pre-fills and augments
//! the brief's goal text and never gates a stage. Because of that, the
//! seam is infallible — the remote path degrades to the offline heuristic
//! on any transport or shape failure, and callers cannot tell the two
//! apart except by the `source` tag.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use ddk_schemas::{Brief, BriefAnalysis};
use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// Analyzer seam
// ---------------------------------------------------------------------------

pub trait BriefAnalyzer {
    fn analyze(&self, brief: &Brief) -> BriefAnalysis;
}

// ---------------------------------------------------------------------------
// HeuristicAnalyzer
// ---------------------------------------------------------------------------

/// Offline scorer: deterministic completeness score plus fixed-playbook
/// recommendations. Canonical fallback for every other analyzer.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicAnalyzer;

impl BriefAnalyzer for HeuristicAnalyzer {
    fn analyze(&self, brief: &Brief) -> BriefAnalysis {
        let goal_ok = !brief.goal.trim().is_empty();
        let budget_ok = brief.budget.map(|b| b > 0).unwrap_or(false);
        let deadline_ok = !brief.deadline.trim().is_empty();

        let mut issues = Vec::new();
        if !goal_ok {
            issues.push("Campaign goal is missing.".to_string());
        }
        if !budget_ok {
            issues.push("Budget is missing.".to_string());
        }
        if !deadline_ok {
            issues.push("Deadline is missing.".to_string());
        }

        let mut score: i32 = 50;
        if goal_ok {
            score += 20;
        }
        if budget_ok {
            score += 15;
        }
        if deadline_ok {
            score += 10;
        }

        BriefAnalysis {
            score: clamp_score(score),
            issues,
            questions: vec![
                "Who is the audience and what is the key insight?".to_string(),
                "What is the CTA and where does traffic land?".to_string(),
                "Which KPIs and creative constraints apply?".to_string(),
            ],
            suggestions: vec![
                "Add an audience portrait: age, geo, interests, pains.".to_string(),
                "Define a clear CTA and landing page (UTM / promo code).".to_string(),
                "Pick KPIs: CPA/CPL/ROAS, views, CTR.".to_string(),
            ],
            ideas: vec![
                "7-day product challenge".to_string(),
                "Before/after case with honest methodology".to_string(),
                "Series of short UGC reviews".to_string(),
            ],
            formats: vec![
                "60-90s integration".to_string(),
                "3x Shorts/Reels".to_string(),
                "20-40min stream/AMA".to_string(),
            ],
            source: "heuristic".to_string(),
        }
    }
}

fn clamp_score(score: i32) -> u8 {
    score.clamp(0, 100) as u8
}

// ---------------------------------------------------------------------------
// RemoteAnalyzer
// ---------------------------------------------------------------------------

/// HTTP analyzer posting `{"brief": …}` to a configured endpoint that
/// replies `{"ok": true, "result": {score, issues[], …}}`.
pub struct RemoteAnalyzer {
    endpoint: String,
    client: reqwest::blocking::Client,
    fallback: HeuristicAnalyzer,
}

impl RemoteAnalyzer {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("build brief-analysis http client failed")?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
            fallback: HeuristicAnalyzer,
        })
    }

    fn fetch(&self, brief: &Brief) -> Result<BriefAnalysis> {
        let body = serde_json::json!({ "brief": brief });
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .with_context(|| format!("brief-analysis request failed: {}", self.endpoint))?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("brief-analysis endpoint returned {status}");
        }

        let value: serde_json::Value = resp.json().context("brief-analysis reply is not JSON")?;
        normalize_reply(&value).context("brief-analysis reply has an unexpected shape")
    }
}

impl BriefAnalyzer for RemoteAnalyzer {
    fn analyze(&self, brief: &Brief) -> BriefAnalysis {
        match self.fetch(brief) {
            Ok(a) => a,
            Err(_) => self.fallback.analyze(brief),
        }
    }
}

/// Pull a [`BriefAnalysis`] out of the endpoint reply, tolerating sloppy
/// field types: score clamps to 0..=100 (absent ⇒ 60), list entries are
/// stringified, trimmed, and blanks dropped.
fn normalize_reply(value: &serde_json::Value) -> Option<BriefAnalysis> {
    let result = value.get("result").unwrap_or(value);
    if !result.is_object() {
        return None;
    }

    let score = result
        .get("score")
        .and_then(|v| v.as_i64())
        .map(|n| clamp_score(n.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32))
        .unwrap_or(60);

    Some(BriefAnalysis {
        score,
        issues: string_list(result.get("issues")),
        questions: string_list(result.get("questions")),
        suggestions: string_list(result.get("suggestions")),
        ideas: string_list(result.get("ideas")),
        formats: string_list(result.get("formats")),
        source: "remote".to_string(),
    })
}

fn string_list(value: Option<&serde_json::Value>) -> Vec<String> {
    let Some(serde_json::Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|v| match v {
            serde_json::Value::String(s) => Some(s.trim().to_string()),
            other => Some(other.to_string()),
        })
        .filter(|s| !s.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Result cache keyed by the sha256 of the brief's canonical JSON.
/// Identical briefs never hit the inner analyzer twice.
pub struct CachedAnalyzer<A: BriefAnalyzer> {
    inner: A,
    cache: RefCell<BTreeMap<String, BriefAnalysis>>,
}

impl<A: BriefAnalyzer> CachedAnalyzer<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            cache: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }
}

impl<A: BriefAnalyzer> BriefAnalyzer for CachedAnalyzer<A> {
    fn analyze(&self, brief: &Brief) -> BriefAnalysis {
        let key = cache_key(brief);
        if let Some(hit) = self.cache.borrow().get(&key) {
            let mut a = hit.clone();
            a.source = "cache".to_string();
            return a;
        }
        let fresh = self.inner.analyze(brief);
        self.cache.borrow_mut().insert(key, fresh.clone());
        fresh
    }
}

/// sha256 hex over the brief's canonical JSON.
pub fn cache_key(brief: &Brief) -> String {
    let canonical = serde_json::to_string(brief).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// Goal augmentation
// ---------------------------------------------------------------------------

/// Append accepted suggestions to the goal text (pre-fill only; the gate
/// never sees analyzer output). No suggestions ⇒ goal unchanged.
pub fn augment_goal(goal: &str, analysis: &BriefAnalysis) -> String {
    if analysis.suggestions.is_empty() {
        return goal.to_string();
    }
    let mut out = String::from(goal);
    out.push_str("\n\nRecommendations:\n");
    for s in &analysis.suggestions {
        out.push_str("- ");
        out.push_str(s);
        out.push('\n');
    }
    out.trim_end().to_string()
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn full_brief() -> Brief {
        Brief {
            goal: "Launch campaign".to_string(),
            budget: Some(50_000),
            deadline: "2025-12-01".to_string(),
        }
    }

    #[test]
    fn heuristic_scores_completeness() {
        let h = HeuristicAnalyzer;
        let full = h.analyze(&full_brief());
        assert_eq!(full.score, 95);
        assert!(full.issues.is_empty());
        assert_eq!(full.source, "heuristic");

        let empty = h.analyze(&Brief::default());
        assert_eq!(empty.score, 50);
        assert_eq!(empty.issues.len(), 3);
    }

    #[test]
    fn heuristic_flags_each_missing_field() {
        let h = HeuristicAnalyzer;
        let a = h.analyze(&Brief {
            goal: "g".to_string(),
            budget: None,
            deadline: String::new(),
        });
        assert_eq!(a.score, 70);
        assert_eq!(a.issues.len(), 2);
    }

    #[test]
    fn normalize_clamps_score_and_cleans_lists() {
        let v = serde_json::json!({
            "ok": true,
            "result": {
                "score": 400,
                "issues": ["  a  ", "", 7],
                "suggestions": ["do x"],
            }
        });
        let a = normalize_reply(&v).unwrap();
        assert_eq!(a.score, 100);
        assert_eq!(a.issues, vec!["a".to_string(), "7".to_string()]);
        assert_eq!(a.suggestions, vec!["do x".to_string()]);
        assert!(a.formats.is_empty());
        assert_eq!(a.source, "remote");
    }

    #[test]
    fn normalize_defaults_missing_score() {
        let v = serde_json::json!({ "result": { "issues": [] } });
        assert_eq!(normalize_reply(&v).unwrap().score, 60);
    }

    #[test]
    fn normalize_rejects_non_object_result() {
        let v = serde_json::json!({ "result": [1, 2, 3] });
        assert!(normalize_reply(&v).is_none());
        assert!(normalize_reply(&serde_json::json!("nope")).is_none());
    }

    #[test]
    fn cache_serves_repeat_briefs() {
        struct Counting(RefCell<usize>);
        impl BriefAnalyzer for Counting {
            fn analyze(&self, brief: &Brief) -> BriefAnalysis {
                *self.0.borrow_mut() += 1;
                HeuristicAnalyzer.analyze(brief)
            }
        }

        let cached = CachedAnalyzer::new(Counting(RefCell::new(0)));
        let first = cached.analyze(&full_brief());
        let second = cached.analyze(&full_brief());
        assert_eq!(*cached.inner.0.borrow(), 1);
        assert_eq!(first.score, second.score);
        assert_eq!(second.source, "cache");

        cached.analyze(&Brief::default());
        assert_eq!(*cached.inner.0.borrow(), 2);
        assert_eq!(cached.len(), 2);
    }

    #[test]
    fn cache_key_is_stable_and_content_sensitive() {
        assert_eq!(cache_key(&full_brief()), cache_key(&full_brief()));
        assert_ne!(cache_key(&full_brief()), cache_key(&Brief::default()));
    }

    #[test]
    fn augment_goal_appends_suggestions() {
        let a = HeuristicAnalyzer.analyze(&Brief::default());
        let out = augment_goal("Sell sneakers", &a);
        assert!(out.starts_with("Sell sneakers"));
        assert!(out.contains("Recommendations:"));
        assert!(out.contains("- Pick KPIs"));

        let none = BriefAnalysis::default();
        assert_eq!(augment_goal("Sell sneakers", &none), "Sell sneakers");
    }
}
