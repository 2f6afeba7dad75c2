// src/resource/filter.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Allow/deny glob patterns applied to entry names.
///
/// A name is accepted when it matches the allow set (or no allow set is
/// given) and does not match the deny set. Deny wins.
#[derive(Clone, Default)]
pub struct NameFilter {
    allow: Option<GlobSet>,
    deny: Option<GlobSet>,
}

impl fmt::Debug for NameFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameFilter")
            .field("allow", &self.allow.is_some())
            .field("deny", &self.deny.is_some())
            .finish()
    }
}

impl NameFilter {
    /// Filter that accepts every name.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn new<S: AsRef<str>>(allow: &[S], deny: &[S]) -> Result<Self> {
        Ok(Self {
            allow: optional_globset(allow).context("building allow patterns")?,
            deny: optional_globset(deny).context("building deny patterns")?,
        })
    }

    pub fn accepts(&self, name: &str) -> bool {
        if let Some(allow) = &self.allow {
            if !allow.is_match(name) {
                return false;
            }
        }
        if let Some(deny) = &self.deny {
            if deny.is_match(name) {
                return false;
            }
        }
        true
    }
}

fn optional_globset<S: AsRef<str>>(patterns: &[S]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let pat = pat.as_ref();
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(Some(builder.build()?))
}
