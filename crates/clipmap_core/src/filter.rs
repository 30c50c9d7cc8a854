//! # Location Filter
//!
//! Operator overrides for known-bad asset data.
//!
//! ## Rule File
//!
//! ```text
//! # comment
//! Door           # clear the flags of every object named "Door"
//! 3333,3333,0    # force-clear that exact tile
//! !3333,3333,0   # force-block that exact tile
//! ```
//!
//! Blank lines are ignored and `#` starts a trailing comment. Position
//! rules win over name rules; clears win over blocks. The `!` form exists
//! for named objects that turn out to be real obstacles somewhere.

use std::collections::HashSet;
use std::path::Path;

use clipmap_shared::Position;
use tracing::{debug, info};

use crate::error::FilterError;
use crate::source::{ObjectDefinition, Placement};

/// Outcome of filtering one placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterDecision {
    /// Classify normally.
    Allow,
    /// Reset the footprint to CLEAR.
    ForceClear,
    /// Reset the footprint to BLOCKED.
    ForceBlock,
}

/// Decides how a placement is treated before classification.
pub trait PlacementFilter {
    /// Decides for one placement given its candidate definitions.
    fn decide(&self, placement: &Placement, definitions: &[ObjectDefinition]) -> FilterDecision;
}

/// Filter that allows everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl PlacementFilter for AllowAll {
    fn decide(&self, _placement: &Placement, _definitions: &[ObjectDefinition]) -> FilterDecision {
        FilterDecision::Allow
    }
}

/// Rule-driven filter parsed from a line-oriented file.
#[derive(Clone, Debug, Default)]
pub struct LocationFilter {
    /// Exact positions whose footprint is cleared.
    clear_positions: HashSet<Position>,
    /// Exact positions whose footprint is blocked.
    block_positions: HashSet<Position>,
    /// Object names that are cleared wherever they appear.
    names: HashSet<String>,
}

impl LocationFilter {
    /// Creates a filter with no rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses rule text.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::BadCoordinate`] if a three-part rule has a
    /// component that is not an integer.
    pub fn parse(text: &str) -> Result<Self, FilterError> {
        let mut filter = Self::new();

        for (index, raw) in text.lines().enumerate() {
            let rule = raw.split('#').next().unwrap_or_default().trim();
            if rule.is_empty() {
                continue;
            }

            let parts: Vec<&str> = rule.split(',').collect();
            if parts.len() != 3 {
                debug!("Filtering name {}", rule);
                filter.names.insert(rule.to_string());
                continue;
            }

            let (blocked, first) = match parts[0].strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, parts[0]),
            };
            let bad = || FilterError::BadCoordinate {
                line: index + 1,
                text: rule.to_string(),
            };
            let x = first.trim().parse::<i32>().map_err(|_| bad())?;
            let y = parts[1].trim().parse::<i32>().map_err(|_| bad())?;
            let plane = parts[2].trim().parse::<u8>().map_err(|_| bad())?;
            let pos = Position::new(x, y, plane);

            if blocked {
                debug!("Blocking position {}", pos);
                filter.block_positions.insert(pos);
            } else {
                debug!("Clearing position {}", pos);
                filter.clear_positions.insert(pos);
            }
        }

        Ok(filter)
    }

    /// Loads and parses a rule file.
    ///
    /// A missing file is not an error: the filter is empty.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Io`] if the file exists but cannot be read, or
    /// any error from [`LocationFilter::parse`].
    pub fn load(path: &Path) -> Result<Self, FilterError> {
        if !path.exists() {
            info!("Create {} to filter objects/positions.", path.display());
            return Ok(Self::new());
        }

        let text = std::fs::read_to_string(path).map_err(|source| FilterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let filter = Self::parse(&text)?;
        info!(
            "Loaded filter {}: {} names, {} cleared, {} blocked positions",
            path.display(),
            filter.names.len(),
            filter.clear_positions.len(),
            filter.block_positions.len()
        );
        Ok(filter)
    }

    /// Total number of rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.names.len() + self.clear_positions.len() + self.block_positions.len()
    }

    /// Returns true if the filter has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rule_count() == 0
    }
}

impl PlacementFilter for LocationFilter {
    fn decide(&self, placement: &Placement, definitions: &[ObjectDefinition]) -> FilterDecision {
        if self.clear_positions.contains(&placement.position) {
            return FilterDecision::ForceClear;
        }
        if self.block_positions.contains(&placement.position) {
            return FilterDecision::ForceBlock;
        }
        if definitions.iter().any(|def| self.names.contains(&def.name)) {
            return FilterDecision::ForceClear;
        }
        FilterDecision::Allow
    }
}
