// logtriage - GPL-3.0-or-later
// This file is part of logtriage.
//
// Copyright (C) 2025 The logtriage authors
//
// logtriage is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// logtriage is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with logtriage.  If not, see <https://www.gnu.org/licenses/>.

//! Routing of failing lines to a responsible role.
//!
//! Two strategies share the [`RoleRouter`] interface: plain keyword counting
//! over developer roles, and weighted scoring over technical domains. Both
//! resolve ties in favour of the rule listed first.

use super::lexicon::{KeywordRule, DOMAIN_RULES, ROLE_RULES};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome of routing one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RoutingDecision {
    Assigned { role: &'static str, score: u32 },
    Unassigned,
}

impl RoutingDecision {
    /// The routed role, or `None` when no rule scored.
    pub const fn role(&self) -> Option<&'static str> {
        match *self {
            Self::Assigned { role, .. } => Some(role),
            Self::Unassigned => None,
        }
    }
}

/// Trait for role routing strategies
pub trait RoleRouter: Send + Sync {
    /// Route a failing line. Must depend on `text` only.
    fn route(&self, text: &str) -> RoutingDecision;

    /// Label reported for [`RoutingDecision::Unassigned`]
    fn unassigned_label(&self) -> &'static str;

    fn strategy(&self) -> RoutingStrategy;

    /// Keyword table the strategy scores against
    fn rules(&self) -> &'static [KeywordRule];

    /// Team label for a decision, falling back to [`Self::unassigned_label`]
    fn team_label(&self, decision: &RoutingDecision) -> &'static str {
        decision.role().unwrap_or_else(|| self.unassigned_label())
    }
}

/// Pick the rule with the strictly highest score, keeping the earliest on ties.
fn best_rule(
    rules: &[KeywordRule],
    score: impl Fn(&KeywordRule) -> u32,
) -> RoutingDecision {
    let mut best: Option<(&KeywordRule, u32)> = None;

    for rule in rules {
        let rule_score = score(rule);
        let leads = best.map_or(rule_score > 0, |(_, best_score)| rule_score > best_score);
        if leads {
            best = Some((rule, rule_score));
        }
    }

    match best {
        Some((rule, score)) => RoutingDecision::Assigned {
            role: rule.label,
            score,
        },
        None => RoutingDecision::Unassigned,
    }
}

/// Scores developer roles by the number of their keywords present in the line.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordCountRouter;

impl RoleRouter for KeywordCountRouter {
    fn route(&self, text: &str) -> RoutingDecision {
        let lowered = text.to_lowercase();
        let decision = best_rule(self.rules(), |rule| rule.hits(&lowered));
        tracing::debug!("Keyword-count routing for {text:?}: {decision:?}");
        decision
    }

    fn unassigned_label(&self) -> &'static str {
        "system"
    }

    fn strategy(&self) -> RoutingStrategy {
        RoutingStrategy::KeywordCount
    }

    fn rules(&self) -> &'static [KeywordRule] {
        &ROLE_RULES
    }
}

/// Scores technical domains, counting strong keywords twice.
#[derive(Debug, Default, Clone, Copy)]
pub struct WeightedDomainRouter;

impl RoleRouter for WeightedDomainRouter {
    fn route(&self, text: &str) -> RoutingDecision {
        let lowered = text.to_lowercase();
        let decision = best_rule(self.rules(), |rule| rule.weighted_hits(&lowered));
        tracing::debug!("Weighted-domain routing for {text:?}: {decision:?}");
        decision
    }

    fn unassigned_label(&self) -> &'static str {
        "General Development"
    }

    fn strategy(&self) -> RoutingStrategy {
        RoutingStrategy::WeightedDomain
    }

    fn rules(&self) -> &'static [KeywordRule] {
        &DOMAIN_RULES
    }
}

/// Selectable routing strategy
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingStrategy {
    #[default]
    KeywordCount,
    WeightedDomain,
}

impl RoutingStrategy {
    #[must_use]
    pub fn router(self) -> Box<dyn RoleRouter> {
        match self {
            Self::KeywordCount => Box::new(KeywordCountRouter),
            Self::WeightedDomain => Box::new(WeightedDomainRouter),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::KeywordCount => "keyword-count",
            Self::WeightedDomain => "weighted-domain",
        }
    }
}

impl fmt::Display for RoutingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RoutingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "keyword-count" | "keyword" => Ok(Self::KeywordCount),
            "weighted-domain" | "weighted" => Ok(Self::WeightedDomain),
            other => Err(format!("unknown routing strategy: {other}")),
        }
    }
}
