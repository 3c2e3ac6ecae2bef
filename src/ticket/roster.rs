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


use serde::{Deserialize, Serialize};

/// A person tickets can be assigned to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Developer {
    pub name: String,
    pub email: String,
    /// Role label matched against routing decisions, e.g. "Backend developer"
    pub role: String,
    /// Tracker account used as assignee
    #[serde(default, alias = "accountId")]
    pub account_id: Option<String>,
}

/// Developers known to the service, in configuration order
#[derive(Debug, Clone, Default)]
pub struct Roster {
    developers: Vec<Developer>,
}

impl Roster {
    pub const fn new(developers: Vec<Developer>) -> Self {
        Self { developers }
    }

    pub fn developers(&self) -> &[Developer] {
        &self.developers
    }

    /// First developer whose role matches `role`, ignoring case
    pub fn find_by_role(&self, role: &str) -> Option<&Developer> {
        let found = self
            .developers
            .iter()
            .find(|dev| dev.role.eq_ignore_ascii_case(role));

        if found.is_none() {
            tracing::debug!("No developer found for role '{role}'");
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn developer(name: &str, role: &str) -> Developer {
        Developer {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            role: role.to_string(),
            account_id: Some(format!("acc-{name}")),
        }
    }

    #[test]
    fn test_find_by_role_ignores_case() {
        let roster = Roster::new(vec![
            developer("Ana", "Backend Developer"),
            developer("Bo", "Tester"),
        ]);

        let dev = roster.find_by_role("Backend developer").unwrap();
        assert_eq!(dev.name, "Ana");
        assert_eq!(roster.find_by_role("tester").unwrap().name, "Bo");
        assert!(roster.find_by_role("Database developer").is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let roster = Roster::new(vec![developer("Ana", "Tester"), developer("Bo", "Tester")]);
        assert_eq!(roster.find_by_role("Tester").unwrap().name, "Ana");
    }

    #[test]
    fn test_account_id_alias() {
        let dev: Developer = serde_json::from_str(
            r#"{"name":"Cy","email":"cy@example.com","role":"Tester","accountId":"712020:abc"}"#,
        )
        .unwrap();
        assert_eq!(dev.account_id.as_deref(), Some("712020:abc"));
    }
}
