//! Organization directory search.

use serde::{Deserialize, Deserializer, Serialize};

/// A user record as returned by the directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryUser {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub display_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub user_principal_name: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl DirectoryUser {
    fn matches(&self, lower_query: &str) -> bool {
        self.display_name.to_lowercase().contains(lower_query)
            || self.user_principal_name.to_lowercase().contains(lower_query)
    }
}

/// Fetched users plus the current filter and selection.
#[derive(Debug, Default)]
pub struct DirectorySearch {
    users: Vec<DirectoryUser>,
    query: String,
    selected: Vec<String>,
}

impl DirectorySearch {
    pub fn new(users: Vec<DirectoryUser>) -> Self {
        Self {
            users,
            ..Self::default()
        }
    }

    /// Replace the fetched list. Selections of users that disappeared are dropped.
    pub fn set_users(&mut self, users: Vec<DirectoryUser>) {
        self.selected
            .retain(|id| users.iter().any(|user| &user.id == id));
        self.users = users;
    }

    pub fn users(&self) -> &[DirectoryUser] {
        &self.users
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn clear_query(&mut self) {
        self.query.clear();
    }

    fn has_query(&self) -> bool {
        !self.query.trim().is_empty()
    }

    /// Users whose display name or principal name contains the query,
    /// ignoring case. A blank query matches everyone.
    pub fn filtered(&self) -> Vec<&DirectoryUser> {
        if !self.has_query() {
            return self.users.iter().collect();
        }
        let lower = self.query.to_lowercase();
        self.users.iter().filter(|user| user.matches(&lower)).collect()
    }

    /// Toggle a user in or out of the selection.
    pub fn toggle(&mut self, user_id: &str) {
        if let Some(pos) = self.selected.iter().position(|id| id == user_id) {
            self.selected.remove(pos);
        } else {
            self.selected.push(user_id.to_string());
        }
    }

    pub fn is_selected(&self, user_id: &str) -> bool {
        self.selected.iter().any(|id| id == user_id)
    }

    pub fn selected_ids(&self) -> &[String] {
        &self.selected
    }

    /// Result count line, shown only while a query is active.
    pub fn match_summary(&self) -> Option<String> {
        self.has_query()
            .then(|| format!("{} 件のユーザーが見つかりました", self.filtered().len()))
    }

    /// Placeholder text when nothing is listed.
    pub fn empty_message(&self) -> Option<&'static str> {
        if !self.filtered().is_empty() {
            return None;
        }
        Some(if self.has_query() {
            "ユーザーが見つかりません"
        } else {
            "ユーザーがいません"
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, name: &str, upn: &str) -> DirectoryUser {
        DirectoryUser {
            id: id.to_string(),
            display_name: name.to_string(),
            user_principal_name: upn.to_string(),
        }
    }

    fn search() -> DirectorySearch {
        DirectorySearch::new(vec![
            user("1", "Akiyama Ren", "akiyama@example.onmicrosoft.com"),
            user("2", "Hayashi Mio", "mio.h@example.com"),
            user("3", "Kato Sora", "sora@example.onmicrosoft.com"),
        ])
    }

    #[test]
    fn test_blank_query_lists_everyone() {
        let mut s = search();
        s.set_query("   ");
        assert_eq!(s.filtered().len(), 3);
        assert!(s.match_summary().is_none());
    }

    #[test]
    fn test_filter_matches_name_or_upn_case_insensitively() {
        let mut s = search();
        s.set_query("HAYASHI");
        assert_eq!(s.filtered()[0].id, "2");

        s.set_query("onmicrosoft");
        let ids: Vec<_> = s.filtered().iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(s.match_summary().unwrap(), "2 件のユーザーが見つかりました");
    }

    #[test]
    fn test_empty_messages() {
        let mut s = search();
        s.set_query("nobody");
        assert_eq!(s.empty_message(), Some("ユーザーが見つかりません"));
        s.clear_query();
        assert_eq!(s.empty_message(), None);
        assert_eq!(DirectorySearch::default().empty_message(), Some("ユーザーがいません"));
    }

    #[test]
    fn test_toggle_selection() {
        let mut s = search();
        s.toggle("2");
        s.toggle("3");
        s.toggle("2");
        assert_eq!(s.selected_ids(), ["3".to_string()]);
        assert!(s.is_selected("3"));
        assert!(!s.is_selected("2"));
    }

    #[test]
    fn test_set_users_drops_stale_selection() {
        let mut s = search();
        s.toggle("1");
        s.toggle("3");
        s.set_users(vec![user("3", "Kato Sora", "sora@example.onmicrosoft.com")]);
        assert_eq!(s.selected_ids(), ["3".to_string()]);
    }

    #[test]
    fn test_deserializes_graph_shape() {
        let json = r#"{"id":"9","displayName":"Mori Aoi","userPrincipalName":"aoi@example.com"}"#;
        let parsed: DirectoryUser = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, user("9", "Mori Aoi", "aoi@example.com"));

        let sparse: DirectoryUser =
            serde_json::from_str(r#"{"id":"10","displayName":null}"#).unwrap();
        assert_eq!(sparse.display_name, "");
        assert_eq!(sparse.user_principal_name, "");
    }
}
