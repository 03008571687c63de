//! Dashboard view logic
//!
//! Stat cards and the officer filter bar, computed client-side over the
//! issues already fetched for the view.

use shared::models::{Issue, IssueStatus, Priority};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total: usize,
    /// Resolved or closed
    pub resolved: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub high_priority: usize,
}

impl DashboardStats {
    pub fn from_issues(issues: &[Issue]) -> Self {
        let total = issues.len();
        let resolved = issues.iter().filter(|i| i.status.is_done()).count();
        Self {
            total,
            resolved,
            pending: total - resolved,
            in_progress: issues
                .iter()
                .filter(|i| i.status == IssueStatus::InProgress)
                .count(),
            high_priority: issues
                .iter()
                .filter(|i| i.priority == Priority::High)
                .count(),
        }
    }
}

/// Officer dashboard filter bar
#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    /// Matches reporter name, category, text or id, case-insensitively
    pub search: String,
    pub status: Option<IssueStatus>,
    pub priority: Option<Priority>,
    /// The officer's registered address
    pub location: Option<String>,
}

impl IssueFilter {
    pub fn matches(&self, issue: &Issue) -> bool {
        self.matches_search(issue)
            && self.status.is_none_or(|s| issue.status == s)
            && self.priority.is_none_or(|p| issue.priority == p)
            && self.matches_location(issue)
    }

    fn matches_search(&self, issue: &Issue) -> bool {
        let term = self.search.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        let reporter = if issue.reported_by.name.is_empty() {
            "unknown"
        } else {
            issue.reported_by.name.as_str()
        };
        [reporter, &issue.category, &issue.text, &issue.id]
            .iter()
            .any(|field| field.to_lowercase().contains(&term))
    }

    /// Officer address against issue region and address, both directions
    /// for the region
    fn matches_location(&self, issue: &Issue) -> bool {
        let officer = match &self.location {
            Some(addr) if !addr.trim().is_empty() => addr.to_lowercase(),
            _ => return true,
        };
        let region = issue.region.to_lowercase();
        let address = issue.location.address.to_lowercase();
        region.contains(&officer) || officer.contains(&region) || address.contains(&officer)
    }

    /// Matching issues, newest first
    pub fn apply(&self, issues: &[Issue]) -> Vec<Issue> {
        let mut matched: Vec<Issue> = issues.iter().filter(|i| self.matches(i)).cloned().collect();
        sort_newest_first(&mut matched);
        matched
    }
}

pub fn sort_newest_first(issues: &mut [Issue]) {
    issues.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
