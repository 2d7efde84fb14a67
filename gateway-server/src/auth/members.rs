//! Member allow-list gate

use log::warn;

/// Decides whether a verified upstream identity is permitted to use the
/// gateway. This is the authorization boundary of the whole system: the
/// upstream provider authenticates, the gate authorizes.
pub struct MemberGate {
    /// Lowercased member emails; empty means the gate is disabled
    members: Vec<String>,
}

impl MemberGate {
    /// Build a gate from an already-normalized (lowercased) allow-list
    pub fn new(members: Vec<String>) -> Self {
        Self { members }
    }

    /// Case-insensitive exact match against the allow-list. An empty list
    /// permits everyone; that fallback is logged loudly on every use since
    /// it silently disables the authorization boundary.
    pub fn is_member(&self, email: &str) -> bool {
        if self.members.is_empty() {
            warn!(
                "Member allow-list is empty, admitting '{}' without an authorization check",
                email
            );
            return true;
        }
        let normalized = email.to_lowercase();
        self.members.iter().any(|member| member == &normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> MemberGate {
        MemberGate::new(vec![
            "alice@example.com".to_string(),
            "bob@example.com".to_string(),
        ])
    }

    #[test]
    fn test_member_is_admitted() {
        assert!(gate().is_member("alice@example.com"));
    }

    #[test]
    fn test_match_is_case_insensitive() {
        assert!(gate().is_member("Alice@Example.COM"));
    }

    #[test]
    fn test_non_member_is_rejected() {
        assert!(!gate().is_member("mallory@example.com"));
        // Substrings and prefixes are not matches
        assert!(!gate().is_member("alice@example.com.evil.org"));
        assert!(!gate().is_member("alice"));
    }

    #[test]
    fn test_empty_list_admits_everyone() {
        let open = MemberGate::new(vec![]);
        assert!(open.is_member("anyone@anywhere.example"));
    }
}
