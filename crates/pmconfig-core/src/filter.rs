use serde_yaml::Value;
use std::collections::BTreeMap;

/// Field → allowed values.
///
/// A project matches when every field matches (AND across fields) and a
/// field matches when its value is any of the allowed values (OR within a
/// field). List-valued fields match when any element is allowed. Absent
/// fields never match. The pseudo-field `id` matches the project id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    clauses: BTreeMap<String, Vec<String>>,
}

impl ProjectFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add allowed values for `field`. Repeated calls for the same field
    /// extend its allowed set.
    pub fn with<I, S>(mut self, field: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.clauses
            .entry(field.into())
            .or_default()
            .extend(allowed.into_iter().map(Into::into));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches(&self, id: &str, project: &Value) -> bool {
        self.clauses.iter().all(|(field, allowed)| {
            if field == "id" {
                return allowed.iter().any(|a| a == id);
            }
            match project.get(field.as_str()) {
                Some(Value::Sequence(items)) => items.iter().any(|item| scalar_in(item, allowed)),
                Some(value) => scalar_in(value, allowed),
                None => false,
            }
        })
    }
}

fn scalar_in(value: &Value, allowed: &[String]) -> bool {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        _ => return false,
    };
    allowed.iter().any(|a| *a == text)
}

impl<K, V, S> FromIterator<(K, V)> for ProjectFilter
where
    K: Into<String>,
    V: IntoIterator<Item = S>,
    S: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        iter.into_iter()
            .fold(ProjectFilter::new(), |f, (field, allowed)| f.with(field, allowed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn empty_filter_matches_everything() {
        let f = ProjectFilter::new();
        assert!(f.is_empty());
        assert!(f.matches("p1", &project("status: active")));
    }

    #[test]
    fn or_within_field() {
        let f = ProjectFilter::new().with("status", ["active", "in_progress"]);
        assert!(f.matches("p1", &project("status: active")));
        assert!(f.matches("p2", &project("status: in_progress")));
        assert!(!f.matches("p3", &project("status: completed")));
    }

    #[test]
    fn and_across_fields() {
        let f = ProjectFilter::new()
            .with("status", ["active", "in_progress"])
            .with("priority", ["critical"]);
        assert!(f.matches("p1", &project("status: active\npriority: critical")));
        assert!(!f.matches("p2", &project("status: active\npriority: high")));
        assert!(!f.matches("p3", &project("status: on_hold\npriority: critical")));
    }

    #[test]
    fn absent_field_never_matches() {
        let f = ProjectFilter::new().with("owner", ["ana@example.com"]);
        assert!(!f.matches("p1", &project("status: active")));
    }

    #[test]
    fn list_fields_match_any_element() {
        let f = ProjectFilter::new().with("tags", ["finance"]);
        assert!(f.matches("p1", &project("tags: [ops, finance]")));
        assert!(!f.matches("p2", &project("tags: [ops]")));
    }

    #[test]
    fn id_and_scalar_fields() {
        let f = ProjectFilter::new().with("id", ["p2"]).with("budget", ["5000"]);
        assert!(f.matches("p2", &project("budget: 5000")));
        assert!(!f.matches("p1", &project("budget: 5000")));
    }

    #[test]
    fn collect_from_pairs() {
        let f: ProjectFilter = [("status", vec!["active"]), ("status", vec!["planning"])]
            .into_iter()
            .collect();
        assert!(f.matches("p1", &project("status: planning")));
        assert!(f.matches("p2", &project("status: active")));
    }
}
