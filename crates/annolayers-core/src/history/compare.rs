//! Snapshot equality.
//!
//! Layers are compared field by field, except payloads named in the
//! policy's reference list. Those compare by identity: two snapshots that
//! share the same payload allocation are equal without reading it, and an
//! identical payload in a different allocation counts as a change.

use crate::config::{DEFAULT_REFERENCE_FIELDS, HistoryConfig};
use crate::layer::Layer;
use std::collections::BTreeSet;

/// Which payload fields are compared by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EqualityPolicy {
    reference_fields: BTreeSet<String>,
}

impl Default for EqualityPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_REFERENCE_FIELDS.iter().copied())
    }
}

impl EqualityPolicy {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            reference_fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Compare every payload by content.
    pub fn structural() -> Self {
        Self {
            reference_fields: BTreeSet::new(),
        }
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self::new(config.reference_fields.iter().cloned())
    }

    pub fn is_reference_field(&self, field: &str) -> bool {
        self.reference_fields.contains(field)
    }

    pub fn layer_equal(&self, a: &Layer, b: &Layer) -> bool {
        if a.id != b.id
            || a.kind != b.kind
            || a.name != b.name
            || a.visible != b.visible
            || a.locked != b.locked
            || a.parent_group != b.parent_group
            || a.children != b.children
            || a.props != b.props
            || a.payloads.len() != b.payloads.len()
        {
            return false;
        }

        a.payloads.iter().all(|(field, pa)| match b.payloads.get(field) {
            Some(pb) if self.is_reference_field(field) => pa.ptr_eq(pb),
            Some(pb) => pa == pb,
            None => false,
        })
    }

    pub fn layers_equal(&self, a: &[Layer], b: &[Layer]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.layer_equal(x, y))
    }
}

/// [`EqualityPolicy::layers_equal`] with the default policy.
pub fn layers_equal(a: &[Layer], b: &[Layer]) -> bool {
    EqualityPolicy::default().layers_equal(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{LayerKind, Payload};

    fn image(src: Payload) -> Layer {
        Layer::with_id("img", LayerKind::Image)
            .with_prop("x", 1)
            .with_payload("src", src)
    }

    #[test]
    fn test_plain_fields_compare_by_value() {
        let a = vec![Layer::with_id("a", LayerKind::Text).with_prop("text", "hi")];
        let mut b = a.clone();
        assert!(layers_equal(&a, &b));

        b[0].set_prop("text", "bye");
        assert!(!layers_equal(&a, &b));
        assert!(!layers_equal(&a, &[]));
    }

    #[test]
    fn test_shared_payload_is_equal() {
        let src = Payload::new("data:image/png;base64,AAAA");
        let a = vec![image(src.clone())];
        let b = vec![image(src)];
        assert!(layers_equal(&a, &b));
    }

    #[test]
    fn test_identical_payload_in_new_allocation_is_a_change() {
        let a = vec![image(Payload::new("data:image/png;base64,AAAA"))];
        let b = vec![image(Payload::new("data:image/png;base64,AAAA"))];
        assert!(!layers_equal(&a, &b));
        assert!(EqualityPolicy::structural().layers_equal(&a, &b));
    }

    #[test]
    fn test_unlisted_payload_compares_by_content() {
        let layer = |data: &str| {
            Layer::with_id("n", LayerKind::Textbox).with_payload("html", Payload::new(data))
        };
        let policy = EqualityPolicy::default();
        assert!(policy.layer_equal(&layer("<p>a</p>"), &layer("<p>a</p>")));
        assert!(!policy.layer_equal(&layer("<p>a</p>"), &layer("<p>b</p>")));
    }

    #[test]
    fn test_policy_from_config() {
        let config = HistoryConfig {
            reference_fields: vec!["blob".into()],
            ..HistoryConfig::default()
        };
        let policy = EqualityPolicy::from_config(&config);
        assert!(policy.is_reference_field("blob"));
        assert!(!policy.is_reference_field("src"));
    }
}
