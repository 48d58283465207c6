//! Signature expansion.
//!
//! A signature with optional groups or alternative tokens stands for several
//! concrete signatures. Expansion runs in two steps:
//!
//! 1. **Optional tails**: mandatory groups plus `k` optional groups yield
//!    `k + 1` prefix shapes, shortest first.
//! 2. **Alternatives**: each shape yields the cross-product of its
//!    alternative positions, leftmost position varying slowest and the
//!    first-listed alternative first.
//!
//! Both steps are deterministic, so the same signature always expands to
//! the same keys in the same order.

use crate::signature::{CanonicalKey, Signature, TypeToken};

/// The type tokens of one call length, possibly still holding alternatives.
pub type Shape = Vec<TypeToken>;

/// Expand a signature into its canonical keys.
pub fn expand(signature: &Signature) -> Vec<CanonicalKey> {
    optional_prefixes(signature)
        .iter()
        .flat_map(|shape| alternative_keys(shape))
        .collect()
}

/// Step 1: one shape per accepted prefix length.
pub fn optional_prefixes(signature: &Signature) -> Vec<Shape> {
    let mut shapes = Vec::new();
    let mut current: Shape = Vec::new();
    let mut emitted_mandatory = false;

    for group in &signature.groups {
        if group.optional {
            if !emitted_mandatory {
                shapes.push(current.clone());
                emitted_mandatory = true;
            }
            current.extend(group.params.iter().map(|p| p.ty.clone()));
            shapes.push(current.clone());
        } else {
            current.extend(group.params.iter().map(|p| p.ty.clone()));
        }
    }

    if !emitted_mandatory {
        shapes.push(current);
    }
    shapes
}

/// The whole signature as a single shape, ignoring optionality.
pub fn full_shape(signature: &Signature) -> Shape {
    signature.params().map(|p| p.ty.clone()).collect()
}

/// Step 2: every concrete token choice across a shape's positions.
pub fn alternative_keys(shape: &[TypeToken]) -> Vec<CanonicalKey> {
    let mut combos: Vec<Vec<String>> = vec![Vec::with_capacity(shape.len())];

    for position in shape {
        let choices = position.choices();
        let mut next = Vec::with_capacity(combos.len() * choices.len());
        for combo in &combos {
            for choice in choices {
                let mut extended = combo.clone();
                extended.push(choice.clone());
                next.push(extended);
            }
        }
        combos = next;
    }

    combos.into_iter().map(CanonicalKey::new).collect()
}

/// The concrete key of a shape without alternatives.
pub fn concrete_key(shape: &[TypeToken]) -> Option<CanonicalKey> {
    shape
        .iter()
        .map(|token| match token {
            TypeToken::Single(t) => Some(t.clone()),
            TypeToken::Alternatives(_) => None,
        })
        .collect::<Option<Vec<_>>>()
        .map(CanonicalKey::new)
}

/// Render a shape the way it would appear in a signature.
pub fn render_shape(shape: &[TypeToken]) -> String {
    let tokens: Vec<String> = shape.iter().map(ToString::to_string).collect();
    format!("[{}]", tokens.join(", "))
}
