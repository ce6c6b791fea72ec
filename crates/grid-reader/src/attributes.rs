//! Variable attributes.
//!
//! Containers report attributes with their own native types. Readers
//! convert them into [`AttrValue`] so downstream decoding sees one shape no
//! matter which container the grid came from.

use std::collections::BTreeMap;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Number(f64),
    Numbers(Vec<f64>),
    Text(String),
}

impl AttrValue {
    /// Unwrap to a plain number.
    ///
    /// Sequences yield their first element. Empty sequences and text yield
    /// `None`.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            AttrValue::Number(v) => Some(*v),
            AttrValue::Numbers(vs) => vs.first().copied(),
            AttrValue::Text(_) => None,
        }
    }

    /// Interpret as a `[low, high]` pair. Only two-element sequences qualify.
    pub fn as_pair(&self) -> Option<(f64, f64)> {
        match self {
            AttrValue::Numbers(vs) if vs.len() == 2 => Some((vs[0], vs[1])),
            _ => None,
        }
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Number(v)
    }
}

impl From<Vec<f64>> for AttrValue {
    fn from(vs: Vec<f64>) -> Self {
        AttrValue::Numbers(vs)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

/// Attribute name to value mapping for one variable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(BTreeMap<String, AttrValue>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Scalar value of `name`, see [`AttrValue::as_scalar`].
    pub fn scalar(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(AttrValue::as_scalar)
    }

    /// Two-element value of `name`, see [`AttrValue::as_pair`].
    pub fn pair(&self, name: &str) -> Option<(f64, f64)> {
        self.get(name).and_then(AttrValue::as_pair)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (k, v) in iter {
            attrs.insert(k, v);
        }
        attrs
    }
}
