//! minimizer::params — named parameters and positional-vector marshaling.
//!
//! Purpose
//! -------
//! Let users write objectives in terms of parameter *names* while the
//! solvers only ever see a bare, ordered numeric vector. The mapping is
//! built once per minimizer and reused on every evaluation.
//!
//! Key behaviors
//! -------------
//! - [`Parameter`]: name, initial value and optional `(min, max)` bounds,
//!   validated on construction.
//! - [`ParamLayout`]: the fixed parameter order plus a name → position
//!   index; converts between name-keyed maps and ordered vectors and exposes
//!   the derived `bounds` list.
//! - [`NamedParams`]: borrowed view handed to user callables, indexable by
//!   name or position.
//! - [`BoundTransform`]: per-coordinate internal ↔ external maps used when
//!   the method honors bounds.
//!
//! Invariants & assumptions
//! ------------------------
//! - Names are non-empty and unique within a layout.
//! - Every vector produced or consumed here has length `layout.len()` and
//!   follows the layout order.
//!
//! Conventions
//! -----------
//! - Absent bounds are stored as `None` and reported as `-inf` / `+inf`.
use std::{collections::HashMap, ops::Index};

use crate::optimization::{
    errors::{OptError, OptResult},
    minimizer::types::Theta,
    numerical_stability::{BoundKind, external_derivative, to_external, to_internal},
};

/// A named model parameter with an initial value and optional bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    value: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl Parameter {
    /// Create an unbounded parameter.
    ///
    /// # Errors
    /// - [`OptError::EmptyParameterName`] for an empty name.
    /// - [`OptError::InvalidInitialValue`] for a non-finite value.
    pub fn new(name: impl Into<String>, value: f64) -> OptResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(OptError::EmptyParameterName);
        }
        if !value.is_finite() {
            return Err(OptError::InvalidInitialValue { name, value });
        }
        Ok(Self { name, value, min: None, max: None })
    }

    /// Create a parameter with bounds in one step.
    pub fn bounded(
        name: impl Into<String>, value: f64, min: Option<f64>, max: Option<f64>,
    ) -> OptResult<Self> {
        Self::new(name, value)?.with_bounds(min, max)
    }

    /// Attach bounds. `None` or an infinity means "no bound on this side".
    ///
    /// # Errors
    /// [`OptError::InvalidBounds`] when a bound is NaN, points the wrong way
    /// (`min = +inf`, `max = -inf`), `min > max`, or the initial value lies
    /// outside `[min, max]`.
    pub fn with_bounds(mut self, min: Option<f64>, max: Option<f64>) -> OptResult<Self> {
        let lo = min.unwrap_or(f64::NEG_INFINITY);
        let hi = max.unwrap_or(f64::INFINITY);
        let invalid = |reason| OptError::InvalidBounds { name: self.name.clone(), min: lo, max: hi, reason };
        if lo.is_nan() || hi.is_nan() {
            return Err(invalid("Bounds must not be NaN."));
        }
        if lo == f64::INFINITY || hi == f64::NEG_INFINITY {
            return Err(invalid("Lower bound cannot be +inf and upper bound cannot be -inf."));
        }
        if lo > hi {
            return Err(invalid("Lower bound exceeds upper bound."));
        }
        if self.value < lo || self.value > hi {
            return Err(invalid("Initial value lies outside the bounds."));
        }
        self.min = min.filter(|m| m.is_finite());
        self.max = max.filter(|m| m.is_finite());
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Initial value used as the starting point.
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn min(&self) -> Option<f64> {
        self.min
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }

    /// `(min, max)` with absent bounds as infinities.
    pub fn bounds(&self) -> (f64, f64) {
        (self.min.unwrap_or(f64::NEG_INFINITY), self.max.unwrap_or(f64::INFINITY))
    }

    pub fn is_bounded(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }
}

/// Fixed parameter order plus a name → position index.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamLayout {
    params: Vec<Parameter>,
    index: HashMap<String, usize>,
}

impl ParamLayout {
    /// Build the layout, indexing names once.
    ///
    /// # Errors
    /// - [`OptError::NoParameters`] for an empty list.
    /// - [`OptError::DuplicateParameter`] when a name repeats.
    pub fn new(params: Vec<Parameter>) -> OptResult<Self> {
        if params.is_empty() {
            return Err(OptError::NoParameters);
        }
        let mut index = HashMap::with_capacity(params.len());
        for (pos, param) in params.iter().enumerate() {
            if index.insert(param.name.clone(), pos).is_some() {
                return Err(OptError::DuplicateParameter { name: param.name.clone() });
            }
        }
        Ok(Self { params, index })
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }

    /// Position of `name` in the layout.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Initial values in layout order.
    pub fn initial_guesses(&self) -> Theta {
        self.params.iter().map(|p| p.value).collect()
    }

    /// One `(min, max)` pair per parameter, unbounded sides as infinities.
    pub fn bounds(&self) -> Vec<(f64, f64)> {
        self.params.iter().map(Parameter::bounds).collect()
    }

    /// `true` when any parameter carries a finite bound.
    pub fn has_bounds(&self) -> bool {
        self.params.iter().any(Parameter::is_bounded)
    }

    /// Borrow `values` as a name-addressable view.
    pub fn named<'v>(&'v self, values: &'v [f64]) -> NamedParams<'v> {
        NamedParams { layout: self, values }
    }

    /// Ordered vector → name-keyed map.
    pub fn to_map(&self, values: &Theta) -> HashMap<String, f64> {
        self.params.iter().zip(values.iter()).map(|(p, &v)| (p.name.clone(), v)).collect()
    }

    /// Name-keyed map → ordered vector.
    ///
    /// # Errors
    /// - [`OptError::MissingParameter`] if a layout name is absent.
    /// - [`OptError::UnknownParameter`] if the map holds an extra name.
    pub fn to_vector(&self, values: &HashMap<String, f64>) -> OptResult<Theta> {
        if let Some(extra) = values.keys().find(|k| !self.index.contains_key(k.as_str())) {
            return Err(OptError::UnknownParameter { name: extra.clone() });
        }
        self.params
            .iter()
            .map(|p| {
                values
                    .get(&p.name)
                    .copied()
                    .ok_or_else(|| OptError::MissingParameter { name: p.name.clone() })
            })
            .collect()
    }
}

/// Borrowed name-addressable view over one trial parameter vector.
///
/// `view["a"]` panics when `"a"` is not a parameter of the layout. Use
/// [`NamedParams::get`] or [`NamedParams::require`] when the name is not
/// known to be valid.
#[derive(Debug, Clone, Copy)]
pub struct NamedParams<'v> {
    layout: &'v ParamLayout,
    values: &'v [f64],
}

impl<'v> NamedParams<'v> {
    /// Value for `name`, if it is a parameter.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.layout.position(name).map(|pos| self.values[pos])
    }

    /// Value for `name`, or an error that user callables can `?`.
    pub fn require(&self, name: &str) -> anyhow::Result<f64> {
        self.get(name).ok_or_else(|| OptError::UnknownParameter { name: name.to_string() }.into())
    }

    /// Values in layout order.
    pub fn values(&self) -> &'v [f64] {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(name, value)` pairs in layout order.
    pub fn iter(&self) -> impl Iterator<Item = (&'v str, f64)> + 'v {
        let values = self.values;
        self.layout.params.iter().zip(values.iter()).map(|(p, &v)| (p.name.as_str(), v))
    }
}

impl Index<&str> for NamedParams<'_> {
    type Output = f64;

    /// # Panics
    /// Panics if `name` is not a parameter of the layout. [`NamedParams::get`]
    /// and [`NamedParams::require`] are the non-panicking lookups.
    fn index(&self, name: &str) -> &f64 {
        match self.layout.position(name) {
            Some(pos) => &self.values[pos],
            None => panic!("unknown parameter '{name}'"),
        }
    }
}

impl Index<usize> for NamedParams<'_> {
    type Output = f64;

    fn index(&self, pos: usize) -> &f64 {
        &self.values[pos]
    }
}

/// Per-coordinate internal ↔ external maps for one run.
///
/// Methods without the Bounded capability use [`BoundTransform::identity`].
#[derive(Debug, Clone, PartialEq)]
pub struct BoundTransform {
    kinds: Vec<BoundKind>,
}

impl BoundTransform {
    /// Honor the layout's bounds.
    pub fn from_layout(layout: &ParamLayout) -> Self {
        let kinds = layout.bounds().into_iter().map(|(lo, hi)| BoundKind::from_pair(lo, hi)).collect();
        Self { kinds }
    }

    /// Ignore bounds: internal and external space coincide.
    pub fn identity(dim: usize) -> Self {
        Self { kinds: vec![BoundKind::Free; dim] }
    }

    pub fn is_identity(&self) -> bool {
        self.kinds.iter().all(|k| *k == BoundKind::Free)
    }

    pub fn to_internal(&self, x: &Theta) -> Theta {
        x.iter().zip(&self.kinds).map(|(&xi, &k)| to_internal(xi, k)).collect()
    }

    pub fn to_external(&self, t: &Theta) -> Theta {
        t.iter().zip(&self.kinds).map(|(&ti, &k)| to_external(ti, k)).collect()
    }

    /// `dx/dt` per coordinate at internal point `t`.
    pub fn derivative(&self, t: &Theta) -> Theta {
        t.iter().zip(&self.kinds).map(|(&ti, &k)| external_derivative(ti, k)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn layout() -> ParamLayout {
        ParamLayout::new(vec![
            Parameter::new("a", 1.0).unwrap(),
            Parameter::bounded("b", 0.5, Some(0.0), Some(1.0)).unwrap(),
            Parameter::bounded("c", 2.0, Some(0.0), None).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // `to_map` and `to_vector` are inverse to each other and follow the
    // layout order.
    fn map_and_vector_are_inverse() {
        // Arrange
        let layout = layout();
        let values = array![3.0, 0.25, 7.0];

        // Act
        let map = layout.to_map(&values);
        let back = layout.to_vector(&map).expect("all names present");

        // Assert
        assert_eq!(map["b"], 0.25);
        assert_eq!(back, values);
    }

    #[test]
    fn to_vector_rejects_missing_and_unknown_names() {
        let layout = layout();
        let mut map: HashMap<String, f64> =
            [("a".to_string(), 1.0), ("b".to_string(), 0.5)].into_iter().collect();
        assert!(matches!(layout.to_vector(&map), Err(OptError::MissingParameter { name }) if name == "c"));

        map.insert("c".to_string(), 1.0);
        map.insert("d".to_string(), 1.0);
        assert!(matches!(layout.to_vector(&map), Err(OptError::UnknownParameter { name }) if name == "d"));
    }

    #[test]
    // Purpose
    // -------
    // Named access reads the position assigned at construction.
    fn named_view_resolves_by_name_and_position() {
        let layout = layout();
        let values = [3.0, 0.25, 7.0];
        let named = layout.named(&values);

        assert_eq!(named["a"], 3.0);
        assert_eq!(named["c"], 7.0);
        assert_eq!(named[1], 0.25);
        assert_eq!(named.get("zzz"), None);
        assert!(named.require("zzz").is_err());
        let pairs: Vec<_> = named.iter().collect();
        assert_eq!(pairs, vec![("a", 3.0), ("b", 0.25), ("c", 7.0)]);
    }

    #[test]
    #[should_panic(expected = "unknown parameter 'zzz'")]
    // Purpose
    // -------
    // Indexing by an unknown name panics with the offending name.
    fn named_index_panics_on_unknown_name() {
        let layout = layout();
        let values = [3.0, 0.25, 7.0];
        let named = layout.named(&values);

        let _ = named["zzz"];
    }

    #[test]
    // Purpose
    // -------
    // Exactly one `(min, max)` pair per parameter, unset sides infinite.
    fn bounds_list_has_one_pair_per_parameter() {
        let bounds = layout().bounds();

        assert_eq!(bounds.len(), 3);
        assert_eq!(bounds[0], (f64::NEG_INFINITY, f64::INFINITY));
        assert_eq!(bounds[1], (0.0, 1.0));
        assert_eq!(bounds[2], (0.0, f64::INFINITY));
    }

    #[test]
    fn layout_rejects_duplicates_and_empty_lists() {
        let dup = ParamLayout::new(vec![
            Parameter::new("a", 0.0).unwrap(),
            Parameter::new("a", 1.0).unwrap(),
        ]);
        assert!(matches!(dup, Err(OptError::DuplicateParameter { .. })));
        assert!(matches!(ParamLayout::new(vec![]), Err(OptError::NoParameters)));
    }

    #[test]
    fn parameter_validation_rejects_bad_input() {
        assert!(matches!(Parameter::new("", 0.0), Err(OptError::EmptyParameterName)));
        assert!(matches!(
            Parameter::new("a", f64::NAN),
            Err(OptError::InvalidInitialValue { .. })
        ));
        assert!(matches!(
            Parameter::bounded("a", 0.0, Some(1.0), Some(-1.0)),
            Err(OptError::InvalidBounds { .. })
        ));
        assert!(matches!(
            Parameter::bounded("a", 5.0, Some(0.0), Some(1.0)),
            Err(OptError::InvalidBounds { .. })
        ));
        assert!(matches!(
            Parameter::bounded("a", 0.0, Some(f64::NAN), None),
            Err(OptError::InvalidBounds { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // The bound transform keeps interior start values and the identity
    // transform is a no-op.
    fn bound_transform_round_trips_interior_values() {
        let layout = layout();
        let x0 = layout.initial_guesses();

        let transform = BoundTransform::from_layout(&layout);
        let back = transform.to_external(&transform.to_internal(&x0));
        for (a, b) in back.iter().zip(x0.iter()) {
            assert!((a - b).abs() < 1e-12);
        }

        let identity = BoundTransform::identity(3);
        assert!(identity.is_identity());
        assert_eq!(identity.to_internal(&x0), x0);
        assert_eq!(identity.derivative(&x0), array![1.0, 1.0, 1.0]);
    }
}
