//! Typed parameter maps used to configure registered boundaries.
//!
//! A [`Properties`] map is what a scenario file hands to a boundary factory of the
//! [`Registry`](crate::registry::Registry). Lengths are given in meters.
use crate::{
    error::{OptResult, OptraceError},
    meter,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uom::si::f64::Length;

/// Value of a single property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Proptype {
    /// a flag
    Bool(bool),
    /// an integer (counts, sizes)
    I64(i64),
    /// a real number
    F64(f64),
    /// a text (e.g. a mode name)
    String(String),
    /// a list of real numbers (coefficients, map data)
    F64List(Vec<f64>),
}
impl From<bool> for Proptype {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}
impl From<i32> for Proptype {
    fn from(value: i32) -> Self {
        Self::I64(i64::from(value))
    }
}
impl From<i64> for Proptype {
    fn from(value: i64) -> Self {
        Self::I64(value)
    }
}
impl From<f64> for Proptype {
    fn from(value: f64) -> Self {
        Self::F64(value)
    }
}
impl From<&str> for Proptype {
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}
impl From<Vec<f64>> for Proptype {
    fn from(value: Vec<f64>) -> Self {
        Self::F64List(value)
    }
}

/// Named set of [`Proptype`] values.
#[derive(Default, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct Properties {
    props: BTreeMap<String, Proptype>,
}
impl Properties {
    /// Create a new property.
    ///
    /// # Errors
    ///
    /// This function will return an error if a property with this name already exists.
    pub fn create(&mut self, name: &str, value: Proptype) -> OptResult<()> {
        if self.props.contains_key(name) {
            return Err(OptraceError::Configuration(format!(
                "property {name} already created"
            )));
        }
        self.props.insert(name.into(), value);
        Ok(())
    }
    /// Builder variant of [`Properties::create`] overwriting existing values.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<Proptype>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }
    /// Set the value of an existing property.
    ///
    /// # Errors
    ///
    /// This function will return an error if the property does not exist.
    pub fn set(&mut self, name: &str, value: Proptype) -> OptResult<()> {
        let property = self
            .props
            .get_mut(name)
            .ok_or_else(|| OptraceError::Configuration(format!("property {name} does not exist")))?;
        *property = value;
        Ok(())
    }
    /// Returns the number of properties.
    #[must_use]
    pub fn nr_of_props(&self) -> usize {
        self.props.len()
    }
    /// Returns `true` if no property is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }
    /// Returns `true` if a property with the given name exists.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.props.contains_key(key)
    }
    /// Iterator over all properties in name order.
    pub fn iter(&self) -> std::collections::btree_map::Iter<'_, String, Proptype> {
        self.props.iter()
    }
    /// Returns the value of a property.
    ///
    /// # Errors
    ///
    /// This function will return an error if the property does not exist.
    pub fn get(&self, name: &str) -> OptResult<&Proptype> {
        self.props
            .get(name)
            .ok_or_else(|| OptraceError::Configuration(format!("property {name} does not exist")))
    }
    /// Returns the value of a bool property.
    ///
    /// # Errors
    ///
    /// This function will return an error if the property does not exist or is not a bool.
    pub fn get_bool(&self, name: &str) -> OptResult<bool> {
        match self.get(name)? {
            Proptype::Bool(value) => Ok(*value),
            _ => Err(wrong_type(name, "bool")),
        }
    }
    /// Returns the value of a numeric property. Integers are converted.
    ///
    /// # Errors
    ///
    /// This function will return an error if the property does not exist or is not a number.
    #[allow(clippy::cast_precision_loss)]
    pub fn get_f64(&self, name: &str) -> OptResult<f64> {
        match self.get(name)? {
            Proptype::F64(value) => Ok(*value),
            Proptype::I64(value) => Ok(*value as f64),
            _ => Err(wrong_type(name, "number")),
        }
    }
    /// Returns the value of a numeric property or `default` if it does not exist.
    ///
    /// # Errors
    ///
    /// This function will return an error if the property exists but is not a number.
    pub fn get_f64_or(&self, name: &str, default: f64) -> OptResult<f64> {
        if self.contains(name) {
            self.get_f64(name)
        } else {
            Ok(default)
        }
    }
    /// Returns a numeric property interpreted as length in meters.
    ///
    /// # Errors
    ///
    /// This function will return an error if the property does not exist or is not a number.
    pub fn get_length(&self, name: &str) -> OptResult<Length> {
        Ok(meter!(self.get_f64(name)?))
    }
    /// Returns the value of a non-negative integer property.
    ///
    /// # Errors
    ///
    /// This function will return an error if the property does not exist or is not a non-negative integer.
    pub fn get_usize(&self, name: &str) -> OptResult<usize> {
        match self.get(name)? {
            Proptype::I64(value) => usize::try_from(*value).map_err(|_| {
                OptraceError::Configuration(format!("property {name} must be >= 0"))
            }),
            _ => Err(wrong_type(name, "integer")),
        }
    }
    /// Returns the value of a text property.
    ///
    /// # Errors
    ///
    /// This function will return an error if the property does not exist or is not a text.
    pub fn get_string(&self, name: &str) -> OptResult<&str> {
        match self.get(name)? {
            Proptype::String(value) => Ok(value),
            _ => Err(wrong_type(name, "string")),
        }
    }
    /// Returns the value of a list property.
    ///
    /// # Errors
    ///
    /// This function will return an error if the property does not exist or is not a list of numbers.
    pub fn get_f64_list(&self, name: &str) -> OptResult<&[f64]> {
        match self.get(name)? {
            Proptype::F64List(values) => Ok(values),
            _ => Err(wrong_type(name, "list of numbers")),
        }
    }
}
impl<'a> IntoIterator for &'a Properties {
    type IntoIter = std::collections::btree_map::Iter<'a, String, Proptype>;
    type Item = (&'a String, &'a Proptype);
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn wrong_type(name: &str, expected: &str) -> OptraceError {
    OptraceError::Configuration(format!("property {name} is not a {expected}"))
}
