//! Named-field access to configuration records.
//!
//! Every configuration struct declares the exact set of fields an override may
//! touch. Lookups by name return a definite found/not-found answer, and values
//! move in and out of fields as `serde_yaml::Value`, converted by strict
//! deserialization into the field's own type.

use std::fmt;

use serde_yaml::Value;

use crate::error::HarnessError;

/// A configuration record whose fields can be read and written by name.
///
/// Implemented through [`impl_config_record!`] rather than by hand, so the
/// field table always matches the struct definition.
pub trait ConfigRecord: Clone + fmt::Debug {
    /// Type name used in error messages (e.g., `ClusterConfig`).
    const TYPE_NAME: &'static str;

    /// Every field name an override may target, including flattened ones.
    fn field_names() -> Vec<&'static str>;

    /// Returns the current value of `name`, or `None` if no such field exists.
    fn get_field(&self, name: &str) -> Option<Value>;

    /// Stores `value` in field `name`.
    ///
    /// Returns `Ok(false)` when the record has no such field. `config_type`
    /// is the name reported in conversion errors, which for flattened records
    /// is the outermost type.
    fn assign(
        &mut self,
        name: &str,
        value: Value,
        config_type: &'static str,
    ) -> Result<bool, HarnessError>;

    fn has_field(name: &str) -> bool {
        Self::field_names().contains(&name)
    }

    /// Overwrites field `name` with `value`.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::UnknownConfigKey` if the field does not exist and
    /// `HarnessError::InvalidConfigValue` if `value` does not deserialize into
    /// the field's type.
    fn set_field(&mut self, name: &str, value: Value) -> Result<(), HarnessError> {
        if self.assign(name, value, Self::TYPE_NAME)? {
            Ok(())
        } else {
            Err(HarnessError::UnknownConfigKey {
                key: name.to_string(),
                config_type: Self::TYPE_NAME,
            })
        }
    }
}

/// Converts an override value into a field type, without coercion.
pub(crate) fn convert_field<T: serde::de::DeserializeOwned>(
    name: &str,
    value: Value,
    config_type: &'static str,
) -> Result<T, HarnessError> {
    serde_yaml::from_value(value).map_err(|e| HarnessError::InvalidConfigValue {
        key: name.to_string(),
        config_type,
        message: e.to_string(),
    })
}

/// Implements [`ConfigRecord`] for a struct from its list of field names.
///
/// An optional trailing `flatten <field>: <Type>` delegates any name not in
/// the list to a nested record, mirroring `#[serde(flatten)]` on that field.
macro_rules! impl_config_record {
    (
        $type:ident { $($field:ident),+ $(,)? }
        $(flatten $inner:ident: $inner_ty:ty)?
    ) => {
        impl $crate::config::ConfigRecord for $type {
            const TYPE_NAME: &'static str = stringify!($type);

            fn field_names() -> Vec<&'static str> {
                #[allow(unused_mut)]
                let mut names = vec![$(stringify!($field)),+];
                $(names.extend(<$inner_ty as $crate::config::ConfigRecord>::field_names());)?
                names
            }

            fn get_field(&self, name: &str) -> Option<::serde_yaml::Value> {
                match name {
                    $(stringify!($field) => ::serde_yaml::to_value(&self.$field).ok(),)+
                    _ => {
                        #[allow(unused_variables)]
                        let nested: Option<::serde_yaml::Value> = None;
                        $(let nested =
                            $crate::config::ConfigRecord::get_field(&self.$inner, name);)?
                        nested
                    }
                }
            }

            fn assign(
                &mut self,
                name: &str,
                value: ::serde_yaml::Value,
                config_type: &'static str,
            ) -> Result<bool, $crate::error::HarnessError> {
                match name {
                    $(stringify!($field) => {
                        self.$field =
                            $crate::config::record::convert_field(name, value, config_type)?;
                        Ok(true)
                    })+
                    _ => {
                        #[allow(unused_variables)]
                        let assigned: Result<bool, $crate::error::HarnessError> = Ok(false);
                        $(let assigned = $crate::config::ConfigRecord::assign(
                            &mut self.$inner,
                            name,
                            value,
                            config_type,
                        );)?
                        assigned
                    }
                }
            }
        }
    };
}

pub(crate) use impl_config_record;

/// One override. `raw` keeps the command-line text the value was parsed
/// from, if any.
#[derive(Debug, Clone, PartialEq)]
struct Entry {
    key: String,
    value: Value,
    raw: Option<String>,
}

impl Entry {
    fn new(key: String, value: Value) -> Self {
        Self {
            key,
            value,
            raw: None,
        }
    }
}

/// An ordered set of named configuration overrides.
///
/// Keys are applied in insertion order; a key given twice ends with its last
/// value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    entries: Vec<Entry>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an override for `key`.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.push(Entry::new(key.into(), value.into()));
        self
    }

    /// Parses `KEY=VALUE` assignments, reading each value as YAML.
    ///
    /// `download_image=false` yields a boolean, `nodes_count=3` an integer and
    /// `cluster_name=demo` a string. The text is also kept verbatim: a field
    /// that takes a string receives it as written, so `openshift_version=4.15`
    /// stays `"4.15"` rather than failing as a float.
    pub fn parse_assignments<S: AsRef<str>>(assignments: &[S]) -> Result<Self, HarnessError> {
        let mut overrides = Self::new();
        for assignment in assignments {
            let assignment = assignment.as_ref();
            let (key, raw) = assignment.split_once('=').ok_or_else(|| {
                HarnessError::Config(format!(
                    "override '{}' must have the form KEY=VALUE",
                    assignment
                ))
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(HarnessError::Config(format!(
                    "override '{}' has an empty key",
                    assignment
                )));
            }
            let value: Value = serde_yaml::from_str(raw).map_err(|e| {
                HarnessError::Config(format!("failed to parse value for '{}': {}", key, e))
            })?;
            overrides.entries.push(Entry {
                key: key.to_string(),
                value,
                raw: Some(raw.to_string()),
            });
        }
        Ok(overrides)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .map(|entry| (entry.key.as_str(), &entry.value))
    }

    /// Applies every override to `config`.
    ///
    /// The overrides are staged on a copy, and `config` is replaced only when
    /// every key exists and every value converts. On error `config` is left
    /// exactly as it was.
    pub fn apply_to<C: ConfigRecord>(&self, config: &mut C) -> Result<(), HarnessError> {
        if let Some(entry) = self.entries.iter().find(|entry| !C::has_field(&entry.key)) {
            return Err(HarnessError::UnknownConfigKey {
                key: entry.key.clone(),
                config_type: C::TYPE_NAME,
            });
        }

        let mut staged = config.clone();
        for entry in &self.entries {
            let Err(err) = staged.set_field(&entry.key, entry.value.clone()) else {
                continue;
            };
            // A string field given text that parsed as another YAML type.
            let accepted_verbatim = match (&err, &entry.raw) {
                (HarnessError::InvalidConfigValue { .. }, Some(raw))
                    if !entry.value.is_string() =>
                {
                    staged
                        .set_field(&entry.key, Value::String(raw.clone()))
                        .is_ok()
                }
                _ => false,
            };
            if !accepted_verbatim {
                return Err(err);
            }
        }
        *config = staged;
        Ok(())
    }
}

impl fmt::Display for ConfigOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (index, (key, value)) in self.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            let rendered = serde_yaml::to_string(value).map_err(|_| fmt::Error)?;
            write!(f, "{}: {}", key, rendered.trim_end())?;
        }
        f.write_str("}")
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ConfigOverrides {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| Entry::new(k.into(), v.into()))
                .collect(),
        }
    }
}
