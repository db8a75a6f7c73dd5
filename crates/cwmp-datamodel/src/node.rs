//! Traversal machinery for the mirror.
//!
//! Every mirror record implements [`Tr181Field`] (via `derive(Tr181Node)`);
//! primitive leaves implement it directly here. The walk is depth-first in
//! field declaration order, which makes the indexer deterministic. Paths are
//! dotted TR-181 names; collection segments use the singular noun from
//! [`singular`] and carry the element's sparse 1-based index.

use cwmp_soap::XsdType;

use crate::typing;

/// Errors for path-addressed mirror operations. `fault_code` maps each to
/// the TR-069 fault the dispatcher answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("unknown parameter path")]
    UnknownPath,
    #[error("attempt to set a non-writable parameter")]
    ReadOnlyPath,
    #[error("value cannot be coerced to the parameter type")]
    TypeMismatch,
    #[error("path does not name a collection")]
    NotACollection,
    #[error("path does not name a collection element")]
    NotAnElement,
}

impl PathError {
    pub fn fault_code(self) -> u32 {
        match self {
            Self::UnknownPath | Self::NotACollection | Self::NotAnElement => {
                cwmp_soap::fault::INVALID_PARAMETER_NAME
            }
            Self::ReadOnlyPath => cwmp_soap::fault::NON_WRITABLE_PARAMETER,
            Self::TypeMismatch => cwmp_soap::fault::INVALID_PARAMETER_TYPE,
        }
    }
}

/// One `(path, value, type)` triple produced by the indexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub path: String,
    pub value: String,
    pub xsd: XsdType,
}

/// Indexer options. With `include_defaults` unset, default-valued leaves
/// (empty strings, zero numerics, false booleans) are suppressed; count
/// leaves are always emitted.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexOptions {
    pub include_defaults: bool,
}

/// Walk state threaded through a traversal: options, the emission sink and
/// the record-type stack used as the recursion guard.
pub struct Walk<'a> {
    options: IndexOptions,
    stack: Vec<&'static str>,
    sink: &'a mut dyn FnMut(Parameter),
}

impl<'a> Walk<'a> {
    pub fn new(options: IndexOptions, sink: &'a mut dyn FnMut(Parameter)) -> Self {
        Self {
            options,
            stack: Vec::with_capacity(16),
            sink,
        }
    }

    pub fn include_defaults(&self) -> bool {
        self.options.include_defaults
    }

    /// Refuses re-entry into a record type already on the walk stack.
    pub fn enter(&mut self, type_name: &'static str) -> bool {
        if self.stack.contains(&type_name) {
            tracing::warn!(type_name, "cyclic record reference, refusing to re-enter");
            return false;
        }
        self.stack.push(type_name);
        true
    }

    pub fn leave(&mut self) {
        self.stack.pop();
    }

    pub fn emit(&mut self, path: &str, value: String) {
        (self.sink)(Parameter {
            xsd: typing::xsd_type_for(path),
            path: path.to_owned(),
            value,
        });
    }
}

/// A record or leaf of the mirror tree.
pub trait Tr181Field {
    fn visit(&self, path: &str, walk: &mut Walk<'_>);
    fn apply(&mut self, segments: &[&str], value: &str) -> Result<(), PathError>;
    fn add_instance(&mut self, segments: &[&str]) -> Result<u32, PathError>;
    fn delete_instance(&mut self, segments: &[&str]) -> Result<(), PathError>;
}

/// A collection element with its externally assigned sparse index.
pub trait Tr181Instance: Default {
    fn index(&self) -> u32;
    fn set_index(&mut self, index: u32);
}

pub fn join(path: &str, field: &str) -> String {
    let mut joined = String::with_capacity(path.len() + field.len() + 1);
    joined.push_str(path);
    joined.push('.');
    joined.push_str(field);
    joined
}

/// The plural→singular table for indexed path segments. Lives here and
/// nowhere else.
pub fn singular(plural: &str) -> &str {
    match plural {
        "Hosts" => "Host",
        "Interfaces" => "Interface",
        "AccessPoints" => "AccessPoint",
        "Radios" => "Radio",
        "SSIDs" => "SSID",
        "AssociatedDevices" => "AssociatedDevice",
        "IPv4Addresses" => "IPv4Address",
        "Routers" => "Router",
        "IPv4Forwardings" => "IPv4Forwarding",
        "StaticAddresses" => "StaticAddress",
        other => other.strip_suffix('s').unwrap_or(other),
    }
}

// --- collection plumbing used by the derived impls --------------------------

pub fn visit_collection<T>(items: &[T], parent: &str, plural: &str, walk: &mut Walk<'_>)
where
    T: Tr181Field + Tr181Instance,
{
    let noun = singular(plural);
    // The count leaf reflects cardinality at the moment of emission and is
    // never suppressed.
    walk.emit(
        &format!("{parent}.{noun}NumberOfEntries"),
        items.len().to_string(),
    );
    for item in items {
        item.visit(&format!("{parent}.{noun}.{}", item.index()), walk);
    }
}

fn find_by_index<'a, T: Tr181Instance>(
    items: &'a mut [T],
    segment: &str,
) -> Result<&'a mut T, PathError> {
    let index: u32 = segment.parse().map_err(|_| PathError::UnknownPath)?;
    items
        .iter_mut()
        .find(|item| item.index() == index)
        .ok_or(PathError::UnknownPath)
}

pub fn apply_collection<T>(
    items: &mut [T],
    segments: &[&str],
    value: &str,
) -> Result<(), PathError>
where
    T: Tr181Field + Tr181Instance,
{
    let Some((head, rest)) = segments.split_first() else {
        return Err(PathError::UnknownPath);
    };
    find_by_index(items, head)?.apply(rest, value)
}

pub fn add_to_collection<T>(items: &mut Vec<T>, segments: &[&str]) -> Result<u32, PathError>
where
    T: Tr181Field + Tr181Instance,
{
    let Some((head, rest)) = segments.split_first() else {
        // AddObject names the collection itself: allocate the next index.
        let next = items.iter().map(Tr181Instance::index).max().unwrap_or(0) + 1;
        let mut item = T::default();
        item.set_index(next);
        items.push(item);
        return Ok(next);
    };
    find_by_index(items, head)?.add_instance(rest)
}

pub fn delete_from_collection<T>(items: &mut Vec<T>, segments: &[&str]) -> Result<(), PathError>
where
    T: Tr181Field + Tr181Instance,
{
    let Some((head, rest)) = segments.split_first() else {
        return Err(PathError::NotAnElement);
    };
    let index: u32 = head.parse().map_err(|_| PathError::NotAnElement)?;
    if rest.is_empty() {
        let position = items
            .iter()
            .position(|item| item.index() == index)
            .ok_or(PathError::UnknownPath)?;
        items.remove(position);
        return Ok(());
    }
    items
        .iter_mut()
        .find(|item| item.index() == index)
        .ok_or(PathError::UnknownPath)?
        .delete_instance(rest)
}

// --- leaf implementations ---------------------------------------------------

impl Tr181Field for String {
    fn visit(&self, path: &str, walk: &mut Walk<'_>) {
        if walk.include_defaults() || !self.is_empty() {
            walk.emit(path, self.clone());
        }
    }

    fn apply(&mut self, segments: &[&str], value: &str) -> Result<(), PathError> {
        if !segments.is_empty() {
            return Err(PathError::UnknownPath);
        }
        *self = value.trim().to_owned();
        Ok(())
    }

    fn add_instance(&mut self, _segments: &[&str]) -> Result<u32, PathError> {
        Err(PathError::NotACollection)
    }

    fn delete_instance(&mut self, _segments: &[&str]) -> Result<(), PathError> {
        Err(PathError::NotAnElement)
    }
}

impl Tr181Field for bool {
    fn visit(&self, path: &str, walk: &mut Walk<'_>) {
        if walk.include_defaults() || *self {
            walk.emit(path, if *self { "true" } else { "false" }.to_owned());
        }
    }

    fn apply(&mut self, segments: &[&str], value: &str) -> Result<(), PathError> {
        if !segments.is_empty() {
            return Err(PathError::UnknownPath);
        }
        *self = cwmp_soap::value::normalize_boolean(value).ok_or(PathError::TypeMismatch)?;
        Ok(())
    }

    fn add_instance(&mut self, _segments: &[&str]) -> Result<u32, PathError> {
        Err(PathError::NotACollection)
    }

    fn delete_instance(&mut self, _segments: &[&str]) -> Result<(), PathError> {
        Err(PathError::NotAnElement)
    }
}

macro_rules! integer_leaf {
    ($($ty:ty),*) => {$(
        impl Tr181Field for $ty {
            fn visit(&self, path: &str, walk: &mut Walk<'_>) {
                if walk.include_defaults() || *self != 0 {
                    walk.emit(path, self.to_string());
                }
            }

            fn apply(&mut self, segments: &[&str], value: &str) -> Result<(), PathError> {
                if !segments.is_empty() {
                    return Err(PathError::UnknownPath);
                }
                let trimmed = value.trim();
                if let Ok(parsed) = trimmed.parse::<$ty>() {
                    *self = parsed;
                    return Ok(());
                }
                // Accept integral floats ("5.0" coerces to 5).
                let float: f64 = trimmed.parse().map_err(|_| PathError::TypeMismatch)?;
                if float.fract() != 0.0 {
                    return Err(PathError::TypeMismatch);
                }
                <$ty>::try_from(float as i64).map_or(Err(PathError::TypeMismatch), |parsed| {
                    *self = parsed;
                    Ok(())
                })
            }

            fn add_instance(&mut self, _segments: &[&str]) -> Result<u32, PathError> {
                Err(PathError::NotACollection)
            }

            fn delete_instance(&mut self, _segments: &[&str]) -> Result<(), PathError> {
                Err(PathError::NotAnElement)
            }
        }
    )*};
}

integer_leaf!(i32, u32, i64, u64);

impl Tr181Field for f64 {
    fn visit(&self, path: &str, walk: &mut Walk<'_>) {
        if walk.include_defaults() || *self != 0.0 {
            walk.emit(path, self.to_string());
        }
    }

    fn apply(&mut self, segments: &[&str], value: &str) -> Result<(), PathError> {
        if !segments.is_empty() {
            return Err(PathError::UnknownPath);
        }
        *self = value.trim().parse().map_err(|_| PathError::TypeMismatch)?;
        Ok(())
    }

    fn add_instance(&mut self, _segments: &[&str]) -> Result<u32, PathError> {
        Err(PathError::NotACollection)
    }

    fn delete_instance(&mut self, _segments: &[&str]) -> Result<(), PathError> {
        Err(PathError::NotAnElement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singular_table_matches_tr069_nouns() {
        assert_eq!(singular("Hosts"), "Host");
        assert_eq!(singular("SSIDs"), "SSID");
        assert_eq!(singular("IPv4Addresses"), "IPv4Address");
        assert_eq!(singular("IPv4Forwardings"), "IPv4Forwarding");
        // default: strip a trailing `s`
        assert_eq!(singular("Pools"), "Pool");
        assert_eq!(singular("Chains"), "Chain");
        // no trailing `s`: unchanged
        assert_eq!(singular("X_ISPAPP_CarrierInfo"), "X_ISPAPP_CarrierInfo");
    }

    #[test]
    fn integer_leaf_coerces_integral_floats() {
        let mut v: u32 = 0;
        v.apply(&[], "5.0").unwrap();
        assert_eq!(v, 5);
        assert_eq!(v.apply(&[], "5.5"), Err(PathError::TypeMismatch));
        assert_eq!(v.apply(&[], "x"), Err(PathError::TypeMismatch));
    }

    #[test]
    fn bool_leaf_uses_the_normaliser() {
        let mut v = false;
        v.apply(&[], "enabled").unwrap();
        assert!(v);
        assert_eq!(v.apply(&[], "maybe"), Err(PathError::TypeMismatch));
    }
}
