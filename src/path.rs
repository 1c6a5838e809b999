//! Path compilation and comparison.
//!
//! A route path is a `/`-separated list of segments. Each segment is one of:
//! ```ignore
//!  Syntax            Type
//!  users             static segment, matched case-insensitively
//!  {name}            required parameter
//!  [name]            optional parameter
//!  [name=default]    optional parameter with a default value
//! ```
//! Empty segments produced by leading, trailing or doubled separators are
//! dropped, so `/users//{id}/` and `users/{id}` compile to the same thing.

use crate::error::Error;

use std::fmt;

/// One compiled path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Static(String),
    Param {
        raw: String,
        name: String,
    },
    Optional {
        raw: String,
        name: String,
        default: Option<String>,
    },
}

impl Segment {
    /// The segment exactly as it was written in the route path.
    pub fn raw(&self) -> &str {
        match self {
            Segment::Static(raw) | Segment::Param { raw, .. } | Segment::Optional { raw, .. } => {
                raw
            }
        }
    }

    /// The lowercased key under which the segment is stored in the tree.
    pub(crate) fn key(&self) -> String {
        self.raw().to_lowercase()
    }

    /// The parameter name, for placeholder segments.
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Segment::Static(_) => None,
            Segment::Param { name, .. } | Segment::Optional { name, .. } => Some(name),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        !matches!(self, Segment::Static(_))
    }

    /// Parse a single non-empty segment.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        if let Some(inner) = raw.strip_prefix('{') {
            let name = inner.strip_suffix('}').ok_or_else(|| {
                Error::configuration(format!("unterminated parameter in segment '{}'", raw))
            })?;
            check_name(raw, name)?;
            return Ok(Segment::Param {
                raw: raw.to_owned(),
                name: name.to_owned(),
            });
        }

        if let Some(inner) = raw.strip_prefix('[') {
            let inner = inner.strip_suffix(']').ok_or_else(|| {
                Error::configuration(format!(
                    "unterminated optional parameter in segment '{}'",
                    raw
                ))
            })?;
            let (name, default) = match inner.split_once('=') {
                Some((name, default)) => (name, Some(default)),
                None => (inner, None),
            };
            check_name(raw, name)?;
            if default.map_or(false, |d| d.contains(&['[', ']'][..])) {
                return Err(Error::configuration(format!(
                    "invalid default value in segment '{}'",
                    raw
                )));
            }
            return Ok(Segment::Optional {
                raw: raw.to_owned(),
                name: name.to_owned(),
                default: default.map(str::to_owned),
            });
        }

        if raw.contains(&['{', '}', '[', ']'][..]) {
            return Err(Error::configuration(format!(
                "placeholders must span a whole segment, found '{}'",
                raw
            )));
        }

        Ok(Segment::Static(raw.to_owned()))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw())
    }
}

fn check_name(raw: &str, name: &str) -> Result<(), Error> {
    if name.is_empty() {
        return Err(Error::configuration(format!(
            "missing parameter name in segment '{}'",
            raw
        )));
    }
    if name.contains(&['{', '}', '[', ']', '='][..]) {
        return Err(Error::configuration(format!(
            "invalid parameter name in segment '{}'",
            raw
        )));
    }
    Ok(())
}

/// Split a path into its non-empty segments.
/// ```rust
/// assert_eq!(segrouter::path::split("//a/b/"), vec!["a", "b"]);
/// assert!(segrouter::path::split("/").is_empty());
/// ```
pub fn split(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Compile a route path into segment descriptors.
pub fn compile(path: &str) -> Result<Vec<Segment>, Error> {
    split(path).into_iter().map(Segment::parse).collect()
}

/// Returns true when a raw segment is a `{name}`, `[name]` or
/// `[name=default]` placeholder.
pub fn is_placeholder(raw: &str) -> bool {
    (raw.starts_with('{') && raw.ends_with('}')) || (raw.starts_with('[') && raw.ends_with(']'))
}

/// Compare the shape of two raw route paths.
///
/// Parameter names are ignored, but both paths need the same number of
/// segments and the same static-or-placeholder kind at every position.
/// Static segments compare case-insensitively.
/// ```rust
/// use segrouter::path::compare_route_paths;
///
/// assert!(compare_route_paths(&["test", "{id}"], &["test", "{objId}"]));
/// assert!(!compare_route_paths(&["test", "{id}"], &["test", "id"]));
/// assert!(!compare_route_paths::<&str>(&[], &["test"]));
/// ```
pub fn compare_route_paths<S: AsRef<str>>(a: &[S], b: &[S]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(a, b)| {
            let (a, b) = (a.as_ref(), b.as_ref());
            match (is_placeholder(a), is_placeholder(b)) {
                (true, true) => true,
                (false, false) => a.to_lowercase() == b.to_lowercase(),
                _ => false,
            }
        })
}

/// Same as [`compare_route_paths`], over compiled segments.
pub(crate) fn same_shape(a: &[Segment], b: &[Segment]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(a, b)| match (a, b) {
            (Segment::Static(a), Segment::Static(b)) => a.to_lowercase() == b.to_lowercase(),
            (a, b) => a.is_placeholder() && b.is_placeholder(),
        })
}

/// Case-insensitive literal comparison of two segment lists.
pub fn compare_paths<S: AsRef<str>, T: AsRef<str>>(a: &[S], b: &[T]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(a, b)| a.as_ref().to_lowercase() == b.as_ref().to_lowercase())
}

/// Join a group prefix and a relative path with exactly one separator.
pub(crate) fn join(prefix: &str, path: &str) -> String {
    let mut joined = prefix.trim_end_matches('/').to_owned();
    joined.push('/');
    joined.push_str(path.strip_prefix('/').unwrap_or(path));
    joined
}
