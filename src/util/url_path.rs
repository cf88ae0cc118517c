//! Parse and manipulate URL paths.
//!
//! Stylesheet locations and the arguments of `url(...)` functions are always
//! `/`-separated, whatever the platform. [`UrlPath`] handles them as plain
//! strings and converts to [`std::path::PathBuf`] only when a file is read.

use serde::{Deserialize, Serialize};

/// An URL path.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UrlPath(String);

impl UrlPath {
    /// Create an empty path.
    pub fn new() -> Self {
        Self(String::new())
    }

    /// Return a reference to the inner [`str`] slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the [`UrlPath`] and return the inner [`String`].
    pub fn into_string(self) -> String {
        self.0
    }

    /// Check if the path is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check if the path is absolute.
    pub fn is_absolute(&self) -> bool {
        self.0.starts_with('/')
    }

    /// Check if the normalized path climbs above its starting directory.
    pub fn escapes_root(&self) -> bool {
        self.components()
            .find(|component| !matches!(component, Component::RootDir | Component::CurDir))
            .is_some_and(|component| component == Component::ParentDir)
    }

    /// Return an iterator over the [`Component`]s of the path.
    pub fn components(&self) -> Components<'_> {
        Components {
            rest: &self.0,
            at_start: true,
        }
    }

    /// Return the directory containing this path, with a trailing slash.
    ///
    /// Returns an empty path for a file name without directory.
    pub fn parent(&self) -> Self {
        match self.0.rfind('/') {
            Some(i) => Self(self.0[..=i].to_owned()),
            None => Self::new(),
        }
    }

    /// Append a path to `self` and return the result.
    ///
    /// If `other` is absolute, it replaces `self`.
    pub fn join(&self, other: impl AsRef<str>) -> Self {
        let other = other.as_ref();
        if other.starts_with('/') || self.0.is_empty() {
            return Self(other.to_owned());
        }
        let mut path = self.0.clone();
        if !path.ends_with('/') {
            path.push('/');
        }
        path.push_str(other);
        Self(path)
    }

    /// Normalize the path by removing unnecessary separators and `.` and `..`
    /// components.
    ///
    /// Leading `..` components of a relative path are kept, and a trailing
    /// slash is preserved.
    pub fn normalize(&self) -> Self {
        if self.0.is_empty() {
            return Self::new();
        }

        let has_root = self.is_absolute();
        let has_trailing_slash = self.0.ends_with('/');
        let mut result: Vec<Component<'_>> = Vec::new();

        for component in self.components() {
            match component {
                Component::Normal(_) => result.push(component),
                Component::ParentDir => {
                    if !has_root && result.is_empty()
                        || matches!(result.last(), Some(Component::ParentDir))
                    {
                        result.push(component);
                    } else {
                        result.pop();
                    }
                },
                Component::RootDir | Component::CurDir => {},
            }
        }

        let mut path = if has_root {
            String::from("/")
        } else {
            String::with_capacity(self.0.len())
        };

        for (i, component) in result.iter().enumerate() {
            path.push_str(component.as_str());
            if i + 1 < result.len() || has_trailing_slash {
                path.push('/');
            }
        }

        if path.is_empty() {
            return Self::from(if has_trailing_slash { "./" } else { "." });
        }

        Self(path)
    }

    /// Normalize the path and make it relative to the root directory.
    ///
    /// A leading slash is removed, so `/css/a.css` and `css/./a.css` both
    /// become `css/a.css`.
    pub fn root_relative(&self) -> Self {
        let path = Self::from(self.0.trim_start_matches('/')).normalize();
        match path.as_str() {
            "." | "./" => Self::new(),
            _ => path,
        }
    }

    /// Express the directory `self` relative to the directory `base`.
    ///
    /// Both paths must be normalized directories relative to the same root,
    /// e.g. `css/lib/` relative to `css/` is `lib/`, and `fonts/` relative to
    /// `css/` is `../fonts/`. The result is empty when both are equal.
    pub fn relative_to(&self, base: &UrlPath) -> Self {
        let target: Vec<&str> = self.normal_segments().collect();
        let base: Vec<&str> = base.normal_segments().collect();

        let common = target
            .iter()
            .zip(base.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let mut path = String::new();
        for _ in common..base.len() {
            path.push_str("../");
        }
        for segment in &target[common..] {
            path.push_str(segment);
            path.push('/');
        }
        Self(path)
    }

    /// Split a query string and/or fragment from the path.
    ///
    /// Returns the path and the suffix, which starts with `?` or `#` when it
    /// is not empty.
    pub fn split_suffix(reference: &str) -> (Self, &str) {
        match reference.find(['?', '#']) {
            Some(i) => (Self::from(&reference[..i]), &reference[i..]),
            None => (Self::from(reference), ""),
        }
    }

    /// Convert the URL path to a relative [`std::path::PathBuf`].
    ///
    /// The root directory and `.` components are dropped, so the result can
    /// be joined to a base directory.
    pub fn to_std_path_buf(&self) -> std::path::PathBuf {
        let mut path = std::path::PathBuf::new();
        for component in self.components() {
            match component {
                Component::RootDir | Component::CurDir => {},
                Component::ParentDir => path.push(std::path::Component::ParentDir),
                Component::Normal(s) => path.push(s),
            }
        }
        path
    }

    fn normal_segments(&self) -> impl Iterator<Item = &str> {
        self.components().filter_map(|component| match component {
            Component::Normal(s) => Some(s),
            _ => None,
        })
    }
}

impl std::fmt::Display for UrlPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for UrlPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<T> From<T> for UrlPath
where
    T: Into<String>,
{
    fn from(value: T) -> Self {
        Self(value.into())
    }
}

/// An iterator over the [`Component`]s of a [`UrlPath`].
#[derive(Debug)]
pub struct Components<'a> {
    rest: &'a str,
    at_start: bool,
}

/// An URL path component.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Component<'a> {
    /// The root directory component (`/`).
    RootDir,
    /// A reference to the current directory (`.`).
    CurDir,
    /// A reference to the parent directory (`..`).
    ParentDir,
    /// A normal component.
    Normal(&'a str),
}

impl<'a> Iterator for Components<'a> {
    type Item = Component<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if std::mem::take(&mut self.at_start) && self.rest.starts_with('/') {
            self.rest = self.rest.trim_start_matches('/');
            return Some(Component::RootDir);
        }

        self.rest = self.rest.trim_start_matches('/');
        if self.rest.is_empty() {
            return None;
        }

        let (segment, rest) = match self.rest.find('/') {
            Some(i) => self.rest.split_at(i),
            None => (self.rest, ""),
        };
        self.rest = rest;

        Some(match segment {
            "." => Component::CurDir,
            ".." => Component::ParentDir,
            s => Component::Normal(s),
        })
    }
}

impl Component<'_> {
    /// Return the component as a string slice.
    pub fn as_str(&self) -> &str {
        match self {
            Self::RootDir => "/",
            Self::CurDir => ".",
            Self::ParentDir => "..",
            Self::Normal(s) => s,
        }
    }
}
