//! Ordered, case-insensitive multimap of `Key: Value` lines

use std::fmt;

/// A single `Key: Value` line of a manager message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    /// Key as it appeared on the wire
    pub name: String,
    /// Trimmed value
    pub value: String,
}

/// Key/value table shared by responses and events.
///
/// Keys compare ASCII case-insensitively and may repeat. Every field is kept
/// in arrival order, so repeated keys come back in the order the switch sent
/// them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderTable {
    fields: Vec<HeaderField>,
}

impl HeaderTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Parse the lines of a raw block.
    ///
    /// Each line is split on its first `:`. Lines without a separator are kept
    /// as a key with an empty value, blank lines are skipped.
    pub fn parse(text: &str) -> Self {
        let mut table = Self::new();
        for line in text.split('\n') {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            match line.split_once(':') {
                Some((name, value)) => table.append(name.trim(), value.trim()),
                None => table.append(line.trim(), ""),
            }
        }
        table
    }

    /// Append a field, keeping any earlier fields with the same key
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push(HeaderField {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Replace every field with this key by a single field.
    ///
    /// The new field takes the position of the first replaced one, or is
    /// appended when the key was absent.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.position(name) {
            Some(first) => {
                self.fields[first].value = value;
                let mut index = 0;
                self.fields.retain(|field| {
                    let keep = index <= first || !field.name.eq_ignore_ascii_case(name);
                    index += 1;
                    keep
                });
            }
            None => self.append(name, value),
        }
    }

    /// First value for the key
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.name.eq_ignore_ascii_case(name))
            .map(|field| field.value.as_str())
    }

    /// First value for the key, treating an empty value as absent
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|value| !value.is_empty())
    }

    /// All values for the key in arrival order
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |field| field.name.eq_ignore_ascii_case(name))
            .map(|field| field.value.as_str())
    }

    /// Whether the key is present at least once
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Index of the first field with this key
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|field| field.name.eq_ignore_ascii_case(name))
    }

    /// Iterate over every field in arrival order
    pub fn iter(&self) -> impl Iterator<Item = &HeaderField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for HeaderTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in &self.fields {
            write!(f, "{}: {}\r\n", field.name, field.value)?;
        }
        Ok(())
    }
}
