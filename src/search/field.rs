use std::borrow::Cow;

/// Mapping between a field's domain value and its URL token.
///
/// Parsing returns None for tokens outside the domain; callers fall back to the
/// field default. Serialization always yields the canonical token.
pub trait ParamCodec: Sized + Clone + PartialEq {
    fn from_param(token: &str) -> Option<Self>;
    fn to_param(&self) -> Cow<'_, str>;
}

/// Free-form tokens (company names, roles, locations) accept anything non-empty.
impl ParamCodec for String {
    fn from_param(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }

    fn to_param(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

/// A set of selected tokens. Insertion order is kept only for stable output.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiField<T> {
    values: Vec<T>,
    initialized: bool,
}

impl<T: ParamCodec> Default for MultiField<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ParamCodec> MultiField<T> {
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            initialized: false,
        }
    }

    /// Adopt the parseable tokens from the URL and mark the field initialized.
    pub fn hydrate<S: AsRef<str>>(&mut self, tokens: &[S]) {
        let parsed = tokens
            .iter()
            .filter_map(|t| T::from_param(t.as_ref()))
            .collect();
        self.set(parsed);
        self.initialized = true;
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, value: &T) -> bool {
        self.values.contains(value)
    }

    /// Replace the whole set. Repeated entries collapse to their first occurrence.
    pub fn set(&mut self, next: Vec<T>) {
        let mut values: Vec<T> = Vec::with_capacity(next.len());
        for v in next {
            if !values.contains(&v) {
                values.push(v);
            }
        }
        self.values = values;
    }

    /// Checkbox semantics: checking adds once, unchecking removes.
    pub fn toggle(&mut self, value: T, checked: bool) {
        let next = if checked {
            if self.contains(&value) {
                return;
            }
            let mut next = self.values.clone();
            next.push(value);
            next
        } else {
            self.values
                .iter()
                .filter(|v| **v != value)
                .cloned()
                .collect()
        };
        self.set(next);
    }

    pub fn tokens(&self) -> Vec<String> {
        self.values.iter().map(|v| v.to_param().into_owned()).collect()
    }
}

/// Exactly one value from an enumerated domain, with a declared default.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleField<T> {
    value: T,
    default: T,
    initialized: bool,
}

impl<T: ParamCodec> SingleField<T> {
    pub fn new(default: T) -> Self {
        Self {
            value: default.clone(),
            default,
            initialized: false,
        }
    }

    /// Adopt the URL token if it parses, otherwise the default.
    pub fn hydrate(&mut self, token: Option<&str>) {
        self.value = token
            .and_then(T::from_param)
            .unwrap_or_else(|| self.default.clone());
        self.initialized = true;
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn is_default(&self) -> bool {
        self.value == self.default
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn set(&mut self, value: T) {
        self.value = value;
    }

    pub fn reset(&mut self) {
        self.value = self.default.clone();
    }

    pub fn token(&self) -> String {
        self.value.to_param().into_owned()
    }
}
