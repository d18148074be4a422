/// A result type that can contain warnings alongside the successful result.
///
/// Sweeps use this to hand back every sample they could compute together
/// with the per-sample failures they skipped over, so that one bad point
/// does not discard the rest of the data.
///
/// # Type Parameters
///
/// * `T` - The success result type
/// * `W` - The warning type
///
/// # Examples
///
/// ```rust
/// use equationer::types::WithWarnings;
///
/// let result = WithWarnings::from_parts(vec![1.0, 2.0], vec!["sample 3 failed".to_string()]);
/// assert!(result.is_warning());
///
/// let (values, warnings) = result.into_parts();
/// assert_eq!(values, vec![1.0, 2.0]);
/// assert_eq!(warnings.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum WithWarnings<T, W> {
    /// Successful result without warnings
    Ok(T),
    /// Successful result with warnings
    Warning(T, Vec<W>),
}

impl<T, W> WithWarnings<T, W> {
    /// Builds `Ok` when `warnings` is empty and `Warning` otherwise.
    pub fn from_parts(value: T, warnings: Vec<W>) -> Self {
        if warnings.is_empty() {
            WithWarnings::Ok(value)
        } else {
            WithWarnings::Warning(value, warnings)
        }
    }

    /// Checks if the result is successful without warnings.
    pub fn is_ok(&self) -> bool {
        matches!(self, WithWarnings::Ok(_))
    }

    /// Checks if the result has warnings.
    pub fn is_warning(&self) -> bool {
        matches!(self, WithWarnings::Warning(_, _))
    }

    /// Borrows the result value.
    pub fn value(&self) -> &T {
        match self {
            WithWarnings::Ok(data) | WithWarnings::Warning(data, _) => data,
        }
    }

    /// Extracts the result value, discarding any warnings.
    pub fn into_value(self) -> T {
        match self {
            WithWarnings::Ok(data) => data,
            WithWarnings::Warning(data, _) => data,
        }
    }

    /// Extracts the warnings, discarding the result value.
    ///
    /// Returns an empty vector if there were no warnings.
    pub fn warnings(self) -> Vec<W> {
        match self {
            WithWarnings::Ok(_) => Vec::new(),
            WithWarnings::Warning(_, warnings) => warnings,
        }
    }

    /// Splits into the value and its warnings (empty when there were none).
    pub fn into_parts(self) -> (T, Vec<W>) {
        self.into()
    }

    /// Transforms the result value, keeping the warnings.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> WithWarnings<U, W> {
        match self {
            WithWarnings::Ok(data) => WithWarnings::Ok(f(data)),
            WithWarnings::Warning(data, warnings) => WithWarnings::Warning(f(data), warnings),
        }
    }
}

impl<T, W> From<WithWarnings<T, W>> for (T, Vec<W>) {
    /// Converts `WithWarnings` into a tuple of (result, warnings).
    fn from(value: WithWarnings<T, W>) -> Self {
        match value {
            WithWarnings::Ok(data) => (data, Vec::new()),
            WithWarnings::Warning(data, warnings) => (data, warnings),
        }
    }
}
