/// Builds a [`Serial`](crate::Serial) router from a list of handlers.
///
/// Expands to `Serial::builder().handler(a).handler(b)...build()` and so
/// returns `Result<Serial<C>, CapabilityViolation>`.
///
/// ```rust,ignore
/// let router = serial![log_all, on_resize, store_resize]?;
/// ```
#[macro_export]
macro_rules! serial {
    ($($handler:expr),+ $(,)?) => {
        $crate::Serial::builder()$(.handler($handler))+.build()
    };
}

/// Builds a [`First`](crate::First) router from a list of handlers.
///
/// ```rust,ignore
/// let router = first![cached_lookup, slow_lookup]?;
/// ```
#[macro_export]
macro_rules! first {
    ($($handler:expr),+ $(,)?) => {
        $crate::First::builder()$(.handler($handler))+.build()
    };
}
