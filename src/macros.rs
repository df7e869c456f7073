macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Declare a record matcher for a mesh format: `matcher!(Vertex, r"^v ")`.
macro_rules! matcher {
    ($kind:ident, $pat:literal) => {
        $crate::engine::Matcher { kind: $crate::engine::RecordKind::$kind, regex: regex!($pat) }
    };
}
