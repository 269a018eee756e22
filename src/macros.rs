/// A lazily compiled, process-wide cached `Regex` for a literal pattern.
#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// A nested sequence combinator: `seq![reference("A"), literal("=")]`.
#[macro_export]
macro_rules! seq {
    ($($rule:expr),* $(,)?) => {
        $crate::sequence(vec![ $($rule),* ])
    };
}

/// A nested alternation combinator: `alt![reference("A"), reference("B")]`.
#[macro_export]
macro_rules! alt {
    ($($rule:expr),* $(,)?) => {
        $crate::alternation(vec![ $($rule),* ])
    };
}
