// Positional IDs for catalog records. `new`/`inner` convert to and from the
// record's index in its validated catalog.
macro_rules! identifier {
    ($name: ident, $inner: ty) => {
        #[allow(missing_docs)]
        #[derive(
            Debug,
            Default,
            Copy,
            Clone,
            PartialOrd,
            Ord,
            PartialEq,
            Eq,
            Hash,
            derive_more::Display,
            derive_more::FromStr,
            serde::Serialize,
            serde::Deserialize,
        )]
        pub struct $name($inner);

        impl $name {
            /// Wraps a positional index as an ID.
            pub const fn new(val: $inner) -> Self {
                Self(val)
            }

            /// The positional index this ID stands for.
            pub const fn inner(self) -> $inner {
                self.0
            }
        }
    };
}
