/// String forms for fieldless enums stored in the board document.
///
/// The first string of each variant is canonical (what `as_str` returns and
/// what serde writes); the rest are accepted aliases. `parse` is lenient about
/// case, surrounding whitespace and `-` vs `_`, which is what the migrator
/// needs when reading documents written by older clients.
#[macro_export]
macro_rules! enum_str {
    (
        impl $name:ident {
            variants {
                $($variant:ident => [$first:literal $(, $alias:literal)*]),+ $(,)?
            }
        }
    ) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $first,)+
                }
            }

            pub fn parse(raw: &str) -> Option<Self> {
                let norm = raw.trim().to_ascii_lowercase().replace('-', "_");
                match norm.as_str() {
                    $($first $(| $alias)* => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}
