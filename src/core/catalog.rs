//! Fixed product enumerations: categories, colors and sizes.
//!
//! Declaration order is the order the form presents tokens in, and it is
//! also the `Ord` order, so a `BTreeSet<Size>` iterates exactly like the
//! checkbox grid.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a token is not a member of its closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{token}` is not a valid {kind}")]
pub struct UnknownToken {
    pub kind: &'static str,
    pub token: String,
}

/// Declares a closed token enum with `ALL`, `as_str`, `parse` and `Display`.
macro_rules! token_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $token:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $token)]
                $variant,
            )+
        }

        impl $name {
            /// Every token, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $token,)+
                }
            }

            pub fn parse(token: &str) -> Result<Self, UnknownToken> {
                match token {
                    $($token => Ok($name::$variant),)+
                    other => Err(UnknownToken {
                        kind: $kind,
                        token: other.to_string(),
                    }),
                }
            }

            /// Position of this token in [`Self::ALL`].
            pub fn index(self) -> usize {
                Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

token_enum! {
    /// Product category.
    Category, "category" {
        TShirts => "T-shirts",
        Shoes => "Shoes",
        Accessories => "Accessories",
        Bags => "Bags",
        Dresses => "Dresses",
        Jackets => "Jackets",
        Gloves => "Gloves",
    }
}

token_enum! {
    /// Product color variant.
    Color, "color" {
        Blue => "blue",
        Green => "green",
        Red => "red",
        Yellow => "yellow",
        Purple => "purple",
        Orange => "orange",
        Pink => "pink",
        Brown => "brown",
        Gray => "gray",
        White => "white",
        Black => "black",
    }
}

token_enum! {
    /// Product size variant: letter sizes, then shoe sizes 34 through 48.
    Size, "size" {
        Xs => "xs",
        S => "s",
        M => "m",
        L => "l",
        Xl => "xl",
        Xxl => "xxl",
        Eu34 => "34",
        Eu35 => "35",
        Eu36 => "36",
        Eu37 => "37",
        Eu38 => "38",
        Eu39 => "39",
        Eu40 => "40",
        Eu41 => "41",
        Eu42 => "42",
        Eu43 => "43",
        Eu44 => "44",
        Eu45 => "45",
        Eu46 => "46",
        Eu47 => "47",
        Eu48 => "48",
    }
}

impl Color {
    /// RGB value for the swatch drawn next to the color label.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Color::Blue => (59, 130, 246),
            Color::Green => (34, 197, 94),
            Color::Red => (239, 68, 68),
            Color::Yellow => (234, 179, 8),
            Color::Purple => (168, 85, 247),
            Color::Orange => (249, 115, 22),
            Color::Pink => (236, 72, 153),
            Color::Brown => (146, 64, 14),
            Color::Gray => (156, 163, 175),
            Color::White => (255, 255, 255),
            Color::Black => (0, 0, 0),
        }
    }
}
